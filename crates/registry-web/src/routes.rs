use super::login::{login, logout, BackEnd};
use super::{members, uploads, views};
use axum::routing::{get, post};
use axum_login::{login_required, tower_sessions::MemoryStore, AuthManagerLayer};
use axum_messages::MessagesManagerLayer;

pub(super) fn setup(
    app_state: super::AppState,
    auth_manager: AuthManagerLayer<BackEnd, MemoryStore>,
) -> axum::routing::Router {
    axum::Router::new()
        .route("/", get(views::dashboard::get))
        .route("/register", get(members::register::get))
        .route("/register", post(members::register::post))
        .route("/search", get(views::search::get))
        .route("/category/{cat}", get(views::category::get))
        .route("/view/{id}", get(views::view::get))
        .route("/edit/{id}", get(members::edit::get))
        .route("/edit/{id}", post(members::edit::post))
        .route("/delete/{id}", post(members::delete::post))
        .route("/uploads/{filename}", get(uploads::serve))
        .route_layer(login_required!(BackEnd, login_url = "/login"))
        .route("/login", post(login::post))
        .route("/login", get(login::get))
        .route("/logout", get(logout::get))
        .layer(MessagesManagerLayer)
        .layer(auth_manager)
        .fallback(fallback)
        .with_state(app_state)
}

pub async fn fallback(_uri: axum::http::Uri) -> impl axum::response::IntoResponse {
    (axum::http::StatusCode::NOT_FOUND, "not found")
}
