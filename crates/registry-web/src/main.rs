use anyhow::Context;
use axum_login::{
    tower_sessions::{MemoryStore, SessionManagerLayer},
    AuthManagerLayerBuilder,
};

mod config;
mod login;
mod members;
mod routes;
mod sms;
mod uploads;
mod views;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let config = config::load().context("loading configuration")?;
    let store = registry_db::create(&config.database)
        .await
        .context("creating database store")?;
    login::seed_admin_accounts(&store)
        .await
        .context("seeding admin accounts")?;
    let file_store = uploads::FileStore::create(config.upload_dir.clone())
        .await
        .context("preparing upload directory")?;
    let notifier = sms::Notifier::from_config(&config.sms).context("configuring SMS notifier")?;
    let session_layer = SessionManagerLayer::new(MemoryStore::default());
    let login_backend = login::create_backend(store.clone());
    let auth_layer = AuthManagerLayerBuilder::new(login_backend, session_layer).build();
    let app_state = AppState {
        store,
        file_store,
        notifier,
    };
    let app = routes::setup(app_state, auth_layer);
    let listener = tokio::net::TcpListener::bind((config.bind_address.as_str(), config.bind_port))
        .await
        .context("binding listener")?;
    tracing::info!(
        "member registry listening on {}:{}",
        config.bind_address,
        config.bind_port
    );
    Ok(axum::serve(listener, app)
        .await
        .context("serving application")?)
}

#[derive(Clone)]
struct AppState {
    store: registry_db::Store,
    file_store: uploads::FileStore,
    notifier: sms::Notifier,
}
