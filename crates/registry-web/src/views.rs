use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use axum_messages::{Message, Messages};
use http::StatusCode;
use registry_db::models::Person;
use registry_db::NAMED_DISABILITY_TYPES;

#[derive(Debug, serde::Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

pub mod dashboard {
    use super::*;

    #[derive(Template)]
    #[template(path = "index.html")]
    pub struct IndexTemplate {
        messages: Vec<Message>,
        total: i64,
        lame: i64,
        visual: i64,
        deaf: i64,
        other: i64,
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
    ) -> impl IntoResponse {
        let counts = async {
            Ok::<_, registry_db::Error>((
                app_state.store.count_people().await?,
                app_state.store.count_with_disability("Lame").await?,
                app_state
                    .store
                    .count_with_disability("Visually Impaired")
                    .await?,
                app_state.store.count_with_disability("Deaf & Dumb").await?,
                app_state
                    .store
                    .count_outside_disabilities(&NAMED_DISABILITY_TYPES)
                    .await?,
            ))
        }
        .await;
        match counts {
            Ok((total, lame, visual, deaf, other)) => Html(
                IndexTemplate {
                    messages: messages.into_iter().collect(),
                    total,
                    lame,
                    visual,
                    deaf,
                    other,
                }
                .render()
                .unwrap(),
            )
            .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "loading dashboard counts failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub mod search {
    use super::*;

    #[derive(Template)]
    #[template(path = "results.html")]
    pub struct ResultsTemplate {
        messages: Vec<Message>,
        results: Vec<Person>,
        query: String,
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Query(SearchQuery { query }): Query<SearchQuery>,
    ) -> impl IntoResponse {
        match app_state.store.search_people(&query).await {
            Ok(results) => Html(
                ResultsTemplate {
                    messages: messages.into_iter().collect(),
                    results,
                    query,
                }
                .render()
                .unwrap(),
            )
            .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "name search failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub mod category {
    use super::*;

    #[derive(Template)]
    #[template(path = "category_results.html")]
    pub struct CategoryTemplate {
        messages: Vec<Message>,
        results: Vec<Person>,
        title: &'static str,
        cat: String,
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(cat): Path<String>,
        Query(SearchQuery { query }): Query<SearchQuery>,
    ) -> impl IntoResponse {
        let store = &app_state.store;
        let listed = match cat.as_str() {
            "all" => store.list_people().await.map(|people| ("All Members", people)),
            "lame" => store
                .people_with_disability("Lame")
                .await
                .map(|people| ("Lame", people)),
            "visual" => store
                .people_with_disability("Visually Impaired")
                .await
                .map(|people| ("Visually Impaired", people)),
            "deaf" => store
                .people_with_disability("Deaf & Dumb")
                .await
                .map(|people| ("Deaf & Dumb", people)),
            "other" => store
                .people_outside_disabilities(&NAMED_DISABILITY_TYPES)
                .await
                .map(|people| ("Other Disabilities", people)),
            _ => Ok(("Category", Vec::new())),
        };
        match listed {
            Ok((title, mut results)) => {
                // refine on name or category label, applied in memory
                let needle = query.to_lowercase();
                if !needle.is_empty() {
                    results.retain(|person| {
                        person.name.to_lowercase().contains(&needle)
                            || person
                                .disability_type
                                .as_deref()
                                .unwrap_or("")
                                .to_lowercase()
                                .contains(&needle)
                    });
                }
                Html(
                    CategoryTemplate {
                        messages: messages.into_iter().collect(),
                        results,
                        title,
                        cat,
                    }
                    .render()
                    .unwrap(),
                )
                .into_response()
            }
            Err(err) => {
                tracing::error!(error = %err, "category listing failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub mod view {
    use super::*;

    #[derive(Template)]
    #[template(path = "view.html")]
    pub struct ViewTemplate {
        messages: Vec<Message>,
        person: Person,
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(id): Path<i32>,
    ) -> impl IntoResponse {
        match app_state.store.load_person(id).await {
            Ok(Some(person)) => Html(
                ViewTemplate {
                    messages: messages.into_iter().collect(),
                    person,
                }
                .render()
                .unwrap(),
            )
            .into_response(),
            Ok(None) => StatusCode::NOT_FOUND.into_response(),
            Err(err) => {
                tracing::error!(error = %err, "loading member detail failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
