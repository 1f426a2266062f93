use crate::sms;
use crate::uploads::{self, FileStore};
use askama::Template;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum_messages::{Message, Messages};
use http::StatusCode;
use registry_db::models::{PersonFields, PhotoPaths};
use std::collections::HashMap;

const PORTRAIT_FIELD: &str = "photo";
const FULL_BODY_FIELD: &str = "full_photo";
const ID_CARD_FIELD: &str = "ghana_card_photo";

/// A parsed multipart submission: scalar inputs by field name, plus any
/// non-empty uploads keyed the same way.
struct SubmittedForm {
    fields: HashMap<String, String>,
    uploads: HashMap<String, (String, Vec<u8>)>,
}

impl SubmittedForm {
    /// Removes a scalar value; empty inputs count as absent.
    fn take(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key).filter(|value| !value.is_empty())
    }
}

async fn read_form(multipart: &mut Multipart) -> Result<SubmittedForm, MultipartError> {
    let mut form = SubmittedForm {
        fields: HashMap::new(),
        uploads: HashMap::new(),
    };
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        if let Some(file_name) = field.file_name().map(ToOwned::to_owned) {
            let bytes = field.bytes().await?;
            if !file_name.is_empty() && !bytes.is_empty() {
                form.uploads.insert(name, (file_name, bytes.to_vec()));
            }
        } else {
            let text = field.text().await?;
            form.fields.insert(name, text);
        }
    }
    Ok(form)
}

fn person_fields(form: &mut SubmittedForm) -> PersonFields {
    PersonFields {
        name: form.take("name").unwrap_or_default(),
        date_of_birth: form.take("date_of_birth"),
        gender: form.take("gender"),
        nationality: form.take("nationality"),
        hometown: form.take("hometown"),
        area_ga_west: form.take("area_ga_west"),
        gps_address: form.take("gps_address"),
        ghana_card_number: form.take("ghana_card_number"),
        disability_identified: form.take("disability_identified"),
        disability_cause: form.take("disability_cause"),
        emergency_name: form.take("emergency_name"),
        emergency_relationship: form.take("emergency_relationship"),
        emergency_phone: form.take("emergency_phone"),
        registered_organization: form.take("registered_organization"),
        organization_name: form.take("organization_name"),
        additional_notes: form.take("additional_notes"),
        marital_status: form.take("marital_status"),
        educational_level: form.take("educational_level"),
        languages_spoken: form.take("languages_spoken"),
        profession: form.take("profession"),
        english_proficiency: form.take("english_proficiency"),
        phone_number: form.take("phone_number"),
        email: form.take("email"),
        residential_address: form.take("residential_address"),
        disability_type: form.take("disability_type"),
        disability_other: form.take("disability_other"),
        degree_of_disability: form.take("degree_of_disability"),
        disability_needs: form.take("disability_needs"),
        social_needs: form.take("social_needs"),
        living_conditions: form.take("living_conditions"),
        guarantor_name: form.take("guarantor_name"),
        guarantor_phone: form.take("guarantor_phone"),
    }
}

/// Saves whichever of the three photo uploads are present. If any write
/// fails the ones already saved are removed again, so a submission that
/// cannot complete leaves nothing behind.
async fn save_uploads(
    file_store: &FileStore,
    form: &mut SubmittedForm,
) -> Result<PhotoPaths, uploads::Error> {
    let mut photos = PhotoPaths::default();
    for (field, prefix) in [
        (PORTRAIT_FIELD, ""),
        (FULL_BODY_FIELD, "full_"),
        (ID_CARD_FIELD, "ghana_card_"),
    ] {
        let Some((client_name, bytes)) = form.uploads.remove(field) else {
            continue;
        };
        match file_store.save(prefix, &client_name, &bytes).await {
            Ok(storage_name) => match field {
                PORTRAIT_FIELD => photos.photo_path = Some(storage_name),
                FULL_BODY_FIELD => photos.full_photo_path = Some(storage_name),
                _ => photos.ghana_card_photo_path = Some(storage_name),
            },
            Err(err) => {
                discard_photos(file_store, &photos).await;
                return Err(err);
            }
        }
    }
    Ok(photos)
}

async fn discard_photos(file_store: &FileStore, photos: &PhotoPaths) {
    for storage_name in [
        &photos.photo_path,
        &photos.full_photo_path,
        &photos.ghana_card_photo_path,
    ]
    .into_iter()
    .flatten()
    {
        file_store.remove(storage_name).await;
    }
}

pub mod register {
    use super::*;

    #[derive(Template)]
    #[template(path = "register.html")]
    pub struct RegisterTemplate {
        messages: Vec<Message>,
        next_id: i64,
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
    ) -> impl IntoResponse {
        match app_state.store.count_people().await {
            Ok(total) => Html(
                RegisterTemplate {
                    messages: messages.into_iter().collect(),
                    next_id: total + 1,
                }
                .render()
                .unwrap(),
            )
            .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "loading registration form failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        let mut form = match read_form(&mut multipart).await {
            Ok(form) => form,
            Err(err) => {
                tracing::warn!(error = %err, "could not read registration form");
                messages.error("Could not read the submitted form");
                return Redirect::to("/register").into_response();
            }
        };
        let fields = person_fields(&mut form);
        if fields.name.trim().is_empty() {
            messages.error("Name is required");
            return Redirect::to("/register").into_response();
        }
        let photos = match save_uploads(&app_state.file_store, &mut form).await {
            Ok(photos) => photos,
            Err(err) => {
                tracing::error!(error = %err, "saving uploaded photos failed");
                messages.error(format!("Could not save uploaded photos: {err}"));
                return Redirect::to("/register").into_response();
            }
        };
        match app_state.store.create_person(fields, photos.clone()).await {
            Ok(person) => {
                let messages = messages.success("Member registered successfully!");
                match &person.phone_number {
                    Some(phone) if app_state.notifier.enabled() => {
                        // fire-and-forget; the task logs the outcome
                        let _report = app_state.notifier.dispatch(phone, &person.name);
                        messages.success(format!(
                            "Welcome SMS queued for {}",
                            sms::normalize_phone(phone)
                        ));
                    }
                    Some(_) => {
                        messages.warning("SMS not configured - welcome message skipped");
                    }
                    None => {
                        messages.warning("No phone number provided - SMS not sent");
                    }
                }
                Redirect::to("/").into_response()
            }
            Err(err) => {
                discard_photos(&app_state.file_store, &photos).await;
                tracing::error!(error = %err, "registering member failed");
                messages.error(format!("Error: {err}"));
                Redirect::to("/register").into_response()
            }
        }
    }
}

pub mod edit {
    use super::*;

    #[derive(Template)]
    #[template(path = "edit.html")]
    pub struct EditTemplate {
        messages: Vec<Message>,
        person: registry_db::models::Person,
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(id): Path<i32>,
    ) -> impl IntoResponse {
        match app_state.store.load_person(id).await {
            Ok(Some(person)) => Html(
                EditTemplate {
                    messages: messages.into_iter().collect(),
                    person,
                }
                .render()
                .unwrap(),
            )
            .into_response(),
            Ok(None) => StatusCode::NOT_FOUND.into_response(),
            Err(err) => {
                tracing::error!(error = %err, "loading member for edit failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(id): Path<i32>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        let mut form = match read_form(&mut multipart).await {
            Ok(form) => form,
            Err(err) => {
                tracing::warn!(error = %err, "could not read edit form");
                messages.error("Could not read the submitted form");
                return Redirect::to(&format!("/edit/{id}")).into_response();
            }
        };
        let fields = person_fields(&mut form);
        if fields.name.trim().is_empty() {
            messages.error("Name is required");
            return Redirect::to(&format!("/edit/{id}")).into_response();
        }
        let photos = match save_uploads(&app_state.file_store, &mut form).await {
            Ok(photos) => photos,
            Err(err) => {
                tracing::error!(error = %err, "saving replacement photos failed");
                messages.error(format!("Could not save uploaded photos: {err}"));
                return Redirect::to(&format!("/edit/{id}")).into_response();
            }
        };
        match app_state
            .store
            .update_person(id, fields, photos.clone())
            .await
        {
            Ok(person) => {
                messages.success("Member updated successfully!");
                Redirect::to(&format!("/view/{}", person.id)).into_response()
            }
            Err(registry_db::Error::NotFound) => {
                discard_photos(&app_state.file_store, &photos).await;
                StatusCode::NOT_FOUND.into_response()
            }
            Err(err) => {
                discard_photos(&app_state.file_store, &photos).await;
                tracing::error!(error = %err, "updating member failed");
                messages.error(format!("Error: {err}"));
                Redirect::to(&format!("/edit/{id}")).into_response()
            }
        }
    }
}

pub mod delete {
    use super::*;

    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(id): Path<i32>,
    ) -> impl IntoResponse {
        match app_state.store.delete_person(id).await {
            Ok(removed) => {
                for storage_name in [
                    &removed.photo_path,
                    &removed.full_photo_path,
                    &removed.ghana_card_photo_path,
                ]
                .into_iter()
                .flatten()
                {
                    app_state.file_store.remove(storage_name).await;
                }
                messages.success("Deleted");
                Redirect::to("/search?query=").into_response()
            }
            Err(registry_db::Error::NotFound) => StatusCode::NOT_FOUND.into_response(),
            Err(err) => {
                tracing::error!(error = %err, "deleting member failed");
                messages.error(format!("Error: {err}"));
                Redirect::to("/search?query=").into_response()
            }
        }
    }
}
