use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("file i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("client file name unusable after sanitizing: {0:?}")]
    UnusableName(String),
    #[error("Not Found")]
    NotFound,
}

/// Owns the upload directory. Storage names are flat (no subdirectories)
/// and always pass through `sanitize_file_name`, so a request can never
/// reach outside the root.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub async fn create(root: PathBuf) -> Result<Self, Error> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Writes an upload under `prefix` + random token + sanitized client
    /// name and returns the storage name. The token keeps two members who
    /// upload `photo.jpg` from clobbering each other.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(
        &self,
        prefix: &str,
        client_name: &str,
        bytes: &[u8],
    ) -> Result<String, Error> {
        let safe = sanitize_file_name(client_name);
        if safe.is_empty() {
            return Err(Error::UnusableName(client_name.to_owned()));
        }
        let token: u32 = rand::random();
        let storage_name = format!("{prefix}{token:08x}_{safe}");
        tokio::fs::write(self.root.join(&storage_name), bytes).await?;
        Ok(storage_name)
    }

    pub async fn open(&self, storage_name: &str) -> Result<(&'static str, Vec<u8>), Error> {
        if sanitize_file_name(storage_name) != storage_name || storage_name.is_empty() {
            return Err(Error::NotFound);
        }
        match tokio::fs::read(self.root.join(storage_name)).await {
            Ok(bytes) => Ok((content_type_for(storage_name), bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// Best-effort removal; a file that is already gone is not an error.
    pub async fn remove(&self, storage_name: &str) {
        if sanitize_file_name(storage_name) != storage_name || storage_name.is_empty() {
            return;
        }
        if let Err(err) = tokio::fs::remove_file(self.root.join(storage_name)).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(storage_name, error = %err, "could not remove stored file");
            }
        }
    }
}

/// `GET /uploads/{filename}` - streams a stored file back to the browser.
pub async fn serve(
    State(app_state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> impl IntoResponse {
    match app_state.file_store.open(&filename).await {
        Ok((content_type, bytes)) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(Error::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            tracing::error!(filename, error = %err, "serving stored file failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Keeps only the final path component, then only the characters that are
/// safe in a flat storage name. Leading and trailing dots go too, so a
/// traversal like `../../etc/passwd` collapses to `passwd`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim_matches('.')
        .to_owned()
}

fn content_type_for(storage_name: &str) -> &'static str {
    match storage_name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::create(dir.path().to_path_buf())
            .await
            .expect("should create the upload directory")
    }

    #[test]
    fn sanitize_strips_traversal_components_and_unsafe_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "myphoto1.jpg");
        assert_eq!(sanitize_file_name("...."), "");
        assert_eq!(sanitize_file_name("café.png"), "caf.png");
    }

    #[tokio::test]
    async fn save_then_open_round_trips_the_bytes() {
        let dir = tempdir().expect("tempdir");
        let file_store = store_in(&dir).await;

        let storage_name = file_store
            .save("ghana_card_", "card.png", b"png-bytes")
            .await
            .expect("should save");
        assert!(storage_name.starts_with("ghana_card_"));
        assert!(storage_name.ends_with("_card.png"));

        let (content_type, bytes) = file_store.open(&storage_name).await.expect("should open");
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn identical_client_names_get_distinct_storage_names() {
        let dir = tempdir().expect("tempdir");
        let file_store = store_in(&dir).await;

        let first = file_store
            .save("", "photo.jpg", b"first")
            .await
            .expect("should save");
        let second = file_store
            .save("", "photo.jpg", b"second")
            .await
            .expect("should save");
        assert_ne!(first, second);

        let (_, bytes) = file_store.open(&first).await.expect("should open");
        assert_eq!(bytes, b"first");
    }

    #[tokio::test]
    async fn traversal_names_never_escape_the_root() {
        let dir = tempdir().expect("tempdir");
        let file_store = store_in(&dir).await;

        let storage_name = file_store
            .save("", "../../escape.txt", b"contained")
            .await
            .expect("should save under a sanitized name");
        assert!(!storage_name.contains('/'));
        assert!(dir.path().join(&storage_name).is_file());

        assert!(matches!(
            file_store.open("../app-config.toml").await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn a_name_that_sanitizes_to_nothing_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let file_store = store_in(&dir).await;
        assert!(matches!(
            file_store.save("full_", "..", b"x").await,
            Err(Error::UnusableName(_))
        ));
    }

    #[tokio::test]
    async fn remove_is_best_effort_and_ignores_missing_files() {
        let dir = tempdir().expect("tempdir");
        let file_store = store_in(&dir).await;

        let storage_name = file_store
            .save("", "gone.jpg", b"bytes")
            .await
            .expect("should save");
        file_store.remove(&storage_name).await;
        assert!(matches!(
            file_store.open(&storage_name).await,
            Err(Error::NotFound)
        ));

        // absent already; must not panic or error
        file_store.remove(&storage_name).await;
        file_store.remove("never-existed.jpg").await;
    }
}
