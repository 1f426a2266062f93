use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use askama_axum::Template;
use axum::{
    extract::Query,
    response::{Html, IntoResponse, Redirect},
    Form,
};
use axum_login::{AuthSession, AuthUser, AuthnBackend, UserId};
use axum_messages::{Message, Messages};
use http::StatusCode;
use rs_sha512::HasherContext;
use std::hash::Hasher;

/// The admin accounts created the first time the registry starts with an
/// empty user table. Accounts are never managed through the web surface.
const ADMIN_SEED_ACCOUNTS: [(&str, &str); 3] = [
    ("chairman@fdi.com", "admin001"),
    ("secretary@fdi.com", "admin002"),
    ("organizer@fdi.com", "admin003"),
];

#[derive(Clone, Debug)]
pub struct BackEnd {
    db: registry_db::Store,
}

pub(crate) fn create_backend(database: registry_db::Store) -> BackEnd {
    BackEnd { db: database }
}

#[derive(Clone, Debug)]
pub struct User {
    id: i32,
    session_auth_hash: [u8; 64],
}

impl AuthUser for User {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.session_auth_hash
    }
}

impl From<registry_db::models::User> for User {
    fn from(
        registry_db::models::User {
            id, password_hash, ..
        }: registry_db::models::User,
    ) -> Self {
        let mut hasher = rs_sha512::Sha512Hasher::default();
        hasher.write(password_hash.as_bytes());
        let _ = hasher.finish();
        let final_result = HasherContext::finish(&mut hasher);
        Self {
            id,
            session_auth_hash: final_result.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("User database error: {0}")]
    UserDb(#[from] registry_db::Error),
    #[error("Stored password hash could not be parsed: {0}")]
    StoredHashUnableToParse(argon2::password_hash::Error),
    #[error("Password could not be verified: {0}")]
    PasswordUnableToVerify(argon2::password_hash::Error),
    #[error("Password hash failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
    next: Option<String>,
}

#[async_trait::async_trait]
impl AuthnBackend for BackEnd {
    type User = User;
    type Credentials = Credentials;
    type Error = Error;

    async fn authenticate(
        &self,
        credentials: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let Some(user) = self.db.load_user_by_username(&credentials.username).await? else {
            return Ok(None);
        };
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(Error::StoredHashUnableToParse)?;
        match Argon2::default().verify_password(credentials.password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(Some(user.into())),
            // a bad password looks exactly like an unknown username
            Err(argon2::password_hash::Error::Password) => Ok(None),
            Err(err) => Err(Error::PasswordUnableToVerify(err)),
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        self.db
            .load_user_by_id(*user_id)
            .await
            .map_err(Into::into)
            .map(|loaded| loaded.map(Into::into))
    }
}

/// Inserts the fixed admin list if the user table is still empty.
pub async fn seed_admin_accounts(store: &registry_db::Store) -> Result<(), Error> {
    if store.count_users().await? > 0 {
        return Ok(());
    }
    for (username, password) in ADMIN_SEED_ACCOUNTS {
        let password_hash = hash_password(password)?;
        store
            .insert_user(registry_db::models::NewUser {
                username: username.to_owned(),
                password_hash,
            })
            .await?;
    }
    tracing::info!(
        "seeded {} admin accounts",
        ADMIN_SEED_ACCOUNTS.len()
    );
    Ok(())
}

fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(Error::PasswordHash)
}

pub mod login {
    use super::*;

    #[derive(Template)]
    #[template(path = "login.html")]
    pub struct LoginTemplate {
        messages: Vec<Message>,
        next: Option<String>,
    }

    #[derive(Debug, serde::Deserialize)]
    pub struct NextUrl {
        next: Option<String>,
    }

    pub async fn get(
        messages: Messages,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> impl IntoResponse {
        Html(
            LoginTemplate {
                messages: messages.into_iter().collect(),
                next,
            }
            .render()
            .unwrap(),
        )
    }

    pub async fn post(
        mut auth_session: AuthSession<BackEnd>,
        messages: Messages,
        Form(creds): Form<Credentials>,
    ) -> impl IntoResponse {
        let user = match auth_session.authenticate(creds.clone()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                messages.error("Wrong username or password");
                let mut login_url = "/login".to_string();
                if let Some(next) = creds.next {
                    login_url = format!("{}?next={}", login_url, next);
                };
                return Redirect::to(&login_url).into_response();
            }
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };
        if auth_session.login(&user).await.is_err() {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        if let Some(ref next) = creds.next {
            Redirect::to(next)
        } else {
            Redirect::to("/")
        }
        .into_response()
    }
}

pub mod logout {
    use super::*;

    pub async fn get(mut auth_session: AuthSession<BackEnd>) -> impl IntoResponse {
        match auth_session.logout().await {
            Ok(_) => Redirect::to("/login").into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_backend() -> BackEnd {
        let store = registry_db::create(&registry_db::Config::in_memory())
            .await
            .expect("should create an in-memory store");
        seed_admin_accounts(&store)
            .await
            .expect("should seed admins");
        create_backend(store)
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_owned(),
            password: password.to_owned(),
            next: None,
        }
    }

    #[tokio::test]
    async fn a_seeded_admin_can_authenticate_with_its_password() {
        let backend = seeded_backend().await;
        let user = backend
            .authenticate(credentials("chairman@fdi.com", "admin001"))
            .await
            .expect("authentication should not error")
            .expect("the seeded admin should be accepted");
        assert!(user.id() > 0);
    }

    #[tokio::test]
    async fn a_wrong_password_and_an_unknown_user_are_indistinguishable() {
        let backend = seeded_backend().await;
        let wrong_password = backend
            .authenticate(credentials("chairman@fdi.com", "nope"))
            .await
            .expect("authentication should not error");
        let unknown_user = backend
            .authenticate(credentials("intruder@fdi.com", "admin001"))
            .await
            .expect("authentication should not error");
        assert!(wrong_password.is_none());
        assert!(unknown_user.is_none());
    }

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate_accounts() {
        let store = registry_db::create(&registry_db::Config::in_memory())
            .await
            .expect("should create an in-memory store");
        seed_admin_accounts(&store).await.expect("first seeding");
        seed_admin_accounts(&store).await.expect("second seeding");
        assert_eq!(
            store.count_users().await.expect("count"),
            ADMIN_SEED_ACCOUNTS.len() as i64
        );
    }
}
