use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;

pub mod models;
mod schema;
mod sql_functions;

/// The named disability categories used for dashboard tiles and filtering.
/// Everything else (including a missing classification) counts as "other".
pub const NAMED_DISABILITY_TYPES: [&str; 3] = ["Lame", "Visually Impaired", "Deaf & Dumb"];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("getting connection from pool: {0}")]
    GetConnectionPool(#[from] PoolError),
    #[error("building connection pool: {0}")]
    BuildConnectionPool(diesel::r2d2::PoolError),
    #[error("result failure: {0}")]
    Result(#[from] diesel::result::Error),
    #[error("blocking task failure: {0}")]
    Runtime(#[from] tokio::task::JoinError),
    #[error("a member must have a name")]
    NameRequired,
    #[error("Not Found")]
    NotFound,
}

#[derive(Clone, Debug)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    db_path: String,
    max_open: u32,
    #[serde(with = "humantime_serde")]
    timeout_for_get: Duration,
}

impl Config {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            max_open: 8,
            timeout_for_get: Duration::from_secs(5),
        }
    }

    /// A private in-memory database. Pool size is pinned to one connection
    /// so the schema created at bootstrap stays visible.
    pub fn in_memory() -> Self {
        Self {
            db_path: ":memory:".to_owned(),
            max_open: 1,
            timeout_for_get: Duration::from_secs(5),
        }
    }
}

const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS person (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    date_of_birth TEXT,
    gender TEXT,
    nationality TEXT,
    hometown TEXT,
    area_ga_west TEXT,
    gps_address TEXT,
    ghana_card_number TEXT,
    ghana_card_photo_path TEXT,
    disability_identified TEXT,
    disability_cause TEXT,
    emergency_name TEXT,
    emergency_relationship TEXT,
    emergency_phone TEXT,
    registered_organization TEXT,
    organization_name TEXT,
    additional_notes TEXT,
    marital_status TEXT,
    educational_level TEXT,
    languages_spoken TEXT,
    profession TEXT,
    english_proficiency TEXT,
    phone_number TEXT,
    email TEXT,
    residential_address TEXT,
    disability_type TEXT,
    disability_other TEXT,
    degree_of_disability TEXT,
    disability_needs TEXT,
    social_needs TEXT,
    living_conditions TEXT,
    guarantor_name TEXT,
    guarantor_phone TEXT,
    photo_path TEXT,
    full_photo_path TEXT
);
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
);
";

pub async fn create(config: &Config) -> Result<Store, Error> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let manager = ConnectionManager::<SqliteConnection>::new(&config.db_path);
        let pool = Pool::builder()
            .max_size(config.max_open.max(1))
            .connection_timeout(config.timeout_for_get.max(Duration::from_secs(1)))
            .build(manager)
            .map_err(Error::BuildConnectionPool)?;
        let mut conn = pool.get()?;
        conn.batch_execute(SCHEMA_SQL)?;
        Ok(Store { pool })
    })
    .await?
}

impl Store {
    async fn with_conn<T, F>(&self, f: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&mut PooledConnection<ConnectionManager<SqliteConnection>>) -> Result<T, Error>
            + Send
            + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }

    #[tracing::instrument(skip(self, fields, photos), fields(name = %fields.name))]
    pub async fn create_person(
        &self,
        fields: models::PersonFields,
        photos: models::PhotoPaths,
    ) -> Result<models::Person, Error> {
        if fields.name.trim().is_empty() {
            return Err(Error::NameRequired);
        }
        self.with_conn(move |conn| {
            diesel::insert_into(schema::person::table)
                .values((&fields, &photos))
                .returning(models::Person::as_returning())
                .get_result(conn)
                .map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_person(&self, person_id: i32) -> Result<Option<models::Person>, Error> {
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            match person
                .find(person_id)
                .select(models::Person::as_select())
                .first(conn)
            {
                Ok(loaded) => Ok(Some(loaded)),
                Err(diesel::result::Error::NotFound) => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    /// Overwrites every scalar field; photo columns change only where the
    /// changeset carries a new storage name.
    #[tracing::instrument(skip(self, fields, photos))]
    pub async fn update_person(
        &self,
        person_id: i32,
        fields: models::PersonFields,
        photos: models::PhotoPaths,
    ) -> Result<models::Person, Error> {
        if fields.name.trim().is_empty() {
            return Err(Error::NameRequired);
        }
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            match diesel::update(person.find(person_id))
                .set((&fields, &photos))
                .returning(models::Person::as_returning())
                .get_result(conn)
            {
                Ok(updated) => Ok(updated),
                Err(diesel::result::Error::NotFound) => Err(Error::NotFound),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    /// Removes the row and hands the deleted record back so the caller can
    /// clean up any files it referenced.
    #[tracing::instrument(skip(self))]
    pub async fn delete_person(&self, person_id: i32) -> Result<models::Person, Error> {
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            match diesel::delete(person.find(person_id))
                .returning(models::Person::as_returning())
                .get_result(conn)
            {
                Ok(removed) => Ok(removed),
                Err(diesel::result::Error::NotFound) => Err(Error::NotFound),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_people(&self) -> Result<Vec<models::Person>, Error> {
        self.with_conn(|conn| {
            use schema::person::dsl::*;
            person
                .order(id.asc())
                .select(models::Person::as_select())
                .load(conn)
                .map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn people_with_disability(&self, label: &str) -> Result<Vec<models::Person>, Error> {
        let label = label.to_owned();
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            person
                .filter(disability_type.eq(label))
                .order(id.asc())
                .select(models::Person::as_select())
                .load(conn)
                .map_err(Into::into)
        })
        .await
    }

    /// Members whose classification is not one of `labels`. Rows with no
    /// classification at all belong here too, so the named buckets plus this
    /// one always partition the registry.
    #[tracing::instrument(skip(self))]
    pub async fn people_outside_disabilities(
        &self,
        labels: &[&str],
    ) -> Result<Vec<models::Person>, Error> {
        let labels: Vec<String> = labels.iter().map(|label| (*label).to_owned()).collect();
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            person
                .filter(disability_type.is_null().or(disability_type.ne_all(labels)))
                .order(id.asc())
                .select(models::Person::as_select())
                .load(conn)
                .map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn search_people(&self, fragment: &str) -> Result<Vec<models::Person>, Error> {
        let pattern = format!("%{}%", fragment.to_lowercase());
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            use sql_functions::lower;
            person
                .filter(lower(name).like(pattern))
                .order(id.asc())
                .select(models::Person::as_select())
                .load(conn)
                .map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn count_people(&self) -> Result<i64, Error> {
        self.with_conn(|conn| {
            use schema::person::dsl::*;
            person.count().get_result(conn).map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn count_with_disability(&self, label: &str) -> Result<i64, Error> {
        let label = label.to_owned();
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            person
                .filter(disability_type.eq(label))
                .count()
                .get_result(conn)
                .map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn count_outside_disabilities(&self, labels: &[&str]) -> Result<i64, Error> {
        let labels: Vec<String> = labels.iter().map(|label| (*label).to_owned()).collect();
        self.with_conn(move |conn| {
            use schema::person::dsl::*;
            person
                .filter(disability_type.is_null().or(disability_type.ne_all(labels)))
                .count()
                .get_result(conn)
                .map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_user_by_username(&self, name: &str) -> Result<Option<models::User>, Error> {
        let lowered = name.to_lowercase();
        self.with_conn(move |conn| {
            use schema::user::dsl::*;
            use sql_functions::lower;
            match user
                .filter(lower(username).eq(lowered))
                .select(models::User::as_select())
                .first(conn)
            {
                Ok(loaded_user) => Ok(Some(loaded_user)),
                Err(diesel::result::Error::NotFound) => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    #[tracing::instrument(skip(self, user_id))]
    pub async fn load_user_by_id(&self, user_id: i32) -> Result<Option<models::User>, Error> {
        self.with_conn(move |conn| {
            use schema::user::dsl::*;
            match user
                .find(user_id)
                .select(models::User::as_select())
                .first(conn)
            {
                Ok(loaded_user) => Ok(Some(loaded_user)),
                Err(diesel::result::Error::NotFound) => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn count_users(&self) -> Result<i64, Error> {
        self.with_conn(|conn| {
            use schema::user::dsl::*;
            user.count().get_result(conn).map_err(Into::into)
        })
        .await
    }

    #[tracing::instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn insert_user(&self, new_user: models::NewUser) -> Result<models::User, Error> {
        self.with_conn(move |conn| {
            diesel::insert_into(schema::user::table)
                .values(&new_user)
                .returning(models::User::as_returning())
                .get_result(conn)
                .map_err(Into::into)
        })
        .await
    }
}
