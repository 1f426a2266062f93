use diesel::prelude::*;

/// A full member registry row.
#[derive(Identifiable, Queryable, Selectable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::person)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub hometown: Option<String>,
    pub area_ga_west: Option<String>,
    pub gps_address: Option<String>,
    pub ghana_card_number: Option<String>,
    pub ghana_card_photo_path: Option<String>,
    pub disability_identified: Option<String>,
    pub disability_cause: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_relationship: Option<String>,
    pub emergency_phone: Option<String>,
    pub registered_organization: Option<String>,
    pub organization_name: Option<String>,
    pub additional_notes: Option<String>,
    pub marital_status: Option<String>,
    pub educational_level: Option<String>,
    pub languages_spoken: Option<String>,
    pub profession: Option<String>,
    pub english_proficiency: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub residential_address: Option<String>,
    pub disability_type: Option<String>,
    pub disability_other: Option<String>,
    pub degree_of_disability: Option<String>,
    pub disability_needs: Option<String>,
    pub social_needs: Option<String>,
    pub living_conditions: Option<String>,
    pub guarantor_name: Option<String>,
    pub guarantor_phone: Option<String>,
    pub photo_path: Option<String>,
    pub full_photo_path: Option<String>,
}

/// Every scalar (non-photo) member column. Used for inserts and for edits,
/// where the whole field set is overwritten; `treat_none_as_null` makes an
/// absent form value clear the stored one.
#[derive(Insertable, AsChangeset, Clone, Debug, Default)]
#[diesel(table_name = crate::schema::person)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct PersonFields {
    pub name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub hometown: Option<String>,
    pub area_ga_west: Option<String>,
    pub gps_address: Option<String>,
    pub ghana_card_number: Option<String>,
    pub disability_identified: Option<String>,
    pub disability_cause: Option<String>,
    pub emergency_name: Option<String>,
    pub emergency_relationship: Option<String>,
    pub emergency_phone: Option<String>,
    pub registered_organization: Option<String>,
    pub organization_name: Option<String>,
    pub additional_notes: Option<String>,
    pub marital_status: Option<String>,
    pub educational_level: Option<String>,
    pub languages_spoken: Option<String>,
    pub profession: Option<String>,
    pub english_proficiency: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub residential_address: Option<String>,
    pub disability_type: Option<String>,
    pub disability_other: Option<String>,
    pub degree_of_disability: Option<String>,
    pub disability_needs: Option<String>,
    pub social_needs: Option<String>,
    pub living_conditions: Option<String>,
    pub guarantor_name: Option<String>,
    pub guarantor_phone: Option<String>,
}

/// The three photo columns. `None` means "leave the stored path alone", so
/// an edit without a new upload never touches an existing photo.
#[derive(Insertable, AsChangeset, Clone, Debug, Default)]
#[diesel(table_name = crate::schema::person)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PhotoPaths {
    pub photo_path: Option<String>,
    pub full_photo_path: Option<String>,
    pub ghana_card_photo_path: Option<String>,
}

#[derive(Identifiable, Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::user)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::user)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}
