diesel::table! {
    /// One registered member per row. All columns except id and name are
    /// optional; empty form inputs are stored as NULL.
    person (id) {
        id -> Integer,
        name -> Text,
        date_of_birth -> Nullable<Text>,
        gender -> Nullable<Text>,
        nationality -> Nullable<Text>,
        hometown -> Nullable<Text>,
        area_ga_west -> Nullable<Text>,
        gps_address -> Nullable<Text>,
        ghana_card_number -> Nullable<Text>,
        ghana_card_photo_path -> Nullable<Text>,
        disability_identified -> Nullable<Text>,
        disability_cause -> Nullable<Text>,
        emergency_name -> Nullable<Text>,
        emergency_relationship -> Nullable<Text>,
        emergency_phone -> Nullable<Text>,
        registered_organization -> Nullable<Text>,
        organization_name -> Nullable<Text>,
        additional_notes -> Nullable<Text>,
        marital_status -> Nullable<Text>,
        educational_level -> Nullable<Text>,
        languages_spoken -> Nullable<Text>,
        profession -> Nullable<Text>,
        english_proficiency -> Nullable<Text>,
        phone_number -> Nullable<Text>,
        email -> Nullable<Text>,
        residential_address -> Nullable<Text>,
        disability_type -> Nullable<Text>,
        disability_other -> Nullable<Text>,
        degree_of_disability -> Nullable<Text>,
        disability_needs -> Nullable<Text>,
        social_needs -> Nullable<Text>,
        living_conditions -> Nullable<Text>,
        guarantor_name -> Nullable<Text>,
        guarantor_phone -> Nullable<Text>,
        photo_path -> Nullable<Text>,
        full_photo_path -> Nullable<Text>,
    }
}

diesel::table! {
    /// Admin accounts. Seeded once at first startup, never managed through
    /// the web surface.
    user (id) {
        id -> Integer,
        username -> Text,
        password_hash -> Text,
    }
}
