diesel::define_sql_function! {
    /// SQL `lower`, for case-insensitive name and username matching.
    fn lower(input: diesel::sql_types::Text) -> diesel::sql_types::Text;
}
