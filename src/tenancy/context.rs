use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::PgConnection;

use super::SchemaError;

/// Schema identifiers are interpolated into DDL, so they are restricted to
/// lowercase identifiers well below the Postgres 63-byte limit.
pub fn validate_schema_name(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };

    if !valid || name.len() > 63 || name.starts_with("pg_") {
        return Err(SchemaError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(QueryableByName)]
struct SearchPathRow {
    #[diesel(sql_type = Text, column_name = search_path)]
    search_path: String,
}

fn current_search_path(conn: &mut PgConnection) -> QueryResult<String> {
    let row: SearchPathRow = diesel::sql_query("SHOW search_path").get_result(conn)?;
    Ok(row.search_path)
}

fn set_search_path(conn: &mut PgConnection, path: &str) -> QueryResult<()> {
    // set_config takes the path as a bind parameter, unlike SET.
    diesel::sql_query("SELECT set_config('search_path', $1, false)")
        .bind::<Text, _>(path)
        .execute(conn)?;
    Ok(())
}

/// Runs `f` with the connection search_path pointing at `schema_name` (with
/// the public schema kept visible for the shared tables), restoring the
/// previous search_path on every exit path. Nesting is supported: each call
/// saves and restores the path it found.
pub fn with_schema<T, E, F>(conn: &mut PgConnection, schema_name: &str, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E>,
    E: From<SchemaError>,
{
    validate_schema_name(schema_name)?;

    let previous = current_search_path(conn).map_err(SchemaError::Database)?;
    set_search_path(conn, &format!("{schema_name}, public")).map_err(SchemaError::Database)?;

    let result = f(conn);

    match set_search_path(conn, &previous) {
        Ok(()) => result,
        Err(err) => match result {
            Ok(_) => Err(SchemaError::Database(err).into()),
            Err(original) => {
                tracing::warn!(schema = %schema_name, error = %err, "failed to restore search_path");
                Err(original)
            }
        },
    }
}
