use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use super::context::{validate_schema_name, with_schema};
use super::{MigrationError, SchemaError};

/// Migrations for the shared (public) tables.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Tables every tenant schema carries. Applied with the search_path pointing
/// at the target schema, so the unqualified names land there; the statements
/// are idempotent and safe to re-run against an already-migrated schema.
const TENANT_SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS groups (
    id UUID PRIMARY KEY,
    name VARCHAR(150) NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS user_tenant_permissions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE REFERENCES public.users(id) ON DELETE CASCADE,
    is_staff BOOLEAN NOT NULL DEFAULT FALSE,
    is_superuser BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS permission_groups (
    permission_id UUID NOT NULL REFERENCES user_tenant_permissions(id) ON DELETE CASCADE,
    group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
    PRIMARY KEY (permission_id, group_id)
);

CREATE TABLE IF NOT EXISTS profiles (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE REFERENCES public.users(id) ON DELETE CASCADE,
    bio VARCHAR(1000),
    phone VARCHAR(50),
    address1 VARCHAR(50),
    address2 VARCHAR(50),
    city VARCHAR(50),
    quater VARCHAR(50),
    profile_type VARCHAR(50) NOT NULL DEFAULT 'student',
    gender VARCHAR(20),
    photo_key TEXT,
    document_key TEXT,
    certifications TEXT,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    activated_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS otps (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE REFERENCES public.users(id) ON DELETE CASCADE,
    otp_code VARCHAR(6),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

#[derive(QueryableByName)]
struct ExistsRow {
    #[diesel(sql_type = Bool)]
    present: bool,
}

pub fn schema_exists(conn: &mut PgConnection, schema_name: &str) -> Result<bool, SchemaError> {
    validate_schema_name(schema_name)?;

    let row: ExistsRow = diesel::sql_query(
        "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1) AS present",
    )
    .bind::<Text, _>(schema_name)
    .get_result(conn)?;

    Ok(row.present)
}

/// Creates the physical schema. Fails if it already exists; the caller
/// decides whether an existing schema is acceptable.
pub fn create_schema(conn: &mut PgConnection, schema_name: &str) -> Result<(), SchemaError> {
    validate_schema_name(schema_name)?;

    if schema_exists(conn, schema_name)? {
        return Err(SchemaError::AlreadyExists(schema_name.to_string()));
    }

    diesel::sql_query(format!("CREATE SCHEMA \"{schema_name}\"")).execute(conn)?;
    Ok(())
}

/// Applies pending structural changes for a schema. Idempotent. For the
/// public schema this also runs the shared-table migrations; tenant schemas
/// receive the per-tenant tables only.
pub fn run_migrations(
    conn: &mut PgConnection,
    schema_name: &str,
    is_tenant_schema: bool,
) -> Result<(), MigrationError> {
    if !is_tenant_schema {
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| MigrationError::Failed {
                schema: schema_name.to_string(),
                message: err.to_string(),
            })?;
    }

    with_schema(conn, schema_name, |conn| {
        conn.batch_execute(TENANT_SCHEMA_DDL)
            .map_err(MigrationError::from)
    })?;

    tracing::debug!(schema = %schema_name, tenant = is_tenant_schema, "schema migrated");
    Ok(())
}
