use diesel::dsl::exists;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{NewUser, NewUserTenant, User};
use crate::roles::ApprovalStatus;
use crate::schema::{user_tenants, users};

pub struct NewUserParams {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub approval_status: ApprovalStatus,
    pub is_active: bool,
}

/// Lowercases the domain part of an email address; the local part is left
/// untouched apart from surrounding whitespace.
pub fn normalize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => trimmed.to_string(),
    }
}

pub fn email_exists(conn: &mut PgConnection, email: &str) -> QueryResult<bool> {
    diesel::select(exists(users::table.filter(users::email.eq(email)))).get_result(conn)
}

pub fn find_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .first(conn)
        .optional()
}

/// Inserts the user record. The password arrives already hashed; the raw
/// credential never reaches this module.
pub fn create_user(conn: &mut PgConnection, params: NewUserParams) -> QueryResult<User> {
    let new_user = NewUser {
        id: Uuid::new_v4(),
        email: params.email,
        username: params.username,
        password_hash: params.password_hash,
        first_name: params.first_name,
        last_name: params.last_name,
        is_staff: params.is_staff,
        is_superuser: params.is_superuser,
        approval_status: params.approval_status.as_str().to_string(),
        is_active: params.is_active,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)?;

    users::table.find(new_user.id).first(conn)
}

/// Establishes tenant membership. Idempotent: adding an existing member is a
/// no-op, not an error.
pub fn add_to_tenant(conn: &mut PgConnection, user_id: Uuid, tenant_id: Uuid) -> QueryResult<()> {
    diesel::insert_into(user_tenants::table)
        .values(&NewUserTenant { user_id, tenant_id })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

pub fn membership_count(conn: &mut PgConnection, user_id: Uuid, tenant_id: Uuid) -> QueryResult<i64> {
    user_tenants::table
        .filter(user_tenants::user_id.eq(user_id))
        .filter(user_tenants::tenant_id.eq(tenant_id))
        .count()
        .get_result(conn)
}
