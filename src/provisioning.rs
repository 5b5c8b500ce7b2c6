//! Tenant and user provisioning workflows.
//!
//! Both workflows validate their inputs up front (no side effects), then run
//! every mutation on one connection inside one transaction. Because schema
//! DDL issued on that connection participates in the same transaction, a
//! failure at any step rolls back the tenant row, the physical schema and
//! everything in between; no partial tenant is ever visible.

use diesel::prelude::*;
use rand::Rng;
use thiserror::Error;

use crate::auth::password;
use crate::directory::{domains, groups, tenants, users};
use crate::models::{Domain, Organisation, User};
use crate::roles::{ApprovalStatus, UserGroup};
use crate::tenancy::context::{validate_schema_name, with_schema};
use crate::tenancy::registry;
use crate::tenancy::{MigrationError, SchemaError};

pub const GENERATED_PASSWORD_LEN: usize = 12;
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789\
      !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error("failed to hash password: {0}")]
    PasswordHash(String),
    #[error("database error: {0}")]
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for ProvisionError {
    fn from(err: diesel::result::Error) -> Self {
        // A unique-constraint conflict at commit time is a race between two
        // operators, not a crash: surface it as a recoverable validation
        // failure.
        match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                ref info,
            ) => ProvisionError::Validation(format!("already exists: {}", info.message())),
            other => ProvisionError::Database(other),
        }
    }
}

/// Parameters for provisioning a new tenant with its admin user and primary
/// domain.
#[derive(Debug, Clone)]
pub struct TenantRequest {
    pub name: String,
    pub schema_name: String,
    pub quater: Option<String>,
    pub address_line1: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub domain: String,
    pub password: String,
}

impl TenantRequest {
    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.schema_name = self.schema_name.trim().to_lowercase();
        self.email = users::normalize_email(&self.email);
        self.quater = self
            .quater
            .map(|q| q.trim().to_uppercase())
            .filter(|q| !q.is_empty());
        self.domain = self.domain.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), ProvisionError> {
        require("tenant name", &self.name)?;
        require("schema name", &self.schema_name)?;
        require("admin email", &self.email)?;
        require("admin first name", &self.first_name)?;
        require("admin last name", &self.last_name)?;
        require("domain", &self.domain)?;
        require("password", &self.password)?;
        Ok(())
    }
}

/// Parameters for adding a new user to an existing tenant.
#[derive(Debug, Clone)]
pub struct UserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub schema_name: String,
    pub role: String,
    pub password: String,
}

impl UserRequest {
    fn normalized(mut self) -> Self {
        self.email = users::normalize_email(&self.email);
        self.schema_name = self.schema_name.trim().to_lowercase();
        self.role = self.role.trim().to_string();
        self
    }

    fn validate(&self) -> Result<(), ProvisionError> {
        require("email", &self.email)?;
        require("first name", &self.first_name)?;
        require("last name", &self.last_name)?;
        require("schema name", &self.schema_name)?;
        require("role", &self.role)?;
        require("password", &self.password)?;
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), ProvisionError> {
    if value.trim().is_empty() {
        return Err(ProvisionError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[derive(Debug)]
pub struct ProvisionedTenant {
    pub tenant: Organisation,
    pub admin: User,
    pub domain: Domain,
    pub role: UserGroup,
}

#[derive(Debug)]
pub struct ProvisionedUser {
    pub user: User,
    pub tenant: Organisation,
    pub role: UserGroup,
}

/// Creates a fully functional tenant: tenant record, isolated schema with
/// migrations applied, admin user (owner), primary domain and the admin role
/// assignment inside the new schema. All-or-nothing.
pub fn provision_tenant(
    conn: &mut PgConnection,
    public_schema: &str,
    request: TenantRequest,
) -> Result<ProvisionedTenant, ProvisionError> {
    let request = request.normalized();
    request.validate()?;
    validate_schema_name(&request.schema_name)?;

    // Fast, readable pre-checks; the unique constraints re-check at commit.
    if tenants::schema_name_exists(conn, &request.schema_name)? {
        return Err(ProvisionError::Validation(format!(
            "schema name {:?} already exists",
            request.schema_name
        )));
    }
    if tenants::name_exists(conn, &request.name)? {
        return Err(ProvisionError::Validation(format!(
            "tenant name {:?} already exists",
            request.name
        )));
    }
    if users::email_exists(conn, &request.email)? {
        return Err(ProvisionError::Validation(format!(
            "email {:?} is already in use",
            request.email
        )));
    }

    conn.transaction::<_, ProvisionError, _>(|conn| {
        let tenant = tenants::create_tenant(
            conn,
            tenants::NewTenantParams {
                schema_name: request.schema_name.clone(),
                name: request.name.clone(),
                quater: request.quater.clone(),
                address_line1: request.address_line1.clone(),
                approval_status: ApprovalStatus::Approved,
                is_active: true,
            },
        )?;
        tracing::info!(tenant = %tenant.name, schema = %tenant.schema_name, "created tenant");

        if !registry::schema_exists(conn, &request.schema_name)? {
            registry::create_schema(conn, &request.schema_name)?;
        }
        registry::run_migrations(
            conn,
            &request.schema_name,
            request.schema_name != public_schema,
        )?;
        tracing::info!(schema = %request.schema_name, "ran migrations");

        let password_hash = password::hash_password(&request.password)
            .map_err(|err| ProvisionError::PasswordHash(err.to_string()))?;
        let admin = users::create_user(
            conn,
            users::NewUserParams {
                email: request.email.clone(),
                username: request.email.clone(),
                password_hash,
                first_name: Some(request.first_name.clone()),
                last_name: Some(request.last_name.clone()),
                is_staff: true,
                is_superuser: true,
                approval_status: ApprovalStatus::Approved,
                is_active: true,
            },
        )?;
        users::add_to_tenant(conn, admin.id, tenant.id)?;
        let tenant = tenants::set_owner(conn, tenant.id, admin.id)?;
        tracing::info!(email = %admin.email, "created admin user");

        let domain = domains::bind_domain(conn, &request.domain, tenant.id, true)?;
        tracing::info!(domain = %domain.domain, "bound primary domain");

        let role = UserGroup::admin_group_for_schema(&request.schema_name, public_schema);
        with_schema(conn, &request.schema_name, |conn| {
            let group = groups::ensure_group(conn, role.as_str())?;
            let permissions = groups::ensure_permissions(conn, admin.id, true, true)?;
            groups::attach_group(conn, permissions.id, group.id)?;
            Ok::<_, ProvisionError>(())
        })?;
        tracing::info!(role = %role, schema = %request.schema_name, "assigned admin role");

        Ok(ProvisionedTenant {
            tenant,
            admin,
            domain,
            role,
        })
    })
}

/// Adds a new user to an existing tenant with the requested role. Admin-level
/// roles receive staff/superuser flags; everything else is unprivileged.
/// All-or-nothing, like tenant provisioning.
pub fn provision_user(
    conn: &mut PgConnection,
    request: UserRequest,
) -> Result<ProvisionedUser, ProvisionError> {
    let request = request.normalized();
    request.validate()?;

    let tenant = tenants::find_by_schema(conn, &request.schema_name)?.ok_or_else(|| {
        ProvisionError::Validation(format!(
            "tenant with schema name {:?} does not exist",
            request.schema_name
        ))
    })?;
    let role: UserGroup = request.role.parse().map_err(|_| {
        ProvisionError::Validation(format!(
            "invalid role {:?}, choose from: {}",
            request.role,
            UserGroup::names()
        ))
    })?;
    if users::email_exists(conn, &request.email)? {
        return Err(ProvisionError::Validation(format!(
            "email {:?} is already in use",
            request.email
        )));
    }

    conn.transaction::<_, ProvisionError, _>(|conn| {
        let elevated = role.is_admin();
        let password_hash = password::hash_password(&request.password)
            .map_err(|err| ProvisionError::PasswordHash(err.to_string()))?;
        let user = users::create_user(
            conn,
            users::NewUserParams {
                email: request.email.clone(),
                username: request.email.clone(),
                password_hash,
                first_name: Some(request.first_name.clone()),
                last_name: Some(request.last_name.clone()),
                is_staff: elevated,
                is_superuser: elevated,
                approval_status: ApprovalStatus::Approved,
                is_active: true,
            },
        )?;
        tracing::info!(email = %user.email, superuser = elevated, "created user");

        users::add_to_tenant(conn, user.id, tenant.id)?;

        with_schema(conn, &request.schema_name, |conn| {
            let group = groups::ensure_group(conn, role.as_str())?;
            let permissions = groups::ensure_permissions(conn, user.id, elevated, elevated)?;
            groups::attach_group(conn, permissions.id, group.id)?;
            Ok::<_, ProvisionError>(())
        })?;
        tracing::info!(role = %role, schema = %request.schema_name, "assigned role");

        Ok(ProvisionedUser { user, tenant, role })
    })
}

/// Generates a one-time operator password: 12 characters drawn uniformly
/// from letters, digits and punctuation. Displayed once, never persisted in
/// clear form.
pub fn generate_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..GENERATED_PASSWORD_LEN)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant_request() -> TenantRequest {
        TenantRequest {
            name: "Acme".to_string(),
            schema_name: "tenant1".to_string(),
            quater: Some("marche b".to_string()),
            address_line1: Some("1 Main St".to_string()),
            email: "Admin@ACME.Test".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            domain: "acme.local".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn generated_passwords_have_twelve_chars_from_the_alphabet() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let password = generate_password(&mut rng);
            assert_eq!(password.len(), GENERATED_PASSWORD_LEN);
            assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn normalization_lowercases_schema_and_email_domain() {
        let mut request = tenant_request();
        request.schema_name = "  Tenant1 ".to_string();
        let normalized = request.normalized();
        assert_eq!(normalized.schema_name, "tenant1");
        assert_eq!(normalized.email, "Admin@acme.test");
        assert_eq!(normalized.quater.as_deref(), Some("MARCHE B"));
    }

    #[test]
    fn missing_fields_fail_validation() {
        let mut request = tenant_request();
        request.last_name = String::new();
        let err = request.validate().unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(ref msg) if msg.contains("last name")));
    }

    #[test]
    fn unique_violations_become_validation_errors() {
        use diesel::result::{DatabaseErrorKind, Error};

        let err = ProvisionError::from(Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_string()),
        ));
        assert!(matches!(err, ProvisionError::Validation(_)));
    }
}
