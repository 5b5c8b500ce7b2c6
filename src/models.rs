use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

/// Creation/modification timestamps shared by the durable entities.
/// Embedded by value rather than inherited; columns are filled by the
/// database defaults and the `diesel_manage_updated_at` trigger.
#[derive(Debug, Clone, Queryable)]
pub struct AuditFields {
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Activation state shared by entities that can be switched off without
/// being deleted.
#[derive(Debug, Clone, Queryable)]
pub struct ActivationFields {
    pub is_active: bool,
    pub activated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub approval_status: String,
    pub organisation_codes: Option<Vec<String>>,
    pub author_id: Option<Uuid>,
    pub is_deleted: bool,
    pub date_joined: NaiveDateTime,
    pub activation: ActivationFields,
    pub audit: AuditFields,
}

type UserRow = (
    Uuid,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    bool,
    bool,
    String,
    Option<Vec<String>>,
    Option<Uuid>,
    bool,
    NaiveDateTime,
    bool,
    Option<NaiveDateTime>,
    NaiveDateTime,
    NaiveDateTime,
);

// The derived `Queryable` cannot map a flat table select onto the embedded
// `ActivationFields`/`AuditFields` groups, so the row-to-struct mapping is
// spelled out by hand; the field order mirrors `schema::users` exactly.
impl<DB, ST> Queryable<ST, DB> for User
where
    DB: diesel::backend::Backend,
    UserRow: diesel::deserialize::FromStaticSqlRow<ST, DB>,
{
    type Row = UserRow;

    fn build(row: Self::Row) -> diesel::deserialize::Result<Self> {
        Ok(User {
            id: row.0,
            email: row.1,
            username: row.2,
            password_hash: row.3,
            first_name: row.4,
            last_name: row.5,
            is_staff: row.6,
            is_superuser: row.7,
            approval_status: row.8,
            organisation_codes: row.9,
            author_id: row.10,
            is_deleted: row.11,
            date_joined: row.12,
            activation: ActivationFields {
                is_active: row.13,
                activated_at: row.14,
            },
            audit: AuditFields {
                created_at: row.15,
                updated_at: row.16,
            },
        })
    }
}

impl User {
    /// Capitalised "First Last", falling back to the username when no name
    /// parts are recorded.
    pub fn full_name(&self) -> String {
        let parts: Vec<String> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .map(capitalize)
            .collect();

        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub approval_status: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Identifiable)]
#[diesel(table_name = organisations)]
pub struct Organisation {
    pub id: Uuid,
    pub schema_name: String,
    pub name: String,
    pub email: Option<String>,
    pub description: Option<String>,
    pub organisation_code: Option<String>,
    pub quater: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub phone: Option<String>,
    pub approval_status: String,
    pub owner_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub is_deleted: bool,
    pub activation: ActivationFields,
    pub audit: AuditFields,
}

type OrganisationRow = (
    Uuid,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<Uuid>,
    Option<Uuid>,
    serde_json::Value,
    bool,
    bool,
    Option<NaiveDateTime>,
    NaiveDateTime,
    NaiveDateTime,
);

// Hand-written for the same reason as `User`: the embedded field groups do
// not line up with the flat `schema::organisations` select.
impl<DB, ST> Queryable<ST, DB> for Organisation
where
    DB: diesel::backend::Backend,
    OrganisationRow: diesel::deserialize::FromStaticSqlRow<ST, DB>,
{
    type Row = OrganisationRow;

    fn build(row: Self::Row) -> diesel::deserialize::Result<Self> {
        Ok(Organisation {
            id: row.0,
            schema_name: row.1,
            name: row.2,
            email: row.3,
            description: row.4,
            organisation_code: row.5,
            quater: row.6,
            address_line1: row.7,
            address_line2: row.8,
            phone: row.9,
            approval_status: row.10,
            owner_id: row.11,
            author_id: row.12,
            metadata: row.13,
            is_deleted: row.14,
            activation: ActivationFields {
                is_active: row.15,
                activated_at: row.16,
            },
            audit: AuditFields {
                created_at: row.17,
                updated_at: row.18,
            },
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = organisations)]
pub struct NewOrganisation {
    pub id: Uuid,
    pub schema_name: String,
    pub name: String,
    pub organisation_code: String,
    pub quater: Option<String>,
    pub address_line1: Option<String>,
    pub approval_status: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = user_tenants)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Organisation, foreign_key = tenant_id))]
#[diesel(primary_key(user_id, tenant_id))]
pub struct UserTenant {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_tenants)]
pub struct NewUserTenant {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

#[derive(Debug, Clone, Identifiable)]
#[diesel(table_name = domains)]
pub struct Domain {
    pub id: Uuid,
    pub domain: String,
    pub tenant_id: Option<Uuid>,
    pub is_primary: bool,
    pub audit: AuditFields,
}

type DomainRow = (Uuid, String, Option<Uuid>, bool, NaiveDateTime, NaiveDateTime);

// Hand-written for the same reason as `User`: the embedded audit group does
// not line up with the flat `schema::domains` select.
impl<DB, ST> Queryable<ST, DB> for Domain
where
    DB: diesel::backend::Backend,
    DomainRow: diesel::deserialize::FromStaticSqlRow<ST, DB>,
{
    type Row = DomainRow;

    fn build(row: Self::Row) -> diesel::deserialize::Result<Self> {
        Ok(Domain {
            id: row.0,
            domain: row.1,
            tenant_id: row.2,
            is_primary: row.3,
            audit: AuditFields {
                created_at: row.4,
                updated_at: row.5,
            },
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = domains)]
pub struct NewDomain {
    pub id: Uuid,
    pub domain: String,
    pub tenant_id: Option<Uuid>,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = groups)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = groups)]
pub struct NewGroup {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = user_tenant_permissions)]
pub struct UserTenantPermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_tenant_permissions)]
pub struct NewUserTenantPermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = permission_groups)]
#[diesel(belongs_to(UserTenantPermission, foreign_key = permission_id))]
#[diesel(belongs_to(Group))]
#[diesel(primary_key(permission_id, group_id))]
pub struct PermissionGroup {
    pub permission_id: Uuid,
    pub group_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = permission_groups)]
pub struct NewPermissionGroup {
    pub permission_id: Uuid,
    pub group_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = profiles)]
#[diesel(belongs_to(User))]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub quater: Option<String>,
    pub profile_type: String,
    pub gender: Option<String>,
    pub photo_key: Option<String>,
    pub document_key: Option<String>,
    pub certifications: Option<String>,
    pub metadata: serde_json::Value,
    pub is_deleted: bool,
    #[diesel(embed)]
    pub activation: ActivationFields,
    #[diesel(embed)]
    pub audit: AuditFields,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile_type: String,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = otps)]
#[diesel(belongs_to(User))]
pub struct Otp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub otp_code: Option<String>,
    #[diesel(embed)]
    pub audit: AuditFields,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = otps)]
pub struct NewOtp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub otp_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::capitalize;

    #[test]
    fn capitalizes_first_letter_only() {
        assert_eq!(capitalize("ada"), "Ada");
        assert_eq!(capitalize("lovelace"), "Lovelace");
        assert_eq!(capitalize(""), "");
    }
}
