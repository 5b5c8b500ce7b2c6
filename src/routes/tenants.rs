use axum::extract::{Json, Path, Query, State};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::{groups, tenants};
use crate::error::{AppError, AppResult};
use crate::models::{Organisation, User};
use crate::provisioning::{self, TenantRequest, UserRequest};
use crate::state::AppState;
use crate::tenancy::context::with_schema;

#[derive(Deserialize)]
pub struct ProvisionTenantRequest {
    pub name: String,
    pub schema_name: String,
    pub quater: Option<String>,
    pub address_line1: Option<String>,
    pub admin_email: String,
    pub admin_first_name: String,
    pub admin_last_name: String,
    pub domain: String,
    pub password: Option<String>,
    #[serde(default)]
    pub generate_password: bool,
}

#[derive(Deserialize)]
pub struct ProvisionUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub password: Option<String>,
    #[serde(default)]
    pub generate_password: bool,
}

#[derive(Serialize)]
pub struct TenantInfo {
    pub id: Uuid,
    pub schema_name: String,
    pub name: String,
    pub organisation_code: Option<String>,
    pub approval_status: String,
    pub is_active: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub approval_status: String,
}

#[derive(Serialize)]
pub struct ProvisionTenantResponse {
    pub tenant: TenantInfo,
    pub admin: UserInfo,
    pub domain: String,
    pub assigned_role: String,
    /// Present only when the password was generated server-side; shown once
    /// and never persisted in clear form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
}

#[derive(Serialize)]
pub struct ProvisionUserResponse {
    pub user: UserInfo,
    pub tenant_schema: String,
    pub assigned_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
}

#[derive(Deserialize)]
pub struct RoleQuery {
    pub role: String,
}

pub async fn list_tenants(State(state): State<AppState>) -> AppResult<Json<Vec<TenantInfo>>> {
    let mut conn = state.db()?;
    let rows = tenants::list_tenants(&mut conn)?;
    Ok(Json(rows.into_iter().map(tenant_to_info).collect()))
}

pub async fn provision_tenant(
    State(state): State<AppState>,
    Json(payload): Json<ProvisionTenantRequest>,
) -> AppResult<Json<ProvisionTenantResponse>> {
    let (password, generated) = resolve_password(payload.password, payload.generate_password)?;

    let request = TenantRequest {
        name: payload.name,
        schema_name: payload.schema_name,
        quater: payload.quater,
        address_line1: payload.address_line1,
        email: payload.admin_email,
        first_name: payload.admin_first_name,
        last_name: payload.admin_last_name,
        domain: payload.domain,
        password,
    };

    let mut conn = state.db()?;
    let provisioned =
        provisioning::provision_tenant(&mut conn, &state.config.public_schema_name, request)?;

    Ok(Json(ProvisionTenantResponse {
        tenant: tenant_to_info(provisioned.tenant),
        admin: user_to_info(&provisioned.admin),
        domain: provisioned.domain.domain,
        assigned_role: provisioned.role.to_string(),
        generated_password: generated,
    }))
}

pub async fn provision_user(
    State(state): State<AppState>,
    Path(schema_name): Path<String>,
    Json(payload): Json<ProvisionUserRequest>,
) -> AppResult<Json<ProvisionUserResponse>> {
    let (password, generated) = resolve_password(payload.password, payload.generate_password)?;

    let request = UserRequest {
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        schema_name,
        role: payload.role,
        password,
    };

    let mut conn = state.db()?;
    let provisioned = provisioning::provision_user(&mut conn, request)?;

    Ok(Json(ProvisionUserResponse {
        user: user_to_info(&provisioned.user),
        tenant_schema: provisioned.tenant.schema_name,
        assigned_role: provisioned.role.to_string(),
        generated_password: generated,
    }))
}

/// Lists the users holding a role inside one tenant's schema. The same user
/// can show up here for one tenant and not another.
pub async fn list_users_with_role(
    State(state): State<AppState>,
    Path(schema_name): Path<String>,
    Query(query): Query<RoleQuery>,
) -> AppResult<Json<Vec<UserInfo>>> {
    let mut conn = state.db()?;

    let tenant = tenants::find_by_schema(&mut conn, &schema_name)?;
    if tenant.is_none() {
        return Err(AppError::not_found());
    }

    let users: Vec<User> = with_schema(&mut conn, &schema_name, |conn| {
        groups::users_with_role(conn, &query.role).map_err(AppError::from)
    })?;

    Ok(Json(users.iter().map(user_to_info).collect()))
}

fn resolve_password(
    password: Option<String>,
    generate: bool,
) -> AppResult<(String, Option<String>)> {
    if generate {
        let generated = provisioning::generate_password(&mut rand::thread_rng());
        return Ok((generated.clone(), Some(generated)));
    }
    match password {
        Some(password) if !password.trim().is_empty() => Ok((password, None)),
        _ => Err(AppError::bad_request(
            "password is required unless generate_password is set",
        )),
    }
}

fn tenant_to_info(tenant: Organisation) -> TenantInfo {
    TenantInfo {
        id: tenant.id,
        schema_name: tenant.schema_name,
        name: tenant.name,
        organisation_code: tenant.organisation_code,
        approval_status: tenant.approval_status,
        is_active: tenant.activation.is_active,
        owner_id: tenant.owner_id,
        created_at: to_iso(tenant.audit.created_at),
    }
}

fn user_to_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name(),
        is_staff: user.is_staff,
        is_superuser: user.is_superuser,
        approval_status: user.approval_status.clone(),
    }
}

pub(super) fn to_iso(value: NaiveDateTime) -> String {
    value.and_utc().to_rfc3339()
}
