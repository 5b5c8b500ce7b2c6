use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::domains;
use crate::error::{AppError, AppResult};
use crate::models::{Domain, Organisation};
use crate::schema::organisations;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BindDomainRequest {
    pub domain: String,
    pub tenant_id: Uuid,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Serialize)]
pub struct DomainInfo {
    pub id: Uuid,
    pub domain: String,
    pub tenant_id: Option<Uuid>,
    pub is_primary: bool,
}

pub async fn list_domains(State(state): State<AppState>) -> AppResult<Json<Vec<DomainInfo>>> {
    let mut conn = state.db()?;
    let rows = domains::list_domains(&mut conn)?;
    Ok(Json(rows.into_iter().map(domain_to_info).collect()))
}

pub async fn bind_domain(
    State(state): State<AppState>,
    Json(payload): Json<BindDomainRequest>,
) -> AppResult<Json<DomainInfo>> {
    let hostname = payload.domain.trim();
    if hostname.is_empty() {
        return Err(AppError::bad_request("domain must not be empty"));
    }

    let mut conn = state.db()?;

    let _tenant: Organisation = organisations::table
        .find(payload.tenant_id)
        .first(&mut conn)?;

    let domain = match domains::bind_domain(&mut conn, hostname, payload.tenant_id, payload.is_primary)
    {
        Ok(domain) => domain,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::bad_request("domain already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    };

    Ok(Json(domain_to_info(domain)))
}

pub async fn detach_domain(
    State(state): State<AppState>,
    Path(domain_id): Path<Uuid>,
) -> AppResult<Json<DomainInfo>> {
    let mut conn = state.db()?;
    let domain = domains::detach_domain(&mut conn, domain_id)?;
    Ok(Json(domain_to_info(domain)))
}

pub async fn delete_domain(
    State(state): State<AppState>,
    Path(domain_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    domains::delete_domain(&mut conn, domain_id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn domain_to_info(domain: Domain) -> DomainInfo {
    DomainInfo {
        id: domain.id,
        domain: domain.domain,
        tenant_id: domain.tenant_id,
        is_primary: domain.is_primary,
    }
}
