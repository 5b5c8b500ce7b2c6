use diesel::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Domain, NewDomain};
use crate::schema::domains;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("cannot delete the primary domain")]
    IsPrimary,
    #[error("cannot delete a domain that is still bound to a tenant")]
    StillBound,
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub fn list_domains(conn: &mut PgConnection) -> QueryResult<Vec<Domain>> {
    domains::table.order(domains::domain.asc()).load(conn)
}

pub fn find_domain(conn: &mut PgConnection, domain_id: Uuid) -> QueryResult<Domain> {
    domains::table.find(domain_id).first(conn)
}

/// Maps a hostname to a tenant. Binding a new primary domain demotes the
/// tenant's current primary first, so exactly one primary survives (a partial
/// unique index backs this up).
pub fn bind_domain(
    conn: &mut PgConnection,
    hostname: &str,
    tenant_id: Uuid,
    is_primary: bool,
) -> QueryResult<Domain> {
    if is_primary {
        diesel::update(
            domains::table
                .filter(domains::tenant_id.eq(Some(tenant_id)))
                .filter(domains::is_primary.eq(true)),
        )
        .set(domains::is_primary.eq(false))
        .execute(conn)?;
    }

    let new_domain = NewDomain {
        id: Uuid::new_v4(),
        domain: hostname.to_string(),
        tenant_id: Some(tenant_id),
        is_primary,
    };
    diesel::insert_into(domains::table)
        .values(&new_domain)
        .execute(conn)?;

    domains::table.find(new_domain.id).first(conn)
}

/// Clears the tenant reference (and the primary flag with it) so the record
/// becomes deletable. A detached domain no longer routes anywhere.
pub fn detach_domain(conn: &mut PgConnection, domain_id: Uuid) -> QueryResult<Domain> {
    diesel::update(domains::table.find(domain_id))
        .set((
            domains::tenant_id.eq(None::<Uuid>),
            domains::is_primary.eq(false),
        ))
        .get_result(conn)
}

/// Removal is a two-step protocol: the domain must be detached and
/// non-primary before deletion succeeds, so a live routing entry can never
/// be dropped by accident.
pub fn delete_domain(conn: &mut PgConnection, domain_id: Uuid) -> Result<(), DomainError> {
    let domain = find_domain(conn, domain_id)?;

    if domain.is_primary {
        return Err(DomainError::IsPrimary);
    }
    if domain.tenant_id.is_some() {
        return Err(DomainError::StillBound);
    }

    diesel::delete(domains::table.find(domain_id)).execute(conn)?;
    Ok(())
}
