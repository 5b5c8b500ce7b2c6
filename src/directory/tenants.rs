use diesel::dsl::exists;
use diesel::prelude::*;
use rand::Rng;
use uuid::Uuid;

use crate::models::{NewOrganisation, Organisation};
use crate::roles::ApprovalStatus;
use crate::schema::organisations;

pub const ORGANISATION_CODE_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub struct NewTenantParams {
    pub schema_name: String,
    pub name: String,
    pub quater: Option<String>,
    pub address_line1: Option<String>,
    pub approval_status: ApprovalStatus,
    pub is_active: bool,
}

pub fn schema_name_exists(conn: &mut PgConnection, schema_name: &str) -> QueryResult<bool> {
    diesel::select(exists(
        organisations::table.filter(organisations::schema_name.eq(schema_name)),
    ))
    .get_result(conn)
}

pub fn name_exists(conn: &mut PgConnection, name: &str) -> QueryResult<bool> {
    diesel::select(exists(
        organisations::table.filter(organisations::name.eq(name)),
    ))
    .get_result(conn)
}

pub fn find_by_schema(
    conn: &mut PgConnection,
    schema_name: &str,
) -> QueryResult<Option<Organisation>> {
    organisations::table
        .filter(organisations::schema_name.eq(schema_name))
        .first(conn)
        .optional()
}

pub fn list_tenants(conn: &mut PgConnection) -> QueryResult<Vec<Organisation>> {
    organisations::table
        .filter(organisations::is_deleted.eq(false))
        .order(organisations::created_at.asc())
        .load(conn)
}

/// Creates the tenant record. The organisation code is auto-assigned; the
/// caller is expected to have pre-checked schema/name uniqueness for readable
/// errors, the unique constraints remain the authoritative guard.
pub fn create_tenant(
    conn: &mut PgConnection,
    params: NewTenantParams,
) -> QueryResult<Organisation> {
    let code = unique_organisation_code(conn)?;
    let new_tenant = NewOrganisation {
        id: Uuid::new_v4(),
        schema_name: params.schema_name,
        name: params.name,
        organisation_code: code,
        quater: params.quater,
        address_line1: params.address_line1,
        approval_status: params.approval_status.as_str().to_string(),
        is_active: params.is_active,
    };

    diesel::insert_into(organisations::table)
        .values(&new_tenant)
        .execute(conn)?;

    organisations::table.find(new_tenant.id).first(conn)
}

pub fn set_owner(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    owner_id: Uuid,
) -> QueryResult<Organisation> {
    diesel::update(organisations::table.find(tenant_id))
        .set(organisations::owner_id.eq(Some(owner_id)))
        .get_result(conn)
}

/// Rejection sampling over the 36^8 code space; with any realistic number of
/// tenants the expected retry count is ~1.
fn unique_organisation_code(conn: &mut PgConnection) -> QueryResult<String> {
    let mut rng = rand::thread_rng();
    unique_code_with(&mut rng, |code| {
        diesel::select(exists(
            organisations::table.filter(organisations::organisation_code.eq(code)),
        ))
        .get_result(conn)
    })
}

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ORGANISATION_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

fn unique_code_with<R, F, E>(rng: &mut R, mut taken: F) -> Result<String, E>
where
    R: Rng + ?Sized,
    F: FnMut(&str) -> Result<bool, E>,
{
    loop {
        let code = generate_code(rng);
        if !taken(&code)? {
            return Ok(code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn codes_are_eight_uppercase_alphanumerics() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), ORGANISATION_CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn retries_until_a_free_code_is_found() {
        // Replay the same RNG sequence: the first draw is taken, so the
        // sampler must come back with the second.
        let mut reference = StdRng::seed_from_u64(7);
        let first = generate_code(&mut reference);
        let second = generate_code(&mut reference);
        assert_ne!(first, second);

        let mut rng = StdRng::seed_from_u64(7);
        let code = unique_code_with(&mut rng, |candidate| {
            Ok::<_, Infallible>(candidate == first)
        })
        .unwrap();
        assert_eq!(code, second);
    }

    #[test]
    fn returns_first_code_when_store_is_empty() {
        let mut reference = StdRng::seed_from_u64(11);
        let expected = generate_code(&mut reference);

        let mut rng = StdRng::seed_from_u64(11);
        let code = unique_code_with(&mut rng, |_| Ok::<_, Infallible>(false)).unwrap();
        assert_eq!(code, expected);
    }
}
