//! Role/group store. Every function here reads or writes the group tables of
//! whichever schema the connection search_path currently points at; callers
//! establish that context explicitly with `tenancy::context::with_schema`.

use diesel::dsl::exists;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{Group, NewGroup, NewPermissionGroup, NewUserTenantPermission, User, UserTenantPermission};
use crate::schema::{groups, permission_groups, user_tenant_permissions, users};

pub fn ensure_group(conn: &mut PgConnection, name: &str) -> QueryResult<Group> {
    let existing: Option<Group> = groups::table
        .filter(groups::name.eq(name))
        .first(conn)
        .optional()?;

    if let Some(group) = existing {
        return Ok(group);
    }

    let new_group = NewGroup {
        id: Uuid::new_v4(),
        name: name.to_string(),
    };
    diesel::insert_into(groups::table)
        .values(&new_group)
        .execute(conn)?;

    groups::table.find(new_group.id).first(conn)
}

/// Fetches or creates the per-tenant permission record for a user. Flags only
/// ever widen: a record created without staff/superuser rights is elevated
/// when a later caller requests them.
pub fn ensure_permissions(
    conn: &mut PgConnection,
    user_id: Uuid,
    is_staff: bool,
    is_superuser: bool,
) -> QueryResult<UserTenantPermission> {
    let existing: Option<UserTenantPermission> = user_tenant_permissions::table
        .filter(user_tenant_permissions::user_id.eq(user_id))
        .first(conn)
        .optional()?;

    if let Some(record) = existing {
        if (is_staff && !record.is_staff) || (is_superuser && !record.is_superuser) {
            return diesel::update(user_tenant_permissions::table.find(record.id))
                .set((
                    user_tenant_permissions::is_staff.eq(record.is_staff || is_staff),
                    user_tenant_permissions::is_superuser.eq(record.is_superuser || is_superuser),
                ))
                .get_result(conn);
        }
        return Ok(record);
    }

    let new_record = NewUserTenantPermission {
        id: Uuid::new_v4(),
        user_id,
        is_staff,
        is_superuser,
    };
    diesel::insert_into(user_tenant_permissions::table)
        .values(&new_record)
        .execute(conn)?;

    user_tenant_permissions::table.find(new_record.id).first(conn)
}

/// Attaches a group to a permission record; idempotent.
pub fn attach_group(
    conn: &mut PgConnection,
    permission_id: Uuid,
    group_id: Uuid,
) -> QueryResult<()> {
    diesel::insert_into(permission_groups::table)
        .values(&NewPermissionGroup {
            permission_id,
            group_id,
        })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

/// Whether the user holds the named role in the active schema.
pub fn user_in_group(
    conn: &mut PgConnection,
    user_id: Uuid,
    group_name: &str,
) -> QueryResult<bool> {
    diesel::select(exists(
        user_tenant_permissions::table
            .inner_join(permission_groups::table.inner_join(groups::table))
            .filter(user_tenant_permissions::user_id.eq(user_id))
            .filter(groups::name.eq(group_name)),
    ))
    .get_result(conn)
}

/// Role-filtered user view: the users holding the named role in the active
/// schema. Replaces per-role subclassing with a single parameterised query.
pub fn users_with_role(conn: &mut PgConnection, group_name: &str) -> QueryResult<Vec<User>> {
    users::table
        .inner_join(
            user_tenant_permissions::table
                .inner_join(permission_groups::table.inner_join(groups::table)),
        )
        .filter(groups::name.eq(group_name))
        .order(users::email.asc())
        .select(users::all_columns)
        .load(conn)
}
