use std::fmt;
use std::str::FromStr;

/// Role tags recognised by the platform. Membership is schema-local: the
/// same user can hold different roles in different tenant schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserGroup {
    Polycampus,
    AdminTenant,
    TeacherUser,
    StudentUser,
}

impl UserGroup {
    pub const ALL: [UserGroup; 4] = [
        UserGroup::Polycampus,
        UserGroup::AdminTenant,
        UserGroup::TeacherUser,
        UserGroup::StudentUser,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UserGroup::Polycampus => "polycampus",
            UserGroup::AdminTenant => "AdminTenant",
            UserGroup::TeacherUser => "TeacherUser",
            UserGroup::StudentUser => "StudentUser",
        }
    }

    /// Roles that carry staff/superuser flags.
    pub fn is_admin(self) -> bool {
        matches!(self, UserGroup::Polycampus | UserGroup::AdminTenant)
    }

    /// The group assigned to a tenant's admin user: `polycampus` for the
    /// root (public) schema, `AdminTenant` everywhere else.
    pub fn admin_group_for_schema(schema_name: &str, public_schema: &str) -> UserGroup {
        if schema_name == public_schema {
            UserGroup::Polycampus
        } else {
            UserGroup::AdminTenant
        }
    }

    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(|group| group.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for UserGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserGroup {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == value)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Disapproved,
    Removed,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Disapproved => "DISAPPROVED",
            ApprovalStatus::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_role() {
        for group in UserGroup::ALL {
            assert_eq!(group.as_str().parse::<UserGroup>(), Ok(group));
        }
        assert!("Unknown".parse::<UserGroup>().is_err());
        // Role names are case-sensitive.
        assert!("admintenant".parse::<UserGroup>().is_err());
    }

    #[test]
    fn only_platform_and_tenant_admins_are_elevated() {
        assert!(UserGroup::Polycampus.is_admin());
        assert!(UserGroup::AdminTenant.is_admin());
        assert!(!UserGroup::TeacherUser.is_admin());
        assert!(!UserGroup::StudentUser.is_admin());
    }

    #[test]
    fn public_schema_gets_the_platform_group() {
        assert_eq!(
            UserGroup::admin_group_for_schema("public", "public"),
            UserGroup::Polycampus
        );
        assert_eq!(
            UserGroup::admin_group_for_schema("tenant1", "public"),
            UserGroup::AdminTenant
        );
    }
}
