//! Squad/community membership roles used for moderation permission checks.

/// Role of a member within a squad or community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    Moderator,
    Member,
}

/// Roles allowed to resolve verification queue entries.
pub const MODERATION_ROLES: &[&str] = &["owner", "admin", "moderator"];

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Member => "member",
        }
    }

    /// Parse a stored role name; unknown names demote to plain membership.
    pub fn parse_or_member(value: &str) -> Self {
        match value {
            "owner" => Role::Owner,
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            _ => Role::Member,
        }
    }

    /// Whether this role may approve/reject verification queue entries.
    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::Moderator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_roles_match_can_moderate() {
        for name in MODERATION_ROLES {
            assert!(Role::parse_or_member(name).can_moderate());
        }
        assert!(!Role::Member.can_moderate());
        assert!(!Role::parse_or_member("stranger").can_moderate());
    }
}
