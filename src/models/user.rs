//! User model

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::UserId;

/// User record as seen by the submission lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub role: Role,
    pub status: AccountStatus,
}

impl UserInfo {
    /// Check if the account may submit code
    pub fn is_active(&self) -> bool {
        matches!(self.status, AccountStatus::Normal)
    }
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::User),
            1 => Some(Self::Admin),
            2 => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Administrator tier, allowed to bypass ownership checks
    pub fn is_elevated(&self) -> bool {
        match self {
            Self::User => false,
            Self::Admin | Self::SuperAdmin => true,
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            _ => Err(()),
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Normal,
    Disabled,
}

impl AccountStatus {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Identity of the party making a request, as resolved from its token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Owner of the resource or administrator
    pub fn can_access(&self, owner_id: UserId) -> bool {
        self.user_id == owner_id || self.is_elevated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_elevation() {
        assert!(!Role::User.is_elevated());
        assert!(Role::Admin.is_elevated());
        assert!(Role::SuperAdmin.is_elevated());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("super_admin".parse::<Role>(), Ok(Role::SuperAdmin));
        assert_eq!("USER".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_caller_access() {
        let user = Caller::new(7, Role::User);
        assert!(user.can_access(7));
        assert!(!user.can_access(8));
        assert!(Caller::new(1, Role::Admin).can_access(8));
    }
}
