//! User roles and permissions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Driver,
}

impl Role {
    /// Only admins may run CSV imports
    pub fn can_import(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Roster and expense edits
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "driver" => Ok(Role::Driver),
            other => Err(Error::validation(format!("Unknown role: {}", other))),
        }
    }
}
