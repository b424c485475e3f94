//! Session-backed authentication

use crate::config::Config;
use crate::ports::AuthProvider;

/// Signed-in user taken from the local session settings
#[derive(Debug, Clone, Default)]
pub struct SessionAuth {
    user_id: Option<String>,
}

impl SessionAuth {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        }
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self::new(Some(user_id.into()))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.user_id().map(str::to_string))
    }
}

impl AuthProvider for SessionAuth {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_user_is_signed_out() {
        assert_eq!(SessionAuth::new(Some("  ".to_string())).current_user_id(), None);
        assert_eq!(
            SessionAuth::signed_in("u1").current_user_id().as_deref(),
            Some("u1")
        );
    }
}
