//! Authentication port

/// Identity of the signed-in actor
pub trait AuthProvider: Send + Sync {
    /// Id of the current user, `None` when signed out
    fn current_user_id(&self) -> Option<String>;
}
