use serde::{Deserialize, Serialize};

/// Identity of the caller, resolved by the auth layer in front of the service
/// and passed explicitly to every operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    user_id: String,
}

impl AuthenticatedUser {
    pub fn new(user_id: String) -> Result<Self, String> {
        let trimmed = user_id.trim();
        if trimmed.is_empty() {
            return Err("User id cannot be empty".to_string());
        }

        Ok(Self {
            user_id: trimmed.to_string(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
