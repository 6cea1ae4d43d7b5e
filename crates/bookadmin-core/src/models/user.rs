use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User identifiers arrive as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{}", id),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

/// The logged-in account: id and type plus whatever profile fields the
/// backend returned, flattened into one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: UserId,
    pub user_type: String,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserIdentity {
    fn profile_str(&self, key: &str) -> Option<&str> {
        self.profile
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// Best available human-readable name
    pub fn display_name(&self) -> String {
        if let Some(name) = self
            .profile_str("full_name")
            .or_else(|| self.profile_str("name"))
        {
            return name.to_string();
        }

        let first = self.profile_str("first_name").unwrap_or_default();
        let last = self.profile_str("last_name").unwrap_or_default();
        let full = format!("{} {}", first, last).trim().to_string();
        if full.is_empty() {
            format!("User {}", self.user_id)
        } else {
            full
        }
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.profile_str("phone_number")
    }

    pub fn is_admin(&self) -> bool {
        self.user_type.eq_ignore_ascii_case("admin")
    }
}

/// `data` of a successful `/auth/login` response.
#[derive(Clone, Deserialize)]
pub struct LoginData {
    pub user_id: UserId,
    pub user_type: String,
    #[serde(default)]
    pub profile: Map<String, Value>,
    pub token: String,
}

impl LoginData {
    /// Flatten the profile into an identity. `user_id` and `user_type` come
    /// from the top level even if the profile repeats them.
    pub fn identity(&self) -> UserIdentity {
        let mut profile = self.profile.clone();
        profile.remove("user_id");
        profile.remove("user_type");
        UserIdentity {
            user_id: self.user_id.clone(),
            user_type: self.user_type.clone(),
            profile,
        }
    }
}

impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("user_id", &self.user_id)
            .field("user_type", &self.user_type)
            .field("profile", &self.profile)
            .field("token", &"<redacted>")
            .finish()
    }
}
