use serde::{Deserialize, Serialize};

/// A registered user as held by the credential store.
///
/// `password_hash` is opaque verification material produced by the
/// password hasher; it never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub disabled: bool,
}

impl Identity {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            full_name: None,
            email: None,
            disabled: false,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub disabled: bool,
}

impl From<&Identity> for UserProfile {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            full_name: identity.full_name.clone(),
            email: identity.email.clone(),
            disabled: identity.disabled,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
