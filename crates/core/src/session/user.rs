use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Simulated login. Nothing here authenticates anyone.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Credentials {
    SignIn {
        email: String,
        #[serde(default)]
        name: Option<String>,
    },
    SignUp {
        email: String,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("email is required")]
    MissingEmail,

    #[error("name is required to create an account")]
    MissingName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub display_name: String,
}

impl UserProfile {
    pub fn sign_in(credentials: Credentials) -> Result<Self, LoginError> {
        let (email, name) = match credentials {
            Credentials::SignIn { email, name } => (email, name),
            Credentials::SignUp { email, name } => {
                if name.trim().is_empty() {
                    return Err(LoginError::MissingName);
                }
                (email, Some(name))
            }
        };

        let email = email.trim().to_string();
        if email.is_empty() {
            return Err(LoginError::MissingEmail);
        }

        let display_name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(Self {
            email,
            display_name,
        })
    }

    /// Up to two uppercase initials from the display name.
    pub fn initials(&self) -> String {
        self.display_name
            .split(' ')
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}
