use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Display name the backend assigns when none was given at registration
const DEFAULT_FULLNAME: &str = "User";

fn default_fullname() -> String {
    DEFAULT_FULLNAME.to_string()
}

/// Profile cached alongside the token after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct UserProfile {
    pub email: String,
    #[serde(default = "default_fullname")]
    pub fullname: String,
}

impl UserProfile {
    pub fn new(email: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            fullname: fullname.into(),
        }
    }

    /// Name for greetings, falling back to the email when the name is blank
    pub fn display_name(&self) -> &str {
        if self.fullname.trim().is_empty() {
            &self.email
        } else {
            &self.fullname
        }
    }
}

/// Response of `GET /api/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct AccountProfile {
    pub email: String,
    #[serde(default = "default_fullname")]
    pub fullname: String,
    #[serde(default)]
    pub is_active: bool,
}

impl From<AccountProfile> for UserProfile {
    fn from(account: AccountProfile) -> Self {
        Self {
            email: account.email,
            fullname: account.fullname,
        }
    }
}

/// Response of `POST /api/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct RegisterConfirmation {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_profile_default_fullname() {
        let profile: UserProfile = serde_json::from_str(r#"{"email":"a@b.com"}"#)
            .expect("Failed to parse profile");
        assert_eq!(profile.fullname, "User");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(UserProfile::new("a@b.com", "Demo Farmer").display_name(), "Demo Farmer");
        assert_eq!(UserProfile::new("a@b.com", "  ").display_name(), "a@b.com");
    }

    #[test]
    fn test_parse_account_profile() {
        let json = r#"{"email":"farmer@example.com","fullname":"Demo Farmer","is_active":true}"#;
        let account: AccountProfile = serde_json::from_str(json).expect("Failed to parse account");
        assert!(account.is_active);

        let profile = UserProfile::from(account);
        assert_eq!(profile, UserProfile::new("farmer@example.com", "Demo Farmer"));
    }
}
