//! User model.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team member who can author pull requests and review them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    #[serde(rename = "user_id")]
    pub id: String,

    pub username: String,

    /// Name of the team the user belongs to.
    pub team_name: String,

    /// Only active users are eligible as reviewers.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a user stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        team_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::InvalidUserId);
        }
        if self.username.is_empty() {
            return Err(ValidationError::InvalidUsername);
        }
        if self.team_name.is_empty() {
            return Err(ValidationError::InvalidTeamName);
        }
        Ok(())
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &UserUpdate) {
        if let Some(username) = &update.username {
            self.username = username.clone();
        }
        if let Some(team_name) = &update.team_name {
            self.team_name = team_name.clone();
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial user profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub team_name: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(User::new("u1", "alice", "core", true).validate().is_ok());
        assert_eq!(
            User::new("", "alice", "core", true).validate(),
            Err(ValidationError::InvalidUserId)
        );
        assert_eq!(
            User::new("u1", "", "core", true).validate(),
            Err(ValidationError::InvalidUsername)
        );
        assert_eq!(
            User::new("u1", "alice", "", true).validate(),
            Err(ValidationError::InvalidTeamName)
        );
    }

    #[test]
    fn test_apply_partial_update() {
        let mut user = User::new("u1", "alice", "core", true);
        user.apply(&UserUpdate {
            is_active: Some(false),
            ..Default::default()
        });
        assert!(!user.is_active);
        assert_eq!(user.username, "alice");
        assert_eq!(user.team_name, "core");
    }

    #[test]
    fn test_serializes_user_id_field() {
        let json = serde_json::to_value(User::new("u1", "alice", "core", true)).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["is_active"], true);
    }
}
