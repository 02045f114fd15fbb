//! Team model.

use super::user::User;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named group of users. Reviewer pools are drawn from the author's team.
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    #[serde(rename = "team_name")]
    pub name: String,

    /// Members ordered by username.
    pub members: Vec<TeamMember>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Team member as supplied by and returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    /// Omitted in a request means inactive.
    #[serde(default)]
    pub is_active: bool,
}

impl From<&User> for TeamMember {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            is_active: user.is_active,
        }
    }
}

impl Team {
    pub fn new(name: impl Into<String>, members: Vec<TeamMember>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            members,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the team name and every member; member ids must be unique.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::InvalidTeamName);
        }

        let mut seen = HashSet::new();
        for user in self.member_users() {
            user.validate()?;
            if !seen.insert(user.id.clone()) {
                return Err(ValidationError::DuplicateMember { user_id: user.id });
            }
        }
        Ok(())
    }

    /// Members as full user records stamped with this team's name.
    pub fn member_users(&self) -> Vec<User> {
        self.members
            .iter()
            .map(|m| User::new(&m.user_id, &m.username, &self.name, m.is_active))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str) -> TeamMember {
        TeamMember {
            user_id: id.to_string(),
            username: name.to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let team = Team::new("", vec![member("u1", "alice")]);
        assert_eq!(team.validate(), Err(ValidationError::InvalidTeamName));
    }

    #[test]
    fn test_validate_rejects_duplicate_members() {
        let team = Team::new("core", vec![member("u1", "alice"), member("u1", "bob")]);
        assert_eq!(
            team.validate(),
            Err(ValidationError::DuplicateMember {
                user_id: "u1".to_string()
            })
        );
    }

    #[test]
    fn test_member_users_stamped_with_team() {
        let team = Team::new("core", vec![member("u1", "alice"), member("u2", "bob")]);
        assert!(team.validate().is_ok());
        assert!(team.member_users().iter().all(|u| u.team_name == "core"));
    }

    #[test]
    fn test_member_defaults_to_inactive() {
        let m: TeamMember = serde_json::from_str(r#"{"user_id":"u1","username":"alice"}"#).unwrap();
        assert!(!m.is_active);
    }
}
