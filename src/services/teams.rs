//! Team management.

use std::sync::Arc;

use crate::context::Deadline;
use crate::error::AppError;
use crate::models::{Team, TeamMember};
use crate::store::TeamStore;

#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamStore>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamStore>) -> Self {
        Self { teams }
    }

    /// Create a team together with its members. Either everything is
    /// stored or nothing is.
    pub async fn create(&self, deadline: Deadline, team: Team) -> Result<Team, AppError> {
        team.validate()?;

        deadline
            .run("create team", async {
                self.teams.create(&team).await?;
                log::info!(
                    "[team] Created {} with {} members",
                    team.name,
                    team.members.len()
                );
                self.teams.get_by_name(&team.name).await
            })
            .await
    }

    pub async fn get(&self, deadline: Deadline, team_name: &str) -> Result<Team, AppError> {
        deadline
            .run("get team", self.teams.get_by_name(team_name))
            .await
    }

    /// Add or move members into an existing team.
    pub async fn update_members(
        &self,
        deadline: Deadline,
        team_name: &str,
        members: Vec<TeamMember>,
    ) -> Result<Team, AppError> {
        let team = Team::new(team_name, members);
        team.validate()?;

        deadline
            .run("update team members", async {
                self.teams.update_members(&team.name, &team.members).await?;
                log::info!(
                    "[team] Updated {} members of {}",
                    team.members.len(),
                    team.name
                );
                self.teams.get_by_name(&team.name).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::store::MemoryStore;

    fn member(id: &str, name: &str) -> TeamMember {
        TeamMember {
            user_id: id.to_string(),
            username: name.to_string(),
            is_active: true,
        }
    }

    fn service() -> TeamService {
        TeamService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();
        let created = service
            .create(
                Deadline::none(),
                Team::new("core", vec![member("u2", "bob"), member("u1", "alice")]),
            )
            .await
            .unwrap();
        assert_eq!(created.members[0].username, "alice");

        let fetched = service.get(Deadline::none(), "core").await.unwrap();
        assert_eq!(fetched.members.len(), 2);

        let err = service.get(Deadline::none(), "web").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_teams() {
        let service = service();

        let err = service
            .create(Deadline::none(), Team::new("", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Invalid(ValidationError::InvalidTeamName)));

        let err = service
            .create(
                Deadline::none(),
                Team::new("core", vec![member("u1", "alice"), member("u1", "again")]),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Invalid(ValidationError::DuplicateMember { .. })
        ));

        service
            .create(Deadline::none(), Team::new("core", vec![]))
            .await
            .unwrap();
        let err = service
            .create(Deadline::none(), Team::new("core", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_update_members() {
        let service = service();
        service
            .create(Deadline::none(), Team::new("core", vec![member("u1", "alice")]))
            .await
            .unwrap();

        let team = service
            .update_members(Deadline::none(), "core", vec![member("u2", "bob")])
            .await
            .unwrap();
        assert_eq!(team.members.len(), 2);

        let err = service
            .update_members(Deadline::none(), "ghost", vec![member("u3", "carol")])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
