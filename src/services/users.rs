//! User directory operations.

use std::sync::Arc;

use crate::context::Deadline;
use crate::error::AppError;
use crate::models::{PullRequest, User, UserUpdate};
use crate::store::{PullRequestStore, TeamStore, UserStore};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    teams: Arc<dyn TeamStore>,
    pull_requests: Arc<dyn PullRequestStore>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        teams: Arc<dyn TeamStore>,
        pull_requests: Arc<dyn PullRequestStore>,
    ) -> Self {
        Self {
            users,
            teams,
            pull_requests,
        }
    }

    /// Add a user to an existing team, replacing any record with the same id.
    pub async fn create(&self, deadline: Deadline, user: User) -> Result<User, AppError> {
        user.validate()?;

        deadline
            .run("create user", async {
                self.require_team(&user.team_name).await?;
                self.users.create(&user).await?;
                log::info!("[user] Created {} in team {}", user.id, user.team_name);
                self.users.get_by_id(&user.id).await
            })
            .await
    }

    pub async fn get(&self, deadline: Deadline, user_id: &str) -> Result<User, AppError> {
        deadline.run("get user", self.users.get_by_id(user_id)).await
    }

    /// Toggle reviewer eligibility. Existing assignments are left in place.
    pub async fn set_active(
        &self,
        deadline: Deadline,
        user_id: &str,
        is_active: bool,
    ) -> Result<User, AppError> {
        deadline
            .run("set user active", async {
                self.users.set_active(user_id, is_active).await?;

                if is_active {
                    log::info!("[user] Activated {}", user_id);
                } else {
                    let open = self.pull_requests.list_open_by_reviewer(user_id).await?;
                    if open.is_empty() {
                        log::info!("[user] Deactivated {}", user_id);
                    } else {
                        log::warn!(
                            "[user] Deactivated {} while assigned to {} open pull requests",
                            user_id,
                            open.len()
                        );
                    }
                }

                self.users.get_by_id(user_id).await
            })
            .await
    }

    /// Change username, team or activity. Moving to another team requires
    /// that team to exist.
    pub async fn update_profile(
        &self,
        deadline: Deadline,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<User, AppError> {
        deadline
            .run("update user", async {
                let mut user = self.users.get_by_id(user_id).await?;
                let previous_team = user.team_name.clone();

                user.apply(&update);
                user.validate()?;

                if user.team_name != previous_team {
                    self.require_team(&user.team_name).await?;
                    log::info!(
                        "[user] Moving {} from {} to {}",
                        user.id,
                        previous_team,
                        user.team_name
                    );
                }

                self.users.update(&user).await?;
                self.users.get_by_id(user_id).await
            })
            .await
    }

    /// Open pull requests the user is currently reviewing.
    pub async fn open_reviews(
        &self,
        deadline: Deadline,
        user_id: &str,
    ) -> Result<Vec<PullRequest>, AppError> {
        deadline
            .run("list open reviews", async {
                self.users.get_by_id(user_id).await?;
                self.pull_requests.list_open_by_reviewer(user_id).await
            })
            .await
    }

    async fn require_team(&self, team_name: &str) -> Result<(), AppError> {
        if !self.teams.exists(team_name).await? {
            return Err(AppError::not_found_with_id("Team", team_name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Team, TeamMember};
    use crate::store::MemoryStore;

    async fn seeded() -> (UserService, MemoryStore) {
        let store = MemoryStore::new();
        TeamStore::create(
            &store,
            &Team::new(
                "core",
                vec![TeamMember {
                    user_id: "u1".to_string(),
                    username: "alice".to_string(),
                    is_active: true,
                }],
            ),
        )
        .await
        .unwrap();
        TeamStore::create(&store, &Team::new("web", vec![]))
            .await
            .unwrap();

        let shared = Arc::new(store.clone());
        let service = UserService::new(shared.clone(), shared.clone(), shared);
        (service, store)
    }

    #[tokio::test]
    async fn test_create_requires_team() {
        let (service, _store) = seeded().await;

        let user = service
            .create(Deadline::none(), User::new("u2", "bob", "web", true))
            .await
            .unwrap();
        assert_eq!(user.team_name, "web");

        let err = service
            .create(Deadline::none(), User::new("u3", "carol", "ghost", true))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .create(Deadline::none(), User::new("", "nobody", "web", true))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_set_active() {
        let (service, store) = seeded().await;
        PullRequestStore::create(
            &store,
            &PullRequest::open("pr-1", "Change", "u9", vec!["u1".to_string()]),
        )
        .await
        .unwrap();

        let user = service
            .set_active(Deadline::none(), "u1", false)
            .await
            .unwrap();
        assert!(!user.is_active);
        assert_eq!(
            service
                .open_reviews(Deadline::none(), "u1")
                .await
                .unwrap()
                .len(),
            1
        );

        let err = service
            .set_active(Deadline::none(), "ghost", true)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (service, _store) = seeded().await;

        let user = service
            .update_profile(
                Deadline::none(),
                "u1",
                UserUpdate {
                    username: Some("alicia".to_string()),
                    team_name: Some("web".to_string()),
                    is_active: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(user.username, "alicia");
        assert_eq!(user.team_name, "web");
        assert!(user.is_active);

        let err = service
            .update_profile(
                Deadline::none(),
                "u1",
                UserUpdate {
                    team_name: Some("ghost".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .update_profile(
                Deadline::none(),
                "u1",
                UserUpdate {
                    username: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
    }
}
