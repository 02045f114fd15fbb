//! Pull request lifecycle: creation with reviewer assignment, merge and
//! reviewer reassignment.
//!
//! State machine: `OPEN -> MERGED`, terminal. Reviewers only change while
//! the pull request is open. Every storage call happens sequentially inside
//! the caller's [`Deadline`].

use std::sync::Arc;

use chrono::Utc;

use super::selector::ReviewerSelector;
use crate::context::Deadline;
use crate::error::AppError;
use crate::models::{PullRequest, PullRequestShort};
use crate::store::{MergeOutcome, PullRequestStore, TeamStore, UserStore};

#[derive(Clone)]
pub struct PullRequestService {
    pull_requests: Arc<dyn PullRequestStore>,
    users: Arc<dyn UserStore>,
    teams: Arc<dyn TeamStore>,
    selector: ReviewerSelector,
}

impl PullRequestService {
    pub fn new(
        pull_requests: Arc<dyn PullRequestStore>,
        users: Arc<dyn UserStore>,
        teams: Arc<dyn TeamStore>,
        selector: ReviewerSelector,
    ) -> Self {
        Self {
            pull_requests,
            users,
            teams,
            selector,
        }
    }

    /// Open a pull request and assign up to two reviewers from the author's team.
    pub async fn create(
        &self,
        deadline: Deadline,
        id: &str,
        name: &str,
        author_id: &str,
    ) -> Result<PullRequest, AppError> {
        deadline
            .run("create pull request", self.create_inner(deadline, id, name, author_id))
            .await
    }

    async fn create_inner(
        &self,
        deadline: Deadline,
        id: &str,
        name: &str,
        author_id: &str,
    ) -> Result<PullRequest, AppError> {
        if self.pull_requests.exists(id).await? {
            return Err(AppError::already_exists("PullRequest", id));
        }

        let author = self.users.get_by_id(author_id).await?;
        if !author.is_active {
            return Err(AppError::user_not_active(author_id));
        }

        if !self.teams.exists(&author.team_name).await? {
            return Err(AppError::not_found_with_id("Team", &author.team_name));
        }

        let reviewers = self.selector.select_reviewers(deadline, &author).await?;

        let pr = PullRequest::open(id, name, author_id, reviewers);
        pr.validate()?;

        self.pull_requests.create(&pr).await?;

        log::info!(
            "[pull_request] Created {} by {} with reviewers {:?}",
            pr.id,
            pr.author_id,
            pr.assigned_reviewers
        );
        Ok(pr)
    }

    /// Mark a pull request merged. Merging twice returns the first result.
    pub async fn merge(&self, deadline: Deadline, id: &str) -> Result<PullRequest, AppError> {
        deadline.run("merge pull request", self.merge_inner(id)).await
    }

    async fn merge_inner(&self, id: &str) -> Result<PullRequest, AppError> {
        let pr = self.pull_requests.get_by_id(id).await?;
        if pr.is_merged() {
            log::debug!("[pull_request] {} already merged", id);
            return Ok(pr);
        }

        match self.pull_requests.merge(id, Utc::now()).await? {
            MergeOutcome::Updated => {
                log::info!("[pull_request] Merged {}", id);
            }
            MergeOutcome::AlreadyMerged => {
                log::debug!("[pull_request] {} merged concurrently", id);
            }
            MergeOutcome::NotFound => {
                return Err(AppError::not_found_with_id("PullRequest", id));
            }
        }

        self.pull_requests.get_by_id(id).await
    }

    /// Swap `old_reviewer_id` for a random active teammate of the old reviewer.
    ///
    /// Returns the updated pull request and the id of the new reviewer.
    /// Concurrent reassignments on one pull request are last-write-wins.
    pub async fn reassign_reviewer(
        &self,
        deadline: Deadline,
        id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String), AppError> {
        deadline
            .run(
                "reassign reviewer",
                self.reassign_inner(deadline, id, old_reviewer_id),
            )
            .await
    }

    async fn reassign_inner(
        &self,
        deadline: Deadline,
        id: &str,
        old_reviewer_id: &str,
    ) -> Result<(PullRequest, String), AppError> {
        let mut pr = self.pull_requests.get_by_id(id).await?;

        if pr.is_merged() {
            return Err(AppError::pull_request_merged(id));
        }
        if !pr.has_reviewer(old_reviewer_id) {
            return Err(AppError::not_assigned(id, old_reviewer_id));
        }

        let old_reviewer = self.users.get_by_id(old_reviewer_id).await?;

        let exclude = [pr.author_id.clone(), old_reviewer_id.to_string()];
        let new_reviewer_id = self
            .selector
            .select_replacement(deadline, &old_reviewer.team_name, &exclude)
            .await?;

        pr.replace_reviewer(old_reviewer_id, &new_reviewer_id);
        pr.updated_at = Utc::now();
        self.pull_requests.update(&pr).await?;

        log::info!(
            "[pull_request] Reassigned {} on {} to {}",
            old_reviewer_id,
            id,
            new_reviewer_id
        );
        Ok((pr, new_reviewer_id))
    }

    pub async fn get_by_id(&self, deadline: Deadline, id: &str) -> Result<PullRequest, AppError> {
        deadline
            .run("get pull request", self.pull_requests.get_by_id(id))
            .await
    }

    /// Pull requests reviewed by `reviewer_id`. The reviewer must exist.
    pub async fn get_by_reviewer(
        &self,
        deadline: Deadline,
        reviewer_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        deadline
            .run("get pull requests by reviewer", async {
                self.users.get_by_id(reviewer_id).await?;
                self.pull_requests.get_by_reviewer(reviewer_id).await
            })
            .await
    }

    /// Pull requests authored by `author_id`, newest first. The author must exist.
    pub async fn list_by_author(
        &self,
        deadline: Deadline,
        author_id: &str,
    ) -> Result<Vec<PullRequest>, AppError> {
        deadline
            .run("list pull requests by author", async {
                self.users.get_by_id(author_id).await?;
                self.pull_requests.get_by_author(author_id).await
            })
            .await
    }
}
