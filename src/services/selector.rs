//! Reviewer selection.
//!
//! Candidates are the active members of a team minus an exclusion list.
//! Picks are uniform without replacement; randomness comes from an
//! injectable [`RandomSource`] so tests can swap in a seeded generator.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::context::Deadline;
use crate::error::AppError;
use crate::models::{User, MAX_REVIEWERS};
use crate::store::UserStore;

/// Source of random index samples.
pub trait RandomSource: Send + Sync {
    /// `amount` distinct indices in `0..len`, in random order.
    /// `amount` is clamped to `len`.
    fn sample_indices(&self, len: usize, amount: usize) -> Vec<usize>;
}

/// Draws from the thread-local generator, reseeded by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn sample_indices(&self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut rand::thread_rng(), len, amount.min(len)).into_vec()
    }
}

/// Process-wide seeded generator. Deterministic for a given seed and call order.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn sample_indices(&self, len: usize, amount: usize) -> Vec<usize> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        index::sample(&mut *rng, len, amount.min(len)).into_vec()
    }
}

/// Chooses initial and replacement reviewers from team pools.
#[derive(Clone)]
pub struct ReviewerSelector {
    users: Arc<dyn UserStore>,
    random: Arc<dyn RandomSource>,
}

impl ReviewerSelector {
    pub fn new(users: Arc<dyn UserStore>, random: Arc<dyn RandomSource>) -> Self {
        Self { users, random }
    }

    /// Up to [`MAX_REVIEWERS`] distinct active teammates of `author`.
    ///
    /// An empty pool yields an empty list, not an error.
    pub async fn select_reviewers(
        &self,
        deadline: Deadline,
        author: &User,
    ) -> Result<Vec<String>, AppError> {
        let pool = deadline
            .run(
                "select reviewers",
                self.users
                    .get_active_members_excluding(&author.team_name, &[author.id.clone()]),
            )
            .await?;

        if pool.is_empty() {
            log::debug!(
                "[selector] No active candidates in team {} for author {}",
                author.team_name,
                author.id
            );
            return Ok(Vec::new());
        }

        Ok(self.pick(&pool, MAX_REVIEWERS))
    }

    /// Exactly one active member of `team_name` not in `exclude_ids`.
    ///
    /// Fails with `NoCandidate` when the pool is empty.
    pub async fn select_replacement(
        &self,
        deadline: Deadline,
        team_name: &str,
        exclude_ids: &[String],
    ) -> Result<String, AppError> {
        let pool = deadline
            .run(
                "select replacement reviewer",
                self.users.get_active_members_excluding(team_name, exclude_ids),
            )
            .await?;

        self.pick(&pool, 1)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::no_candidate(team_name))
    }

    fn pick(&self, pool: &[User], amount: usize) -> Vec<String> {
        self.random
            .sample_indices(pool.len(), amount)
            .into_iter()
            .map(|i| pool[i].id.clone())
            .collect()
    }
}
