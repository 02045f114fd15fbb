//! Business logic services.
//!
//! Services hold the assignment and lifecycle rules and talk to storage
//! only through the capability traits in [`crate::store`]. They are
//! independent of the HTTP layer and testable against [`crate::store::MemoryStore`].

pub mod pull_requests;
pub mod selector;
pub mod stats;
pub mod teams;
pub mod users;

pub use pull_requests::PullRequestService;
pub use selector::{RandomSource, ReviewerSelector, SeededRandom, ThreadRandom};
pub use stats::StatsService;
pub use teams::TeamService;
pub use users::UserService;

use crate::store::Stores;
use std::sync::Arc;

/// All services wired against one set of stores.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub teams: TeamService,
    pub pull_requests: PullRequestService,
    pub stats: StatsService,
}

impl Services {
    pub fn new(stores: Stores, random: Arc<dyn RandomSource>) -> Self {
        let selector = ReviewerSelector::new(stores.users.clone(), random);

        Self {
            users: UserService::new(
                stores.users.clone(),
                stores.teams.clone(),
                stores.pull_requests.clone(),
            ),
            teams: TeamService::new(stores.teams.clone()),
            pull_requests: PullRequestService::new(
                stores.pull_requests,
                stores.users.clone(),
                stores.teams,
                selector,
            ),
            stats: StatsService::new(stores.stats, stores.users),
        }
    }
}
