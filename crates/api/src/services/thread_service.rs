use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;
use infra::{
    conversation::{merge_visible_threads, sort_by_recency},
    models::MessageThreadRow,
    repos::{RegistrationRepo, TeamRepo, ThreadRepo},
};

/// Computes the set of conversation threads a user may see: their direct
/// threads plus the match threads implied by tournament participation.
pub struct ThreadService {
    state: AppState,
}

impl ThreadService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn threads(&self) -> ThreadRepo {
        ThreadRepo::new(self.state.db.clone())
    }

    /// Resolution, newest last-message first:
    ///
    /// 1. tournaments where the user holds an approved registration;
    /// 2. the user's direct threads (match rows excluded);
    /// 3. direct threads only, when no tournament qualifies;
    /// 4. otherwise the match threads visible to the user (shared rows and
    ///    their private copies) merged in.
    ///
    /// A failed match-thread fetch degrades to direct-only rather than
    /// failing the whole call.
    pub async fn resolve_threads(&self, user_id: Uuid) -> Result<Vec<MessageThreadRow>, AppError> {
        let registration_repo = RegistrationRepo::new(self.state.db.clone());
        let thread_repo = self.threads();

        let approved_tournaments = registration_repo.approved_tournament_ids(user_id).await?;
        let mut threads = thread_repo.direct_threads_for(user_id).await?;

        if approved_tournaments.is_empty() {
            sort_by_recency(&mut threads);
            return Ok(threads);
        }

        let team_ids = TeamRepo::new(self.state.db.clone())
            .user_team_ids(user_id)
            .await?;
        debug!(
            user_id = %user_id,
            tournaments = approved_tournaments.len(),
            teams = team_ids.len(),
            "Resolving match threads"
        );

        let match_fetch = thread_repo.match_threads_for(user_id).await;
        Ok(merge_visible_threads(threads, match_fetch))
    }
}
