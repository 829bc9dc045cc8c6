use std::sync::Arc;

use sqlx::PgPool;

use infra::draft::{DraftStore, MemoryDraftStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    drafts: Arc<dyn DraftStore>,
}

impl AppState {
    pub fn new(db: PgPool) -> anyhow::Result<Self> {
        Ok(Self {
            db,
            drafts: Arc::new(MemoryDraftStore::default()),
        })
    }

    pub fn with_draft_store(db: PgPool, drafts: Arc<dyn DraftStore>) -> Self {
        Self { db, drafts }
    }

    pub fn drafts(&self) -> &dyn DraftStore {
        self.drafts.as_ref()
    }
}
