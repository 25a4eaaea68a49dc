//! Mock Scene Provider

use contracts::SceneProvider;
use tracing::trace;

use crate::mock_engine::{EngineCall, Journal};

/// Scene provider that only counts refreshes.
///
/// Shares a journal with a [`crate::MockGraphEngine`] so refresh order can be
/// checked against graph executions.
#[derive(Debug, Clone, Default)]
pub struct MockSceneProvider {
    journal: Journal,
    refreshes: u64,
}

impl MockSceneProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            refreshes: 0,
        }
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl SceneProvider for MockSceneProvider {
    fn refresh_scene_state(&mut self) {
        self.refreshes += 1;
        self.journal.record(EngineCall::SceneRefresh);
        trace!(refreshes = self.refreshes, "mock scene refreshed");
    }
}
