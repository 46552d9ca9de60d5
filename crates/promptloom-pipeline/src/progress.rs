// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory progress store.

use std::collections::HashMap;

use async_trait::async_trait;
use promptloom_core::{ProgressRecord, ProgressStore, PromptloomError};
use tokio::sync::Mutex;

/// Map-backed progress store. One record per identity, last writer wins.
#[derive(Default)]
pub struct InMemoryProgressStore {
    records: Mutex<HashMap<String, ProgressRecord>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn upsert(&self, record: ProgressRecord) -> Result<(), PromptloomError> {
        self.records
            .lock()
            .await
            .insert(record.identity.clone(), record);
        Ok(())
    }

    async fn get(&self, identity: &str) -> Result<Option<ProgressRecord>, PromptloomError> {
        Ok(self.records.lock().await.get(identity).cloned())
    }

    async fn clear(&self, identity: &str) -> Result<(), PromptloomError> {
        self.records.lock().await.remove(identity);
        Ok(())
    }
}
