// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementations of the storage traits.

use std::collections::HashMap;

use async_trait::async_trait;
use promptloom_core::{
    AuditRecord, AuditSink, CachedPrompt, CategoryExample, CategoryKey, CreditLedger, Entitlement,
    ExampleStore, ProgressRecord, ProgressStore, PromptCache, PromptTemplate, PromptloomError,
    TemplateStore,
};
use tokio::sync::Mutex;

/// Progress store that keeps the live map and a full write history, so
/// tests can assert both the final state and the step sequence.
#[derive(Default)]
pub struct RecordingProgressStore {
    live: Mutex<HashMap<String, ProgressRecord>>,
    pub history: Mutex<Vec<ProgressRecord>>,
}

impl RecordingProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps written for `identity`, in order.
    pub async fn steps_for(&self, identity: &str) -> Vec<promptloom_core::ProgressStep> {
        self.history
            .lock()
            .await
            .iter()
            .filter(|r| r.identity == identity)
            .map(|r| r.step)
            .collect()
    }
}

#[async_trait]
impl ProgressStore for RecordingProgressStore {
    async fn upsert(&self, record: ProgressRecord) -> Result<(), PromptloomError> {
        self.history.lock().await.push(record.clone());
        self.live.lock().await.insert(record.identity.clone(), record);
        Ok(())
    }

    async fn get(&self, identity: &str) -> Result<Option<ProgressRecord>, PromptloomError> {
        Ok(self.live.lock().await.get(identity).cloned())
    }

    async fn clear(&self, identity: &str) -> Result<(), PromptloomError> {
        self.live.lock().await.remove(identity);
        Ok(())
    }
}

/// Credit ledger over a plain map.
#[derive(Default)]
pub struct InMemoryCreditLedger {
    balances: Mutex<HashMap<String, u32>>,
    entitlements: Mutex<HashMap<String, Entitlement>>,
}

impl InMemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_balance(&self, account_id: &str, balance: u32) {
        self.balances
            .lock()
            .await
            .insert(account_id.to_string(), balance);
    }

    pub async fn set_entitlement(&self, account_id: &str, entitlement: Entitlement) {
        self.entitlements
            .lock()
            .await
            .insert(account_id.to_string(), entitlement);
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn balance(&self, account_id: &str) -> Result<u32, PromptloomError> {
        Ok(*self.balances.lock().await.get(account_id).unwrap_or(&0))
    }

    async fn charge(&self, account_id: &str, amount: u32) -> Result<u32, PromptloomError> {
        let mut balances = self.balances.lock().await;
        let balance = balances.entry(account_id.to_string()).or_insert(0);
        if *balance < amount {
            return Err(PromptloomError::InsufficientCredits {
                required: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }

    async fn entitlement(&self, account_id: &str) -> Result<Option<Entitlement>, PromptloomError> {
        Ok(self.entitlements.lock().await.get(account_id).cloned())
    }
}

/// Append-only audit sink over a vector.
#[derive(Default)]
pub struct InMemoryAuditSink {
    pub records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), PromptloomError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// Prompt cache over a plain map.
#[derive(Default)]
pub struct InMemoryPromptCache {
    entries: Mutex<HashMap<String, CachedPrompt>>,
}

impl InMemoryPromptCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromptCache for InMemoryPromptCache {
    async fn get(&self, image_url: &str) -> Result<Option<CachedPrompt>, PromptloomError> {
        Ok(self.entries.lock().await.get(image_url).cloned())
    }

    async fn put(&self, image_url: &str, cached: CachedPrompt) -> Result<(), PromptloomError> {
        self.entries
            .lock()
            .await
            .insert(image_url.to_string(), cached);
        Ok(())
    }
}

/// Template store over a plain map.
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: Mutex<HashMap<String, PromptTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: &str, content: &str) {
        self.templates.lock().await.insert(
            key.to_string(),
            PromptTemplate {
                content: content.to_string(),
            },
        );
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn get_by_key(&self, key: &str) -> Result<Option<PromptTemplate>, PromptloomError> {
        Ok(self.templates.lock().await.get(key).cloned())
    }
}

/// Exemplar store over a per-category map, kept rating-descending.
#[derive(Default)]
pub struct InMemoryExampleStore {
    examples: Mutex<HashMap<CategoryKey, Vec<CategoryExample>>>,
}

impl InMemoryExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, category: CategoryKey, example: CategoryExample) {
        let mut map = self.examples.lock().await;
        let list = map.entry(category).or_default();
        list.push(example);
        list.sort_by(|a, b| b.rating.cmp(&a.rating));
    }
}

#[async_trait]
impl ExampleStore for InMemoryExampleStore {
    async fn top_examples(
        &self,
        category: CategoryKey,
        limit: usize,
    ) -> Result<Vec<CategoryExample>, PromptloomError> {
        Ok(self
            .examples
            .lock()
            .await
            .get(&category)
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
