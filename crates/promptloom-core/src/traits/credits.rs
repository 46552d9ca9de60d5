// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit ledger trait.

use async_trait::async_trait;

use crate::error::PromptloomError;
use crate::types::Entitlement;

/// Per-account credit balances and subscription entitlements.
///
/// `charge` must be atomic: concurrent charges never take a balance below
/// zero, and a failed charge leaves the balance untouched.
#[async_trait]
pub trait CreditLedger: Send + Sync + 'static {
    /// Current balance for `account_id`. Unknown accounts read as 0.
    async fn balance(&self, account_id: &str) -> Result<u32, PromptloomError>;

    /// Deducts `amount` from the account, returning the remaining balance.
    /// Fails with `InsufficientCredits` when the balance does not cover it.
    async fn charge(&self, account_id: &str, amount: u32) -> Result<u32, PromptloomError>;

    /// The account's subscription entitlement, if it has one.
    async fn entitlement(&self, account_id: &str) -> Result<Option<Entitlement>, PromptloomError>;
}
