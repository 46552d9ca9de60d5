// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed credit ledger.
//!
//! Charges run as a single conditional UPDATE so concurrent requests can
//! never drive a balance below zero, with no read-modify-write window.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptloom_core::{CreditLedger, Entitlement, PromptloomError, SubscriptionTier};
use tracing::info;

use crate::database::{map_tr_err, Database};

/// Credit ledger over the `credit_accounts` table.
pub struct SqliteCreditLedger {
    conn: tokio_rusqlite::Connection,
}

impl SqliteCreditLedger {
    pub fn new(db: &Database) -> Self {
        Self {
            conn: db.connection(),
        }
    }

    /// Creates the account if absent and sets its balance. Seeding helper
    /// for the CLI and tests.
    pub async fn set_balance(&self, account_id: &str, balance: u32) -> Result<(), PromptloomError> {
        let account_id = account_id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO credit_accounts (account_id, balance) VALUES (?1, ?2) \
                     ON CONFLICT(account_id) DO UPDATE SET balance = ?2",
                    rusqlite::params![account_id, balance],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Sets the account's subscription tier and optional expiry.
    pub async fn set_entitlement(
        &self,
        account_id: &str,
        tier: SubscriptionTier,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), PromptloomError> {
        let account_id = account_id.to_string();
        let tier = tier.to_string();
        let expires = expires_at.map(|e| e.to_rfc3339());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO credit_accounts (account_id, tier, entitlement_expires_at) \
                     VALUES (?1, ?2, ?3) \
                     ON CONFLICT(account_id) DO UPDATE SET tier = ?2, entitlement_expires_at = ?3",
                    rusqlite::params![account_id, tier, expires],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl CreditLedger for SqliteCreditLedger {
    async fn balance(&self, account_id: &str) -> Result<u32, PromptloomError> {
        let account_id = account_id.to_string();
        self.conn
            .call(move |conn| -> Result<u32, rusqlite::Error> {
                use rusqlite::OptionalExtension;
                let balance = conn
                    .query_row(
                        "SELECT balance FROM credit_accounts WHERE account_id = ?1",
                        rusqlite::params![account_id],
                        |row| row.get(0),
                    )
                    .optional()?
                    .unwrap_or(0);
                Ok(balance)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn charge(&self, account_id: &str, amount: u32) -> Result<u32, PromptloomError> {
        let account = account_id.to_string();
        let (charged, available) = self
            .conn
            .call(move |conn| -> Result<(bool, u32), rusqlite::Error> {
                use rusqlite::OptionalExtension;
                let updated = conn.execute(
                    "UPDATE credit_accounts SET balance = balance - ?2 \
                     WHERE account_id = ?1 AND balance >= ?2",
                    rusqlite::params![account, amount],
                )?;
                let balance: u32 = conn
                    .query_row(
                        "SELECT balance FROM credit_accounts WHERE account_id = ?1",
                        rusqlite::params![account],
                        |row| row.get(0),
                    )
                    .optional()?
                    .unwrap_or(0);
                Ok((updated > 0, balance))
            })
            .await
            .map_err(map_tr_err)?;

        if !charged {
            return Err(PromptloomError::InsufficientCredits {
                required: amount,
                available,
            });
        }

        info!(account_id, amount, remaining = available, "credits charged");
        Ok(available)
    }

    async fn entitlement(&self, account_id: &str) -> Result<Option<Entitlement>, PromptloomError> {
        let account_id = account_id.to_string();
        let row = self
            .conn
            .call(
                move |conn| -> Result<Option<(String, Option<String>)>, rusqlite::Error> {
                    let result = conn.query_row(
                        "SELECT tier, entitlement_expires_at FROM credit_accounts \
                         WHERE account_id = ?1",
                        rusqlite::params![account_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    );
                    match result {
                        Ok(pair) => Ok(Some(pair)),
                        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                        Err(e) => Err(e),
                    }
                },
            )
            .await
            .map_err(map_tr_err)?;

        let Some((tier, expires)) = row else {
            return Ok(None);
        };

        let tier = SubscriptionTier::from_str(&tier)
            .map_err(|_| PromptloomError::Internal(format!("unknown tier `{tier}` in ledger")))?;
        let expires_at = match expires {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        PromptloomError::Internal(format!("bad entitlement expiry `{raw}`: {e}"))
                    })?,
            ),
            None => None,
        };

        Ok(Some(Entitlement { tier, expires_at }))
    }
}
