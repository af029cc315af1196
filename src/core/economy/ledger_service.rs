// Account ledger core - wallet/bank balances and the transaction journal.
//
// This module contains the domain logic for the economy. It is
// platform-agnostic: no Discord types, only primitive ids, so the same
// service could back any frontend.

use super::cooldown::{self, CooldownKind};
use super::risk::{RiskOutcome, RiskResolver};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A user's ledger account in a specific guild.
///
/// Created lazily on first interaction and never destroyed. Both balances
/// are invariant-protected: they never go below zero.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: u64,
    #[allow(dead_code)]
    pub guild_id: u64,
    pub wallet: i64,
    pub bank: i64,
    pub experience: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub last_work: Option<DateTime<Utc>>,
    pub last_daily: Option<DateTime<Utc>>,
    pub last_crime: Option<DateTime<Utc>>,
}

impl Account {
    pub fn empty(user_id: u64, guild_id: u64) -> Self {
        Self {
            user_id,
            guild_id,
            wallet: 0,
            bank: 0,
            experience: 0,
            total_earned: 0,
            total_spent: 0,
            last_work: None,
            last_daily: None,
            last_crime: None,
        }
    }

    pub fn net_worth(&self) -> i64 {
        self.wallet + self.bank
    }

    /// Last invocation timestamp for a cooldown-gated command.
    pub fn last_action(&self, kind: CooldownKind) -> Option<DateTime<Utc>> {
        match kind {
            CooldownKind::Work => self.last_work,
            CooldownKind::Daily => self.last_daily,
            CooldownKind::Crime => self.last_crime,
        }
    }
}

/// Reason code attached to every transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Work,
    Daily,
    CrimeSuccess,
    CrimeFail,
    Transfer,
    Deposit,
    Withdraw,
    Purchase,
    Sale,
    Invest,
    InvestPayout,
    Interest,
    AdminGrant,
}

impl TxKind {
    /// String representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Work => "work",
            TxKind::Daily => "daily",
            TxKind::CrimeSuccess => "crime_success",
            TxKind::CrimeFail => "crime_fail",
            TxKind::Transfer => "transfer",
            TxKind::Deposit => "deposit",
            TxKind::Withdraw => "withdraw",
            TxKind::Purchase => "purchase",
            TxKind::Sale => "sale",
            TxKind::Invest => "invest",
            TxKind::InvestPayout => "invest_payout",
            TxKind::Interest => "interest",
            TxKind::AdminGrant => "admin_grant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "work" => Some(TxKind::Work),
            "daily" => Some(TxKind::Daily),
            "crime_success" => Some(TxKind::CrimeSuccess),
            "crime_fail" => Some(TxKind::CrimeFail),
            "transfer" => Some(TxKind::Transfer),
            "deposit" => Some(TxKind::Deposit),
            "withdraw" => Some(TxKind::Withdraw),
            "purchase" => Some(TxKind::Purchase),
            "sale" => Some(TxKind::Sale),
            "invest" => Some(TxKind::Invest),
            "invest_payout" => Some(TxKind::InvestPayout),
            "interest" => Some(TxKind::Interest),
            "admin_grant" => Some(TxKind::AdminGrant),
            _ => None,
        }
    }
}

/// An immutable journal entry. Every balance mutation writes exactly one.
/// Transfers carry the destination account and a signed amount from the
/// source's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: u64,
    pub guild_id: u64,
    /// Destination account for transfers.
    pub related_user_id: Option<u64>,
    pub kind: TxKind,
    pub amount: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of a successful gated earn command (work, daily).
#[derive(Debug, Clone)]
pub struct EarnOutcome {
    pub amount: i64,
    pub new_wallet: i64,
    pub next_available: DateTime<Utc>,
}

/// Result of a crime attempt.
#[derive(Debug, Clone)]
pub struct CrimeOutcome {
    pub success: bool,
    /// Reward on success, fine actually paid on failure. Always >= 0.
    pub amount: i64,
    pub new_wallet: i64,
    pub next_available: DateTime<Utc>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient funds: need {required} coins, have {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("insufficient bank balance: need {required} coins, have {available}")]
    InsufficientBank { required: i64, available: i64 },

    #[error("on cooldown for another {0:?}")]
    CooldownActive(std::time::Duration),

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("amount must be between {min} and {max}")]
    AmountOutOfRange { min: i64, max: i64 },

    #[error("unknown item: {0}")]
    ItemNotFound(String),

    #[error("not enough items: have {available}, need {requested}")]
    InsufficientInventory { requested: i64, available: i64 },

    #[error("storage error: {0}")]
    Store(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting ledger data.
///
/// The core defines what it needs; the infra layer supplies the SQLite
/// implementation, and tests use in-memory mocks.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Get a user's account, creating it if it doesn't exist.
    async fn get_account(&self, user_id: u64, guild_id: u64) -> Result<Account, LedgerError>;

    /// Apply a signed delta to the wallet. Returns `false` (and changes
    /// nothing) when the delta would drive the wallet negative. Positive
    /// deltas count toward `total_earned`, negative toward `total_spent`.
    async fn adjust_wallet(
        &self,
        user_id: u64,
        guild_id: u64,
        delta: i64,
    ) -> Result<bool, LedgerError>;

    /// Credit the bank balance directly (interest payouts).
    async fn credit_bank(&self, user_id: u64, guild_id: u64, amount: i64)
        -> Result<(), LedgerError>;

    /// Move `amount` from wallet to bank atomically. `false` when the wallet
    /// is short.
    async fn move_to_bank(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<bool, LedgerError>;

    /// Move `amount` from bank to wallet atomically. `false` when the bank
    /// is short.
    async fn move_to_wallet(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<bool, LedgerError>;

    /// Atomic wallet-to-wallet transfer: debit `from`, credit `to`, and write
    /// the journal entry, or do nothing at all. `false` when `from` has
    /// insufficient funds.
    async fn transfer_wallet(
        &self,
        from_user: u64,
        to_user: u64,
        guild_id: u64,
        amount: i64,
        entry: Transaction,
    ) -> Result<bool, LedgerError>;

    async fn add_experience(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<(), LedgerError>;

    /// Record the last invocation of a cooldown-gated command.
    async fn set_last_action(
        &self,
        user_id: u64,
        guild_id: u64,
        kind: CooldownKind,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Append a journal entry.
    async fn log_transaction(&self, entry: Transaction) -> Result<(), LedgerError>;

    /// Most recent journal entries touching a user (as source or transfer
    /// destination), newest first.
    async fn recent_transactions(
        &self,
        user_id: u64,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Top accounts in a guild ordered by net worth.
    async fn leaderboard(&self, guild_id: u64, limit: usize) -> Result<Vec<Account>, LedgerError>;

    /// Accounts in a guild with a positive bank balance (interest run).
    async fn accounts_with_bank(&self, guild_id: u64) -> Result<Vec<Account>, LedgerError>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tunables for the economy, overridable from the environment at startup.
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    pub work_min: i64,
    pub work_max: i64,
    pub daily_min: i64,
    pub daily_max: i64,
    pub work_cooldown_secs: i64,
    pub daily_cooldown_secs: i64,
    pub crime_cooldown_secs: i64,
    /// Crime success chance and reward/fine ranges.
    pub crime: super::risk::RiskConfig,
    /// XP awarded by earn-type commands.
    pub earn_xp: i64,
    pub bank_interest_rate: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            work_min: 1,
            work_max: 50,
            daily_min: 50,
            daily_max: 100,
            work_cooldown_secs: 300,
            daily_cooldown_secs: 24 * 3600,
            crime_cooldown_secs: 600,
            crime: super::risk::RiskConfig::default(),
            earn_xp: 5,
            bank_interest_rate: 0.02,
        }
    }
}

impl EconomyConfig {
    /// Cooldown window for a gated command.
    pub fn window(&self, kind: CooldownKind) -> Duration {
        let secs = match kind {
            CooldownKind::Work => self.work_cooldown_secs,
            CooldownKind::Daily => self.daily_cooldown_secs,
            CooldownKind::Crime => self.crime_cooldown_secs,
        };
        Duration::seconds(secs)
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The main service for ledger operations.
///
/// Generic over S: AccountStore so implementations can be swapped.
pub struct LedgerService<S: AccountStore> {
    store: S,
    config: EconomyConfig,
    risk: RiskResolver,
}

impl<S: AccountStore> LedgerService<S> {
    #[allow(dead_code)]
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: EconomyConfig::default(),
            risk: RiskResolver::new(),
        }
    }

    /// Service with custom configuration and a caller-provided resolver
    /// (seeded in tests).
    pub fn with_config(store: S, config: EconomyConfig, risk: RiskResolver) -> Self {
        Self {
            store,
            config,
            risk,
        }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Get a user's account, creating it on first use.
    pub async fn account(&self, user_id: u64, guild_id: u64) -> Result<Account, LedgerError> {
        self.store.get_account(user_id, guild_id).await
    }

    /// Credit the wallet and journal the mutation. Returns the new wallet
    /// balance.
    pub async fn credit(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
        kind: TxKind,
        description: impl Into<String>,
    ) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.store.adjust_wallet(user_id, guild_id, amount).await?;
        self.store
            .log_transaction(Transaction {
                user_id,
                guild_id,
                related_user_id: None,
                kind,
                amount,
                description: description.into(),
                timestamp: Utc::now(),
            })
            .await?;

        Ok(self.store.get_account(user_id, guild_id).await?.wallet)
    }

    /// Debit the wallet and journal the mutation. Fails with
    /// `InsufficientFunds` when the wallet would go negative.
    pub async fn debit(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
        kind: TxKind,
        description: impl Into<String>,
    ) -> Result<i64, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let account = self.store.get_account(user_id, guild_id).await?;
        if account.wallet < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: account.wallet,
            });
        }

        // The store re-checks under its own lock; a false here means we
        // raced another mutation.
        if !self.store.adjust_wallet(user_id, guild_id, -amount).await? {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: account.wallet,
            });
        }

        self.store
            .log_transaction(Transaction {
                user_id,
                guild_id,
                related_user_id: None,
                kind,
                amount: -amount,
                description: description.into(),
                timestamp: Utc::now(),
            })
            .await?;

        Ok(account.wallet - amount)
    }

    /// Atomic wallet transfer between two users. Either both balances move
    /// and exactly one journal entry exists, or nothing happened.
    pub async fn transfer(
        &self,
        from_user: u64,
        to_user: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let sender = self.store.get_account(from_user, guild_id).await?;
        if sender.wallet < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: sender.wallet,
            });
        }

        // One record per transfer, signed from the sender's side; the
        // recipient sees the same record through its destination column.
        let entry = Transaction {
            user_id: from_user,
            guild_id,
            related_user_id: Some(to_user),
            kind: TxKind::Transfer,
            amount: -amount,
            description: format!("Transfer to {}", to_user),
            timestamp: Utc::now(),
        };

        if !self
            .store
            .transfer_wallet(from_user, to_user, guild_id, amount, entry)
            .await?
        {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: sender.wallet,
            });
        }

        Ok(())
    }

    /// Move coins from wallet to bank. Returns (wallet, bank) after.
    pub async fn deposit(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<(i64, i64), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let account = self.store.get_account(user_id, guild_id).await?;
        if account.wallet < amount || !self.store.move_to_bank(user_id, guild_id, amount).await? {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: account.wallet,
            });
        }

        self.store
            .log_transaction(Transaction {
                user_id,
                guild_id,
                related_user_id: None,
                kind: TxKind::Deposit,
                amount,
                description: "Bank deposit".to_string(),
                timestamp: Utc::now(),
            })
            .await?;

        Ok((account.wallet - amount, account.bank + amount))
    }

    /// Move coins from bank to wallet. Returns (wallet, bank) after.
    pub async fn withdraw(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
    ) -> Result<(i64, i64), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let account = self.store.get_account(user_id, guild_id).await?;
        if account.bank < amount || !self.store.move_to_wallet(user_id, guild_id, amount).await? {
            return Err(LedgerError::InsufficientBank {
                required: amount,
                available: account.bank,
            });
        }

        self.store
            .log_transaction(Transaction {
                user_id,
                guild_id,
                related_user_id: None,
                kind: TxKind::Withdraw,
                amount,
                description: "Bank withdrawal".to_string(),
                timestamp: Utc::now(),
            })
            .await?;

        Ok((account.wallet + amount, account.bank - amount))
    }

    /// Work for a random payout. Gated by the work cooldown.
    pub async fn work(&self, user_id: u64, guild_id: u64) -> Result<EarnOutcome, LedgerError> {
        self.gate(user_id, guild_id, CooldownKind::Work).await?;

        let amount = self
            .risk
            .dice()
            .roll_range(self.config.work_min, self.config.work_max);
        let new_wallet = self
            .credit(user_id, guild_id, amount, TxKind::Work, "Work earnings")
            .await?;
        self.after_earn(user_id, guild_id, CooldownKind::Work).await
            .map(|next_available| EarnOutcome {
                amount,
                new_wallet,
                next_available,
            })
    }

    /// Claim the daily bonus. Gated by the 24h daily cooldown.
    pub async fn claim_daily(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<EarnOutcome, LedgerError> {
        self.gate(user_id, guild_id, CooldownKind::Daily).await?;

        let amount = self
            .risk
            .dice()
            .roll_range(self.config.daily_min, self.config.daily_max);
        let new_wallet = self
            .credit(user_id, guild_id, amount, TxKind::Daily, "Daily bonus claim")
            .await?;
        self.after_earn(user_id, guild_id, CooldownKind::Daily)
            .await
            .map(|next_available| EarnOutcome {
                amount,
                new_wallet,
                next_available,
            })
    }

    /// Attempt a crime: rolls against the configured success rate and
    /// applies the reward or a fine clamped to the wallet.
    pub async fn commit_crime(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<CrimeOutcome, LedgerError> {
        let account = self.gate(user_id, guild_id, CooldownKind::Crime).await?;

        // The cooldown arms whether or not the crime pays.
        let now = Utc::now();
        self.store
            .set_last_action(user_id, guild_id, CooldownKind::Crime, now)
            .await?;
        let next_available = now + self.config.window(CooldownKind::Crime);

        let RiskOutcome { success, delta } = self.risk.resolve(&self.config.crime, account.wallet);

        let (amount, new_wallet) = if success {
            let new_wallet = self
                .credit(
                    user_id,
                    guild_id,
                    delta,
                    TxKind::CrimeSuccess,
                    "Successful crime earnings",
                )
                .await?;
            (delta, new_wallet)
        } else if delta < 0 {
            let fine = -delta;
            let new_wallet = self
                .debit(user_id, guild_id, fine, TxKind::CrimeFail, "Crime failure fine")
                .await?;
            (fine, new_wallet)
        } else {
            // Nothing to confiscate from an empty wallet.
            (0, account.wallet)
        };

        if success {
            self.store
                .add_experience(user_id, guild_id, self.config.earn_xp)
                .await?;
        }

        Ok(CrimeOutcome {
            success,
            amount,
            new_wallet,
            next_available,
        })
    }

    /// Time until the gated command is available again, if still cooling
    /// down.
    #[allow(dead_code)]
    pub async fn cooldown_remaining(
        &self,
        user_id: u64,
        guild_id: u64,
        kind: CooldownKind,
    ) -> Result<Option<std::time::Duration>, LedgerError> {
        let account = self.store.get_account(user_id, guild_id).await?;
        Ok(
            cooldown::remaining(account.last_action(kind), self.config.window(kind), Utc::now())
                .map(|d| d.to_std().unwrap_or_default()),
        )
    }

    pub async fn leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<Account>, LedgerError> {
        self.store.leaderboard(guild_id, limit).await
    }

    pub async fn recent_transactions(
        &self,
        user_id: u64,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.store.recent_transactions(user_id, guild_id, limit).await
    }

    /// Credit interest on every positive bank balance in the guild.
    /// Returns the number of accounts paid.
    pub async fn apply_interest(&self, guild_id: u64, rate: f64) -> Result<u32, LedgerError> {
        let accounts = self.store.accounts_with_bank(guild_id).await?;

        let mut paid = 0;
        for account in accounts {
            let interest = (account.bank as f64 * rate) as i64;
            if interest <= 0 {
                continue;
            }

            self.store
                .credit_bank(account.user_id, guild_id, interest)
                .await?;
            self.store
                .log_transaction(Transaction {
                    user_id: account.user_id,
                    guild_id,
                    related_user_id: None,
                    kind: TxKind::Interest,
                    amount: interest,
                    description: format!("Daily interest ({:.1}%)", rate * 100.0),
                    timestamp: Utc::now(),
                })
                .await?;
            paid += 1;
        }

        Ok(paid)
    }

    /// Fails with `CooldownActive` while the gate is closed; otherwise
    /// returns the account.
    async fn gate(
        &self,
        user_id: u64,
        guild_id: u64,
        kind: CooldownKind,
    ) -> Result<Account, LedgerError> {
        let account = self.store.get_account(user_id, guild_id).await?;
        if let Some(left) =
            cooldown::remaining(account.last_action(kind), self.config.window(kind), Utc::now())
        {
            return Err(LedgerError::CooldownActive(
                left.to_std().unwrap_or_default(),
            ));
        }
        Ok(account)
    }

    /// Arm the cooldown and award XP after a successful earn.
    async fn after_earn(
        &self,
        user_id: u64,
        guild_id: u64,
        kind: CooldownKind,
    ) -> Result<DateTime<Utc>, LedgerError> {
        let now = Utc::now();
        self.store
            .set_last_action(user_id, guild_id, kind, now)
            .await?;
        self.store
            .add_experience(user_id, guild_id, self.config.earn_xp)
            .await?;
        Ok(now + self.config.window(kind))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store for testing. All mutations happen under one lock so
    /// transfers are as atomic as the SQLite implementation.
    pub(crate) struct InMemoryAccountStore {
        accounts: Mutex<HashMap<(u64, u64), Account>>,
        journal: Mutex<Vec<Transaction>>,
    }

    impl InMemoryAccountStore {
        pub(crate) fn new() -> Self {
            Self {
                accounts: Mutex::new(HashMap::new()),
                journal: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn journal_len(&self) -> usize {
            self.journal.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AccountStore for InMemoryAccountStore {
        async fn get_account(&self, user_id: u64, guild_id: u64) -> Result<Account, LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            Ok(accounts
                .entry((user_id, guild_id))
                .or_insert_with(|| Account::empty(user_id, guild_id))
                .clone())
        }

        async fn adjust_wallet(
            &self,
            user_id: u64,
            guild_id: u64,
            delta: i64,
        ) -> Result<bool, LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .entry((user_id, guild_id))
                .or_insert_with(|| Account::empty(user_id, guild_id));
            if account.wallet + delta < 0 {
                return Ok(false);
            }
            account.wallet += delta;
            if delta > 0 {
                account.total_earned += delta;
            } else {
                account.total_spent += -delta;
            }
            Ok(true)
        }

        async fn credit_bank(
            &self,
            user_id: u64,
            guild_id: u64,
            amount: i64,
        ) -> Result<(), LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .entry((user_id, guild_id))
                .or_insert_with(|| Account::empty(user_id, guild_id));
            account.bank += amount;
            account.total_earned += amount;
            Ok(())
        }

        async fn move_to_bank(
            &self,
            user_id: u64,
            guild_id: u64,
            amount: i64,
        ) -> Result<bool, LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .entry((user_id, guild_id))
                .or_insert_with(|| Account::empty(user_id, guild_id));
            if account.wallet < amount {
                return Ok(false);
            }
            account.wallet -= amount;
            account.bank += amount;
            Ok(true)
        }

        async fn move_to_wallet(
            &self,
            user_id: u64,
            guild_id: u64,
            amount: i64,
        ) -> Result<bool, LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .entry((user_id, guild_id))
                .or_insert_with(|| Account::empty(user_id, guild_id));
            if account.bank < amount {
                return Ok(false);
            }
            account.bank -= amount;
            account.wallet += amount;
            Ok(true)
        }

        async fn transfer_wallet(
            &self,
            from_user: u64,
            to_user: u64,
            guild_id: u64,
            amount: i64,
            entry: Transaction,
        ) -> Result<bool, LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            accounts
                .entry((from_user, guild_id))
                .or_insert_with(|| Account::empty(from_user, guild_id));
            accounts
                .entry((to_user, guild_id))
                .or_insert_with(|| Account::empty(to_user, guild_id));

            let sender = accounts.get_mut(&(from_user, guild_id)).unwrap();
            if sender.wallet < amount {
                return Ok(false);
            }
            sender.wallet -= amount;
            sender.total_spent += amount;

            let receiver = accounts.get_mut(&(to_user, guild_id)).unwrap();
            receiver.wallet += amount;
            receiver.total_earned += amount;

            self.journal.lock().unwrap().push(entry);
            Ok(true)
        }

        async fn add_experience(
            &self,
            user_id: u64,
            guild_id: u64,
            amount: i64,
        ) -> Result<(), LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .entry((user_id, guild_id))
                .or_insert_with(|| Account::empty(user_id, guild_id));
            account.experience += amount;
            Ok(())
        }

        async fn set_last_action(
            &self,
            user_id: u64,
            guild_id: u64,
            kind: CooldownKind,
            at: DateTime<Utc>,
        ) -> Result<(), LedgerError> {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .entry((user_id, guild_id))
                .or_insert_with(|| Account::empty(user_id, guild_id));
            match kind {
                CooldownKind::Work => account.last_work = Some(at),
                CooldownKind::Daily => account.last_daily = Some(at),
                CooldownKind::Crime => account.last_crime = Some(at),
            }
            Ok(())
        }

        async fn log_transaction(&self, entry: Transaction) -> Result<(), LedgerError> {
            self.journal.lock().unwrap().push(entry);
            Ok(())
        }

        async fn recent_transactions(
            &self,
            user_id: u64,
            guild_id: u64,
            limit: usize,
        ) -> Result<Vec<Transaction>, LedgerError> {
            let journal = self.journal.lock().unwrap();
            Ok(journal
                .iter()
                .filter(|t| {
                    t.guild_id == guild_id
                        && (t.user_id == user_id || t.related_user_id == Some(user_id))
                })
                .rev()
                .take(limit)
                .cloned()
                .collect())
        }

        async fn leaderboard(
            &self,
            guild_id: u64,
            limit: usize,
        ) -> Result<Vec<Account>, LedgerError> {
            let accounts = self.accounts.lock().unwrap();
            let mut rows: Vec<Account> = accounts
                .values()
                .filter(|a| a.guild_id == guild_id)
                .cloned()
                .collect();
            rows.sort_by_key(|a| -a.net_worth());
            rows.truncate(limit);
            Ok(rows)
        }

        async fn accounts_with_bank(&self, guild_id: u64) -> Result<Vec<Account>, LedgerError> {
            let accounts = self.accounts.lock().unwrap();
            Ok(accounts
                .values()
                .filter(|a| a.guild_id == guild_id && a.bank > 0)
                .cloned()
                .collect())
        }
    }

    fn service() -> LedgerService<InMemoryAccountStore> {
        LedgerService::new(InMemoryAccountStore::new())
    }

    #[tokio::test]
    async fn credit_and_debit_update_wallet() {
        let service = service();

        let wallet = service
            .credit(1, 1, 100, TxKind::AdminGrant, "grant")
            .await
            .unwrap();
        assert_eq!(wallet, 100);

        let wallet = service
            .debit(1, 1, 40, TxKind::Purchase, "test purchase")
            .await
            .unwrap();
        assert_eq!(wallet, 60);

        let account = service.account(1, 1).await.unwrap();
        assert_eq!(account.total_earned, 100);
        assert_eq!(account.total_spent, 40);
    }

    #[tokio::test]
    async fn debit_never_overdraws() {
        let service = service();
        service
            .credit(1, 1, 30, TxKind::AdminGrant, "grant")
            .await
            .unwrap();

        let err = service
            .debit(1, 1, 31, TxKind::Purchase, "too much")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                required: 31,
                available: 30
            }
        ));

        // Wallet untouched.
        assert_eq!(service.account(1, 1).await.unwrap().wallet, 30);
    }

    #[tokio::test]
    async fn every_mutation_writes_a_journal_entry() {
        let service = service();
        service.credit(1, 1, 100, TxKind::Work, "w").await.unwrap();
        service.debit(1, 1, 25, TxKind::Purchase, "p").await.unwrap();
        service.deposit(1, 1, 50).await.unwrap();
        service.withdraw(1, 1, 10).await.unwrap();

        assert_eq!(service.store.journal_len(), 4);
    }

    #[tokio::test]
    async fn transfer_moves_exactly_n_with_one_entry() {
        let service = service();
        service
            .credit(1, 1, 100, TxKind::AdminGrant, "grant")
            .await
            .unwrap();
        let journal_before = service.store.journal_len();

        service.transfer(1, 2, 1, 60).await.unwrap();

        assert_eq!(service.account(1, 1).await.unwrap().wallet, 40);
        assert_eq!(service.account(2, 1).await.unwrap().wallet, 60);
        assert_eq!(service.store.journal_len(), journal_before + 1);

        // Both parties see the same record.
        let sender_view = service.recent_transactions(1, 1, 10).await.unwrap();
        let receiver_view = service.recent_transactions(2, 1, 10).await.unwrap();
        assert_eq!(sender_view[0].kind, TxKind::Transfer);
        assert_eq!(sender_view[0].amount, -60);
        assert_eq!(receiver_view[0].related_user_id, Some(2));
    }

    #[tokio::test]
    async fn failed_transfer_changes_nothing() {
        let service = service();
        service
            .credit(1, 1, 50, TxKind::AdminGrant, "grant")
            .await
            .unwrap();
        let journal_before = service.store.journal_len();

        let err = service.transfer(1, 2, 1, 51).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

        assert_eq!(service.account(1, 1).await.unwrap().wallet, 50);
        assert_eq!(service.account(2, 1).await.unwrap().wallet, 0);
        assert_eq!(service.store.journal_len(), journal_before);
    }

    #[tokio::test]
    async fn deposit_and_withdraw_preserve_net_worth() {
        let service = service();
        service
            .credit(1, 1, 100, TxKind::AdminGrant, "grant")
            .await
            .unwrap();

        let (wallet, bank) = service.deposit(1, 1, 70).await.unwrap();
        assert_eq!((wallet, bank), (30, 70));

        let (wallet, bank) = service.withdraw(1, 1, 20).await.unwrap();
        assert_eq!((wallet, bank), (50, 50));

        let account = service.account(1, 1).await.unwrap();
        assert_eq!(account.net_worth(), 100);

        let err = service.withdraw(1, 1, 51).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBank { .. }));
    }

    #[tokio::test]
    async fn daily_twice_hits_cooldown_with_nearly_full_window() {
        let service = service();

        let outcome = service.claim_daily(1, 1).await.unwrap();
        assert!(outcome.amount >= 50 && outcome.amount <= 100);

        let err = service.claim_daily(1, 1).await.unwrap_err();
        match err {
            LedgerError::CooldownActive(left) => {
                assert!(left > std::time::Duration::from_secs(23 * 3600));
                assert!(left <= std::time::Duration::from_secs(24 * 3600));
            }
            other => panic!("expected CooldownActive, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn work_arms_its_own_gate() {
        let service = service();

        service.work(1, 1).await.unwrap();
        let err = service.work(1, 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::CooldownActive(_)));

        // A different user is unaffected.
        service.work(2, 1).await.unwrap();
    }

    #[tokio::test]
    async fn crime_fine_is_clamped_to_wallet() {
        let config = EconomyConfig {
            crime: crate::core::economy::RiskConfig {
                success_rate: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let service = LedgerService::with_config(
            InMemoryAccountStore::new(),
            config,
            RiskResolver::seeded(3),
        );
        service
            .credit(1, 1, 5, TxKind::AdminGrant, "grant")
            .await
            .unwrap();

        let outcome = service.commit_crime(1, 1).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.amount <= 5);
        assert!(outcome.new_wallet >= 0);
    }

    #[tokio::test]
    async fn crime_with_empty_wallet_never_goes_negative() {
        let config = EconomyConfig {
            crime: crate::core::economy::RiskConfig {
                success_rate: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let service = LedgerService::with_config(
            InMemoryAccountStore::new(),
            config,
            RiskResolver::seeded(3),
        );

        let outcome = service.commit_crime(1, 1).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.amount, 0);
        assert_eq!(outcome.new_wallet, 0);
    }

    #[tokio::test]
    async fn successful_crime_credits_reward() {
        let config = EconomyConfig {
            crime: crate::core::economy::RiskConfig {
                success_rate: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let service = LedgerService::with_config(
            InMemoryAccountStore::new(),
            config,
            RiskResolver::seeded(3),
        );

        let outcome = service.commit_crime(1, 1).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.amount >= 25 && outcome.amount <= 150);
        assert_eq!(outcome.new_wallet, outcome.amount);
    }

    #[tokio::test]
    async fn interest_credits_positive_bank_balances() {
        let service = service();
        service
            .credit(1, 1, 100, TxKind::AdminGrant, "grant")
            .await
            .unwrap();
        service.deposit(1, 1, 100).await.unwrap();
        // User 2 keeps nothing in the bank.
        service
            .credit(2, 1, 100, TxKind::AdminGrant, "grant")
            .await
            .unwrap();

        let paid = service.apply_interest(1, 0.02).await.unwrap();
        assert_eq!(paid, 1);
        assert_eq!(service.account(1, 1).await.unwrap().bank, 102);
        assert_eq!(service.account(2, 1).await.unwrap().bank, 0);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_net_worth() {
        let service = service();
        service.credit(1, 1, 50, TxKind::AdminGrant, "g").await.unwrap();
        service.credit(2, 1, 200, TxKind::AdminGrant, "g").await.unwrap();
        service.deposit(2, 1, 150).await.unwrap();
        service.credit(3, 1, 100, TxKind::AdminGrant, "g").await.unwrap();

        let top = service.leaderboard(1, 10).await.unwrap();
        let ids: Vec<u64> = top.iter().map(|a| a.user_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
