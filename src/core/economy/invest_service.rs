// Investments - lock coins away for a tiered risk/reward payout.
//
// There is no background maturation task. Matured positions sit in the
// store until the owner runs the collect command, which resolves each one
// through a risk roll and credits the payout back to the ledger.

use super::ledger_service::{AccountStore, LedgerError, LedgerService, TxKind};
use super::risk::Dice;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Investment tiers with different risk/reward profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestTier {
    Conservative,
    Balanced,
    Aggressive,
}

/// Static risk/reward profile of a tier.
#[derive(Debug, Clone)]
pub struct TierProfile {
    pub name: &'static str,
    pub emoji: &'static str,
    pub min_days: i64,
    pub max_days: i64,
    pub min_return: f64,
    pub max_return: f64,
    /// Chance the position resolves as a loss at collection time.
    pub loss_chance: f64,
}

impl InvestTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestTier::Conservative => "conservative",
            InvestTier::Balanced => "balanced",
            InvestTier::Aggressive => "aggressive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "conservative" => Some(InvestTier::Conservative),
            "balanced" => Some(InvestTier::Balanced),
            "aggressive" => Some(InvestTier::Aggressive),
            _ => None,
        }
    }

    pub fn profile(&self) -> TierProfile {
        match self {
            InvestTier::Conservative => TierProfile {
                name: "Conservative Bonds",
                emoji: "🛡️",
                min_days: 1,
                max_days: 3,
                min_return: 1.05,
                max_return: 1.15,
                loss_chance: 0.10,
            },
            InvestTier::Balanced => TierProfile {
                name: "Balanced Portfolio",
                emoji: "⚖️",
                min_days: 2,
                max_days: 5,
                min_return: 0.8,
                max_return: 1.8,
                loss_chance: 0.25,
            },
            InvestTier::Aggressive => TierProfile {
                name: "High-Risk Stocks",
                emoji: "🚀",
                min_days: 3,
                max_days: 7,
                min_return: 0.5,
                max_return: 3.0,
                loss_chance: 0.40,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestStatus {
    Active,
    Completed,
}

impl InvestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestStatus::Active => "active",
            InvestStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(InvestStatus::Active),
            "completed" => Some(InvestStatus::Completed),
            _ => None,
        }
    }
}

/// A persisted investment position.
#[derive(Debug, Clone)]
pub struct Investment {
    pub id: i64,
    #[allow(dead_code)]
    pub user_id: u64,
    #[allow(dead_code)]
    pub guild_id: u64,
    pub amount: i64,
    pub tier: InvestTier,
    /// Multiplier sampled at creation from the tier's return range.
    pub expected_return: f64,
    /// Multiplier actually applied at collection.
    pub actual_return: Option<f64>,
    pub status: InvestStatus,
    #[allow(dead_code)]
    pub created_at: DateTime<Utc>,
    pub maturity_date: DateTime<Utc>,
    #[allow(dead_code)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields for a new position; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub user_id: u64,
    pub guild_id: u64,
    pub amount: i64,
    pub tier: InvestTier,
    pub expected_return: f64,
    pub created_at: DateTime<Utc>,
    pub maturity_date: DateTime<Utc>,
}

/// What the caller gets back right after investing.
#[derive(Debug, Clone)]
pub struct InvestmentReceipt {
    pub id: i64,
    pub amount: i64,
    pub tier: InvestTier,
    pub expected_return: f64,
    pub expected_payout: i64,
    pub days_to_mature: i64,
    pub maturity_date: DateTime<Utc>,
}

/// One matured position resolved by collect.
#[derive(Debug, Clone)]
pub struct CollectedInvestment {
    pub investment: Investment,
    pub actual_return: f64,
    pub payout: i64,
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Trait for persisting investment positions.
#[async_trait]
pub trait InvestStore: Send + Sync {
    /// Persist a new position and return its id.
    async fn create(&self, investment: NewInvestment) -> Result<i64, LedgerError>;

    /// All positions for a user, newest first.
    async fn investments(&self, user_id: u64, guild_id: u64)
        -> Result<Vec<Investment>, LedgerError>;

    /// Active positions whose maturity date has passed.
    async fn matured(
        &self,
        user_id: u64,
        guild_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Investment>, LedgerError>;

    /// Mark a position completed with its realized return.
    async fn complete(
        &self,
        id: i64,
        actual_return: f64,
        completed_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct InvestConfig {
    pub min_amount: i64,
    pub max_amount: i64,
}

impl Default for InvestConfig {
    fn default() -> Self {
        Self {
            min_amount: 100,
            max_amount: 10_000,
        }
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Service for creating and collecting investments.
pub struct InvestService<A: AccountStore, S: InvestStore> {
    store: S,
    ledger: std::sync::Arc<LedgerService<A>>,
    config: InvestConfig,
    dice: Dice,
}

impl<A: AccountStore, S: InvestStore> InvestService<A, S> {
    #[allow(dead_code)]
    pub fn new(store: S, ledger: std::sync::Arc<LedgerService<A>>) -> Self {
        Self {
            store,
            ledger,
            config: InvestConfig::default(),
            dice: Dice::new(),
        }
    }

    pub fn with_config(
        store: S,
        ledger: std::sync::Arc<LedgerService<A>>,
        config: InvestConfig,
        dice: Dice,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            dice,
        }
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &InvestConfig {
        &self.config
    }

    /// Open a position: debits the wallet and records the investment with a
    /// sampled maturity window and expected return.
    pub async fn invest(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: i64,
        tier: InvestTier,
    ) -> Result<InvestmentReceipt, LedgerError> {
        if amount < self.config.min_amount || amount > self.config.max_amount {
            return Err(LedgerError::AmountOutOfRange {
                min: self.config.min_amount,
                max: self.config.max_amount,
            });
        }

        let profile = tier.profile();
        self.ledger
            .debit(
                user_id,
                guild_id,
                amount,
                TxKind::Invest,
                format!("Investment: {}", profile.name),
            )
            .await?;

        let days_to_mature = self.dice.roll_range(profile.min_days, profile.max_days);
        let expected_return = self.dice.roll_f64(profile.min_return, profile.max_return);
        let now = Utc::now();
        let maturity_date = now + Duration::days(days_to_mature);

        let id = self
            .store
            .create(NewInvestment {
                user_id,
                guild_id,
                amount,
                tier,
                expected_return,
                created_at: now,
                maturity_date,
            })
            .await?;

        Ok(InvestmentReceipt {
            id,
            amount,
            tier,
            expected_return,
            expected_payout: (amount as f64 * expected_return) as i64,
            days_to_mature,
            maturity_date,
        })
    }

    /// All of a user's positions, newest first.
    pub async fn portfolio(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Vec<Investment>, LedgerError> {
        self.store.investments(user_id, guild_id).await
    }

    /// Resolve every matured position: roll the tier's loss chance, credit
    /// the payout, and mark the position completed.
    pub async fn collect(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Vec<CollectedInvestment>, LedgerError> {
        let now = Utc::now();
        let matured = self.store.matured(user_id, guild_id, now).await?;

        let mut collected = Vec::with_capacity(matured.len());
        for investment in matured {
            let profile = investment.tier.profile();
            let actual_return = if self.dice.roll_fraction() < profile.loss_chance {
                // Lost position: keep only a random fraction of the stake.
                self.dice.roll_fraction()
            } else {
                investment.expected_return
            };

            let payout = (investment.amount as f64 * actual_return) as i64;
            self.store.complete(investment.id, actual_return, now).await?;

            if payout > 0 {
                self.ledger
                    .credit(
                        user_id,
                        guild_id,
                        payout,
                        TxKind::InvestPayout,
                        format!("Matured {}", profile.name),
                    )
                    .await?;
            }

            collected.push(CollectedInvestment {
                investment,
                actual_return,
                payout,
            });
        }

        Ok(collected)
    }
}

// ============================================================================
// TESTS
// ============================================================================
