// Risk resolver - probability rolls for crime and investment outcomes.
//
// All randomness in the economy flows through `Dice` so that tests can pin
// a seed and get reproducible outcomes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, MutexGuard};

/// Send-safe random source shared by the economy services.
pub struct Dice {
    rng: Mutex<StdRng>,
}

impl Dice {
    /// Dice seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Dice with a fixed seed. Outcomes are fully reproducible.
    #[allow(dead_code)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        // A poisoned lock only means another thread panicked mid-roll; the
        // generator state is still usable.
        self.rng.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Uniform integer in `min..=max`.
    pub fn roll_range(&self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.rng().gen_range(min..=max)
    }

    /// Uniform float in `min..=max`.
    pub fn roll_f64(&self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng().gen_range(min..=max)
    }

    /// Uniform float in `[0, 1)`.
    pub fn roll_fraction(&self) -> f64 {
        self.rng().gen::<f64>()
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters for a success-or-penalty roll.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Chance (0.0 to 1.0) that the roll succeeds.
    pub success_rate: f64,
    /// Reward range on success.
    pub reward_min: i64,
    pub reward_max: i64,
    /// Penalty range on failure.
    pub penalty_min: i64,
    pub penalty_max: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        // Crime defaults.
        Self {
            success_rate: 0.75,
            reward_min: 25,
            reward_max: 150,
            penalty_min: 10,
            penalty_max: 75,
        }
    }
}

/// Outcome of a resolved risk roll. `delta` is the signed amount to apply
/// to the wallet: positive reward on success, clamped negative penalty on
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskOutcome {
    pub success: bool,
    pub delta: i64,
}

/// Resolves probability thresholds into signed wallet deltas.
pub struct RiskResolver {
    dice: Dice,
}

impl RiskResolver {
    pub fn new() -> Self {
        Self { dice: Dice::new() }
    }

    /// Resolver with a fixed seed, for deterministic tests.
    #[allow(dead_code)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            dice: Dice::seeded(seed),
        }
    }

    pub fn dice(&self) -> &Dice {
        &self.dice
    }

    /// Roll against `config.success_rate`. The failure penalty is clamped to
    /// `penalty_cap` so the caller's wallet can never go negative.
    pub fn resolve(&self, config: &RiskConfig, penalty_cap: i64) -> RiskOutcome {
        if self.dice.roll_fraction() < config.success_rate {
            RiskOutcome {
                success: true,
                delta: self.dice.roll_range(config.reward_min, config.reward_max),
            }
        } else {
            let penalty = self
                .dice
                .roll_range(config.penalty_min, config.penalty_max)
                .min(penalty_cap.max(0));
            RiskOutcome {
                success: false,
                delta: -penalty,
            }
        }
    }
}

impl Default for RiskResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let a = Dice::seeded(42);
        let b = Dice::seeded(42);

        for _ in 0..32 {
            assert_eq!(a.roll_range(0, 1_000_000), b.roll_range(0, 1_000_000));
        }
        assert_eq!(a.roll_fraction(), b.roll_fraction());
    }

    #[test]
    fn certain_success_always_rewards() {
        let resolver = RiskResolver::seeded(7);
        let config = RiskConfig {
            success_rate: 1.0,
            ..Default::default()
        };

        for _ in 0..50 {
            let outcome = resolver.resolve(&config, 1000);
            assert!(outcome.success);
            assert!(outcome.delta >= config.reward_min && outcome.delta <= config.reward_max);
        }
    }

    #[test]
    fn certain_failure_always_penalizes() {
        let resolver = RiskResolver::seeded(7);
        let config = RiskConfig {
            success_rate: 0.0,
            ..Default::default()
        };

        for _ in 0..50 {
            let outcome = resolver.resolve(&config, 1000);
            assert!(!outcome.success);
            assert!(outcome.delta <= -config.penalty_min && outcome.delta >= -config.penalty_max);
        }
    }

    #[test]
    fn penalty_clamped_to_cap() {
        let resolver = RiskResolver::seeded(7);
        let config = RiskConfig {
            success_rate: 0.0,
            ..Default::default()
        };

        let outcome = resolver.resolve(&config, 5);
        assert!(outcome.delta >= -5);

        // Broke callers lose nothing.
        let outcome = resolver.resolve(&config, 0);
        assert_eq!(outcome.delta, 0);
    }

    #[test]
    fn resolvers_with_same_seed_agree() {
        let a = RiskResolver::seeded(99);
        let b = RiskResolver::seeded(99);
        let config = RiskConfig::default();

        for _ in 0..50 {
            assert_eq!(a.resolve(&config, 500), b.resolve(&config, 500));
        }
    }

    #[test]
    fn degenerate_range_returns_min() {
        let dice = Dice::seeded(1);
        assert_eq!(dice.roll_range(10, 10), 10);
        assert_eq!(dice.roll_range(10, 5), 10);
    }
}
