//! Basis-point fee schedule.
//!
//! The split is a pure function of the gross amount: it is computed and
//! logged identically on both settlement paths so later fee collection can
//! be reconciled against past settlements, but it does not currently alter
//! the transferred amount.

use alloy_primitives::{Address, U256};

/// Fee configuration: a basis-point rate with floor/ceiling clamps.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    /// Fee rate in basis points (1 bp = 0.01%). Zero disables fees.
    pub basis_points: u32,
    /// Minimum fee in the asset's smallest unit, applied when the rate
    /// yields less.
    pub min_fee: U256,
    /// Maximum fee in the asset's smallest unit; zero means uncapped.
    pub max_fee: U256,
    /// Where collected fees would be sent.
    pub recipient: Option<Address>,
}

/// A gross amount divided into the net transfer and the fee portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// Amount remaining for the recipient.
    pub net: U256,
    /// Fee portion.
    pub fee: U256,
}

impl FeeSchedule {
    /// A schedule that charges nothing.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            basis_points: 0,
            min_fee: U256::ZERO,
            max_fee: U256::ZERO,
            recipient: None,
        }
    }

    /// Splits `gross` into net and fee portions.
    ///
    /// With a zero rate the fee is zero. Otherwise the rate is applied,
    /// clamped to `[min_fee, max_fee]` (an unset ceiling of zero means
    /// uncapped), and never exceeds `gross`.
    #[must_use]
    pub fn split(&self, gross: U256) -> FeeSplit {
        if self.basis_points == 0 {
            return FeeSplit {
                net: gross,
                fee: U256::ZERO,
            };
        }
        let mut fee = gross * U256::from(self.basis_points) / U256::from(10_000u64);
        if fee < self.min_fee {
            fee = self.min_fee;
        }
        if !self.max_fee.is_zero() && fee > self.max_fee {
            fee = self.max_fee;
        }
        if fee > gross {
            fee = gross;
        }
        FeeSplit {
            net: gross - fee,
            fee,
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(bps: u32, min: u64, max: u64) -> FeeSchedule {
        FeeSchedule {
            basis_points: bps,
            min_fee: U256::from(min),
            max_fee: U256::from(max),
            recipient: None,
        }
    }

    #[test]
    fn test_disabled_charges_nothing() {
        let split = FeeSchedule::disabled().split(U256::from(1_000_000u64));
        assert_eq!(split.fee, U256::ZERO);
        assert_eq!(split.net, U256::from(1_000_000u64));
    }

    #[test]
    fn test_rate_applies() {
        // 50 bp of 1_000_000 = 5_000
        let split = schedule(50, 0, 0).split(U256::from(1_000_000u64));
        assert_eq!(split.fee, U256::from(5_000u64));
        assert_eq!(split.net, U256::from(995_000u64));
    }

    #[test]
    fn test_floor_and_ceiling_clamp() {
        let split = schedule(1, 500, 0).split(U256::from(1_000_000u64));
        assert_eq!(split.fee, U256::from(500u64)); // raw 100 lifted to floor

        let split = schedule(1_000, 0, 2_000).split(U256::from(1_000_000u64));
        assert_eq!(split.fee, U256::from(2_000u64)); // raw 100_000 capped
    }

    #[test]
    fn test_fee_never_exceeds_gross() {
        let split = schedule(50, 10_000, 0).split(U256::from(100u64));
        assert_eq!(split.fee, U256::from(100u64));
        assert_eq!(split.net, U256::ZERO);
    }

    #[test]
    fn test_split_is_pure() {
        let sched = schedule(25, 10, 100_000);
        let a = sched.split(U256::from(123_456u64));
        let b = sched.split(U256::from(123_456u64));
        assert_eq!(a, b);
        assert_eq!(a.net + a.fee, U256::from(123_456u64));
    }
}
