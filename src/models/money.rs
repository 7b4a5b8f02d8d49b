// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-point currency amounts.
//!
//! Prices are Vietnamese đồng, which has no minor unit, so an amount is a
//! whole number of đồng. Stored documents carry it as a plain JSON number.

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use rusty_money::{iso, Money as IsoMoney};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// An amount of money in whole đồng.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_dong(amount: i64) -> Self {
        Money(amount)
    }

    pub const fn as_dong(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at the representable range; cart arithmetic uses
    /// [`Money::checked_times`] instead.
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Price of `quantity` units, or `None` on overflow.
    pub fn checked_times(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Apply a percentage discount, rounding half away from zero.
    ///
    /// `percent` is clamped to 0..=100 and the result is never negative.
    pub fn discounted(self, percent: u8) -> Money {
        let percent = percent.min(100);
        if percent == 0 {
            return self;
        }

        let kept = Decimal::ONE_HUNDRED - Decimal::from(percent);
        let Some(scaled) = Decimal::from(self.0).checked_mul(kept) else {
            return self;
        };
        let value = (scaled / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        Money(value.to_i64().unwrap_or(0).max(0))
    }

    /// Divide evenly, rounding half away from zero. Zero divisor yields zero.
    pub fn average_over(self, count: u64) -> Money {
        if count == 0 {
            return Money::ZERO;
        }
        let value = (Decimal::from(self.0) / Decimal::from(count))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money(value.to_i64().unwrap_or(0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    /// Locale currency formatting (VND).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", IsoMoney::from_minor(self.0, iso::VND))
    }
}
