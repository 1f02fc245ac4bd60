//! Pure cost and production formulas.
//!
//! Unit prices follow an exponential curve `base * growth^owned`, always
//! rounded down to whole units. Buying `n` at once uses the closed-form
//! geometric sum, and "buy max" searches for the largest affordable `n`.

use crate::resources::{Cost, ResourceLedger};

/// Upper bound for a single bulk purchase.
pub const MAX_BULK_AMOUNT: u64 = 1_000_000_000_000;

/// Slack absorbed before flooring, so `239.99999999999997` prices as `240`.
const FLOOR_EPSILON: f64 = 1e-9;

/// Round a price or payout down to whole units.
#[must_use]
pub fn whole_units(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    (x + FLOOR_EPSILON).floor()
}

/// Price of the next single unit: `floor(base * growth^owned)`.
#[must_use]
pub fn unit_price(base: f64, growth: f64, owned: u64) -> f64 {
    whole_units(base * growth.powf(owned as f64))
}

/// Price of `amount` units bought together when `owned` are already held.
///
/// Closed form of `sum(base * growth^(owned + i))` for `i in 0..amount`;
/// degenerates to `base * amount` when `growth == 1`.
#[must_use]
pub fn bulk_price(base: f64, growth: f64, owned: u64, amount: u64) -> f64 {
    if amount == 0 {
        return 0.0;
    }
    let first = base * growth.powf(owned as f64);
    let raw = if (growth - 1.0).abs() < f64::EPSILON {
        first * amount as f64
    } else {
        // (g^n - 1) / (g - 1), kept accurate for g close to 1.
        let step = growth - 1.0;
        first * (amount as f64 * step.ln_1p()).exp_m1() / step
    };
    whole_units(raw)
}

/// Full price bundle of the next unit, with `multiplier` applied to every base.
#[must_use]
pub fn cost_at(base: &Cost, growth: f64, owned: u64, multiplier: f64) -> Cost {
    base.iter()
        .map(|(kind, amount)| (kind, unit_price(amount * multiplier, growth, owned)))
        .collect()
}

/// Full price bundle of `amount` units bought together.
#[must_use]
pub fn bulk_cost(base: &Cost, growth: f64, owned: u64, amount: u64, multiplier: f64) -> Cost {
    base.iter()
        .map(|(kind, value)| (kind, bulk_price(value * multiplier, growth, owned, amount)))
        .collect()
}

/// Largest `n` whose [`bulk_cost`] the ledger can pay. Zero when even one is
/// unaffordable.
///
/// Doubles `n` until it becomes unaffordable, then bisects. Every probe is a
/// closed-form price, so this stays logarithmic in the answer.
#[must_use]
pub fn max_affordable(
    base: &Cost,
    growth: f64,
    owned: u64,
    multiplier: f64,
    ledger: &ResourceLedger,
) -> u64 {
    let affordable = |amount: u64| {
        ledger
            .can_afford(&bulk_cost(base, growth, owned, amount, multiplier))
            .is_ok()
    };
    if !affordable(1) {
        return 0;
    }
    let mut lo = 1;
    let mut hi = 2;
    while hi <= MAX_BULK_AMOUNT && affordable(hi) {
        lo = hi;
        hi = hi.saturating_mul(2);
    }
    // `lo` is affordable; `hi` is not (or is past the bulk limit).
    let mut hi = hi.min(MAX_BULK_AMOUNT + 1);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if affordable(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Output of `owned` producers over `seconds`.
#[must_use]
pub fn production_over(rate_per_second: f64, owned: u64, multiplier: f64, seconds: f64) -> f64 {
    rate_per_second * owned as f64 * multiplier * seconds
}

/// Fraction of a converter's demand that `available` input can satisfy.
#[must_use]
pub fn conversion_fraction(desired: f64, available: f64) -> f64 {
    if desired <= 0.0 {
        return 1.0;
    }
    (available / desired).clamp(0.0, 1.0)
}
