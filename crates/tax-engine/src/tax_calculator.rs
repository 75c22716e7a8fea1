//! Tax Calculator
//!
//! Turns a base price and a four-slot tax scheme into a total tax amount.
//!
//! Each slot carries a percentage and an application rule. Rule `0` applies the
//! percentage to the untouched base price; rule `k > 0` applies it to the base
//! price plus the tax already computed for slots `0..k`. This lets a surcharge be
//! levied on a base that already includes an earlier tax.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of tax slots in a scheme
pub const SLOT_COUNT: usize = 4;

/// Fractional digits kept for every price, quantity and tax amount
pub const MONEY_SCALE: u32 = 4;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxError {
    #[error("Tax overflow: {base_price} exceeds the decimal range once taxed")]
    Overflow { base_price: Decimal },
}

/// Round to [`MONEY_SCALE`] digits, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// One percentage/application-rule pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSlot {
    /// Tax percentage (16 means 16%)
    pub percentage: Decimal,
    /// How many preceding slot amounts are added to the base before applying
    pub rule: u32,
}

impl TaxSlot {
    pub fn new(percentage: Decimal, rule: u32) -> Self {
        Self { percentage, rule }
    }

    pub fn is_zero(&self) -> bool {
        self.percentage.is_zero()
    }
}

/// Ordered set of exactly four tax slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxScheme {
    slots: [TaxSlot; SLOT_COUNT],
}

impl TaxScheme {
    pub fn new(slots: [TaxSlot; SLOT_COUNT]) -> Self {
        Self { slots }
    }

    /// Scheme that never produces tax. Used when a product has no scheme key
    /// or the key does not resolve to a row.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a scheme from raw stored columns. Negative rules are stored by some
    /// installations as "not set" and behave like rule 0.
    pub fn from_columns(percentages: [Decimal; SLOT_COUNT], rules: [i64; SLOT_COUNT]) -> Self {
        let mut slots = [TaxSlot::default(); SLOT_COUNT];
        for (slot, (percentage, rule)) in slots.iter_mut().zip(percentages.into_iter().zip(rules)) {
            *slot = TaxSlot::new(percentage, u32::try_from(rule.max(0)).unwrap_or(u32::MAX));
        }
        Self { slots }
    }

    pub fn slots(&self) -> &[TaxSlot; SLOT_COUNT] {
        &self.slots
    }

    pub fn is_zero(&self) -> bool {
        self.slots.iter().all(TaxSlot::is_zero)
    }

    /// Total tax for `base_price` under this scheme
    pub fn compute_tax(&self, base_price: Decimal) -> Result<Decimal, TaxError> {
        compute_tax(base_price, self)
    }

    /// Base price plus its total tax
    pub fn price_with_tax(&self, base_price: Decimal) -> Result<Decimal, TaxError> {
        base_price
            .checked_add(self.compute_tax(base_price)?)
            .ok_or(TaxError::Overflow { base_price })
    }
}

/// Per-slot tax amounts and their rounded sum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub slot_amounts: [Decimal; SLOT_COUNT],
    pub total: Decimal,
}

/// Compute every slot amount for `base_price`.
///
/// A rule larger than the number of slots already processed saturates: only
/// the existing preceding amounts are added to the base. Fails instead of
/// panicking when an intermediate value leaves the `Decimal` range.
pub fn compute_breakdown(base_price: Decimal, scheme: &TaxScheme) -> Result<TaxBreakdown, TaxError> {
    let overflow = || TaxError::Overflow { base_price };
    let base = round_money(base_price);
    let mut slot_amounts = [Decimal::ZERO; SLOT_COUNT];
    let mut total = Decimal::ZERO;

    for (index, slot) in scheme.slots.iter().enumerate() {
        if slot.is_zero() {
            continue;
        }

        let preceding = (slot.rule as usize).min(index);
        let application_base = slot_amounts[..preceding]
            .iter()
            .try_fold(base, |sum, amount| sum.checked_add(*amount))
            .ok_or_else(overflow)?;

        let amount = application_base
            .checked_mul(slot.percentage)
            .and_then(|taxed| taxed.checked_div(ONE_HUNDRED))
            .map(round_money)
            .ok_or_else(overflow)?;
        slot_amounts[index] = amount;
        total = total.checked_add(amount).ok_or_else(overflow)?;
    }

    Ok(TaxBreakdown {
        slot_amounts,
        total: round_money(total),
    })
}

/// Total tax for `base_price` under `scheme`, rounded to four digits.
pub fn compute_tax(base_price: Decimal, scheme: &TaxScheme) -> Result<Decimal, TaxError> {
    Ok(compute_breakdown(base_price, scheme)?.total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scheme(slots: [(Decimal, u32); SLOT_COUNT]) -> TaxScheme {
        TaxScheme::new(slots.map(|(percentage, rule)| TaxSlot::new(percentage, rule)))
    }

    #[test]
    fn test_federal_then_compounded_state_tax() {
        let scheme = scheme([
            (dec!(16), 0),
            (dec!(8), 1),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);

        let breakdown = compute_breakdown(dec!(100.0000), &scheme).unwrap();
        assert_eq!(breakdown.slot_amounts[0], dec!(16.0000));
        assert_eq!(breakdown.slot_amounts[1], dec!(9.2800));
        assert_eq!(breakdown.total, dec!(25.2800));
        assert_eq!(compute_tax(dec!(100), &scheme).unwrap(), dec!(25.28));
    }

    #[test]
    fn test_zero_scheme_never_taxes() {
        let zero = TaxScheme::zero();
        assert!(zero.is_zero());
        for base in [dec!(0), dec!(0.0001), dec!(99.99), dec!(123456.7891)] {
            assert_eq!(compute_tax(base, &zero).unwrap(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_independent_slots_apply_to_base() {
        let scheme = scheme([
            (dec!(16), 0),
            (dec!(8), 0),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);
        assert_eq!(compute_tax(dec!(100), &scheme).unwrap(), dec!(24.0000));
    }

    #[test]
    fn test_rule_saturates_to_processed_slots() {
        let clamped = scheme([
            (dec!(10), 0),
            (dec!(5), 9),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);
        let exact = scheme([
            (dec!(10), 0),
            (dec!(5), 1),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);
        assert_eq!(compute_tax(dec!(200), &clamped).unwrap(), compute_tax(dec!(200), &exact).unwrap());
        // 20 + (200 + 20) * 5% = 31
        assert_eq!(compute_tax(dec!(200), &clamped).unwrap(), dec!(31.0000));
    }

    #[test]
    fn test_first_slot_rule_has_nothing_to_add() {
        let scheme = scheme([
            (dec!(10), 3),
            (dec!(0), 0),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);
        assert_eq!(compute_tax(dec!(50), &scheme).unwrap(), dec!(5.0000));
    }

    #[test]
    fn test_zero_slot_keeps_its_position() {
        // Slot 2 adds slots 0 and 1; slot 1 is zero and contributes nothing.
        let scheme = scheme([
            (dec!(10), 0),
            (dec!(0), 0),
            (dec!(50), 2),
            (dec!(0), 0),
        ]);
        let breakdown = compute_breakdown(dec!(100), &scheme).unwrap();
        assert_eq!(breakdown.slot_amounts, [dec!(10), dec!(0), dec!(55), dec!(0)]);
        assert_eq!(breakdown.total, dec!(65.0000));
    }

    #[test]
    fn test_last_slot_compounds_all_previous() {
        let scheme = scheme([
            (dec!(10), 0),
            (dec!(10), 1),
            (dec!(10), 2),
            (dec!(10), 3),
        ]);
        // 10, 11, 12.1, 13.31
        let breakdown = compute_breakdown(dec!(100), &scheme).unwrap();
        assert_eq!(
            breakdown.slot_amounts,
            [dec!(10), dec!(11), dec!(12.1), dec!(13.31)]
        );
        assert_eq!(breakdown.total, dec!(46.4100));
    }

    #[test]
    fn test_rounding_is_half_up_at_each_step() {
        assert_eq!(round_money(dec!(10.00005)), dec!(10.0001));
        assert_eq!(round_money(dec!(10.00004)), dec!(10.0000));

        let scheme = scheme([
            (dec!(1), 0),
            (dec!(0), 0),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);
        // base rounds to 0.0050, 1% of it is 0.00005 -> 0.0001
        assert_eq!(compute_tax(dec!(0.00495), &scheme).unwrap(), dec!(0.0001));
    }

    #[test]
    fn test_computation_is_deterministic() {
        let scheme = scheme([
            (dec!(16), 0),
            (dec!(3.5), 1),
            (dec!(26.5), 2),
            (dec!(0.75), 9),
        ]);
        let first = compute_tax(dec!(37.3333), &scheme).unwrap();
        for _ in 0..10 {
            assert_eq!(compute_tax(dec!(37.3333), &scheme).unwrap(), first);
        }
    }

    #[test]
    fn test_from_columns_treats_negative_rules_as_base() {
        let scheme = TaxScheme::from_columns(
            [dec!(16), dec!(8), dec!(0), dec!(0)],
            [0, -1, 0, 0],
        );
        assert_eq!(scheme.slots()[1].rule, 0);
        assert_eq!(scheme.compute_tax(dec!(100)).unwrap(), dec!(24.0000));
    }

    #[test]
    fn test_price_with_tax() {
        let scheme = scheme([
            (dec!(16), 0),
            (dec!(0), 0),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);
        assert_eq!(scheme.price_with_tax(dec!(50)).unwrap(), dec!(58.0000));
    }

    #[test]
    fn test_out_of_range_price_is_an_error() {
        let scheme = scheme([
            (dec!(16), 0),
            (dec!(0), 0),
            (dec!(0), 0),
            (dec!(0), 0),
        ]);
        let huge = Decimal::from_scientific("1e28").unwrap();
        assert_eq!(
            compute_tax(huge, &scheme),
            Err(TaxError::Overflow { base_price: huge })
        );
        assert!(scheme.price_with_tax(huge).is_err());
        // The zero scheme never multiplies, so any price passes through
        assert_eq!(TaxScheme::zero().price_with_tax(huge).unwrap(), huge);
    }
}
