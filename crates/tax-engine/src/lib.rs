//! Tax Engine
//!
//! Compounding, rule-indexed tax computation over four tax slots.
//! Every amount is an exact decimal rounded half-up to four fractional digits.

pub mod tax_calculator;

pub use tax_calculator::{
    compute_breakdown, compute_tax, round_money, TaxBreakdown, TaxError, TaxScheme, TaxSlot, MONEY_SCALE,
    SLOT_COUNT,
};
