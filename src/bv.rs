//! BV Allocation
//!
//! Splits a transaction's total business value (BV) across the two compensation plans.
//! The split is driven by an ordered rule table: rules are tried top to bottom and the
//! first whose predicate matches decides the split. The conditions overlap, so the order
//! of [`RULES`] is part of the contract.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Most BV Plan B can receive from one transaction.
pub const PLAN_B_CAP: Decimal = Decimal::from_parts(200, 0, 0, false, 0);

/// Total at which BV is split evenly between both plans.
pub const EVEN_SPLIT_TOTAL: Decimal = Decimal::from_parts(400, 0, 0, false, 0);

/// Errors raised by the allocator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BvError {
    /// Total BV was negative.
    #[error("total BV must not be negative, got {0}")]
    InvalidArgument(Decimal),
}

/// Rule that produced a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BvRule {
    /// Exactly 400 BV: 200 to each plan.
    EvenSplit,

    /// Over 400 BV: Plan B capped at 200, surplus to Plan A.
    SurplusToPlanA,

    /// Under 200 BV: everything to Plan A.
    BelowPlanBThreshold,

    /// Anything else: Plan B takes up to 200, remainder to Plan A.
    CappedPlanB,
}

impl fmt::Display for BvRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BvRule::EvenSplit => "even split",
            BvRule::SurplusToPlanA => "surplus to plan A",
            BvRule::BelowPlanBThreshold => "below plan B threshold",
            BvRule::CappedPlanB => "capped plan B",
        };

        f.write_str(name)
    }
}

/// Result of allocating a transaction's BV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BvSplit {
    /// BV being allocated
    pub total_bv: Decimal,

    /// Portion credited to Plan A
    pub bv_plan_a: Decimal,

    /// Portion credited to Plan B
    pub bv_plan_b: Decimal,

    /// Rule that decided the split
    #[serde(skip)]
    pub rule: BvRule,
}

/// One row of the allocation table.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRule {
    /// Which rule this row is
    pub rule: BvRule,

    /// Whether the row applies to a total
    pub applies: fn(Decimal) -> bool,

    /// Plan B share for a total the row applies to; Plan A takes the rest
    pub plan_b: fn(Decimal) -> Decimal,
}

/// Allocation rows, evaluated in order before [`FALLBACK`].
pub const RULES: [AllocationRule; 3] = [
    AllocationRule {
        rule: BvRule::EvenSplit,
        applies: is_even_split,
        plan_b: capped_plan_b,
    },
    AllocationRule {
        rule: BvRule::SurplusToPlanA,
        applies: is_above_even_split,
        plan_b: capped_plan_b,
    },
    AllocationRule {
        rule: BvRule::BelowPlanBThreshold,
        applies: is_below_plan_b_cap,
        plan_b: no_plan_b,
    },
];

/// Row used when nothing in [`RULES`] matches.
pub const FALLBACK: AllocationRule = AllocationRule {
    rule: BvRule::CappedPlanB,
    applies: always,
    plan_b: capped_plan_b,
};

fn is_even_split(total: Decimal) -> bool {
    total == EVEN_SPLIT_TOTAL
}

fn is_above_even_split(total: Decimal) -> bool {
    total > EVEN_SPLIT_TOTAL
}

fn is_below_plan_b_cap(total: Decimal) -> bool {
    total < PLAN_B_CAP
}

fn always(_total: Decimal) -> bool {
    true
}

fn capped_plan_b(total: Decimal) -> Decimal {
    total.min(PLAN_B_CAP)
}

fn no_plan_b(_total: Decimal) -> Decimal {
    Decimal::ZERO
}

/// Find the first row that applies to a total.
pub fn rule_for(total_bv: Decimal) -> &'static AllocationRule {
    RULES
        .iter()
        .find(|row| (row.applies)(total_bv))
        .unwrap_or(&FALLBACK)
}

/// Split a total BV between Plan A and Plan B.
///
/// Fractional totals are split without rounding.
///
/// # Errors
///
/// Returns [`BvError::InvalidArgument`] if `total_bv` is negative.
pub fn allocate(total_bv: Decimal) -> Result<BvSplit, BvError> {
    if total_bv.is_sign_negative() && !total_bv.is_zero() {
        return Err(BvError::InvalidArgument(total_bv));
    }

    let row = rule_for(total_bv);
    let bv_plan_b = (row.plan_b)(total_bv);

    Ok(BvSplit {
        total_bv,
        bv_plan_a: total_bv - bv_plan_b,
        bv_plan_b,
        rule: row.rule,
    })
}
