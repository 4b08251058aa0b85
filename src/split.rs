//! The bill-splitting calculation.
//!
//! `split` turns a `BillRecord` into a `Receipt`: the ordered lines that end up in the image and a
//! structured summary of who owes what.

use crate::model::{BillRecord, Figure, Side};
use crate::Result;
use anyhow::{bail, Context};
use serde::Serialize;
use tracing::debug;

/// A line that takes up a row on the receipt but shows nothing.
pub const SPACER: &str = "";

const EQUAL_USAGE: &str = "Both used equal units, no one should pay anything.";

/// How the bill was settled.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Settlement {
    /// Both people used the same number of units.
    Equal,
    /// The excess usage was worth less than half a unit of money.
    Negligible { payer: Side, excess: Figure },
    /// `payer` owes `amount` for `excess` units at `per_unit_cost` each.
    Payment {
        payer: Side,
        excess: Figure,
        per_unit_cost: Figure,
        amount: Figure,
    },
}

impl Settlement {
    /// The person who used more than their share, if usage differed.
    pub fn payer(&self) -> Option<Side> {
        match self {
            Settlement::Equal => None,
            Settlement::Negligible { payer, .. } | Settlement::Payment { payer, .. } => {
                Some(*payer)
            }
        }
    }
}

/// The result of splitting a bill.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Receipt {
    lines: Vec<String>,
    first_used: Figure,
    second_used: Figure,
    settlement: Settlement,
}

impl Receipt {
    /// The human-readable lines, in order. Spacer rows are empty strings.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn first_used(&self) -> Figure {
        self.first_used
    }

    pub fn second_used(&self) -> Figure {
        self.second_used
    }

    pub fn settlement(&self) -> Settlement {
        self.settlement
    }
}

/// Splits the bill between the two people.
///
/// Each person's usage is `current - previous`. When usage is equal nobody pays and nothing else
/// is computed. Otherwise the money is divided by the combined usage to get a per-unit cost, each
/// person's fair share is half the combined usage, and the person over their share pays for the
/// excess.
///
/// Only the first person's usage is compared against the share. If it is not above the share,
/// the second person is taken to be the one over it.
///
/// # Errors
/// - The combined usage is zero while individual usage differs (only possible with negative
///   readings), so there is no per-unit cost.
/// - Any intermediate value overflows.
pub fn split(bill: &BillRecord) -> Result<Receipt> {
    let mut lines = Vec::new();

    let first_used = used(bill, Side::First, &mut lines)?;
    let second_used = used(bill, Side::Second, &mut lines)?;

    if first_used == second_used {
        debug!("Usage is equal at {first_used} units");
        lines.push(EQUAL_USAGE.to_string());
        return Ok(Receipt {
            lines,
            first_used,
            second_used,
            settlement: Settlement::Equal,
        });
    }

    lines.push(SPACER.to_string());

    let total_used = first_used
        .checked_add(second_used)
        .context("Total usage is too large")?;
    lines.push(format!(
        "Total unit used: {first_used}+{second_used} = {total_used} unit"
    ));

    if total_used.is_zero() {
        bail!(
            "Total usage is zero ({first_used} and {second_used} cancel out), \
            so there is no per unit cost"
        )
    }
    let total_money = bill.total_money();
    let per_unit_cost = total_money
        .checked_div(total_used)
        .context("Per unit cost is too large")?;
    lines.push(format!(
        "Per unit cost: {total_money}/{total_used} = {per_unit_cost} taka"
    ));

    let share = total_used.half();
    lines.push(format!("Per person will get: {total_used}/2 = {share} unit"));

    lines.push(SPACER.to_string());

    let (payer, payer_used) = if first_used > share {
        (Side::First, first_used)
    } else {
        (Side::Second, second_used)
    };
    let name = bill.person(payer).name();

    let excess = payer_used
        .checked_sub(share)
        .context("Excess usage is too large")?
        .abs();
    lines.push(format!(
        "{name} excess used: {payer_used}-{share} = {excess} unit"
    ));

    let amount = excess
        .checked_mul_whole(per_unit_cost)
        .context("Amount owed is too large")?;
    debug!("The {payer} person used {excess} units over their share of {share}, worth {amount}");

    let settlement = if amount.is_zero() {
        lines.push(format!(
            "{name} shouldn't pay anything as they used very little excess electricity."
        ));
        Settlement::Negligible { payer, excess }
    } else {
        lines.push(format!(
            "{name} should pay: {excess}*{per_unit_cost} = {amount} taka"
        ));
        Settlement::Payment {
            payer,
            excess,
            per_unit_cost,
            amount,
        }
    };

    Ok(Receipt {
        lines,
        first_used,
        second_used,
        settlement,
    })
}

/// Computes one person's usage and records the line showing the subtraction.
fn used(bill: &BillRecord, side: Side, lines: &mut Vec<String>) -> Result<Figure> {
    let person = bill.person(side);
    let current = person.current_unit();
    let previous = person.previous_unit();
    let used = current
        .checked_sub(previous)
        .with_context(|| format!("Usage for {} is too large", person.name()))?;
    lines.push(format!(
        "{} used: {current}-{previous} = {used} unit",
        person.name()
    ));
    Ok(used)
}
