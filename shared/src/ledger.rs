//! Running-balance arithmetic shared by the kardex, summary and writer paths
//!
//! Invariant: for consecutive movements of one item in one company,
//! `current = previous + signed(quantity)` and `previous(n) = current(n - 1)`.
//! Rows may carry cached balances (`saldoant` / `sldantemp`); cached values win.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{MovementTotal, MovementType};

/// A quantity, value or balance left the representable decimal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Amount out of range")]
pub struct AmountOverflow;

fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, AmountOverflow> {
    a.checked_add(b).ok_or(AmountOverflow)
}

/// The balance-relevant columns of one movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub movement_type: MovementType,
    pub quantity: Decimal,
    /// Cached `saldoant`
    pub previous_balance: Option<Decimal>,
    /// Cached `sldantemp`
    pub resulting_balance: Option<Decimal>,
}

impl BalanceSnapshot {
    pub fn signed_quantity(&self) -> Decimal {
        self.movement_type.signed(self.quantity)
    }
}

/// Balance left behind by a movement: the cached resulting balance, or the
/// row's own prior balance (zero if absent) plus its signed quantity.
pub fn balance_after(snapshot: &BalanceSnapshot) -> Result<Decimal, AmountOverflow> {
    match snapshot.resulting_balance {
        Some(balance) => Ok(balance),
        None => checked_sum(
            snapshot.previous_balance.unwrap_or(Decimal::ZERO),
            snapshot.signed_quantity(),
        ),
    }
}

/// Opening balance given the latest movement strictly before the anchor date
pub fn opening_balance(latest_prior: Option<&BalanceSnapshot>) -> Result<Decimal, AmountOverflow> {
    latest_prior.map_or(Ok(Decimal::ZERO), balance_after)
}

/// Balances around a single kardex line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceStep {
    pub previous: Decimal,
    pub current: Decimal,
}

/// Forward pass over chronologically ordered movements
#[derive(Debug, Clone, Copy)]
pub struct RunningBalance {
    carried: Decimal,
}

impl RunningBalance {
    pub fn new(opening: Decimal) -> Self {
        Self { carried: opening }
    }

    pub fn current(&self) -> Decimal {
        self.carried
    }

    pub fn apply(&mut self, snapshot: &BalanceSnapshot) -> Result<BalanceStep, AmountOverflow> {
        let previous = snapshot.previous_balance.unwrap_or(self.carried);
        let current = match snapshot.resulting_balance {
            Some(balance) => balance,
            None => checked_sum(previous, snapshot.signed_quantity())?,
        };
        self.carried = current;
        Ok(BalanceStep { previous, current })
    }
}

/// Entry/exit accumulator for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementTotals {
    pub entries: MovementTotal,
    pub exits: MovementTotal,
}

impl MovementTotals {
    pub fn record(
        &mut self,
        movement_type: MovementType,
        quantity: Decimal,
        value: Decimal,
    ) -> Result<(), AmountOverflow> {
        let bucket = match movement_type {
            MovementType::Entry => &mut self.entries,
            MovementType::Exit => &mut self.exits,
        };
        let quantity = checked_sum(bucket.quantity, quantity)?;
        let value = checked_sum(bucket.value, value)?;
        bucket.quantity = quantity;
        bucket.value = value;
        Ok(())
    }

    pub fn net_quantity(&self) -> Result<Decimal, AmountOverflow> {
        self.entries
            .quantity
            .checked_sub(self.exits.quantity)
            .ok_or(AmountOverflow)
    }
}

/// Total value of a movement when none was stored
pub fn computed_total(
    quantity: Decimal,
    unit_price: Option<Decimal>,
) -> Result<Option<Decimal>, AmountOverflow> {
    unit_price
        .map(|price| quantity.checked_mul(price).ok_or(AmountOverflow))
        .transpose()
}
