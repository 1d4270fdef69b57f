//! Material efficiency adjustment
//!
//! Applies blueprint ME and the facility's structure bonus to a per-run
//! material quantity:
//!
//! ```text
//! adjusted = max(runs, ceil(round(runs * base * (1 - ME/100) * (1 - bonus/100), 2)))
//! ```
//!
//! ME and the structure bonus stack multiplicatively. The product is rounded
//! to two decimals before the ceiling, and every material is consumed at
//! least once per run.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::error::{IndustryError, Result};

pub const MAX_MATERIAL_EFFICIENCY: u8 = 10;

/// Validated ME level and structure bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Efficiency {
    me: u8,
    structure_bonus: Decimal,
}

impl Efficiency {
    pub fn new(me: i64, structure_bonus: Decimal) -> Result<Self> {
        if !(0..=i64::from(MAX_MATERIAL_EFFICIENCY)).contains(&me) {
            return Err(IndustryError::InvalidMaterialEfficiency(me));
        }
        validate_structure_bonus(structure_bonus)?;
        Ok(Self {
            me: me as u8,
            structure_bonus,
        })
    }

    pub fn me(&self) -> u8 {
        self.me
    }

    pub fn structure_bonus(&self) -> Decimal {
        self.structure_bonus
    }

    /// Remaining fraction of the base quantity after both reductions
    fn multiplier(&self) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;
        (hundred - Decimal::from(self.me)) / hundred * ((hundred - self.structure_bonus) / hundred)
    }

    /// Total quantity of one material line for `runs` runs
    pub fn apply(&self, base_quantity: i64, runs: u32) -> Result<i64> {
        validate_runs(i64::from(runs))?;
        if base_quantity <= 0 {
            return Ok(0);
        }

        let overflow = || IndustryError::QuantityOverflow {
            base_quantity,
            runs,
        };

        let raw = Decimal::from(runs)
            .checked_mul(Decimal::from(base_quantity))
            .and_then(|total| total.checked_mul(self.multiplier()))
            .ok_or_else(overflow)?;

        let adjusted = raw.round_dp(2).ceil().to_i64().ok_or_else(overflow)?;
        Ok(adjusted.max(i64::from(runs)))
    }
}

pub fn validate_structure_bonus(bonus: Decimal) -> Result<()> {
    if bonus < Decimal::ZERO || bonus >= Decimal::ONE_HUNDRED {
        return Err(IndustryError::InvalidStructureBonus(bonus.to_string()));
    }
    Ok(())
}

pub fn validate_runs(runs: i64) -> Result<u32> {
    if runs < 1 {
        return Err(IndustryError::InvalidRuns(runs));
    }
    u32::try_from(runs).map_err(|_| IndustryError::InvalidRuns(runs))
}
