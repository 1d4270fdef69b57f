//! Requirement aggregation
//!
//! Turns blueprint material lines into total quantities for a request and
//! sums them per material across any number of blueprints.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::efficiency::{Efficiency, validate_runs};
use crate::error::{IndustryError, Result};
use crate::models::{MaterialLine, RequirementMap, TypeId};

/// What to build: a blueprint, its ME level, how many runs, and the
/// facility's structure bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManufacturingRequest {
    pub blueprint_type_id: TypeId,
    pub material_efficiency: i64,
    pub runs: i64,
    pub structure_bonus: Decimal,
}

impl ManufacturingRequest {
    /// Validated efficiency settings and run count
    pub fn resolve(&self) -> Result<(Efficiency, u32)> {
        let efficiency = Efficiency::new(self.material_efficiency, self.structure_bonus)?;
        let runs = validate_runs(self.runs)?;
        Ok((efficiency, runs))
    }
}

/// A material line after ME and structure adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialRequirement {
    pub type_id: TypeId,
    pub name: String,
    /// Per run, straight from the blueprint
    pub base_quantity: i64,
    /// `base_quantity * runs` with no reductions
    pub base_total: i64,
    pub adjusted_quantity: i64,
    /// Units saved by efficiency bonuses
    pub saved: i64,
}

/// Adjust every line of a blueprint activity for the given efficiency and runs
pub fn adjust_lines(
    lines: &[MaterialLine],
    efficiency: &Efficiency,
    runs: u32,
) -> Result<Vec<MaterialRequirement>> {
    lines
        .iter()
        .map(|line| {
            let adjusted_quantity = efficiency.apply(line.quantity, runs)?;
            let base_total = line.quantity.checked_mul(i64::from(runs)).ok_or(
                IndustryError::QuantityOverflow {
                    base_quantity: line.quantity,
                    runs,
                },
            )?;
            Ok(MaterialRequirement {
                type_id: line.type_id,
                name: line.name.clone(),
                base_quantity: line.quantity,
                base_total,
                adjusted_quantity,
                saved: base_total - adjusted_quantity,
            })
        })
        .collect()
}

/// Sums adjusted quantities per material
#[derive(Debug, Default, Clone)]
pub struct RequirementBuilder {
    totals: RequirementMap,
}

impl RequirementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add already adjusted rows. Rows with nothing to consume are skipped.
    pub fn add_rows(&mut self, rows: &[MaterialRequirement]) -> Result<()> {
        for row in rows {
            if row.adjusted_quantity == 0 {
                continue;
            }
            let total = self.totals.entry(row.type_id).or_insert(0);
            *total = total
                .checked_add(row.adjusted_quantity)
                .ok_or(IndustryError::TotalOverflow(row.type_id))?;
        }
        Ok(())
    }

    /// Adjust and add the lines of one blueprint activity
    pub fn add_lines(
        &mut self,
        lines: &[MaterialLine],
        efficiency: &Efficiency,
        runs: u32,
    ) -> Result<Vec<MaterialRequirement>> {
        let rows = adjust_lines(lines, efficiency, runs)?;
        self.add_rows(&rows)?;
        Ok(rows)
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn finish(self) -> RequirementMap {
        debug!(materials = self.totals.len(), "aggregated requirements");
        self.totals
    }
}

/// Requirement mapping for a single set of material lines
pub fn aggregate(lines: &[MaterialLine], efficiency: &Efficiency, runs: u32) -> Result<RequirementMap> {
    let mut builder = RequirementBuilder::new();
    builder.add_lines(lines, efficiency, runs)?;
    Ok(builder.finish())
}
