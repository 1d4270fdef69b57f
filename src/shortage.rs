//! Shortage calculation and ME comparison

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::efficiency::{Efficiency, MAX_MATERIAL_EFFICIENCY};
use crate::error::Result;
use crate::inventory::InventorySnapshot;
use crate::models::{MaterialLine, RequirementMap, ShortageMap, TypeId};
use crate::requirements::aggregate;

/// Units still missing for every required material. Fully covered
/// materials are left out.
pub fn compute_shortage(required: &RequirementMap, on_hand: &InventorySnapshot) -> ShortageMap {
    required
        .iter()
        .filter_map(|(&type_id, &needed)| {
            let deficit = needed.saturating_sub(on_hand.quantity(type_id)).max(0);
            (deficit > 0).then_some((type_id, deficit))
        })
        .collect()
}

/// Requirement mapping at every ME level from 0 to 10
pub fn compare_efficiency(
    lines: &[MaterialLine],
    runs: u32,
    structure_bonus: Decimal,
) -> Result<BTreeMap<u8, RequirementMap>> {
    (0..=MAX_MATERIAL_EFFICIENCY)
        .map(|me| {
            let efficiency = Efficiency::new(i64::from(me), structure_bonus)?;
            Ok((me, aggregate(lines, &efficiency, runs)?))
        })
        .collect()
}

/// One row of a shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingLine {
    pub type_id: TypeId,
    pub name: String,
    pub needed: i64,
    pub have: i64,
    pub buy: i64,
}

impl ShoppingLine {
    pub fn is_covered(&self) -> bool {
        self.buy == 0
    }
}

/// Requirements set against on-hand stock, in material order
#[derive(Debug, Clone, Serialize)]
pub struct ShoppingList {
    pub lines: Vec<ShoppingLine>,
    pub shortage: ShortageMap,
}

impl ShoppingList {
    /// `names` supplies display names; missing entries fall back to the type id
    pub fn build(
        required: &RequirementMap,
        on_hand: &InventorySnapshot,
        names: &impl Fn(TypeId) -> Option<String>,
    ) -> Self {
        let shortage = compute_shortage(required, on_hand);
        let lines = required
            .iter()
            .map(|(&type_id, &needed)| ShoppingLine {
                type_id,
                name: names(type_id).unwrap_or_else(|| format!("Type {type_id}")),
                needed,
                have: on_hand.quantity(type_id),
                buy: shortage.get(&type_id).copied().unwrap_or(0),
            })
            .collect();
        Self { lines, shortage }
    }

    pub fn missing_count(&self) -> usize {
        self.shortage.len()
    }

    pub fn ready_to_build(&self) -> bool {
        self.shortage.is_empty()
    }
}
