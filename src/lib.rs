//! EVE Online manufacturing calculator
//!
//! Resolves products to blueprints in the static data export, applies
//! material efficiency and structure bonuses to their material lines, and
//! compares the result against what is already on hand.

pub mod catalog;
pub mod db;
pub mod efficiency;
pub mod error;
pub mod inventory;
pub mod materials;
pub mod models;
pub mod planner;
pub mod report;
pub mod requirements;
pub mod shortage;

pub use catalog::{Catalog, Lookup};
pub use db::Sde;
pub use efficiency::Efficiency;
pub use error::{ErrorKind, IndustryError, Result};
pub use inventory::InventorySnapshot;
pub use models::{Activity, BlueprintMatch, Item, MaterialLine, RequirementMap, ShortageMap, TypeId};
pub use planner::{EfficiencyComparison, MaterialPlan, Planner, PlannerConfig};
pub use requirements::ManufacturingRequest;
pub use shortage::{ShoppingList, compare_efficiency, compute_shortage};
