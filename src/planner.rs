//! Manufacturing planner
//!
//! Ties catalog lookups, material tables, efficiency adjustment and
//! shortage calculation together behind the operations the CLI exposes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{Catalog, Lookup};
use crate::db::Sde;
use crate::efficiency::{Efficiency, validate_runs, validate_structure_bonus};
use crate::error::Result;
use crate::inventory::InventorySnapshot;
use crate::materials::{BlueprintDetail, activity_materials, blueprint_detail};
use crate::models::{Activity, BlueprintMatch, MaterialLine, RequirementMap};
use crate::requirements::{ManufacturingRequest, MaterialRequirement, RequirementBuilder};
use crate::shortage::{ShoppingList, compare_efficiency};

/// Settings shared by every calculation in a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlannerConfig {
    /// Structure material reduction in percent (e.g. 1 for a Raitaru,
    /// 4.2 with a T2 rig). Zero when building outside a structure.
    pub structure_bonus: Decimal,
}

impl PlannerConfig {
    pub fn new(structure_bonus: Decimal) -> Result<Self> {
        validate_structure_bonus(structure_bonus)?;
        Ok(Self { structure_bonus })
    }
}

/// Adjusted manufacturing materials for one blueprint
#[derive(Debug, Clone, Serialize)]
pub struct MaterialPlan {
    pub blueprint: BlueprintMatch,
    pub material_efficiency: u8,
    pub runs: u32,
    pub structure_bonus: Decimal,
    pub base_time_s: Option<i64>,
    pub lines: Vec<MaterialRequirement>,
    pub requirements: RequirementMap,
}

/// Requirements for one blueprint at ME 0 through 10
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyComparison {
    pub blueprint: BlueprintMatch,
    pub runs: u32,
    pub structure_bonus: Decimal,
    pub materials: Vec<MaterialLine>,
    pub levels: BTreeMap<u8, RequirementMap>,
}

pub struct Planner<'a> {
    sde: &'a Sde,
    catalog: Catalog<'a>,
    config: PlannerConfig,
}

impl<'a> Planner<'a> {
    pub fn new(sde: &'a Sde, config: PlannerConfig) -> Self {
        Self {
            sde,
            catalog: Catalog::new(sde),
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Resolve a product or blueprint name (or type id) to a blueprint
    pub fn resolve(&self, query: &str) -> Result<Lookup<BlueprintMatch>> {
        self.catalog.resolve_blueprint(query)
    }

    /// Manufacturing materials for a resolved blueprint
    pub fn plan(&self, blueprint: &BlueprintMatch, me: i64, runs: i64) -> Result<MaterialPlan> {
        self.plan_request(
            blueprint,
            &ManufacturingRequest {
                blueprint_type_id: blueprint.blueprint_type_id,
                material_efficiency: me,
                runs,
                structure_bonus: self.config.structure_bonus,
            },
        )
    }

    fn plan_request(
        &self,
        blueprint: &BlueprintMatch,
        request: &ManufacturingRequest,
    ) -> Result<MaterialPlan> {
        let (efficiency, runs) = request.resolve()?;
        let table = activity_materials(self.sde, request.blueprint_type_id, Activity::Manufacturing)?;

        let mut builder = RequirementBuilder::new();
        let lines = builder.add_lines(&table.materials, &efficiency, runs)?;
        info!(
            blueprint = %blueprint.blueprint_name,
            me = efficiency.me(),
            runs,
            "calculated materials"
        );

        Ok(MaterialPlan {
            blueprint: blueprint.clone(),
            material_efficiency: efficiency.me(),
            runs,
            structure_bonus: efficiency.structure_bonus(),
            base_time_s: table.base_time_s,
            lines,
            requirements: builder.finish(),
        })
    }

    /// Requirement mapping for a product name or id
    ///
    /// Input is validated before the dataset is consulted. An ambiguous name
    /// comes back as the candidate blueprints.
    pub fn resolve_materials(
        &self,
        query: &str,
        me: i64,
        runs: i64,
    ) -> Result<Lookup<MaterialPlan, BlueprintMatch>> {
        Efficiency::new(me, self.config.structure_bonus)?;
        validate_runs(runs)?;
        self.resolve(query)?
            .try_map(|blueprint| self.plan(&blueprint, me, runs))
    }

    /// ME 0-10 comparison for a resolved blueprint
    pub fn compare(&self, blueprint: &BlueprintMatch, runs: i64) -> Result<EfficiencyComparison> {
        let runs = validate_runs(runs)?;
        let table = activity_materials(self.sde, blueprint.blueprint_type_id, Activity::Manufacturing)?;
        let levels = compare_efficiency(&table.materials, runs, self.config.structure_bonus)?;
        debug!(blueprint = blueprint.blueprint_type_id, runs, "compared ME levels");

        Ok(EfficiencyComparison {
            blueprint: blueprint.clone(),
            runs,
            structure_bonus: self.config.structure_bonus,
            materials: table.materials,
            levels,
        })
    }

    /// ME 0-10 comparison for a product name or id
    pub fn compare_efficiency(
        &self,
        query: &str,
        runs: i64,
    ) -> Result<Lookup<EfficiencyComparison, BlueprintMatch>> {
        validate_runs(runs)?;
        self.resolve(query)?
            .try_map(|blueprint| self.compare(&blueprint, runs))
    }

    /// Combined requirements of several manufacturing requests
    pub fn requirements(&self, requests: &[ManufacturingRequest]) -> Result<RequirementMap> {
        let mut builder = RequirementBuilder::new();
        for request in requests {
            let (efficiency, runs) = request.resolve()?;
            let table =
                activity_materials(self.sde, request.blueprint_type_id, Activity::Manufacturing)?;
            builder.add_lines(&table.materials, &efficiency, runs)?;
        }
        Ok(builder.finish())
    }

    /// All activities, durations and invention outcomes of a blueprint
    pub fn detail(&self, blueprint: &BlueprintMatch) -> Result<BlueprintDetail> {
        blueprint_detail(self.sde, blueprint)
    }

    /// Requirements set against on-hand stock, with display names
    pub fn shopping_list(
        &self,
        requirements: &RequirementMap,
        on_hand: &InventorySnapshot,
    ) -> Result<ShoppingList> {
        let ids: Vec<_> = requirements.keys().copied().collect();
        let names = self.sde.type_names(&ids)?;
        Ok(ShoppingList::build(requirements, on_hand, &|id| {
            names.get(&id).cloned()
        }))
    }
}
