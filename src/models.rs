//! Data models for SDE items, blueprints and material requirements

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// SDE type identifier (`invTypes.typeID`)
pub type TypeId = i64;

/// Material type id -> required quantity
pub type RequirementMap = BTreeMap<TypeId, i64>;

/// Material type id -> units still to acquire (always > 0)
pub type ShortageMap = BTreeMap<TypeId, i64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub type_id: TypeId,
    pub name: String,
}

/// Industry activities as numbered in `industryActivity.activityID`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Activity {
    Manufacturing,
    ResearchingTimeEfficiency,
    ResearchingMaterialEfficiency,
    Copying,
    ReverseEngineering,
    Invention,
    Reactions,
}

impl Activity {
    /// Display order used when listing every activity of a blueprint
    pub const ALL: [Activity; 7] = [
        Activity::Manufacturing,
        Activity::ResearchingMaterialEfficiency,
        Activity::ResearchingTimeEfficiency,
        Activity::Copying,
        Activity::Invention,
        Activity::ReverseEngineering,
        Activity::Reactions,
    ];

    pub fn id(self) -> i64 {
        match self {
            Activity::Manufacturing => 1,
            Activity::ResearchingTimeEfficiency => 3,
            Activity::ResearchingMaterialEfficiency => 4,
            Activity::Copying => 5,
            Activity::ReverseEngineering => 7,
            Activity::Invention => 8,
            Activity::Reactions => 11,
        }
    }

    /// Every activityID the activity may be stored under. Older dumps
    /// numbered reactions 9.
    pub fn ids(self) -> &'static [i64] {
        match self {
            Activity::Reactions => &[11, 9],
            Activity::Manufacturing => &[1],
            Activity::ResearchingTimeEfficiency => &[3],
            Activity::ResearchingMaterialEfficiency => &[4],
            Activity::Copying => &[5],
            Activity::ReverseEngineering => &[7],
            Activity::Invention => &[8],
        }
    }

    /// Activities that cannot run without consuming materials
    pub fn consumes_materials(self) -> bool {
        matches!(
            self,
            Activity::Manufacturing | Activity::Invention | Activity::Reactions
        )
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activity::Manufacturing => "Manufacturing",
            Activity::ResearchingTimeEfficiency => "Researching TE",
            Activity::ResearchingMaterialEfficiency => "Researching ME",
            Activity::Copying => "Copying",
            Activity::ReverseEngineering => "Reverse Engineering",
            Activity::Invention => "Invention",
            Activity::Reactions => "Reactions",
        };
        f.write_str(name)
    }
}

/// A blueprint together with the item its manufacturing activity produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlueprintMatch {
    pub blueprint_type_id: TypeId,
    pub blueprint_name: String,
    pub product_type_id: TypeId,
    pub product_name: String,
}

/// One material line of a blueprint activity, quantity per single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialLine {
    pub type_id: TypeId,
    pub name: String,
    pub quantity: i64,
}

/// Material lines and base duration of a single blueprint activity
#[derive(Debug, Clone, Serialize)]
pub struct ActivityMaterials {
    pub blueprint_type_id: TypeId,
    pub activity: Activity,
    pub base_time_s: Option<i64>,
    pub materials: Vec<MaterialLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityProduct {
    pub type_id: TypeId,
    pub name: String,
    pub quantity: i64,
}
