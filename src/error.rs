//! Error types for catalog lookups and material calculations

use std::path::PathBuf;

use crate::models::{Activity, TypeId};

/// Broad classification of an [`IndustryError`], used by callers to decide
/// whether a failure is the user's input or the dataset's fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    DataIntegrity,
    Dataset,
}

#[derive(Debug, thiserror::Error)]
pub enum IndustryError {
    #[error("no items found matching '{0}'")]
    NotFound(String),

    #[error("'{name}' (type {type_id}) has no manufacturing blueprint")]
    NotProducible { type_id: TypeId, name: String },

    #[error("material efficiency must be between 0 and 10, got {0}")]
    InvalidMaterialEfficiency(i64),

    #[error("structure bonus must be at least 0 and below 100, got {0}")]
    InvalidStructureBonus(String),

    #[error("run count must be at least 1, got {0}")]
    InvalidRuns(i64),

    #[error("quantity overflow: {runs} runs of {base_quantity} units")]
    QuantityOverflow { base_quantity: i64, runs: u32 },

    #[error("total quantity of material {0} overflows")]
    TotalOverflow(TypeId),

    #[error("blueprint {blueprint_id} has no {activity} activity")]
    MissingActivity {
        blueprint_id: TypeId,
        activity: Activity,
    },

    #[error("blueprint {blueprint_id} has a {activity} activity with no material lines")]
    EmptyMaterials {
        blueprint_id: TypeId,
        activity: Activity,
    },

    #[error("blueprint {blueprint_id} lists material {material_id} with negative quantity {quantity}")]
    NegativeQuantity {
        blueprint_id: TypeId,
        material_id: TypeId,
        quantity: i64,
    },

    #[error("reference dataset is missing table '{0}'")]
    MissingTable(String),

    #[error("reference dataset contains no published types")]
    EmptyDataset,

    #[error(
        "SDE database not found at: {}\nDownload it from https://www.fuzzwork.co.uk/dump/sqlite-latest.sqlite.bz2",
        .0.display()
    )]
    DatasetNotFound(PathBuf),

    #[error("invalid inventory snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl IndustryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::NotProducible { .. } => ErrorKind::NotFound,
            Self::InvalidMaterialEfficiency(_)
            | Self::InvalidStructureBonus(_)
            | Self::InvalidRuns(_)
            | Self::QuantityOverflow { .. }
            | Self::TotalOverflow(_)
            | Self::InvalidSnapshot(_) => ErrorKind::Validation,
            Self::MissingActivity { .. }
            | Self::EmptyMaterials { .. }
            | Self::NegativeQuantity { .. }
            | Self::MissingTable(_)
            | Self::EmptyDataset => ErrorKind::DataIntegrity,
            Self::DatasetNotFound(_) | Self::Database(_) => ErrorKind::Dataset,
        }
    }
}

pub type Result<T> = std::result::Result<T, IndustryError>;
