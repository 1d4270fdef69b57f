//! On-hand inventory snapshots
//!
//! A snapshot is read once per invocation and never modified afterwards.
//! It can be built from an ESI asset dump, a plain `{type_id: quantity}`
//! JSON object, or an inventory window copied out of the game client.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::TypeId;

/// Immutable type id -> on-hand quantity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    totals: HashMap<TypeId, i64>,
}

/// One entry of an ESI `/characters/{id}/assets/` response
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRecord {
    pub type_id: TypeId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// `Name<TAB>Quantity<TAB>...` with an optional quantity column
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<name>[^\t]*[^\t\s])[ ]*(?:\t[ ]*(?P<qty>\d[\d,.' \x{a0}]*)?)?")
        .expect("inventory row pattern is valid")
});

/// A parsed snapshot plus the pasted names that matched no item
#[derive(Debug, Clone, Default)]
pub struct SnapshotLoad {
    pub snapshot: InventorySnapshot,
    pub unresolved: Vec<String>,
}

impl InventorySnapshot {
    /// Sum quantities per type; duplicate ids accumulate. Negative
    /// quantities count as nothing on hand.
    pub fn from_totals(totals: impl IntoIterator<Item = (TypeId, i64)>) -> Self {
        let mut snapshot = Self::default();
        for (type_id, quantity) in totals {
            snapshot.add(type_id, quantity);
        }
        snapshot
    }

    /// Index an asset list. Stacks of the same type in different locations
    /// are added together; non-positive quantities count as a single item.
    pub fn from_assets(assets: &[AssetRecord]) -> Self {
        Self::from_totals(assets.iter().map(|a| (a.type_id, a.quantity.max(1))))
    }

    /// Parse either JSON shape: an asset array or a `{type_id: quantity}` object
    pub fn from_json(text: &str) -> Result<Self> {
        let text = text.trim_start();
        let snapshot = if text.starts_with('[') {
            Self::from_assets(&serde_json::from_str::<Vec<AssetRecord>>(text)?)
        } else {
            Self::from_totals(serde_json::from_str::<BTreeMap<TypeId, i64>>(text)?)
        };
        debug!(types = snapshot.len(), "loaded JSON snapshot");
        Ok(snapshot)
    }

    /// Parse rows copied from an in-game inventory window
    ///
    /// Each row is `Name<TAB>Quantity<TAB>...`. An empty quantity column
    /// (assembled items) counts as one. Thousands separators are ignored.
    pub fn from_pasted(text: &str, catalog: &Catalog<'_>) -> Result<SnapshotLoad> {
        let mut load = SnapshotLoad::default();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let Some(cap) = ROW_RE.captures(line) else {
                warn!(line, "skipping unrecognised inventory row");
                continue;
            };
            let name = &cap["name"];
            let quantity = match cap.name("qty") {
                Some(m) => {
                    let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
                    match digits.parse::<i64>() {
                        Ok(q) => q,
                        Err(_) => {
                            warn!(line, "skipping inventory row with unreadable quantity");
                            continue;
                        }
                    }
                }
                None => 1,
            };

            match catalog.find_exact(name)? {
                Some(item) => load.snapshot.add(item.type_id, quantity),
                None => {
                    warn!(name, "no item with this name");
                    load.unresolved.push(name.to_string());
                }
            }
        }
        debug!(
            types = load.snapshot.len(),
            unresolved = load.unresolved.len(),
            "loaded pasted snapshot"
        );
        Ok(load)
    }

    /// JSON when the text looks like JSON, pasted rows otherwise
    pub fn parse(text: &str, catalog: &Catalog<'_>) -> Result<SnapshotLoad> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            Ok(SnapshotLoad {
                snapshot: Self::from_json(trimmed)?,
                unresolved: Vec::new(),
            })
        } else {
            Self::from_pasted(text, catalog)
        }
    }

    fn add(&mut self, type_id: TypeId, quantity: i64) {
        let total = self.totals.entry(type_id).or_insert(0);
        *total = total.saturating_add(quantity.max(0));
    }

    /// On-hand quantity, zero for types not in the snapshot
    pub fn quantity(&self, type_id: TypeId) -> i64 {
        self.totals.get(&type_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, i64)> + '_ {
        self.totals.iter().map(|(&id, &qty)| (id, qty))
    }
}
