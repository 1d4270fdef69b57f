//! Name and id resolution for items and blueprints

use serde::Serialize;
use tracing::debug;

use crate::db::{SEARCH_LIMIT, Sde};
use crate::error::{IndustryError, Result};
use crate::models::{BlueprintMatch, Item, TypeId};

/// Outcome of resolving user input: a single match, or candidates the
/// caller has to choose between
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Lookup<T, C = T> {
    Found(T),
    Ambiguous(Vec<C>),
}

impl<T, C> Lookup<T, C> {
    /// Transform the found value, passing candidates through untouched
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Lookup<U, C>> {
        match self {
            Lookup::Found(value) => Ok(Lookup::Found(f(value)?)),
            Lookup::Ambiguous(candidates) => Ok(Lookup::Ambiguous(candidates)),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Ambiguous(_) => None,
        }
    }
}

/// Read-only lookups against the SDE
pub struct Catalog<'a> {
    sde: &'a Sde,
}

impl<'a> Catalog<'a> {
    pub fn new(sde: &'a Sde) -> Self {
        Self { sde }
    }

    /// Published items whose name contains `term`, best matches first
    pub fn search_items(&self, term: &str) -> Result<Vec<Item>> {
        self.sde.search_types(term.trim(), SEARCH_LIMIT)
    }

    /// Published item named exactly `name`, ignoring case
    pub fn find_exact(&self, name: &str) -> Result<Option<Item>> {
        self.sde.find_type_by_name(name.trim())
    }

    /// Resolve free text (or a numeric type id) to a single item
    pub fn resolve_item(&self, query: &str) -> Result<Lookup<Item>> {
        let query = query.trim();
        if let Some(type_id) = parse_type_id(query) {
            return match self.sde.item(type_id)? {
                Some(item) => Ok(Lookup::Found(item)),
                None => Err(IndustryError::NotFound(query.to_string())),
            };
        }

        let candidates = self.search_items(query)?;
        pick(query, candidates, |item| item.name.as_str())
    }

    /// Blueprints that manufacture `item`
    pub fn blueprints_for(&self, item: &Item) -> Result<Vec<BlueprintMatch>> {
        let blueprints = self.sde.blueprints_for_product(item.type_id)?;
        if blueprints.is_empty() {
            return Err(IndustryError::NotProducible {
                type_id: item.type_id,
                name: item.name.clone(),
            });
        }
        Ok(blueprints)
    }

    /// Resolve a product name, blueprint name or type id to a blueprint
    ///
    /// A numeric query may be either a blueprint's own id or the id of the
    /// item it produces. Text is matched against both product and blueprint
    /// names.
    pub fn resolve_blueprint(&self, query: &str) -> Result<Lookup<BlueprintMatch>> {
        let query = query.trim();
        if let Some(type_id) = parse_type_id(query) {
            if let Some(blueprint) = self.sde.blueprint(type_id)? {
                return Ok(Lookup::Found(blueprint));
            }
            let item = self
                .sde
                .item(type_id)?
                .ok_or_else(|| IndustryError::NotFound(query.to_string()))?;
            let mut blueprints = self.blueprints_for(&item)?;
            return Ok(if blueprints.len() == 1 {
                Lookup::Found(blueprints.swap_remove(0))
            } else {
                Lookup::Ambiguous(blueprints)
            });
        }

        let candidates = self.sde.search_blueprints(query, SEARCH_LIMIT)?;
        if candidates.is_empty() {
            // Distinguish "no such item" from "item exists but cannot be built"
            return match self.resolve_item(query) {
                Ok(Lookup::Found(item)) => Err(IndustryError::NotProducible {
                    type_id: item.type_id,
                    name: item.name,
                }),
                Ok(Lookup::Ambiguous(_)) | Err(IndustryError::NotFound(_)) => {
                    Err(IndustryError::NotFound(query.to_string()))
                }
                Err(e) => Err(e),
            };
        }

        let exact: Vec<&BlueprintMatch> = candidates
            .iter()
            .filter(|bp| {
                bp.product_name.eq_ignore_ascii_case(query)
                    || bp.blueprint_name.eq_ignore_ascii_case(query)
            })
            .collect();
        if exact.len() == 1 {
            let blueprint = exact[0].clone();
            debug!(query, blueprint = blueprint.blueprint_type_id, "exact blueprint match");
            return Ok(Lookup::Found(blueprint));
        }

        pick(query, candidates, |bp| bp.product_name.as_str())
    }
}

/// Resolve a candidate list: one hit or a unique exact name wins, otherwise
/// the caller must disambiguate
fn pick<T>(query: &str, mut candidates: Vec<T>, name: impl Fn(&T) -> &str) -> Result<Lookup<T>> {
    match candidates.len() {
        0 => Err(IndustryError::NotFound(query.to_string())),
        1 => Ok(Lookup::Found(candidates.swap_remove(0))),
        n => {
            let exact: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| name(c).eq_ignore_ascii_case(query))
                .map(|(i, _)| i)
                .collect();
            if let [index] = exact[..] {
                return Ok(Lookup::Found(candidates.swap_remove(index)));
            }
            debug!(query, candidates = n, "ambiguous lookup");
            Ok(Lookup::Ambiguous(candidates))
        }
    }
}

fn parse_type_id(query: &str) -> Option<TypeId> {
    if query.is_empty() || !query.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    query.parse().ok()
}
