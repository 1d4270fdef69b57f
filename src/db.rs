//! SDE database access
//!
//! Reads the subset of the Fuzzwork SQLite dump needed for industry
//! calculations: `invTypes`, `industryActivity`, `industryActivityMaterials`
//! and `industryActivityProducts`. The production dump is opened read-only;
//! [`Sde::create`] and [`Sde::open_in_memory`] exist for the bundled sample
//! dataset and for test fixtures.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params, params_from_iter};
use tracing::debug;

use crate::error::{IndustryError, Result};
use crate::models::{Activity, ActivityProduct, BlueprintMatch, Item, MaterialLine, TypeId};

/// Tables every usable dataset must contain
pub const REQUIRED_TABLES: [&str; 4] = [
    "invTypes",
    "industryActivity",
    "industryActivityMaterials",
    "industryActivityProducts",
];

/// Maximum number of candidates returned by name searches
pub const SEARCH_LIMIT: usize = 25;

/// Handle on the static data export. The connection closes when dropped.
#[derive(Debug)]
pub struct Sde {
    conn: Connection,
}

impl Sde {
    /// Open an existing SDE dump read-only
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(IndustryError::DatasetNotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "opened SDE");
        Ok(Self { conn })
    }

    /// Open (or create) a writable database and make sure the schema exists
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Empty in-memory dataset with the schema in place
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Check that the dataset has the tables we query and at least one published type
    pub fn verify(&self) -> Result<()> {
        for table in REQUIRED_TABLES {
            let found: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .optional()?;
            if found.is_none() {
                return Err(IndustryError::MissingTable(table.to_string()));
            }
        }

        let published: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM invTypes WHERE published = 1",
            [],
            |row| row.get(0),
        )?;
        if published == 0 {
            return Err(IndustryError::EmptyDataset);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Writes (sample data and fixtures only)
    // ------------------------------------------------------------------

    /// Insert or replace a type
    pub fn upsert_type(&self, type_id: TypeId, name: &str, published: bool) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO invTypes (typeID, typeName, published) VALUES (?1, ?2, ?3)",
            params![type_id, name, published],
        )?;
        Ok(())
    }

    /// Insert or replace the base duration of a blueprint activity
    pub fn insert_activity(&self, blueprint_id: TypeId, activity: Activity, time_s: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO industryActivity (typeID, activityID, time) VALUES (?1, ?2, ?3)",
            params![blueprint_id, activity.id(), time_s],
        )?;
        Ok(())
    }

    /// Insert a material line of a blueprint activity
    pub fn insert_material(
        &self,
        blueprint_id: TypeId,
        activity: Activity,
        material_id: TypeId,
        quantity: i64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO industryActivityMaterials (typeID, activityID, materialTypeID, quantity)
             VALUES (?1, ?2, ?3, ?4)",
            params![blueprint_id, activity.id(), material_id, quantity],
        )?;
        Ok(())
    }

    /// Insert a product of a blueprint activity
    pub fn insert_product(
        &self,
        blueprint_id: TypeId,
        activity: Activity,
        product_id: TypeId,
        quantity: i64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO industryActivityProducts (typeID, activityID, productTypeID, quantity)
             VALUES (?1, ?2, ?3, ?4)",
            params![blueprint_id, activity.id(), product_id, quantity],
        )?;
        Ok(())
    }

    /// Remove all rows (for reloading sample data)
    pub fn clear(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM industryActivityProducts;
            DELETE FROM industryActivityMaterials;
            DELETE FROM industryActivity;
            DELETE FROM invTypes;
            "#,
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Type lookups
    // ------------------------------------------------------------------

    /// Look up a single published type by id
    pub fn item(&self, type_id: TypeId) -> Result<Option<Item>> {
        let item = self
            .conn
            .query_row(
                "SELECT typeID, typeName FROM invTypes WHERE typeID = ?1 AND published = 1",
                [type_id],
                |row| {
                    Ok(Item {
                        type_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(item)
    }

    /// Bulk look up type names. Unknown ids map to "Unknown (id)".
    pub fn type_names(&self, type_ids: &[TypeId]) -> Result<HashMap<TypeId, String>> {
        let mut unique = type_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; unique.len()].join(",");
        let sql = format!("SELECT typeID, typeName FROM invTypes WHERE typeID IN ({placeholders})");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(unique.iter()), |row| {
            Ok((row.get::<_, TypeId>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut names = HashMap::new();
        for row in rows {
            let (id, name) = row?;
            names.insert(id, name);
        }
        for id in unique {
            names.entry(id).or_insert_with(|| format!("Unknown ({id})"));
        }
        Ok(names)
    }

    /// Search published types by partial name, exact matches first, then prefix matches
    pub fn search_types(&self, term: &str, limit: usize) -> Result<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            r"SELECT typeID, typeName FROM invTypes
              WHERE typeName LIKE ?1 ESCAPE '\' AND published = 1
              ORDER BY CASE
                  WHEN typeName = ?2 COLLATE NOCASE THEN 0
                  WHEN typeName LIKE ?3 ESCAPE '\' THEN 1
                  ELSE 2
              END, typeName
              LIMIT ?4",
        )?;

        let escaped = escape_like(term);
        let rows = stmt.query_map(
            params![
                format!("%{escaped}%"),
                term,
                format!("{escaped}%"),
                limit as i64
            ],
            |row| {
                Ok(Item {
                    type_id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        debug!(term, hits = results.len(), "searched types");
        Ok(results)
    }

    /// Find a published type whose name equals `name`, ignoring case
    pub fn find_type_by_name(&self, name: &str) -> Result<Option<Item>> {
        let item = self
            .conn
            .query_row(
                "SELECT typeID, typeName FROM invTypes
                 WHERE typeName = ?1 COLLATE NOCASE AND published = 1
                 ORDER BY typeID LIMIT 1",
                [name],
                |row| {
                    Ok(Item {
                        type_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(item)
    }

    // ------------------------------------------------------------------
    // Blueprint lookups
    // ------------------------------------------------------------------

    /// All blueprints whose manufacturing activity produces `product_id`
    pub fn blueprints_for_product(&self, product_id: TypeId) -> Result<Vec<BlueprintMatch>> {
        self.query_blueprints(
            "WHERE iap.productTypeID = ?1 AND bp.published = 1 ORDER BY bp.typeName",
            params![product_id],
        )
    }

    /// The published blueprint with id `blueprint_id`, if it manufactures anything
    pub fn blueprint(&self, blueprint_id: TypeId) -> Result<Option<BlueprintMatch>> {
        let mut found = self.query_blueprints(
            "WHERE bp.typeID = ?1 AND bp.published = 1 ORDER BY iap.productTypeID",
            params![blueprint_id],
        )?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    /// Search blueprints by product name or blueprint name
    pub fn search_blueprints(&self, term: &str, limit: usize) -> Result<Vec<BlueprintMatch>> {
        let escaped = escape_like(term);
        self.query_blueprints(
            r"WHERE (bp.typeName LIKE ?1 ESCAPE '\' OR prod.typeName LIKE ?1 ESCAPE '\')
                AND bp.published = 1
              ORDER BY CASE
                  WHEN prod.typeName = ?2 COLLATE NOCASE OR bp.typeName = ?2 COLLATE NOCASE THEN 0
                  WHEN prod.typeName LIKE ?3 ESCAPE '\' THEN 1
                  ELSE 2
              END, prod.typeName
              LIMIT ?4",
            params![
                format!("%{escaped}%"),
                term,
                format!("{escaped}%"),
                limit as i64
            ],
        )
    }

    fn query_blueprints(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<BlueprintMatch>> {
        let sql = format!(
            "SELECT bp.typeID, bp.typeName, iap.productTypeID, prod.typeName
             FROM invTypes bp
             JOIN industryActivityProducts iap
                 ON bp.typeID = iap.typeID AND iap.activityID = {}
             JOIN invTypes prod ON iap.productTypeID = prod.typeID
             {filter}",
            Activity::Manufacturing.id()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(BlueprintMatch {
                blueprint_type_id: row.get(0)?,
                blueprint_name: row.get(1)?,
                product_type_id: row.get(2)?,
                product_name: row.get(3)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    // ------------------------------------------------------------------
    // Activities
    // ------------------------------------------------------------------

    /// Material lines of a blueprint activity, largest quantity first
    pub fn activity_materials(
        &self,
        blueprint_id: TypeId,
        activity: Activity,
    ) -> Result<Vec<MaterialLine>> {
        let sql = format!(
            "SELECT iam.materialTypeID,
                    COALESCE(it.typeName, 'Unknown (' || iam.materialTypeID || ')'),
                    iam.quantity
             FROM industryActivityMaterials iam
             LEFT JOIN invTypes it ON iam.materialTypeID = it.typeID
             WHERE iam.typeID = ?1 AND {}
             ORDER BY iam.quantity DESC, iam.materialTypeID",
            activity_filter("iam.activityID", activity)
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt.query_map([blueprint_id], |row| {
            Ok(MaterialLine {
                type_id: row.get(0)?,
                name: row.get(1)?,
                quantity: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Base duration in seconds of a blueprint activity
    pub fn activity_time(&self, blueprint_id: TypeId, activity: Activity) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT time FROM industryActivity WHERE typeID = ?1 AND {}
             ORDER BY activityID DESC LIMIT 1",
            activity_filter("activityID", activity)
        );
        let time = self
            .conn
            .query_row(&sql, [blueprint_id], |row| row.get(0))
            .optional()?;
        Ok(time)
    }

    /// Products of a blueprint activity (e.g. the T2 blueprints an invention can yield)
    pub fn activity_products(
        &self,
        blueprint_id: TypeId,
        activity: Activity,
    ) -> Result<Vec<ActivityProduct>> {
        let sql = format!(
            "SELECT iap.productTypeID, it.typeName, iap.quantity
             FROM industryActivityProducts iap
             JOIN invTypes it ON iap.productTypeID = it.typeID
             WHERE iap.typeID = ?1 AND {}
             ORDER BY it.typeName",
            activity_filter("iap.activityID", activity)
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt.query_map([blueprint_id], |row| {
            Ok(ActivityProduct {
                type_id: row.get(0)?,
                name: row.get(1)?,
                quantity: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

/// Create the SDE subset schema if it does not exist yet
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS invTypes (
            typeID INTEGER PRIMARY KEY,
            groupID INTEGER,
            typeName TEXT,
            published INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS industryActivity (
            typeID INTEGER,
            activityID INTEGER,
            time INTEGER,
            PRIMARY KEY (typeID, activityID)
        );

        CREATE TABLE IF NOT EXISTS industryActivityMaterials (
            typeID INTEGER,
            activityID INTEGER,
            materialTypeID INTEGER,
            quantity INTEGER
        );

        CREATE TABLE IF NOT EXISTS industryActivityProducts (
            typeID INTEGER,
            activityID INTEGER,
            productTypeID INTEGER,
            quantity INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_materials_blueprint ON industryActivityMaterials(typeID, activityID);
        CREATE INDEX IF NOT EXISTS idx_products_product ON industryActivityProducts(productTypeID);
        CREATE INDEX IF NOT EXISTS idx_types_name ON invTypes(typeName);
        "#,
    )?;
    Ok(())
}

/// `column IN (...)` over every id the activity may be stored under
fn activity_filter(column: &str, activity: Activity) -> String {
    let ids: Vec<String> = activity.ids().iter().map(i64::to_string).collect();
    format!("{column} IN ({})", ids.join(", "))
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Sde {
        let sde = Sde::open_in_memory().unwrap();
        sde.upsert_type(34, "Tritanium", true).unwrap();
        sde.upsert_type(35, "Pyerite", true).unwrap();
        sde.upsert_type(24698, "Drake", true).unwrap();
        sde.upsert_type(24699, "Drake Blueprint", true).unwrap();
        sde.upsert_type(33151, "Drake Navy Issue", true).unwrap();
        sde.upsert_type(99, "100% Test_Item", false).unwrap();
        sde.upsert_type(98, "Retired Widget", false).unwrap();
        sde.upsert_type(97, "Retired Widget Blueprint", false).unwrap();
        sde.insert_product(97, Activity::Manufacturing, 98, 1).unwrap();
        sde.insert_activity(24699, Activity::Manufacturing, 36000).unwrap();
        sde.insert_product(24699, Activity::Manufacturing, 24698, 1).unwrap();
        sde.insert_material(24699, Activity::Manufacturing, 35, 200).unwrap();
        sde.insert_material(24699, Activity::Manufacturing, 34, 1000).unwrap();
        sde
    }

    #[test]
    fn test_search_types_prefers_exact_match() {
        let sde = fixture();
        let hits = sde.search_types("drake", SEARCH_LIMIT).unwrap();
        let names: Vec<_> = hits.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Drake", "Drake Blueprint", "Drake Navy Issue"]);
    }

    #[test]
    fn test_search_types_skips_unpublished_and_escapes_wildcards() {
        let sde = fixture();
        assert!(sde.search_types("100%", SEARCH_LIMIT).unwrap().is_empty());
        // '_' must not act as a single-character wildcard
        assert!(sde.search_types("Dr_ke", SEARCH_LIMIT).unwrap().is_empty());
    }

    #[test]
    fn test_activity_materials_ordered_by_quantity() {
        let sde = fixture();
        let lines = sde.activity_materials(24699, Activity::Manufacturing).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Tritanium");
        assert_eq!(lines[0].quantity, 1000);
        assert_eq!(lines[1].type_id, 35);
    }

    #[test]
    fn test_blueprint_lookups() {
        let sde = fixture();
        let by_product = sde.blueprints_for_product(24698).unwrap();
        assert_eq!(by_product.len(), 1);
        assert_eq!(by_product[0].blueprint_type_id, 24699);

        let by_id = sde.blueprint(24699).unwrap().unwrap();
        assert_eq!(by_id.product_name, "Drake");
        assert!(sde.blueprint(34).unwrap().is_none());
    }

    #[test]
    fn test_id_lookups_skip_unpublished() {
        let sde = fixture();
        assert!(sde.item(98).unwrap().is_none());
        assert!(sde.blueprint(97).unwrap().is_none());
        assert!(sde.blueprints_for_product(98).unwrap().is_empty());
        assert_eq!(sde.item(34).unwrap().unwrap().name, "Tritanium");
    }

    #[test]
    fn test_reactions_under_legacy_activity_id() {
        let sde = fixture();
        sde.upsert_type(16670, "Crystalline Carbonide Reaction Formula", true).unwrap();
        sde.conn
            .execute("INSERT INTO industryActivity VALUES (16670, 9, 10800)", [])
            .unwrap();
        sde.conn
            .execute(
                "INSERT INTO industryActivityMaterials VALUES (16670, 9, 34, 100)",
                [],
            )
            .unwrap();

        assert_eq!(sde.activity_time(16670, Activity::Reactions).unwrap(), Some(10800));
        let lines = sde.activity_materials(16670, Activity::Reactions).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 100);

        let table =
            crate::materials::activity_materials(&sde, 16670, Activity::Reactions).unwrap();
        assert_eq!(table.base_time_s, Some(10800));
    }

    #[test]
    fn test_type_names_fills_unknowns() {
        let sde = fixture();
        let names = sde.type_names(&[34, 34, 12345]).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&34], "Tritanium");
        assert_eq!(names[&12345], "Unknown (12345)");
    }

    #[test]
    fn test_activity_time() {
        let sde = fixture();
        assert_eq!(sde.activity_time(24699, Activity::Manufacturing).unwrap(), Some(36000));
        assert_eq!(sde.activity_time(24699, Activity::Invention).unwrap(), None);
    }

    #[test]
    fn test_verify() {
        let sde = fixture();
        sde.verify().unwrap();

        let empty = Sde::open_in_memory().unwrap();
        assert!(matches!(empty.verify(), Err(IndustryError::EmptyDataset)));
    }

    #[test]
    fn test_open_missing_file() {
        let err = Sde::open(Path::new("/nonexistent/sde.sqlite")).err().unwrap();
        assert!(matches!(err, IndustryError::DatasetNotFound(_)));
    }
}
