//! SQLite-backed factor catalog

use crate::error::CatalogError;
use crate::plan::{lookup_plan, LookupStep, RegionFilter};
use carbonlens_domain::traits::FactorCatalog;
use carbonlens_domain::{EmissionFactor, FactorQuery, Scope};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use tracing::debug;

const COLUMNS: &str =
    "activity_category, scope, region, description, value, unit, uncertainty_pct, source, version";

/// SQLite implementation of `FactorCatalog`
///
/// Use `:memory:` for an in-memory catalog (useful for testing).
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should open its own
/// catalog.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open (or create) a catalog at the given path
    ///
    /// # Examples
    ///
    /// ```
    /// use carbonlens_factors::SqliteCatalog;
    ///
    /// let catalog = SqliteCatalog::new(":memory:").unwrap();
    /// assert_eq!(catalog.count().unwrap(), 0);
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        let mut catalog = Self { conn };
        catalog.initialize_schema()?;
        Ok(catalog)
    }

    fn initialize_schema(&mut self) -> Result<(), CatalogError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert one factor, returning its row id
    pub fn insert(&mut self, factor: &EmissionFactor) -> Result<i64, CatalogError> {
        validate(factor)?;
        self.conn.execute(
            &insert_sql(),
            params![
                factor.activity_category,
                factor.scope.as_u8(),
                factor.region,
                factor.description,
                factor.value,
                factor.unit,
                factor.uncertainty_pct,
                factor.source,
                factor.version,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert many factors in one transaction; nothing is stored on error
    pub fn insert_many(&mut self, factors: &[EmissionFactor]) -> Result<usize, CatalogError> {
        for factor in factors {
            validate(factor)?;
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert_sql())?;
            for factor in factors {
                stmt.execute(params![
                    factor.activity_category,
                    factor.scope.as_u8(),
                    factor.region,
                    factor.description,
                    factor.value,
                    factor.unit,
                    factor.uncertainty_pct,
                    factor.source,
                    factor.version,
                ])?;
            }
        }
        tx.commit()?;
        Ok(factors.len())
    }

    /// All factors in insertion order
    pub fn all(&self) -> Result<Vec<EmissionFactor>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM emission_factors ORDER BY id", COLUMNS))?;
        let rows = stmt.query_map([], row_to_factor)?;

        let mut factors = Vec::new();
        for row in rows {
            factors.push(row??);
        }
        Ok(factors)
    }

    /// Number of stored factors
    pub fn count(&self) -> Result<usize, CatalogError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM emission_factors", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn find_step(
        &self,
        query: &FactorQuery,
        step: &LookupStep,
    ) -> Result<Option<EmissionFactor>, CatalogError> {
        let scope = query.scope.as_u8();
        let mut args: Vec<&dyn ToSql> = vec![&query.activity_category, &scope];
        let mut sql = format!(
            "SELECT {} FROM emission_factors \
             WHERE activity_category = ?1 COLLATE NOCASE AND scope = ?2",
            COLUMNS
        );

        if step.match_description {
            let Some(hint) = &query.description_hint else {
                return Ok(None);
            };
            args.push(hint);
            sql.push_str(&format!(" AND description LIKE '%' || ?{} || '%'", args.len()));
        }
        match step.region {
            RegionFilter::Exact => {
                let Some(region) = &query.region else {
                    return Ok(None);
                };
                args.push(region);
                sql.push_str(&format!(" AND region = ?{} COLLATE NOCASE", args.len()));
            }
            RegionFilter::Global => sql.push_str(" AND region IS NULL"),
            RegionFilter::Any => {}
        }
        sql.push_str(" ORDER BY region IS NOT NULL, id LIMIT 1");

        let row = self
            .conn
            .query_row(&sql, args.as_slice(), row_to_factor)
            .optional()?;

        row.transpose()
    }
}

fn insert_sql() -> String {
    format!(
        "INSERT INTO emission_factors ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        COLUMNS
    )
}

fn validate(factor: &EmissionFactor) -> Result<(), CatalogError> {
    if factor.activity_category.trim().is_empty() {
        return Err(CatalogError::InvalidData("activity_category must not be empty".to_string()));
    }
    if !factor.value.is_finite() || factor.value < 0.0 {
        return Err(CatalogError::InvalidData(format!(
            "factor value must be a non-negative number, got {}",
            factor.value
        )));
    }
    if !factor.uncertainty_pct.is_finite() || factor.uncertainty_pct < 0.0 {
        return Err(CatalogError::InvalidData(format!(
            "uncertainty_pct must be non-negative, got {}",
            factor.uncertainty_pct
        )));
    }
    Ok(())
}

fn row_to_factor(row: &Row<'_>) -> rusqlite::Result<Result<EmissionFactor, CatalogError>> {
    let scope: u8 = row.get(1)?;
    let Some(scope) = Scope::from_u8(scope) else {
        return Ok(Err(CatalogError::InvalidData(format!("Invalid scope in catalog: {}", scope))));
    };

    Ok(Ok(EmissionFactor {
        activity_category: row.get(0)?,
        scope,
        region: row.get(2)?,
        description: row.get(3)?,
        value: row.get(4)?,
        unit: row.get(5)?,
        uncertainty_pct: row.get(6)?,
        source: row.get(7)?,
        version: row.get(8)?,
    }))
}

impl FactorCatalog for SqliteCatalog {
    type Error = CatalogError;

    fn find(&self, query: &FactorQuery) -> Result<Option<EmissionFactor>, Self::Error> {
        for step in lookup_plan(query) {
            if let Some(factor) = self.find_step(query, &step)? {
                debug!(
                    "catalog hit for {} (description: {}, region: {:?})",
                    query.activity_category, step.match_description, step.region
                );
                return Ok(Some(factor));
            }
        }
        Ok(None)
    }
}
