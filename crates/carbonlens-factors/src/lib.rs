//! carbonlens Factor Layer
//!
//! Emission factor catalogs and the resolver that picks a factor for each
//! calculation.
//!
//! # Architecture
//!
//! - `SqliteCatalog` for persistent factor rows (schema in `schema.sql`)
//! - `MemoryCatalog` for tests and JSON-loaded factor sets
//! - Built-in currency, activity, fuel and grid tables as fallbacks
//! - A TTL cache owned by the resolver; expiry only affects cost
//!
//! Both catalogs answer queries with the same lookup order: description
//! sub-match, preferred region, global row, any region.
//!
//! # Examples
//!
//! ```
//! use carbonlens_domain::{EmissionFactor, Scope};
//! use carbonlens_factors::{FactorResolver, ResolverConfig, SqliteCatalog};
//!
//! let mut catalog = SqliteCatalog::new(":memory:").unwrap();
//! catalog
//!     .insert(&EmissionFactor {
//!         activity_category: "electricity".to_string(),
//!         scope: Scope::Two,
//!         region: Some("EU".to_string()),
//!         description: None,
//!         value: 0.25,
//!         unit: "kg CO2e/kWh".to_string(),
//!         uncertainty_pct: 4.0,
//!         source: "EEA".to_string(),
//!         version: None,
//!     })
//!     .unwrap();
//!
//! let resolver = FactorResolver::new(catalog, ResolverConfig::default());
//! let factor = resolver
//!     .resolve_activity("electricity", None, Some("EU"), Scope::Two)
//!     .unwrap();
//! assert_eq!(factor.value, 0.25);
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod defaults;
pub mod error;
pub mod memory;
pub mod plan;
pub mod resolver;
pub mod sqlite;

pub use cache::FactorCache;
pub use config::ResolverConfig;
pub use defaults::GridFactor;
pub use error::{CatalogError, FactorError};
pub use memory::MemoryCatalog;
pub use resolver::FactorResolver;
pub use sqlite::SqliteCatalog;
