//! Catalog lookup order shared by every catalog implementation
//!
//! A query is answered by the first step that yields a row:
//!
//! 1. description sub-match (e.g. fuel type), preferred region
//! 2. description sub-match, global row, then any region
//! 3. preferred region
//! 4. global row (region NULL)
//! 5. any region
//!
//! Category is always matched case-insensitively and scope exactly.

use carbonlens_domain::{EmissionFactor, FactorQuery};

/// Region restriction for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionFilter {
    /// Region equals the query region
    Exact,
    /// Region is NULL
    Global,
    /// Any region; global rows first
    Any,
}

/// One step of the lookup plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupStep {
    /// Require the description to contain the query hint
    pub match_description: bool,
    /// Region restriction
    pub region: RegionFilter,
}

/// Build the ordered steps for a query
pub fn lookup_plan(query: &FactorQuery) -> Vec<LookupStep> {
    let mut steps = Vec::with_capacity(5);
    let has_region = query.region.is_some();

    if query.description_hint.is_some() {
        if has_region {
            steps.push(LookupStep {
                match_description: true,
                region: RegionFilter::Exact,
            });
        }
        steps.push(LookupStep {
            match_description: true,
            region: RegionFilter::Any,
        });
    }
    if has_region {
        steps.push(LookupStep {
            match_description: false,
            region: RegionFilter::Exact,
        });
    }
    steps.push(LookupStep {
        match_description: false,
        region: RegionFilter::Global,
    });
    steps.push(LookupStep {
        match_description: false,
        region: RegionFilter::Any,
    });

    steps
}

/// Whether a factor satisfies one step of the plan
pub fn matches(factor: &EmissionFactor, query: &FactorQuery, step: &LookupStep) -> bool {
    if !factor.activity_category.eq_ignore_ascii_case(&query.activity_category) {
        return false;
    }
    if factor.scope != query.scope {
        return false;
    }
    if step.match_description {
        let Some(hint) = &query.description_hint else {
            return false;
        };
        let contains = factor
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&hint.to_lowercase()));
        if !contains {
            return false;
        }
    }
    match step.region {
        RegionFilter::Exact => match (&factor.region, &query.region) {
            (Some(have), Some(want)) => have.eq_ignore_ascii_case(want),
            _ => false,
        },
        RegionFilter::Global => factor.region.is_none(),
        RegionFilter::Any => true,
    }
}
