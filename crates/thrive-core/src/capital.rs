//! # Capital State Engine
//!
//! Chain-agnostic capital model and the reconciliation that produces it.
//!
//! Balances are observed read-only from any number of sources. The engine
//! folds them into one exposure per asset, classifies each exposure by
//! liquidity and volatility, and reports assets that more than one source
//! claims to hold. Output ordering is by asset code.

use crate::planner::round_to;
use crate::primitives::CONSERVATION_DECIMALS;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CLASSIFIERS
// =============================================================================

/// How quickly an exposure can be turned into cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityClass {
    #[default]
    Liquid,
    SemiLiquid,
    Illiquid,
}

/// How much an exposure's value is expected to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityClass {
    Low,
    Medium,
    #[default]
    High,
    Extreme,
}

// =============================================================================
// CAPITAL MODEL
// =============================================================================

fn default_cost_basis_method() -> String {
    "lot".to_string()
}

/// Optional cost basis for a capital unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBasis {
    pub currency: String,
    pub amount: f64,
    #[serde(default = "default_cost_basis_method")]
    pub method: String,
}

/// Canonical representation of a holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalUnit {
    pub asset_code: String,
    pub quantity: f64,
}

/// A classified holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    pub unit: CapitalUnit,
    pub liquidity: LiquidityClass,
    pub volatility: VolatilityClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_basis: Option<CostBasis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
}

/// Snapshot of all exposures at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalSnapshot {
    pub exposures: Vec<Exposure>,
    pub as_of: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl CapitalSnapshot {
    /// Sum of all exposure quantities.
    #[must_use]
    pub fn total_quantity(&self) -> f64 {
        self.exposures.iter().map(|e| e.unit.quantity).sum()
    }
}

// =============================================================================
// OBSERVATION & CLASSIFICATION
// =============================================================================

/// A balance reported by one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedBalance {
    pub asset_code: String,
    pub quantity: f64,
    pub source: String,
}

impl ObservedBalance {
    #[must_use]
    pub fn new(asset_code: impl Into<String>, quantity: f64, source: impl Into<String>) -> Self {
        Self {
            asset_code: asset_code.into(),
            quantity,
            source: source.into(),
        }
    }
}

/// Liquidity and volatility for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetClassification {
    pub liquidity: LiquidityClass,
    pub volatility: VolatilityClass,
}

/// Default classification plus per-asset overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    #[serde(default)]
    pub default_liquidity: LiquidityClass,
    #[serde(default)]
    pub default_volatility: VolatilityClass,
    #[serde(default)]
    pub overrides: BTreeMap<String, AssetClassification>,
}

impl ClassificationPolicy {
    /// Add an override for one asset.
    #[must_use]
    pub fn with_override(
        mut self,
        asset_code: impl Into<String>,
        class: AssetClassification,
    ) -> Self {
        self.overrides.insert(asset_code.into(), class);
        self
    }

    /// Classification for an asset code.
    #[must_use]
    pub fn classify(&self, asset_code: &str) -> AssetClassification {
        self.overrides
            .get(asset_code)
            .copied()
            .unwrap_or(AssetClassification {
                liquidity: self.default_liquidity,
                volatility: self.default_volatility,
            })
    }
}

// =============================================================================
// RECONCILIATION
// =============================================================================

/// An asset reported by several sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationIssue {
    pub asset_code: String,
    pub sources: Vec<String>,
    pub message: String,
}

/// All issues found during one ingest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub issues: Vec<ReconciliationIssue>,
}

impl ReconciliationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Result of one ingest: the raw observations, the snapshot and the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEngineState {
    pub observed: Vec<ObservedBalance>,
    pub snapshot: CapitalSnapshot,
    pub report: ReconciliationReport,
}

/// Ingests read-only balances and produces a deterministic snapshot.
#[derive(Debug, Clone, Default)]
pub struct StateEngine {
    policy: ClassificationPolicy,
}

impl StateEngine {
    #[must_use]
    pub fn new(policy: ClassificationPolicy) -> Self {
        Self { policy }
    }

    /// Fold observed balances into a snapshot.
    ///
    /// Per-asset totals are rounded to `CONSERVATION_DECIMALS` so float
    /// summation noise (`0.7 + 0.1`) does not reach the snapshot.
    #[must_use]
    pub fn ingest(
        &self,
        observed: Vec<ObservedBalance>,
        as_of: impl Into<String>,
    ) -> StateEngineState {
        let (exposures, report) = self.reconcile(&observed);
        StateEngineState {
            observed,
            snapshot: CapitalSnapshot {
                exposures,
                as_of: as_of.into(),
                notes: Vec::new(),
            },
            report,
        }
    }

    fn reconcile(&self, observed: &[ObservedBalance]) -> (Vec<Exposure>, ReconciliationReport) {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        let mut sources: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for item in observed {
            *totals.entry(item.asset_code.as_str()).or_insert(0.0) += item.quantity;
            sources
                .entry(item.asset_code.as_str())
                .or_default()
                .insert(item.source.as_str());
        }

        let issues = sources
            .iter()
            .filter(|(_, set)| set.len() > 1)
            .map(|(asset, set)| ReconciliationIssue {
                asset_code: (*asset).to_string(),
                sources: set.iter().map(|s| (*s).to_string()).collect(),
                message: "Multiple sources reported balances for this asset.".to_string(),
            })
            .collect();

        let exposures = totals
            .into_iter()
            .map(|(asset, quantity)| {
                let class = self.policy.classify(asset);
                Exposure {
                    unit: CapitalUnit {
                        asset_code: asset.to_string(),
                        quantity: round_to(quantity, CONSERVATION_DECIMALS),
                    },
                    liquidity: class.liquidity,
                    volatility: class.volatility,
                    cost_basis: None,
                    attributes: None,
                }
            })
            .collect();

        (exposures, ReconciliationReport { issues })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_sums_and_sorts_by_asset() {
        let engine = StateEngine::default();
        let state = engine.ingest(
            vec![
                ObservedBalance::new("USD", 100.0, "bank"),
                ObservedBalance::new("BTC", 0.5, "exchange"),
                ObservedBalance::new("USD", 50.0, "bank"),
            ],
            "2024-01-01T00:00:00Z",
        );

        let codes: Vec<&str> = state
            .snapshot
            .exposures
            .iter()
            .map(|e| e.unit.asset_code.as_str())
            .collect();
        assert_eq!(codes, vec!["BTC", "USD"]);
        assert_eq!(state.snapshot.exposures[1].unit.quantity, 150.0);
        assert!(state.report.is_clean());
        assert_eq!(state.observed.len(), 3);
    }

    #[test]
    fn ingest_totals_drop_float_noise() {
        let state = StateEngine::default().ingest(
            vec![
                ObservedBalance::new("ETH", 0.7, "node"),
                ObservedBalance::new("ETH", 0.1, "node"),
            ],
            "2024-01-01T00:00:00Z",
        );
        assert_eq!(state.snapshot.exposures[0].unit.quantity, 0.8);
    }

    #[test]
    fn multiple_sources_are_reported_sorted() {
        let engine = StateEngine::default();
        let state = engine.ingest(
            vec![
                ObservedBalance::new("ETH", 1.0, "ledger"),
                ObservedBalance::new("ETH", 2.0, "exchange"),
                ObservedBalance::new("ETH", 3.0, "ledger"),
            ],
            "now",
        );

        assert_eq!(state.report.issues.len(), 1);
        let issue = &state.report.issues[0];
        assert_eq!(issue.sources, vec!["exchange", "ledger"]);
        assert_eq!(issue.message, "Multiple sources reported balances for this asset.");
    }

    #[test]
    fn policy_overrides_apply() {
        let policy = ClassificationPolicy::default().with_override(
            "HOUSE",
            AssetClassification {
                liquidity: LiquidityClass::Illiquid,
                volatility: VolatilityClass::Low,
            },
        );
        let engine = StateEngine::new(policy);
        let state = engine.ingest(
            vec![
                ObservedBalance::new("HOUSE", 1.0, "appraisal"),
                ObservedBalance::new("SOL", 10.0, "exchange"),
            ],
            "now",
        );

        let house = &state.snapshot.exposures[0];
        assert_eq!(house.liquidity, LiquidityClass::Illiquid);
        assert_eq!(house.volatility, VolatilityClass::Low);
        let sol = &state.snapshot.exposures[1];
        assert_eq!(sol.liquidity, LiquidityClass::Liquid);
        assert_eq!(sol.volatility, VolatilityClass::High);
        assert_eq!(state.snapshot.total_quantity(), 11.0);
    }

    #[test]
    fn classes_serialize_snake_case() {
        let json = serde_json::to_string(&LiquidityClass::SemiLiquid).expect("serialize");
        assert_eq!(json, "\"semi_liquid\"");
    }
}
