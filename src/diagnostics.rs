//! Deployment diagnostics: credential presence and table reachability.
//!
//! The report never fails. Every problem becomes a failed check so that
//! configuration mistakes are visible from one request.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::Display;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::StoreError;
use crate::store::SupabaseClient;

/// What a check inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckKind {
    /// An environment variable.
    Credential,
    /// A store table.
    Table,
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckOutcome {
    /// Credential set.
    Present,
    /// Credential absent or blank.
    Missing,
    /// Table answered a one-row read.
    Reachable,
    /// Store credentials absent, so the table was not queried.
    MissingCredentials,
    /// Store rejected the key.
    Unauthorized,
    /// Table does not exist.
    TableNotFound,
    /// Table exists but lacks the configured property column.
    ColumnNotFound,
    /// Store could not be reached.
    Unreachable,
    /// Store answered with something unusable.
    UnexpectedResponse,
}

impl CheckOutcome {
    /// Whether the outcome counts as a pass.
    pub fn passed(self) -> bool {
        matches!(self, CheckOutcome::Present | CheckOutcome::Reachable)
    }
}

impl From<&StoreError> for CheckOutcome {
    fn from(error: &StoreError) -> Self {
        use crate::error::StoreErrorKind as K;
        match error.kind() {
            K::MissingCredentials => CheckOutcome::MissingCredentials,
            K::Unauthorized => CheckOutcome::Unauthorized,
            K::TableNotFound => CheckOutcome::TableNotFound,
            K::ColumnNotFound => CheckOutcome::ColumnNotFound,
            K::Unreachable => CheckOutcome::Unreachable,
            K::UnexpectedResponse | K::Rejected => CheckOutcome::UnexpectedResponse,
        }
    }
}

/// One diagnostic check.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Check {
    /// Variable or table name.
    pub name: String,
    /// What was checked.
    pub kind: CheckKind,
    /// Pass/fail.
    pub passed: bool,
    /// Classified outcome.
    pub outcome: CheckOutcome,
    /// Extra context (error message, sample size).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Check {
    fn credential(name: &str, present: bool) -> Self {
        let outcome = if present {
            CheckOutcome::Present
        } else {
            CheckOutcome::Missing
        };
        Self {
            name: name.to_string(),
            kind: CheckKind::Credential,
            passed: outcome.passed(),
            outcome,
            detail: None,
        }
    }

    fn table(name: &str, result: Result<usize, StoreError>) -> Self {
        let (outcome, detail) = match result {
            Ok(rows) => (
                CheckOutcome::Reachable,
                Some(format!("sample read returned {} row(s)", rows)),
            ),
            Err(e) => (CheckOutcome::from(&e), Some(e.to_string())),
        };
        Self {
            name: name.to_string(),
            kind: CheckKind::Table,
            passed: outcome.passed(),
            outcome,
            detail,
        }
    }
}

/// Structured result of `/db/health-check`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HealthReport {
    /// "ok" when every check passed, "degraded" otherwise.
    #[schema(value_type = String)]
    pub status: &'static str,
    /// Presence of each required environment variable.
    pub environment: BTreeMap<String, bool>,
    /// Every check in execution order: credentials first, then tables.
    pub checks: Vec<Check>,
    /// Number of passed checks.
    pub passed: usize,
    /// Number of failed checks.
    pub failed: usize,
}

impl HealthReport {
    fn from_checks(checks: Vec<Check>) -> Self {
        let environment = checks
            .iter()
            .filter(|c| c.kind == CheckKind::Credential)
            .map(|c| (c.name.clone(), c.passed))
            .collect();
        let passed = checks.iter().filter(|c| c.passed).count();
        let failed = checks.len() - passed;

        Self {
            status: if failed == 0 { "ok" } else { "degraded" },
            environment,
            checks,
            passed,
            failed,
        }
    }

    /// Whether everything passed.
    pub fn is_healthy(&self) -> bool {
        self.failed == 0
    }
}

/// Run every credential and table check.
pub async fn run_health_check(config: &Config, store: Option<&SupabaseClient>) -> HealthReport {
    let mut checks: Vec<Check> = config
        .credential_presence()
        .into_iter()
        .map(|(name, present)| Check::credential(name, present))
        .collect();

    let tables = config.unit_tables();
    let samples = tables.iter().map(|table| async move {
        let result = match store {
            Some(client) => client.sample_table(table, &config.units_property_column).await,
            None => Err(StoreError::NotConfigured),
        };
        Check::table(table, result)
    });
    checks.extend(futures::future::join_all(samples).await);

    let report = HealthReport::from_checks(checks);

    if report.is_healthy() {
        info!(passed = report.passed, "Health check passed");
    } else {
        let failing: Vec<_> = report
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| format!("{}={}", c.name, c.outcome))
            .collect();
        warn!(failed = report.failed, failing = ?failing, "Health check degraded");
    }

    report
}
