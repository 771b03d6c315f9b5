//! Idempotent schema patches for the fountains table.
//!
//! Each patch first probes whether it is already in place and only then runs
//! its statements. Failures are reported per patch and never abort the caller:
//! a patch that cannot run on a given database (missing privileges, a column
//! that is already correct in some other way) leaves the import usable.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use super::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PatchOutcome {
    Applied,
    AlreadyApplied,
    Failed(String),
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Applied => f.write_str("applied"),
            PatchOutcome::AlreadyApplied => f.write_str("already applied"),
            PatchOutcome::Failed(reason) => write!(f, "failed (ignored): {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub name: &'static str,
    pub outcome: PatchOutcome,
}

/// One reconciliation step: `probe` answers "already in place?" as a single
/// boolean, `apply` runs in order when it is not.
#[derive(Debug, Clone, Copy)]
pub struct SchemaPatch {
    pub name: &'static str,
    pub probe: &'static str,
    pub apply: &'static [&'static str],
}

pub const FOUNTAIN_PATCHES: &[SchemaPatch] = &[
    SchemaPatch {
        name: "fountains_table",
        probe: "SELECT to_regclass('fountains') IS NOT NULL",
        apply: &["CREATE TABLE IF NOT EXISTS fountains (
            id SERIAL PRIMARY KEY,
            number TEXT,
            location TEXT,
            description TEXT,
            flavordescription TEXT,
            flavorrating TEXT,
            images TEXT[],
            other TEXT,
            video TEXT
        )"],
    },
    SchemaPatch {
        name: "flavorrating_text",
        probe: "SELECT COALESCE((
            SELECT data_type = 'text' FROM information_schema.columns
            WHERE table_schema = ANY (current_schemas(false))
              AND table_name = 'fountains' AND column_name = 'flavorrating'
            LIMIT 1), FALSE)",
        apply: &["ALTER TABLE fountains ALTER COLUMN flavorrating TYPE TEXT USING flavorrating::TEXT"],
    },
    SchemaPatch {
        name: "flavorrating_raw_merge",
        probe: "SELECT NOT EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_schema = ANY (current_schemas(false))
              AND table_name = 'fountains' AND column_name = 'flavorrating_raw')",
        apply: &[
            "UPDATE fountains SET flavorrating = COALESCE(flavorrating_raw, flavorrating)",
            "ALTER TABLE fountains DROP COLUMN flavorrating_raw",
        ],
    },
    SchemaPatch {
        name: "other_column",
        probe: "SELECT EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_schema = ANY (current_schemas(false))
              AND table_name = 'fountains' AND column_name = 'other')",
        apply: &["ALTER TABLE fountains ADD COLUMN IF NOT EXISTS other TEXT"],
    },
    SchemaPatch {
        name: "video_column",
        probe: "SELECT EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_schema = ANY (current_schemas(false))
              AND table_name = 'fountains' AND column_name = 'video')",
        apply: &["ALTER TABLE fountains ADD COLUMN IF NOT EXISTS video TEXT"],
    },
];

/// Where patches run. Implemented for a Postgres pool; tests use a fake.
#[async_trait]
pub trait PatchTarget: Send {
    async fn probe(&mut self, sql: &str) -> Result<bool, StoreError>;
    async fn execute(&mut self, sql: &str) -> Result<(), StoreError>;
}

pub struct PoolTarget<'a>(pub &'a PgPool);

#[async_trait]
impl PatchTarget for PoolTarget<'_> {
    async fn probe(&mut self, sql: &str) -> Result<bool, StoreError> {
        let applied: bool = sqlx::query_scalar(sql)
            .persistent(false)
            .fetch_one(self.0)
            .await?;
        Ok(applied)
    }

    async fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        sqlx::raw_sql(sql).execute(self.0).await?;
        Ok(())
    }
}

pub async fn run_patch<T: PatchTarget + ?Sized>(target: &mut T, patch: &SchemaPatch) -> PatchOutcome {
    match target.probe(patch.probe).await {
        Ok(true) => return PatchOutcome::AlreadyApplied,
        Ok(false) => {}
        // An unanswerable probe is not fatal; the statements are idempotent.
        Err(e) => warn!(patch = patch.name, error = %e, "schema probe failed; applying anyway"),
    }
    for stmt in patch.apply {
        if let Err(e) = target.execute(stmt).await {
            return PatchOutcome::Failed(e.to_string());
        }
    }
    PatchOutcome::Applied
}

/// Run every fountain patch in order, logging one line per patch.
pub async fn reconcile<T: PatchTarget + ?Sized>(target: &mut T) -> Vec<PatchReport> {
    let mut reports = Vec::with_capacity(FOUNTAIN_PATCHES.len());
    for patch in FOUNTAIN_PATCHES {
        let outcome = run_patch(target, patch).await;
        match &outcome {
            PatchOutcome::Failed(reason) => {
                warn!(patch = patch.name, %reason, "schema patch failed (non-fatal)")
            }
            other => info!(patch = patch.name, outcome = %other, "schema patch"),
        }
        reports.push(PatchReport {
            name: patch.name,
            outcome,
        });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Answers probes from a table and fails statements containing a marker.
    #[derive(Default)]
    struct FakeTarget {
        probes: HashMap<&'static str, Result<bool, &'static str>>,
        fail_marker: Option<&'static str>,
        executed: Vec<String>,
    }

    #[async_trait]
    impl PatchTarget for FakeTarget {
        async fn probe(&mut self, sql: &str) -> Result<bool, StoreError> {
            match self.probes.get(sql) {
                Some(Ok(v)) => Ok(*v),
                Some(Err(msg)) => Err(StoreError::Rejected(msg.to_string())),
                None => Ok(false),
            }
        }

        async fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
            if self.fail_marker.is_some_and(|m| sql.contains(m)) {
                return Err(StoreError::Rejected("permission denied".into()));
            }
            self.executed.push(sql.to_string());
            Ok(())
        }
    }

    fn patch(name: &str) -> &'static SchemaPatch {
        FOUNTAIN_PATCHES.iter().find(|p| p.name == name).unwrap()
    }

    #[tokio::test]
    async fn probes_short_circuit_applied_patches() {
        let mut target = FakeTarget::default();
        for p in FOUNTAIN_PATCHES {
            target.probes.insert(p.probe, Ok(true));
        }
        let reports = reconcile(&mut target).await;
        assert_eq!(reports.len(), FOUNTAIN_PATCHES.len());
        assert!(reports
            .iter()
            .all(|r| r.outcome == PatchOutcome::AlreadyApplied));
        assert!(target.executed.is_empty());
    }

    #[tokio::test]
    async fn failures_are_reported_and_later_patches_still_run() {
        let mut target = FakeTarget {
            fail_marker: Some("ALTER COLUMN flavorrating"),
            ..FakeTarget::default()
        };
        let reports = reconcile(&mut target).await;

        let names: Vec<&str> = reports.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "fountains_table",
                "flavorrating_text",
                "flavorrating_raw_merge",
                "other_column",
                "video_column"
            ]
        );
        assert_eq!(reports[0].outcome, PatchOutcome::Applied);
        assert!(matches!(reports[1].outcome, PatchOutcome::Failed(ref r) if r.contains("permission denied")));
        assert_eq!(reports[4].outcome, PatchOutcome::Applied);
    }

    #[tokio::test]
    async fn multi_statement_patch_stops_at_first_failure() {
        let mut target = FakeTarget {
            fail_marker: Some("UPDATE fountains"),
            ..FakeTarget::default()
        };
        let outcome = run_patch(&mut target, patch("flavorrating_raw_merge")).await;
        assert!(matches!(outcome, PatchOutcome::Failed(_)));
        assert!(!target.executed.iter().any(|s| s.contains("DROP COLUMN")));
    }

    #[tokio::test]
    async fn failed_probe_still_attempts_the_patch() {
        let mut target = FakeTarget::default();
        target
            .probes
            .insert(patch("other_column").probe, Err("information_schema unavailable"));
        let outcome = run_patch(&mut target, patch("other_column")).await;
        assert_eq!(outcome, PatchOutcome::Applied);
        assert_eq!(target.executed.len(), 1);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let v = serde_json::to_value(PatchOutcome::Failed("nope".into())).unwrap();
        assert_eq!(v, serde_json::json!({"status": "failed", "reason": "nope"}));
        let v = serde_json::to_value(PatchOutcome::AlreadyApplied).unwrap();
        assert_eq!(v, serde_json::json!({"status": "already_applied"}));
    }
}
