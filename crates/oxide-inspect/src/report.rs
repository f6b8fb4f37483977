//! Text and JSON rendering of audit and rollback results.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diagnostics::Severity;
use crate::error::Result;
use crate::rules::Rule;
use crate::session::{RollbackSet, RollbackStatement, SkippedRollback, StatementReport, Status};

/// Result of auditing one script.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// When the audit ran.
    pub generated_at: DateTime<Utc>,
    /// Schema unqualified names resolved in.
    pub schema: String,
    /// Worst severity over all statements.
    pub severity: Severity,
    /// One entry per statement.
    pub statements: Vec<StatementReport>,
}

impl AuditReport {
    /// Builds a report stamped with the current time.
    #[must_use]
    pub fn new(schema: impl Into<String>, statements: Vec<StatementReport>) -> Self {
        let severity = statements
            .iter()
            .map(|s| s.severity)
            .max()
            .unwrap_or_default();
        Self {
            generated_at: Utc::now(),
            schema: schema.into(),
            severity,
            statements,
        }
    }

    /// Returns true if any statement failed the base validity gate.
    #[must_use]
    pub fn has_invalid(&self) -> bool {
        self.statements.iter().any(|s| s.status == Status::Invalid)
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Audit of {} statement(s) in schema {} ({})",
            self.statements.len(),
            self.schema,
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "{:-<60}", "")?;
        for report in &self.statements {
            let status = match report.status {
                Status::Done => "done",
                Status::Invalid => "invalid",
            };
            writeln!(f, " #{} [{}] {status}", report.number, report.severity)?;
            writeln!(f, "    {}", report.sql)?;
            for line in report.message.lines() {
                writeln!(f, "    {line}")?;
            }
        }
        writeln!(f, "{:-<60}", "")?;
        write!(f, "Overall: {}", self.severity)
    }
}

/// Rollback statements of one script, ready to run.
#[derive(Debug, Clone, Serialize)]
pub struct RollbackReport {
    /// When the rollbacks were generated.
    pub generated_at: DateTime<Utc>,
    /// Rollback statements in execution order.
    pub statements: Vec<RollbackStatement>,
    /// Statements without a rollback.
    pub skipped: Vec<SkippedRollback>,
}

impl RollbackReport {
    /// Orders `set` for execution.
    #[must_use]
    pub fn new(set: RollbackSet) -> Self {
        let statements = set.execution_order().cloned().collect();
        Self {
            generated_at: Utc::now(),
            statements,
            skipped: set.skipped,
        }
    }

    /// The SQL to execute, in order.
    #[must_use]
    pub fn sql(&self) -> Vec<String> {
        self.statements.iter().map(|s| s.sql.clone()).collect()
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RollbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "-- rollback of statement #{}", statement.number)?;
            writeln!(f, "{}", statement.sql)?;
        }
        for skipped in &self.skipped {
            writeln!(
                f,
                "-- statement #{} has no rollback: {}",
                skipped.number, skipped.reason
            )?;
        }
        Ok(())
    }
}

/// The rule registry as a listing.
pub struct RuleListing<'a>(pub &'a [Rule]);

impl fmt::Display for RuleListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.0.iter().map(|r| r.id.len()).max().unwrap_or(0);
        for rule in self.0 {
            write!(
                f,
                "{:<width$}  {:<6}  {:<6}",
                rule.id,
                rule.category.as_str(),
                rule.severity.as_str()
            )?;
            if !rule.value.is_empty() {
                write!(f, "  [{}]", rule.value)?;
            }
            writeln!(f, "  {}", rule.description)?;
        }
        Ok(())
    }
}
