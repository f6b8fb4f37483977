//! SQL change inspection for MySQL.
//!
//! `oxide-inspect` audits SQL change requests before they reach a
//! production database:
//! - Statements are validated against a [`Catalog`](catalog::Catalog), a
//!   lazily loaded model of the target database that is mutated locally as
//!   a batch is walked
//! - A configurable registry of audit [`rules`] checks style and safety
//! - Successive `ALTER TABLE` statements are folded into an effective table
//!   shape by the [`merge`] engine
//! - The [`rollback`] synthesizer produces the statements undoing a batch
//!
//! # Example
//!
//! ```rust
//! use oxide_inspect::prelude::*;
//!
//! let mut probe = MemoryProbe::new().with_table(
//!     "shop",
//!     "orders",
//!     "CREATE TABLE orders (id bigint unsigned NOT NULL AUTO_INCREMENT, PRIMARY KEY (id))",
//!     1.0,
//! );
//! let mut session = Session::new(Catalog::new("shop"), &mut probe, default_rules());
//! let reports = session
//!     .inspect(&["ALTER TABLE orders DROP COLUMN note".to_string()])
//!     .unwrap();
//! assert_eq!(reports[0].status, Status::Invalid);
//! assert!(reports[0].message.contains("column note not exist"));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Audit a script against a live database
//! oxide-inspect --database mysql://audit@db/shop audit change.sql
//!
//! # Audit offline against a snapshot
//! oxide-inspect --snapshot shop.json audit change.sql --json
//!
//! # Print the rollback statements, in execution order
//! oxide-inspect --database mysql://audit@db/shop rollback change.sql
//! ```

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fingerprint;
pub mod merge;
pub mod mysql;
pub mod probe;
pub mod report;
pub mod rollback;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod validate;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{Catalog, TableInfo};
    pub use crate::config::{InspectConfig, RuleConfig};
    pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
    pub use crate::error::{InspectError, Result};
    pub use crate::fingerprint::{fingerprint, Fingerprint};
    pub use crate::merge::{fold, merge_alter, MergeOutcome};
    pub use crate::mysql::{MySqlExecution, MySqlProbe};
    pub use crate::probe::{ExecOutcome, Execution, ExplainRecord, MemoryProbe, Probe, Record};
    pub use crate::report::{AuditReport, RollbackReport, RuleListing};
    pub use crate::rollback::{synthesize, RollbackOutcome};
    pub use crate::rules::{all_rules, default_rules, rules_from_config, Rule, RULE_HANDLERS};
    pub use crate::session::{
        RollbackSet, RollbackStatement, Session, SkippedRollback, StatementReport, Status,
    };
    pub use crate::snapshot::Snapshot;
}
