//! Inspection sessions.
//!
//! A [`Session`] walks one batch of statements against one [`Catalog`].
//! Statements are queued with [`Session::add`] together with the action to
//! run for them; [`Session::run`] executes the actions in order and applies
//! each statement's side effects to the catalog once its action succeeded,
//! so statement N+1 sees the effect of statement N.

use std::collections::HashSet;
use std::mem;

use oxide_inspect_sql::ast::{CreateTableStatement, StatementKind, TableName, TableRef};
use oxide_inspect_sql::{split_statements, Statement};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::InspectConfig;
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::{InspectError, Result};
use crate::fingerprint::fingerprint;
use crate::probe::{ExplainRecord, Probe};
use crate::rollback::{self, RollbackOutcome};
use crate::rules::{self, Rule, DDL_OSC_MIN_SIZE, DML_ROLLBACK_MAX_ROWS};
use crate::validate::{self, TableChecker};

/// One submitted piece of SQL and the statements it parsed into.
#[derive(Debug, Clone)]
pub struct SqlItem {
    /// Position in the batch, starting at 1.
    pub number: usize,
    /// Source text.
    pub text: String,
    /// Parsed statements.
    pub statements: Vec<Statement>,
}

/// Action run for a queued item.
pub type Action<'p> = Box<dyn FnOnce(&mut Session<'p>, &SqlItem) -> Result<()> + 'p>;

/// Outcome of inspecting one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Inspected.
    Done,
    /// The base validity gate failed.
    Invalid,
}

/// Inspection result for one submitted statement.
#[derive(Debug, Clone, Serialize)]
pub struct StatementReport {
    /// Position in the batch, starting at 1.
    pub number: usize,
    /// Source text.
    pub sql: String,
    /// Outcome.
    pub status: Status,
    /// Worst severity reported.
    pub severity: Severity,
    /// All diagnostics, one per line.
    pub message: String,
    /// Fingerprint signature, when the statement could be fingerprinted.
    pub fingerprint: Option<String>,
}

/// A rollback statement, numbered after the statement it undoes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackStatement {
    /// Number of the statement it undoes.
    pub number: usize,
    /// The rollback SQL.
    pub sql: String,
}

/// A statement no rollback could be produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRollback {
    /// Number of the statement.
    pub number: usize,
    /// Why no rollback was produced.
    pub reason: String,
}

/// Rollbacks for a batch, in forward statement order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RollbackSet {
    /// Rollback statements; execute them in reverse order.
    pub statements: Vec<RollbackStatement>,
    /// Statements without a rollback.
    pub skipped: Vec<SkippedRollback>,
}

impl RollbackSet {
    /// Rollback statements in execution order.
    pub fn execution_order(&self) -> impl Iterator<Item = &RollbackStatement> {
        self.statements.iter().rev()
    }
}

/// An inspection session over one batch.
pub struct Session<'p> {
    catalog: Catalog,
    probe: &'p mut dyn Probe,
    rules: Vec<Rule>,
    whitelist: HashSet<String>,
    queue: Vec<(SqlItem, Action<'p>)>,
    ddl_count: usize,
    dml_count: usize,
    results: Diagnostics,
    current_rule: Option<Rule>,
    statement_invalid: bool,
    base_invalid: bool,
    reports: Vec<StatementReport>,
    rollbacks: RollbackSet,
}

impl<'p> Session<'p> {
    /// Creates a session evaluating `rules`.
    pub fn new(catalog: Catalog, probe: &'p mut dyn Probe, rules: Vec<Rule>) -> Self {
        Self {
            catalog,
            probe,
            rules,
            whitelist: HashSet::new(),
            queue: Vec::new(),
            ddl_count: 0,
            dml_count: 0,
            results: Diagnostics::new(),
            current_rule: None,
            statement_invalid: false,
            base_invalid: false,
            reports: Vec::new(),
            rollbacks: RollbackSet::default(),
        }
    }

    /// Creates a session from configuration: rules and whitelist.
    pub fn from_config(
        catalog: Catalog,
        probe: &'p mut dyn Probe,
        config: &InspectConfig,
    ) -> Result<Self> {
        let rules = config.rules()?;
        Ok(Self::new(catalog, probe, rules).with_whitelist(config.whitelist_signatures()))
    }

    /// Statements whose fingerprint signature is in `signatures` skip rule
    /// evaluation.
    #[must_use]
    pub fn with_whitelist<I, S>(mut self, signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist.extend(signatures.into_iter().map(Into::into));
        self
    }

    /// The rules evaluated by this session.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The catalog in its current state.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Consumes the session, returning its catalog.
    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// True once any inspected statement failed the base validity gate.
    #[must_use]
    pub const fn base_invalid(&self) -> bool {
        self.base_invalid
    }

    /// True while rules run for a statement that failed the base gate.
    #[must_use]
    pub const fn statement_invalid(&self) -> bool {
        self.statement_invalid
    }

    /// Parses `sql` and queues it with `action`.
    ///
    /// A statement that does not parse discards the whole queue.
    pub fn add<F>(&mut self, sql: &str, action: F) -> Result<()>
    where
        F: FnOnce(&mut Session<'p>, &SqlItem) -> Result<()> + 'p,
    {
        let parsed = match split_statements(sql) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.discard_queue();
                return Err(e.into());
            }
        };
        let statements: Vec<Statement> = parsed.into_iter().map(|p| p.statement).collect();
        for statement in &statements {
            match statement.kind() {
                StatementKind::Ddl => self.ddl_count += 1,
                StatementKind::Dml => self.dml_count += 1,
                StatementKind::Other => {}
            }
        }
        let item = SqlItem {
            number: self.queue.len() + 1,
            text: sql.trim().to_string(),
            statements,
        };
        self.queue.push((item, Box::new(action)));
        Ok(())
    }

    /// Runs every queued action in order, then releases the probe.
    pub fn run(&mut self) -> Result<()> {
        let result = self.run_queue();
        self.probe.close();
        result
    }

    fn discard_queue(&mut self) {
        self.queue.clear();
        self.ddl_count = 0;
        self.dml_count = 0;
    }

    /// Queues every statement of `sqls` with `action` and runs the queue.
    /// The probe is released once, whether the batch completes or not.
    fn run_batch<F>(&mut self, sqls: &[String], action: F) -> Result<()>
    where
        F: Fn(&mut Session<'p>, &SqlItem) -> Result<()> + Copy + 'p,
    {
        let result = sqls
            .iter()
            .try_for_each(|sql| self.add(sql, action))
            .and_then(|()| self.run_queue());
        self.probe.close();
        result
    }

    fn run_queue(&mut self) -> Result<()> {
        let queue = mem::take(&mut self.queue);
        let (ddl, dml) = (mem::take(&mut self.ddl_count), mem::take(&mut self.dml_count));
        if ddl > 0 && dml > 0 {
            warn!(ddl, dml, "Refusing mixed batch");
            return Err(InspectError::StatementKindConflict);
        }
        for (item, action) in queue {
            debug!(number = item.number, sql = %item.text, "Running statement");
            action(self, &item)?;
            for statement in &item.statements {
                self.catalog.apply(&mut *self.probe, statement)?;
            }
        }
        Ok(())
    }

    /// Runs the base validity gate for one statement.
    pub fn check(&mut self, statement: &Statement) -> Result<Diagnostics> {
        validate::check(&mut self.catalog, &mut *self.probe, statement)
    }

    /// Reports `rule_id` for the statement being inspected.
    ///
    /// Ignored unless `rule_id` is the rule currently evaluated. A message
    /// already reported for the statement is not repeated.
    pub fn add_result(&mut self, rule_id: &str) {
        self.add_result_with(rule_id, &[]);
    }

    /// Like [`Self::add_result`], filling the message from `args`.
    pub fn add_result_with(&mut self, rule_id: &str, args: &[String]) {
        let Some(rule) = &self.current_rule else {
            return;
        };
        if rule.id != rule_id {
            return;
        }
        let Some(handler) = rules::handler(rule_id) else {
            return;
        };
        let message = handler.format_message(rule, args);
        if self.results.entries().iter().any(|d| d.message == message) {
            return;
        }
        self.results.add(rule.severity, message);
    }

    /// Schema `table` lives in.
    #[must_use]
    pub fn schema_name(&self, table: &TableName) -> String {
        self.catalog.schema_name(table).to_string()
    }

    /// Effective definition of `table`.
    pub fn create_table(&mut self, table: &TableName) -> Result<Option<CreateTableStatement>> {
        self.catalog.create_table(&mut *self.probe, table)
    }

    /// Number of ALTER statements already folded into `table` in this batch.
    pub fn pending_alter_count(&mut self, table: &TableName) -> Result<usize> {
        Ok(self
            .catalog
            .table_info(&mut *self.probe, table)?
            .map_or(0, |info| info.pending_alters().len()))
    }

    /// Default engine of `schema`.
    pub fn default_engine(&mut self, schema: &str) -> Result<Option<String>> {
        self.catalog.default_engine(&mut *self.probe, schema)
    }

    /// Default character set of `schema`.
    pub fn default_charset(&mut self, schema: &str) -> Result<Option<String>> {
        self.catalog.default_charset(&mut *self.probe, schema)
    }

    /// Default collation of `schema`.
    pub fn default_collation(&mut self, schema: &str) -> Result<Option<String>> {
        self.catalog.default_collation(&mut *self.probe, schema)
    }

    /// Column resolver for the tables of `from`.
    pub fn table_checker(&mut self, from: &TableRef) -> Result<TableChecker> {
        TableChecker::build(&mut self.catalog, &mut *self.probe, from)
    }

    /// Runs EXPLAIN for `sql`.
    pub fn explain(&mut self, sql: &str) -> Result<Vec<ExplainRecord>> {
        self.probe.explain(sql)
    }

    fn rule_value<T>(&self, id: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        rules::find(&self.rules, id)
            .map(|rule| rule.parse_value())
            .transpose()
    }

    /// Audits `sqls`: base validity gate, rules and advisories per
    /// statement.
    pub fn inspect(&mut self, sqls: &[String]) -> Result<Vec<StatementReport>> {
        info!(statements = sqls.len(), rules = self.rules.len(), "Inspecting batch");
        self.run_batch(sqls, |session: &mut Session<'p>, item: &SqlItem| {
            session.inspect_item(item)
        })?;
        info!(base_invalid = self.base_invalid, "Inspection finished");
        Ok(mem::take(&mut self.reports))
    }

    /// Audits `sqls` after replaying `related`, an earlier batch that has
    /// not been executed yet.
    ///
    /// The replay runs on a forked catalog without rules. While it fails
    /// the base validity gate it is retried without its first statement;
    /// the first replay that validates is adopted.
    pub fn inspect_after(
        &mut self,
        related: &[String],
        sqls: &[String],
    ) -> Result<Vec<StatementReport>> {
        if let Err(e) = self.replay(related) {
            self.probe.close();
            return Err(e);
        }
        self.inspect(sqls)
    }

    fn replay(&mut self, related: &[String]) -> Result<()> {
        let mut related = related.to_vec();
        while !related.is_empty() {
            let mut replay = Session::new(self.catalog.fork(), &mut *self.probe, Vec::new());
            for sql in &related {
                replay.add(sql, |session: &mut Session<'_>, item: &SqlItem| {
                    session.gate(item).map(|_| ())
                })?;
            }
            replay.run_queue()?;
            if replay.base_invalid {
                debug!(remaining = related.len() - 1, "Related batch invalid, retrying");
                related.remove(0);
                continue;
            }
            self.catalog = replay.into_catalog();
            break;
        }
        Ok(())
    }

    /// Synthesizes rollback statements for `sqls`.
    pub fn generate_rollbacks(&mut self, sqls: &[String]) -> Result<RollbackSet> {
        info!(statements = sqls.len(), "Generating rollbacks");
        self.run_batch(sqls, |session: &mut Session<'p>, item: &SqlItem| {
            session.rollback_item(item)
        })?;
        Ok(mem::take(&mut self.rollbacks))
    }

    fn gate(&mut self, item: &SqlItem) -> Result<Diagnostics> {
        let mut out = Diagnostics::new();
        let mut invalid = false;
        for statement in &item.statements {
            let diagnostics = self.check(statement)?;
            invalid |= diagnostics.severity() == Severity::Error;
            out.extend(diagnostics);
        }
        if invalid {
            warn!(number = item.number, "Statement failed the base validity gate");
            self.base_invalid = true;
        }
        self.statement_invalid = invalid;
        Ok(out)
    }

    fn inspect_item(&mut self, item: &SqlItem) -> Result<()> {
        let signature = match fingerprint(&item.text) {
            Ok(f) => Some(f.signature),
            Err(e) => {
                warn!(number = item.number, error = %e, "Cannot fingerprint statement");
                None
            }
        };
        let whitelisted = signature
            .as_ref()
            .is_some_and(|s| self.whitelist.contains(s));

        let base = self.gate(item)?;
        let status = if self.statement_invalid {
            Status::Invalid
        } else {
            Status::Done
        };

        if whitelisted {
            debug!(number = item.number, "Statement is whitelisted");
            self.reports.push(StatementReport {
                number: item.number,
                sql: item.text.clone(),
                status: Status::Done,
                severity: Severity::Normal,
                message: "whitelisted".to_string(),
                fingerprint: signature,
            });
            return Ok(());
        }

        self.results = base;
        let rules = self.rules.clone();
        let evaluated = self.evaluate_rules(&rules, item);
        self.current_rule = None;
        self.statement_invalid = false;
        let mut diagnostics = mem::take(&mut self.results);
        evaluated?;

        if let Some(advice) = self.osc_advice(item)? {
            diagnostics.add(Severity::Normal, advice);
        }

        self.reports.push(StatementReport {
            number: item.number,
            sql: item.text.clone(),
            status,
            severity: diagnostics.severity(),
            message: diagnostics.message(),
            fingerprint: signature,
        });
        Ok(())
    }

    fn evaluate_rules(&mut self, rules: &[Rule], item: &SqlItem) -> Result<()> {
        for rule in rules {
            let Some(check) = rules::handler(&rule.id).and_then(|h| h.check) else {
                continue;
            };
            self.current_rule = Some(rule.clone());
            for statement in &item.statements {
                debug!(rule = %rule.id, number = item.number, "Evaluating rule");
                check(self, rule, statement)?;
            }
        }
        Ok(())
    }

    fn osc_advice(&mut self, item: &SqlItem) -> Result<Option<String>> {
        let Some(Statement::AlterTable(alter)) = item.statements.first() else {
            return Ok(None);
        };
        let Some(min_size) = self.rule_value::<f64>(DDL_OSC_MIN_SIZE)? else {
            return Ok(None);
        };
        let Some(size) = self.catalog.table_size_mb(&mut *self.probe, &alter.table)? else {
            return Ok(None);
        };
        if size < min_size {
            return Ok(None);
        }
        Ok(Some(format!(
            "[osc]table size is {size} MB, consider an online schema change tool"
        )))
    }

    fn rollback_item(&mut self, item: &SqlItem) -> Result<()> {
        let max_rows = self.rule_value::<u64>(DML_ROLLBACK_MAX_ROWS)?;
        for statement in &item.statements {
            let outcome =
                rollback::synthesize(&mut self.catalog, &mut *self.probe, statement, max_rows)?;
            match outcome {
                RollbackOutcome::Statement(sql) => {
                    debug!(number = item.number, "Rollback generated");
                    self.rollbacks.statements.push(RollbackStatement {
                        number: item.number,
                        sql,
                    });
                }
                RollbackOutcome::Unsupported(reason) => {
                    warn!(number = item.number, %reason, "Rollback skipped");
                    self.rollbacks.skipped.push(SkippedRollback {
                        number: item.number,
                        reason,
                    });
                }
                RollbackOutcome::Nothing => {}
            }
        }
        Ok(())
    }
}
