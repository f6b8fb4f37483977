//! oxide-inspect CLI
//!
//! Command-line tool for auditing SQL change scripts and generating their
//! rollbacks.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_inspect::prelude::*;
use oxide_inspect_sql::split_statements;

/// Audit SQL change scripts against a MySQL database.
#[derive(Parser)]
#[command(name = "oxide-inspect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// MySQL connection URL.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// JSON catalog snapshot to inspect against instead of a live database.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Configuration file.
    #[arg(short, long, default_value = "oxide-inspect.toml")]
    config: PathBuf,

    /// Schema unqualified names resolve in.
    #[arg(short, long)]
    schema: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a SQL script and report findings per statement.
    Audit {
        /// Script to inspect.
        file: PathBuf,

        /// Script already accepted, replayed before inspecting.
        #[arg(long)]
        after: Option<PathBuf>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the statements undoing a SQL script, in execution order.
    Rollback {
        /// Script to roll back.
        file: PathBuf,

        /// Print JSON instead of SQL.
        #[arg(long)]
        json: bool,
    },

    /// Print the fingerprint and signature of a statement.
    Fingerprint {
        /// Statement text.
        sql: String,
    },

    /// List the audit rules.
    Rules {
        /// List every registered rule, not only the configured ones.
        #[arg(long)]
        all: bool,
    },

    /// Execute a SQL script in one transaction.
    Apply {
        /// Script to execute.
        file: PathBuf,

        /// Execute even if the audit reports invalid statements.
        #[arg(long)]
        force: bool,

        /// Audit and print the statements without executing them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Capture a catalog snapshot of the given schemas.
    Snapshot {
        /// Output file.
        output: PathBuf,

        /// Schemas to capture.
        #[arg(required = true)]
        schemas: Vec<String>,
    },
}

/// Reads `path` and splits it into statement texts.
fn read_script(path: &Path) -> anyhow::Result<Vec<String>> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed = split_statements(&script).map_err(|e| {
        let (line, col) = e.span.line_col(&script);
        anyhow!("{}:{line}:{col}: {e}", path.display())
    })?;
    Ok(parsed
        .into_iter()
        .map(|parsed| parsed.text)
        .collect())
}

/// Where and how statements are inspected.
struct Target {
    config: InspectConfig,
    database: Option<String>,
    snapshot: Option<PathBuf>,
    schema: String,
}

impl Target {
    fn probe(&self) -> anyhow::Result<Box<dyn Probe>> {
        if let Some(path) = &self.snapshot {
            info!("Using snapshot {}", path.display());
            return Ok(Box::new(Snapshot::load(path)?.into_probe()));
        }
        match &self.database {
            Some(url) => Ok(Box::new(MySqlProbe::new(url.as_str())?)),
            None => bail!("no database: pass --database, --snapshot or set DATABASE_URL"),
        }
    }

    fn audit(
        &self,
        probe: &mut dyn Probe,
        after: &[String],
        sqls: &[String],
    ) -> Result<AuditReport> {
        let mut session = Session::from_config(Catalog::new(&self.schema), probe, &self.config)?;
        let reports = if after.is_empty() {
            session.inspect(sqls)?
        } else {
            session.inspect_after(after, sqls)?
        };
        Ok(AuditReport::new(&self.schema, reports))
    }

    fn apply(&self, file: &Path, force: bool, dry_run: bool) -> anyhow::Result<()> {
        let Some(url) = self.database.clone() else {
            bail!("apply needs a live database: pass --database or set DATABASE_URL");
        };
        let sqls = read_script(file)?;
        let mut probe = MySqlProbe::new(url.as_str())?;
        let report = self.audit(&mut probe, &[], &sqls);
        probe.close();
        let report = report?;
        if report.has_invalid() {
            if !force {
                println!("{report}");
                bail!("the audit found invalid statements; use --force to execute anyway");
            }
            warn!("Executing despite invalid statements");
        }
        if dry_run {
            info!("Dry run mode - SQL will be printed but not executed.");
            for sql in &sqls {
                println!("{sql};");
            }
            return Ok(());
        }
        let mut execution = MySqlExecution::new(url)?;
        let outcomes = execution.exec_transaction(&sqls);
        execution.close();
        for (sql, outcome) in sqls.iter().zip(outcomes?) {
            println!(" [X] {sql} ({} rows)", outcome.rows_affected);
        }
        info!("Script applied.");
        Ok(())
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = InspectConfig::load(&cli.config)?;
    let target = Target {
        database: cli.database.or_else(|| config.database_url.clone()),
        snapshot: cli.snapshot.or_else(|| config.snapshot.clone()),
        schema: cli
            .schema
            .or_else(|| config.default_schema.clone())
            .unwrap_or_default(),
        config,
    };

    match cli.command {
        Commands::Audit { file, after, json } => {
            let sqls = read_script(&file)?;
            let after = match after {
                Some(path) => read_script(&path)?,
                None => Vec::new(),
            };
            let mut probe = target.probe()?;
            let report = target.audit(probe.as_mut(), &after, &sqls)?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{report}");
            }
            if report.severity == Severity::Error {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Rollback { file, json } => {
            let sqls = read_script(&file)?;
            let mut probe = target.probe()?;
            let mut session = Session::from_config(
                Catalog::new(&target.schema),
                probe.as_mut(),
                &target.config,
            )?;
            let set = session.generate_rollbacks(&sqls)?;
            let report = RollbackReport::new(set);
            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{report}");
            }
        }

        Commands::Fingerprint { sql } => {
            let fp = fingerprint(&sql)?;
            println!("{}", fp.text);
            println!("{}", fp.signature);
        }

        Commands::Rules { all } => {
            let rules = if all { all_rules() } else { target.config.rules()? };
            print!("{}", RuleListing(&rules));
        }

        Commands::Apply {
            file,
            force,
            dry_run,
        } => target.apply(&file, force, dry_run)?,

        Commands::Snapshot { output, schemas } => {
            let mut probe = target.probe()?;
            let snapshot = Snapshot::capture(probe.as_mut(), &schemas);
            probe.close();
            snapshot?.save(&output)?;
            info!("Snapshot written to {}", output.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
