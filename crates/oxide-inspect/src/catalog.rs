//! The virtual catalog.
//!
//! A lazily populated model of the schemas and tables of the target
//! database. Questions are answered from cache when possible and from the
//! [`Probe`] otherwise; statements walked by a session mutate the model
//! locally so later statements see the effect of earlier ones.

use std::collections::BTreeMap;

use oxide_inspect_sql::ast::{
    AlterSpec, AlterTableStatement, CreateTableStatement, TableName, TableOption,
};
use oxide_inspect_sql::{Parser, Statement};
use tracing::debug;

use crate::error::{InspectError, Result};
use crate::merge::merge_alter;
use crate::probe::Probe;

/// What the catalog knows about one table.
#[derive(Debug, Clone, Default)]
pub struct TableInfo {
    size_mb: Option<f64>,
    original: Option<CreateTableStatement>,
    merged: Option<CreateTableStatement>,
    pending_alters: Vec<AlterTableStatement>,
}

impl TableInfo {
    fn created(table: CreateTableStatement) -> Self {
        Self {
            size_mb: Some(0.0),
            original: Some(table),
            merged: None,
            pending_alters: Vec::new(),
        }
    }

    /// Definition last read from the database or created in this batch.
    #[must_use]
    pub const fn original(&self) -> Option<&CreateTableStatement> {
        self.original.as_ref()
    }

    /// Definition after the alters folded so far, if any.
    #[must_use]
    pub const fn merged(&self) -> Option<&CreateTableStatement> {
        self.merged.as_ref()
    }

    /// The definition statements should be checked against.
    #[must_use]
    pub fn effective(&self) -> Option<&CreateTableStatement> {
        self.merged.as_ref().or(self.original.as_ref())
    }

    /// ALTER statements folded into [`Self::merged`].
    #[must_use]
    pub fn pending_alters(&self) -> &[AlterTableStatement] {
        &self.pending_alters
    }
}

/// What the catalog knows about one schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaInfo {
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
    tables: BTreeMap<String, TableInfo>,
    tables_loaded: bool,
}

impl SchemaInfo {
    fn created(options: &[TableOption]) -> Self {
        let mut info = Self {
            tables_loaded: true,
            ..Self::default()
        };
        for option in options {
            match option {
                TableOption::Charset(c) => info.charset = Some(c.clone()),
                TableOption::Collate(c) => info.collation = Some(c.clone()),
                _ => {}
            }
        }
        info
    }

    fn load_tables(&mut self, probe: &mut dyn Probe, schema: &str) -> Result<()> {
        if !self.tables_loaded {
            debug!(schema, "loading table list");
            for table in probe.list_tables(schema)? {
                self.tables.entry(table).or_default();
            }
            self.tables_loaded = true;
        }
        Ok(())
    }
}

/// Which schema default to look up.
#[derive(Debug, Clone, Copy)]
enum SchemaDefault {
    Engine,
    Charset,
    Collation,
}

/// In-memory model of the target database.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    current_schema: String,
    schemas: Option<BTreeMap<String, SchemaInfo>>,
}

impl Catalog {
    /// Creates an empty catalog whose unqualified names resolve in
    /// `current_schema`.
    #[must_use]
    pub fn new(current_schema: impl Into<String>) -> Self {
        Self {
            current_schema: current_schema.into(),
            schemas: None,
        }
    }

    /// Returns an independent copy sharing everything discovered so far.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// The active schema.
    #[must_use]
    pub fn current_schema(&self) -> &str {
        &self.current_schema
    }

    /// Schema a table name resolves in.
    #[must_use]
    pub fn schema_name<'a>(&'a self, table: &'a TableName) -> &'a str {
        table.schema_or(&self.current_schema)
    }

    /// Returns a fully qualified copy of `table`.
    #[must_use]
    pub fn qualify(&self, table: &TableName) -> TableName {
        TableName::qualified(self.schema_name(table), &table.name)
    }

    /// Returns true once the schema list was fetched.
    #[must_use]
    pub const fn schemas_loaded(&self) -> bool {
        self.schemas.is_some()
    }

    fn schemas(&mut self, probe: &mut dyn Probe) -> Result<&mut BTreeMap<String, SchemaInfo>> {
        if self.schemas.is_none() {
            debug!("loading schema list");
            let names = probe.list_schemas()?;
            self.schemas = Some(
                names
                    .into_iter()
                    .map(|name| (name, SchemaInfo::default()))
                    .collect(),
            );
        }
        Ok(self.schemas.get_or_insert_with(BTreeMap::new))
    }

    fn schema_mut(
        &mut self,
        probe: &mut dyn Probe,
        schema: &str,
    ) -> Result<Option<&mut SchemaInfo>> {
        let schemas = self.schemas(probe)?;
        match schemas.get_mut(schema) {
            Some(info) => {
                info.load_tables(probe, schema)?;
                Ok(Some(info))
            }
            None => Ok(None),
        }
    }

    fn table_mut(
        &mut self,
        probe: &mut dyn Probe,
        table: &TableName,
    ) -> Result<Option<&mut TableInfo>> {
        let schema = self.schema_name(table).to_string();
        let Some(info) = self.schema_mut(probe, &schema)? else {
            return Ok(None);
        };
        let Some(entry) = info.tables.get_mut(&table.name) else {
            return Ok(None);
        };
        if entry.original.is_none() {
            debug!(schema = %schema, table = %table.name, "loading table definition");
            let text = probe.show_create_table(&schema, &table.name)?;
            match Parser::new(&text).parse_statement()? {
                Statement::CreateTable(create) => entry.original = Some(create),
                other => {
                    return Err(InspectError::CatalogProbe(format!(
                        "SHOW CREATE TABLE {schema}.{} returned {}",
                        table.name,
                        other.name()
                    )))
                }
            }
        }
        Ok(Some(entry))
    }

    /// Returns true if `schema` exists.
    pub fn schema_exists(&mut self, probe: &mut dyn Probe, schema: &str) -> Result<bool> {
        Ok(self.schemas(probe)?.contains_key(schema))
    }

    /// Returns true if `table` exists.
    pub fn table_exists(&mut self, probe: &mut dyn Probe, table: &TableName) -> Result<bool> {
        let schema = self.schema_name(table).to_string();
        Ok(self
            .schema_mut(probe, &schema)?
            .is_some_and(|info| info.tables.contains_key(&table.name)))
    }

    /// Everything known about `table`, loading its definition if needed.
    pub fn table_info(
        &mut self,
        probe: &mut dyn Probe,
        table: &TableName,
    ) -> Result<Option<&TableInfo>> {
        Ok(self.table_mut(probe, table)?.map(|t| &*t))
    }

    /// The effective definition of `table`: merged when alters were folded,
    /// otherwise the original.
    pub fn create_table(
        &mut self,
        probe: &mut dyn Probe,
        table: &TableName,
    ) -> Result<Option<CreateTableStatement>> {
        Ok(self
            .table_mut(probe, table)?
            .and_then(|t| t.effective().cloned()))
    }

    /// Size of `table` in megabytes, `None` when it does not exist.
    pub fn table_size_mb(&mut self, probe: &mut dyn Probe, table: &TableName) -> Result<Option<f64>> {
        let schema = self.schema_name(table).to_string();
        let Some(info) = self.schema_mut(probe, &schema)? else {
            return Ok(None);
        };
        let Some(entry) = info.tables.get_mut(&table.name) else {
            return Ok(None);
        };
        if let Some(size) = entry.size_mb {
            return Ok(Some(size));
        }
        let size = probe.table_size_mb(&schema, &table.name)?;
        entry.size_mb = Some(size);
        Ok(Some(size))
    }

    fn schema_default(
        &mut self,
        probe: &mut dyn Probe,
        schema: &str,
        which: SchemaDefault,
    ) -> Result<Option<String>> {
        let Some(info) = self.schemas(probe)?.get_mut(schema) else {
            return Ok(None);
        };
        let slot = match which {
            SchemaDefault::Engine => &mut info.engine,
            SchemaDefault::Charset => &mut info.charset,
            SchemaDefault::Collation => &mut info.collation,
        };
        if slot.is_none() {
            let value = match which {
                SchemaDefault::Engine => probe.default_engine(schema)?,
                SchemaDefault::Charset => probe.default_charset(schema)?,
                SchemaDefault::Collation => probe.default_collation(schema)?,
            };
            *slot = Some(value);
        }
        Ok(slot.clone())
    }

    /// Default storage engine of `schema`.
    pub fn default_engine(&mut self, probe: &mut dyn Probe, schema: &str) -> Result<Option<String>> {
        self.schema_default(probe, schema, SchemaDefault::Engine)
    }

    /// Default character set of `schema`.
    pub fn default_charset(&mut self, probe: &mut dyn Probe, schema: &str) -> Result<Option<String>> {
        self.schema_default(probe, schema, SchemaDefault::Charset)
    }

    /// Default collation of `schema`.
    pub fn default_collation(
        &mut self,
        probe: &mut dyn Probe,
        schema: &str,
    ) -> Result<Option<String>> {
        self.schema_default(probe, schema, SchemaDefault::Collation)
    }

    /// Applies the side effects of an executed statement to the model.
    pub fn apply(&mut self, probe: &mut dyn Probe, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Use(stmt) => {
                if self.schema_exists(probe, &stmt.schema)? {
                    self.current_schema.clone_from(&stmt.schema);
                }
            }
            Statement::CreateDatabase(stmt) => {
                let schemas = self.schemas(probe)?;
                if !schemas.contains_key(&stmt.name) {
                    schemas.insert(stmt.name.clone(), SchemaInfo::created(&stmt.options));
                }
            }
            Statement::DropDatabase(stmt) => {
                self.schemas(probe)?.remove(&stmt.name);
            }
            Statement::CreateTable(stmt) => self.apply_create(probe, stmt)?,
            Statement::DropTable(stmt) => {
                for table in &stmt.tables {
                    let schema = self.schema_name(table).to_string();
                    if let Some(info) = self.schema_mut(probe, &schema)? {
                        info.tables.remove(&table.name);
                    }
                }
            }
            Statement::AlterTable(stmt) => self.apply_alter(probe, stmt)?,
            Statement::CreateIndex(stmt) => {
                let alter = AlterTableStatement {
                    table: stmt.table.clone(),
                    specs: vec![AlterSpec::AddConstraint(stmt.index.clone())],
                };
                self.apply_alter(probe, &alter)?;
            }
            Statement::DropIndex(stmt) => {
                let alter = AlterTableStatement {
                    table: stmt.table.clone(),
                    specs: vec![AlterSpec::DropIndex {
                        name: stmt.name.clone(),
                    }],
                };
                self.apply_alter(probe, &alter)?;
            }
            Statement::Select(_)
            | Statement::Insert(_)
            | Statement::Update(_)
            | Statement::Delete(_) => {}
        }
        Ok(())
    }

    fn apply_create(&mut self, probe: &mut dyn Probe, stmt: &CreateTableStatement) -> Result<()> {
        if self.table_exists(probe, &stmt.table)? {
            return Ok(());
        }
        let mut definition = match &stmt.like {
            Some(source) => self
                .create_table(probe, source)?
                .unwrap_or_else(|| CreateTableStatement::new(source.clone())),
            None => stmt.clone(),
        };
        definition.table = stmt.table.clone();
        definition.like = None;
        definition.if_not_exists = false;
        let schema = self.schema_name(&stmt.table).to_string();
        if let Some(info) = self.schema_mut(probe, &schema)? {
            info.tables
                .insert(stmt.table.name.clone(), TableInfo::created(definition));
        }
        Ok(())
    }

    fn apply_alter(&mut self, probe: &mut dyn Probe, alter: &AlterTableStatement) -> Result<()> {
        let Some(entry) = self.table_mut(probe, &alter.table)? else {
            return Ok(());
        };
        let Some(base) = entry.effective().cloned() else {
            return Ok(());
        };
        let outcome = merge_alter(&base, alter);
        let applied = outcome.is_applied();
        entry.merged = Some(outcome.unwrap_or(base));
        entry.pending_alters.push(alter.clone());
        if !applied {
            debug!(table = %alter.table, "alter did not fold, keeping previous definition");
            return Ok(());
        }

        let rename = alter.specs.iter().rev().find_map(|spec| match spec {
            AlterSpec::RenameTable { new_name } => Some(new_name),
            _ => None,
        });
        if let Some(new_name) = rename {
            self.move_table(probe, &alter.table, new_name)?;
        }
        Ok(())
    }

    fn move_table(
        &mut self,
        probe: &mut dyn Probe,
        from: &TableName,
        to: &TableName,
    ) -> Result<()> {
        let from_schema = self.schema_name(from).to_string();
        let to_schema = self.schema_name(to).to_string();
        let Some(entry) = self
            .schema_mut(probe, &from_schema)?
            .and_then(|info| info.tables.remove(&from.name))
        else {
            return Ok(());
        };
        if let Some(info) = self.schema_mut(probe, &to_schema)? {
            info.tables.insert(to.name.clone(), entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::MemoryProbe;

    fn probe() -> MemoryProbe {
        MemoryProbe::new()
            .with_schema_defaults("exist_db", "InnoDB", "utf8mb4", "utf8mb4_general_ci")
            .with_table(
                "exist_db",
                "exist_tb_1",
                "CREATE TABLE `exist_tb_1` (`id` int NOT NULL, `v1` varchar(255), PRIMARY KEY (`id`))",
                2.0,
            )
    }

    fn stmt(sql: &str) -> Statement {
        Parser::new(sql).parse_statement().unwrap()
    }

    fn name(s: &str, t: &str) -> TableName {
        TableName::qualified(s, t)
    }

    #[test]
    fn test_lazy_loading_is_cached() {
        let mut p = probe();
        let mut c = Catalog::new("exist_db");
        assert!(!c.schemas_loaded());
        assert!(c.schema_exists(&mut p, "exist_db").unwrap());
        assert!(c.table_exists(&mut p, &TableName::new("exist_tb_1")).unwrap());
        let calls = p.calls();
        assert!(c.table_exists(&mut p, &name("exist_db", "exist_tb_1")).unwrap());
        assert!(!c.table_exists(&mut p, &name("exist_db", "nope")).unwrap());
        assert!(!c.table_exists(&mut p, &name("nope", "t")).unwrap());
        assert_eq!(p.calls(), calls);
    }

    #[test]
    fn test_definition_and_size() {
        let mut p = probe();
        let mut c = Catalog::new("exist_db");
        let t = c
            .create_table(&mut p, &name("exist_db", "exist_tb_1"))
            .unwrap()
            .unwrap();
        assert_eq!(t.primary_key_columns(), vec!["id"]);
        let size = c
            .table_size_mb(&mut p, &name("exist_db", "exist_tb_1"))
            .unwrap();
        assert_eq!(size, Some(2.0));
        assert_eq!(
            c.default_collation(&mut p, "exist_db").unwrap().as_deref(),
            Some("utf8mb4_general_ci")
        );
        assert_eq!(c.default_engine(&mut p, "nope").unwrap(), None);
    }

    #[test]
    fn test_probe_failure_propagates() {
        let mut p = probe().failing("timeout");
        let mut c = Catalog::new("exist_db");
        assert!(matches!(
            c.schema_exists(&mut p, "exist_db"),
            Err(InspectError::CatalogProbe(_))
        ));
    }

    #[test]
    fn test_use_and_create_database() {
        let mut p = probe();
        let mut c = Catalog::new("exist_db");
        c.apply(&mut p, &stmt("USE nope")).unwrap();
        assert_eq!(c.current_schema(), "exist_db");
        c.apply(&mut p, &stmt("CREATE DATABASE new_db DEFAULT CHARSET utf8"))
            .unwrap();
        c.apply(&mut p, &stmt("USE new_db")).unwrap();
        assert_eq!(c.current_schema(), "new_db");
        assert_eq!(
            c.default_charset(&mut p, "new_db").unwrap().as_deref(),
            Some("utf8")
        );
        c.apply(&mut p, &stmt("DROP DATABASE new_db")).unwrap();
        assert!(!c.schema_exists(&mut p, "new_db").unwrap());
    }

    #[test]
    fn test_create_and_drop_table() {
        let mut p = probe();
        let mut c = Catalog::new("exist_db");
        c.apply(&mut p, &stmt("CREATE TABLE t1 (id int)")).unwrap();
        assert!(c.table_exists(&mut p, &name("exist_db", "t1")).unwrap());
        assert_eq!(c.table_size_mb(&mut p, &name("exist_db", "t1")).unwrap(), Some(0.0));
        c.apply(&mut p, &stmt("CREATE TABLE t2 LIKE exist_tb_1")).unwrap();
        let t2 = c.create_table(&mut p, &TableName::new("t2")).unwrap().unwrap();
        assert_eq!(t2.table.name, "t2");
        assert_eq!(t2.columns.len(), 2);
        c.apply(&mut p, &stmt("DROP TABLE t1, t2")).unwrap();
        assert!(!c.table_exists(&mut p, &TableName::new("t1")).unwrap());
        assert!(!c.table_exists(&mut p, &TableName::new("t2")).unwrap());
    }

    #[test]
    fn test_alter_folds_and_tracks_pending() {
        let mut p = probe();
        let mut c = Catalog::new("exist_db");
        let t = TableName::new("exist_tb_1");
        c.apply(&mut p, &stmt("ALTER TABLE exist_tb_1 ADD COLUMN v2 int"))
            .unwrap();
        c.apply(&mut p, &stmt("ALTER TABLE exist_tb_1 DROP COLUMN nope"))
            .unwrap();
        let info = c.table_info(&mut p, &t).unwrap().unwrap();
        assert_eq!(info.pending_alters().len(), 2);
        assert_eq!(info.merged().unwrap().columns.len(), 3);
        assert_eq!(info.original().unwrap().columns.len(), 2);
    }

    #[test]
    fn test_rename_moves_entry() {
        let mut p = probe();
        let mut c = Catalog::new("exist_db");
        c.apply(&mut p, &stmt("ALTER TABLE exist_tb_1 RENAME TO exist_tb_9"))
            .unwrap();
        assert!(!c.table_exists(&mut p, &TableName::new("exist_tb_1")).unwrap());
        let t = c
            .create_table(&mut p, &TableName::new("exist_tb_9"))
            .unwrap()
            .unwrap();
        assert_eq!(t.table.name, "exist_tb_9");
    }

    #[test]
    fn test_fork_is_independent() {
        let mut p = probe();
        let mut parent = Catalog::new("exist_db");
        assert!(parent.schema_exists(&mut p, "exist_db").unwrap());
        let mut child = parent.fork();
        child.apply(&mut p, &stmt("CREATE TABLE t1 (id int)")).unwrap();
        child.apply(&mut p, &stmt("DROP TABLE exist_tb_1")).unwrap();
        assert!(child.table_exists(&mut p, &TableName::new("t1")).unwrap());
        assert!(!parent.table_exists(&mut p, &TableName::new("t1")).unwrap());
        assert!(parent
            .table_exists(&mut p, &TableName::new("exist_tb_1"))
            .unwrap());
    }

    #[test]
    fn test_index_statements_fold() {
        let mut p = probe();
        let mut c = Catalog::new("exist_db");
        c.apply(&mut p, &stmt("CREATE INDEX idx_v1 ON exist_tb_1 (v1)"))
            .unwrap();
        let t = c
            .create_table(&mut p, &TableName::new("exist_tb_1"))
            .unwrap()
            .unwrap();
        assert!(t.constraint("idx_v1").is_some());
        c.apply(&mut p, &stmt("DROP INDEX idx_v1 ON exist_tb_1")).unwrap();
        let t = c
            .create_table(&mut p, &TableName::new("exist_tb_1"))
            .unwrap()
            .unwrap();
        assert!(t.constraint("idx_v1").is_none());
    }
}
