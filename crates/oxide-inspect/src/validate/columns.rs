//! Column resolution across the tables of one DML statement.

use std::collections::BTreeMap;

use oxide_inspect_sql::ast::{ColumnRef, CreateTableStatement, TableRef};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::probe::Probe;

/// How a column reference resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one table has it, or it cannot be judged.
    Found,
    /// No table in scope has it.
    NotFound,
    /// More than one table in scope has it.
    Ambiguous,
}

/// Tables in scope of one statement, keyed by schema and then by alias or
/// table name (lowercased).
#[derive(Debug, Default)]
pub struct TableChecker {
    tables: BTreeMap<String, BTreeMap<String, CreateTableStatement>>,
    derived: Vec<String>,
    aliases: Vec<String>,
}

impl TableChecker {
    /// Builds a checker for the base tables of `from`.
    ///
    /// Tables missing from the catalog are left out; their absence is
    /// reported by the existence checks.
    pub fn build(catalog: &mut Catalog, probe: &mut dyn Probe, from: &TableRef) -> Result<Self> {
        let mut checker = Self::default();
        for (name, alias) in from.base_tables() {
            let schema = catalog.schema_name(name).to_string();
            let Some(definition) = catalog.create_table(probe, name)? else {
                continue;
            };
            let key = alias.unwrap_or(&name.name).to_ascii_lowercase();
            checker
                .tables
                .entry(schema)
                .or_default()
                .insert(key, definition);
        }
        checker.derived = from
            .derived_aliases()
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect();
        Ok(checker)
    }

    /// Names (projection aliases) that resolve without a table.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|a| a.as_ref().to_ascii_lowercase()));
        self
    }

    /// Number of tables in scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    /// Returns true when no table definition is in scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All definitions in scope.
    pub fn definitions(&self) -> impl Iterator<Item = &CreateTableStatement> {
        self.tables.values().flat_map(BTreeMap::values)
    }

    /// The definition a qualifier (alias or table name) refers to.
    #[must_use]
    pub fn definition(&self, qualifier: &str) -> Option<&CreateTableStatement> {
        let key = qualifier.to_ascii_lowercase();
        self.tables.values().find_map(|tables| tables.get(&key))
    }

    /// Resolves a column reference.
    #[must_use]
    pub fn resolve(&self, column: &ColumnRef) -> Resolution {
        let Some(table) = &column.table else {
            if self.aliases.contains(&column.name.to_ascii_lowercase()) {
                return Resolution::Found;
            }
            if !self.derived.is_empty() {
                return Resolution::Found;
            }
            return Self::count(self.definitions(), &column.name);
        };

        let key = table.to_ascii_lowercase();
        if column.schema.is_none() && self.derived.contains(&key) {
            return Resolution::Found;
        }
        match &column.schema {
            Some(schema) => match self.tables.get(schema).and_then(|t| t.get(&key)) {
                Some(definition) if definition.column(&column.name).is_some() => {
                    Resolution::Found
                }
                _ => Resolution::NotFound,
            },
            None => Self::count(
                self.tables.values().filter_map(|t| t.get(&key)),
                &column.name,
            ),
        }
    }

    fn count<'a>(
        definitions: impl Iterator<Item = &'a CreateTableStatement>,
        name: &str,
    ) -> Resolution {
        match definitions.filter(|d| d.column(name).is_some()).count() {
            0 => Resolution::NotFound,
            1 => Resolution::Found,
            _ => Resolution::Ambiguous,
        }
    }
}

/// Renders a column reference the way it was written.
#[must_use]
pub fn display_column(column: &ColumnRef) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(3);
    if let Some(schema) = &column.schema {
        parts.push(schema);
    }
    if let Some(table) = &column.table {
        parts.push(table);
    }
    parts.push(&column.name);
    parts.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::MemoryProbe;
    use oxide_inspect_sql::{Parser, Statement};

    fn probe() -> MemoryProbe {
        MemoryProbe::new()
            .with_table("db", "t1", "CREATE TABLE t1 (id int, x int, a int)", 0.0)
            .with_table("db", "t2", "CREATE TABLE t2 (id int, x int, b int)", 0.0)
            .with_table("other", "t1", "CREATE TABLE t1 (id int, z int)", 0.0)
    }

    fn checker(sql: &str) -> TableChecker {
        let Statement::Select(select) = Parser::new(sql).parse_statement().unwrap() else {
            panic!("Expected SELECT");
        };
        let mut p = probe();
        let mut c = Catalog::new("db");
        TableChecker::build(&mut c, &mut p, select.from.as_ref().unwrap()).unwrap()
    }

    fn col(table: Option<&str>, name: &str) -> ColumnRef {
        ColumnRef {
            schema: None,
            table: table.map(str::to_string),
            name: name.into(),
        }
    }

    #[test]
    fn test_unqualified_resolution() {
        let c = checker("SELECT 1 FROM t1 JOIN t2 ON t1.id = t2.id");
        assert_eq!(c.len(), 2);
        assert_eq!(c.resolve(&col(None, "a")), Resolution::Found);
        assert_eq!(c.resolve(&col(None, "x")), Resolution::Ambiguous);
        assert_eq!(c.resolve(&col(None, "nope")), Resolution::NotFound);
    }

    #[test]
    fn test_alias_resolution() {
        let c = checker("SELECT 1 FROM t1 AS p JOIN t2 q ON p.id = q.id");
        assert_eq!(c.resolve(&col(Some("p"), "x")), Resolution::Found);
        assert_eq!(c.resolve(&col(Some("P"), "a")), Resolution::Found);
        assert_eq!(c.resolve(&col(Some("q"), "a")), Resolution::NotFound);
        assert_eq!(c.resolve(&col(Some("t1"), "a")), Resolution::NotFound);
    }

    #[test]
    fn test_schema_qualified() {
        let c = checker("SELECT 1 FROM db.t1 JOIN other.t1 AS o ON t1.id = o.id");
        let mut qualified = col(Some("o"), "z");
        qualified.schema = Some("other".into());
        assert_eq!(c.resolve(&qualified), Resolution::Found);
        qualified.schema = Some("db".into());
        assert_eq!(c.resolve(&qualified), Resolution::NotFound);
    }

    #[test]
    fn test_derived_tables_are_opaque() {
        let c = checker("SELECT 1 FROM (SELECT 1 AS k) d JOIN t1 ON d.k = t1.id");
        assert_eq!(c.resolve(&col(None, "anything")), Resolution::Found);
        assert_eq!(c.resolve(&col(Some("d"), "k")), Resolution::Found);
        assert_eq!(c.resolve(&col(Some("t1"), "nope")), Resolution::NotFound);
    }

    #[test]
    fn test_projection_aliases() {
        let c = checker("SELECT 1 FROM t1").with_aliases(["total"]);
        assert_eq!(c.resolve(&col(None, "TOTAL")), Resolution::Found);
    }

    #[test]
    fn test_display_column() {
        assert_eq!(display_column(&col(Some("t1"), "id")), "t1.id");
        assert_eq!(display_column(&col(None, "id")), "id");
    }
}
