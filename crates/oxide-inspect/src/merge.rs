//! Folding ALTER TABLE specs into a CREATE TABLE definition.
//!
//! Specs are applied in statement order on a working copy. A spec that
//! references something missing, or would create a duplicate, abandons the
//! whole statement and the caller keeps the definition it started from.

use oxide_inspect_sql::ast::{
    AlterSpec, AlterTableStatement, ColumnDef, ColumnOption, ColumnPosition, ConstraintKind,
    CreateTableStatement, TableConstraint, TableOption,
};

/// Result of folding one ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Every spec applied; the new effective definition.
    Applied(CreateTableStatement),
    /// Some spec was inapplicable; the input definition stands.
    Unchanged,
}

impl MergeOutcome {
    /// Returns true for [`MergeOutcome::Applied`].
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The merged definition, or `base` when unchanged.
    #[must_use]
    pub fn unwrap_or(self, base: CreateTableStatement) -> CreateTableStatement {
        match self {
            Self::Applied(table) => table,
            Self::Unchanged => base,
        }
    }
}

/// Folds all specs of `alter` onto `table`.
#[must_use]
pub fn merge_alter(table: &CreateTableStatement, alter: &AlterTableStatement) -> MergeOutcome {
    merge_specs(table, &alter.specs)
}

/// Folds `specs` onto `table`.
#[must_use]
pub fn merge_specs(table: &CreateTableStatement, specs: &[AlterSpec]) -> MergeOutcome {
    let mut working = table.clone();
    for spec in specs {
        if apply_spec(&mut working, spec).is_none() {
            return MergeOutcome::Unchanged;
        }
    }
    MergeOutcome::Applied(working)
}

/// Folds a sequence of statements, skipping those that do not apply.
#[must_use]
pub fn fold<'a, I>(table: &CreateTableStatement, alters: I) -> CreateTableStatement
where
    I: IntoIterator<Item = &'a AlterTableStatement>,
{
    alters
        .into_iter()
        .fold(table.clone(), |acc, alter| match merge_alter(&acc, alter) {
            MergeOutcome::Applied(next) => next,
            MergeOutcome::Unchanged => acc,
        })
}

fn column_index(table: &CreateTableStatement, name: &str) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(name))
}

fn constraint_index(table: &CreateTableStatement, name: &str) -> Option<usize> {
    table.constraints.iter().position(|c| {
        c.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    })
}

fn place(
    table: &mut CreateTableStatement,
    column: ColumnDef,
    position: Option<&ColumnPosition>,
    fallback: usize,
) -> Option<()> {
    let index = match position {
        None => fallback.min(table.columns.len()),
        Some(ColumnPosition::First) => 0,
        Some(ColumnPosition::After(name)) => column_index(table, name)? + 1,
    };
    table.columns.insert(index, column);
    Some(())
}

fn rename_index_columns(table: &mut CreateTableStatement, old: &str, new: &str) {
    for constraint in &mut table.constraints {
        for column in &mut constraint.columns {
            if column.name.eq_ignore_ascii_case(old) {
                column.name = new.to_string();
            }
        }
    }
}

fn same_option(a: &TableOption, b: &TableOption) -> bool {
    match (a, b) {
        (TableOption::Other { name: x, .. }, TableOption::Other { name: y, .. }) => {
            x.eq_ignore_ascii_case(y)
        }
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

fn add_constraint(table: &mut CreateTableStatement, constraint: &TableConstraint) -> Option<()> {
    if constraint.kind == ConstraintKind::PrimaryKey && table.has_primary_key() {
        return None;
    }
    if let Some(name) = &constraint.name {
        if table.constraint(name).is_some() {
            return None;
        }
    }
    table.constraints.push(constraint.clone());
    Some(())
}

fn drop_primary_key(table: &mut CreateTableStatement) -> Option<()> {
    if let Some(i) = table
        .constraints
        .iter()
        .position(|c| c.kind == ConstraintKind::PrimaryKey)
    {
        table.constraints.remove(i);
        return Some(());
    }
    let column = table.columns.iter_mut().find(|c| c.is_primary_key())?;
    column.options.retain(|o| *o != ColumnOption::PrimaryKey);
    Some(())
}

fn apply_spec(table: &mut CreateTableStatement, spec: &AlterSpec) -> Option<()> {
    match spec {
        AlterSpec::TableOptions(options) => {
            for option in options {
                match table.options.iter().position(|o| same_option(o, option)) {
                    Some(i) => table.options[i] = option.clone(),
                    None => table.options.push(option.clone()),
                }
            }
        }
        AlterSpec::AddColumns { columns, position } => {
            for (offset, column) in columns.iter().enumerate() {
                if column_index(table, &column.name).is_some() {
                    return None;
                }
                if column.is_primary_key() && table.has_primary_key() {
                    return None;
                }
                let position = if columns.len() == 1 {
                    position.as_ref()
                } else {
                    None
                };
                let fallback = table.columns.len() + offset;
                place(table, column.clone(), position, fallback)?;
            }
        }
        AlterSpec::AddConstraint(constraint) => add_constraint(table, constraint)?,
        AlterSpec::DropColumn { name } => {
            let i = column_index(table, name)?;
            table.columns.remove(i);
        }
        AlterSpec::DropPrimaryKey => drop_primary_key(table)?,
        AlterSpec::DropIndex { name } => {
            if name.eq_ignore_ascii_case("PRIMARY") {
                return drop_primary_key(table);
            }
            let i = constraint_index(table, name)?;
            if table.constraints[i].kind == ConstraintKind::ForeignKey {
                return None;
            }
            table.constraints.remove(i);
        }
        AlterSpec::DropForeignKey { name } => {
            let i = constraint_index(table, name)?;
            if table.constraints[i].kind != ConstraintKind::ForeignKey {
                return None;
            }
            table.constraints.remove(i);
        }
        AlterSpec::ModifyColumn { column, position } => {
            let i = column_index(table, &column.name)?;
            table.columns.remove(i);
            place(table, column.clone(), position.as_ref(), i)?;
        }
        AlterSpec::ChangeColumn {
            old_name,
            column,
            position,
        } => {
            let i = column_index(table, old_name)?;
            if !column.name.eq_ignore_ascii_case(old_name)
                && column_index(table, &column.name).is_some()
            {
                return None;
            }
            table.columns.remove(i);
            place(table, column.clone(), position.as_ref(), i)?;
            rename_index_columns(table, old_name, &column.name);
        }
        AlterSpec::AlterColumnDefault { name, default } => {
            let i = column_index(table, name)?;
            table.columns[i].set_default(default.clone());
        }
        AlterSpec::RenameTable { new_name } => table.table = new_name.clone(),
        AlterSpec::RenameIndex { old_name, new_name } => {
            let i = constraint_index(table, old_name)?;
            if !old_name.eq_ignore_ascii_case(new_name) && table.constraint(new_name).is_some() {
                return None;
            }
            table.constraints[i].name = Some(new_name.clone());
        }
        AlterSpec::RenameColumn { old_name, new_name } => {
            let i = column_index(table, old_name)?;
            if !old_name.eq_ignore_ascii_case(new_name) && column_index(table, new_name).is_some()
            {
                return None;
            }
            table.columns[i].name.clone_from(new_name);
            rename_index_columns(table, old_name, new_name);
        }
        AlterSpec::Partition(_) => {}
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_inspect_sql::{Parser, Statement};

    fn create(sql: &str) -> CreateTableStatement {
        match Parser::new(sql).parse_statement().unwrap() {
            Statement::CreateTable(c) => c,
            other => panic!("Expected CREATE TABLE, got {other}"),
        }
    }

    fn alter(sql: &str) -> AlterTableStatement {
        match Parser::new(sql).parse_statement().unwrap() {
            Statement::AlterTable(a) => a,
            other => panic!("Expected ALTER TABLE, got {other}"),
        }
    }

    fn base() -> CreateTableStatement {
        create(
            "CREATE TABLE t (id int NOT NULL AUTO_INCREMENT, v1 varchar(255) DEFAULT 'v1', \
             v2 varchar(255), PRIMARY KEY (id), KEY idx_1 (v1), UNIQUE KEY uniq_1 (v1, v2))",
        )
    }

    fn names(table: &CreateTableStatement) -> Vec<&str> {
        table.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn applied(outcome: MergeOutcome) -> CreateTableStatement {
        match outcome {
            MergeOutcome::Applied(t) => t,
            MergeOutcome::Unchanged => panic!("Expected the alter to apply"),
        }
    }

    #[test]
    fn test_add_and_drop_columns() {
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t ADD COLUMN v3 int, DROP COLUMN v2"),
        ));
        assert_eq!(names(&t), vec!["id", "v1", "v3"]);
    }

    #[test]
    fn test_add_column_positions() {
        let t = applied(merge_alter(&base(), &alter("ALTER TABLE t ADD COLUMN a int FIRST")));
        assert_eq!(names(&t), vec!["a", "id", "v1", "v2"]);
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t ADD COLUMN a int AFTER id"),
        ));
        assert_eq!(names(&t), vec!["id", "a", "v1", "v2"]);
    }

    #[test]
    fn test_missing_column_aborts() {
        for sql in [
            "ALTER TABLE t DROP COLUMN nope",
            "ALTER TABLE t MODIFY COLUMN nope int",
            "ALTER TABLE t CHANGE COLUMN nope x int",
            "ALTER TABLE t ALTER COLUMN nope SET DEFAULT 1",
            "ALTER TABLE t ADD COLUMN v1 int",
            "ALTER TABLE t DROP INDEX nope",
            "ALTER TABLE t RENAME INDEX nope TO idx_9",
            "ALTER TABLE t ADD PRIMARY KEY (v1)",
            "ALTER TABLE t ADD INDEX idx_1 (v2)",
            "ALTER TABLE t ADD COLUMN a int, DROP COLUMN a, DROP COLUMN a",
        ] {
            assert_eq!(merge_alter(&base(), &alter(sql)), MergeOutcome::Unchanged, "{sql}");
        }
    }

    #[test]
    fn test_change_renames_index_columns() {
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t CHANGE COLUMN v1 v9 varchar(64)"),
        ));
        assert_eq!(names(&t), vec!["id", "v9", "v2"]);
        assert_eq!(t.constraint("idx_1").unwrap().column_names(), vec!["v9"]);
        assert_eq!(t.constraint("uniq_1").unwrap().column_names(), vec!["v9", "v2"]);
    }

    #[test]
    fn test_modify_keeps_place() {
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t MODIFY COLUMN v1 text"),
        ));
        assert_eq!(names(&t), vec!["id", "v1", "v2"]);
        assert_eq!(t.columns[1].data_type.to_string(), "text");
    }

    #[test]
    fn test_default_changes() {
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t ALTER COLUMN v1 DROP DEFAULT, ALTER COLUMN v2 SET DEFAULT 'x'"),
        ));
        assert!(t.columns[1].default_value().is_none());
        assert!(t.columns[2].default_value().is_some());
    }

    #[test]
    fn test_primary_key_cycle() {
        let t = applied(merge_alter(&base(), &alter("ALTER TABLE t DROP PRIMARY KEY")));
        assert!(!t.has_primary_key());
        assert_eq!(
            merge_alter(&t, &alter("ALTER TABLE t DROP PRIMARY KEY")),
            MergeOutcome::Unchanged
        );
        let t = applied(merge_alter(&t, &alter("ALTER TABLE t ADD PRIMARY KEY (v1)")));
        assert_eq!(t.primary_key_columns(), vec!["v1"]);
    }

    #[test]
    fn test_inline_primary_key_dropped() {
        let t = create("CREATE TABLE t (id int PRIMARY KEY, v int)");
        let t = applied(merge_alter(&t, &alter("ALTER TABLE t DROP PRIMARY KEY")));
        assert!(!t.has_primary_key());
    }

    #[test]
    fn test_index_rename_and_drop() {
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t RENAME INDEX idx_1 TO idx_2, DROP INDEX uniq_1"),
        ));
        assert!(t.constraint("idx_2").is_some());
        assert!(t.constraint("idx_1").is_none());
        assert!(t.constraint("uniq_1").is_none());
    }

    #[test]
    fn test_rename_table_and_options() {
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t RENAME TO db.t2, ENGINE=MyISAM, COMMENT='x'"),
        ));
        assert_eq!(t.table.name, "t2");
        assert_eq!(t.engine(), Some("MyISAM"));
        assert_eq!(t.comment(), Some("x"));
        let t = applied(merge_alter(&t, &alter("ALTER TABLE t ENGINE=InnoDB")));
        assert_eq!(t.engine(), Some("InnoDB"));
        assert_eq!(t.options.len(), 2);
    }

    #[test]
    fn test_foreign_keys() {
        let t = applied(merge_alter(
            &base(),
            &alter("ALTER TABLE t ADD CONSTRAINT fk_1 FOREIGN KEY (v1) REFERENCES u (id)"),
        ));
        assert_eq!(
            merge_alter(&t, &alter("ALTER TABLE t DROP INDEX fk_1")),
            MergeOutcome::Unchanged
        );
        let t = applied(merge_alter(&t, &alter("ALTER TABLE t DROP FOREIGN KEY fk_1")));
        assert!(t.constraint("fk_1").is_none());
    }

    #[test]
    fn test_fold_skips_inapplicable() {
        let alters = [
            alter("ALTER TABLE t DROP COLUMN v2"),
            alter("ALTER TABLE t DROP COLUMN v2"),
            alter("ALTER TABLE t ADD COLUMN v4 int"),
        ];
        let t = fold(&base(), &alters);
        assert_eq!(names(&t), vec!["id", "v1", "v4"]);
    }
}
