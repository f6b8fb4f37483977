//! Tests for DDL: CREATE/ALTER/DROP TABLE, databases, indexes and USE.

mod common;
use common::*;

use oxide_inspect_sql::ast::{
    AlterSpec, ColumnOption, ColumnPosition, ConstraintKind, Expr, ReferenceAction, Statement,
    TableName, TableOption, TypeName,
};

const EXIST_TB_1: &str = r#"CREATE TABLE exist_db.exist_tb_1 (
    id int(10) unsigned NOT NULL AUTO_INCREMENT COMMENT "unit test",
    v1 varchar(255) NOT NULL DEFAULT "v1" COMMENT "unit test",
    v2 varchar(255) COMMENT "unit test",
    PRIMARY KEY (id) USING BTREE,
    KEY idx_1 (v1),
    UNIQUE KEY uniq_1 (v1,v2)
) ENGINE=InnoDB AUTO_INCREMENT=3 DEFAULT CHARSET=utf8mb4 COMMENT="unit test""#;

#[test]
fn create_table_full_definition() {
    let c = parse_create(EXIST_TB_1);
    assert_eq!(c.table, TableName::qualified("exist_db", "exist_tb_1"));
    assert_eq!(c.columns.len(), 3);
    assert_eq!(c.constraints.len(), 3);

    let id = c.column("ID").unwrap();
    assert_eq!(id.data_type.name, TypeName::Int);
    assert_eq!(id.data_type.length, Some(10));
    assert!(id.data_type.unsigned);
    assert!(id.is_not_null());
    assert!(id.is_auto_increment());
    assert_eq!(id.comment(), Some("unit test"));

    let v1 = c.column("v1").unwrap();
    assert_eq!(v1.default_value(), Some(&Expr::string("v1")));

    let pk = c.primary_constraint().unwrap();
    assert_eq!(pk.column_names(), vec!["id"]);
    assert_eq!(pk.index_type.as_deref(), Some("BTREE"));

    assert_eq!(c.constraint("idx_1").unwrap().kind, ConstraintKind::Index);
    assert_eq!(
        c.constraint("uniq_1").unwrap().column_names(),
        vec!["v1", "v2"]
    );

    assert_eq!(c.engine(), Some("InnoDB"));
    assert_eq!(c.charset(), Some("utf8mb4"));
    assert_eq!(c.comment(), Some("unit test"));
    assert!(c
        .options
        .contains(&TableOption::AutoIncrement("3".to_string())));
}

#[test]
fn create_table_renders_canonically() {
    let c = parse_create(EXIST_TB_1);
    assert_eq!(
        c.to_string(),
        "CREATE TABLE `exist_db`.`exist_tb_1` (\n  \
         `id` int(10) unsigned NOT NULL AUTO_INCREMENT COMMENT \"unit test\",\n  \
         `v1` varchar(255) NOT NULL DEFAULT \"v1\" COMMENT \"unit test\",\n  \
         `v2` varchar(255) COMMENT \"unit test\",\n  \
         PRIMARY KEY (`id`) USING BTREE,\n  \
         INDEX `idx_1` (`v1`),\n  \
         UNIQUE INDEX `uniq_1` (`v1`,`v2`)\n\
         ) ENGINE=InnoDB AUTO_INCREMENT=3 DEFAULT CHARSET=utf8mb4 COMMENT=\"unit test\""
    );
    round_trip(EXIST_TB_1);
}

#[test]
fn create_table_foreign_key() {
    let c = parse_create(
        "CREATE TABLE exist_db.exist_tb_2 (
            id bigint unsigned NOT NULL AUTO_INCREMENT,
            user_id bigint unsigned NOT NULL,
            UNIQUE KEY uniq_1(id),
            CONSTRAINT pk_test_1 FOREIGN KEY (user_id) REFERENCES exist_db.exist_tb_1 (id) ON DELETE NO ACTION
        )",
    );
    let fk = c.constraint("pk_test_1").unwrap();
    assert_eq!(fk.kind, ConstraintKind::ForeignKey);
    let reference = fk.reference.as_ref().unwrap();
    assert_eq!(reference.table, TableName::qualified("exist_db", "exist_tb_1"));
    assert_eq!(reference.columns, vec!["id"]);
    assert_eq!(reference.on_delete, Some(ReferenceAction::NoAction));
    assert_eq!(reference.on_update, None);
    assert_eq!(
        fk.to_string(),
        "CONSTRAINT `pk_test_1` FOREIGN KEY (`user_id`) REFERENCES `exist_db`.`exist_tb_1` (`id`) ON DELETE NO ACTION"
    );
}

#[test]
fn create_table_column_types() {
    let c = parse_create(
        "CREATE TABLE t (
            a decimal(10,2) NOT NULL DEFAULT 0.00,
            b enum('x','y') DEFAULT 'x',
            c set('r','w'),
            d text,
            e json,
            f datetime(3) DEFAULT CURRENT_TIMESTAMP(3) ON UPDATE CURRENT_TIMESTAMP(3),
            g tinyint(1) unsigned zerofill,
            h double precision,
            i varchar(32) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin,
            j bit(1) DEFAULT b'0'
        )",
    );
    let types: Vec<_> = c.columns.iter().map(|col| col.data_type.to_string()).collect();
    assert_eq!(
        types,
        vec![
            "decimal(10,2)",
            "enum(\"x\",\"y\")",
            "set(\"r\",\"w\")",
            "text",
            "json",
            "datetime(3)",
            "tinyint(1) unsigned zerofill",
            "double",
            "varchar(32)",
            "bit(1)",
        ]
    );
    assert_eq!(
        c.column("a").unwrap().default_value(),
        Some(&Expr::number("0.00"))
    );
    assert!(c.column("i").unwrap().options.contains(&ColumnOption::CharacterSet(
        "utf8mb4".to_string()
    )));
    assert_eq!(
        c.column("j").unwrap().default_value(),
        Some(&Expr::number("b'0'"))
    );
}

#[test]
fn create_table_like_and_if_not_exists() {
    let c = parse_create("CREATE TABLE IF NOT EXISTS db.copy LIKE db.src");
    assert!(c.if_not_exists);
    assert_eq!(c.like, Some(TableName::qualified("db", "src")));
    assert!(c.columns.is_empty());
    round_trip("CREATE TABLE IF NOT EXISTS db.copy LIKE db.src");
}

#[test]
fn create_table_keeps_partition_text() {
    let c = parse_create(
        "CREATE TABLE t (id int) ENGINE=InnoDB PARTITION BY HASH(id) PARTITIONS 4",
    );
    assert_eq!(c.partition.as_deref(), Some("PARTITION BY HASH(id) PARTITIONS 4"));
}

#[test]
fn create_table_other_options() {
    let c = parse_create("CREATE TABLE t (id int) ENGINE=InnoDB, ROW_FORMAT=DYNAMIC");
    assert_eq!(
        c.options,
        vec![
            TableOption::Engine("InnoDB".to_string()),
            TableOption::Other {
                name: "ROW_FORMAT".to_string(),
                value: "DYNAMIC".to_string(),
            },
        ]
    );
}

#[test]
fn create_table_check_constraint_is_dropped() {
    let c = parse_create("CREATE TABLE t (a int, CONSTRAINT chk CHECK (a > 0))");
    assert_eq!(c.columns.len(), 1);
    assert!(c.constraints.is_empty());
}

#[test]
fn alter_table_add_columns() {
    let a = parse_alter(
        "alter table exist_db.exist_tb_1 add column v3 varchar(10) not null default '' after v2",
    );
    assert_eq!(a.table, TableName::qualified("exist_db", "exist_tb_1"));
    let AlterSpec::AddColumns { columns, position } = &a.specs[0] else {
        panic!("Expected ADD COLUMN");
    };
    assert_eq!(columns[0].name, "v3");
    assert_eq!(position, &Some(ColumnPosition::After("v2".to_string())));

    let a = parse_alter("ALTER TABLE t ADD (a int, b int)");
    let AlterSpec::AddColumns { columns, position } = &a.specs[0] else {
        panic!("Expected ADD COLUMN list");
    };
    assert_eq!(columns.len(), 2);
    assert!(position.is_none());
    assert_eq!(
        a.to_string(),
        "ALTER TABLE `t` ADD COLUMN (`a` int, `b` int)"
    );
}

#[test]
fn alter_table_index_specs() {
    let a = parse_alter(
        "ALTER TABLE t ADD INDEX idx_2 (v1, v2), ADD UNIQUE uniq_2 (v2), ADD PRIMARY KEY (id), \
         ADD CONSTRAINT fk_1 FOREIGN KEY (uid) REFERENCES u (id) ON DELETE CASCADE ON UPDATE SET NULL, \
         DROP INDEX idx_1, DROP PRIMARY KEY, DROP FOREIGN KEY fk_0, RENAME INDEX idx_3 TO idx_4",
    );
    assert_eq!(a.specs.len(), 8);
    let AlterSpec::AddConstraint(fk) = &a.specs[3] else {
        panic!("Expected ADD CONSTRAINT");
    };
    assert_eq!(fk.name.as_deref(), Some("fk_1"));
    let reference = fk.reference.as_ref().unwrap();
    assert_eq!(reference.on_delete, Some(ReferenceAction::Cascade));
    assert_eq!(reference.on_update, Some(ReferenceAction::SetNull));
    assert_eq!(a.specs[4], AlterSpec::DropIndex { name: "idx_1".to_string() });
    assert_eq!(a.specs[5], AlterSpec::DropPrimaryKey);
    assert_eq!(
        a.specs[6],
        AlterSpec::DropForeignKey {
            name: "fk_0".to_string()
        }
    );
    assert_eq!(
        a.specs[7],
        AlterSpec::RenameIndex {
            old_name: "idx_3".to_string(),
            new_name: "idx_4".to_string(),
        }
    );
}

#[test]
fn alter_table_column_specs() {
    let a = parse_alter(
        "ALTER TABLE t MODIFY COLUMN v1 varchar(100) FIRST, CHANGE v2 v3 int, DROP v4, \
         ALTER v5 SET DEFAULT 'x', ALTER COLUMN v6 DROP DEFAULT, RENAME COLUMN v7 TO v8",
    );
    assert!(matches!(
        &a.specs[0],
        AlterSpec::ModifyColumn {
            position: Some(ColumnPosition::First),
            ..
        }
    ));
    let AlterSpec::ChangeColumn {
        old_name, column, ..
    } = &a.specs[1]
    else {
        panic!("Expected CHANGE COLUMN");
    };
    assert_eq!(old_name, "v2");
    assert_eq!(column.name, "v3");
    assert_eq!(a.specs[2], AlterSpec::DropColumn { name: "v4".to_string() });
    assert_eq!(
        a.specs[3],
        AlterSpec::AlterColumnDefault {
            name: "v5".to_string(),
            default: Some(Expr::string("x")),
        }
    );
    assert_eq!(
        a.specs[4],
        AlterSpec::AlterColumnDefault {
            name: "v6".to_string(),
            default: None,
        }
    );
    assert!(matches!(&a.specs[5], AlterSpec::RenameColumn { .. }));
}

#[test]
fn alter_table_rename_and_options() {
    let a = parse_alter(
        "ALTER TABLE db.t RENAME TO db.t2, ENGINE=MyISAM, COMMENT='c', CONVERT TO CHARACTER SET utf8mb4 COLLATE utf8mb4_bin",
    );
    assert_eq!(
        a.specs[0],
        AlterSpec::RenameTable {
            new_name: TableName::qualified("db", "t2")
        }
    );
    assert_eq!(
        a.specs[1],
        AlterSpec::TableOptions(vec![TableOption::Engine("MyISAM".to_string())])
    );
    assert_eq!(
        a.specs[2],
        AlterSpec::TableOptions(vec![TableOption::Comment("c".to_string())])
    );
    assert_eq!(
        a.specs[3],
        AlterSpec::TableOptions(vec![
            TableOption::Charset("utf8mb4".to_string()),
            TableOption::Collate("utf8mb4_bin".to_string()),
        ])
    );
}

#[test]
fn alter_table_partition_spec_is_kept_as_text() {
    let a = parse_alter("ALTER TABLE t ADD PARTITION (PARTITION p3 VALUES LESS THAN (2000))");
    assert_eq!(
        a.specs,
        vec![AlterSpec::Partition(
            "ADD PARTITION (PARTITION p3 VALUES LESS THAN (2000))".to_string()
        )]
    );
}

#[test]
fn alter_table_rollback_forms_round_trip() {
    round_trip("ALTER TABLE `s`.`t` DROP COLUMN `v3`");
    round_trip("ALTER TABLE `s`.`t` RENAME AS `s`.`t0`");
    round_trip("ALTER TABLE `s`.`t` ADD INDEX `idx_1` (`v1`)");
    round_trip("ALTER TABLE `s`.`t` ADD UNIQUE INDEX `uniq_1` (`v1`,`v2`)");
    round_trip("ALTER TABLE `s`.`t` ADD PRIMARY KEY (`id`) USING BTREE");
    round_trip(
        "ALTER TABLE `s`.`t` MODIFY COLUMN `v1` varchar(255) NOT NULL DEFAULT \"v1\" COMMENT \"unit test\"",
    );
    round_trip("ALTER TABLE `s`.`t` ALTER COLUMN `v1` SET DEFAULT \"v1\"");
}

#[test]
fn drop_statements() {
    let Statement::DropTable(d) = parse("DROP TABLE IF EXISTS a, db.b") else {
        panic!("Expected DROP TABLE");
    };
    assert!(d.if_exists);
    assert_eq!(d.tables, vec![TableName::new("a"), TableName::qualified("db", "b")]);

    let Statement::DropDatabase(d) = parse("DROP SCHEMA db") else {
        panic!("Expected DROP DATABASE");
    };
    assert_eq!(d.name, "db");
    assert!(!d.if_exists);

    let Statement::DropIndex(d) = parse("DROP INDEX idx_1 ON db.t") else {
        panic!("Expected DROP INDEX");
    };
    assert_eq!(d.name, "idx_1");
    assert_eq!(d.table, TableName::qualified("db", "t"));
}

#[test]
fn create_database_and_index() {
    let Statement::CreateDatabase(c) =
        parse("CREATE DATABASE IF NOT EXISTS db DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_bin")
    else {
        panic!("Expected CREATE DATABASE");
    };
    assert!(c.if_not_exists);
    assert_eq!(
        c.options,
        vec![
            TableOption::Charset("utf8mb4".to_string()),
            TableOption::Collate("utf8mb4_bin".to_string()),
        ]
    );

    let Statement::CreateIndex(c) = parse("CREATE UNIQUE INDEX u1 ON t (a(10), b DESC)") else {
        panic!("Expected CREATE INDEX");
    };
    assert_eq!(c.index.kind, ConstraintKind::Unique);
    assert_eq!(c.index.columns[0].length, Some(10));
    assert_eq!(
        c.to_string(),
        "CREATE UNIQUE INDEX `u1` ON `t` (`a`(10),`b` DESC)"
    );
}

#[test]
fn use_statement() {
    let Statement::Use(u) = parse("use `exist_db`") else {
        panic!("Expected USE");
    };
    assert_eq!(u.schema, "exist_db");
}
