//! End-to-end inspection of statement batches against a memory probe.

mod common;

use common::{inspect, probe, rollbacks, sqls};
use oxide_inspect::prelude::*;
use oxide_inspect::rules::{handler, DDL_CHECK_ALTER_TABLE_NEED_MERGE, DDL_CHECK_PK_NOT_EXIST};

// =============================================================================
// Catalog evolution within a batch
// =============================================================================

#[test]
fn test_second_create_if_not_exists_sees_the_first() {
    let mut p = MemoryProbe::new().with_schema("db");
    let create = "CREATE TABLE if not exists db.t1(id bigint unsigned auto_increment, \
                  v varchar(255), primary key(id))";
    let reports = inspect(&mut p, &[create, create]);
    assert_eq!(reports[0].message, "");
    assert_eq!(reports[1].message, "[warn]table db.t1 exist");
    assert_eq!(reports[1].severity, Severity::Warn);
    assert_eq!(reports[1].status, Status::Done);
}

#[test]
fn test_second_drop_column_sees_the_merged_shape() {
    let mut p = probe();
    let reports = inspect(
        &mut p,
        &[
            "ALTER TABLE db.t1 DROP COLUMN v2;",
            "ALTER TABLE db.t1 DROP COLUMN v2;",
        ],
    );
    assert_eq!(reports[0].status, Status::Done);
    assert_eq!(reports[1].message, "[error]column v2 not exist");
    assert_eq!(reports[1].status, Status::Invalid);
}

#[test]
fn test_existence_follows_the_batch() {
    let mut p = probe();
    let reports = inspect(
        &mut p,
        &[
            "CREATE TABLE t3 (id int, PRIMARY KEY (id))",
            "ALTER TABLE t3 ADD COLUMN v int",
            "DROP TABLE t3",
            "ALTER TABLE t3 ADD COLUMN w int",
        ],
    );
    let messages: Vec<&str> = reports.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, vec!["", "", "", "[error]table db.t3 not exist"]);
}

#[test]
fn test_renamed_table_moves() {
    let mut p = probe();
    let reports = inspect(
        &mut p,
        &[
            "ALTER TABLE t1 RENAME AS t9",
            "ALTER TABLE t9 ADD COLUMN v3 int",
            "ALTER TABLE t1 ADD COLUMN v4 int",
        ],
    );
    assert_eq!(reports[1].message, "");
    assert_eq!(reports[2].message, "[error]table db.t1 not exist");
}

#[test]
fn test_use_switches_schema() {
    let mut p = probe().with_schema("other");
    let reports = inspect(&mut p, &["USE other", "CREATE TABLE t1 (id int)"]);
    assert_eq!(reports[1].message, "");
}

// =============================================================================
// Column resolution across joins
// =============================================================================

#[test]
fn test_unqualified_shared_column_is_ambiguous() {
    let mut p = probe();
    let reports = inspect(
        &mut p,
        &["SELECT t1.id FROM t1 JOIN t2 ON t1.id = t2.t1_id WHERE v2 = 1"],
    );
    assert_eq!(reports[0].message, "[error]column v2 is ambiguous");
}

#[test]
fn test_alias_qualified_column_resolves() {
    let mut p = probe();
    let reports = inspect(
        &mut p,
        &["SELECT a.id FROM t1 a JOIN t2 b ON a.id = b.t1_id WHERE b.v2 = 1"],
    );
    assert_eq!(reports[0].message, "");
    assert_eq!(reports[0].status, Status::Done);
}

// =============================================================================
// Batches, rules and whitelist
// =============================================================================

#[test]
fn test_mixed_batch_fails() {
    let mut p = probe();
    let err = Session::new(Catalog::new("db"), &mut p, Vec::new())
        .inspect(&sqls(&["ALTER TABLE t1 ADD COLUMN v3 int", "DELETE FROM t1"]))
        .unwrap_err();
    assert!(matches!(err, InspectError::StatementKindConflict));
}

#[test]
fn test_probe_failure_is_fatal() {
    let mut p = probe().failing("connection refused");
    let err = Session::new(Catalog::new("db"), &mut p, Vec::new())
        .inspect(&sqls(&["ALTER TABLE t1 ADD COLUMN v3 int"]))
        .unwrap_err();
    assert!(matches!(err, InspectError::CatalogProbe(_)));
    assert_eq!(p.closed(), 1);
}

#[test]
fn test_mixed_related_batch_fails_and_closes() {
    let mut p = probe();
    let err = Session::new(Catalog::new("db"), &mut p, Vec::new())
        .inspect_after(
            &sqls(&["CREATE TABLE t3 (id int)", "DELETE FROM t1"]),
            &sqls(&["SELECT 1"]),
        )
        .unwrap_err();
    assert!(matches!(err, InspectError::StatementKindConflict));
    assert_eq!(p.closed(), 1);
}

#[test]
fn test_unparsable_statement_fails_and_closes() {
    let mut p = probe();
    let err = Session::new(Catalog::new("db"), &mut p, Vec::new())
        .inspect(&sqls(&["SELECT 1", "SELEC nonsense (("]))
        .unwrap_err();
    assert!(matches!(err, InspectError::Parse(_)));
    assert_eq!(p.closed(), 1);

    let mut p = probe();
    let err = Session::new(Catalog::new("db"), &mut p, default_rules())
        .generate_rollbacks(&sqls(&["ALTER TABLE t1 ADD INDEX idx_2 (v2)", "ALTER TABLE ("]))
        .unwrap_err();
    assert!(matches!(err, InspectError::Parse(_)));
    assert_eq!(p.closed(), 1);
}

#[test]
fn test_inspect_after_closes_once() {
    let mut p = probe();
    let reports = Session::new(Catalog::new("db"), &mut p, Vec::new())
        .inspect_after(
            &sqls(&["ALTER TABLE t1 ADD COLUMN v3 int"]),
            &sqls(&["ALTER TABLE t1 DROP COLUMN v3"]),
        )
        .unwrap();
    assert_eq!(reports[0].message, "");
    assert_eq!(p.closed(), 1);
}

#[test]
fn test_configured_rules_report() {
    let rules = vec![
        handler(DDL_CHECK_PK_NOT_EXIST).unwrap().rule.clone(),
        handler(DDL_CHECK_ALTER_TABLE_NEED_MERGE).unwrap().rule.clone(),
    ];
    let mut p = probe();
    let reports = Session::new(Catalog::new("db"), &mut p, rules)
        .inspect(&sqls(&[
            "CREATE TABLE t3 (id int)",
            "ALTER TABLE t1 ADD COLUMN v3 int",
            "ALTER TABLE t1 ADD COLUMN v4 int",
        ]))
        .unwrap();
    assert_eq!(reports[0].message, "[error]table must have a primary key");
    assert_eq!(reports[0].status, Status::Done);
    assert_eq!(reports[1].message, "");
    assert_eq!(
        reports[2].message,
        "[notice]this table is already altered in this batch, merge the ALTER statements"
    );
    assert_eq!(
        AuditReport::new("db", reports).severity,
        Severity::Error
    );
}

#[test]
fn test_whitelist_ignores_literals() {
    let config = InspectConfig::from_toml(
        r#"
        whitelist = ["DELETE FROM t1 WHERE id = 1"]
        "#,
    )
    .unwrap();
    let mut p = probe();
    let reports = Session::from_config(Catalog::new("db"), &mut p, &config)
        .unwrap()
        .inspect(&sqls(&["delete from t1 where id = 42", "DELETE FROM t1 WHERE v2 = 1"]))
        .unwrap();
    assert_eq!(reports[0].message, "whitelisted");
    assert_ne!(reports[1].message, "whitelisted");
}

// =============================================================================
// Rollback
// =============================================================================

#[test]
fn test_add_index_rolls_back_to_drop_index() {
    let mut p = probe();
    let set = rollbacks(&mut p, &["ALTER TABLE db.t1 ADD INDEX idx_2(v1)"]);
    assert_eq!(
        set.statements,
        vec![RollbackStatement {
            number: 1,
            sql: "ALTER TABLE `db`.`t1`\nDROP INDEX `idx_2`;".into(),
        }]
    );
}

#[test]
fn test_dependent_changes_roll_back_in_reverse() {
    let mut p = probe();
    let set = rollbacks(
        &mut p,
        &[
            "CREATE TABLE t3 (id int, PRIMARY KEY (id))",
            "ALTER TABLE t3 ADD COLUMN v int",
            "ALTER TABLE t1 DROP COLUMN v2",
            "DROP DATABASE db",
        ],
    );
    let report = RollbackReport::new(set);
    assert_eq!(
        report.sql(),
        vec![
            "ALTER TABLE `db`.`t1`\nADD COLUMN `v2` int AFTER `v1`;".to_string(),
            "ALTER TABLE `db`.`t3`\nDROP COLUMN `v`;".to_string(),
            "DROP TABLE IF EXISTS `db`.`t3`;".to_string(),
        ]
    );
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].number, 4);
}

#[test]
fn test_insert_rolls_back_to_delete() {
    let mut p = probe();
    let set = rollbacks(
        &mut p,
        &["INSERT INTO t1 (id, v1, v2) VALUES (1, 'a', 2), (2, 'b', 3)"],
    );
    assert_eq!(
        set.statements[0].sql,
        "DELETE FROM `db`.`t1` WHERE `id` = '1';\nDELETE FROM `db`.`t1` WHERE `id` = '2';"
    );
}
