#![allow(dead_code)]

use oxide_inspect::prelude::*;
use oxide_inspect_sql::ast::{AlterTableStatement, CreateTableStatement};
use oxide_inspect_sql::{Parser, Statement};

pub const T1: &str = "CREATE TABLE t1 (\
    id bigint unsigned NOT NULL AUTO_INCREMENT, \
    v1 varchar(255) NOT NULL DEFAULT 'v1' COMMENT 'unit test', \
    v2 int, \
    PRIMARY KEY (id), \
    KEY idx_1 (v1), \
    UNIQUE KEY uniq_1 (v1, v2)) ENGINE=InnoDB COMMENT='unit test'";

pub const T2: &str = "CREATE TABLE t2 (\
    id bigint unsigned NOT NULL AUTO_INCREMENT, \
    t1_id bigint unsigned NOT NULL, \
    v2 int, \
    PRIMARY KEY (id))";

/// Schema `db` holding `t1` and `t2`.
pub fn probe() -> MemoryProbe {
    MemoryProbe::new()
        .with_table("db", "t1", T1, 1.0)
        .with_table("db", "t2", T2, 1.0)
}

pub fn sqls(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Inspects `items` in schema `db` with no rules enabled.
pub fn inspect(probe: &mut MemoryProbe, items: &[&str]) -> Vec<StatementReport> {
    Session::new(Catalog::new("db"), probe, Vec::new())
        .inspect(&sqls(items))
        .unwrap_or_else(|e| panic!("Failed to inspect {items:?}\nError: {e}"))
}

pub fn rollbacks(probe: &mut MemoryProbe, items: &[&str]) -> RollbackSet {
    Session::new(Catalog::new("db"), probe, default_rules())
        .generate_rollbacks(&sqls(items))
        .unwrap_or_else(|e| panic!("Failed to roll back {items:?}\nError: {e}"))
}

pub fn parse(sql: &str) -> Statement {
    Parser::new(sql)
        .parse_statement()
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_create(sql: &str) -> CreateTableStatement {
    match parse(sql) {
        Statement::CreateTable(c) => c,
        other => panic!("Expected CREATE TABLE, got {other:?}"),
    }
}

pub fn parse_alter(sql: &str) -> AlterTableStatement {
    match parse(sql) {
        Statement::AlterTable(a) => a,
        other => panic!("Expected ALTER TABLE, got {other:?}"),
    }
}
