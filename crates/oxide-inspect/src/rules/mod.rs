//! The rule registry.
//!
//! Every audit rule is registered once in [`RULE_HANDLERS`], keyed by its
//! identifier. A [`Rule`] is the configurable part (severity and value) and
//! is what a session evaluates; the matching [`RuleHandler`] carries the
//! message template and the check function.
//!
//! Handlers are shared between related rules: the primary key handler,
//! for instance, serves three rule ids and reports under each of them.
//! [`Session::add_result`] only keeps output attributed to the rule being
//! evaluated.

mod ddl;
mod dml;
mod keywords;

pub use keywords::is_reserved_keyword;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use oxide_inspect_sql::Statement;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RuleConfig;
use crate::diagnostics::Severity;
use crate::error::{InspectError, Result};
use crate::session::Session;

pub const DML_ROLLBACK_MAX_ROWS: &str = "dml_rollback_max_rows";
pub const DDL_OSC_MIN_SIZE: &str = "ddl_osc_min_size";

pub const DDL_CHECK_TABLE_WITHOUT_IF_NOT_EXISTS: &str = "ddl_check_table_without_if_not_exists";
pub const DDL_CHECK_OBJECT_NAME_LENGTH: &str = "ddl_check_object_name_length";
pub const DDL_CHECK_OBJECT_NAME_USING_KEYWORD: &str = "ddl_check_object_name_using_keyword";
pub const DDL_CHECK_OBJECT_NAME_USING_CN: &str = "ddl_check_object_name_using_cn";
pub const DDL_CHECK_PK_NOT_EXIST: &str = "ddl_check_pk_not_exist";
pub const DDL_CHECK_PK_WITHOUT_AUTO_INCREMENT: &str = "ddl_check_pk_without_auto_increment";
pub const DDL_CHECK_PK_WITHOUT_BIGINT_UNSIGNED: &str = "ddl_check_pk_without_bigint_unsigned";
pub const DDL_CHECK_PK_PROHIBIT_AUTO_INCREMENT: &str = "ddl_check_pk_prohibit_auto_increment";
pub const DDL_CHECK_COLUMN_CHAR_LENGTH: &str = "ddl_check_column_char_length";
pub const DDL_DISABLE_FK: &str = "ddl_disable_fk";
pub const DDL_CHECK_INDEX_COUNT: &str = "ddl_check_index_count";
pub const DDL_CHECK_COMPOSITE_INDEX_MAX: &str = "ddl_check_composite_index_max";
pub const DDL_CHECK_TABLE_WITHOUT_INNODB_UTF8MB4: &str = "ddl_check_table_without_innodb_utf8mb4";
pub const DDL_CHECK_INDEX_COLUMN_WITH_BLOB: &str = "ddl_check_index_column_with_blob";
pub const ALL_CHECK_WHERE_IS_INVALID: &str = "all_check_where_is_invalid";
pub const DDL_CHECK_ALTER_TABLE_NEED_MERGE: &str = "ddl_check_alter_table_need_merge";
pub const DML_DISABLE_SELECT_ALL_COLUMN: &str = "dml_disable_select_all_column";
pub const DDL_DISABLE_DROP_STATEMENT: &str = "ddl_disable_drop_statement";
pub const DDL_CHECK_TABLE_WITHOUT_COMMENT: &str = "ddl_check_table_without_comment";
pub const DDL_CHECK_COLUMN_WITHOUT_COMMENT: &str = "ddl_check_column_without_comment";
pub const DDL_CHECK_INDEX_PREFIX: &str = "ddl_check_index_prefix";
pub const DDL_CHECK_UNIQUE_INDEX_PREFIX: &str = "ddl_check_unique_index_prefix";
pub const DDL_CHECK_UNIQUE_INDEX: &str = "ddl_check_unique_index";
pub const DDL_CHECK_COLUMN_WITHOUT_DEFAULT: &str = "ddl_check_column_without_default";
pub const DDL_CHECK_COLUMN_TIMESTAMP_WITHOUT_DEFAULT: &str =
    "ddl_check_column_timestamp_without_default";
pub const DDL_CHECK_COLUMN_BLOB_WITH_NOT_NULL: &str = "ddl_check_column_blob_with_not_null";
pub const DDL_CHECK_COLUMN_BLOB_DEFAULT_IS_NOT_NULL: &str =
    "ddl_check_column_blob_default_is_not_null";
pub const DDL_CHECK_COLUMN_ENUM_NOTICE: &str = "ddl_check_column_enum_notice";
pub const DDL_CHECK_COLUMN_SET_NOTICE: &str = "ddl_check_column_set_notice";
pub const DDL_CHECK_COLUMN_BLOB_NOTICE: &str = "ddl_check_column_blob_notice";
pub const DDL_CHECK_INDEXES_EXIST_BEFORE_CREAT_CONSTRAINTS: &str =
    "ddl_check_indexes_exist_before_creat_constraints";
pub const DDL_CHECK_COLLATION_DATABASE: &str = "ddl_check_collation_database";
pub const DDL_CHECK_DECIMAL_TYPE_COLUMN: &str = "ddl_check_decimal_type_column";
pub const DDL_CHECK_DATABASE_SUFFIX: &str = "ddl_check_database_suffix";
pub const DDL_CHECK_PK_NAME: &str = "ddl_check_pk_name";
pub const DDL_CHECK_TABLE_PARTITION: &str = "ddl_check_table_partition";
pub const DML_CHECK_WITH_LIMIT: &str = "dml_check_with_limit";
pub const DML_CHECK_WITH_ORDER_BY: &str = "dml_check_with_order_by";
pub const DML_CHECK_LIMIT_MUST_EXIST: &str = "dml_check_limit_must_exist";
pub const DML_CHECK_INSERT_COLUMNS_EXIST: &str = "dml_check_insert_columns_exist";
pub const DML_CHECK_BATCH_INSERT_LISTS_MAX: &str = "dml_check_batch_insert_lists_max";
pub const DML_CHECK_WHERE_EXIST_FUNC: &str = "dml_check_where_exist_func";
pub const DML_CHECK_WHERE_EXIST_NOT: &str = "dml_check_where_exist_not";
pub const DML_CHECK_WHERE_EXIST_NULL: &str = "dml_check_where_exist_null";
pub const DML_CHECK_WHERE_EXIST_IMPLICIT_CONVERSION: &str =
    "dml_check_where_exist_implicit_conversion";
pub const DML_CHECK_WHERE_EXIST_SCALAR_SUB_QUERIES: &str =
    "dml_check_where_exist_scalar_sub_queries";
pub const DML_CHECK_FUZZY_SEARCH: &str = "dml_check_fuzzy_search";
pub const DML_CHECK_SELECT_FOR_UPDATE: &str = "dml_check_select_for_update";
pub const DML_CHECK_NEEDLESS_FUNC: &str = "dml_check_needless_func";
pub const DML_CHECK_NUMBER_OF_JOIN_TABLES: &str = "dml_check_number_of_join_tables";
pub const DML_CHECK_IS_AFTER_UNION_DISTINCT: &str = "dml_check_is_after_union_distinct";
pub const DDL_CHECK_IS_EXIST_LIMIT_OFFSET: &str = "ddl_check_is_exist_limit_offset";
pub const DML_CHECK_EXPLAIN_ACCESS_TYPE_ALL: &str = "dml_check_explain_access_type_all";
pub const DML_CHECK_EXPLAIN_EXTRA_USING_FILESORT: &str = "dml_check_explain_extra_using_filesort";
pub const DML_CHECK_EXPLAIN_EXTRA_USING_TEMPORARY: &str =
    "dml_check_explain_extra_using_temporary";

/// What a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Session settings rather than checks.
    Config,
    /// Schema changes.
    Ddl,
    /// Data changes and queries.
    Dml,
}

impl Category {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Ddl => "ddl",
            Self::Dml => "dml",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identifier, e.g. `ddl_check_pk_not_exist`.
    pub id: String,
    /// Human readable description.
    pub description: String,
    /// Severity of the diagnostics it produces.
    pub severity: Severity,
    /// Threshold or pattern, empty when the rule takes none.
    pub value: String,
    /// What the rule applies to.
    pub category: Category,
}

impl Rule {
    /// Parses the configured value.
    pub fn parse_value<T>(&self) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.value.trim().parse().map_err(|e: T::Err| {
            InspectError::RuleEvaluation(format!("parsing rule[{}] value error: {e}", self.id))
        })
    }
}

/// Check function of a rule handler.
pub type CheckFn = fn(&mut Session<'_>, &Rule, &Statement) -> Result<()>;

/// A registered rule with its default configuration.
#[derive(Debug, Clone)]
pub struct RuleHandler {
    /// Registry key, equal to `rule.id`.
    pub id: &'static str,
    /// Default configuration.
    pub rule: Rule,
    /// Message template; `{}` is replaced by handler arguments or the value.
    pub message: &'static str,
    /// The check, `None` for configuration entries.
    pub check: Option<CheckFn>,
    /// Enabled when no configuration says otherwise.
    pub is_default: bool,
}

impl RuleHandler {
    pub(crate) fn new(
        id: &'static str,
        severity: Severity,
        category: Category,
        check: CheckFn,
    ) -> Self {
        Self {
            id,
            rule: Rule {
                id: id.to_string(),
                description: String::new(),
                severity,
                value: String::new(),
                category,
            },
            message: "",
            check: Some(check),
            is_default: true,
        }
    }

    fn setting(id: &'static str, description: &str, severity: Severity, value: &str) -> Self {
        Self {
            id,
            rule: Rule {
                id: id.to_string(),
                description: description.to_string(),
                severity,
                value: value.to_string(),
                category: Category::Config,
            },
            message: "",
            check: None,
            is_default: true,
        }
    }

    #[must_use]
    pub(crate) fn description(mut self, description: &str) -> Self {
        self.rule.description = description.to_string();
        self
    }

    #[must_use]
    pub(crate) const fn message(mut self, message: &'static str) -> Self {
        self.message = message;
        self
    }

    #[must_use]
    pub(crate) fn value(mut self, value: &str) -> Self {
        self.rule.value = value.to_string();
        self
    }

    #[must_use]
    pub(crate) const fn optional(mut self) -> Self {
        self.is_default = false;
        self
    }

    /// Renders the message for `rule`, filling `{}` placeholders from
    /// `args`, then from the configured value.
    #[must_use]
    pub fn format_message(&self, rule: &Rule, args: &[String]) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut rest = self.message;
        let mut args = args.iter();
        while let Some(at) = rest.find("{}") {
            out.push_str(&rest[..at]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str(&rule.value),
            }
            rest = &rest[at + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// All registered rules, keyed by id.
pub static RULE_HANDLERS: LazyLock<BTreeMap<&'static str, RuleHandler>> = LazyLock::new(|| {
    let mut handlers = vec![
        RuleHandler::setting(
            DML_ROLLBACK_MAX_ROWS,
            "DML statements expected to touch more rows than this are not rolled back",
            Severity::Notice,
            "1000",
        ),
        RuleHandler::setting(
            DDL_OSC_MIN_SIZE,
            "ALTER TABLE on tables of at least this size (MB) gets an online schema change advisory",
            Severity::Normal,
            "16",
        ),
    ];
    handlers.extend(ddl::handlers());
    handlers.extend(dml::handlers());
    handlers.into_iter().map(|h| (h.id, h)).collect()
});

/// Looks up a handler.
#[must_use]
pub fn handler(id: &str) -> Option<&'static RuleHandler> {
    RULE_HANDLERS.get(id)
}

/// Rules enabled when nothing is configured, in id order.
#[must_use]
pub fn default_rules() -> Vec<Rule> {
    RULE_HANDLERS
        .values()
        .filter(|h| h.is_default)
        .map(|h| h.rule.clone())
        .collect()
}

/// Every registered rule, in id order.
#[must_use]
pub fn all_rules() -> Vec<Rule> {
    RULE_HANDLERS.values().map(|h| h.rule.clone()).collect()
}

/// Applies configuration entries to the default rule set.
///
/// Unknown ids are ignored. An entry enables (with overrides) or disables
/// its rule; the result is in id order.
pub fn rules_from_config(entries: &[RuleConfig]) -> Result<Vec<Rule>> {
    let mut rules: BTreeMap<&'static str, Rule> = RULE_HANDLERS
        .iter()
        .filter(|(_, h)| h.is_default)
        .map(|(id, h)| (*id, h.rule.clone()))
        .collect();

    for entry in entries {
        let Some((id, handler)) = RULE_HANDLERS.get_key_value(entry.id.as_str()) else {
            debug!(rule = %entry.id, "Ignoring unknown rule");
            continue;
        };
        if !entry.enabled {
            rules.remove(id);
            continue;
        }
        let mut rule = rules
            .remove(id)
            .unwrap_or_else(|| handler.rule.clone());
        if let Some(severity) = &entry.severity {
            rule.severity = severity.parse().map_err(|e: String| {
                InspectError::RuleEvaluation(format!("parsing rule[{id}] severity error: {e}"))
            })?;
        }
        if let Some(value) = &entry.value {
            rule.value.clone_from(value);
        }
        rules.insert(id, rule);
    }
    Ok(rules.into_values().collect())
}

/// Finds `id` in `rules`.
#[must_use]
pub fn find<'a>(rules: &'a [Rule], id: &str) -> Option<&'a Rule> {
    rules.iter().find(|r| r.id == id)
}
