use crate::engine::syntax::Stage4Rep;
use crate::engine::vocabulary::{ColumnName, Schema, TableName};
use crate::engine::{ConditionList, OrderDirection, SelectTarget};
use thiserror::Error;

mod stage5;

/// Checks the parsed question against the schema, and builds the query.
pub fn build_query(input: Stage4Rep<'_>, schema: &Schema) -> Result<Query, TranslationError> {
    let builder = stage5::Stage5Builder::new(input, schema);

    builder.try_build()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("could not determine what to SELECT")]
    SelectResolution,
    #[error("could not determine which table to SELECT FROM")]
    TableResolution,
    #[error("table '{0}' not found in schema")]
    UnknownTable(TableName),
    #[error("column '{column}' not found in table '{table}'")]
    UnknownColumn {
        column: ColumnName,
        table: TableName,
    },
    #[error("could not read condition '{0}'")]
    UnparsedCondition(String),
}

/// A query that only uses tables and columns that exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub select: Vec<SelectTarget>,
    pub table: TableName,
    pub filter: ConditionList,
    pub group_by: Vec<ColumnName>,
    pub having: ConditionList,
    pub order_by: Vec<ColumnName>,
    pub order_direction: Option<OrderDirection>,
}
