use crate::engine::query_builder::{Query, TranslationError};
use crate::engine::syntax::Stage4Rep;
use crate::engine::vocabulary::{ColumnName, Schema, Table};
use crate::engine::{ConditionList, SelectTarget};
use log::debug;

pub struct Stage5Builder<'a> {
    input: Stage4Rep<'a>,
    schema: &'a Schema,
}

impl<'a> Stage5Builder<'a> {
    pub fn new(input: Stage4Rep<'a>, schema: &'a Schema) -> Self {
        Stage5Builder { input, schema }
    }

    /// Errors come in a fixed order: a missing table first, then an unknown table, then a missing
    /// SELECT list, then unknown columns.
    pub fn try_build(self) -> Result<Query, TranslationError> {
        let name = match &self.input.table {
            Some(table) => table.it.clone(),
            None => return Err(TranslationError::TableResolution),
        };

        let table = self
            .schema
            .table(name.as_str())
            .ok_or_else(|| TranslationError::UnknownTable(name.clone()))?;

        let select = self
            .input
            .select
            .map_err(|error| {
                debug!("could not resolve the SELECT list: {error:?}");
                TranslationError::SelectResolution
            })?;

        let checker = ColumnChecker { table };
        checker.check_select(&select)?;
        checker.check_conditions(&self.input.filter)?;
        checker.check_columns(&self.input.group_by)?;
        checker.check_conditions(&self.input.having)?;
        checker.check_columns(&self.input.order_by)?;

        Ok(Query {
            select,
            table: name,
            filter: self.input.filter,
            group_by: self.input.group_by,
            having: self.input.having,
            order_by: self.input.order_by,
            order_direction: self.input.order_direction,
        })
    }
}

struct ColumnChecker<'a> {
    table: &'a Table,
}

impl ColumnChecker<'_> {
    fn check_select(&self, select: &[SelectTarget]) -> Result<(), TranslationError> {
        for target in select {
            match target {
                SelectTarget::Wildcard => {}
                SelectTarget::Column(column) => self.check(column)?,
                SelectTarget::Aggregate(call) => {
                    if let Some(argument) = &call.argument {
                        self.check(argument)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn check_conditions(&self, conditions: &ConditionList) -> Result<(), TranslationError> {
        conditions
            .conditions()
            .iter()
            .filter_map(|condition| condition.subject.column())
            .try_for_each(|column| self.check(column))
    }

    fn check_columns(&self, columns: &[ColumnName]) -> Result<(), TranslationError> {
        columns.iter().try_for_each(|column| self.check(column))
    }

    fn check(&self, column: &ColumnName) -> Result<(), TranslationError> {
        if self.table.has_column(column.as_str()) {
            Ok(())
        } else {
            Err(TranslationError::UnknownColumn {
                column: column.clone(),
                table: self.table.name.clone(),
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::syntax::SelectError;
    use crate::engine::vocabulary::{Operator, TableName};
    use crate::engine::{
        Condition, Connective, LiteralValue, Operands, Sourced, Subject, UnparsedFragment,
    };

    fn schema() -> Schema {
        Schema::new(vec![
            Table::new("users", ["id", "name", "followers"]),
            Table::new("employees", ["id", "name", "salary"]),
        ])
    }

    fn input(
        table: Option<&str>,
        select: Result<Vec<SelectTarget>, SelectError>,
    ) -> Stage4Rep<'static> {
        Stage4Rep {
            input: "",
            select,
            table: table.map(|table| Sourced::inferred(TableName::from(table))),
            filter: ConditionList::default(),
            group_by: vec![],
            having: ConditionList::default(),
            order_by: vec![],
            order_direction: None,
            unparsed: Vec::<UnparsedFragment>::new(),
        }
    }

    fn build(input: Stage4Rep<'static>) -> Result<Query, TranslationError> {
        Stage5Builder::new(input, &schema()).try_build()
    }

    #[test]
    fn test_valid_query() {
        let query = build(input(
            Some("users"),
            Ok(vec![SelectTarget::Column("name".into())]),
        ))
        .unwrap();

        assert_eq!(TableName::from("users"), query.table);
        assert_eq!(vec![SelectTarget::Column("name".into())], query.select);
    }

    #[test]
    fn test_error_order() {
        assert_eq!(
            Err(TranslationError::TableResolution),
            build(input(None, Err(SelectError::NoTrigger)))
        );
        assert_eq!(
            Err(TranslationError::UnknownTable("bar".into())),
            build(input(Some("bar"), Err(SelectError::Unresolved("foo".into()))))
        );
        assert_eq!(
            Err(TranslationError::SelectResolution),
            build(input(Some("users"), Err(SelectError::NothingSelected)))
        );
    }

    #[test]
    fn test_unknown_columns() {
        assert_eq!(
            Err(TranslationError::UnknownColumn {
                column: "salary".into(),
                table: "users".into(),
            }),
            build(input(
                Some("users"),
                Ok(vec![SelectTarget::Column("salary".into())])
            ))
        );

        let mut filtered = input(Some("employees"), Ok(vec![SelectTarget::Wildcard]));
        filtered.filter.push(
            Connective::And,
            Condition {
                subject: Subject::Column("followers".into()),
                operator: Operator::GreaterThan,
                operands: Operands::Single(LiteralValue::Number("1".into())),
            },
        );

        assert_eq!(
            Err(TranslationError::UnknownColumn {
                column: "followers".into(),
                table: "employees".into(),
            }),
            build(filtered)
        );

        let mut ordered = input(Some("employees"), Ok(vec![SelectTarget::Wildcard]));
        ordered.order_by = vec!["shoe size".into()];

        assert_eq!(
            "column 'shoe size' not found in table 'employees'",
            build(ordered).unwrap_err().to_string()
        );
    }
}
