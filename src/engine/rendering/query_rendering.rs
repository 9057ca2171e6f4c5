use crate::engine::query_builder::Query;
use crate::engine::rendering::{ConditionClause, OptionalClause};
use crate::engine::{
    AggregateCall, Condition, Connective, LiteralValue, Operands, Operator, OrderDirection,
    SelectTarget, Subject,
};
use std::fmt::{Display, Formatter};

pub fn render_query(query: &Query) -> String {
    format!("{};", query)
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SELECT {}", RenderableSelect(self.select.as_slice()))?;
        write!(f, " FROM {}", self.table)?;
        write!(f, "{}", ConditionClause::filter(&self.filter))?;
        write!(f, "{}", OptionalClause::group_by(self.group_by.as_slice()))?;
        write!(f, "{}", ConditionClause::having(&self.having))?;
        write!(f, "{}", OptionalClause::order_by(self.order_by.as_slice()))?;

        match self.order_direction {
            Some(direction) if !self.order_by.is_empty() => write!(f, " {direction}"),
            _ => Ok(()),
        }
    }
}

struct RenderableSelect<'a>(&'a [SelectTarget]);

impl Display for RenderableSelect<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some((last, first)) = self.0.split_last() {
            for select in first {
                write!(f, "{}, ", select)?;
            }

            write!(f, "{}", last)?;
        } else {
            write!(f, "*")?;
        }

        Ok(())
    }
}

impl Display for SelectTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectTarget::Wildcard => write!(f, "*"),
            SelectTarget::Column(column) => write!(f, "{}", column),
            SelectTarget::Aggregate(call) => write!(f, "{}", call),
        }
    }
}

impl Display for AggregateCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.argument {
            Some(column) => write!(f, "{}({})", self.function, column),
            None => write!(f, "{}(*)", self.function),
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Column(column) => write!(f, "{}", column),
            Subject::Aggregate(call) => write!(f, "{}", call),
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self {
            subject,
            operator,
            operands,
        } = self;

        match (operator, operands) {
            (Operator::Like, Operands::Single(value)) => {
                write!(f, "{subject} LIKE '%{}%'", escape(value.raw()))
            }
            (_, Operands::Single(value)) => write!(f, "{subject} {operator} {value}"),
            (_, Operands::Range(low, high)) => {
                write!(f, "{subject} {operator} {low} AND {high}")
            }
        }
    }
}

impl LiteralValue {
    fn raw(&self) -> &str {
        match self {
            LiteralValue::Number(number) => number,
            LiteralValue::Text(text) => text,
        }
    }
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            // We support numbers like this 1_000, but SQL doesn't -> strip _ out
            LiteralValue::Number(number) => write!(f, "{}", number.replace('_', "")),
            LiteralValue::Text(text) => write!(f, "'{}'", escape(text)),
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\'', "''")
}

impl Display for Connective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Connective::And => write!(f, "AND"),
            Connective::Or => write!(f, "OR"),
        }
    }
}

impl Display for OrderDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderDirection::Ascending => write!(f, "ASC"),
            OrderDirection::Descending => write!(f, "DESC"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::vocabulary::AggregateFunction;
    use crate::engine::ConditionList;

    fn query(select: Vec<SelectTarget>) -> Query {
        Query {
            select,
            table: "employees".into(),
            filter: ConditionList::default(),
            group_by: vec![],
            having: ConditionList::default(),
            order_by: vec![],
            order_direction: None,
        }
    }

    fn condition(column: &str, operator: Operator, operands: Operands) -> Condition {
        Condition {
            subject: Subject::Column(column.into()),
            operator,
            operands,
        }
    }

    #[test]
    fn test_minimal() {
        assert_eq!(
            "SELECT * FROM employees;",
            render_query(&query(vec![SelectTarget::Wildcard]))
        );
    }

    #[test]
    fn test_all_clauses() {
        let mut query = query(vec![
            SelectTarget::Column("department".into()),
            SelectTarget::Aggregate(AggregateCall {
                function: AggregateFunction::Count,
                argument: None,
            }),
        ]);
        query.filter.push(
            Connective::And,
            condition(
                "age",
                Operator::Between,
                Operands::Range(
                    LiteralValue::Number("20".into()),
                    LiteralValue::Number("30".into()),
                ),
            ),
        );
        query.filter.push(
            Connective::Or,
            condition(
                "name",
                Operator::Like,
                Operands::Single(LiteralValue::Text("o'b".into())),
            ),
        );
        query.group_by = vec!["department".into()];
        query.having.push(
            Connective::And,
            Condition {
                subject: Subject::Aggregate(AggregateCall {
                    function: AggregateFunction::Avg,
                    argument: Some("salary".into()),
                }),
                operator: Operator::GreaterOrEqual,
                operands: Operands::Single(LiteralValue::Number("1_000".into())),
            },
        );
        query.order_by = vec!["department".into()];
        query.order_direction = Some(OrderDirection::Descending);

        assert_eq!(
            "SELECT department, COUNT(*) FROM employees WHERE age BETWEEN 20 AND 30 OR name LIKE '%o''b%' GROUP BY department HAVING AVG(salary) >= 1000 ORDER BY department DESC;",
            render_query(&query)
        );
    }

    #[test]
    fn test_text_is_quoted() {
        let mut query = query(vec![SelectTarget::Column("name".into())]);
        query.filter.push(
            Connective::And,
            condition(
                "name",
                Operator::NotEquals,
                Operands::Single(LiteralValue::Text("It's".into())),
            ),
        );

        assert_eq!(
            "SELECT name FROM employees WHERE name != 'It''s';",
            render_query(&query)
        );
    }

    #[test]
    fn test_direction_needs_columns() {
        let mut query = query(vec![SelectTarget::Wildcard]);
        query.order_direction = Some(OrderDirection::Ascending);

        assert_eq!("SELECT * FROM employees;", render_query(&query));
    }
}
