pub use query_rendering::render_query;
use crate::engine::ConditionList;
use std::fmt::{Display, Formatter};

mod query_rendering;

struct OptionalClause<'a, T> {
    intro: &'a str,
    items: &'a [T],
}

impl<'a, T> OptionalClause<'a, T> {
    fn group_by(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "GROUP BY",
            items,
        }
    }

    fn order_by(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "ORDER BY",
            items,
        }
    }
}

/// Displays things like " GROUP BY 1, 2, 3", and " ORDER BY 1, 2, 3".
/// Nothing at all is displayed if there are no items.
impl<'a, T> Display for OptionalClause<'a, T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self { intro, items } = self;

        if let Some((first, rest)) = items.split_first() {
            write!(f, " {intro} {first}")?;

            for item in rest {
                write!(f, ", {item}")?;
            }
        }

        Ok(())
    }
}

/// Like [OptionalClause], but each condition keeps its own AND or OR.
struct ConditionClause<'a> {
    intro: &'a str,
    conditions: &'a ConditionList,
}

impl<'a> ConditionClause<'a> {
    fn filter(conditions: &'a ConditionList) -> Self {
        ConditionClause {
            intro: "WHERE",
            conditions,
        }
    }

    fn having(conditions: &'a ConditionList) -> Self {
        ConditionClause {
            intro: "HAVING",
            conditions,
        }
    }
}

impl Display for ConditionClause<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (connective, condition) in self.conditions.iter() {
            match connective {
                None => write!(f, " {} {condition}", self.intro)?,
                Some(connective) => write!(f, " {connective} {condition}")?,
            }
        }

        Ok(())
    }
}
