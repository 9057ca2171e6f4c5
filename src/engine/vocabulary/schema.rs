//! The tables and columns questions can be asked about.
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// All known tables, in the order they were declared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: Vec<Table>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: TableName,
    pub columns: Vec<ColumnName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct ColumnName(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct TableName(pub String);

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Schema { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn is_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// True if any of the tables has a column with this name.
    pub fn is_column(&self, name: &str) -> bool {
        self.tables.iter().any(|table| table.has_column(name))
    }
}

impl Table {
    pub fn new<N, C>(name: N, columns: C) -> Self
    where
        N: Into<TableName>,
        C: IntoIterator,
        C::Item: Into<ColumnName>,
    {
        Table {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|known| known == column)
    }
}

impl ColumnName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for ColumnName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for ColumnName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TableName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for TableName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl From<&str> for ColumnName {
    fn from(name: &str) -> ColumnName {
        ColumnName(name.to_string())
    }
}

impl From<String> for ColumnName {
    fn from(name: String) -> ColumnName {
        ColumnName(name)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> TableName {
        TableName(name.to_string())
    }
}

impl From<String> for TableName {
    fn from(name: String) -> TableName {
        TableName(name)
    }
}

impl AsRef<str> for ColumnName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ColumnName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
