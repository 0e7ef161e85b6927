use crate::node::ListNode;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    ops::Not,
};

///
/// Index
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Index {
    pub name: String,
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexOptions::is_default")]
    pub options: IndexOptions,
}

impl Index {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            options: IndexOptions::default(),
        }
    }

    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.options.unique = unique;
        self
    }

    #[must_use]
    pub const fn sparse(mut self, sparse: bool) -> Self {
        self.options.sparse = sparse;
        self
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.join(", ");

        if self.options.unique {
            write!(f, "{} UNIQUE ({fields})", self.name)
        } else {
            write!(f, "{} ({fields})", self.name)
        }
    }
}

impl ListNode for Index {
    fn key(&self) -> &str {
        &self.name
    }

    fn merge(&mut self, other: Self) {
        for field in other.fields {
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self.options.unique |= other.options.unique;
        self.options.sparse |= other.options.sparse;
    }
}

///
/// IndexOptions
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexOptions {
    #[serde(default, skip_serializing_if = "Not::not")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub sparse: bool,
}

impl IndexOptions {
    #[must_use]
    pub const fn is_default(&self) -> bool {
        !self.unique && !self.sparse
    }
}
