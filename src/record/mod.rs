//! Film record model
//!
//! A [`Record`] is one validated film row. Strategies read rows as
//! [`RawRecord`]s (loosely typed, straight from a rendered table or a JSON
//! body) and turn them into records with [`normalize`].

mod normalize;

pub use normalize::normalize;

use serde::{Deserialize, Serialize};

/// One validated award-film record
///
/// Records are immutable once built; the only constructor is [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub year: i32,
    pub nominations: u32,
    pub awards: u32,
    pub best_picture: bool,
}

impl Record {
    /// Returns true when the record does not claim more wins than nominations
    pub fn is_consistent(&self) -> bool {
        self.awards <= self.nominations
    }
}

/// A single loosely-typed field value as it appears in a source row
///
/// Rendered tables yield text; the JSON endpoint yields numbers and booleans.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawField {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawField {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for RawField {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for RawField {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl std::fmt::Display for RawField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Unvalidated film fields read from one table row or JSON object
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(default)]
    pub title: Option<RawField>,
    #[serde(default)]
    pub year: Option<RawField>,
    #[serde(default)]
    pub nominations: Option<RawField>,
    #[serde(default)]
    pub awards: Option<RawField>,
    #[serde(default)]
    pub best_picture: Option<RawField>,
}

impl From<&Record> for RawRecord {
    fn from(record: &Record) -> Self {
        Self {
            title: Some(RawField::Text(record.title.clone())),
            year: Some(RawField::Int(record.year.into())),
            nominations: Some(RawField::Int(record.nominations.into())),
            awards: Some(RawField::Int(record.awards.into())),
            best_picture: Some(RawField::Bool(record.best_picture)),
        }
    }
}
