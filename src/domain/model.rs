use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One field of a flattened event. DataWave may return the same field name
/// several times within a single event, in which case the values collapse
/// into `Multiple` preserving the order they were encountered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Append another occurrence of the same field, upgrading a single value
    /// to a list on the second occurrence.
    pub fn push(&mut self, value: String) {
        match self {
            FieldValue::Single(existing) => {
                *self = FieldValue::Multiple(vec![std::mem::take(existing), value]);
            }
            FieldValue::Multiple(values) => values.push(value),
        }
    }

    /// The first value encountered for this field.
    pub fn first(&self) -> &str {
        match self {
            FieldValue::Single(v) => v,
            FieldValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Single(v) => f.write_str(v),
            FieldValue::Multiple(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

/// A flattened event: field name to value(s). Insertion-ordered so printing
/// and serialization are deterministic.
pub type FlatRecord = IndexMap<String, FieldValue>;

/// Wire shape of one page of query results, as returned by the `create`/`next`
/// endpoints. Unknown keys in the payload are ignored; missing required keys
/// are structural errors surfaced at deserialization.
#[derive(Debug, Deserialize)]
pub struct RawResponse {
    #[serde(rename = "Events")]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "Fields")]
    pub fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "Value")]
    pub value: RawValue,
}

#[derive(Debug, Deserialize)]
pub struct RawValue {
    pub value: String,
}

/// Wire shape of the dictionary endpoint response.
#[derive(Debug, Deserialize)]
pub struct DictionaryResponse {
    #[serde(rename = "MetadataFields")]
    pub fields: Vec<MetadataField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataField {
    pub field_name: String,
    pub data_type: String,
    pub forward_indexed: bool,
    pub reverse_indexed: bool,
    #[serde(rename = "Types")]
    pub types: Option<Vec<String>>,
    pub tokenized: bool,
    pub normalized: bool,
    pub index_only: bool,
    #[serde(rename = "Descriptions")]
    pub descriptions: Option<serde_json::Value>,
    pub last_updated: String,
}

/// Name and cluster IP of a pod resolved from its label selector.
#[derive(Debug, Clone)]
pub struct PodAddress {
    pub name: String,
    pub ip: String,
}

/// Label selector for one of the well-known DataWave pods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodSelector {
    pub labels: &'static str,
}

pub const WEB_DATAWAVE: PodSelector = PodSelector {
    labels: "application=datawave-monolith",
};
pub const WEB_DICTIONARY: PodSelector = PodSelector {
    labels: "application=dictionary",
};
pub const WEB_AUTHORIZATION: PodSelector = PodSelector {
    labels: "application=authorization",
};
pub const YARN_RM: PodSelector = PodSelector {
    labels: "component=yarn-rm",
};
pub const HDFS_NAMENODE: PodSelector = PodSelector {
    labels: "component=hdfs-nn",
};
