use indexmap::map::Entry;

use crate::domain::model::{FieldValue, FlatRecord, RawResponse};
use crate::utils::error::{DwvError, Result};

/// Placeholder inserted when a filtered record lacks one of the requested
/// fields.
pub const NOT_FOUND: &str = "Not Found";

/// Flatten a raw query response into one record per event.
///
/// DataWave's return shape is deeply nested: the payload holds an `Events`
/// list, each event holds a `Fields` list, and each field holds a `name` and
/// a `Value` object whose inner `value` is the string we care about. This
/// pares that down to a list of flat name-to-value records, one per event, in
/// event order. A field name repeated within one event becomes a multi-value
/// entry preserving first-seen order, whether or not the duplicates were
/// adjacent. Events are never merged with each other.
///
/// Anything that does not conform to the expected shape is an error; there is
/// no partial recovery.
pub fn parse_events(raw: serde_json::Value) -> Result<Vec<FlatRecord>> {
    let raw: RawResponse =
        serde_json::from_value(raw).map_err(|source| DwvError::MalformedResponse {
            context: "events",
            source,
        })?;

    let records = raw
        .events
        .into_iter()
        .map(|event| {
            let mut record = FlatRecord::new();
            for field in event.fields {
                match record.entry(field.name) {
                    Entry::Occupied(mut entry) => entry.get_mut().push(field.value.value),
                    Entry::Vacant(entry) => {
                        entry.insert(FieldValue::Single(field.value.value));
                    }
                }
            }
            record
        })
        .collect();
    Ok(records)
}

/// Project records down to the fields named in a comma-separated filter.
///
/// With no filter (or an empty one) the records pass through unchanged. With
/// a filter, every output record carries exactly the requested keys, in
/// request order; a key absent from a particular record is filled with the
/// [`NOT_FOUND`] sentinel rather than dropping or failing that record. Only
/// when none of the requested fields occurs in any record is the whole call
/// an error, since that usually means a typo in the field list.
pub fn filter_events(records: Vec<FlatRecord>, filter_on: Option<&str>) -> Result<Vec<FlatRecord>> {
    let keys: Vec<String> = match filter_on {
        None => return Ok(records),
        Some(spec) if spec.is_empty() => return Ok(records),
        Some(spec) => spec.split(',').map(str::to_string).collect(),
    };

    let found_any = keys
        .iter()
        .any(|key| records.iter().any(|record| record.contains_key(key)));
    if !found_any {
        return Err(DwvError::FieldNotFound { fields: keys });
    }

    let filtered = records
        .iter()
        .map(|record| {
            keys.iter()
                .map(|key| {
                    let value = record
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| FieldValue::from(NOT_FOUND));
                    (key.clone(), value)
                })
                .collect()
        })
        .collect();
    Ok(filtered)
}

/// Parse and filter in one pass, the shape every query page goes through.
pub fn parse_and_filter_events(
    raw: serde_json::Value,
    filter_on: Option<&str>,
) -> Result<Vec<FlatRecord>> {
    filter_events(parse_events(raw)?, filter_on)
}
