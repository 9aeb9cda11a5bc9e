//! Fragment merging
//!
//! A walk keeps one [`PageFragment`] per page and merges them in page order
//! before serializing once. [`normalize`] covers the other direction: a byte
//! stream of independently serialized arrays (`[...]\n[...]`) is re-read
//! structurally and written back as one flat array.

use crate::extract::Record;
use crate::output::OutputResult;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

/// The records extracted from exactly one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageFragment {
    /// 1-based page ordinal
    pub page: u32,
    pub records: Vec<Record>,
}

impl PageFragment {
    pub fn new(page: u32, records: Vec<Record>) -> Self {
        Self { page, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Concatenates fragments into one ordered record sequence
///
/// Fragments are ordered by page ordinal; fragments of the same page keep
/// their relative order.
pub fn merge_fragments(mut fragments: Vec<PageFragment>) -> Vec<Record> {
    fragments.sort_by_key(|fragment| fragment.page);
    fragments
        .into_iter()
        .flat_map(|fragment| fragment.records)
        .collect()
}

/// Serializes with four-space indentation
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> OutputResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Turns concatenated JSON array fragments into one flat JSON array
///
/// Any whitespace may separate the fragments. A `null` fragment (an empty
/// page serialized as a nil list) contributes nothing.
pub fn normalize(raw: &[u8]) -> OutputResult<Vec<u8>> {
    let mut items: Vec<Value> = Vec::new();
    for fragment in serde_json::Deserializer::from_slice(raw).into_iter::<Option<Vec<Value>>>() {
        items.extend(fragment?.unwrap_or_default());
    }
    to_pretty_json(&items)
}
