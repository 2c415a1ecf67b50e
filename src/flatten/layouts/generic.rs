use crate::error::RecordError;
use crate::flatten::layouts::{format_fields, RowLayout};
use crate::flatten::types::{ColumnGroup, Expansion, RowDraft};
use crate::source::Record;
use serde_json::Value;
use std::collections::BTreeMap;

const GROUPS: &[ColumnGroup] = &[ColumnGroup {
    name: "fields",
    prefix: "",
}];

/// Any record: the top-level keys of a JSON object become columns
///
/// A record that is not a JSON object is kept whole, as text, in `_raw`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericLayout;

impl RowLayout for GenericLayout {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn fixed_columns(&self) -> Vec<&'static str> {
        vec!["_raw"]
    }

    fn groups(&self) -> &'static [ColumnGroup] {
        GROUPS
    }

    fn expand(&self, record: &Record) -> Result<Expansion, RecordError> {
        let draft = match record.document() {
            Ok(document) => match document.as_ref() {
                Value::Object(fields) => {
                    RowDraft::new(vec![String::new()]).with_group(format_fields(fields))
                }
                _ => raw(record),
            },
            Err(_) => raw(record),
        };

        Ok(Expansion {
            rows: vec![draft],
            ..Expansion::default()
        })
    }
}

fn raw(record: &Record) -> RowDraft {
    RowDraft::new(vec![record.lossy_text().into_owned()]).with_group(BTreeMap::new())
}
