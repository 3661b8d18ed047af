//! Per-model lookup table from express id to record.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::engine::ParsingEngine;
use crate::error::ViewerError;
use crate::model::{ElementRecord, ExpressId, ModelHandle};

/// Element types shown under their own heading; everything else is "Other".
const PRIORITY_CATEGORIES: &[(&str, &str)] = &[
    ("IFCWALL", "Walls"),
    ("IFCWALLSTANDARDCASE", "Walls"),
    ("IFCDOOR", "Doors"),
    ("IFCWINDOW", "Windows"),
    ("IFCSLAB", "Slabs"),
    ("IFCROOF", "Roofs"),
    ("IFCCOLUMN", "Columns"),
    ("IFCBEAM", "Beams"),
    ("IFCSTAIR", "Stairs"),
    ("IFCSTAIRFLIGHT", "Stairs"),
    ("IFCRAILING", "Railings"),
    ("IFCCOVERING", "Coverings"),
    ("IFCCURTAINWALL", "Curtain walls"),
    ("IFCFURNISHINGELEMENT", "Furniture"),
    ("IFCFLOWFIXTURE", "Fixtures"),
    ("IFCSANITARYTERMINAL", "Fixtures"),
    ("IFCFLOWTERMINAL", "Fixtures"),
];

/// Category label of an IFC type tag.
#[must_use]
pub fn category_of(type_tag: &str) -> &'static str {
    PRIORITY_CATEGORIES
        .iter()
        .find(|(tag, _)| *tag == type_tag)
        .map_or("Other", |(_, name)| name)
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub type_tag: String,
    pub record: ElementRecord,
}

/// Number of lines of one IFC type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub category: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct LineIndex {
    handle: ModelHandle,
    entries: HashMap<ExpressId, IndexEntry>,
}

impl LineIndex {
    #[must_use]
    pub fn handle(&self) -> ModelHandle {
        self.handle
    }

    #[must_use]
    pub fn get(&self, id: ExpressId) -> Option<&IndexEntry> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ExpressId) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExpressId, &IndexEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    /// Ids of every line with `type_tag`, ascending. Case-insensitive.
    #[must_use]
    pub fn ids_of_type(&self, type_tag: &str) -> Vec<ExpressId> {
        let mut ids: Vec<ExpressId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.type_tag.eq_ignore_ascii_case(type_tag))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Line count per type, most frequent first.
    #[must_use]
    pub fn type_summary(&self) -> Vec<TypeCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.type_tag.as_str()).or_insert(0) += 1;
        }

        let mut summary: Vec<TypeCount> = counts
            .into_iter()
            .map(|(tag, count)| TypeCount {
                type_tag: tag.to_string(),
                category: category_of(tag),
                count,
            })
            .collect();
        summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.type_tag.cmp(&b.type_tag)));
        summary
    }
}

/// Walks every line of an open model once and indexes it by id.
///
/// The model is left untouched. When the engine reports an id twice the
/// later record replaces the earlier one.
pub fn build_index<E: ParsingEngine + ?Sized>(
    engine: &E,
    handle: ModelHandle,
) -> Result<LineIndex, ViewerError> {
    if !engine.is_open(handle) {
        return Err(ViewerError::ModelNotOpen { handle });
    }

    let lines = engine.enumerate_lines(handle)?;
    let mut entries = HashMap::with_capacity(lines.len());

    for id in lines {
        let record = engine.get_line(handle, id)?;
        let entry = IndexEntry {
            type_tag: record.type_tag.clone(),
            record,
        };
        if entries.insert(id, entry).is_some() {
            let duplicate = ViewerError::DuplicateIdentifier { handle, id };
            warn!(%handle, %id, "{duplicate}");
        }
    }

    debug!(%handle, lines = entries.len(), "built line index");
    Ok(LineIndex { handle, entries })
}

/// An open model that is closed when dropped.
///
/// Holds the engine by reference so a failed load path cannot leak the
/// model. Call [`keep`](Self::keep) to hand the model over instead.
#[must_use]
pub struct OpenModel<'e, E: ParsingEngine + ?Sized> {
    engine: &'e E,
    handle: ModelHandle,
    armed: bool,
}

impl<'e, E: ParsingEngine + ?Sized> OpenModel<'e, E> {
    pub fn open(engine: &'e E, bytes: &[u8]) -> Result<Self, ViewerError> {
        let handle = engine.open(bytes)?;
        Ok(Self {
            engine,
            handle,
            armed: true,
        })
    }

    #[must_use]
    pub fn handle(&self) -> ModelHandle {
        self.handle
    }

    /// Disarms the guard; the caller now owns closing the model.
    pub fn keep(mut self) -> ModelHandle {
        self.armed = false;
        self.handle
    }
}

impl<E: ParsingEngine + ?Sized> Drop for OpenModel<'_, E> {
    fn drop(&mut self) {
        if std::mem::take(&mut self.armed) {
            self.engine.close(self.handle);
        }
    }
}

/// Opens `bytes`, indexes the model and closes it again.
pub fn index_bytes<E: ParsingEngine + ?Sized>(
    engine: &E,
    bytes: &[u8],
) -> Result<LineIndex, ViewerError> {
    let model = OpenModel::open(engine, bytes)?;
    build_index(engine, model.handle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;
    use pretty_assertions::assert_eq;

    #[test]
    fn index_matches_engine_types() {
        let engine = FakeEngine::with_lines(&[(42, "IFCWALL"), (7, "IFCDOOR"), (3, "IFCWALL")]);
        let handle = engine.open(b"x").unwrap();
        let index = build_index(&engine, handle).unwrap();

        assert_eq!(index.len(), 3);
        for (id, entry) in index.iter() {
            assert_eq!(entry.type_tag, engine.get_element_type(handle, id).unwrap());
            assert_eq!(entry.record.id, id);
        }
        assert_eq!(index.ids_of_type("ifcwall"), vec![ExpressId(3), ExpressId(42)]);
        assert!(engine.is_open(handle));
    }

    #[test]
    fn duplicate_ids_keep_the_last_record() {
        let engine = FakeEngine::with_lines(&[(1, "IFCWALL"), (2, "IFCSLAB"), (1, "IFCDOOR")]);
        let handle = engine.open(b"x").unwrap();
        let index = build_index(&engine, handle).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(ExpressId(1)).unwrap().type_tag, "IFCDOOR");
    }

    #[test]
    fn closed_model_is_rejected() {
        let engine = FakeEngine::with_lines(&[(1, "IFCWALL")]);
        let handle = engine.open(b"x").unwrap();
        engine.close(handle);
        assert!(matches!(
            build_index(&engine, handle),
            Err(ViewerError::ModelNotOpen { .. })
        ));
    }

    #[test]
    fn index_bytes_closes_the_model_once() {
        let engine = FakeEngine::with_lines(&[(1, "IFCWALL")]);
        let index = index_bytes(&engine, b"x").unwrap();
        assert_eq!(engine.close_count(index.handle()), 1);
        assert!(engine.open.lock().unwrap().is_empty());
    }

    #[test]
    fn index_bytes_closes_the_model_on_failure() {
        let engine = FakeEngine::broken_at(2, &[(1, "IFCWALL"), (2, "IFCDOOR")]);
        assert!(index_bytes(&engine, b"x").is_err());
        assert_eq!(engine.closed.lock().unwrap().len(), 1);
        assert!(engine.open.lock().unwrap().is_empty());
    }

    #[test]
    fn kept_model_stays_open() {
        let engine = FakeEngine::with_lines(&[(1, "IFCWALL")]);
        let handle = OpenModel::open(&engine, b"x").unwrap().keep();
        assert!(engine.is_open(handle));
        assert!(engine.closed.lock().unwrap().is_empty());
    }

    #[test]
    fn summary_is_sorted_by_count_then_name() {
        let engine = FakeEngine::with_lines(&[
            (1, "IFCWALL"),
            (2, "IFCDOOR"),
            (3, "IFCWALL"),
            (4, "IFCBUILDINGSTOREY"),
        ]);
        let index = index_bytes(&engine, b"x").unwrap();
        let summary = index.type_summary();

        let rows: Vec<(&str, &str, usize)> = summary
            .iter()
            .map(|t| (t.type_tag.as_str(), t.category, t.count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("IFCWALL", "Walls", 2),
                ("IFCBUILDINGSTOREY", "Other", 1),
                ("IFCDOOR", "Doors", 1),
            ]
        );
    }
}
