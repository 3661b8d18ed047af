//! In-memory engine for unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::engine::ParsingEngine;
use crate::error::{ParseError, ViewerError};
use crate::model::{
    Attributes, ElementProperties, ElementRecord, ElementRef, ExpressId, ModelHandle, Value,
};
use crate::scene::GeometryFragment;

/// Serves a fixed list of `(id, type)` lines for every model it opens.
/// Empty input fails to parse. Lines may repeat an id.
#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    pub lines: Vec<(u32, &'static str)>,
    /// `get_line` fails for this id.
    pub broken: Option<u32>,
    pub open: Mutex<HashSet<ModelHandle>>,
    pub closed: Mutex<Vec<ModelHandle>>,
    next: AtomicU32,
}

impl FakeEngine {
    pub fn with_lines(lines: &[(u32, &'static str)]) -> Self {
        Self {
            lines: lines.to_vec(),
            ..Self::default()
        }
    }

    /// Like [`with_lines`](Self::with_lines), but `get_line` fails for `id`.
    pub fn broken_at(id: u32, lines: &[(u32, &'static str)]) -> Self {
        Self {
            broken: Some(id),
            ..Self::with_lines(lines)
        }
    }

    pub fn close_count(&self, handle: ModelHandle) -> usize {
        self.closed
            .lock()
            .unwrap()
            .iter()
            .filter(|h| **h == handle)
            .count()
    }

    fn check(&self, handle: ModelHandle) -> Result<(), ViewerError> {
        if self.is_open(handle) {
            Ok(())
        } else {
            Err(ViewerError::ModelNotOpen { handle })
        }
    }

    fn type_of(&self, id: ExpressId) -> Option<&'static str> {
        self.lines
            .iter()
            .rev()
            .find(|(line, _)| *line == id.0)
            .map(|(_, ty)| *ty)
    }
}

impl ParsingEngine for FakeEngine {
    fn open(&self, bytes: &[u8]) -> Result<ModelHandle, ParseError> {
        if bytes.is_empty() {
            return Err(ParseError::InvalidStep {
                message: "empty input".into(),
            });
        }
        let handle = ModelHandle(self.next.fetch_add(1, Ordering::Relaxed));
        self.open.lock().unwrap().insert(handle);
        Ok(handle)
    }

    fn is_open(&self, handle: ModelHandle) -> bool {
        self.open.lock().unwrap().contains(&handle)
    }

    fn close(&self, handle: ModelHandle) {
        self.open.lock().unwrap().remove(&handle);
        self.closed.lock().unwrap().push(handle);
    }

    fn enumerate_lines(&self, handle: ModelHandle) -> Result<Vec<ExpressId>, ViewerError> {
        self.check(handle)?;
        Ok(self.lines.iter().map(|(id, _)| ExpressId(*id)).collect())
    }

    fn get_line(&self, handle: ModelHandle, id: ExpressId) -> Result<ElementRecord, ViewerError> {
        self.check(handle)?;
        let not_found = ViewerError::ElementNotFound {
            element: ElementRef::new(handle, id),
        };
        if self.broken == Some(id.0) {
            return Err(not_found);
        }
        let type_tag = self.type_of(id).ok_or(not_found)?;
        let mut attributes = Attributes::default();
        attributes.push("Name", Value::Text(format!("{type_tag} {id}")));
        Ok(ElementRecord {
            id,
            type_tag: type_tag.to_string(),
            attributes,
        })
    }

    fn get_element_type(&self, handle: ModelHandle, id: ExpressId) -> Result<String, ViewerError> {
        self.check(handle)?;
        self.type_of(id)
            .map(str::to_string)
            .ok_or(ViewerError::ElementNotFound {
                element: ElementRef::new(handle, id),
            })
    }

    async fn get_properties(&self, element: ElementRef) -> Result<ElementProperties, ViewerError> {
        let record = self.get_line(element.model, element.id)?;
        Ok(ElementProperties {
            element,
            type_tag: record.type_tag,
            attributes: record.attributes,
            property_sets: Vec::new(),
            type_object: None,
            container: None,
            materials: Vec::new(),
        })
    }

    fn geometry(&self, handle: ModelHandle) -> Result<Vec<GeometryFragment>, ViewerError> {
        self.check(handle)?;
        Ok(Vec::new())
    }
}
