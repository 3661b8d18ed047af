use serde::Serialize;
use std::fmt;

/// Process-unique handle of an opened model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModelHandle(pub u32);

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {}", self.0)
    }
}

/// STEP instance number (`#42`). Unique within one model only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ExpressId(pub u32);

impl fmt::Display for ExpressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element qualified by the model it lives in.
///
/// Express ids repeat across models, so anything that crosses a model
/// boundary carries the pair rather than a bare id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElementRef {
    pub model: ModelHandle,
    pub id: ExpressId,
}

impl ElementRef {
    #[must_use]
    pub fn new(model: ModelHandle, id: ExpressId) -> Self {
        Self { model, id }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.id, self.model)
    }
}
