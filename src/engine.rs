//! Contract between the viewer core and an IFC parsing engine.
//!
//! The core only talks to the engine through [`ParsingEngine`], so an
//! engine may parse in-process ([`crate::parser::StepEngine`]) or proxy a
//! worker, as long as its results come back before they are consumed.

use std::future::Future;

use crate::error::{ParseError, ViewerError};
use crate::model::{ElementProperties, ElementRecord, ElementRef, ExpressId, ModelHandle};
use crate::scene::GeometryFragment;

pub trait ParsingEngine: Send + Sync {
    /// Parses `bytes` and keeps the model open until [`close`](Self::close).
    fn open(&self, bytes: &[u8]) -> Result<ModelHandle, ParseError>;

    fn is_open(&self, handle: ModelHandle) -> bool;

    /// Releases the model. Closing an unknown handle is a no-op.
    fn close(&self, handle: ModelHandle);

    /// Ids of every line in the model, in file order.
    fn enumerate_lines(&self, handle: ModelHandle) -> Result<Vec<ExpressId>, ViewerError>;

    fn get_line(&self, handle: ModelHandle, id: ExpressId) -> Result<ElementRecord, ViewerError>;

    fn get_element_type(&self, handle: ModelHandle, id: ExpressId)
        -> Result<String, ViewerError>;

    /// Attributes plus resolved relationships of one element.
    fn get_properties(
        &self,
        element: ElementRef,
    ) -> impl Future<Output = Result<ElementProperties, ViewerError>> + Send;

    /// Tessellated geometry, tagged with the model handle and per-vertex ids.
    fn geometry(&self, handle: ModelHandle) -> Result<Vec<GeometryFragment>, ViewerError>;
}
