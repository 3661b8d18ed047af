pub mod geometry;
pub mod ifc;
pub mod schema;
pub mod step;

pub use crate::error::ParseError;
pub use ifc::StepEngine;
pub use step::{StepEntity, StepFile};
