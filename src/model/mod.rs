pub mod element;
pub mod ids;
pub mod properties;
pub mod value;

pub use element::{Attributes, ElementRecord};
pub use ids::{ElementRef, ExpressId, ModelHandle};
pub use properties::{ElementProperties, PropertyGroup, RelatedObject};
pub use value::Value;
