//! # IFC Picker
//!
//! Resolves pointer positions over a 3D view of IFC building models to the
//! building elements under them, and inspects those elements' properties.
//!
//! ## Pipeline
//!
//! - [`index`] builds a per-model lookup table of every STEP line
//! - [`pick`] casts the pointer ray into the [`scene`] and maps the hit
//!   face back to an element
//! - [`highlight`] keeps one hover and one selection highlight
//! - [`inspect`] fetches an element's attributes and relationships
//! - [`session`] ties the above together for one viewer
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use glam::Vec2;
//! use ifc_picker::parser::StepEngine;
//! use ifc_picker::pick::Viewport;
//! use ifc_picker::session::Session;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::new(Arc::new(StepEngine::new()));
//! let bytes = std::fs::read("model.ifc")?;
//! session.load_model(&bytes, "model.ifc")?;
//! session.set_viewport(Viewport::sized(1280.0, 720.0));
//!
//! if let Some(request) = session.clicked(Vec2::new(640.0, 360.0)) {
//!     let outcome = request.run().await;
//!     session.complete_inspect(outcome);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod highlight;
pub mod index;
pub mod inspect;
pub mod model;
pub mod parser;
pub mod pick;
pub mod scene;
pub mod session;
pub mod ui;

#[cfg(test)]
mod testing;
