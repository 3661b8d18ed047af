//! Viewer session: loaded models, scene, camera and interaction state.
//!
//! All pointer handling goes through [`Session`]. Hover and select updates
//! are synchronous; inspection is handed out as an [`InspectRequest`] so
//! the caller can await it without holding the session, then feed the
//! outcome back through [`Session::complete_inspect`].

use glam::Vec2;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::engine::ParsingEngine;
use crate::error::ViewerError;
use crate::highlight::{Channel, Highlighter};
use crate::index::{build_index, LineIndex, OpenModel};
use crate::inspect::{inspect, InspectGate, InspectOutcome, InspectRequest};
use crate::model::{ElementProperties, ElementRef, ModelHandle};
use crate::pick::{pick, Viewport};
use crate::scene::{PerspectiveCamera, Scene};

#[derive(Debug)]
pub struct LoadedModel {
    pub name: String,
    pub index: Arc<LineIndex>,
}

/// Result shown in the inspector.
#[derive(Debug)]
pub struct Inspection {
    pub element: ElementRef,
    pub result: Result<ElementProperties, ViewerError>,
}

pub struct Session<E: ParsingEngine> {
    engine: Arc<E>,
    models: BTreeMap<ModelHandle, LoadedModel>,
    scene: Scene,
    camera: PerspectiveCamera,
    viewport: Viewport,
    highlighter: Highlighter,
    gate: InspectGate,
    inspection: Option<Inspection>,
}

impl<E: ParsingEngine> Session<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self::with_config(engine, &ViewerConfig::default())
    }

    pub fn with_config(engine: Arc<E>, config: &ViewerConfig) -> Self {
        let mut scene = Scene::new();
        if config.grid.visible {
            scene.add_grid(config.grid.size, config.grid.divisions);
        }
        let viewport = Viewport::sized(config.viewport.width, config.viewport.height);
        let mut camera = config.camera;
        camera.aspect = viewport.aspect();

        Self {
            engine,
            models: BTreeMap::new(),
            scene,
            camera,
            viewport,
            highlighter: Highlighter::new(config.hover, config.select),
            gate: InspectGate::default(),
            inspection: None,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Opens, indexes and tessellates a model. On any failure the model is
    /// closed again and the session is unchanged.
    pub fn load_model(&mut self, bytes: &[u8], name: &str) -> Result<ModelHandle, ViewerError> {
        let engine = Arc::clone(&self.engine);
        let guard = OpenModel::open(engine.as_ref(), bytes)?;
        let index = build_index(engine.as_ref(), guard.handle())?;
        let fragments = engine.geometry(guard.handle())?;
        let handle = guard.keep();

        let faces: usize = fragments.iter().map(|f| f.face_count()).sum();
        for fragment in fragments {
            self.scene.add_fragment(fragment);
        }
        info!(%handle, name, lines = index.len(), faces, "loaded model");

        self.models.insert(
            handle,
            LoadedModel {
                name: name.to_string(),
                index: Arc::new(index),
            },
        );
        Ok(handle)
    }

    /// Unloads a model and releases it in the engine. Returns whether it
    /// was loaded.
    pub fn close_model(&mut self, handle: ModelHandle) -> bool {
        if self.models.remove(&handle).is_none() {
            return false;
        }
        self.highlighter.forget_model(handle, &mut self.scene);
        self.scene.remove_model(handle);
        if self
            .inspection
            .as_ref()
            .is_some_and(|i| i.element.model == handle)
        {
            self.inspection = None;
            self.gate.invalidate();
        }
        self.engine.close(handle);
        debug!(%handle, "model unloaded");
        true
    }

    pub fn models(&self) -> impl Iterator<Item = (ModelHandle, &LoadedModel)> {
        self.models.iter().map(|(h, m)| (*h, m))
    }

    #[must_use]
    pub fn model(&self, handle: ModelHandle) -> Option<&LoadedModel> {
        self.models.get(&handle)
    }

    #[must_use]
    pub fn index(&self, handle: ModelHandle) -> Option<&LineIndex> {
        self.models.get(&handle).map(|m| m.index.as_ref())
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Sets the screen rectangle and matches the camera aspect to it.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.aspect = viewport.aspect();
    }

    #[must_use]
    pub fn hovered(&self) -> Option<ElementRef> {
        self.highlighter.active(Channel::Hover)
    }

    #[must_use]
    pub fn selected(&self) -> Option<ElementRef> {
        self.highlighter.active(Channel::Select)
    }

    #[must_use]
    pub fn inspection(&self) -> Option<&Inspection> {
        self.inspection.as_ref()
    }

    #[must_use]
    pub fn inspect_pending(&self) -> bool {
        self.gate.is_pending()
    }

    /// Element under `pointer`, without touching any highlight.
    #[must_use]
    pub fn element_at(&self, pointer: Vec2) -> Option<ElementRef> {
        pick(pointer, &self.viewport, &self.camera, &self.scene)
    }

    /// Hover channel update for a pointer move.
    pub fn pointer_moved(&mut self, pointer: Vec2) -> Option<ElementRef> {
        let target = self.element_at(pointer);
        self.highlighter
            .apply(Channel::Hover, target, &mut self.scene)
    }

    /// The pointer left the viewport.
    pub fn pointer_left(&mut self) {
        self.highlighter.clear(Channel::Hover, &mut self.scene);
    }

    /// Select channel update for a click. A hit also yields the inspect
    /// request for the clicked element; a miss leaves the inspector as is.
    pub fn clicked(&mut self, pointer: Vec2) -> Option<InspectRequest<E>> {
        let target = self.element_at(pointer);
        let element = self
            .highlighter
            .apply(Channel::Select, target, &mut self.scene)?;
        let index = Arc::clone(&self.models.get(&element.model)?.index);
        let ticket = self.gate.issue();
        debug!(%element, ?ticket, "inspect requested");
        Some(InspectRequest::new(
            ticket,
            element,
            Arc::clone(&self.engine),
            index,
        ))
    }

    /// Stores an inspect result unless a newer request was issued since.
    /// Returns whether the result was kept.
    pub fn complete_inspect(&mut self, outcome: InspectOutcome) -> bool {
        if !self.gate.accept(outcome.ticket) {
            debug!(element = %outcome.element, ticket = ?outcome.ticket, "discarded stale inspect result");
            return false;
        }
        self.inspection = Some(Inspection {
            element: outcome.element,
            result: outcome.result,
        });
        true
    }

    /// Inspects any element of a loaded model directly. References into a
    /// closed or reloaded model are not found.
    pub async fn inspect(&self, element: ElementRef) -> Result<ElementProperties, ViewerError> {
        let Some(model) = self.models.get(&element.model) else {
            return Err(ViewerError::ElementNotFound { element });
        };
        inspect(self.engine.as_ref(), &model.index, element).await
    }
}

impl<E: ParsingEngine> Drop for Session<E> {
    fn drop(&mut self) {
        for handle in std::mem::take(&mut self.models).into_keys() {
            self.engine.close(handle);
        }
    }
}
