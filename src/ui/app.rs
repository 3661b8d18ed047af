use color_eyre::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use glam::Vec2;
use ratatui::layout::Rect;
use ratatui::{DefaultTerminal, Frame};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::engine::ParsingEngine;
use crate::export::properties_json;
use crate::inspect::InspectOutcome;
use crate::pick::Viewport;
use crate::session::Session;
use crate::ui::viewport::{PickMap, CELL_ASPECT};

const ORBIT_STEP: f32 = 10.0;
const ZOOM_STEP: f32 = 0.85;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct App<E: ParsingEngine + 'static> {
    pub session: Session<E>,
    pub pick_map: PickMap,
    pub viewport_area: Rect,
    pub inspector_scroll: u16,
    pub should_quit: bool,
    runtime: Handle,
    results_tx: UnboundedSender<InspectOutcome>,
    results_rx: UnboundedReceiver<InspectOutcome>,
    stale_map: bool,
}

impl<E: ParsingEngine + 'static> App<E> {
    /// Inspect requests are spawned on `runtime`.
    #[must_use]
    pub fn new(session: Session<E>, runtime: Handle) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            session,
            pick_map: PickMap::default(),
            viewport_area: Rect::default(),
            inspector_scroll: 0,
            should_quit: false,
            runtime,
            results_tx,
            results_rx,
            stale_map: true,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.drain_results();
            if event::poll(POLL_INTERVAL)? {
                self.handle_event(event::read()?);
            }
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = super::dashboard::viewport_area(frame.area());
        if area != self.viewport_area {
            self.viewport_area = area;
            self.stale_map = true;
        }
        if self.stale_map {
            self.retrace();
        }
        super::dashboard::draw_dashboard(frame, self);
    }

    /// Matches the session viewport to the terminal area and redraws the
    /// pick map.
    fn retrace(&mut self) {
        let area = self.viewport_area;
        let viewport = Viewport::new(
            f32::from(area.x),
            f32::from(area.y),
            f32::from(area.width),
            f32::from(area.height),
        );
        self.session.set_viewport(viewport);
        if !viewport.is_degenerate() {
            self.session.camera_mut().aspect = viewport.width / (viewport.height * CELL_ASPECT);
        }
        self.pick_map = PickMap::trace(&self.session);
        self.stale_map = false;
    }

    fn drain_results(&mut self) {
        while let Ok(outcome) = self.results_rx.try_recv() {
            if self.session.complete_inspect(outcome) {
                self.inspector_scroll = 0;
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key.code),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(..) => self.stale_map = true,
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let camera = self.session.camera_mut();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => camera.orbit(-ORBIT_STEP, 0.0),
            KeyCode::Right | KeyCode::Char('l') => camera.orbit(ORBIT_STEP, 0.0),
            KeyCode::Up | KeyCode::Char('k') => camera.orbit(0.0, ORBIT_STEP),
            KeyCode::Down | KeyCode::Char('j') => camera.orbit(0.0, -ORBIT_STEP),
            KeyCode::Char('+' | '=') => camera.zoom(ZOOM_STEP),
            KeyCode::Char('-') => camera.zoom(1.0 / ZOOM_STEP),
            KeyCode::PageUp => {
                self.inspector_scroll = self.inspector_scroll.saturating_sub(5);
                return;
            }
            KeyCode::PageDown => {
                self.inspector_scroll = self.inspector_scroll.saturating_add(5);
                return;
            }
            _ => return,
        }
        self.stale_map = true;
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pointer = Vec2::new(f32::from(mouse.column) + 0.5, f32::from(mouse.row) + 0.5);
        let inside = self.viewport_area.contains((mouse.column, mouse.row).into());

        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) if inside => {
                self.session.pointer_moved(pointer);
            }
            MouseEventKind::Moved | MouseEventKind::Drag(_) => self.session.pointer_left(),
            MouseEventKind::Down(MouseButton::Left) if inside => self.click(pointer),
            MouseEventKind::ScrollUp if inside => {
                self.session.camera_mut().zoom(ZOOM_STEP);
                self.stale_map = true;
            }
            MouseEventKind::ScrollDown if inside => {
                self.session.camera_mut().zoom(1.0 / ZOOM_STEP);
                self.stale_map = true;
            }
            _ => {}
        }
    }

    fn click(&mut self, pointer: Vec2) {
        let Some(request) = self.session.clicked(pointer) else {
            return;
        };
        debug!(element = %request.element, "inspecting");
        let tx = self.results_tx.clone();
        self.runtime.spawn(async move {
            let outcome = request.run().await;
            if tx.send(outcome).is_err() {
                warn!("inspect result dropped, viewer closed");
            }
        });
    }

    /// Text of the inspector panel.
    #[must_use]
    pub fn inspector_text(&self) -> String {
        let Some(inspection) = self.session.inspection() else {
            return if self.session.inspect_pending() {
                "Loading…".to_string()
            } else {
                "Click an element to inspect it.".to_string()
            };
        };
        match &inspection.result {
            Ok(properties) => {
                properties_json(properties).unwrap_or_else(|e| format!("Error: {e}"))
            }
            Err(e) => format!("Error: {e}"),
        }
    }
}
