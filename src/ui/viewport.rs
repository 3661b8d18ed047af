//! Flat per-cell rendering of the scene for the terminal.
//!
//! Every cell shows what the ray through its centre hits first. Model hits
//! are cached until the camera, the viewport or the loaded models change;
//! highlight subsets are traced per frame and drawn over the model.

use glam::Vec2;
use ratatui::style::Color;

use crate::engine::ParsingEngine;
use crate::highlight::{self, Channel};
use crate::model::ElementRef;
use crate::pick::Viewport;
use crate::session::Session;

/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Empty,
    Grid,
    Element { element: ElementRef, color: Color },
}

/// Cached first-hit grid for one viewport.
#[derive(Debug, Default)]
pub struct PickMap {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl PickMap {
    /// Traces one ray per cell of the session viewport.
    pub fn trace<E: ParsingEngine>(session: &Session<E>) -> Self {
        let viewport = session.viewport();
        let (width, height) = cell_size(viewport);
        let camera = session.camera();
        let scene = session.scene();
        let mut cells = Vec::with_capacity(usize::from(width) * usize::from(height));

        for row in 0..height {
            for col in 0..width {
                let Some(ndc) = viewport.to_ndc(cell_centre(viewport, col, row)) else {
                    cells.push(Cell::Empty);
                    continue;
                };
                let ray = camera.ray_through(ndc);
                let cell = match scene.first_model_hit(&ray) {
                    Some(hit) => crate::pick::map_to_element(&hit, scene).map_or(
                        Cell::Empty,
                        |element| Cell::Element {
                            element,
                            color: type_color(session, element),
                        },
                    ),
                    None if scene.first_helper_hit(&ray).is_some() => Cell::Grid,
                    None => Cell::Empty,
                };
                cells.push(cell);
            }
        }

        Self {
            width,
            height,
            cells,
        }
    }

    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn get(&self, col: u16, row: u16) -> Cell {
        if col >= self.width || row >= self.height {
            return Cell::Empty;
        }
        self.cells[usize::from(row) * usize::from(self.width) + usize::from(col)]
    }
}

/// Highlight drawn over a cell this frame, select before hover.
pub fn overlay<E: ParsingEngine>(session: &Session<E>, col: u16, row: u16) -> Option<Color> {
    let viewport = session.viewport();
    let ndc = viewport.to_ndc(cell_centre(viewport, col, row))?;
    let ray = session.camera().ray_through(ndc);

    [Channel::Select, Channel::Hover]
        .into_iter()
        .filter_map(|channel| session.scene().subset(channel))
        .find(|subset| subset.raycast(&ray).is_some())
        .map(|subset| blend(subset.material))
}

fn cell_size(viewport: &Viewport) -> (u16, u16) {
    if viewport.is_degenerate() {
        return (0, 0);
    }
    (viewport.width as u16, viewport.height as u16)
}

/// Pointer position of the centre of a viewport-relative cell.
#[must_use]
pub fn cell_centre(viewport: &Viewport, col: u16, row: u16) -> Vec2 {
    Vec2::new(
        viewport.left + f32::from(col) + 0.5,
        viewport.top + f32::from(row) + 0.5,
    )
}

fn blend(material: highlight::Material) -> Color {
    let (r, g, b) = material.color.rgb();
    let mix = |c: u8| {
        let bg = 0x1f_u8;
        (f32::from(c) * material.opacity + f32::from(bg) * (1.0 - material.opacity))
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color::Rgb(mix(r), mix(g), mix(b))
}

fn type_color<E: ParsingEngine>(session: &Session<E>, element: ElementRef) -> Color {
    let tag = session
        .index(element.model)
        .and_then(|index| index.get(element.id))
        .map_or("", |entry| entry.type_tag.as_str());
    let [r, g, b] = default_color(tag);
    Color::Rgb(r, g, b)
}

/// Flat colour per IFC type family.
#[must_use]
pub fn default_color(type_tag: &str) -> [u8; 3] {
    let upper = type_tag.to_ascii_uppercase();
    if upper.contains("CURTAINWALL") {
        [0x99, 0xb3, 0xcc]
    } else if upper.contains("WALL") {
        [0xeb, 0xd9, 0xbf]
    } else if upper.contains("SLAB") {
        [0xbf, 0xba, 0xb3]
    } else if upper.contains("ROOF") {
        [0xb8, 0x8c, 0x73]
    } else if upper.contains("BEAM") || upper.contains("COLUMN") || upper.contains("MEMBER") {
        [0x99, 0xa6, 0xb8]
    } else if upper.contains("DOOR") {
        [0x8c, 0x66, 0x40]
    } else if upper.contains("WINDOW") {
        [0xb3, 0xd9, 0xf2]
    } else if upper.contains("STAIR") || upper.contains("RAMP") {
        [0xb3, 0xad, 0xa6]
    } else if upper.contains("RAILING") {
        [0x80, 0x80, 0x8c]
    } else if upper.contains("FURNISHING") || upper.contains("FURNITURE") {
        [0xa6, 0x8c, 0x73]
    } else {
        [0xa0, 0xa0, 0xa0]
    }
}
