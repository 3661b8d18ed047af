//! Hover and selection highlighting.
//!
//! Each [`Channel`] owns at most one highlight subset. Moving to a new
//! element tears the old subset down before the new one is created, so a
//! channel is never observed with two subsets.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::model::{ElementRef, ExpressId, ModelHandle};

/// Interaction channel a highlight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Hover,
    Select,
}

/// `0xRRGGBB` colour, written as `"#rrggbb"` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

impl Color {
    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        let [_, r, g, b] = self.0.to_be_bytes();
        (r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("expected #rrggbb, got '{value}'"));
        }
        u32::from_str_radix(hex, 16)
            .map(Color)
            .map_err(|e| format!("invalid colour '{value}': {e}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Highlight styling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    /// Highlights are drawn over the model when depth testing is off.
    #[serde(default)]
    pub depth_test: bool,
}

impl Material {
    #[must_use]
    pub fn hover() -> Self {
        Self {
            color: Color(0xff88ff),
            opacity: 0.6,
            depth_test: false,
        }
    }

    #[must_use]
    pub fn select() -> Self {
        Self {
            color: Color(0xff00ff),
            opacity: 0.6,
            depth_test: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SubsetId(pub u64);

/// Whatever displays highlight subsets.
pub trait SubsetHost {
    /// Builds a styled copy of the faces of `ids` in `model` for `channel`.
    /// Returns `None` when the model has no faces for those ids.
    fn create_subset(
        &mut self,
        model: ModelHandle,
        ids: &[ExpressId],
        material: Material,
        channel: Channel,
    ) -> Option<SubsetId>;

    /// Removes the subset of `channel`. Returns whether one existed.
    fn remove_subset(&mut self, channel: Channel) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Empty,
    Active {
        element: ElementRef,
        subset: SubsetId,
    },
}

impl ChannelState {
    #[must_use]
    pub fn element(&self) -> Option<ElementRef> {
        match self {
            ChannelState::Empty => None,
            ChannelState::Active { element, .. } => Some(*element),
        }
    }
}

/// Per-channel highlight state machine.
#[derive(Debug, Clone)]
pub struct Highlighter {
    hover: ChannelState,
    select: ChannelState,
    hover_material: Material,
    select_material: Material,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(Material::hover(), Material::select())
    }
}

impl Highlighter {
    #[must_use]
    pub fn new(hover_material: Material, select_material: Material) -> Self {
        Self {
            hover: ChannelState::Empty,
            select: ChannelState::Empty,
            hover_material,
            select_material,
        }
    }

    #[must_use]
    pub fn state(&self, channel: Channel) -> ChannelState {
        match channel {
            Channel::Hover => self.hover,
            Channel::Select => self.select,
        }
    }

    #[must_use]
    pub fn active(&self, channel: Channel) -> Option<ElementRef> {
        self.state(channel).element()
    }

    #[must_use]
    pub fn material(&self, channel: Channel) -> Material {
        match channel {
            Channel::Hover => self.hover_material,
            Channel::Select => self.select_material,
        }
    }

    fn slot(&mut self, channel: Channel) -> &mut ChannelState {
        match channel {
            Channel::Hover => &mut self.hover,
            Channel::Select => &mut self.select,
        }
    }

    /// Moves `channel` to `target`: `Some` highlights that element, `None`
    /// clears the channel. Returns the element now highlighted.
    pub fn apply<H: SubsetHost + ?Sized>(
        &mut self,
        channel: Channel,
        target: Option<ElementRef>,
        host: &mut H,
    ) -> Option<ElementRef> {
        let material = self.material(channel);
        let slot = self.slot(channel);

        if let ChannelState::Active { element, .. } = std::mem::take(slot) {
            host.remove_subset(channel);
            debug!(?channel, %element, "highlight removed");
        }

        let element = target?;
        match host.create_subset(element.model, &[element.id], material, channel) {
            Some(subset) => {
                *slot = ChannelState::Active { element, subset };
                debug!(?channel, %element, "highlight created");
                Some(element)
            }
            None => {
                warn!(?channel, %element, "element has no faces to highlight");
                None
            }
        }
    }

    pub fn clear<H: SubsetHost + ?Sized>(&mut self, channel: Channel, host: &mut H) {
        self.apply(channel, None, host);
    }

    /// Clears every channel that points into `model`.
    pub fn forget_model<H: SubsetHost + ?Sized>(&mut self, model: ModelHandle, host: &mut H) {
        for channel in [Channel::Hover, Channel::Select] {
            if self.active(channel).is_some_and(|e| e.model == model) {
                self.clear(channel, host);
            }
        }
    }
}
