//! Zoom, pan and transition timing layered over the node geometry
//!
//! None of this changes node positions. A renderer applies the transform
//! on top of the geometry computed by [`super::LayoutEngine`].

use serde::{Deserialize, Serialize};

/// Smallest scale the view can be zoomed out to
pub const MIN_SCALE: f64 = 0.01;

/// Scale change applied per wheel tick
pub const ZOOM_STEP: f64 = 0.1;

const MILLISECONDS_TO_SECONDS: f64 = 0.001;
const SPEED_DURATION_RATIO: f64 = 3.0 / 5.0 * MILLISECONDS_TO_SECONDS;
const SPEED_DELAY_RATIO: f64 = 1.0 / 5.0 * MILLISECONDS_TO_SECONDS;

/// An in-progress drag
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PanState {
    start_x: f64,
    start_y: f64,
    delta_x: f64,
    delta_y: f64,
}

/// Scale and offset applied to the whole graph
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    pan: Option<PanState>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            pan: None,
        }
    }
}

impl ViewTransform {
    /// Create an identity transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scale factor
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Apply one wheel tick
    ///
    /// A negative `delta_y` (wheel up) zooms in, anything else zooms out.
    /// Returns false when the change would go below [`MIN_SCALE`], in which
    /// case the scale is left as is.
    pub fn zoom(&mut self, delta_y: f64) -> bool {
        let direction = if delta_y < 0.0 { 1.0 } else { -1.0 };
        let next = self.scale + direction * ZOOM_STEP;
        if next < MIN_SCALE {
            return false;
        }
        self.scale = next;
        true
    }

    /// Pointer pressed: start tracking a drag from this position
    pub fn begin_pan(&mut self, x: f64, y: f64) {
        self.pan = Some(PanState {
            start_x: x,
            start_y: y,
            ..Default::default()
        });
    }

    /// Pointer moved; ignored when no drag is active
    pub fn drag_to(&mut self, x: f64, y: f64) {
        if let Some(pan) = self.pan.as_mut() {
            pan.delta_x = x - pan.start_x;
            pan.delta_y = y - pan.start_y;
        }
    }

    /// Pointer released: fold the drag into the persisted offset
    pub fn end_pan(&mut self) {
        if let Some(pan) = self.pan.take() {
            self.offset_x += pan.delta_x;
            self.offset_y += pan.delta_y;
        }
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.pan.is_some()
    }

    /// Offset to render with, including any in-progress drag
    pub fn offset(&self) -> (f64, f64) {
        let (dx, dy) = self
            .pan
            .map(|p| (p.delta_x, p.delta_y))
            .unwrap_or((0.0, 0.0));
        (self.offset_x + dx, self.offset_y + dy)
    }
}

/// Transition timing for node movement, derived from the speed slider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionTiming {
    /// How long a node takes to move, in seconds
    pub duration_secs: f64,
    /// How long a node waits before moving, in seconds
    pub delay_secs: f64,
}

impl TransitionTiming {
    /// Derive the timing from a step delay in milliseconds
    pub fn from_speed(speed_ms: f64) -> Self {
        Self {
            duration_secs: speed_ms * SPEED_DURATION_RATIO,
            delay_secs: speed_ms * SPEED_DELAY_RATIO,
        }
    }

    /// CSS style duration, e.g. `0.3s`
    pub fn css_duration(&self) -> String {
        format!("{}s", self.duration_secs)
    }

    /// CSS style delay, e.g. `0.1s`
    pub fn css_delay(&self) -> String {
        format!("{}s", self.delay_secs)
    }
}
