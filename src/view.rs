use crate::layout::{Position, scaled};

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.25;

/// Interactive state of one diagram view.
///
/// Zoom only affects display; stored layout positions are never rewritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    zoom: f32,
}

impl ViewState {
    pub fn new() -> Self {
        Self { zoom: 1.0 }
    }

    pub fn with_zoom(zoom: f32) -> Self {
        let mut view = Self::new();
        view.set_zoom(zoom);
        view
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            1.0
        };
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
    }

    pub fn project(&self, position: &Position) -> (f32, f32) {
        scaled(position, self.zoom)
    }

    pub fn scale(&self, value: f32) -> f32 {
        value * self.zoom
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}
