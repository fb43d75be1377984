//! Interaction state of the result viewer.
//!
//! Pure view-session state: zoom, pan, magnifier lens, 3D tilt and the
//! three-frame turnaround scrub. Nothing here is persisted.

use strum::Display;

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 4.0;
pub const ZOOM_STEP: f32 = 0.5;
pub const MAX_TILT_DEGREES: f32 = 60.0;
const TILT_SENSITIVITY: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Flat,
    TiltCard,
    Turnaround,
}

/// One of the three views in a turnaround sprite, left to right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TurnaroundFrame {
    #[default]
    Front,
    Side,
    Back,
}

impl TurnaroundFrame {
    /// Frame for a pointer at `x` on a track starting at 0 and `width` wide.
    pub fn from_track_position(x: f32, width: f32) -> Self {
        if width <= 0.0 {
            return Self::Front;
        }
        let percent = (x / width).clamp(0.0, 1.0);
        if percent > 0.66 {
            Self::Back
        } else if percent > 0.33 {
            Self::Side
        } else {
            Self::Front
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Viewer state for one displayed result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultViewer {
    mode: ViewMode,
    zoom: f32,
    pan: Point,
    /// Degrees around the x and y axes.
    rotation: Point,
    dragging: bool,
    last_pointer: Point,
    magnifier: Option<Point>,
    frame: TurnaroundFrame,
    has_turnaround: bool,
}

impl Default for ResultViewer {
    fn default() -> Self {
        Self {
            mode: ViewMode::Flat,
            zoom: MIN_ZOOM,
            pan: Point::default(),
            rotation: Point::default(),
            dragging: false,
            last_pointer: Point::default(),
            magnifier: None,
            frame: TurnaroundFrame::Front,
            has_turnaround: false,
        }
    }
}

impl ResultViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn rotation(&self) -> Point {
        self.rotation
    }

    pub fn frame(&self) -> TurnaroundFrame {
        self.frame
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Lens position as percentages of the image, when visible.
    pub fn magnifier(&self) -> Option<Point> {
        self.magnifier
    }

    /// Marks the turnaround sprite as available for scrubbing.
    pub fn set_turnaround_ready(&mut self, ready: bool) {
        self.has_turnaround = ready;
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        if mode != ViewMode::TiltCard {
            self.rotation = Point::default();
        }
        self.zoom = MIN_ZOOM;
        self.pan = Point::default();
        self.dragging = false;
        self.magnifier = None;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
        self.magnifier = None;
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(MIN_ZOOM);
        if self.zoom <= MIN_ZOOM {
            self.pan = Point::default();
        }
    }

    fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    /// Pointer moved over the image at `position` inside a `size` container.
    pub fn hover(&mut self, position: Point, size: Point) {
        if self.mode != ViewMode::Flat || self.is_zoomed() || size.x <= 0.0 || size.y <= 0.0 {
            self.magnifier = None;
            return;
        }
        self.magnifier = Some(Point::new(
            position.x / size.x * 100.0,
            position.y / size.y * 100.0,
        ));
    }

    pub fn leave(&mut self) {
        self.magnifier = None;
        self.dragging = false;
    }

    /// Starts a drag. `track_width` is used only for turnaround scrubbing.
    pub fn drag_start(&mut self, pointer: Point, track_width: f32) {
        match self.mode {
            ViewMode::TiltCard => {
                self.dragging = true;
                self.last_pointer = pointer;
            }
            ViewMode::Turnaround if self.has_turnaround => {
                self.dragging = true;
                self.frame = TurnaroundFrame::from_track_position(pointer.x, track_width);
            }
            ViewMode::Flat if self.is_zoomed() => {
                self.dragging = true;
                self.last_pointer = pointer;
            }
            _ => {}
        }
    }

    pub fn drag_move(&mut self, pointer: Point, track_width: f32) {
        if !self.dragging {
            return;
        }
        let dx = pointer.x - self.last_pointer.x;
        let dy = pointer.y - self.last_pointer.y;
        match self.mode {
            ViewMode::TiltCard => {
                self.rotation = Point::new(
                    (self.rotation.x - dy * TILT_SENSITIVITY)
                        .clamp(-MAX_TILT_DEGREES, MAX_TILT_DEGREES),
                    (self.rotation.y + dx * TILT_SENSITIVITY)
                        .clamp(-MAX_TILT_DEGREES, MAX_TILT_DEGREES),
                );
                self.last_pointer = pointer;
            }
            ViewMode::Turnaround => {
                self.frame = TurnaroundFrame::from_track_position(pointer.x, track_width);
            }
            ViewMode::Flat if self.is_zoomed() => {
                self.pan = Point::new(self.pan.x + dx, self.pan.y + dy);
                self.last_pointer = pointer;
            }
            ViewMode::Flat => {}
        }
    }

    pub fn drag_end(&mut self) {
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_bounded() {
        let mut viewer = ResultViewer::new();
        for _ in 0..10 {
            viewer.zoom_in();
        }
        assert_eq!(viewer.zoom(), MAX_ZOOM);
        for _ in 0..10 {
            viewer.zoom_out();
        }
        assert_eq!(viewer.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_pan_resets_at_unit_zoom() {
        let mut viewer = ResultViewer::new();
        viewer.zoom_in();
        viewer.drag_start(Point::new(10.0, 10.0), 0.0);
        viewer.drag_move(Point::new(30.0, 25.0), 0.0);
        assert_eq!(viewer.pan(), Point::new(20.0, 15.0));

        viewer.zoom_out();
        assert_eq!(viewer.pan(), Point::default());
    }

    #[test]
    fn test_no_pan_at_unit_zoom() {
        let mut viewer = ResultViewer::new();
        viewer.drag_start(Point::new(0.0, 0.0), 0.0);
        viewer.drag_move(Point::new(50.0, 50.0), 0.0);
        assert!(!viewer.is_dragging());
        assert_eq!(viewer.pan(), Point::default());
    }

    #[test]
    fn test_magnifier_only_at_unit_zoom() {
        let mut viewer = ResultViewer::new();
        viewer.hover(Point::new(50.0, 25.0), Point::new(200.0, 100.0));
        assert_eq!(viewer.magnifier(), Some(Point::new(25.0, 25.0)));

        viewer.zoom_in();
        viewer.hover(Point::new(50.0, 25.0), Point::new(200.0, 100.0));
        assert_eq!(viewer.magnifier(), None);
    }

    #[test]
    fn test_tilt_is_clamped() {
        let mut viewer = ResultViewer::new();
        viewer.set_mode(ViewMode::TiltCard);
        viewer.drag_start(Point::new(0.0, 0.0), 0.0);
        viewer.drag_move(Point::new(1000.0, -1000.0), 0.0);
        assert_eq!(viewer.rotation(), Point::new(MAX_TILT_DEGREES, MAX_TILT_DEGREES));

        viewer.set_mode(ViewMode::Flat);
        assert_eq!(viewer.rotation(), Point::default());
    }

    #[test]
    fn test_turnaround_scrub_thirds() {
        assert_eq!(TurnaroundFrame::from_track_position(10.0, 300.0), TurnaroundFrame::Front);
        assert_eq!(TurnaroundFrame::from_track_position(150.0, 300.0), TurnaroundFrame::Side);
        assert_eq!(TurnaroundFrame::from_track_position(290.0, 300.0), TurnaroundFrame::Back);
        assert_eq!(TurnaroundFrame::from_track_position(-40.0, 300.0), TurnaroundFrame::Front);
        assert_eq!(TurnaroundFrame::from_track_position(900.0, 300.0), TurnaroundFrame::Back);
    }

    #[test]
    fn test_scrub_requires_sprite() {
        let mut viewer = ResultViewer::new();
        viewer.set_mode(ViewMode::Turnaround);
        viewer.drag_start(Point::new(290.0, 0.0), 300.0);
        assert_eq!(viewer.frame(), TurnaroundFrame::Front);

        viewer.set_turnaround_ready(true);
        viewer.drag_start(Point::new(290.0, 0.0), 300.0);
        assert_eq!(viewer.frame(), TurnaroundFrame::Back);
        viewer.drag_move(Point::new(150.0, 0.0), 300.0);
        assert_eq!(viewer.frame(), TurnaroundFrame::Side);
    }
}
