/// Floating widget presentation: icon position, drag gesture, route visibility
///
/// The customer-facing entry point is a draggable floating icon clamped to the
/// viewport. A pointer gesture is a click (open the conversation) only if
/// total movement stays within a small threshold; anything larger is a drag
/// and repositions without opening. Position lives only for the mounted
/// widget, never across reloads.

/// Icon footprint in CSS pixels
pub const ICON_SIZE: f64 = 64.0;
/// Minimum distance kept from every viewport edge
pub const EDGE_MARGIN: f64 = 8.0;
/// Movement beyond this many pixels on either axis makes the gesture a drag
pub const DRAG_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// What a completed pointer gesture amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Below the movement threshold: open the conversation
    Click,
    /// Repositioned only, do not open
    Drag,
    /// Not the tracked pointer, or no gesture in progress
    Ignored,
}

/// Clamp a position so the icon plus margin stays inside the viewport
pub fn clamp_position(p: Point, viewport: Viewport) -> Point {
    let max_x = (viewport.width - ICON_SIZE - EDGE_MARGIN).max(EDGE_MARGIN);
    let max_y = (viewport.height - ICON_SIZE - EDGE_MARGIN).max(EDGE_MARGIN);
    Point {
        x: p.x.clamp(EDGE_MARGIN, max_x),
        y: p.y.clamp(EDGE_MARGIN, max_y),
    }
}

/// The widget is never rendered on admin routes or unauthenticated-only routes
pub fn hidden_on_route(path: &str) -> bool {
    path.starts_with("/admin")
        || path == "/login"
        || path == "/signup"
        || path == "/oauth2-callback"
}

#[derive(Debug)]
struct DragGesture {
    pointer_id: i64,
    start: Point,
    origin: Point,
    moved: bool,
}

/// Draggable, dismissible floating icon
#[derive(Debug)]
pub struct FloatingIcon {
    position: Point,
    viewport: Viewport,
    visible: bool,
    gesture: Option<DragGesture>,
}

impl FloatingIcon {
    /// Icon anchored near the bottom-right corner of the viewport
    pub fn new(viewport: Viewport) -> Self {
        let initial = Point {
            x: viewport.width - 96.0,
            y: viewport.height - 112.0,
        };
        Self {
            position: clamp_position(initial, viewport),
            viewport,
            visible: true,
            gesture: None,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hide the icon for the rest of the session
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Re-clamp after a viewport change
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.position = clamp_position(self.position, viewport);
    }

    pub fn pointer_down(&mut self, pointer_id: i64, at: Point) {
        self.gesture = Some(DragGesture {
            pointer_id,
            start: at,
            origin: self.position,
            moved: false,
        });
    }

    pub fn pointer_move(&mut self, pointer_id: i64, at: Point) {
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        if gesture.pointer_id != pointer_id {
            return;
        }

        let dx = at.x - gesture.start.x;
        let dy = at.y - gesture.start.y;
        if dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD {
            gesture.moved = true;
        }

        let next = Point {
            x: gesture.origin.x + dx,
            y: gesture.origin.y + dy,
        };
        self.position = clamp_position(next, self.viewport);
    }

    /// End of gesture: a gesture that never crossed the threshold is a click
    pub fn pointer_up(&mut self, pointer_id: i64) -> GestureOutcome {
        match self.gesture.take() {
            Some(gesture) if gesture.pointer_id == pointer_id => {
                if gesture.moved {
                    GestureOutcome::Drag
                } else {
                    GestureOutcome::Click
                }
            }
            other => {
                self.gesture = other;
                GestureOutcome::Ignored
            }
        }
    }

    pub fn pointer_cancel(&mut self, pointer_id: i64) {
        if let Some(gesture) = &self.gesture {
            if gesture.pointer_id == pointer_id {
                self.gesture = None;
            }
        }
    }
}
