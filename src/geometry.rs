/// Pixel-space geometry shared by every entity.
///
/// The world is measured in screen pixels (800×600 by default); the terminal
/// renderer scales it down at draw time.

/// Axis-aligned rectangle on the integer pixel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// Build a rect from a fractional top-left corner.  The corner is
    /// truncated toward zero, the same way a pixel rect stores floats.
    pub fn at(x: f32, y: f32, w: i32, h: i32) -> Self {
        Rect::new(x as i32, y as i32, w, h)
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Strict overlap test: rects that merely share an edge do not
    /// intersect, and an empty rect intersects nothing.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

/// Dimensions of the play area in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Playfield {
    pub const fn new(width: f32, height: f32) -> Self {
        Playfield { width, height }
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Playfield::new(800.0, 600.0)
    }
}
