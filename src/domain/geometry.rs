/// Axis-aligned rectangles and the overlap / push-out helpers shared by
/// every collision site (walls, floors, elevator shafts and cars).
///
/// Scene space: origin top-left, y grows downward, units are floating point.
///
/// ## Overlap flavours
///
/// The collision rules mix strict and inclusive comparisons on purpose, so
/// each flavour gets its own named query:
///   - `x_inside`   - this x-span lies within the other's (inclusive)
///   - `x_overlaps` - the x-spans share interior points (strict)
///   - `y_touches`  - the y-spans overlap or share an edge (inclusive)

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Is this rect's x-span fully inside `outer`'s x-span?
    #[inline]
    pub fn x_inside(&self, outer: &Rect) -> bool {
        self.x >= outer.x && self.right() <= outer.right()
    }

    /// Do the x-spans overlap with positive length?
    #[inline]
    pub fn x_overlaps(&self, other: &Rect) -> bool {
        self.right() > other.x && self.x < other.right()
    }

    /// Do the y-spans overlap, counting shared edges?
    #[inline]
    pub fn y_touches(&self, other: &Rect) -> bool {
        !(other.y > self.bottom() || other.bottom() < self.y)
    }
}

/// Scene dimensions. Everything collides against these edges.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SceneBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for SceneBounds {
    fn default() -> Self {
        SceneBounds { width: 812.0, height: 612.0 }
    }
}

impl SceneBounds {
    /// Clamp a mover's x into the scene.
    #[inline]
    pub fn clamp_x(&self, body: &mut Rect) {
        if body.x <= 0.0 {
            body.x = 0.0;
        }
        if body.x >= self.width - body.width {
            body.x = self.width - body.width;
        }
    }

    /// Is the mover touching the top or bottom edge?
    #[inline]
    pub fn touches_vertical_edge(&self, body: &Rect) -> bool {
        body.y <= 0.0 || body.y >= self.height - body.height
    }
}

/// Push `body` out of `obstacle` along one axis.
///
/// Horizontal alignment wins: if the body's x-span lies within the
/// obstacle's, only y is corrected. Otherwise, if the y-spans touch, only x
/// is corrected. Rects aligned on neither axis are left alone.
///
/// The top/left face is tested before the bottom/right face, and the second
/// test sees the result of the first.
pub fn push_out(body: &mut Rect, obstacle: &Rect) {
    if body.x_inside(obstacle) {
        if body.bottom() >= obstacle.y && body.y < obstacle.y {
            body.y = obstacle.y - body.height;
        }
        if body.y <= obstacle.bottom() && body.bottom() > obstacle.bottom() {
            body.y = obstacle.bottom() + 1.0;
        }
    } else if body.y_touches(obstacle) {
        if body.right() >= obstacle.x && body.x < obstacle.x {
            body.x = obstacle.x - body.width - 1.0;
        }
        if body.x <= obstacle.right() && body.right() > obstacle.right() {
            body.x = obstacle.right() + 1.0;
        }
    }
}
