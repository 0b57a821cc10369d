/// Axis-aligned rectangle in world units (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict AABB overlap; touching edges do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Maps world rectangles onto a character grid of `cols` x `rows`.
pub struct Viewport {
    pub world_w: f32,
    pub world_h: f32,
    pub cols: usize,
    pub rows: usize,
}

impl Viewport {
    /// Inclusive-exclusive cell span covered by `r`, clipped to the grid.
    pub fn cells(&self, r: &Rect) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let sx = self.cols as f32 / self.world_w;
        let sy = self.rows as f32 / self.world_h;
        let clip = |v: f32, max: usize| (v.max(0.0) as usize).min(max);
        let x0 = clip((r.x * sx).floor(), self.cols);
        let x1 = clip((r.right() * sx).ceil(), self.cols).max(x0);
        let y0 = clip((r.y * sy).floor(), self.rows);
        let y1 = clip((r.bottom() * sy).ceil(), self.rows).max(y0);
        (x0..x1, y0..y1)
    }
}
