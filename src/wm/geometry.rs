//! Geometry Module
//!
//! Pure geometry arithmetic: gravity-aware resize resolution, drag position
//! math, border compensation and edge snapping. No X11 calls live here so
//! everything is unit-testable.

/// Window rectangle in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Win-gravity from WM_NORMAL_HINTS. Unset or unknown values fall back to
/// north-west, which leaves positions untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    #[default]
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Gravity {
    /// Decode the CARD32 win_gravity field (NorthWestGravity = 1 .. SouthEastGravity = 9).
    pub fn from_hint(value: u32) -> Self {
        match value {
            2 => Gravity::North,
            3 => Gravity::NorthEast,
            4 => Gravity::West,
            5 => Gravity::Center,
            6 => Gravity::East,
            7 => Gravity::SouthWest,
            8 => Gravity::South,
            9 => Gravity::SouthEast,
            _ => Gravity::NorthWest,
        }
    }

    /// Position correction of magnitude `delta` for a border-width change.
    fn border_shift(self, delta: i32) -> (i32, i32) {
        match self {
            Gravity::NorthWest => (delta, delta),
            Gravity::North => (0, delta),
            Gravity::NorthEast => (-delta, delta),
            Gravity::West => (delta, 0),
            Gravity::Center => (0, 0),
            Gravity::East => (-delta, 0),
            Gravity::SouthWest => (delta, -delta),
            Gravity::South => (0, -delta),
            Gravity::SouthEast => (-delta, -delta),
        }
    }

    /// Position shift that keeps the gravity anchor stationary when the size
    /// changes by (dw, dh).
    fn resize_shift(self, dw: i32, dh: i32) -> (i32, i32) {
        match self {
            Gravity::NorthWest => (0, 0),
            Gravity::North => (-dw / 2, 0),
            Gravity::NorthEast => (-dw, 0),
            Gravity::West => (0, -dh / 2),
            Gravity::Center => (-dw / 2, -dh / 2),
            Gravity::East => (-dw, -dh / 2),
            Gravity::SouthWest => (0, -dh),
            Gravity::South => (-dw / 2, -dh),
            Gravity::SouthEast => (-dw, -dh),
        }
    }
}

/// Min/max size constraints plus win-gravity, from WM_NORMAL_HINTS.
/// `max_width`/`max_height` of 0 mean unbounded.
#[derive(Debug, Clone, Copy)]
pub struct SizeHints {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub gravity: Gravity,
}

impl Default for SizeHints {
    fn default() -> Self {
        Self {
            min_width: 1,
            min_height: 1,
            max_width: 0,
            max_height: 0,
            gravity: Gravity::NorthWest,
        }
    }
}

/// A configure-style geometry request; absent fields keep current values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Shift `geom` by `delta` in the direction implied by `gravity`, compensating
/// for a border-width change so the visible anchor edge stays put.
pub fn gravitate_border(geom: &mut Geometry, gravity: Gravity, delta: i32) {
    let (dx, dy) = gravity.border_shift(delta);
    geom.x += dx;
    geom.y += dy;
}

fn clamp_dimension(value: u32, min: u32, max: u32) -> u32 {
    let value = value.max(min.max(1));
    if max > 0 { value.min(max) } else { value }
}

/// Resolve a geometry request against the current geometry.
///
/// Explicit positions are taken as-is. Size changes without an explicit
/// position are re-anchored according to `gravity`, with the border width
/// folded out before the size math and back in after, and the requested
/// dimensions clamped to the hint minimum/maximum.
pub fn resolve_resize(
    geom: &Geometry,
    hints: &SizeHints,
    req: &ResizeRequest,
    gravity: Gravity,
    border: i32,
) -> Geometry {
    let mut out = *geom;
    if let Some(x) = req.x {
        out.x = x;
    }
    if let Some(y) = req.y {
        out.y = y;
    }
    let explicit_pos = req.x.is_some() || req.y.is_some();
    if req.width.is_some() || req.height.is_some() {
        if !explicit_pos {
            gravitate_border(&mut out, gravity, -border);
        }
        let mut dw = 0;
        let mut dh = 0;
        if let Some(w) = req.width {
            let w = clamp_dimension(w, hints.min_width, hints.max_width);
            dw = w as i32 - out.width as i32;
            out.width = w;
        }
        if let Some(h) = req.height {
            let h = clamp_dimension(h, hints.min_height, hints.max_height);
            dh = h as i32 - out.height as i32;
            out.height = h;
        }
        if !explicit_pos {
            let (sx, sy) = gravity.resize_shift(dw, dh);
            out.x += sx;
            out.y += sy;
            gravitate_border(&mut out, gravity, border);
        }
    }
    out
}

/// Position law for interactive moves: the window tracks the pointer with the
/// offset captured at press time, independent of intermediate motion.
pub fn resolve_drag(original: Point, start: Point, current: Point) -> Point {
    Point {
        x: original.x + current.x - start.x,
        y: original.y + current.y - start.y,
    }
}

/// Snap a dragged geometry to the screen edges and to the facing edges of
/// other frames it overlaps on the perpendicular axis. Returns the corrected
/// position; positions farther than `threshold` from any edge are unchanged.
pub fn snap_position(
    geom: &Geometry,
    screen_width: u32,
    screen_height: u32,
    others: &[Geometry],
    threshold: i32,
) -> Point {
    let mut x = geom.x;
    let mut y = geom.y;
    let w = geom.width as i32;
    let h = geom.height as i32;

    if x.abs() < threshold {
        x = 0;
    } else if (x + w - screen_width as i32).abs() < threshold {
        x = screen_width as i32 - w;
    }
    if y.abs() < threshold {
        y = 0;
    } else if (y + h - screen_height as i32).abs() < threshold {
        y = screen_height as i32 - h;
    }

    for o in others {
        let overlap_v = geom.y < o.bottom() && o.y < geom.bottom();
        let overlap_h = geom.x < o.right() && o.x < geom.right();
        if overlap_v {
            if (geom.x + w - o.x).abs() < threshold {
                x = o.x - w;
            } else if (geom.x - o.right()).abs() < threshold {
                x = o.right();
            }
        }
        if overlap_h {
            if (geom.y + h - o.y).abs() < threshold {
                y = o.y - h;
            } else if (geom.y - o.bottom()).abs() < threshold {
                y = o.bottom();
            }
        }
    }

    Point { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(x: i32, y: i32, width: u32, height: u32) -> Geometry {
        Geometry { x, y, width, height }
    }

    fn grow_by(gravity: Gravity, dw: u32, dh: u32) -> Geometry {
        let g = geom(100, 100, 200, 150);
        let req = ResizeRequest {
            width: Some(g.width + dw),
            height: Some(g.height + dh),
            ..Default::default()
        };
        resolve_resize(&g, &SizeHints::default(), &req, gravity, 0)
    }

    #[test]
    fn northwest_resize_keeps_top_left_corner() {
        let out = grow_by(Gravity::NorthWest, 40, 20);
        assert_eq!((out.x, out.y), (100, 100));
        assert_eq!((out.width, out.height), (240, 170));
    }

    #[test]
    fn northeast_resize_keeps_top_right_corner() {
        let out = grow_by(Gravity::NorthEast, 40, 20);
        assert_eq!(out.right(), geom(100, 100, 200, 150).right());
        assert_eq!(out.y, 100);
    }

    #[test]
    fn southwest_resize_keeps_bottom_left_corner() {
        let out = grow_by(Gravity::SouthWest, 40, 20);
        assert_eq!(out.x, 100);
        assert_eq!(out.bottom(), geom(100, 100, 200, 150).bottom());
    }

    #[test]
    fn southeast_resize_keeps_bottom_right_corner() {
        let out = grow_by(Gravity::SouthEast, 40, 20);
        let orig = geom(100, 100, 200, 150);
        assert_eq!(out.right(), orig.right());
        assert_eq!(out.bottom(), orig.bottom());
    }

    #[test]
    fn east_resize_shifts_x_left_by_width_delta() {
        let out = grow_by(Gravity::East, 40, 0);
        assert_eq!(out.x, 60);
        assert_eq!(out.right(), geom(100, 100, 200, 150).right());
    }

    #[test]
    fn center_resize_splits_both_deltas() {
        let out = grow_by(Gravity::Center, 40, 20);
        assert_eq!((out.x, out.y), (80, 90));
    }

    #[test]
    fn width_request_below_minimum_clamps_without_moving() {
        let hints = SizeHints {
            min_width: 100,
            ..Default::default()
        };
        let g = geom(50, 50, 200, 200);
        let req = ResizeRequest {
            width: Some(50),
            ..Default::default()
        };
        let out = resolve_resize(&g, &hints, &req, Gravity::NorthWest, 0);
        assert_eq!(out.width, 100);
        assert_eq!(out.x, 50);
    }

    #[test]
    fn maximum_caps_requested_size() {
        let hints = SizeHints {
            max_width: 300,
            max_height: 300,
            ..Default::default()
        };
        let g = geom(0, 0, 200, 200);
        let req = ResizeRequest {
            width: Some(800),
            height: Some(800),
            ..Default::default()
        };
        let out = resolve_resize(&g, &hints, &req, Gravity::NorthWest, 0);
        assert_eq!((out.width, out.height), (300, 300));
    }

    #[test]
    fn explicit_position_suppresses_gravity_adjustment() {
        let g = geom(100, 100, 200, 150);
        let req = ResizeRequest {
            x: Some(5),
            width: Some(240),
            ..Default::default()
        };
        let out = resolve_resize(&g, &SizeHints::default(), &req, Gravity::SouthEast, 1);
        assert_eq!(out.x, 5);
        assert_eq!(out.width, 240);
    }

    #[test]
    fn border_compensation_round_trips() {
        let mut g = geom(100, 100, 200, 150);
        gravitate_border(&mut g, Gravity::SouthEast, -1);
        gravitate_border(&mut g, Gravity::SouthEast, 1);
        assert_eq!(g, geom(100, 100, 200, 150));
    }

    #[test]
    fn drag_position_is_linear_in_pointer_motion() {
        let original = Point { x: 30, y: 40 };
        let start = Point { x: 500, y: 500 };
        let current = Point { x: 517, y: 488 };
        let out = resolve_drag(original, start, current);
        assert_eq!(out, Point { x: 47, y: 28 });
    }

    #[test]
    fn drag_back_to_start_restores_original() {
        let original = Point { x: 30, y: 40 };
        let start = Point { x: 500, y: 500 };
        assert_eq!(resolve_drag(original, start, start), original);
    }

    #[test]
    fn snap_lands_on_screen_edges_within_threshold() {
        let g = geom(6, 1075, 400, 200);
        let out = snap_position(&g, 1920, 1080, &[], 8);
        // left edge snaps to 0, bottom edge (1275) is nowhere near 1080
        assert_eq!(out.x, 0);
        assert_eq!(out.y, 1075);

        let g = geom(1515, 4, 400, 200);
        let out = snap_position(&g, 1920, 1080, &[], 8);
        assert_eq!(out.x, 1520);
        assert_eq!(out.y, 0);
    }

    #[test]
    fn snap_leaves_distant_positions_unchanged() {
        let g = geom(300, 300, 400, 200);
        let out = snap_position(&g, 1920, 1080, &[], 8);
        assert_eq!(out, Point { x: 300, y: 300 });
    }

    #[test]
    fn snap_aligns_to_neighbour_edge() {
        let neighbour = geom(500, 100, 200, 400);
        // right edge at 497, neighbour's left edge at 500, vertical overlap
        let g = geom(97, 150, 400, 200);
        let out = snap_position(&g, 1920, 1080, &[neighbour], 8);
        assert_eq!(out.x, 100);
    }
}
