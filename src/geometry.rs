//! Plain 2D helpers shared by the finger tracker and the detector.

/// A position on the touchpad in raw device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points, truncated to whole units.
pub fn distance(a: Point, b: Point) -> i32 {
    let dx = f64::from(b.x) - f64::from(a.x);
    let dy = f64::from(b.y) - f64::from(a.y);
    dx.hypot(dy) as i32
}

/// Length of the closed path through `points` in the given order.
///
/// Two points degenerate to the direct distance between them rather than
/// the there-and-back length.
pub fn circumference(points: &[Point]) -> i32 {
    match points {
        [] => 0,
        [a, b] => distance(*a, *b),
        [first, ..] => {
            let last = points[points.len() - 1];
            points
                .windows(2)
                .map(|w| distance(w[0], w[1]))
                .chain([distance(last, *first)])
                .fold(0, i32::saturating_add)
        }
    }
}
