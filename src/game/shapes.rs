//! Shape catalog
//!
//! Each shape is a fixed list of (dx, dy) cell offsets from an implicit
//! origin. A spawned tray shape pairs one template with a palette color
//! and is consumed exactly once.

use crate::color::Color;

/// One placeable shape: relative cell offsets
pub type Shape = &'static [(i8, i8)];

/// Every shape the tray can offer
pub const SHAPES: [Shape; 15] = [
    // Single
    &[(0, 0)],
    // Line 2
    &[(0, 0), (1, 0)],
    &[(0, 0), (0, 1)],
    // Line 3
    &[(0, 0), (1, 0), (2, 0)],
    &[(0, 0), (0, 1), (0, 2)],
    // Line 4
    &[(0, 0), (1, 0), (2, 0), (3, 0)],
    &[(0, 0), (0, 1), (0, 2), (0, 3)],
    // L shapes
    &[(0, 0), (1, 0), (0, 1)],
    &[(0, 0), (1, 0), (1, 1)],
    &[(0, 0), (0, 1), (1, 1)],
    &[(1, 0), (0, 1), (1, 1)],
    // Square
    &[(0, 0), (1, 0), (0, 1), (1, 1)],
    // T shape
    &[(0, 0), (1, 0), (2, 0), (1, 1)],
    // Big L
    &[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)],
    // 3x3 square
    &[
        (0, 0),
        (1, 0),
        (2, 0),
        (0, 1),
        (1, 1),
        (2, 1),
        (0, 2),
        (1, 2),
        (2, 2),
    ],
];

/// Colors a spawned shape is drawn in
pub const PALETTE: [Color; 7] = [
    Color::CYAN,
    Color::BLUE,
    Color::ORANGE,
    Color::YELLOW,
    Color::GREEN,
    Color::PURPLE,
    Color::RED,
];

/// Bounding box of a shape in cells: (width, height, min_dx, min_dy)
pub fn bounds(shape: Shape) -> (i8, i8, i8, i8) {
    let mut min_x = i8::MAX;
    let mut max_x = i8::MIN;
    let mut min_y = i8::MAX;
    let mut max_y = i8::MIN;
    for &(dx, dy) in shape {
        min_x = min_x.min(dx);
        max_x = max_x.max(dx);
        min_y = min_y.min(dy);
        max_y = max_y.max(dy);
    }
    (max_x - min_x + 1, max_y - min_y + 1, min_x, min_y)
}
