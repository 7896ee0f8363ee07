//! Grid occupancy and placement legality
//!
//! The grid never changes dimensions after construction; cells are
//! mutated only by `place`, `clear_full_lines`, and `clear`. Legality
//! checks are pure queries.

use crate::color::Color;

/// Result of clearing every full line at once
///
/// `cells` is the deduplicated union of all cleared cells with their
/// former colors; a cell on both a full row and a full column appears
/// once.
#[derive(Debug, Clone, Default)]
pub struct LineClear {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub cells: Vec<(usize, usize, Color)>,
}

impl LineClear {
    /// Number of line units cleared (rows + columns)
    pub fn line_count(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Fixed-size occupancy grid
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Option<Color>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Color of a cell, `None` if empty. Coordinates must be in bounds.
    pub fn color_at(&self, x: usize, y: usize) -> Option<Color> {
        self.cells[self.idx(x, y)]
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.color_at(x, y).is_some()
    }

    /// True iff every offset cell of `shape` translated by `(x, y)` is
    /// in bounds and empty. Never mutates.
    pub fn can_place(&self, shape: &[(i8, i8)], x: i32, y: i32) -> bool {
        for &(dx, dy) in shape {
            let cx = x + dx as i32;
            let cy = y + dy as i32;
            if cx < 0 || cx >= self.width as i32 || cy < 0 || cy >= self.height as i32 {
                return false;
            }
            if self.cells[cy as usize * self.width + cx as usize].is_some() {
                return false;
            }
        }
        true
    }

    /// Mark every cell covered by `shape` at `(x, y)` with `color`.
    ///
    /// Precondition: `can_place(shape, x, y)`; not re-validated.
    pub fn place(&mut self, shape: &[(i8, i8)], color: Color, x: i32, y: i32) {
        debug_assert!(self.can_place(shape, x, y));
        for &(dx, dy) in shape {
            let cx = (x + dx as i32) as usize;
            let cy = (y + dy as i32) as usize;
            let idx = self.idx(cx, cy);
            self.cells[idx] = Some(color);
        }
    }

    /// Indices of rows whose every cell is occupied
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height)
            .filter(|&y| (0..self.width).all(|x| self.is_occupied(x, y)))
            .collect()
    }

    /// Indices of columns whose every cell is occupied
    pub fn full_cols(&self) -> Vec<usize> {
        (0..self.width)
            .filter(|&x| (0..self.height).all(|y| self.is_occupied(x, y)))
            .collect()
    }

    /// Empty every cell belonging to any full row or column.
    ///
    /// Returns the cleared lines and the deduplicated cell union with
    /// the colors the cells held before clearing.
    pub fn clear_full_lines(&mut self) -> LineClear {
        let rows = self.full_rows();
        let cols = self.full_cols();

        let mut cells = Vec::new();
        for &y in &rows {
            for x in 0..self.width {
                if let Some(color) = self.color_at(x, y) {
                    cells.push((x, y, color));
                }
            }
        }
        for &x in &cols {
            for y in 0..self.height {
                if rows.contains(&y) {
                    continue; // already collected via its row
                }
                if let Some(color) = self.color_at(x, y) {
                    cells.push((x, y, color));
                }
            }
        }

        for &(x, y, _) in &cells {
            let idx = self.idx(x, y);
            self.cells[idx] = None;
        }

        LineClear { rows, cols, cells }
    }

    /// True iff no cell is occupied
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Empty every cell
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::shapes::SHAPES;
    use proptest::prelude::*;

    const C: Color = Color::CYAN;

    fn grid8() -> Grid {
        Grid::new(8, 8)
    }

    #[test]
    fn test_can_place_rejects_out_of_bounds() {
        let g = grid8();
        let bar = [(0, 0), (1, 0), (2, 0), (3, 0)];
        assert!(g.can_place(&bar, 4, 0));
        assert!(!g.can_place(&bar, 5, 0));
        assert!(!g.can_place(&bar, -1, 0));
        assert!(!g.can_place(&bar, 0, 8));
    }

    #[test]
    fn test_can_place_rejects_overlap() {
        let mut g = grid8();
        g.place(&[(0, 0)], C, 3, 3);
        assert!(!g.can_place(&[(0, 0), (1, 0)], 2, 3));
        assert!(g.can_place(&[(0, 0), (1, 0)], 4, 3));
    }

    #[test]
    fn test_place_marks_exactly_covered_cells() {
        let mut g = grid8();
        let ell = [(0, 0), (1, 0), (0, 1)];
        g.place(&ell, C, 2, 5);
        let mut occupied = 0;
        for y in 0..8 {
            for x in 0..8 {
                if g.is_occupied(x, y) {
                    occupied += 1;
                }
            }
        }
        assert_eq!(occupied, 3);
        assert!(g.is_occupied(2, 5) && g.is_occupied(3, 5) && g.is_occupied(2, 6));
    }

    #[test]
    fn test_full_row_detection_and_clear() {
        let mut g = grid8();
        for x in 0..8 {
            g.place(&[(0, 0)], C, x, 2);
        }
        assert_eq!(g.full_rows(), vec![2]);
        assert!(g.full_cols().is_empty());

        let clear = g.clear_full_lines();
        assert_eq!(clear.rows, vec![2]);
        assert_eq!(clear.line_count(), 1);
        assert_eq!(clear.cells.len(), 8);
        assert!((0..8).all(|x| !g.is_occupied(x, 2)));
    }

    #[test]
    fn test_column_clear_is_symmetric() {
        let mut g = grid8();
        for y in 0..8 {
            g.place(&[(0, 0)], C, 5, y);
        }
        let clear = g.clear_full_lines();
        assert_eq!(clear.cols, vec![5]);
        assert_eq!(clear.cells.len(), 8);
        assert!(g.is_empty());
    }

    #[test]
    fn test_union_counts_shared_cell_once() {
        let mut g = grid8();
        // Fill row 0 and column 0 completely; (0, 0) lies on both
        for x in 0..8 {
            g.place(&[(0, 0)], C, x, 0);
        }
        for y in 1..8 {
            g.place(&[(0, 0)], C, 0, y);
        }
        let clear = g.clear_full_lines();
        assert_eq!(clear.line_count(), 2);
        assert_eq!(clear.cells.len(), 15); // 8 + 8 - 1 shared
        assert!(g.is_empty());
    }

    #[test]
    fn test_partial_lines_do_not_clear() {
        let mut g = grid8();
        for x in 0..7 {
            g.place(&[(0, 0)], C, x, 4);
        }
        let clear = g.clear_full_lines();
        assert!(clear.is_empty());
        assert!(g.is_occupied(0, 4));
    }

    proptest! {
        /// `can_place` agrees with the cell-by-cell definition and
        /// never mutates the grid.
        #[test]
        fn prop_can_place_matches_definition(
            occupied in proptest::collection::vec((0usize..8, 0usize..8), 0..24),
            shape_idx in 0usize..SHAPES.len(),
            x in -2i32..10,
            y in -2i32..10,
        ) {
            let mut g = grid8();
            for &(cx, cy) in &occupied {
                if !g.is_occupied(cx, cy) {
                    g.place(&[(0, 0)], C, cx as i32, cy as i32);
                }
            }
            let shape = SHAPES[shape_idx];
            let before = g.clone();

            let expected = shape.iter().all(|&(dx, dy)| {
                let cx = x + dx as i32;
                let cy = y + dy as i32;
                (0..8).contains(&cx)
                    && (0..8).contains(&cy)
                    && !g.is_occupied(cx as usize, cy as usize)
            });
            prop_assert_eq!(g.can_place(shape, x, y), expected);

            // Query purity: the grid is untouched
            for cy in 0..8 {
                for cx in 0..8 {
                    prop_assert_eq!(g.is_occupied(cx, cy), before.is_occupied(cx, cy));
                }
            }
        }

        /// Placing then clearing a full row leaves the row empty and
        /// touches nothing outside the cleared lines.
        #[test]
        fn prop_clear_only_touches_full_lines(
            row in 0usize..8,
            extra in proptest::collection::vec((0usize..8, 0usize..8), 0..12),
        ) {
            let mut g = grid8();
            for x in 0..8 {
                g.place(&[(0, 0)], C, x as i32, row as i32);
            }
            for &(cx, cy) in &extra {
                if !g.is_occupied(cx, cy) {
                    g.place(&[(0, 0)], C, cx as i32, cy as i32);
                }
            }
            let full_cols = g.full_cols();
            let clear = g.clear_full_lines();
            prop_assert!(clear.rows.contains(&row));
            for (cx, cy) in extra {
                let in_cleared_line = clear.rows.contains(&cy) || full_cols.contains(&cx);
                prop_assert_eq!(g.is_occupied(cx, cy), !in_cleared_line);
            }
        }
    }
}
