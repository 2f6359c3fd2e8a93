//! Grid geometry: pure functions over board coordinates.
//!
//! Every function here is total. Any `i32` pair is a valid input;
//! coordinates off the board simply fail [`in_bounds`].

use broadside_protocol::Coordinate;

/// Returns `true` if `cell` lies on a `size`×`size` board.
pub fn in_bounds(cell: Coordinate, size: i32) -> bool {
    (0..size).contains(&cell.row) && (0..size).contains(&cell.col)
}

/// Chebyshev (king-move) distance between two cells.
pub fn chebyshev(a: Coordinate, b: Coordinate) -> u64 {
    let dr = (i64::from(a.row) - i64::from(b.row)).unsigned_abs();
    let dc = (i64::from(a.col) - i64::from(b.col)).unsigned_abs();
    dr.max(dc)
}

/// Returns `true` if the cells are equal or touch, diagonals included.
pub fn is_adjacent_or_same(a: Coordinate, b: Coordinate) -> bool {
    chebyshev(a, b) <= 1
}

/// Returns `true` if `cells` form one straight run: a shared row with
/// consecutive ascending columns, or a shared column with consecutive
/// ascending rows. A single cell is a line; an empty slice is not.
pub fn is_contiguous_line(cells: &[Coordinate]) -> bool {
    if cells.is_empty() {
        return false;
    }
    let step = |a: i32, b: i32| a.checked_add(1) == Some(b);
    let horizontal = cells
        .windows(2)
        .all(|w| w[0].row == w[1].row && step(w[0].col, w[1].col));
    let vertical = cells
        .windows(2)
        .all(|w| w[0].col == w[1].col && step(w[0].row, w[1].row));
    horizontal || vertical
}
