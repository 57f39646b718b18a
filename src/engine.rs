use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default board side length.
pub const DEFAULT_SIZE: usize = 4;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

/// N x N board of tile values in row-major order.
///
/// `0` marks an empty cell; every other value is a power of two >= 2.
/// The side length is fixed at construction and never changes. `Clone`
/// is a deep copy with no shared storage; `PartialEq` is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    n: usize,
    cells: Vec<u32>,
}

impl Grid {
    /// An empty n x n grid. `n` must be positive.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "grid side length must be positive");
        Grid {
            n,
            cells: vec![0; n * n],
        }
    }

    /// Side length of the grid.
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.n + col]
    }

    /// Write `value` at (row, col).
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u32) {
        self.cells[row * self.n + col] = value;
    }

    /// Borrow one row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[u32] {
        &self.cells[row * self.n..(row + 1) * self.n]
    }

    /// Iterate over rows as slices, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks(self.n)
    }

    /// Coordinates of all empty cells, in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for r in 0..self.n {
            for c in 0..self.n {
                if self.get(r, c) == 0 {
                    cells.push((r, c));
                }
            }
        }
        cells
    }

    /// Build a grid from nested rows. Returns `None` unless the input is
    /// square and non-empty. Values are not validated here; the persistence
    /// layer rejects non-power-of-two payloads.
    pub fn from_rows(rows: &[Vec<u32>]) -> Option<Self> {
        let n = rows.len();
        if n == 0 || rows.iter().any(|row| row.len() != n) {
            return None;
        }
        let mut grid = Grid::new(n);
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                grid.set(r, c, v);
            }
        }
        Some(grid)
    }

    /// Copy the grid out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.rows().map(|row| row.to_vec()).collect()
    }

    /// Largest tile value on the board (0 when the board is empty).
    pub fn highest_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for (c, &v) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, "|")?;
                }
                if v == 0 {
                    write!(f, "{:>6}", ".")?;
                } else {
                    write!(f, "{:>6}", v)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Result of sliding/merging a grid in one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftOutcome {
    pub grid: Grid,
    /// Sum of all merged values produced by this pass.
    pub gained: u64,
    /// True iff at least one row's content changed, merge or pure slide.
    pub changed: bool,
}

/// Slide one line toward index 0 and merge adjacent equal survivors.
///
/// Zeros are dropped first, preserving relative order; the survivors are
/// then scanned left to right and each adjacent equal pair is replaced by
/// its sum, with the scan advancing past both elements so a freshly merged
/// tile never merges again in the same pass. The result is padded back to
/// the input length with trailing zeros.
///
/// An equal pair whose sum would not fit in a cell stays unmerged, so a
/// hostile or corrupted board can never overflow the merge arithmetic.
///
/// ```
/// use twenty48_engine::engine::compress_line;
/// assert_eq!(compress_line(&[2, 2, 4, 4]), (vec![4, 8, 0, 0], 12));
/// ```
pub fn compress_line(line: &[u32]) -> (Vec<u32>, u64) {
    let survivors: Vec<u32> = line.iter().copied().filter(|&v| v != 0).collect();
    let mut out = Vec::with_capacity(line.len());
    let mut gained = 0u64;
    let mut i = 0;
    while i < survivors.len() {
        if i + 1 < survivors.len() && survivors[i] == survivors[i + 1] {
            if let Some(merged) = survivors[i].checked_mul(2) {
                out.push(merged);
                gained += u64::from(merged);
                i += 2;
                continue;
            }
        }
        out.push(survivors[i]);
        i += 1;
    }
    out.resize(line.len(), 0);
    (out, gained)
}

/// Rotate a grid 90 degrees clockwise: `out[c][n-1-r] = in[r][c]`.
pub fn rotate_cw(grid: &Grid) -> Grid {
    let n = grid.size();
    let mut out = Grid::new(n);
    for r in 0..n {
        for c in 0..n {
            out.set(c, n - 1 - r, grid.get(r, c));
        }
    }
    out
}

/// Slide/merge all tiles in the given direction. No randomness.
///
/// Every direction is expressed as clockwise rotations bracketing a single
/// leftward `compress_line` pass over each row, so the merge arithmetic
/// exists in exactly one place.
pub fn shift(grid: &Grid, direction: Move) -> ShiftOutcome {
    let turns = match direction {
        Move::Left => 0,
        Move::Down => 1,
        Move::Right => 2,
        Move::Up => 3,
    };
    let mut work = grid.clone();
    for _ in 0..turns {
        work = rotate_cw(&work);
    }
    let n = work.size();
    let mut gained = 0u64;
    let mut changed = false;
    for r in 0..n {
        let (line, gain) = compress_line(work.row(r));
        if line.as_slice() != work.row(r) {
            changed = true;
        }
        gained += gain;
        for (c, &v) in line.iter().enumerate() {
            work.set(r, c, v);
        }
    }
    for _ in 0..(4 - turns) % 4 {
        work = rotate_cw(&work);
    }
    ShiftOutcome {
        grid: work,
        gained,
        changed,
    }
}

/// Insert a 2 (90%) or 4 (10%) tile into a uniformly random empty cell.
///
/// Returns false without mutating the grid when no empty cell exists.
/// This is the sole source of non-determinism in the crate.
pub fn spawn_tile<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> bool {
    let empties = grid.empty_cells();
    if empties.is_empty() {
        return false;
    }
    let (r, c) = empties[rng.gen_range(0..empties.len())];
    let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
    grid.set(r, c, value);
    true
}

/// True if any legal move remains: an empty cell, or two equal non-zero
/// neighbors in some row or column.
pub fn has_move_available(grid: &Grid) -> bool {
    let n = grid.size();
    for r in 0..n {
        for c in 0..n {
            let v = grid.get(r, c);
            if v == 0 {
                return true;
            }
            if c + 1 < n && grid.get(r, c + 1) == v {
                return true;
            }
            if r + 1 < n && grid.get(r + 1, c) == v {
                return true;
            }
        }
    }
    false
}
