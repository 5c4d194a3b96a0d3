use std::fmt;

/// Which axis a view runs along.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Extent of a row-major matrix.
///
/// Any zero extent collapses to `0x0`, so `rows == 0` iff `cols == 0`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: usize,
    cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Shape {
        if rows == 0 || cols == 0 {
            return Shape { rows: 0, cols: 0 };
        }
        Shape { rows, cols }
    }

    pub fn empty() -> Shape {
        Shape { rows: 0, cols: 0 }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn dims2(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn elem_count(&self) -> usize {
        self.rows
            .checked_mul(self.cols)
            .unwrap_or_else(|| capacity_overflow())
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    // [r, c] => strides [c, 1]
    #[inline]
    pub fn stride(&self) -> (usize, usize) {
        (self.cols, 1)
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Row-major offset of `(row, col)`. Panics when out of bounds.
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            self.contains(row, col),
            "index ({}, {}) out of bounds for {}",
            row,
            col,
            self
        );
        self.offset_unchecked(row, col)
    }

    #[inline]
    pub(crate) fn offset_unchecked(&self, row: usize, col: usize) -> usize {
        let (s0, s1) = self.stride();
        row * s0 + col * s1
    }

    pub fn transposed(&self) -> Shape {
        Shape {
            rows: self.cols,
            cols: self.rows,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

#[cold]
pub(crate) fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}
