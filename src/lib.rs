//! Copy-on-write two-dimensional matrices.
//!
//! A [`Matrix`] is a cheap-to-clone handle onto a shared row-major
//! buffer. Handles behave like independent values: writing through one
//! of them copies the buffer first when anything else still references it.
//! [`Row`] and [`Column`] views pin the buffer they were taken from.
//!
//! Contract violations (ragged construction input, mismatched operand shapes,
//! out-of-range indices) panic. Each panicking operation has a `try_*`
//! counterpart returning [`MResult`].
extern crate alloc;

mod error;
mod format;
mod matrix;
mod op;
mod shape;
mod storage;
mod view;

pub use crate::error::{MResult, MatrixError};
pub use crate::matrix::Matrix;
pub use crate::shape::{Axis, Shape};
pub use crate::storage::StorageWriter;
pub use crate::view::{Column, Iter, Row};

/// Builds a [`Matrix`] from literal rows.
///
/// ```
/// use cowmat::matrix;
///
/// let m = matrix![[1, 2], [3, 4]];
/// assert_eq!(m.cols(), 2);
/// ```
#[macro_export]
macro_rules! matrix {
    () => {{
        $crate::Matrix::from_rows::<::std::vec::Vec<_>>(&[])
    }};
    ($([$($x:expr),* $(,)*]),+ $(,)*) => {{
        $crate::Matrix::from_rows(&[$(::std::vec![$($x,)*],)*])
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_macro() {
        let m = matrix![[1, 2, 3], [4, 5, 6],];
        assert_eq!(m.shape(), Shape::new(2, 3));
        let e: Matrix<f32> = matrix![];
        assert!(e.is_empty());
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Matrix<f64>>();
        assert_send_sync::<Row<f64>>();
        assert_send_sync::<Column<String>>();
    }
}
