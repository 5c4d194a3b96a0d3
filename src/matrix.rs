use crate::error::{MResult, MatrixError};
use crate::shape::Shape;
use crate::storage::{Storage, StorageWriter};
use crate::view::{Column, Row};
use log::trace;
use num_traits::Zero;
use std::ops::{Index, Range};
use std::sync::Arc;

/// Two-dimensional row-major matrix with value semantics.
///
/// Cloning a `Matrix` only bumps a reference count. The buffer is copied the
/// first time a handle writes to it while another handle (or a [`Row`] /
/// [`Column`] view) still references it.
pub struct Matrix<A> {
    pub(crate) storage: Arc<Storage<A>>,
}

impl<A> Clone for Matrix<A> {
    fn clone(&self) -> Self {
        Matrix {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<A> Matrix<A> {
    pub(crate) fn from_storage(storage: Storage<A>) -> Self {
        Matrix {
            storage: Arc::new(storage),
        }
    }

    /// Builds a `rows x cols` matrix by handing its uninitialized buffer to
    /// `init`, which must write all `rows * cols` slots in row-major order.
    pub fn try_from_initializer<F>(rows: usize, cols: usize, init: F) -> MResult<Self>
    where
        F: FnOnce(&mut StorageWriter<'_, A>),
    {
        Storage::try_build(Shape::new(rows, cols), init).map(Self::from_storage)
    }

    pub fn from_initializer<F>(rows: usize, cols: usize, init: F) -> Self
    where
        F: FnOnce(&mut StorageWriter<'_, A>),
    {
        Self::from_storage(Storage::build(Shape::new(rows, cols), init))
    }

    pub fn repeating(value: A, rows: usize, cols: usize) -> Self
    where
        A: Clone,
    {
        Self::from_initializer(rows, cols, |w| {
            let n = w.capacity();
            w.fill(value, n)
        })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self
    where
        A: Clone + Zero,
    {
        Self::repeating(A::zero(), rows, cols)
    }

    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> A,
    {
        let shape = Shape::new(rows, cols);
        Self::from_initializer(shape.rows(), shape.cols(), |w| {
            for r in 0..shape.rows() {
                for c in 0..shape.cols() {
                    w.push(f(r, c));
                }
            }
        })
    }

    /// Takes ownership of a row-major buffer of exactly `rows * cols` elements.
    pub fn try_from_vec(rows: usize, cols: usize, v: Vec<A>) -> MResult<Self> {
        Storage::from_vec(Shape::new(rows, cols), v).map(Self::from_storage)
    }

    pub fn from_vec(rows: usize, cols: usize, v: Vec<A>) -> Self {
        match Self::try_from_vec(rows, cols, v) {
            Ok(m) => m,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds a matrix from row sequences. The first row fixes the column
    /// count; every other row must match it.
    pub fn try_from_rows<R>(rows: &[R]) -> MResult<Self>
    where
        R: AsRef<[A]>,
        A: Clone,
    {
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        for (index, row) in rows.iter().enumerate() {
            let got = row.as_ref().len();
            if got != ncols {
                return Err(MatrixError::RaggedRows {
                    index,
                    expected: ncols,
                    got,
                });
            }
        }
        Self::try_from_initializer(rows.len(), ncols, |w| {
            if w.capacity() == 0 {
                return;
            }
            for row in rows {
                w.extend(row.as_ref().iter().cloned());
            }
        })
    }

    pub fn from_rows<R>(rows: &[R]) -> Self
    where
        R: AsRef<[A]>,
        A: Clone,
    {
        match Self::try_from_rows(rows) {
            Ok(m) => m,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds a matrix from column sequences. The first column fixes the row
    /// count; every other column must match it.
    pub fn try_from_columns<C>(columns: &[C]) -> MResult<Self>
    where
        C: AsRef<[A]>,
        A: Clone,
    {
        let nrows = columns.first().map_or(0, |c| c.as_ref().len());
        for (index, col) in columns.iter().enumerate() {
            let got = col.as_ref().len();
            if got != nrows {
                return Err(MatrixError::RaggedColumns {
                    index,
                    expected: nrows,
                    got,
                });
            }
        }
        Self::try_from_initializer(nrows, columns.len(), |w| {
            if w.capacity() == 0 {
                return;
            }
            for r in 0..nrows {
                w.extend(columns.iter().map(|c| c.as_ref()[r].clone()));
            }
        })
    }

    pub fn from_columns<C>(columns: &[C]) -> Self
    where
        C: AsRef<[A]>,
        A: Clone,
    {
        match Self::try_from_columns(columns) {
            Ok(m) => m,
            Err(e) => panic!("{}", e),
        }
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.storage.shape()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.shape().rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.shape().cols()
    }

    pub fn is_empty(&self) -> bool {
        self.shape().is_empty()
    }

    pub fn row_indices(&self) -> Range<usize> {
        0..self.rows()
    }

    pub fn column_indices(&self) -> Range<usize> {
        0..self.cols()
    }

    /// The whole row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[A] {
        self.storage.as_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, A> {
        self.as_slice().iter()
    }

    pub fn try_get(&self, row: usize, col: usize) -> MResult<&A> {
        let shape = self.shape();
        if !shape.contains(row, col) {
            return Err(MatrixError::IndexOutOfBounds { row, col, shape });
        }
        Ok(&self.as_slice()[shape.offset_unchecked(row, col)])
    }

    pub fn get(&self, row: usize, col: usize) -> &A {
        match self.try_get(row, col) {
            Ok(v) => v,
            Err(e) => panic!("{}", e),
        }
    }

    /// Mutable element access. Copies the buffer first if it is shared.
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut A
    where
        A: Clone,
    {
        let offset = self.shape().offset(row, col);
        &mut self.storage_mut().as_slice_mut()[offset]
    }

    pub fn set(&mut self, row: usize, col: usize, value: A)
    where
        A: Clone,
    {
        *self.get_mut(row, col) = value;
    }

    /// Unique access to the buffer, cloning it when another holder exists.
    pub(crate) fn storage_mut(&mut self) -> &mut Storage<A>
    where
        A: Clone,
    {
        if Arc::strong_count(&self.storage) != 1 {
            trace!("copy-on-write: cloning shared {} storage", self.shape());
        }
        Arc::make_mut(&mut self.storage)
    }

    /// True when another matrix or view references the same buffer.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.storage) > 1
    }

    pub fn shares_storage_with(&self, other: &Matrix<A>) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Read-only view of row `index`, pinned to the current buffer.
    pub fn row(&self, index: usize) -> Row<A> {
        Row::new(Arc::clone(&self.storage), index)
    }

    /// Read-only view of column `index`, pinned to the current buffer.
    pub fn column(&self, index: usize) -> Column<A> {
        Column::new(Arc::clone(&self.storage), index)
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = Row<A>> + '_ {
        self.row_indices().map(move |r| self.row(r))
    }

    pub fn columns_iter(&self) -> impl Iterator<Item = Column<A>> + '_ {
        self.column_indices().map(move |c| self.column(c))
    }

    /// New matrix whose rows are this matrix's columns.
    pub fn transposed(&self) -> Matrix<A>
    where
        A: Clone,
    {
        let shape = self.shape().transposed();
        Matrix::from_initializer(shape.rows(), shape.cols(), |w| {
            for col in self.columns_iter() {
                w.extend(col.iter().cloned());
            }
        })
    }

    /// Applies `f` to every element in row-major order.
    pub fn map<B, F>(&self, f: F) -> Matrix<B>
    where
        F: FnMut(&A) -> B,
    {
        let shape = self.shape();
        Matrix::from_initializer(shape.rows(), shape.cols(), |w| {
            w.extend(self.iter().map(f))
        })
    }

    /// Row-major elements. A unique handle gives up its buffer; a shared
    /// one clones the elements.
    pub fn into_vec(self) -> Vec<A>
    where
        A: Clone,
    {
        match Arc::try_unwrap(self.storage) {
            Ok(storage) => storage.into_vec(),
            Err(shared) => shared.as_slice().to_vec(),
        }
    }
}

impl<A> Index<(usize, usize)> for Matrix<A> {
    type Output = A;

    fn index(&self, (row, col): (usize, usize)) -> &A {
        self.get(row, col)
    }
}

impl<A: Clone> From<Vec<Vec<A>>> for Matrix<A> {
    fn from(rows: Vec<Vec<A>>) -> Self {
        Matrix::from_rows(&rows)
    }
}

impl<A: Clone, const R: usize, const C: usize> From<[[A; C]; R]> for Matrix<A> {
    fn from(rows: [[A; C]; R]) -> Self {
        Matrix::from_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;

    #[test]
    fn test_repeating() {
        let m = Matrix::repeating(1.5f64, 2, 3);
        assert_eq!(m.shape().dims2(), (2, 3));
        assert!(m.iter().all(|x| *x == 1.5));
    }

    #[test]
    fn test_canonical_empty() {
        let m = Matrix::repeating(1, 0, 7);
        assert_eq!((m.rows(), m.cols()), (0, 0));
        let m = Matrix::<i32>::from_rows::<Vec<i32>>(&[vec![], vec![]]);
        assert_eq!((m.rows(), m.cols()), (0, 0));
        let m = Matrix::<i32>::from_columns::<Vec<i32>>(&[]);
        assert!(m.is_empty());
        assert_eq!(m.row_indices(), 0..0);
    }

    #[test]
    fn test_from_rows_and_columns() {
        let by_rows = matrix![[1, 2, 3], [4, 5, 6]];
        let by_cols = Matrix::from_columns(&[[1, 4], [2, 5], [3, 6]]);
        assert_eq!(by_rows.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(by_rows, by_cols);
        assert_eq!(by_rows[(1, 0)], 4);
        assert_eq!(*by_rows.get(0, 2), 3);
    }

    #[test]
    fn test_ragged_rows() {
        let r = Matrix::try_from_rows(&[vec![1, 2], vec![3]]);
        assert_eq!(
            r.err(),
            Some(MatrixError::RaggedRows {
                index: 1,
                expected: 2,
                got: 1
            })
        );
        let r = Matrix::try_from_columns(&[vec![1], vec![2, 3]]);
        assert!(matches!(r, Err(MatrixError::RaggedColumns { index: 1, .. })));
    }

    #[test]
    fn test_empty_first_row_fixes_length() {
        let r = Matrix::try_from_rows(&[vec![], vec![1]]);
        assert_eq!(
            r.err(),
            Some(MatrixError::RaggedRows {
                index: 1,
                expected: 0,
                got: 1
            })
        );
        let r = Matrix::try_from_columns(&[vec![], vec![1]]);
        assert!(matches!(
            r,
            Err(MatrixError::RaggedColumns {
                index: 1,
                expected: 0,
                got: 1
            })
        ));
    }

    #[test]
    #[should_panic(expected = "row 2 has 1 elements, expected 2")]
    fn test_ragged_rows_is_fatal() {
        Matrix::from(vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_from_initializer() {
        let m = Matrix::from_initializer(2, 2, |w| {
            for i in 0..w.capacity() {
                w.push(i * 10);
            }
        });
        assert_eq!(m, matrix![[0, 10], [20, 30]]);

        let r = Matrix::try_from_initializer(2, 2, |w| w.push(1));
        assert!(matches!(r, Err(MatrixError::Uninitialized { expected: 4, got: 1 })));
    }

    #[test]
    fn test_try_from_initializer_long_write() {
        let r = std::panic::catch_unwind(|| {
            Matrix::try_from_initializer(1, 2, |w| w.extend(vec![1, 2, 3]))
        });
        assert!(matches!(
            r,
            Ok(Err(MatrixError::Uninitialized { expected: 2, got: 3 }))
        ));
    }

    #[test]
    #[should_panic(expected = "buffer length 3 does not match 2 slots")]
    fn test_from_initializer_long_write_is_fatal() {
        Matrix::from_initializer(1, 2, |w| w.extend(vec![1, 2, 3]));
    }

    #[test]
    fn test_from_fn() {
        let m = Matrix::from_fn(2, 3, |r, c| r * 10 + c);
        assert_eq!(m, matrix![[0, 1, 2], [10, 11, 12]]);
    }

    #[test]
    fn test_copy_on_write() {
        let a = matrix![[1, 2], [3, 4]];
        let mut b = a.clone();
        assert!(a.shares_storage_with(&b));
        assert!(b.is_shared());

        b.set(0, 0, 100);
        assert!(!a.shares_storage_with(&b));
        assert_eq!(a, matrix![[1, 2], [3, 4]]);
        assert_eq!(b, matrix![[100, 2], [3, 4]]);

        // unique now, no further copy
        let before = b.as_slice().as_ptr();
        b.set(1, 1, 7);
        assert_eq!(before, b.as_slice().as_ptr());
    }

    #[test]
    fn test_write_through_original_leaves_copy() {
        let mut a = matrix![[1, 2], [3, 4]];
        let b = a.clone();
        *a.get_mut(1, 0) = -3;
        assert_eq!(b[(1, 0)], 3);
        assert_eq!(a[(1, 0)], -3);
    }

    #[test]
    fn test_view_pins_storage() {
        let mut a = matrix![[1, 2], [3, 4]];
        let row = a.row(0);
        assert!(a.is_shared());
        a.set(0, 0, 9);
        assert_eq!(row.to_vec(), vec![1, 2]);
        assert_eq!(a.row(0).to_vec(), vec![9, 2]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let m = matrix![[1, 2]];
        m.get(1, 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_set_out_of_bounds() {
        let mut m = matrix![[1, 2]];
        m.set(0, 2, 5);
    }

    #[test]
    fn test_transposed() {
        let m = matrix![[1, 2, 3], [4, 5, 6]];
        assert_eq!(m.transposed(), matrix![[1, 4], [2, 5], [3, 6]]);
        assert_eq!(m.transposed().transposed(), m);
        assert!(Matrix::<u8>::zeros(0, 0).transposed().is_empty());
    }

    #[test]
    fn test_map() {
        let m = matrix![[1, 2], [3, 4]];
        let s = m.map(|x| format!("<{}>", x));
        assert_eq!(s[(1, 1)], "<4>");
        assert_eq!(m, matrix![[1, 2], [3, 4]]);
    }

    #[test]
    fn test_into_vec() {
        let m = matrix![[1, 2], [3, 4]];
        let alias = m.clone();
        assert_eq!(m.into_vec(), vec![1, 2, 3, 4]);
        assert_eq!(alias.into_vec(), vec![1, 2, 3, 4]);

        let unique = Matrix::from_fn(2, 2, |r, c| (r * 2 + c).to_string());
        let ptr = unique.as_slice().as_ptr();
        let v = unique.into_vec();
        assert_eq!(v.as_ptr(), ptr);
        assert_eq!(v, ["0", "1", "2", "3"]);
        let empty = Matrix::<String>::from_rows::<Vec<String>>(&[]);
        assert!(empty.into_vec().is_empty());
    }
}
