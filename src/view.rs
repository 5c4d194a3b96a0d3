use crate::error::{MResult, MatrixError};
use crate::shape::Axis;
use crate::storage::Storage;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

/// Iterator over the elements of a [`Row`] or [`Column`].
pub struct Iter<'a, A> {
    data: &'a [A],
    base: usize,
    step: usize,
    pos: usize,
    end: usize,
}

impl<'a, A> Iterator for Iter<'a, A> {
    type Item = &'a A;

    #[inline]
    fn next(&mut self) -> Option<&'a A> {
        if self.pos == self.end {
            return None;
        }
        let v = &self.data[self.base + self.pos * self.step];
        self.pos += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.pos;
        (n, Some(n))
    }
}

impl<'a, A> DoubleEndedIterator for Iter<'a, A> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a A> {
        if self.pos == self.end {
            return None;
        }
        self.end -= 1;
        Some(&self.data[self.base + self.end * self.step])
    }
}

impl<A> ExactSizeIterator for Iter<'_, A> {}

impl<A> FusedIterator for Iter<'_, A> {}

macro_rules! impl_view {
    ($name:ident, $axis:expr) => {
        impl<A> $name<A> {
            #[inline]
            pub fn axis(&self) -> Axis {
                $axis
            }

            /// The fixed row or column index this view was taken at.
            #[inline]
            pub fn index(&self) -> usize {
                self.index
            }

            #[inline]
            pub fn start_index(&self) -> usize {
                0
            }

            #[inline]
            pub fn end_index(&self) -> usize {
                self.len
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.len
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.len == 0
            }

            pub fn checked_get(&self, position: usize) -> MResult<&A> {
                if position >= self.len {
                    return Err(MatrixError::PositionOutOfBounds {
                        axis: $axis,
                        position,
                        len: self.len,
                    });
                }
                Ok(&self.storage.as_slice()[self.offset(position)])
            }

            pub fn get(&self, position: usize) -> &A {
                match self.checked_get(position) {
                    Ok(v) => v,
                    Err(e) => panic!("{}", e),
                }
            }

            pub fn iter(&self) -> Iter<'_, A> {
                Iter {
                    data: self.storage.as_slice(),
                    base: self.offset(0),
                    step: self.step(),
                    pos: 0,
                    end: self.len,
                }
            }

            pub fn to_vec(&self) -> Vec<A>
            where
                A: Clone,
            {
                self.iter().cloned().collect()
            }
        }

        impl<A> Clone for $name<A> {
            fn clone(&self) -> Self {
                $name {
                    storage: Arc::clone(&self.storage),
                    index: self.index,
                    len: self.len,
                }
            }
        }

        impl<A> std::ops::Index<usize> for $name<A> {
            type Output = A;

            fn index(&self, position: usize) -> &A {
                self.get(position)
            }
        }

        impl<'a, A> IntoIterator for &'a $name<A> {
            type Item = &'a A;
            type IntoIter = Iter<'a, A>;

            fn into_iter(self) -> Iter<'a, A> {
                self.iter()
            }
        }

        impl<A: fmt::Display> fmt::Display for $name<A> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("[")?;
                for (i, v) in self.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt::Display::fmt(v, f)?;
                }
                f.write_str("]")
            }
        }

        impl<A: fmt::Debug> fmt::Debug for $name<A> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list().entries(self.iter()).finish()
            }
        }
    };
}

/// Read-only row of a matrix.
///
/// Holds its own reference to the buffer the matrix had when the view was
/// taken, so later writes through the matrix are not visible here.
pub struct Row<A> {
    storage: Arc<Storage<A>>,
    index: usize,
    len: usize,
}

impl<A> Row<A> {
    pub(crate) fn new(storage: Arc<Storage<A>>, index: usize) -> Self {
        let shape = storage.shape();
        assert!(
            index < shape.rows(),
            "row index {} out of bounds for {}",
            index,
            shape
        );
        Row {
            len: shape.cols(),
            storage,
            index,
        }
    }

    #[inline]
    fn offset(&self, position: usize) -> usize {
        self.index * self.storage.shape().cols() + position
    }

    #[inline]
    fn step(&self) -> usize {
        1
    }

    /// The row as a contiguous slice.
    pub fn as_slice(&self) -> &[A] {
        let start = self.offset(0);
        &self.storage.as_slice()[start..start + self.len]
    }
}

/// Read-only column of a matrix. See [`Row`] for the snapshot semantics.
pub struct Column<A> {
    storage: Arc<Storage<A>>,
    index: usize,
    len: usize,
}

impl<A> Column<A> {
    pub(crate) fn new(storage: Arc<Storage<A>>, index: usize) -> Self {
        let shape = storage.shape();
        assert!(
            index < shape.cols(),
            "column index {} out of bounds for {}",
            index,
            shape
        );
        Column {
            len: shape.rows(),
            storage,
            index,
        }
    }

    #[inline]
    fn offset(&self, position: usize) -> usize {
        position * self.storage.shape().cols() + self.index
    }

    #[inline]
    fn step(&self) -> usize {
        self.storage.shape().cols()
    }
}

impl_view!(Row, Axis::Row);
impl_view!(Column, Axis::Column);
