use crate::shape::{Axis, Shape};
use thiserror::Error;

pub type MResult<T> = Result<T, MatrixError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("row {index} has {got} elements, expected {expected}")]
    RaggedRows {
        index: usize,
        expected: usize,
        got: usize,
    },
    #[error("column {index} has {got} elements, expected {expected}")]
    RaggedColumns {
        index: usize,
        expected: usize,
        got: usize,
    },
    #[error("shape mismatch in {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },
    #[error("cannot multiply {lhs} by {rhs}: inner dimensions differ")]
    InnerDimMismatch { lhs: Shape, rhs: Shape },
    #[error("index ({row}, {col}) out of bounds for {shape}")]
    IndexOutOfBounds { row: usize, col: usize, shape: Shape },
    #[error("{axis} position {position} out of bounds for length {len}")]
    PositionOutOfBounds {
        axis: Axis,
        position: usize,
        len: usize,
    },
    #[error("buffer length {got} does not match {expected} slots")]
    Uninitialized { expected: usize, got: usize },
}
