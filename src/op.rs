use crate::error::{MResult, MatrixError};
use crate::matrix::Matrix;
use crate::shape::Shape;
use crate::storage::Storage;
use num_traits::Zero;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::sync::Arc;

#[inline]
fn is_same_shape(op: &'static str, lhs: Shape, rhs: Shape) -> MResult<()> {
    if lhs != rhs {
        return Err(MatrixError::ShapeMismatch { op, lhs, rhs });
    }
    Ok(())
}

fn convert_iopsf<A: Clone, B: Clone>(f: impl Fn(A, B) -> A) -> impl FnMut((&mut A, &B)) {
    move |(x, y): (&mut A, &B)| *x = f(x.clone(), y.clone())
}

fn clone_opsf<A: Clone, B: Clone, C>(f: impl Fn(A, B) -> C) -> impl FnMut((&A, &B)) -> C {
    move |(x, y): (&A, &B)| f(x.clone(), y.clone())
}

impl<A: PartialEq> PartialEq for Matrix<A> {
    fn eq(&self, other: &Matrix<A>) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        self.as_slice() == other.as_slice()
    }
}

impl<A: Eq> Eq for Matrix<A> {}

impl<A: Hash> Hash for Matrix<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows().hash(state);
        self.cols().hash(state);
        for v in self.iter() {
            v.hash(state);
        }
    }
}

impl<A> Matrix<A> {
    /// True when every element is the additive identity.
    pub fn is_zero(&self) -> bool
    where
        A: Zero,
    {
        self.iter().all(Zero::is_zero)
    }

    /// Combines two same-shaped matrices elementwise into a new buffer.
    pub fn try_zip_map<B, C, F>(
        &self,
        rhs: &Matrix<B>,
        op: &'static str,
        f: F,
    ) -> MResult<Matrix<C>>
    where
        F: FnMut((&A, &B)) -> C,
    {
        is_same_shape(op, self.shape(), rhs.shape())?;
        let (rows, cols) = self.shape().dims2();
        Ok(Matrix::from_initializer(rows, cols, |w| {
            w.extend(self.iter().zip(rhs.iter()).map(f))
        }))
    }

    // Elementwise update of this handle's buffer, copying it first if shared.
    fn zip_assign<F>(&mut self, rhs: &Matrix<A>, op: &'static str, f: F)
    where
        A: Clone,
        F: FnMut((&mut A, &A)),
    {
        if let Err(e) = is_same_shape(op, self.shape(), rhs.shape()) {
            panic!("{}", e);
        }
        let dst = self.storage_mut().as_slice_mut();
        dst.iter_mut().zip(rhs.iter()).for_each(f);
    }

    pub fn try_add(&self, rhs: &Matrix<A>) -> MResult<Matrix<A>>
    where
        A: Add<Output = A> + Clone,
    {
        self.try_zip_map(rhs, "add", clone_opsf(A::add))
    }

    pub fn try_sub(&self, rhs: &Matrix<A>) -> MResult<Matrix<A>>
    where
        A: Sub<Output = A> + Clone,
    {
        self.try_zip_map(rhs, "sub", clone_opsf(A::sub))
    }

    /// Matrix product. `result[i][j]` sums `lhs[i][k] * rhs[k][j]` for
    /// ascending `k` into a zero-filled buffer.
    pub fn try_matmul(&self, rhs: &Matrix<A>) -> MResult<Matrix<A>>
    where
        A: Zero + Mul<Output = A> + Clone,
    {
        let (m, n) = self.shape().dims2();
        let (p, q) = rhs.shape().dims2();
        if n != p {
            return Err(MatrixError::InnerDimMismatch {
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        let mut out = Storage::build(Shape::new(m, q), |w| {
            let len = w.capacity();
            w.fill(A::zero(), len)
        });
        let lhs = self.as_slice();
        let rhs = rhs.as_slice();
        let dst = out.as_slice_mut();
        for i in 0..m {
            for j in 0..q {
                let o = i * q + j;
                for k in 0..n {
                    let acc = std::mem::replace(&mut dst[o], A::zero());
                    dst[o] = acc + lhs[i * n + k].clone() * rhs[k * q + j].clone();
                }
            }
        }
        Ok(Matrix::from_storage(out))
    }

    /// Multiplies every element by `k`.
    pub fn scale(&self, k: A) -> Matrix<A>
    where
        A: Mul<Output = A> + Clone,
    {
        self.map(|x| x.clone() * k.clone())
    }

    /// Adds `rhs` into this matrix's buffer without the copy-on-write check,
    /// so every matrix and view sharing the buffer observes the change.
    ///
    /// Panics when the shapes differ.
    ///
    /// # Safety
    ///
    /// No reference into the shared buffer obtained through another handle
    /// (`as_slice`, `get`, view accessors or iterators) may be alive during
    /// the call, and no other thread may access the buffer concurrently.
    pub unsafe fn add_assign_aliased(&mut self, rhs: &Matrix<A>)
    where
        A: Add<Output = A> + Clone,
    {
        self.zip_assign_aliased(rhs, "add_assign_aliased", convert_iopsf(A::add))
    }

    /// Subtracting counterpart of [`Matrix::add_assign_aliased`].
    ///
    /// # Safety
    ///
    /// Same contract as [`Matrix::add_assign_aliased`].
    pub unsafe fn sub_assign_aliased(&mut self, rhs: &Matrix<A>)
    where
        A: Sub<Output = A> + Clone,
    {
        self.zip_assign_aliased(rhs, "sub_assign_aliased", convert_iopsf(A::sub))
    }

    unsafe fn zip_assign_aliased<F>(&mut self, rhs: &Matrix<A>, op: &'static str, f: F)
    where
        A: Clone,
        F: FnMut((&mut A, &A)),
    {
        if let Err(e) = is_same_shape(op, self.shape(), rhs.shape()) {
            panic!("{}", e);
        }
        // rhs may be an alias of self
        let snapshot;
        let src = if Arc::ptr_eq(&self.storage, &rhs.storage) {
            snapshot = rhs.as_slice().to_vec();
            snapshot.as_slice()
        } else {
            rhs.as_slice()
        };
        let dst = self.storage.as_slice_mut_unchecked();
        dst.iter_mut().zip(src.iter()).for_each(f);
    }
}

macro_rules! impl_binary_op {
    ($trt:ident, $mth:ident, $try_mth:ident, $op:literal) => {
        impl<A> std::ops::$trt<&Matrix<A>> for Matrix<A>
        where
            A: std::ops::$trt<A, Output = A> + Clone,
        {
            type Output = Matrix<A>;
            fn $mth(mut self, rhs: &Matrix<A>) -> Self::Output {
                self.zip_assign(rhs, $op, convert_iopsf(A::$mth));
                self
            }
        }

        impl<A> std::ops::$trt<Matrix<A>> for Matrix<A>
        where
            A: std::ops::$trt<A, Output = A> + Clone,
        {
            type Output = Matrix<A>;
            fn $mth(mut self, rhs: Matrix<A>) -> Self::Output {
                self.zip_assign(&rhs, $op, convert_iopsf(A::$mth));
                self
            }
        }

        impl<A> std::ops::$trt<&Matrix<A>> for &Matrix<A>
        where
            A: std::ops::$trt<A, Output = A> + Clone,
        {
            type Output = Matrix<A>;
            fn $mth(self, rhs: &Matrix<A>) -> Self::Output {
                match self.$try_mth(rhs) {
                    Ok(m) => m,
                    Err(e) => panic!("{}", e),
                }
            }
        }

        impl<A> std::ops::$trt<Matrix<A>> for &Matrix<A>
        where
            A: std::ops::$trt<A, Output = A> + Clone,
        {
            type Output = Matrix<A>;
            fn $mth(self, rhs: Matrix<A>) -> Self::Output {
                match self.$try_mth(&rhs) {
                    Ok(m) => m,
                    Err(e) => panic!("{}", e),
                }
            }
        }
    };
}

macro_rules! impl_assign_op {
    ($trt:ident, $mth:ident, $base:ident, $base_mth:ident, $op:literal) => {
        impl<A> $trt<&Matrix<A>> for Matrix<A>
        where
            A: $base<A, Output = A> + Clone,
        {
            fn $mth(&mut self, rhs: &Matrix<A>) {
                self.zip_assign(rhs, $op, convert_iopsf(A::$base_mth));
            }
        }

        impl<A> $trt<Matrix<A>> for Matrix<A>
        where
            A: $base<A, Output = A> + Clone,
        {
            fn $mth(&mut self, rhs: Matrix<A>) {
                self.zip_assign(&rhs, $op, convert_iopsf(A::$base_mth));
            }
        }
    };
}

macro_rules! impl_matmul {
    ($lhs:ty, $rhs:ty) => {
        impl<A> Mul<$rhs> for $lhs
        where
            A: Zero + Mul<Output = A> + Clone,
        {
            type Output = Matrix<A>;
            fn mul(self, rhs: $rhs) -> Matrix<A> {
                match self.try_matmul(&rhs) {
                    Ok(m) => m,
                    Err(e) => panic!("{}", e),
                }
            }
        }
    };
}

impl_binary_op!(Add, add, try_add, "add"); // +
impl_binary_op!(Sub, sub, try_sub, "sub"); // -

impl_assign_op!(AddAssign, add_assign, Add, add, "add_assign"); // +=
impl_assign_op!(SubAssign, sub_assign, Sub, sub, "sub_assign"); // -=

impl_matmul!(Matrix<A>, Matrix<A>);
impl_matmul!(Matrix<A>, &Matrix<A>);
impl_matmul!(&Matrix<A>, Matrix<A>);
impl_matmul!(&Matrix<A>, &Matrix<A>);

impl<A> Neg for Matrix<A>
where
    A: Neg<Output = A> + Clone,
{
    type Output = Matrix<A>;
    fn neg(self) -> Matrix<A> {
        self.map(|x| -x.clone())
    }
}

impl<A> Neg for &Matrix<A>
where
    A: Neg<Output = A> + Clone,
{
    type Output = Matrix<A>;
    fn neg(self) -> Matrix<A> {
        self.map(|x| -x.clone())
    }
}
