use crate::error::{MResult, MatrixError};
use crate::shape::{capacity_overflow, Shape};
use alloc::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use core::marker::PhantomData;
use core::ptr::{self, NonNull};
use rawpointer::PointerExt;

struct SetLenOnDrop<'a> {
    len: &'a mut usize,
    local_len: usize,
}

impl<'a> SetLenOnDrop<'a> {
    #[inline]
    fn new(len: &'a mut usize) -> Self {
        SetLenOnDrop {
            local_len: *len,
            len,
        }
    }

    #[inline]
    fn increment_len(&mut self, increment: usize) {
        self.local_len += increment;
    }
}

impl Drop for SetLenOnDrop<'_> {
    #[inline]
    fn drop(&mut self) {
        *self.len = self.local_len;
    }
}

// Fixed-capacity buffer; the first `len` slots are initialized.
struct RawBuf<P> {
    ptr: NonNull<P>,
    len: usize,
    cap: usize,
    _marker: PhantomData<P>,
}

impl<P> RawBuf<P> {
    fn with_capacity(capacity: usize) -> Self {
        let layout = match Layout::array::<P>(capacity) {
            Ok(layout) => layout,
            Err(_) => capacity_overflow(),
        };
        let ptr = if layout.size() == 0 {
            NonNull::<P>::dangling()
        } else {
            let ptr = unsafe { alloc(layout) } as *mut P;
            match NonNull::new(ptr) {
                Some(p) => p,
                None => handle_alloc_error(layout),
            }
        };
        Self {
            ptr,
            len: 0,
            cap: capacity,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn as_slice(&self) -> &[P] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr() as *const P, self.len) }
    }
}

impl<P> Drop for RawBuf<P> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
        }
        if let Ok(layout) = Layout::array::<P>(self.cap) {
            if layout.size() != 0 {
                unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) }
            }
        }
    }
}

/// Hands out the uninitialized slots of a storage being built.
///
/// Slots are written strictly in row-major order. Writes past the last slot
/// are dropped and counted, and the build reports them as `Uninitialized`.
/// If the initializer panics only the elements already written are dropped.
pub struct StorageWriter<'a, P> {
    buf: &'a mut RawBuf<P>,
    overflow: usize,
}

impl<'a, P> StorageWriter<'a, P> {
    /// Total number of slots of the storage being built.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.cap
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.cap - self.buf.len
    }

    // Number of writes attempted so far, including rejected ones.
    #[inline]
    fn attempted(&self) -> usize {
        self.buf.len + self.overflow
    }

    pub fn push(&mut self, elem: P) {
        if self.buf.len == self.buf.cap {
            self.overflow += 1;
            return;
        }
        unsafe {
            ptr::write(self.buf.ptr.as_ptr().add(self.buf.len), elem);
        }
        self.buf.len += 1;
    }

    pub fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = P>,
    {
        for elem in iter {
            self.push(elem);
        }
    }

    /// Writes `n` clones of `elem`.
    pub fn fill(&mut self, elem: P, n: usize)
    where
        P: Clone,
    {
        let fits = n.min(self.remaining());
        self.overflow += n - fits;
        unsafe {
            let mut ptr = self.buf.ptr.as_ptr().add(self.buf.len);
            let mut local_len = SetLenOnDrop::new(&mut self.buf.len);

            for _ in 1..fits {
                ptr::write(ptr.post_inc(), elem.clone());
                // a panicking clone must not leak the count
                local_len.increment_len(1);
            }

            if fits > 0 {
                ptr::write(ptr, elem);
                local_len.increment_len(1);
            }
        }
    }
}

/// Contiguous row-major buffer of exactly `rows * cols` elements.
pub(crate) struct Storage<P> {
    buf: RawBuf<P>,
    shape: Shape,
}

unsafe impl<P: Send> Send for Storage<P> {}
unsafe impl<P: Sync> Sync for Storage<P> {}

impl<P> Storage<P> {
    /// Allocates `shape.elem_count()` slots and lets `init` write every one
    /// of them exactly once.
    pub(crate) fn try_build<F>(shape: Shape, init: F) -> MResult<Storage<P>>
    where
        F: FnOnce(&mut StorageWriter<'_, P>),
    {
        let mut buf = RawBuf::with_capacity(shape.elem_count());
        let attempted = {
            let mut writer = StorageWriter {
                buf: &mut buf,
                overflow: 0,
            };
            init(&mut writer);
            writer.attempted()
        };
        if attempted != buf.cap {
            log::debug!(
                "initializer for {} storage wrote {} of {} slots",
                shape,
                attempted,
                buf.cap
            );
            return Err(MatrixError::Uninitialized {
                expected: buf.cap,
                got: attempted,
            });
        }
        Ok(Storage { buf, shape })
    }

    pub(crate) fn build<F>(shape: Shape, init: F) -> Storage<P>
    where
        F: FnOnce(&mut StorageWriter<'_, P>),
    {
        match Self::try_build(shape, init) {
            Ok(s) => s,
            Err(e) => panic!("{}", e),
        }
    }

    pub(crate) fn from_vec(shape: Shape, v: Vec<P>) -> MResult<Storage<P>> {
        if v.len() != shape.elem_count() {
            return Err(MatrixError::Uninitialized {
                expected: shape.elem_count(),
                got: v.len(),
            });
        }
        Self::try_build(shape, |w| w.extend(v))
    }

    #[inline]
    pub(crate) fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[P] {
        self.buf.as_slice()
    }

    #[inline]
    pub(crate) fn as_slice_mut(&mut self) -> &mut [P] {
        unsafe { std::slice::from_raw_parts_mut(self.buf.ptr.as_ptr(), self.buf.len) }
    }

    /// Hands the buffer over to a `Vec` without touching the elements.
    pub(crate) fn into_vec(mut self) -> Vec<P> {
        let (ptr, len, cap) = (self.buf.ptr, self.buf.len, self.buf.cap);
        self.buf.ptr = NonNull::dangling();
        self.buf.len = 0;
        self.buf.cap = 0;
        // same global allocator and `Layout::array::<P>(cap)` as `Vec`
        unsafe { Vec::from_raw_parts(ptr.as_ptr(), len, cap) }
    }

    /// Mutable access through a shared reference.
    ///
    /// # Safety
    ///
    /// No other reference into this buffer may be alive while the returned
    /// slice is in use.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub(crate) unsafe fn as_slice_mut_unchecked(&self) -> &mut [P] {
        std::slice::from_raw_parts_mut(self.buf.ptr.as_ptr(), self.buf.len)
    }
}

impl<P: Clone> Clone for Storage<P> {
    fn clone(&self) -> Self {
        Storage::build(self.shape, |w| w.extend(self.as_slice().iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_build_fill() {
        let s = Storage::build(Shape::new(2, 3), |w| {
            let n = w.capacity();
            w.fill(7u32, n)
        });
        assert_eq!(s.as_slice(), &[7, 7, 7, 7, 7, 7]);
        assert_eq!(s.shape(), Shape::new(2, 3));
    }

    #[test]
    fn test_build_short_write() {
        let r = Storage::try_build(Shape::new(2, 2), |w| w.extend(vec![1, 2, 3]));
        assert_eq!(
            r.err(),
            Some(MatrixError::Uninitialized {
                expected: 4,
                got: 3
            })
        );
    }

    #[test]
    fn test_build_long_write() {
        let r = Storage::try_build(Shape::new(1, 2), |w| w.extend(vec![1, 2, 3]));
        assert_eq!(
            r.err(),
            Some(MatrixError::Uninitialized {
                expected: 2,
                got: 3
            })
        );

        let r = Storage::try_build(Shape::new(2, 2), |w| {
            w.push(0);
            w.fill(1, 5);
        });
        assert_eq!(
            r.err(),
            Some(MatrixError::Uninitialized {
                expected: 4,
                got: 6
            })
        );
    }

    #[test]
    fn test_long_write_drops_rejected() {
        let drops = Rc::new(Cell::new(0));
        let r = Storage::try_build(Shape::new(1, 1), |w| {
            w.push(DropCounter(drops.clone()));
            w.push(DropCounter(drops.clone()));
        });
        assert!(r.is_err());
        assert_eq!(drops.get(), 2);
    }

    #[test]
    #[should_panic(expected = "buffer length 3 does not match 2 slots")]
    fn test_build_overflow() {
        Storage::build(Shape::new(1, 2), |w| w.extend(vec![1, 2, 3]));
    }

    #[test]
    fn test_panicking_initializer_drops_written() {
        let drops = Rc::new(Cell::new(0));
        let d = drops.clone();
        let r = panic::catch_unwind(AssertUnwindSafe(|| {
            Storage::build(Shape::new(2, 2), |w| {
                w.push(DropCounter(d.clone()));
                w.push(DropCounter(d.clone()));
                panic!("boom");
            })
        }));
        assert!(r.is_err());
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_clone_is_deep() {
        let a = Storage::from_vec(Shape::new(1, 3), vec![1, 2, 3]).unwrap();
        let mut b = a.clone();
        b.as_slice_mut()[0] = 10;
        assert_eq!(a.as_slice(), &[1, 2, 3]);
        assert_eq!(b.as_slice(), &[10, 2, 3]);
    }

    #[test]
    fn test_zero_sized() {
        let s = Storage::build(Shape::new(3, 3), |w| {
            let n = w.capacity();
            w.fill((), n)
        });
        assert_eq!(s.as_slice().len(), 9);
        assert_eq!(s.into_vec().len(), 9);
        let e = Storage::<String>::build(Shape::new(0, 4), |_| {});
        assert!(e.as_slice().is_empty());
        assert!(e.into_vec().is_empty());
    }

    #[test]
    fn test_into_vec_moves_elements() {
        let drops = Rc::new(Cell::new(0));
        let s = Storage::build(Shape::new(1, 3), |w| {
            w.extend((0..3).map(|_| DropCounter(drops.clone())))
        });
        let v = s.into_vec();
        assert_eq!(drops.get(), 0);
        assert_eq!(v.len(), 3);
        drop(v);
        assert_eq!(drops.get(), 3);
    }
}
