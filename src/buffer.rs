//! Reference-counted registry of output buffers handed to foreign callers.
//!
//! A buffer is registered with a count of 1 when it is handed over. Callers may [`retain`](BufferRegistry::retain)
//! and [`release`](BufferRegistry::release) it; the buffer is freed exactly when the count drops to zero.
//! Releasing a buffer the registry does not know is logged and the pointer is freed directly.
//!
//! Every operation takes a single lock for the duration of one map update. Freeing happens after the lock
//! is released.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::BufferError;


/// Allocation functions shared with the foreign caller.
///
/// # Safety
/// `free` must accept every non-null pointer returned by `allocate`.
pub unsafe trait BufferAllocator : Send + Sync {
    /// Allocates `len` bytes, or returns null.
    fn allocate(&self, len: usize) -> *mut u8;

    /// Frees a pointer obtained from `allocate`.
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on the same allocator and not have been freed yet.
    unsafe fn free(&self, ptr: *mut u8);
}

/// The C allocator, so that foreign callers may also free buffers with `free(3)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MallocAllocator;

unsafe impl BufferAllocator for MallocAllocator {
    fn allocate(&self, len: usize) -> *mut u8 {
        // SAFETY: malloc has no preconditions
        unsafe { libc::malloc(len) as *mut u8 }
    }

    unsafe fn free(&self, ptr: *mut u8) {
        libc::free(ptr as *mut libc::c_void)
    }
}


/// Outcome of [`BufferRegistry::release`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Other references remain; this many.
    Retained(usize),
    /// That was the last reference; the buffer was freed.
    Freed,
    /// The registry did not know the buffer; it was freed anyway.
    Unknown,
    /// Null pointer, nothing done.
    Null,
}

/// Maps buffer addresses to their live reference count.
pub struct BufferRegistry<A: BufferAllocator = MallocAllocator> {
    allocator: A,
    counts: Mutex<HashMap<usize, usize>>,
}

impl Default for BufferRegistry<MallocAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferRegistry<MallocAllocator> {
    /// A registry allocating with `malloc`.
    pub fn new() -> Self {
        Self::with_allocator(MallocAllocator)
    }
}

impl<A: BufferAllocator> BufferRegistry<A> {
    /// A registry allocating with `allocator`.
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            allocator,
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// The allocator in use
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Copies `bytes` into a freshly allocated buffer registered with a count of 1.
    pub fn allocate(&self, bytes: &[u8]) -> Result<*mut u8, BufferError> {
        if bytes.is_empty() {
            return Err(BufferError::Empty);
        }
        let ptr = self.allocator.allocate(bytes.len());
        if ptr.is_null() {
            error!("malloc failed for {} bytes", bytes.len());
            return Err(BufferError::Allocation(bytes.len()));
        }
        // SAFETY: `ptr` was just allocated with room for `bytes.len()` bytes and cannot overlap `bytes`.
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len()) };
        self.register(ptr);
        Ok(ptr)
    }

    /// Starts tracking `ptr` with a count of 1. Null is ignored.
    pub fn register(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        self.counts.lock().insert(ptr as usize, 1);
    }

    /// Adds a reference to `ptr` and returns the new count.
    /// An unknown buffer starts being tracked with a count of 1. Null is ignored and yields 0.
    pub fn retain(&self, ptr: *mut u8) -> usize {
        if ptr.is_null() {
            return 0;
        }
        let mut counts = self.counts.lock();
        let count = counts.entry(ptr as usize).or_insert(0);
        *count += 1;
        *count
    }

    /// Drops a reference to `ptr`, freeing it when it was the last one.
    ///
    /// # Safety
    /// If `ptr` is not tracked, it is freed directly: it must then be a live pointer from this
    /// registry's allocator.
    pub unsafe fn release(&self, ptr: *mut u8) -> Release {
        if ptr.is_null() {
            return Release::Null;
        }
        let key = ptr as usize;
        let outcome = {
            let mut counts = self.counts.lock();
            match counts.get(&key).copied() {
                None => Release::Unknown,
                Some(count) if count > 1 => {
                    counts.insert(key, count - 1);
                    Release::Retained(count - 1)
                }
                Some(_) => {
                    counts.remove(&key);
                    Release::Freed
                }
            }
        };
        match outcome {
            Release::Unknown => {
                warn!("freeing unknown buffer {:p}", ptr);
                self.allocator.free(ptr);
            }
            Release::Freed => self.allocator.free(ptr),
            Release::Retained(_) | Release::Null => (),
        }
        outcome
    }

    /// Current count of `ptr`, if tracked
    pub fn ref_count(&self, ptr: *const u8) -> Option<usize> {
        self.counts.lock().get(&(ptr as usize)).copied()
    }

    /// Number of buffers tracked
    pub fn live(&self) -> usize {
        self.counts.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        allocated: AtomicUsize,
        freed: AtomicUsize,
    }

    unsafe impl BufferAllocator for Counting {
        fn allocate(&self, len: usize) -> *mut u8 {
            self.allocated.fetch_add(1, Ordering::SeqCst);
            MallocAllocator.allocate(len)
        }

        unsafe fn free(&self, ptr: *mut u8) {
            self.freed.fetch_add(1, Ordering::SeqCst);
            MallocAllocator.free(ptr)
        }
    }

    #[test]
    fn freed_on_last_release() {
        let registry = BufferRegistry::with_allocator(Counting::default());
        let ptr = registry.allocate(b"abc").unwrap();
        assert_eq!(unsafe { std::slice::from_raw_parts(ptr, 3) }, b"abc");
        assert_eq!(registry.ref_count(ptr), Some(1));

        assert_eq!(registry.retain(ptr), 2);
        assert_eq!(registry.retain(ptr), 3);
        assert_eq!(unsafe { registry.release(ptr) }, Release::Retained(2));
        assert_eq!(unsafe { registry.release(ptr) }, Release::Retained(1));
        assert_eq!(registry.allocator().freed.load(Ordering::SeqCst), 0);
        assert_eq!(unsafe { registry.release(ptr) }, Release::Freed);
        assert_eq!(registry.allocator().freed.load(Ordering::SeqCst), 1);
        assert_eq!(registry.ref_count(ptr), None);
        assert_eq!(registry.live(), 0);
    }

    #[test]
    fn unknown_release_frees_directly() {
        let registry = BufferRegistry::with_allocator(Counting::default());
        let ptr = registry.allocator().allocate(8);
        assert_eq!(unsafe { registry.release(ptr) }, Release::Unknown);
        assert_eq!(registry.allocator().freed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retain_registers_unknown() {
        let registry = BufferRegistry::with_allocator(Counting::default());
        let ptr = registry.allocator().allocate(8);
        assert_eq!(registry.retain(ptr), 1);
        assert_eq!(unsafe { registry.release(ptr) }, Release::Freed);
        assert_eq!(registry.allocator().freed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn null_and_empty() {
        let registry = BufferRegistry::new();
        assert_eq!(registry.retain(std::ptr::null_mut()), 0);
        assert_eq!(unsafe { registry.release(std::ptr::null_mut()) }, Release::Null);
        assert_eq!(registry.allocate(&[]), Err(BufferError::Empty));
        assert_eq!(registry.live(), 0);
    }
}
