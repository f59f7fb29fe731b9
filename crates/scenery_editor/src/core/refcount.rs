//! Intrusive reference-counted ownership handles
//!
//! [`Ref`] is the strong owning handle used throughout the editor for scene
//! entities, mesh sources, and render resources. The count lives inside the
//! object (any [`RefCounted`] implementor carries a [`RefCounter`]), so no
//! separate control block is allocated. [`WeakRef`] observes without owning;
//! its validity is a membership test against the
//! [`LiveRegistry`](crate::core::LiveRegistry).
//!
//! Handles may be cloned across threads; the count is atomic and the last
//! decrement to reach zero is the only one that destroys the object. Weak
//! validity is only authoritative on the thread that owns the strong handles.

use crate::core::registry::LiveRegistry;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};

/// Atomic reference-count storage embedded in every ownable object
#[derive(Debug, Default)]
pub struct RefCounter {
    count: AtomicU32,
}

impl RefCounter {
    /// Create a counter starting at zero (no handle exists yet)
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Atomically increment the count, returning the new value
    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Atomically decrement the count, returning the new value
    ///
    /// The subtraction and the value used for the zero check are a single
    /// atomic operation; exactly one caller observes the transition to zero.
    /// Calling this more often than [`increment`](Self::increment) is a usage
    /// contract violation.
    pub fn decrement(&self) -> u32 {
        let previous = self.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "reference count underflow");
        previous - 1
    }

    /// Current count snapshot (advisory under concurrency)
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}

/// Capability trait for objects ownable through [`Ref`]
///
/// Implementors embed a [`RefCounter`] and expose it via `ref_counter`;
/// `as_any` powers the checked downcast path ([`AnyRef::downcast`]).
pub trait RefCounted: Any + Send + Sync {
    /// The embedded reference counter
    fn ref_counter(&self) -> &RefCounter;

    /// Type-erased view for runtime-checked downcasts
    fn as_any(&self) -> &dyn Any;
}

/// Strong shared-ownership handle over a [`RefCounted`] object
///
/// Cloning increments the count, moving transfers without touching it, and
/// dropping decrements; the object is destroyed exactly once, the instant the
/// last handle releases it. A handle may also be null ([`Ref::null`]).
///
/// Raw pointers obtained through [`Ref::raw`] must not outlive the owning
/// handle; the design does not protect against that misuse.
pub struct Ref<T: RefCounted + ?Sized> {
    ptr: Option<NonNull<T>>,
}

/// Type-erased strong handle, used as the generic asset handle
pub type AnyRef = Ref<dyn RefCounted>;

// SAFETY: RefCounted requires Send + Sync and the count is atomic, so
// handles can move and be shared across threads.
unsafe impl<T: RefCounted + ?Sized> Send for Ref<T> {}
unsafe impl<T: RefCounted + ?Sized> Sync for Ref<T> {}

impl<T: RefCounted + ?Sized> Ref<T> {
    /// Create a null handle
    pub const fn null() -> Self {
        Self { ptr: None }
    }

    /// Wrap an already-boxed object, registering it and taking the first count
    pub fn from_box(boxed: Box<T>) -> Self {
        let handle = Self {
            ptr: Some(NonNull::from(Box::leak(boxed))),
        };
        handle.retain();
        handle
    }

    /// Whether the handle currently points at an object
    pub fn is_valid(&self) -> bool {
        self.ptr.is_some()
    }

    /// Whether the handle is null
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Borrow the pointed-to object, if any
    pub fn get(&self) -> Option<&T> {
        match self.ptr {
            // SAFETY: a non-null ptr is kept alive by this handle's count.
            Some(ptr) => Some(unsafe { &*ptr.as_ptr() }),
            None => None,
        }
    }

    /// Raw pointer to the object, `None` for a null handle
    ///
    /// The pointer is valid only while a strong handle keeps the object
    /// alive. Retaining it past that point is a documented hazard.
    pub fn raw(&self) -> Option<*const T> {
        self.ptr.map(|ptr| ptr.as_ptr() as *const T)
    }

    /// Number of strong handles currently sharing the object (0 when null)
    pub fn use_count(&self) -> u32 {
        self.get().map_or(0, |object| object.ref_counter().count())
    }

    /// Whether this handle is the only owner
    pub fn is_unique(&self) -> bool {
        self.use_count() == 1
    }

    /// Release the held object and become null
    pub fn reset(&mut self) {
        self.release();
    }

    /// Adopt a raw pointer without incrementing
    ///
    /// Low-level escape hatch, not the common path: the previous target is
    /// released first, and no count is taken for `ptr`.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live registered object whose count
    /// already accounts for this handle.
    pub unsafe fn reset_raw(&mut self, ptr: *mut T) {
        self.release();
        self.ptr = NonNull::new(ptr);
    }

    /// Identity comparison: both handles hold the same address
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }

    /// Deep comparison: dereference both sides and compare the objects
    ///
    /// Returns `false` if either handle is null.
    pub fn eq_object(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn address(&self) -> usize {
        self.ptr.map_or(0, |ptr| ptr.as_ptr().cast::<()>() as usize)
    }

    fn retain(&self) {
        if let Some(ptr) = self.ptr {
            // SAFETY: the caller holds (or is constructing) a counted handle,
            // so the object is alive.
            let object = unsafe { &*ptr.as_ptr() };
            object.ref_counter().increment();
            LiveRegistry::global().register(ptr.as_ptr().cast::<()>() as usize);
        }
    }

    fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: this handle owns one count; the object is alive.
            let remaining = unsafe { &*ptr.as_ptr() }.ref_counter().decrement();
            if remaining == 0 {
                LiveRegistry::global().unregister(ptr.as_ptr().cast::<()>() as usize);
                // SAFETY: exactly one handle observes the zero transition,
                // so the box is reclaimed exactly once.
                unsafe { drop(Box::from_raw(ptr.as_ptr())) };
            }
        }
    }
}

impl<T: RefCounted> Ref<T> {
    /// Allocate `value` on the heap and wrap it
    ///
    /// The single recommended construction path: registry and count
    /// bookkeeping are applied exactly once.
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Upcast into the type-erased handle, consuming this one
    ///
    /// Always legal; the count is transferred, not incremented.
    pub fn into_any(self) -> AnyRef {
        let ptr = self.ptr.map(|ptr| {
            let raw: *mut dyn RefCounted = ptr.as_ptr();
            // SAFETY: derived from a non-null pointer.
            unsafe { NonNull::new_unchecked(raw) }
        });
        std::mem::forget(self);
        Ref { ptr }
    }

    /// Upcast into a new type-erased handle, sharing ownership
    pub fn to_any(&self) -> AnyRef {
        self.clone().into_any()
    }
}

impl AnyRef {
    /// Whether the underlying object's dynamic type is `U`
    pub fn is<U: RefCounted>(&self) -> bool {
        self.get().is_some_and(|object| object.as_any().is::<U>())
    }

    /// Checked downcast to a concrete type, sharing ownership
    ///
    /// Returns `None` when the underlying object is not a `U`; neither
    /// handle's count is disturbed by a failed cast.
    pub fn downcast<U: RefCounted>(&self) -> Option<Ref<U>> {
        let ptr = self.ptr?;
        // SAFETY: this handle keeps the object alive.
        if !unsafe { &*ptr.as_ptr() }.as_any().is::<U>() {
            return None;
        }
        let handle = Ref {
            ptr: NonNull::new(ptr.as_ptr().cast::<U>()),
        };
        handle.retain();
        Some(handle)
    }
}

impl<T: RefCounted + ?Sized> Clone for Ref<T> {
    fn clone(&self) -> Self {
        let handle = Self { ptr: self.ptr };
        handle.retain();
        handle
    }
}

impl<T: RefCounted + ?Sized> Drop for Ref<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: RefCounted + ?Sized> Default for Ref<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: RefCounted + ?Sized> Deref for Ref<T> {
    type Target = T;

    /// Dereferencing a null handle is a usage contract violation and panics
    fn deref(&self) -> &T {
        match self.get() {
            Some(object) => object,
            None => panic!("dereferencing null Ref"),
        }
    }
}

impl<T: RefCounted + ?Sized> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: RefCounted + ?Sized> Eq for Ref<T> {}

impl<T: RefCounted + ?Sized> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl<T: RefCounted + ?Sized> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("count", &self.use_count())
            .finish()
    }
}

/// Non-owning observer handle over a [`RefCounted`] object
///
/// Holds only the address; never touches the count. Validity is determined
/// at observation time by asking the live registry, so a `WeakRef` notices
/// when its target is destroyed regardless of when the weak handle itself
/// was created.
///
/// Accessing the object through [`WeakRef::get`] or [`WeakRef::upgrade`] is
/// only race-free on the thread that owns the strong handles.
pub struct WeakRef<T: RefCounted + ?Sized> {
    ptr: Option<NonNull<T>>,
}

// SAFETY: only an address is stored; all object access re-checks liveness.
unsafe impl<T: RefCounted + ?Sized> Send for WeakRef<T> {}
unsafe impl<T: RefCounted + ?Sized> Sync for WeakRef<T> {}

impl<T: RefCounted + ?Sized> WeakRef<T> {
    /// Create a weak handle observing nothing
    pub const fn null() -> Self {
        Self { ptr: None }
    }

    /// Observe a raw pointer without taking ownership
    ///
    /// No registry mutation occurs; validity is still answered by the live
    /// registry at observation time.
    ///
    /// # Safety
    /// `ptr` must be null or a pointer previously handed out by the `Ref`
    /// machinery for an object of type `T`.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            ptr: NonNull::new(ptr),
        }
    }

    /// Whether the observed object is still registered as live
    ///
    /// `false` for a null handle or a destroyed target. A `true` answer is
    /// only stable on the thread owning the strong handles.
    pub fn is_valid(&self) -> bool {
        match self.ptr {
            Some(ptr) => LiveRegistry::global().is_live(ptr.as_ptr().cast::<()>() as usize),
            None => false,
        }
    }

    /// Borrow the object if it is still live
    ///
    /// Prefer [`WeakRef::upgrade`]: a strong handle keeps the borrow
    /// backed for as long as it is held.
    ///
    /// # Safety
    /// The caller must hold a strong handle to the target on this thread
    /// for the whole lifetime of the returned borrow. The weak handle by
    /// itself does not keep the object alive, so the borrow dangles the
    /// moment the last strong handle drops.
    pub unsafe fn get(&self) -> Option<&T> {
        if !self.is_valid() {
            return None;
        }
        self.ptr.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// Promote to a strong handle if the object is still live
    pub fn upgrade(&self) -> Option<Ref<T>> {
        if !self.is_valid() {
            return None;
        }
        let handle = Ref { ptr: self.ptr };
        handle.retain();
        Some(handle)
    }

    /// Checked downcast of the observed object
    ///
    /// Produces a null weak handle when the target is dead or not a `U`.
    pub fn downcast<U: RefCounted>(&self) -> WeakRef<U> {
        // The temporary strong handle keeps the target backed for the
        // duration of the type check.
        match (self.ptr, self.upgrade()) {
            (Some(ptr), Some(strong)) if strong.as_any().is::<U>() => WeakRef {
                ptr: NonNull::new(ptr.as_ptr().cast::<U>()),
            },
            _ => WeakRef::null(),
        }
    }
}

impl<T: RefCounted + ?Sized> From<&Ref<T>> for WeakRef<T> {
    fn from(strong: &Ref<T>) -> Self {
        Self { ptr: strong.ptr }
    }
}

impl<T: RefCounted + ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: RefCounted + ?Sized> Copy for WeakRef<T> {}

impl<T: RefCounted + ?Sized> Default for WeakRef<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: RefCounted + ?Sized> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRef")
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::thread;

    /// Tests observing destruction share the process-wide live registry, so
    /// serialize them to keep freed addresses from being reused mid-test.
    fn liveness_guard() -> MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    struct Tracked {
        counter: RefCounter,
        drops: Arc<AtomicU32>,
        value: i32,
    }

    impl Tracked {
        fn new(drops: Arc<AtomicU32>, value: i32) -> Self {
            Self {
                counter: RefCounter::new(),
                drops,
                value,
            }
        }
    }

    impl RefCounted for Tracked {
        fn ref_counter(&self) -> &RefCounter {
            &self.counter
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    impl PartialEq for Tracked {
        fn eq(&self, other: &Self) -> bool {
            self.value == other.value
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Unrelated {
        counter: RefCounter,
    }

    impl RefCounted for Unrelated {
        fn ref_counter(&self) -> &RefCounter {
            &self.counter
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_destroyed_exactly_once_after_last_handle() {
        let _guard = liveness_guard();
        let drops = Arc::new(AtomicU32::new(0));
        let first = Ref::new(Tracked::new(Arc::clone(&drops), 1));

        let mut handles: Vec<_> = (0..16).map(|_| first.clone()).collect();
        assert_eq!(first.use_count(), 17);

        // Drop in an interleaved order: evens first, then odds.
        let odds: Vec<_> = handles
            .drain(..)
            .enumerate()
            .filter_map(|(i, h)| (i % 2 == 1).then_some(h))
            .collect();
        drop(odds);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(first);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_move_transfers_without_incrementing() {
        let drops = Arc::new(AtomicU32::new(0));
        let first = Ref::new(Tracked::new(Arc::clone(&drops), 2));
        assert_eq!(first.use_count(), 1);
        assert!(first.is_unique());

        let moved = first;
        assert_eq!(moved.use_count(), 1);

        let copied = moved.clone();
        assert_eq!(copied.use_count(), 2);
        assert!(!copied.is_unique());
    }

    #[test]
    fn test_weak_tracks_liveness() {
        let _guard = liveness_guard();
        let drops = Arc::new(AtomicU32::new(0));
        let strong = Ref::new(Tracked::new(Arc::clone(&drops), 3));
        let weak = WeakRef::from(&strong);

        assert!(weak.is_valid());
        assert_eq!(weak.upgrade().map(|p| p.value), Some(3));

        let second = strong.clone();
        drop(strong);
        assert!(weak.is_valid(), "a strong owner still exists");

        drop(second);
        assert!(!weak.is_valid());
        assert!(weak.upgrade().is_none());
        // SAFETY: the borrow is never held; a dead target must yield None.
        assert!(unsafe { weak.get() }.is_none());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weak_upgrade() {
        let _guard = liveness_guard();
        let drops = Arc::new(AtomicU32::new(0));
        let strong = Ref::new(Tracked::new(Arc::clone(&drops), 4));
        let weak = WeakRef::from(&strong);

        let upgraded = weak.upgrade().expect("target is live");
        assert_eq!(upgraded.use_count(), 2);

        drop(strong);
        drop(upgraded);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_downcast_success_and_failure() {
        let _guard = liveness_guard();
        let drops = Arc::new(AtomicU32::new(0));
        let typed = Ref::new(Tracked::new(Arc::clone(&drops), 5));
        let erased = typed.to_any();
        assert_eq!(typed.use_count(), 2);

        let back = erased.downcast::<Tracked>().expect("same concrete type");
        assert_eq!(back.value, 5);
        assert_eq!(typed.use_count(), 3);

        assert!(erased.downcast::<Unrelated>().is_none());
        assert_eq!(typed.use_count(), 3, "failed downcast leaves counts alone");

        drop(back);
        drop(erased);
        drop(typed);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weak_downcast() {
        let _guard = liveness_guard();
        let drops = Arc::new(AtomicU32::new(0));
        let typed = Ref::new(Tracked::new(Arc::clone(&drops), 6));
        let erased = typed.to_any();
        let weak = WeakRef::from(&erased);

        assert!(weak.downcast::<Tracked>().is_valid());
        assert!(!weak.downcast::<Unrelated>().is_valid());

        drop(erased);
        drop(typed);
        assert!(!weak.downcast::<Tracked>().is_valid());
    }

    #[test]
    fn test_identity_and_object_equality() {
        let drops = Arc::new(AtomicU32::new(0));
        let a = Ref::new(Tracked::new(Arc::clone(&drops), 7));
        let b = a.clone();
        let c = Ref::new(Tracked::new(Arc::clone(&drops), 7));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.eq_object(&c), "same value, different identity");
        assert!(!a.eq_object(&Ref::null()));
    }

    #[test]
    fn test_null_handle_behavior() {
        let handle: Ref<Tracked> = Ref::null();
        assert!(handle.is_null());
        assert!(!handle.is_valid());
        assert!(handle.get().is_none());
        assert_eq!(handle.use_count(), 0);
        assert!(handle.raw().is_none());
    }

    #[test]
    fn test_raw_pointer_on_typed_and_erased_handles() {
        let drops = Arc::new(AtomicU32::new(0));
        let typed = Ref::new(Tracked::new(Arc::clone(&drops), 10));
        let erased = typed.to_any();

        let typed_raw = typed.raw().expect("live handle has an address");
        let erased_raw = erased.raw().expect("erased handle keeps the address");
        assert_eq!(typed_raw.cast::<()>(), erased_raw.cast::<()>());

        assert!(AnyRef::null().raw().is_none());
    }

    #[test]
    fn test_reset_releases_ownership() {
        let _guard = liveness_guard();
        let drops = Arc::new(AtomicU32::new(0));
        let mut handle = Ref::new(Tracked::new(Arc::clone(&drops), 8));
        handle.reset();

        assert!(handle.is_null());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_clone_and_drop() {
        let _guard = liveness_guard();
        let drops = Arc::new(AtomicU32::new(0));
        let shared = Ref::new(Tracked::new(Arc::clone(&drops), 9));

        let mut workers = Vec::new();
        for _ in 0..8 {
            let local = shared.clone();
            workers.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let copy = local.clone();
                    assert_eq!(copy.value, 9);
                }
            }));
        }

        for worker in workers {
            worker.join().expect("ref worker panicked");
        }

        assert_eq!(shared.use_count(), 1);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(shared);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
