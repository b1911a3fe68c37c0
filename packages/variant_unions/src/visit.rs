use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

use crate::VariantType;

/// Type-erased operations on one declared variant type.
///
/// A [`VariantList`][crate::VariantList] carries one entry per declared type, in declaration
/// order, built at compile time. A runtime variant index selects the entry, which turns an
/// untyped buffer address back into a typed operation.
#[derive(Clone, Copy, Debug)]
pub struct VariantVTable {
    type_info: fn() -> VariantType,
    destroy: unsafe fn(NonNull<()>),
}

/// Type-erased clone operations on one declared variant type.
///
/// Only available when the variant type is [`Clone`], so a union whose variants are not all
/// `Clone` has no clone table and no clone operations.
#[derive(Clone, Copy, Debug)]
pub struct CloneVTable {
    clone_construct: unsafe fn(NonNull<()>, NonNull<()>),
    clone_assign: unsafe fn(NonNull<()>, NonNull<()>),
}

impl VariantVTable {
    /// Creates the table entry for `T`.
    #[must_use]
    pub const fn of<T: 'static>() -> Self {
        Self {
            type_info: VariantType::of::<T>,
            destroy: destroy::<T>,
        }
    }

    /// Identity of the variant type this entry operates on.
    #[must_use]
    #[inline]
    pub fn variant_type(&self) -> VariantType {
        (self.type_info)()
    }

    /// Drops the value at `target` in place.
    ///
    /// # Safety
    ///
    /// `target` must point to a live, properly aligned value of this entry's type, which must
    /// not be used again afterwards.
    #[inline]
    pub(crate) unsafe fn destroy(&self, target: NonNull<()>) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe { (self.destroy)(target) }
    }
}

impl CloneVTable {
    /// Creates the table entry for `T`.
    #[must_use]
    pub const fn of<T: Clone + 'static>() -> Self {
        Self {
            clone_construct: clone_construct::<T>,
            clone_assign: clone_assign::<T>,
        }
    }

    /// Writes a clone of the value at `source` into the uninitialized memory at `destination`.
    ///
    /// # Safety
    ///
    /// `source` must point to a live value of this entry's type. `destination` must be valid
    /// for writes of that type, properly aligned, and must not overlap `source`.
    #[inline]
    pub(crate) unsafe fn clone_construct(&self, source: NonNull<()>, destination: NonNull<()>) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe { (self.clone_construct)(source, destination) }
    }

    /// Assigns a clone of the value at `source` to the live value at `destination`.
    ///
    /// # Safety
    ///
    /// Both pointers must point to live values of this entry's type and must not overlap.
    #[inline]
    pub(crate) unsafe fn clone_assign(&self, source: NonNull<()>, destination: NonNull<()>) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe { (self.clone_assign)(source, destination) }
    }
}

unsafe fn destroy<T>(target: NonNull<()>) {
    // SAFETY: VariantVTable::destroy() callers guarantee a live T.
    unsafe {
        ptr::drop_in_place(target.cast::<T>().as_ptr());
    }
}

unsafe fn clone_construct<T: Clone>(source: NonNull<()>, destination: NonNull<()>) {
    // SAFETY: CloneVTable::clone_construct() callers guarantee a live T at the source.
    let source = unsafe { source.cast::<T>().as_ref() };

    let value = source.clone();

    // SAFETY: CloneVTable::clone_construct() callers guarantee the destination is writable.
    unsafe {
        destination.cast::<T>().write(value);
    }
}

unsafe fn clone_assign<T: Clone>(source: NonNull<()>, destination: NonNull<()>) {
    // SAFETY: CloneVTable::clone_assign() callers guarantee a live T at the source.
    let source = unsafe { source.cast::<T>().as_ref() };

    // SAFETY: CloneVTable::clone_assign() callers guarantee a live, non-overlapping T at the
    // destination.
    let destination = unsafe { destination.cast::<T>().as_mut() };

    destination.clone_from(source);
}

/// Remembers how to drop a retired value while forgetting its type.
///
/// Drops its target when it is itself dropped, unless the target is dropped earlier via
/// [`drop_discarding_panic()`][Self::drop_discarding_panic].
#[derive(Debug)]
pub(crate) struct Dropper {
    target: NonNull<()>,
    entry: VariantVTable,
}

impl Dropper {
    /// Creates a new `Dropper` that will drop the value at `target` using `entry`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. The target is a live value of the type described by `entry` for the lifetime of the
    ///    `Dropper` instance.
    /// 2. The target is not dropped by any other means while the `Dropper` exists.
    /// 3. Only one `Dropper` instance exists for any given target at a time.
    pub(crate) unsafe fn new(target: NonNull<()>, entry: VariantVTable) -> Self {
        Self { target, entry }
    }

    /// Drops the target. If its destructor panics, the panic is caught and discarded.
    ///
    /// Returns `true` if a panic was discarded.
    pub(crate) fn drop_discarding_panic(self) -> bool {
        panic::catch_unwind(AssertUnwindSafe(move || drop(self))).is_err()
    }
}

impl Drop for Dropper {
    fn drop(&mut self) {
        // SAFETY: Dropper::new() ensures safety requirements are met.
        unsafe {
            self.entry.destroy(self.target);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::mem::MaybeUninit;
    use std::rc::Rc;

    use super::*;

    /// Test helper that counts how many times it has been dropped.
    struct DropCounter {
        drops: Rc<Cell<usize>>,
    }

    impl DropCounter {
        fn new() -> (Self, Rc<Cell<usize>>) {
            let drops = Rc::new(Cell::new(0));
            (
                Self {
                    drops: Rc::clone(&drops),
                },
                drops,
            )
        }
    }

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.drops.set(self.drops.get().wrapping_add(1));
        }
    }

    struct PanicsOnDrop;

    impl Drop for PanicsOnDrop {
        fn drop(&mut self) {
            panic!("destructor failure");
        }
    }

    #[test]
    fn entry_reports_variant_type() {
        assert_eq!(
            VariantVTable::of::<String>().variant_type(),
            VariantType::of::<String>()
        );
    }

    #[test]
    fn destroy_drops_target_once() {
        let (counter, drops) = DropCounter::new();
        let mut slot = MaybeUninit::new(counter);

        // SAFETY: The slot holds a live DropCounter that is not used afterwards.
        unsafe {
            VariantVTable::of::<DropCounter>().destroy(NonNull::from(&mut slot).cast());
        }

        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn clone_construct_writes_independent_copy() {
        let source = vec![1, 2, 3];
        let mut destination = MaybeUninit::<Vec<i32>>::uninit();

        // SAFETY: The source is a live Vec and the destination is writable, non-overlapping
        // memory for a Vec.
        unsafe {
            CloneVTable::of::<Vec<i32>>().clone_construct(
                NonNull::from(&source).cast(),
                NonNull::from(&mut destination).cast(),
            );
        }

        // SAFETY: clone_construct() initialized the destination.
        let destination = unsafe { destination.assume_init() };
        assert_eq!(destination, source);
        assert_ne!(destination.as_ptr(), source.as_ptr());
    }

    #[test]
    fn clone_assign_uses_clone_from() {
        let source = "replacement".to_string();
        let mut destination = String::with_capacity(64);
        destination.push_str("original");

        // SAFETY: Both pointers refer to live, distinct Strings.
        unsafe {
            CloneVTable::of::<String>()
                .clone_assign(NonNull::from(&source).cast(), NonNull::from(&mut destination).cast());
        }

        assert_eq!(destination, "replacement");
        // clone_from() reuses the existing allocation.
        assert!(destination.capacity() >= 64);
    }

    #[test]
    fn dropper_drops_target_when_dropped() {
        let (counter, drops) = DropCounter::new();
        let mut slot = MaybeUninit::new(counter);

        // SAFETY: The slot holds a live DropCounter that nothing else drops.
        let dropper = unsafe {
            Dropper::new(
                NonNull::from(&mut slot).cast(),
                VariantVTable::of::<DropCounter>(),
            )
        };

        assert_eq!(drops.get(), 0);
        drop(dropper);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn dropper_discards_destructor_panic() {
        let mut slot = MaybeUninit::new(PanicsOnDrop);

        // SAFETY: The slot holds a live PanicsOnDrop that nothing else drops.
        let dropper = unsafe {
            Dropper::new(
                NonNull::from(&mut slot).cast(),
                VariantVTable::of::<PanicsOnDrop>(),
            )
        };

        assert!(dropper.drop_discarding_panic());
    }

    #[test]
    fn dropper_reports_clean_drop() {
        let (counter, drops) = DropCounter::new();
        let mut slot = MaybeUninit::new(counter);

        // SAFETY: The slot holds a live DropCounter that nothing else drops.
        let dropper = unsafe {
            Dropper::new(
                NonNull::from(&mut slot).cast(),
                VariantVTable::of::<DropCounter>(),
            )
        };

        assert!(!dropper.drop_discarding_panic());
        assert_eq!(drops.get(), 1);
    }
}
