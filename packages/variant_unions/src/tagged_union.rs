use std::fmt;
use std::mem::{self, ManuallyDrop, MaybeUninit};
use std::ptr::{self, NonNull};

use crate::{CloneVariants, Contains, Dropper, SelfPointer, VariantList, VariantType};

/// A union over the types in `L` that remembers which type it holds.
///
/// `L` is a tuple of types, e.g. `TaggedUnion<(i32, String)>`. The union owns at most one value
/// of one of those types, stored in place in a buffer shared by all of them. It keeps track of
/// which type is active, so it knows how to clone and drop the value and refuses typed access
/// under the wrong type.
///
/// In addition to the declared types, the union can hold a raw pointer (of any depth) to a
/// union of its own type, which the type list itself cannot name. Such a pointer is stored as
/// plain bytes and never dereferenced by the union.
///
/// # States
///
/// A union is in exactly one of three states:
///
/// * empty, as created by [`new()`][Self::new] or left behind by [`clear()`][Self::clear],
/// * holding a value of a declared type,
/// * holding a pointer to a union of its own type.
///
/// # Example
///
/// ```rust
/// use variant_unions::{TaggedUnion, VariantType};
///
/// let mut number = TaggedUnion::<(i32, f64)>::from_value::<i32, _>(-2);
///
/// assert_eq!(number.get::<i32, _>(), Some(&-2));
/// assert_eq!(number.get::<f64, _>(), None);
/// assert!(number.try_get::<f64, _>().is_err());
///
/// number.set::<f64, _>(3.75);
///
/// assert_eq!(number.stored_type(), Some(VariantType::of::<f64>()));
/// assert_eq!(number.get_at::<1>(), Some(&3.75));
/// ```
///
/// # Thread safety
///
/// The union may hold raw pointers, so it is neither [`Send`] nor [`Sync`].
pub struct TaggedUnion<L: VariantList> {
    what: MaybeUninit<Storage<L::Overlay>>,

    /// `None` when no value is stored.
    which: Option<Active>,
}

/// Shared buffer, large enough for any declared type and for any thin raw pointer.
#[repr(C)]
union Storage<Overlay> {
    variants: ManuallyDrop<Overlay>,
    self_pointer: *const (),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Active {
    /// A value of the declared type at this position.
    Variant(usize),

    /// A pointer to a union of the same type, of the given pointer type.
    SelfPointer(VariantType),
}

impl<L: VariantList> TaggedUnion<L> {
    /// Number of declared types, repeats included.
    pub const VARIANT_COUNT: usize = L::LEN;

    /// Creates an empty union.
    ///
    /// # Example
    ///
    /// ```rust
    /// use variant_unions::TaggedUnion;
    ///
    /// let empty = TaggedUnion::<(u8, String)>::new();
    ///
    /// assert!(empty.is_empty());
    /// assert_eq!(empty.stored_type(), None);
    /// assert!(empty.data().is_null());
    /// ```
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            what: MaybeUninit::uninit(),
            which: None,
        }
    }

    /// Creates a union holding `value`, whose type must be one of the declared types.
    ///
    /// The position marker `I` is inferred, so callers write `_` for it.
    ///
    /// ```rust,compile_fail
    /// use variant_unions::TaggedUnion;
    ///
    /// // u16 is not one of the declared types.
    /// let _ = TaggedUnion::<(u8, String)>::from_value::<u16, _>(7);
    /// ```
    #[must_use]
    #[inline]
    pub fn from_value<T, I>(value: T) -> Self
    where
        L::Overlay: Contains<T, I>,
    {
        let mut union = Self::new();
        union.write_variant::<T, I>(value);
        union
    }

    /// Creates a union holding a raw pointer to a union of its own type.
    ///
    /// Any pointer depth is accepted, e.g. `*const Self` or `*mut *const Self`. The pointer is
    /// stored verbatim and never dereferenced.
    ///
    /// # Example
    ///
    /// ```rust
    /// use variant_unions::TaggedUnion;
    ///
    /// type Node = TaggedUnion<(i32,)>;
    ///
    /// let leaf = Node::from_value::<i32, _>(1);
    /// let parent = Node::from_self_pointer(&raw const leaf);
    ///
    /// assert!(parent.storing_pointer_to_self());
    /// assert_eq!(parent.self_pointer::<*const Node>(), Some(&raw const leaf));
    /// ```
    #[must_use]
    #[inline]
    pub fn from_self_pointer<P>(pointer: P) -> Self
    where
        P: SelfPointer<Self>,
    {
        let mut union = Self::new();
        union.write_self_pointer(pointer);
        union
    }

    /// Returns the ordered list of declared types, repeats included.
    ///
    /// # Example
    ///
    /// ```rust
    /// use variant_unions::{TaggedUnion, VariantType};
    ///
    /// assert_eq!(
    ///     TaggedUnion::<(u8, String)>::variant_types(),
    ///     [VariantType::of::<u8>(), VariantType::of::<String>()]
    /// );
    /// assert!(TaggedUnion::<()>::variant_types().is_empty());
    /// ```
    #[must_use]
    #[inline]
    pub fn variant_types() -> L::Types {
        L::variant_types()
    }

    /// The type of the stored value or pointer, or `None` if the union is empty.
    #[must_use]
    #[inline]
    pub fn stored_type(&self) -> Option<VariantType> {
        match self.which? {
            Active::Variant(index) => L::variant_type_at(index),
            Active::SelfPointer(ty) => Some(ty),
        }
    }

    /// Whether the union holds a pointer to a union of its own type.
    #[must_use]
    #[inline]
    pub fn storing_pointer_to_self(&self) -> bool {
        matches!(self.which, Some(Active::SelfPointer(_)))
    }

    /// Whether the union holds nothing.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.which.is_none()
    }

    /// Address of the stored value or pointer, without type, or null if the union is empty.
    #[must_use]
    #[inline]
    pub fn data(&self) -> *const () {
        if self.which.is_some() {
            self.what.as_ptr().cast()
        } else {
            ptr::null()
        }
    }

    /// Mutable address of the stored value or pointer, without type, or null if the union is
    /// empty.
    #[must_use]
    #[inline]
    pub fn data_mut(&mut self) -> *mut () {
        if self.which.is_some() {
            self.what.as_mut_ptr().cast()
        } else {
            ptr::null_mut()
        }
    }

    /// Reads back a pointer stored by [`from_self_pointer()`][Self::from_self_pointer] or
    /// [`set_self_pointer()`][Self::set_self_pointer].
    ///
    /// Returns `None` unless the union holds a pointer of exactly type `P`.
    #[must_use]
    #[inline]
    pub fn self_pointer<P>(&self) -> Option<P>
    where
        P: SelfPointer<Self>,
    {
        match self.which {
            Some(Active::SelfPointer(ty)) if ty == VariantType::of::<P>() => {
                // SAFETY: The tag says the buffer holds a P, written by write_self_pointer().
                Some(unsafe { self.what.as_ptr().cast::<P>().read() })
            }
            _ => None,
        }
    }

    /// Stores `value`, replacing whatever the union held.
    ///
    /// If the union already holds a value of type `T`, the new value is assigned over it.
    /// Otherwise the old content is dropped first and `value` is moved into the buffer.
    #[inline]
    pub fn set<T, I>(&mut self, value: T)
    where
        L::Overlay: Contains<T, I>,
        T: 'static,
    {
        if let Some(current) = self.typed_ptr_mut::<T>() {
            // SAFETY: typed_ptr_mut() only returns a pointer to a live T, borrowed mutably.
            unsafe {
                *current.as_ptr() = value;
            }

            return;
        }

        self.clear();
        self.write_variant::<T, I>(value);
    }

    /// Stores a raw pointer to a union of its own type, replacing whatever the union held.
    #[inline]
    pub fn set_self_pointer<P>(&mut self, pointer: P)
    where
        P: SelfPointer<Self>,
    {
        self.clear();
        self.write_self_pointer(pointer);
    }

    /// Drops the stored value, if any, and leaves the union empty.
    ///
    /// The union is marked empty before the value's destructor runs, so a panicking
    /// destructor still leaves the union empty.
    pub fn clear(&mut self) {
        if let Some(Active::Variant(index)) = self.which.take() {
            if let Some(entry) = L::DISPATCH.get(index) {
                // SAFETY: The tag said the buffer holds a live value of the type at `index`,
                // and the tag is already cleared so it is not dropped again.
                unsafe {
                    entry.destroy(self.buffer_mut());
                }
            }
        }
    }

    /// Moves the value of type `T` out, leaving the union empty.
    ///
    /// Returns `None` and leaves the union untouched if it does not hold a `T`.
    #[must_use]
    pub fn take<T, I>(&mut self) -> Option<T>
    where
        L::Overlay: Contains<T, I>,
        T: 'static,
    {
        self.take_typed::<T>()
    }

    /// Moves the value out if it is of type `T`, leaving the union empty.
    pub(crate) fn take_typed<T: 'static>(&mut self) -> Option<T> {
        let source = self.typed_ptr_mut::<T>()?;

        self.which = None;

        // SAFETY: typed_ptr_mut() only returns a pointer to a live T. The tag is cleared, so
        // the value is moved out exactly once.
        Some(unsafe { source.read() })
    }

    /// Moves the content of `source` into `self`.
    ///
    /// If both unions hold values of the same declared type, the two values trade places:
    /// `self` receives the source value and `source` is left holding the previous value of
    /// `self`, which remains valid and is dropped with `source`.
    ///
    /// Every other combination (different types, or either side empty or holding a pointer to
    /// itself) is carried out as [`clone_from()`][Clone::clone_from], so the source keeps its
    /// value and the cost is that of a clone.
    pub fn move_from(&mut self, source: &mut Self)
    where
        L: CloneVariants,
    {
        match (self.which, source.which) {
            (Some(Active::Variant(mine)), Some(Active::Variant(theirs)))
                if L::variant_type_at(mine) == L::variant_type_at(theirs) =>
            {
                mem::swap(self, source);
            }
            _ => self.clone_from(source),
        }
    }

    /// Diagnostic check of the union's bookkeeping.
    ///
    /// An empty union is always consistent. A stored value must have a declared type, and a
    /// stored pointer must have a type that is not among the declared types.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self.which {
            None => true,
            Some(Active::Variant(index)) => index < L::LEN,
            Some(Active::SelfPointer(ty)) => L::position_of(ty).is_none(),
        }
    }

    /// Whether the stored value is of type `T`, matched by type identity.
    pub(crate) fn holds<T: 'static>(&self) -> bool {
        match self.which {
            Some(Active::Variant(index)) => {
                L::variant_type_at(index) == Some(VariantType::of::<T>())
            }
            _ => false,
        }
    }

    /// Pointer to the stored value if it is of type `T`, for reading only.
    pub(crate) fn typed_ptr<T: 'static>(&self) -> Option<NonNull<T>> {
        self.holds::<T>().then(|| self.buffer().cast())
    }

    /// Pointer to the stored value if it is of type `T`.
    pub(crate) fn typed_ptr_mut<T: 'static>(&mut self) -> Option<NonNull<T>> {
        if self.holds::<T>() {
            Some(self.buffer_mut().cast())
        } else {
            None
        }
    }

    fn buffer(&self) -> NonNull<()> {
        NonNull::from(&self.what).cast()
    }

    fn buffer_mut(&mut self) -> NonNull<()> {
        NonNull::from(&mut self.what).cast()
    }

    /// Writes a declared value into the buffer and tags it.
    ///
    /// The union must not hold a value that needs dropping.
    fn write_variant<T, I>(&mut self, value: T)
    where
        L::Overlay: Contains<T, I>,
    {
        debug_assert!(!matches!(self.which, Some(Active::Variant(_))));

        // SAFETY: T is a member of the overlay, which starts at offset zero of the buffer and
        // is at least as large and as aligned as T.
        unsafe {
            self.buffer_mut().cast::<T>().write(value);
        }

        self.which = Some(Active::Variant(
            <L::Overlay as Contains<T, I>>::INDEX,
        ));

        debug_assert!(self.is_consistent());
    }

    fn write_self_pointer<P>(&mut self, pointer: P)
    where
        P: SelfPointer<Self>,
    {
        const {
            assert!(mem::size_of::<P>() <= mem::size_of::<*const ()>());
            assert!(mem::align_of::<P>() <= mem::align_of::<*const ()>());
        }

        debug_assert!(!matches!(self.which, Some(Active::Variant(_))));

        // SAFETY: P is a thin raw pointer, which fits the pointer slot of the buffer.
        unsafe {
            self.buffer_mut().cast::<P>().write(pointer);
        }

        self.which = Some(Active::SelfPointer(VariantType::of::<P>()));

        debug_assert!(self.is_consistent());
    }

    /// Byte-for-byte copy of another union's buffer. Only valid for trivial content.
    fn copy_buffer_from(&mut self, source: &Self) {
        debug_assert!(!matches!(source.which, Some(Active::Variant(_))));

        // SAFETY: Both buffers are valid for their full size and belong to distinct unions.
        unsafe {
            ptr::copy_nonoverlapping(source.what.as_ptr(), self.what.as_mut_ptr(), 1);
        }
    }
}

impl<L: VariantList> Default for TaggedUnion<L> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<L: VariantList> Drop for TaggedUnion<L> {
    fn drop(&mut self) {
        // A stored pointer and the empty state have nothing to drop.
        self.clear();
    }
}

impl<L: CloneVariants> Clone for TaggedUnion<L> {
    fn clone(&self) -> Self {
        let mut cloned = Self::new();

        match self.which {
            None => {}
            Some(Active::SelfPointer(_)) => cloned.copy_buffer_from(self),
            Some(Active::Variant(index)) => {
                if let Some(entry) = L::CLONE_DISPATCH.get(index) {
                    // SAFETY: The tag says our buffer holds a live value of the type at
                    // `index`, and the new union's buffer is uninitialized and distinct.
                    unsafe {
                        entry.clone_construct(self.buffer(), cloned.buffer_mut());
                    }
                }
            }
        }

        // Tagging only after the clone succeeded keeps a panicking clone from being dropped.
        cloned.which = self.which;
        cloned
    }

    /// Replaces the content of `self` with a clone of the content of `source`.
    ///
    /// * If both hold values of the same declared type, that type's own `clone_from()` is used
    ///   in place.
    /// * If they hold values of different declared types, the clone is built in separate
    ///   storage first. If that panics, `self` is unchanged. Otherwise the clone replaces the
    ///   old value, which is then dropped. A panic from the old value's destructor is caught
    ///   and discarded, since the new value is already in place.
    /// * If `self` holds a value and `source` holds nothing or a pointer, the old value is
    ///   dropped and the source content copied. If the destructor panics, `self` is left empty.
    /// * If `self` holds nothing or a pointer, a full clone of `source` is built first and
    ///   only then stored. If that panics, `self` is unchanged.
    fn clone_from(&mut self, source: &Self) {
        match (self.which, source.which) {
            (Some(Active::Variant(mine)), Some(Active::Variant(theirs))) => {
                if L::variant_type_at(mine) == L::variant_type_at(theirs) {
                    self.clone_assign_same_type(source, theirs);
                } else {
                    self.clone_replace_other_type(source, mine, theirs);
                }
            }
            (Some(Active::Variant(_)), incoming) => {
                self.clear();

                if incoming.is_some() {
                    self.copy_buffer_from(source);
                }

                self.which = incoming;
            }
            _ => {
                let fresh = source.clone();

                // The previous content is empty or a pointer, so overwriting drops nothing.
                *self = fresh;
            }
        }

        debug_assert!(self.is_consistent());
    }
}

impl<L: CloneVariants> TaggedUnion<L> {
    fn clone_assign_same_type(&mut self, source: &Self, index: usize) {
        if let Some(entry) = L::CLONE_DISPATCH.get(index) {
            // SAFETY: Both buffers hold live values of the same type, the one at `index`, and
            // belong to distinct unions.
            unsafe {
                entry.clone_assign(source.buffer(), self.buffer_mut());
            }
        }

        self.which = source.which;
    }

    fn clone_replace_other_type(&mut self, source: &Self, mine: usize, theirs: usize) {
        let (Some(retired_entry), Some(incoming_entry), Some(clone_entry)) = (
            L::DISPATCH.get(mine).copied(),
            L::DISPATCH.get(theirs),
            L::CLONE_DISPATCH.get(theirs),
        ) else {
            return;
        };

        let mut staged = MaybeUninit::<Storage<L::Overlay>>::uninit();

        // SAFETY: The source buffer holds a live value of the type at `theirs` and the staging
        // buffer is uninitialized, distinct storage of the same layout.
        unsafe {
            clone_entry.clone_construct(source.buffer(), NonNull::from(&mut staged).cast());
        }

        // Commit: the clone takes the live slot, the old value moves to the retired slot.
        let mut retired = mem::replace(&mut self.what, staged);
        self.which = source.which;

        log::trace!(
            "replaced {} with {} in tagged union",
            retired_entry.variant_type(),
            incoming_entry.variant_type()
        );

        // SAFETY: The retired buffer holds the old live value of the type at `mine`. Nothing
        // else refers to it and it is dropped exactly once, here.
        let dropper = unsafe { Dropper::new(NonNull::from(&mut retired).cast(), retired_entry) };

        if dropper.drop_discarding_panic() {
            log::warn!(
                "discarded a panic from the destructor of a replaced {} value",
                retired_entry.variant_type()
            );
        }
    }
}

impl<L: VariantList> fmt::Debug for TaggedUnion<L> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedUnion")
            .field("stored_type", &self.stored_type())
            .field("storing_pointer_to_self", &self.storing_pointer_to_self())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::mem::size_of;
    use std::panic::{self, AssertUnwindSafe};
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{Here, There};

    type IntDouble = TaggedUnion<(i32, f64)>;
    type Mixed = TaggedUnion<(u8, String, Vec<u32>)>;

    assert_impl_all!(IntDouble: Clone, Default, fmt::Debug);
    assert_impl_all!(Mixed: Clone);
    assert_not_impl_any!(IntDouble: Send, Sync);
    assert_not_impl_any!(TaggedUnion<(u8, Box<dyn FnOnce()>)>: Clone);

    #[derive(Debug)]
    struct Tracked {
        drops: Rc<Cell<usize>>,
    }

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            Self {
                drops: Rc::clone(&self.drops),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get().wrapping_add(1));
        }
    }

    #[test]
    fn new_is_empty_and_consistent() {
        let union = IntDouble::new();

        assert!(union.is_empty());
        assert!(!union.storing_pointer_to_self());
        assert_eq!(union.stored_type(), None);
        assert!(union.is_consistent());
    }

    #[test]
    fn buffer_fits_largest_variant_and_pointer() {
        assert!(size_of::<TaggedUnion<(u8,)>>() >= size_of::<*const ()>());
        assert!(size_of::<TaggedUnion<([u8; 64],)>>() >= 64);
    }

    #[test]
    fn from_value_tags_declared_position() {
        let union = Mixed::from_value::<String, _>("hello".to_string());

        assert_eq!(union.which, Some(Active::Variant(1)));
        assert_eq!(union.stored_type(), Some(VariantType::of::<String>()));
        assert!(!union.data().is_null());
    }

    #[test]
    fn typed_ptr_matches_identity_only() {
        let union = Mixed::from_value::<u8, _>(9);

        assert!(union.holds::<u8>());
        assert!(!union.holds::<String>());
        assert!(!union.holds::<i8>());
        assert!(union.typed_ptr::<u8>().is_some());
        assert!(union.typed_ptr::<String>().is_none());
    }

    #[test]
    fn duplicate_types_match_by_identity() {
        type Twice = TaggedUnion<(u8, u8)>;

        let union = Twice::from_value::<u8, There<Here>>(4);

        assert_eq!(union.which, Some(Active::Variant(1)));
        assert!(union.holds::<u8>());
        assert!(union.is_consistent());
    }

    #[test]
    fn self_pointer_is_not_a_declared_type() {
        let target = IntDouble::new();
        let union = IntDouble::from_self_pointer(&raw const target);

        assert!(union.storing_pointer_to_self());
        assert_eq!(
            union.stored_type(),
            Some(VariantType::of::<*const IntDouble>())
        );
        assert!(union.is_consistent());
        assert_eq!(union.self_pointer::<*mut IntDouble>(), None);
    }

    #[test]
    fn inconsistent_tags_are_detected() {
        let mut union = IntDouble::new();

        union.which = Some(Active::Variant(2));
        assert!(!union.is_consistent());

        union.which = Some(Active::SelfPointer(VariantType::of::<f64>()));
        assert!(!union.is_consistent());

        union.which = None;
    }

    #[test]
    fn clear_drops_value_once() {
        let drops = Rc::new(Cell::new(0));
        let mut union = TaggedUnion::<(Tracked,)>::from_value::<Tracked, _>(Tracked {
            drops: Rc::clone(&drops),
        });

        union.clear();
        assert_eq!(drops.get(), 1);
        assert!(union.is_empty());

        drop(union);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn take_leaves_union_empty() {
        let mut union = Mixed::from_value::<Vec<u32>, _>(vec![1, 2]);

        assert_eq!(union.take::<String, _>(), None);
        assert_eq!(union.take::<Vec<u32>, _>(), Some(vec![1, 2]));
        assert!(union.is_empty());
    }

    #[test]
    fn clone_of_self_pointer_copies_address() {
        let target = IntDouble::from_value::<i32, _>(1);
        let union = IntDouble::from_self_pointer(&raw const target);

        let cloned = union.clone();

        assert_eq!(cloned.self_pointer::<*const IntDouble>(), Some(&raw const target));
    }

    #[test]
    fn clone_from_same_type_keeps_tag() {
        let mut destination = Mixed::from_value::<String, _>("old".to_string());
        let source = Mixed::from_value::<String, _>("new".to_string());

        destination.clone_from(&source);

        assert_eq!(destination.which, Some(Active::Variant(1)));
        assert_eq!(destination.get::<String, _>().map(String::as_str), Some("new"));
    }

    #[test]
    fn clone_from_value_onto_pointer() {
        let target = Mixed::new();
        let mut destination = Mixed::from_self_pointer(&raw const target);
        let source = Mixed::from_value::<u8, _>(3);

        destination.clone_from(&source);

        assert!(!destination.storing_pointer_to_self());
        assert_eq!(destination.get::<u8, _>(), Some(&3));
    }

    #[test]
    fn clone_from_pointer_onto_value_drops_value() {
        type Holder = TaggedUnion<(Tracked,)>;

        let drops = Rc::new(Cell::new(0));

        let mut destination = Holder::from_value::<Tracked, _>(Tracked {
            drops: Rc::clone(&drops),
        });
        let target = Holder::new();
        let source = Holder::from_self_pointer(&raw const target);

        destination.clone_from(&source);

        assert_eq!(drops.get(), 1);
        assert_eq!(
            destination.self_pointer::<*const Holder>(),
            Some(&raw const target)
        );
    }

    #[test]
    fn clear_with_panicking_destructor_leaves_union_empty() {
        struct PanicsOnDrop;

        impl Drop for PanicsOnDrop {
            fn drop(&mut self) {
                panic!("destructor failure");
            }
        }

        let mut union = TaggedUnion::<(PanicsOnDrop,)>::from_value::<PanicsOnDrop, _>(PanicsOnDrop);

        let result = panic::catch_unwind(AssertUnwindSafe(|| union.clear()));

        assert!(result.is_err());
        assert!(union.is_empty());
    }

    #[test]
    fn debug_shows_stored_type() {
        let union = IntDouble::from_value::<i32, _>(1);

        let debug = format!("{union:?}");

        assert!(debug.contains("TaggedUnion"));
        assert!(debug.contains("i32"));
        assert!(debug.contains("storing_pointer_to_self: false"));
    }
}
