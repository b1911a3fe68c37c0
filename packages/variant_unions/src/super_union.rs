use std::fmt;
use std::marker::PhantomData;
use std::mem::{ManuallyDrop, MaybeUninit};
use std::ptr;

use crate::VariantType;

/// An untracked union whose members are named by type instead of by field name.
///
/// `SuperUnion<Head, Rest>` directly contains a `Head` and nests the remaining members in
/// `Rest`, which is either another `SuperUnion` or [`EmptyUnion`]. All members share the same
/// memory, so the union is as large as its largest member. The [`super_union!`][crate::super_union]
/// macro spells out the nested type from a flat list:
///
/// ```rust
/// use variant_unions::{EmptyUnion, SuperUnion, super_union};
///
/// type IntDouble = super_union![i32, f64];
/// type Spelled = SuperUnion<i32, SuperUnion<f64, EmptyUnion>>;
///
/// let _same: Spelled = IntDouble::new::<i32, _>(-2);
/// ```
///
/// # No tracking
///
/// The union keeps no record of which member was last written. The caller alone is
/// responsible for reading back the member that is live, which is why the typed reads are
/// `unsafe`. Members are never dropped by the union. If you need the union to remember the
/// active member and manage its lifetime, use [`TaggedUnion`][crate::TaggedUnion].
///
/// # Example
///
/// ```rust
/// use variant_unions::super_union;
///
/// let mut number = <super_union![i32, f64]>::new::<f64, _>(3.75);
///
/// // SAFETY: We just stored an f64.
/// assert_eq!(unsafe { *number.get::<f64, _>() }, 3.75);
///
/// number.set::<i32, _>(-2);
///
/// // SAFETY: The last write stored an i32.
/// assert_eq!(unsafe { *number.get_at::<0>() }, -2);
/// ```
///
/// Asking for a type that is not a member is rejected at build time:
///
/// ```rust,compile_fail
/// use variant_unions::super_union;
///
/// let number = <super_union![i32, f64]>::new::<i32, _>(1);
///
/// // SAFETY: Never compiles.
/// let _ = unsafe { number.get::<i16, _>() };
/// ```
///
/// So is an index past the last member:
///
/// ```rust,compile_fail
/// use variant_unions::super_union;
///
/// let number = <super_union![i32, f64]>::new::<i32, _>(1);
///
/// // SAFETY: Never compiles.
/// let _ = unsafe { number.get_at::<2>() };
/// ```
#[repr(C)]
pub union SuperUnion<Head, Rest> {
    /// The first member, stored directly.
    pub head: ManuallyDrop<Head>,

    /// The remaining members.
    pub rest: ManuallyDrop<Rest>,
}

/// The union of no types. It has no storage and no members.
///
/// This is the innermost `rest` of every [`SuperUnion`], so it can be named and built
/// directly when initializing a union field by field.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[allow(
    clippy::exhaustive_structs,
    reason = "unit terminator of the member list, built directly by callers"
)]
pub struct EmptyUnion;

/// Marks the first member of a [`SuperUnion`] in [`Contains`] lookups.
#[derive(Debug)]
#[allow(clippy::exhaustive_enums, reason = "uninhabited marker type, never matched on")]
pub enum Here {}

/// Marks a member found in the nested remainder of a [`SuperUnion`] in [`Contains`] lookups.
#[derive(Debug)]
pub struct There<I>(PhantomData<I>);

/// Implemented by the untracked union types, describing their member list.
pub trait UnionList: Sized {
    /// Number of member types, repeats included.
    const LEN: usize;

    /// Returns the ordered list of member types, repeats included.
    ///
    /// The list is built by walking the nested members, so its length is only known as the
    /// sum of the nested `LEN` constants. Stable Rust cannot size an array with that sum,
    /// which is why this returns a `Vec`. [`VariantList::variant_types()`] returns an array
    /// because the flat tuple impls know their length as a literal.
    ///
    /// [`VariantList::variant_types()`]: crate::VariantList::variant_types
    fn variant_types() -> Vec<VariantType>;
}

/// Proof that a union has a member of type `T`.
///
/// `I` is a position marker ([`Here`] or [`There`]) that the compiler infers, so callers write
/// `_` for it. If `T` appears in the list more than once the marker is ambiguous and must be
/// given explicitly.
///
/// A type that is not a member has no implementation, so using it is a build-time error.
pub trait Contains<T, I> {
    /// Zero-based position of the member in the type list.
    const INDEX: usize;
}

/// Resolves a zero-based member index to the member type.
///
/// Implemented for the first twelve positions of every union that is long enough. An index
/// past the end has no implementation, so using it is a build-time error.
pub trait UnionAt<const INDEX: usize> {
    /// The member type at `INDEX`.
    type Output;
}

impl UnionList for EmptyUnion {
    const LEN: usize = 0;

    #[inline]
    fn variant_types() -> Vec<VariantType> {
        Vec::new()
    }
}

impl<Head: 'static, Rest: UnionList> UnionList for SuperUnion<Head, Rest> {
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "a type list cannot be longer than usize::MAX"
    )]
    const LEN: usize = Rest::LEN + 1;

    fn variant_types() -> Vec<VariantType> {
        let mut types = Vec::with_capacity(Self::LEN);
        types.push(VariantType::of::<Head>());
        types.extend(Rest::variant_types());
        types
    }
}

impl<Head, Rest> Contains<Head, Here> for SuperUnion<Head, Rest> {
    const INDEX: usize = 0;
}

impl<Head, Rest, T, I> Contains<T, There<I>> for SuperUnion<Head, Rest>
where
    Rest: Contains<T, I>,
{
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "a type list cannot be longer than usize::MAX"
    )]
    const INDEX: usize = Rest::INDEX + 1;
}

/// Spells out the nested union type for a position, e.g. `[A, B] R` becomes
/// `SuperUnion<A, SuperUnion<B, R>>`.
macro_rules! nested_union {
    ([] $rest:ty) => { $rest };
    ([$head:ident $(, $tail:ident)*] $rest:ty) => {
        SuperUnion<$head, nested_union!([$($tail),*] $rest)>
    };
}

macro_rules! impl_union_at {
    ($($index:literal => [$($before:ident),*] $target:ident;)*) => {
        $(
            impl<$($before,)* $target, Rest> UnionAt<$index>
                for nested_union!([$($before,)* $target] Rest)
            {
                type Output = $target;
            }
        )*
    };
}

impl_union_at! {
    0 => [] T0;
    1 => [T0] T1;
    2 => [T0, T1] T2;
    3 => [T0, T1, T2] T3;
    4 => [T0, T1, T2, T3] T4;
    5 => [T0, T1, T2, T3, T4] T5;
    6 => [T0, T1, T2, T3, T4, T5] T6;
    7 => [T0, T1, T2, T3, T4, T5, T6] T7;
    8 => [T0, T1, T2, T3, T4, T5, T6, T7] T8;
    9 => [T0, T1, T2, T3, T4, T5, T6, T7, T8] T9;
    10 => [T0, T1, T2, T3, T4, T5, T6, T7, T8, T9] T10;
    11 => [T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10] T11;
}

impl<Head, Rest> SuperUnion<Head, Rest> {
    /// Creates a union with the member of type `T` holding `value`.
    ///
    /// The bytes not covered by `T` stay uninitialized.
    #[must_use]
    #[inline]
    pub fn new<T, I>(value: T) -> Self
    where
        Self: Contains<T, I>,
    {
        let mut overlay = MaybeUninit::<Self>::uninit();

        // SAFETY: Every member of a `#[repr(C)]` union starts at offset zero and the union is
        // at least as large and as aligned as each member, so the write stays in bounds.
        unsafe {
            overlay.as_mut_ptr().cast::<T>().write(value);
        }

        // SAFETY: A union places no validity requirements on bytes outside the written member.
        unsafe { overlay.assume_init() }
    }

    /// Returns the ordered list of member types.
    ///
    /// Unlike [`TaggedUnion::variant_types()`][crate::TaggedUnion::variant_types], this
    /// allocates: see [`UnionList::variant_types()`] for why. The two lists hold the same
    /// types in the same order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use variant_unions::{VariantType, super_union};
    ///
    /// assert_eq!(
    ///     <super_union![i32, f64]>::variant_types(),
    ///     vec![VariantType::of::<i32>(), VariantType::of::<f64>()]
    /// );
    /// ```
    #[must_use]
    #[inline]
    pub fn variant_types() -> Vec<VariantType>
    where
        Self: UnionList,
    {
        <Self as UnionList>::variant_types()
    }

    /// Overwrites the union with a value of the member type `T`.
    ///
    /// Whatever the union held before is not dropped.
    #[inline]
    pub fn set<T, I>(&mut self, value: T)
    where
        Self: Contains<T, I>,
    {
        // SAFETY: Members of a `#[repr(C)]` union start at offset zero and fit in the union.
        // The old contents are overwritten without being read or dropped.
        unsafe {
            ptr::from_mut(self).cast::<T>().write(value);
        }
    }

    /// Overwrites the union with a value of the member type at `INDEX`.
    ///
    /// Whatever the union held before is not dropped.
    #[inline]
    pub fn set_at<const INDEX: usize>(&mut self, value: <Self as UnionAt<INDEX>>::Output)
    where
        Self: UnionAt<INDEX>,
    {
        // SAFETY: Members of a `#[repr(C)]` union start at offset zero and fit in the union.
        // The old contents are overwritten without being read or dropped.
        unsafe {
            ptr::from_mut(self)
                .cast::<<Self as UnionAt<INDEX>>::Output>()
                .write(value);
        }
    }

    /// Reads the member of type `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the last value written to the union was a valid `T`.
    #[must_use]
    #[inline]
    pub unsafe fn get<T, I>(&self) -> &T
    where
        Self: Contains<T, I>,
    {
        // SAFETY: Forwarding the caller's guarantee that a `T` lives at offset zero.
        unsafe { &*ptr::from_ref(self).cast::<T>() }
    }

    /// Reads the member of type `T` for modification.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the last value written to the union was a valid `T`.
    #[must_use]
    #[inline]
    pub unsafe fn get_mut<T, I>(&mut self) -> &mut T
    where
        Self: Contains<T, I>,
    {
        // SAFETY: Forwarding the caller's guarantee that a `T` lives at offset zero.
        unsafe { &mut *ptr::from_mut(self).cast::<T>() }
    }

    /// Moves the member of type `T` out of the union.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the last value written to the union was a valid `T`.
    #[must_use]
    #[inline]
    pub unsafe fn into_value<T, I>(self) -> T
    where
        Self: Contains<T, I>,
    {
        let this = ManuallyDrop::new(self);

        // SAFETY: Forwarding the caller's guarantee that a `T` lives at offset zero. The union
        // itself is forgotten, so the value is moved out exactly once.
        unsafe { ptr::from_ref(&*this).cast::<T>().read() }
    }

    /// Reads the member at `INDEX`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the last value written to the union was a valid value of
    /// the member type at `INDEX`.
    #[must_use]
    #[inline]
    pub unsafe fn get_at<const INDEX: usize>(&self) -> &<Self as UnionAt<INDEX>>::Output
    where
        Self: UnionAt<INDEX>,
    {
        // SAFETY: Forwarding the caller's guarantee about the member at offset zero.
        unsafe { &*ptr::from_ref(self).cast::<<Self as UnionAt<INDEX>>::Output>() }
    }

    /// Reads the member at `INDEX` for modification.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the last value written to the union was a valid value of
    /// the member type at `INDEX`.
    #[must_use]
    #[inline]
    pub unsafe fn get_at_mut<const INDEX: usize>(
        &mut self,
    ) -> &mut <Self as UnionAt<INDEX>>::Output
    where
        Self: UnionAt<INDEX>,
    {
        // SAFETY: Forwarding the caller's guarantee about the member at offset zero.
        unsafe { &mut *ptr::from_mut(self).cast::<<Self as UnionAt<INDEX>>::Output>() }
    }

    /// Moves the member at `INDEX` out of the union.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the last value written to the union was a valid value of
    /// the member type at `INDEX`.
    #[must_use]
    #[inline]
    pub unsafe fn into_value_at<const INDEX: usize>(self) -> <Self as UnionAt<INDEX>>::Output
    where
        Self: UnionAt<INDEX>,
    {
        let this = ManuallyDrop::new(self);

        // SAFETY: Forwarding the caller's guarantee about the member at offset zero. The union
        // itself is forgotten, so the value is moved out exactly once.
        unsafe {
            ptr::from_ref(&*this)
                .cast::<<Self as UnionAt<INDEX>>::Output>()
                .read()
        }
    }
}

impl EmptyUnion {
    /// Returns the ordered list of member types, which is always empty.
    #[must_use]
    #[inline]
    pub fn variant_types() -> Vec<VariantType> {
        <Self as UnionList>::variant_types()
    }
}

impl<Head: Copy, Rest: Copy> Clone for SuperUnion<Head, Rest> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<Head: Copy, Rest: Copy> Copy for SuperUnion<Head, Rest> {}

impl<Head, Rest> fmt::Debug for SuperUnion<Head, Rest> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperUnion").finish_non_exhaustive()
    }
}

/// Names the nested [`SuperUnion`] type for a flat list of member types.
///
/// `super_union![]` is [`EmptyUnion`].
///
/// # Example
///
/// ```rust
/// use std::mem::size_of;
///
/// use variant_unions::super_union;
///
/// type Bytes = super_union![u8, [u8; 12], u32];
///
/// assert_eq!(size_of::<Bytes>(), 12);
/// assert_eq!(size_of::<super_union![]>(), 0);
/// ```
#[macro_export]
macro_rules! super_union {
    () => { $crate::EmptyUnion };
    ($head:ty $(, $tail:ty)*) => {
        $crate::SuperUnion<$head, $crate::super_union!($($tail),*)>
    };
}
