use crate::{CloneVTable, UnionAt, UnionList, VariantType, VariantVTable};

/// A closed list of types that a [`TaggedUnion`][crate::TaggedUnion] can hold, written as a
/// tuple: `()`, `(A,)`, `(A, B)` and so on, up to twelve types.
///
/// The list may repeat a type. Repeats share one identity, so the first occurrence wins when
/// a stored value is matched by type.
///
/// # Safety
///
/// The tables and the overlay must describe the same types in the same order. This trait is
/// implemented by this crate for tuples and is not meant to be implemented elsewhere.
pub unsafe trait VariantList: 'static {
    /// Number of declared types, repeats included.
    const LEN: usize;

    /// The untracked union of the declared types, used as storage.
    type Overlay: UnionList;

    /// The array returned by [`variant_types()`][Self::variant_types].
    type Types: AsRef<[VariantType]>;

    /// Per-type operations, in declaration order.
    const DISPATCH: &'static [VariantVTable];

    /// Returns the ordered list of declared types, repeats included.
    fn variant_types() -> Self::Types;

    /// Identity of the declared type at `index`, or `None` if `index` is out of range.
    #[must_use]
    #[inline]
    fn variant_type_at(index: usize) -> Option<VariantType> {
        Self::DISPATCH.get(index).map(VariantVTable::variant_type)
    }

    /// Position of the first declared type equal to `ty`, or `None` if it is not declared.
    #[must_use]
    #[inline]
    fn position_of(ty: VariantType) -> Option<usize> {
        Self::DISPATCH
            .iter()
            .position(|entry| entry.variant_type() == ty)
    }
}

/// A [`VariantList`] whose types are all [`Clone`], which makes the union itself `Clone`.
///
/// # Safety
///
/// The clone table must describe the same types in the same order as
/// [`VariantList::DISPATCH`].
pub unsafe trait CloneVariants: VariantList {
    /// Per-type clone operations, in declaration order.
    const CLONE_DISPATCH: &'static [CloneVTable];
}

/// The declared type at `INDEX` of the list `L`.
///
/// # Example
///
/// ```rust
/// use variant_unions::VariantElement;
///
/// let value: VariantElement<(u8, String), 1> = "second".to_string();
/// assert_eq!(value, "second");
/// ```
pub type VariantElement<L, const INDEX: usize> =
    <<L as VariantList>::Overlay as UnionAt<INDEX>>::Output;

macro_rules! impl_variant_list {
    ($($len:literal => ($($ty:ident),*);)*) => {
        $(
            // SAFETY: The overlay and both tables list the tuple's types in tuple order.
            unsafe impl<$($ty: 'static),*> VariantList for ($($ty,)*) {
                const LEN: usize = $len;

                type Overlay = $crate::super_union!($($ty),*);

                type Types = [VariantType; $len];

                const DISPATCH: &'static [VariantVTable] = &[$(VariantVTable::of::<$ty>()),*];

                #[inline]
                fn variant_types() -> Self::Types {
                    [$(VariantType::of::<$ty>()),*]
                }
            }

            // SAFETY: The clone table lists the tuple's types in tuple order.
            unsafe impl<$($ty: Clone + 'static),*> CloneVariants for ($($ty,)*) {
                const CLONE_DISPATCH: &'static [CloneVTable] = &[$(CloneVTable::of::<$ty>()),*];
            }
        )*
    };
}

impl_variant_list! {
    0 => ();
    1 => (T0);
    2 => (T0, T1);
    3 => (T0, T1, T2);
    4 => (T0, T1, T2, T3);
    5 => (T0, T1, T2, T3, T4);
    6 => (T0, T1, T2, T3, T4, T5);
    7 => (T0, T1, T2, T3, T4, T5, T6);
    8 => (T0, T1, T2, T3, T4, T5, T6, T7);
    9 => (T0, T1, T2, T3, T4, T5, T6, T7, T8);
    10 => (T0, T1, T2, T3, T4, T5, T6, T7, T8, T9);
    11 => (T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
    12 => (T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
}
