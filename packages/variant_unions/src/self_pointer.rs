use crate::{Sealed, TaggedUnion, VariantList};

/// Implemented by a container type and by every raw pointer type that, after removing all
/// `*const`/`*mut` layers, points at that container.
///
/// `PointsTo<TaggedUnion<L>>` holds for `TaggedUnion<L>`, `*const TaggedUnion<L>`,
/// `*mut *const TaggedUnion<L>` and so on.
///
/// This trait is sealed and cannot be implemented outside this crate.
pub trait PointsTo<Target>: Sealed {}

impl<L: VariantList> Sealed for TaggedUnion<L> {}
impl<T> Sealed for *const T {}
impl<T> Sealed for *mut T {}

impl<L: VariantList> PointsTo<TaggedUnion<L>> for TaggedUnion<L> {}

impl<Target, T: PointsTo<Target>> PointsTo<Target> for *const T {}

impl<Target, T: PointsTo<Target>> PointsTo<Target> for *mut T {}

/// A raw pointer (of any depth) to a container of type `Target`, which a
/// [`TaggedUnion`] can store even though its type list cannot name it.
///
/// The exact pointer type, including `*const`/`*mut` at each level, is part of the stored
/// identity: a union holding a `*const TaggedUnion<L>` does not hand it out as a
/// `*mut TaggedUnion<L>`.
///
/// Any other type is rejected at build time:
///
/// ```rust,compile_fail
/// use variant_unions::TaggedUnion;
///
/// let number = 5_i32;
/// let _ = TaggedUnion::<(i32,)>::from_self_pointer(&raw const number);
/// ```
///
/// This trait is sealed, so other crates cannot pass off their own types as self pointers:
///
/// ```rust,compile_fail
/// use variant_unions::{SelfPointer, TaggedUnion};
///
/// #[derive(Clone, Copy)]
/// struct Token(u32);
///
/// type Union = TaggedUnion<(Token, String)>;
///
/// impl SelfPointer<Union> for Token {}
///
/// let _ = Union::from_self_pointer(Token(7));
/// ```
pub trait SelfPointer<Target>: Sealed + Copy + 'static {}

impl<Target, T> SelfPointer<Target> for *const T where T: PointsTo<Target> + 'static {}

impl<Target, T> SelfPointer<Target> for *mut T where T: PointsTo<Target> + 'static {}
