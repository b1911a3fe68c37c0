use std::any::{self, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a type that a union can store.
///
/// Two `VariantType` values compare equal if and only if they describe the same type. The
/// type name is carried along for diagnostics only and takes no part in comparisons, so a
/// `VariantType` can be used as a map key.
///
/// # Example
///
/// ```rust
/// use variant_unions::VariantType;
///
/// assert_eq!(VariantType::of::<u32>(), VariantType::of::<u32>());
/// assert_ne!(VariantType::of::<u32>(), VariantType::of::<i32>());
/// assert_eq!(VariantType::of::<u32>().name(), "u32");
/// ```
#[derive(Clone, Copy)]
pub struct VariantType {
    id: TypeId,
    name: &'static str,
}

impl VariantType {
    /// Returns the identity of `T`.
    #[must_use]
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// The [`TypeId`] of the described type.
    #[must_use]
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The name of the described type, as given by [`std::any::type_name`].
    ///
    /// The exact contents are not guaranteed to be stable between compiler versions.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for VariantType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VariantType {}

impl PartialOrd for VariantType {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VariantType {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for VariantType {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VariantType").field(&self.name).finish()
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashMap;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(VariantType: Send, Sync, Copy, Eq, Ord, Hash);

    #[test]
    fn same_type_compares_equal() {
        assert_eq!(VariantType::of::<String>(), VariantType::of::<String>());
        assert_eq!(
            VariantType::of::<String>().cmp(&VariantType::of::<String>()),
            Ordering::Equal
        );
    }

    #[test]
    fn distinct_types_compare_unequal() {
        assert_ne!(VariantType::of::<u8>(), VariantType::of::<i8>());
        assert_ne!(VariantType::of::<*const u8>(), VariantType::of::<*mut u8>());
    }

    #[test]
    fn usable_as_map_key() {
        let mut names = HashMap::new();
        names.insert(VariantType::of::<u64>(), "unsigned");
        names.insert(VariantType::of::<i64>(), "signed");

        assert_eq!(names.get(&VariantType::of::<u64>()), Some(&"unsigned"));
        assert_eq!(names.get(&VariantType::of::<i64>()), Some(&"signed"));
        assert_eq!(names.get(&VariantType::of::<f64>()), None);
    }

    #[test]
    fn display_shows_type_name() {
        assert_eq!(VariantType::of::<bool>().to_string(), "bool");
        assert_eq!(format!("{:?}", VariantType::of::<bool>()), "VariantType(\"bool\")");
    }
}
