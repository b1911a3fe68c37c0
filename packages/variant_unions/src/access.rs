//! Checked access to the value stored in a [`TaggedUnion`].
//!
//! Every accessor comes in a by-type form, where the type must be one of the declared types,
//! and a by-index form, where the index must be in range. Both are resolved at build time.
//! Whether the union actually holds a value of that type is checked at runtime by type
//! identity: the `Option` forms return `None` on a mismatch, the `Result` forms return
//! [`Error::BadAccess`].

use crate::error::Result;
use crate::{Contains, Error, TaggedUnion, UnionAt, VariantElement, VariantList, VariantType};

impl<L: VariantList> TaggedUnion<L> {
    /// Returns the stored value if it is of type `T`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use variant_unions::TaggedUnion;
    ///
    /// let text = TaggedUnion::<(u8, String)>::from_value::<String, _>("hi".to_string());
    ///
    /// assert_eq!(text.get::<String, _>().map(String::as_str), Some("hi"));
    /// assert_eq!(text.get::<u8, _>(), None);
    /// ```
    ///
    /// Asking for a type that is not declared does not compile:
    ///
    /// ```rust,compile_fail
    /// use variant_unions::TaggedUnion;
    ///
    /// let number = TaggedUnion::<(u8, String)>::from_value::<u8, _>(1);
    /// let _ = number.get::<u32, _>();
    /// ```
    #[must_use]
    #[inline]
    pub fn get<T, I>(&self) -> Option<&T>
    where
        L::Overlay: Contains<T, I>,
        T: 'static,
    {
        let value = self.typed_ptr::<T>()?;

        // SAFETY: typed_ptr() only returns a pointer to a live T owned by `self`, borrowed
        // for as long as `self` is.
        Some(unsafe { value.as_ref() })
    }

    /// Returns the stored value mutably if it is of type `T`.
    #[must_use]
    #[inline]
    pub fn get_mut<T, I>(&mut self) -> Option<&mut T>
    where
        L::Overlay: Contains<T, I>,
        T: 'static,
    {
        let mut value = self.typed_ptr_mut::<T>()?;

        // SAFETY: typed_ptr_mut() only returns a pointer to a live T owned by `self`, borrowed
        // mutably for as long as `self` is.
        Some(unsafe { value.as_mut() })
    }

    /// Returns the stored value if it is of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadAccess`] if the union is empty or holds anything else.
    #[inline]
    pub fn try_get<T, I>(&self) -> Result<&T>
    where
        L::Overlay: Contains<T, I>,
        T: 'static,
    {
        let stored = self.stored_type();
        self.get::<T, I>().ok_or_else(|| bad_access::<T>(stored))
    }

    /// Returns the stored value mutably if it is of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadAccess`] if the union is empty or holds anything else.
    ///
    /// # Example
    ///
    /// ```rust
    /// use variant_unions::TaggedUnion;
    ///
    /// let mut counter = TaggedUnion::<(u32, f32)>::from_value::<u32, _>(1);
    ///
    /// *counter.try_get_mut::<u32, _>().unwrap() += 1;
    ///
    /// assert_eq!(counter.get::<u32, _>(), Some(&2));
    /// assert!(counter.try_get_mut::<f32, _>().is_err());
    /// ```
    #[inline]
    pub fn try_get_mut<T, I>(&mut self) -> Result<&mut T>
    where
        L::Overlay: Contains<T, I>,
        T: 'static,
    {
        let stored = self.stored_type();
        self.get_mut::<T, I>().ok_or_else(|| bad_access::<T>(stored))
    }

    /// Moves the stored value out if it is of type `T`, consuming the union.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadAccess`] if the union is empty or holds anything else. The union
    /// and whatever it held are dropped.
    #[inline]
    pub fn into_value<T, I>(mut self) -> Result<T>
    where
        L::Overlay: Contains<T, I>,
        T: 'static,
    {
        let stored = self.stored_type();
        self.take_typed::<T>().ok_or_else(|| bad_access::<T>(stored))
    }

    /// Returns the stored value if it is of the declared type at `INDEX`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use variant_unions::TaggedUnion;
    ///
    /// let number = TaggedUnion::<(i32, f64)>::from_value::<f64, _>(0.5);
    ///
    /// assert_eq!(number.get_at::<1>(), Some(&0.5));
    /// assert_eq!(number.get_at::<0>(), None);
    /// ```
    ///
    /// An index past the end does not compile:
    ///
    /// ```rust,compile_fail
    /// use variant_unions::TaggedUnion;
    ///
    /// let number = TaggedUnion::<(i32, f64)>::from_value::<f64, _>(0.5);
    /// let _ = number.get_at::<2>();
    /// ```
    #[must_use]
    #[inline]
    pub fn get_at<const INDEX: usize>(&self) -> Option<&VariantElement<L, INDEX>>
    where
        L::Overlay: UnionAt<INDEX>,
        VariantElement<L, INDEX>: 'static,
    {
        let value = self.typed_ptr::<VariantElement<L, INDEX>>()?;

        // SAFETY: typed_ptr() only returns a pointer to a live value of the requested type
        // owned by `self`, borrowed for as long as `self` is.
        Some(unsafe { value.as_ref() })
    }

    /// Returns the stored value mutably if it is of the declared type at `INDEX`.
    #[must_use]
    #[inline]
    pub fn get_at_mut<const INDEX: usize>(&mut self) -> Option<&mut VariantElement<L, INDEX>>
    where
        L::Overlay: UnionAt<INDEX>,
        VariantElement<L, INDEX>: 'static,
    {
        let mut value = self.typed_ptr_mut::<VariantElement<L, INDEX>>()?;

        // SAFETY: typed_ptr_mut() only returns a pointer to a live value of the requested type
        // owned by `self`, borrowed mutably for as long as `self` is.
        Some(unsafe { value.as_mut() })
    }

    /// Returns the stored value if it is of the declared type at `INDEX`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadAccess`] if the union is empty or holds anything else.
    #[inline]
    pub fn try_get_at<const INDEX: usize>(&self) -> Result<&VariantElement<L, INDEX>>
    where
        L::Overlay: UnionAt<INDEX>,
        VariantElement<L, INDEX>: 'static,
    {
        let stored = self.stored_type();
        self.get_at::<INDEX>()
            .ok_or_else(|| bad_access::<VariantElement<L, INDEX>>(stored))
    }

    /// Returns the stored value mutably if it is of the declared type at `INDEX`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadAccess`] if the union is empty or holds anything else.
    #[inline]
    pub fn try_get_at_mut<const INDEX: usize>(&mut self) -> Result<&mut VariantElement<L, INDEX>>
    where
        L::Overlay: UnionAt<INDEX>,
        VariantElement<L, INDEX>: 'static,
    {
        let stored = self.stored_type();
        self.get_at_mut::<INDEX>()
            .ok_or_else(|| bad_access::<VariantElement<L, INDEX>>(stored))
    }

    /// Moves the stored value out if it is of the declared type at `INDEX`, consuming the
    /// union.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadAccess`] if the union is empty or holds anything else. The union
    /// and whatever it held are dropped.
    #[inline]
    pub fn into_value_at<const INDEX: usize>(mut self) -> Result<VariantElement<L, INDEX>>
    where
        L::Overlay: UnionAt<INDEX>,
        VariantElement<L, INDEX>: 'static,
    {
        let stored = self.stored_type();
        self.take_typed::<VariantElement<L, INDEX>>()
            .ok_or_else(|| bad_access::<VariantElement<L, INDEX>>(stored))
    }
}

fn bad_access<T: 'static>(stored: Option<VariantType>) -> Error {
    Error::BadAccess {
        requested: VariantType::of::<T>(),
        stored,
    }
}
