use thiserror::Error;

use crate::VariantType;

/// Errors that can occur when accessing the value stored in a union.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller asked for a value of one type but the union holds a value of another type,
    /// a pointer to itself or nothing at all.
    #[error("bad access: requested a value of type `{requested}` but the union holds {}", describe(.stored.as_ref()))]
    BadAccess {
        /// The type the caller asked for.
        requested: VariantType,

        /// The type that is actually stored, if any.
        stored: Option<VariantType>,
    },
}

fn describe(stored: Option<&VariantType>) -> String {
    match stored {
        Some(stored) => format!("a value of type `{stored}`"),
        None => "no value".to_string(),
    }
}

/// A specialized `Result` type for union access, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
