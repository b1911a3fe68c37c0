#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Unions whose members are named by a list of types.
//!
//! This crate provides two containers that store one value at a time in a buffer shared by a
//! closed list of types:
//!
//! * [`SuperUnion`] is an untracked overlay. It does not remember which member is active, so
//!   reading a member is `unsafe` and dropping the active member is the caller's job. Build one
//!   with the [`super_union!`] macro.
//! * [`TaggedUnion`] remembers which type is active. It drops and clones its value on its own,
//!   refuses typed access under the wrong type and can additionally hold a raw pointer to a
//!   union of its own type.
//!
//! Type lists are tuples of up to twelve types. Members are named either by type, with a
//! position marker that the compiler infers, or by index. Naming a type that is not in the list,
//! or an index past its end, is a build error.
//!
//! # Example
//!
//! ```rust
//! use variant_unions::{TaggedUnion, VariantType};
//!
//! type Number = TaggedUnion<(i32, f64)>;
//!
//! let mut number = Number::from_value::<i32, _>(2);
//! let copy = number.clone();
//!
//! number.set::<f64, _>(0.25);
//!
//! assert_eq!(copy.get::<i32, _>(), Some(&2));
//! assert_eq!(number.get_at::<1>(), Some(&0.25));
//! assert_eq!(number.stored_type(), Some(VariantType::of::<f64>()));
//!
//! number.clear();
//! assert!(number.is_empty());
//! ```
//!
//! # Overlay unions
//!
//! ```rust
//! use variant_unions::super_union;
//!
//! let mut overlay = <super_union![u32, [u8; 4]]>::new::<u32, _>(0x0102_0304);
//!
//! // SAFETY: The u32 member is the one most recently written.
//! assert_eq!(unsafe { *overlay.get::<u32, _>() }, 0x0102_0304);
//!
//! overlay.set_at::<1>([9, 9, 9, 9]);
//!
//! // SAFETY: Every bit pattern is a valid u32.
//! assert_eq!(unsafe { *overlay.get_at::<0>() }, 0x0909_0909);
//! ```
//!
//! # Logging
//!
//! The crate emits records through the [`log`](https://docs.rs/log) facade and never installs a
//! logger. A `warn` record is emitted when a destructor panic is discarded during cross-type
//! assignment.

mod access;
mod error;
mod self_pointer;
mod super_union;
mod tagged_union;
mod variant_list;
mod variant_type;
mod visit;

pub use error::Error;
pub use self_pointer::*;
pub use super_union::*;
pub use tagged_union::*;
pub use variant_list::*;
pub use variant_type::*;
pub use visit::{CloneVTable, VariantVTable};
pub(crate) use visit::Dropper;

trait Sealed {}
