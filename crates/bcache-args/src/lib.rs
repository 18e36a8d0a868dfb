//! Command-line argument model for toolchain wrappers.
//!
//! An [`ArgList`] is the ordered token list of a compiler or linker
//! invocation. Order is significant: it is hashed as-is into cache keys.

mod list;
mod split;

pub use list::{starts_with, value_after_eq, ArgList};
pub use split::split_args;
