//! Core data structures shared across the parlance front end.
//!
//! - `interner` - string interning (`Symbol`, `Interner`)
//! - `fold` - case folding for case-insensitive message parts
//! - `utils` - small text helpers used by dumps and banners

pub mod fold;
pub mod interner;
pub mod utils;

#[cfg(test)]
mod interner_tests;
#[cfg(test)]
mod utils_tests;

pub use fold::{fold_case, is_lower_case};
pub use interner::{Interner, Symbol};
pub use utils::{ordinal, truncate_text};
