//! Utility types and functions for the bobo-rs framework.
//!
//! This module provides:
//! - [`MultiValueDict`]: An insertion-ordered dictionary that can hold multiple values per key.
//! - [`html`]: HTML escaping for text embedded in generated pages.

pub mod html;
mod multi_value_dict;

pub use multi_value_dict::MultiValueDict;
