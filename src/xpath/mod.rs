//! XPath Support for XML Schema
//!
//! Only the restricted XPath subset of identity-constraint selectors and
//! fields is supported; assertions are out of reach of this crate.

mod selectors;

pub use selectors::{IdentityPath, LocationPath, NameTest};
