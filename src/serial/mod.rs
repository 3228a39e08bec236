//! Serialization.
//!
//! Turns a canonicalized `Document` back into text.

pub mod xml;

pub use xml::serialize;
