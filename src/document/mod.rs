//! Host document: markup in, live entities and a view tree out.

#[allow(clippy::module_inception)]
pub mod document;
pub mod markup;

pub use document::{Document, DocumentSnapshot};
pub use markup::MarkupNode;
