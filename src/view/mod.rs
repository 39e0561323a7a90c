//! View-models over record tables

pub mod collection;

pub use collection::Collection;
