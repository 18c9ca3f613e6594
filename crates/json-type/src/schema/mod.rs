//! Declarative, JSON-serializable data-shape descriptions.

mod schema;

pub use schema::*;
