//! Taxonomy tree: node store and tree engine

mod store;
mod taxtree;
mod traversal;
mod aggregate;

pub use store::{Node, NodeStore};
pub use taxtree::{TaxTree, ROOT_ID};
