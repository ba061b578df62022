#![warn(clippy::pedantic)]
pub mod ambiguity;
pub mod arena;
pub mod builder;
pub mod cancel;
pub mod copy;
pub mod dump;
pub mod errors;
pub mod nodes;
pub(crate) mod nodes_impl;

pub use nodes_impl::AmbiguityParent;
