//! Clip paths reduced to plain geometry before output generation.

pub mod resolver;

pub use resolver::{
    ClipChain, ClipOutcome, follow_chain, map_children, resolve, resolve_chain, resolve_reference,
};
