//! Message adapters in the shape emitted by the schema compiler, plus thin
//! helpers on top of them.

pub mod daemon;
