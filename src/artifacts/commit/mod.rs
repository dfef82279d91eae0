//! Writing new snapshots

pub mod tree_builder;
