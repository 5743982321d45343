pub mod graph;
pub mod packing;
