//! Editor-facing helpers shared by the CSS scanner and the consistency engine

pub mod position;
pub mod tree_utils;
