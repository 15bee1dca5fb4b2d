//! Titulin: YouTube title harvesting and evergreen classification

pub mod import;
pub mod vector;

pub use vector::{Classification, LabelledEmbedding, SimilarTitle};
