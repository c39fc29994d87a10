//! Essay Companion: a guided reflective dialogue that ends in a personal
//! narrative essay.

pub mod channels;
pub mod companion;
pub mod config;
pub mod error;
pub mod llm;
