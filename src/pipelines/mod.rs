//! Render pipelines.
//!
//! - `basic` holds the shared pipeline builder
//! - `points` draws sampled point clouds as additive camera-facing sprites

pub mod basic;
pub mod points;
