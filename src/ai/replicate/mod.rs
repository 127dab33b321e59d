//! Hosted prediction API: models are run as predictions that either stream
//! server-sent events or complete with a list of output files.

pub mod client;
pub mod image;
mod sse;
pub mod text;
pub mod types;

pub use client::{ModelRef, ReplicateHttpClient};
pub use image::ReplicateImageClient;
pub use text::ReplicateTextClient;
