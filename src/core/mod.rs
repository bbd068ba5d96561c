//! Core logic: payload codec, sampling loop, scan session and generation

pub mod codec;
pub mod error;
pub mod generator;
pub mod sampler;
pub mod session;
pub mod types;
