//! # Client Sample Library
//!
//! This library exposes the sample's configurations and lifecycle for
//! integration testing.

pub mod configs;
pub mod lifecycle;
