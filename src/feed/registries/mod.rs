//! Registry implementations for polling package releases

pub mod npm;

pub use npm::NpmRegistry;
