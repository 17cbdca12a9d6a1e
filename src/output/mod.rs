// src/output/mod.rs

//! Files generated for the package build

mod substvars;

pub use substvars::{Substvars, write_substvars};
