//! Internal helpers.

pub mod hash;
