//! Filesystem primitives

pub mod copy;
pub mod dir;
pub mod file;
