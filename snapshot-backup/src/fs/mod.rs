//! Filesystem primitives for snapshot backups.

pub mod compare;
pub mod copy;
pub mod metadata;
pub mod walker;
