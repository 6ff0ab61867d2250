//! Tests for the reef-engine crate.

mod helpers;

mod write_path;
