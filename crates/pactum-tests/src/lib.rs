//! Compile-and-run coverage for generated code.
//!
//! `build.rs` generates services and controllers for a pair of fixture
//! contracts into `OUT_DIR`; they are mounted here as `crate::generated` and
//! exercised by the tests under `test`.

include!(concat!(env!("OUT_DIR"), "/generated.rs"));
