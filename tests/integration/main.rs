//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one area of the core
//! against the mock subsystems.  All tests run on the host.

mod dispatch_tests;
mod lifecycle_tests;
