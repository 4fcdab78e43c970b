//! Shared test utilities for idportal integration tests.
//!
//! - `TestHarness`: a portal over an in-memory database and a temp document
//!   directory
//! - builders for submission forms and stored records

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
