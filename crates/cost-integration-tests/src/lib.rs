//! Integration test crate for the COST wallet.
//!
//! This crate exists solely to run integration tests that drive the wallet
//! end to end. It has no public API - all functionality is in the test modules.

#![forbid(unsafe_code)]
