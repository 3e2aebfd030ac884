//! Integration test crate for the cairn staking engine.
//!
//! This crate has no library code — it only contains integration
//! tests that exercise full stake/fund/schedule/claim flows across
//! the workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p cairn-integration-tests
//! ```
