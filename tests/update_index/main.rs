//! update_index Test Suite
//!
//! End-to-end tests of the assertion chain over a substituted transport.
//!
//! ## Test Tier Structure
//!
//! - **Tier 1: Activation** (empty capture, negation, routing)
//! - **Tier 2: Document Expectations** (counts, attributes, closed world)
//! - **Tier 3: Upsert Protocol** (marker checks, reindex booking)
//! - **Tier 4: Transport Scoping** (restoration, nesting, strategies)
//! - **Tier 5: Usage and Configuration** (usage errors, config, panicking asserts)
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test update_index
//!
//! # Run specific tier
//! cargo test --test update_index tier2
//! ```

mod test_utils;



// Tier 3: Upsert Protocol
mod tier3_upsert;

// Tier 4: Transport Scoping
mod tier4_transport;

// Tier 5: Usage and Configuration
mod tier5_usage_config;
