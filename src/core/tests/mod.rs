//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Type tests (RiskLevel ordering, CapabilityFlags, CommandIdentity)
//! - Command name validation tests

#[cfg(test)]
mod types_tests;
