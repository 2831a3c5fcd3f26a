//! Shared helpers for backend tests: Problem Details assertions, unique test
//! data generation, and test logging initialization.

pub mod problem_details;
pub mod test_logging;
pub mod unique_helpers;
