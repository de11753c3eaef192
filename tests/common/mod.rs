//! Common test utilities for passage.

pub mod assertions;
pub mod test_data;
