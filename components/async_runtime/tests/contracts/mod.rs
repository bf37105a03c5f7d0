//! Contract tests for async_runtime

mod contract_test;
