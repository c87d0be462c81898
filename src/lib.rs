//! NextRead library exports for testing

pub mod cli;
pub mod core;
pub mod storage;

#[cfg(test)]
pub mod test_support;
