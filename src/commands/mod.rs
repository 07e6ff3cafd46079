//! Command implementations for the CLI
//!
//! - start: Start the quote server
//! - test: Test configuration validity
//! - calc: Price a quote file offline
//! - rates: Import or show the rate factor table

pub mod calc;
pub mod rates;
pub mod start;
pub mod test;
