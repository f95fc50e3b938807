//! Common types and utilities for Stratify
//!
//! This crate provides the option-market vocabulary shared by the market
//! data providers, the strategy engine and the binary.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Shared domain types (Symbol, OptionContract, OptionChain, etc.)

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
