// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! pqboot Common Library
//!
//! This crate provides the error codes, firmware image format constants and
//! small value types shared by the pqboot crates.
//!
//! # Features
//!
//! - `std`: Enable standard library support (`std::error::Error` impls)
//!
//! # Security
//!
//! Digest newtypes compare in constant time. Nothing in this crate allocates.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{Error, Result};
pub use types::*;
