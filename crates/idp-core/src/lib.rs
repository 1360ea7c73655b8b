//! # idp-core
//!
//! Foundational types shared by every IdP simulator crate.
//!
//! The protocol crates each define their own error enums, but all of them
//! classify into the single [`ErrorKind`] taxonomy defined here so that the
//! HTTP surface can render them uniformly (an HTML page for browser flows, a
//! JSON body for API flows).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod messages;

pub use error::{Classify, Error, ErrorKind, Result};
