//! # Engine Module
//!
//! The stateful orchestration layer: everything needed to turn a composed
//! [`System`](crate::core::models::system::System) into on-disk artifacts,
//! hand it to an external simulation package, and record what happened.
//!
//! - **Drivers** ([`driver`]) - the drive/schedule lifecycle, working
//!   directory allocation and the [`ExternalDriver`](driver::ExternalDriver)
//!   trait implemented by concrete calculator adapters
//! - **Runner** ([`runner`]) - external-process invocation with structured
//!   results and observation modes
//! - **Provenance** ([`provenance`]) - the per-drive `info.json` record
//! - **Progress** ([`progress`]) - verbosity levels and progress reporting
//! - **Errors** ([`error`]) - engine-specific error types
//!
//! Every operation here is synchronous and single-threaded; a drive blocks
//! its caller until the external process exits, and successive drives of one
//! system are ordered by the caller alone.

pub mod driver;
pub mod error;
pub mod progress;
pub mod provenance;
pub mod runner;
