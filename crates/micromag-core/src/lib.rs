//! # micromag
//!
//! A domain-modeling library for computational micromagnetics.
//!
//! The library lets a caller declaratively compose a physical model - energy
//! terms, dynamics terms, a magnetization state - and hand it to an external
//! simulation package for execution. It deliberately computes no physics
//! itself: every term exposes its physics entry points only to refuse them.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a strict dependency direction:
//!
//! - **[`core`]: The Model.** Immutable value types: terms and their
//!   containers (a constrained sum-type algebra with name-unique membership),
//!   the composed `System`, the magnetization `Field`, and OVF file I/O.
//!
//! - **[`engine`]: The Orchestration.** The drive lifecycle: working
//!   directory allocation, solver input serialization hooks, external
//!   process invocation (directly or through a batch scheduler) and
//!   provenance recording.
//!
//! [`consts`] carries the usual micromagnetic physical constants and
//! [`examples`] a prebuilt macrospin system.

pub mod consts;
pub mod core;
pub mod engine;
pub mod examples;
