//! # Core Module
//!
//! Stateless domain model for micromagnetics: attribute and parameter value
//! types, energy and dynamics terms with their containers, the composed
//! [`System`](models::system::System), the magnetization
//! [`Field`](models::field::Field), and OVF file I/O.
//!
//! Everything in this layer is a value: terms and containers are immutable
//! once constructed and every algebraic operation returns a new instance.
//! No physics is computed here — terms expose their physics entry points
//! only to refuse them, leaving field and energy evaluation to an external
//! calculator driven by the [`engine`](crate::engine) layer.

pub mod attrs;
pub mod error;
pub mod io;
pub mod models;
pub mod terms;
