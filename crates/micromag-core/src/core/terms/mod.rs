//! Energy and dynamics terms and their containers.
//!
//! A term is a single named physical contribution; terms of one family
//! combine into an ordered, name-unique [`Container`](container::Container).
//! Terms and containers are immutable value objects: every algebraic
//! operation returns a new value and leaves its operands untouched.

pub mod container;
pub mod dynamics;
pub mod energy;

use crate::core::attrs::AttrValue;
use std::fmt;

/// Common surface of every term, energy or dynamics.
///
/// Equality on implementing types is kind-identity: two terms compare equal
/// exactly when they are the same concrete kind, regardless of parameter
/// values or name. The name is the container lookup key instead and defaults
/// to the lowercase kind identifier.
pub trait Term: Clone + fmt::Display {
    /// The container family this term belongs to (`"Energy"` or
    /// `"Dynamics"`).
    const FAMILY: &'static str;

    /// Concrete kind identifier, e.g. `"Exchange"`.
    fn kind(&self) -> &'static str;

    /// Lookup name: the explicit override, or the lowercase kind identifier.
    fn name(&self) -> String;

    /// The attributes that are actually set, in declared order.
    fn attributes(&self) -> Vec<(&'static str, AttrValue)>;

    /// LaTeX expression for rich display; presentation-only.
    fn latex(&self) -> String;
}

pub(crate) fn name_or_default(name: Option<&str>, kind: &'static str) -> String {
    match name {
        Some(name) => name.to_string(),
        None => kind.to_ascii_lowercase(),
    }
}
