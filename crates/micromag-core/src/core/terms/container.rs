use super::Term;
use crate::core::error::ModelError;
use std::fmt;
use std::ops::{Add, Sub};

/// An ordered collection of same-family terms with unique names.
///
/// The container is the result of summing terms: `Energy` and `Dynamics` are
/// aliases of this type over their term family. Member names are the lookup
/// key ([`contains`](Container::contains), [`get`](Container::get)); term
/// *kind* equality plays no role in addressing, which is what allows two
/// terms of the same kind to coexist under different names.
///
/// All operations are pure: `with`, `merged`, `without` and `difference`
/// return a new container, so terms and containers can be reused across
/// systems as prototypes.
#[derive(Debug, Clone)]
pub struct Container<T> {
    terms: Vec<T>,
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Self { terms: Vec::new() }
    }
}

impl<T: Term> Container<T> {
    /// The empty container, the additive identity.
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub(crate) fn singleton(term: T) -> Self {
        Self { terms: vec![term] }
    }

    /// Builds a container by folding in `terms` one by one, re-checking name
    /// uniqueness at every insertion.
    ///
    /// # Errors
    ///
    /// Returns an error if two terms share a name.
    pub fn from_terms(terms: impl IntoIterator<Item = T>) -> Result<Self, ModelError> {
        let mut result = Self::new();
        for term in terms {
            result = result.with(term)?;
        }
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates over member terms in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.terms.iter()
    }

    /// Whether a member with the same *name* as `term` exists. This is
    /// name-based lookup, distinct from kind-based term equality.
    pub fn contains(&self, term: &T) -> bool {
        self.contains_name(&term.name())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.terms.iter().any(|t| t.name() == name)
    }

    /// The member with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NoSuchTerm`] if no member has that name.
    pub fn get(&self, name: &str) -> Result<&T, ModelError> {
        self.terms
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ModelError::NoSuchTerm {
                name: name.to_string(),
                container: T::FAMILY,
            })
    }

    /// A new container with `term` appended.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateTerm`] if a member with the same name
    /// already exists.
    pub fn with(&self, term: T) -> Result<Self, ModelError> {
        let name = term.name();
        if self.contains_name(&name) {
            return Err(ModelError::DuplicateTerm {
                kind: term.kind(),
                name,
                container: T::FAMILY,
            });
        }
        let mut terms = self.terms.clone();
        terms.push(term);
        Ok(Self { terms })
    }

    /// A new container holding this container's terms followed by `other`'s,
    /// each insertion re-checked; a name collision anywhere fails the whole
    /// merge.
    pub fn merged(&self, other: &Self) -> Result<Self, ModelError> {
        let mut result = self.clone();
        for term in other.iter() {
            result = result.with(term.clone())?;
        }
        Ok(result)
    }

    /// A new container with the member named like `term` removed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TermNotFound`] if no member has that name.
    pub fn without(&self, term: &T) -> Result<Self, ModelError> {
        self.without_name(&term.name())
    }

    pub fn without_name(&self, name: &str) -> Result<Self, ModelError> {
        let index = self
            .terms
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| ModelError::TermNotFound {
                name: name.to_string(),
                container: T::FAMILY,
            })?;
        let mut terms = self.terms.clone();
        terms.remove(index);
        Ok(Self { terms })
    }

    /// A new container with every member of `other` removed.
    pub fn difference(&self, other: &Self) -> Result<Self, ModelError> {
        let mut result = self.clone();
        for term in other.iter() {
            result = result.without(term)?;
        }
        Ok(result)
    }

    /// Aggregate LaTeX expression: member expressions joined, with a `+`
    /// inserted only before terms that do not already carry a leading sign.
    /// The empty container renders as `0`.
    pub fn latex(&self) -> String {
        if self.terms.is_empty() {
            return "0".to_string();
        }
        let mut result = String::new();
        for term in &self.terms {
            let expression = term.latex();
            if !result.is_empty() && !expression.starts_with('-') {
                result.push_str(" + ");
            } else if !result.is_empty() {
                result.push(' ');
            }
            result.push_str(&expression);
        }
        result
    }
}

/// Containers of one family are equal iff they have the same length and every
/// member of one has a name-equal counterpart in the other; order does not
/// matter.
impl<T: Term> PartialEq for Container<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.terms.iter().all(|t| other.contains_name(&t.name()))
    }
}

impl<T: Term> fmt::Display for Container<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a Container<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl<T> IntoIterator for Container<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.into_iter()
    }
}

impl<T: Term, R: Into<T>> Add<R> for Container<T> {
    type Output = Result<Container<T>, ModelError>;

    fn add(self, rhs: R) -> Self::Output {
        self.with(rhs.into())
    }
}

impl<T: Term, R: Into<T>> Sub<R> for Container<T> {
    type Output = Result<Container<T>, ModelError>;

    fn sub(self, rhs: R) -> Self::Output {
        self.without(&rhs.into())
    }
}
