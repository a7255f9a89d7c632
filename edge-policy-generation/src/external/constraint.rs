//! Constraint expressions and the pluggable languages that interpret them.

use std::fmt;

use log::trace;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::text_language::TextLanguage;
use crate::errors::ConstraintError;
use crate::policy::RequiredProperty;

/// An ordered list of constraint strings. The list as a whole is the conjunction
/// of its elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ConstraintExpression(Vec<String>);

impl ConstraintExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expressions(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for ConstraintExpression {
    fn from(expressions: Vec<String>) -> Self {
        Self(expressions)
    }
}

impl<S: Into<String>> FromIterator<S> for ConstraintExpression {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ConstraintExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A constraint language understands the syntax of constraint strings and can
/// translate them into a counter-party requirement.
pub trait ConstraintLanguage: fmt::Debug + Send + Sync {
    /// Name the language is registered under
    fn name(&self) -> &'static str;

    /// Check that every expression is well formed in this language.
    fn validate(&self, expressions: &[String]) -> Result<(), ConstraintError>;

    /// Translate the expressions into a requirement. Returns `Ok(None)` when the
    /// expressions impose no requirement.
    fn to_required_property(
        &self,
        expressions: &[String],
    ) -> Result<Option<RequiredProperty>, ConstraintError>;
}

/// The set of constraint languages available to a translator.
///
/// Languages are tried in registration order; the first one that accepts the
/// whole expression list handles it.
#[derive(Debug)]
pub struct ConstraintLanguages {
    languages: Vec<Box<dyn ConstraintLanguage>>,
}

impl ConstraintLanguages {
    /// Create a registry with no languages
    pub fn empty() -> Self {
        Self {
            languages: Vec::new(),
        }
    }

    pub fn register(&mut self, language: Box<dyn ConstraintLanguage>) {
        self.languages.push(language);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.languages.iter().map(|l| l.name()).collect()
    }

    /// Find the language that accepts the constraint expression.
    pub fn validate(
        &self,
        constraints: &ConstraintExpression,
    ) -> Result<&dyn ConstraintLanguage, ConstraintError> {
        let mut last_error = ConstraintError::NoLanguage;
        for language in &self.languages {
            match language.validate(constraints.expressions()) {
                Ok(()) => {
                    trace!("constraints {} accepted by {} language", constraints, language.name());
                    return Ok(language.as_ref());
                }
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    /// Translate the constraint expression with the language that accepts it.
    pub fn to_required_property(
        &self,
        constraints: &ConstraintExpression,
    ) -> Result<Option<RequiredProperty>, ConstraintError> {
        if constraints.is_empty() {
            return Ok(None);
        }
        self.validate(constraints)?
            .to_required_property(constraints.expressions())
    }
}

impl Default for ConstraintLanguages {
    fn default() -> Self {
        let mut languages = Self::empty();
        languages.register(Box::new(TextLanguage));
        languages
    }
}
