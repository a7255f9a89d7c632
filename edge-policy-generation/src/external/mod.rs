//! Externally facing policy vocabulary: properties, constraint expressions and
//! the constraint languages that interpret them.

pub(crate) mod constraint;
pub(crate) mod property;
pub(crate) mod text_language;

pub use constraint::{ConstraintExpression, ConstraintLanguage, ConstraintLanguages};
pub use property::{
    Property, PropertyList, BOOLEAN_TYPE, FLOAT_TYPE, INTEGER_TYPE, LIST_TYPE, STRING_TYPE,
    VERSION_TYPE,
};
pub use text_language::TextLanguage;
