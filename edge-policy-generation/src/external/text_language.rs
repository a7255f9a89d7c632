//! The built-in "text" constraint language.
//!
//! Expressions compare properties with values and combine the comparisons with
//! `&&` / `AND` and `||` / `OR`, where AND binds tighter than OR:
//!
//! ```text
//! gpu == true && cores >= 4 || zone = "us-east"
//! ```
//!
//! Values are double-quoted strings, `true` / `false`, numbers, or bare words.
//! Bare words may contain commas so `zone in east,west` works. Parentheses are
//! not part of the language.

use log::trace;
use serde_json::{Number, Value};

use super::constraint::ConstraintLanguage;
use crate::errors::ConstraintError;
use crate::policy::{PropertyExpression, RequiredProperty};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Operator(&'static str),
    And,
    Or,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Word(w) => format!("'{}'", w),
            Self::Quoted(q) => format!("\"{}\"", q),
            Self::Operator(op) => format!("operator '{}'", op),
            Self::And => "'&&'".to_string(),
            Self::Or => "'||'".to_string(),
        }
    }
}

/// The text constraint language.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLanguage;

impl TextLanguage {
    pub const NAME: &'static str = "text";

    /// Parse one expression into its OR-of-ANDs groups of comparisons.
    fn parse(expression: &str) -> Result<Vec<Vec<PropertyExpression>>, ConstraintError> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(ConstraintError::syntax(expression, "expression is empty"));
        }

        let mut tokens = tokens.into_iter();
        let mut groups = Vec::new();
        let mut current = Vec::new();

        loop {
            current.push(parse_comparison(expression, &mut tokens)?);
            match tokens.next() {
                None => break,
                Some(Token::And) => {}
                Some(Token::Or) => groups.push(std::mem::take(&mut current)),
                Some(other) => {
                    return Err(ConstraintError::syntax(
                        expression,
                        format!("expected '&&' or '||' but found {}", other.describe()),
                    ))
                }
            }
        }
        groups.push(current);

        Ok(groups)
    }
}

impl ConstraintLanguage for TextLanguage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn validate(&self, expressions: &[String]) -> Result<(), ConstraintError> {
        for expression in expressions {
            Self::parse(expression)?;
        }
        Ok(())
    }

    fn to_required_property(
        &self,
        expressions: &[String],
    ) -> Result<Option<RequiredProperty>, ConstraintError> {
        if expressions.is_empty() {
            return Ok(None);
        }

        let mut conjuncts = Vec::with_capacity(expressions.len());
        for expression in expressions {
            let groups = Self::parse(expression)?;
            trace!("parsed constraint {:?} into {} alternatives", expression, groups.len());
            conjuncts.push(RequiredProperty::or(
                groups
                    .into_iter()
                    .map(|group| {
                        RequiredProperty::and(group.into_iter().map(RequiredProperty::from).collect())
                    })
                    .collect(),
            ));
        }

        Ok(Some(RequiredProperty::and(conjuncts)))
    }
}

fn parse_comparison(
    expression: &str,
    tokens: &mut impl Iterator<Item = Token>,
) -> Result<PropertyExpression, ConstraintError> {
    let name = match tokens.next() {
        Some(Token::Word(name)) => name,
        Some(other) => {
            return Err(ConstraintError::syntax(
                expression,
                format!("expected a property name but found {}", other.describe()),
            ))
        }
        None => return Err(ConstraintError::syntax(expression, "missing property name")),
    };

    let op = match tokens.next() {
        Some(Token::Operator(op)) => op,
        Some(other) => {
            return Err(ConstraintError::syntax(
                expression,
                format!(
                    "expected an operator after '{}' but found {}",
                    name,
                    other.describe()
                ),
            ))
        }
        None => {
            return Err(ConstraintError::syntax(
                expression,
                format!("missing operator after '{}'", name),
            ))
        }
    };

    let value = match tokens.next() {
        Some(Token::Quoted(text)) => Value::String(text),
        Some(Token::Word(word)) => typed_value(&word),
        Some(other) => {
            return Err(ConstraintError::syntax(
                expression,
                format!(
                    "expected a value after '{} {}' but found {}",
                    name,
                    op,
                    other.describe()
                ),
            ))
        }
        None => {
            return Err(ConstraintError::syntax(
                expression,
                format!("missing value after '{} {}'", name, op),
            ))
        }
    };

    Ok(PropertyExpression::new(name, value, op.to_string()))
}

fn typed_value(word: &str) -> Value {
    match word {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(integer) = word.parse::<i64>() {
        return Value::from(integer);
    }
    if let Some(number) = word.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(word.to_string())
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '=' | '!' | '<' | '>' | '&' | '|' | '(' | ')')
}

fn tokenize(expression: &str) -> Result<Vec<Token>, ConstraintError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        match c {
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut terminated = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped) => text.push(escaped),
                            None => break,
                        },
                        '"' => {
                            terminated = true;
                            break;
                        }
                        other => text.push(other),
                    }
                }
                if !terminated {
                    return Err(ConstraintError::syntax(expression, "unterminated string"));
                }
                tokens.push(Token::Quoted(text));
            }
            '&' | '|' => {
                chars.next();
                if chars.next_if_eq(&c).is_none() {
                    return Err(ConstraintError::syntax(
                        expression,
                        format!("unexpected '{}', did you mean '{}{}'", c, c, c),
                    ));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.next_if_eq(&'=').is_some();
                let op = match (c, followed_by_eq) {
                    ('=', true) => "==",
                    ('=', false) => "=",
                    ('!', true) => "!=",
                    ('<', true) => "<=",
                    ('<', false) => "<",
                    ('>', true) => ">=",
                    ('>', false) => ">",
                    _ => {
                        return Err(ConstraintError::syntax(
                            expression,
                            "unexpected '!', did you mean '!='",
                        ))
                    }
                };
                tokens.push(Token::Operator(op));
            }
            '(' | ')' => {
                return Err(ConstraintError::syntax(
                    expression,
                    "parentheses are not supported",
                ))
            }
            _ => {
                let mut word = String::new();
                while let Some(c) = chars.next_if(|c| !is_word_boundary(*c)) {
                    word.push(c);
                }
                tokens.push(match word.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "in" => Token::Operator("in"),
                    _ => Token::Word(word),
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn expressions(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("gpu == true")]
    #[case("zone = \"us-east\"")]
    #[case("cores >= 4 && memory > 1024")]
    #[case("cores >= 4 AND memory > 1024 OR zone != west")]
    #[case("zone in east,west")]
    #[case("version <= 1.5")]
    #[case("name == \"quoted \\\"inner\\\" text\"")]
    fn test_valid_expressions(#[case] expression: &str) {
        assert!(
            TextLanguage.validate(&expressions(&[expression])).is_ok(),
            "{} should be valid",
            expression
        );
    }

    #[rstest]
    #[case("", "expression is empty")]
    #[case("   ", "expression is empty")]
    #[case("gpu ==", "missing value")]
    #[case("gpu", "missing operator")]
    #[case("gpu == true &&", "missing property name")]
    #[case("gpu == true ||", "missing property name")]
    #[case("gpu == true zone == east", "expected '&&' or '||'")]
    #[case("gpu & true", "did you mean '&&'")]
    #[case("gpu ! true", "did you mean '!='")]
    #[case("zone == \"east", "unterminated string")]
    #[case("(gpu == true)", "parentheses are not supported")]
    #[case("== true", "expected a property name")]
    #[case("gpu true", "expected an operator")]
    #[case("gpu == &&", "expected a value")]
    fn test_invalid_expressions(#[case] expression: &str, #[case] reason: &str) {
        let err = TextLanguage
            .validate(&expressions(&[expression]))
            .unwrap_err();
        match err {
            ConstraintError::Syntax {
                expression: failed,
                reason: message,
            } => {
                assert_eq!(failed, expression);
                assert!(
                    message.contains(reason),
                    "expected '{}' in '{}'",
                    reason,
                    message
                );
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_validate_checks_every_expression() {
        let err = TextLanguage
            .validate(&expressions(&["gpu == true", "zone =="]))
            .unwrap_err();
        assert!(matches!(err, ConstraintError::Syntax { expression, .. } if expression == "zone =="));
    }

    #[test]
    fn test_typed_values() {
        assert_eq!(typed_value("true"), json!(true));
        assert_eq!(typed_value("false"), json!(false));
        assert_eq!(typed_value("42"), json!(42));
        assert_eq!(typed_value("-7"), json!(-7));
        assert_eq!(typed_value("1.5"), json!(1.5));
        assert_eq!(typed_value("east,west"), json!("east,west"));
        assert_eq!(typed_value("1.2.3"), json!("1.2.3"));
    }

    #[test]
    fn test_to_required_property_structure() {
        let requirement = TextLanguage
            .to_required_property(&expressions(&[
                "gpu == true && cores >= 4 || zone = \"us-east\"",
                "arch in amd64,arm64",
            ]))
            .unwrap()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&requirement).unwrap(),
            json!({"and": [
                {"or": [
                    {"and": [
                        {"name": "gpu", "value": true, "op": "=="},
                        {"name": "cores", "value": 4, "op": ">="}
                    ]},
                    {"and": [{"name": "zone", "value": "us-east", "op": "="}]}
                ]},
                {"or": [
                    {"and": [{"name": "arch", "value": "amd64,arm64", "op": "in"}]}
                ]}
            ]})
        );
    }

    #[test]
    fn test_to_required_property_empty() {
        assert_eq!(TextLanguage.to_required_property(&[]).unwrap(), None);
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        let requirement = TextLanguage
            .to_required_property(&expressions(&["a == and"]))
            .unwrap()
            .unwrap();
        assert_eq!(requirement.expressions()[0].value, json!("and"));
    }
}
