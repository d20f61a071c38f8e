//! Restricted boolean-expression evaluation.
//!
//! Configuration metadata carries `hidden`/`disabled` conditions as strings
//! (`"{{{ROW.Amount__c}}} > 1000"` before merging, `"1500 > 1000"` after).
//! These are evaluated by a small recursive-descent parser over field
//! references, literals, comparisons, and boolean operators. Host-language
//! code is never executed.

mod coerce;
mod lexer;
mod parser;

use serde_json::Value;
use thiserror::Error;

use coerce::is_truthy;

/// Expression errors.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Empty expression")]
    Empty,
}

/// Evaluates a boolean expression against a scope of named values.
///
/// Field references resolve by dotted path in `scope`; missing fields read
/// as null. The result is collapsed to script-style truthiness.
pub fn evaluate_predicate(expr: &str, scope: &Value) -> Result<bool, EvalError> {
    let tokens = lexer::tokenize(expr)?;
    let parsed = parser::parse(&tokens)?;
    Ok(is_truthy(&parser::eval_expr(&parsed, scope)))
}

/// Evaluates a configuration flag that is either a literal or an expression.
///
/// Booleans pass through, strings parse and evaluate, null and empty strings
/// are false, anything else collapses to truthiness.
pub fn evaluate_flag(flag: &Value, scope: &Value) -> Result<bool, EvalError> {
    match flag {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        Value::String(s) if s.trim().is_empty() => Ok(false),
        Value::String(s) => evaluate_predicate(s, scope),
        other => Ok(is_truthy(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_evaluate_predicate() {
        let scope = json!({"Amount__c": 1500, "Stage": "Won"});
        assert!(evaluate_predicate("Amount__c > 1000 && Stage == 'Won'", &scope).unwrap());
        assert!(!evaluate_predicate("Amount__c > 2000 || Stage == 'Lost'", &scope).unwrap());
    }

    #[test]
    fn test_evaluate_predicate_reports_syntax_errors() {
        let scope = json!({});
        assert!(evaluate_predicate("a ==", &scope).is_err());
        assert!(evaluate_predicate("", &scope).is_err());
    }

    #[test]
    fn test_evaluate_flag_literals() {
        let scope = json!({});
        assert!(evaluate_flag(&json!(true), &scope).unwrap());
        assert!(!evaluate_flag(&json!(false), &scope).unwrap());
        assert!(!evaluate_flag(&json!(null), &scope).unwrap());
        assert!(!evaluate_flag(&json!(""), &scope).unwrap());
        assert!(evaluate_flag(&json!(1), &scope).unwrap());
    }

    #[test]
    fn test_evaluate_flag_expressions() {
        let scope = json!({"Status": "Closed"});
        assert!(evaluate_flag(&json!("Status == 'Closed'"), &scope).unwrap());
        assert!(!evaluate_flag(&json!("Status == 'Open'"), &scope).unwrap());
    }

    #[test]
    fn test_evaluate_flag_post_merge_literal_expression() {
        // After a merge the expression contains literals only.
        let scope = json!({});
        assert!(evaluate_flag(&json!("1500 > 1000"), &scope).unwrap());
        assert!(!evaluate_flag(&json!("'' != ''"), &scope).unwrap());
    }
}
