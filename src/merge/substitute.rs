//! Token substitution and the escape post-pass.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use super::resolver::DomainValues;
use super::token::TokenMap;

/// Replaces every token occurrence with its resolved value.
///
/// Domains with no resolved data are skipped with a warning and their tokens
/// stay in the output verbatim; the same holds for individual fields the
/// resolver omitted. `Null` renders as an empty string, strings verbatim,
/// everything else in its JSON display form.
pub(crate) fn apply_tokens(
    template: &str,
    token_map: &TokenMap,
    resolved: &HashMap<String, DomainValues>,
) -> String {
    let mut output = template.to_string();
    for (domain, tokens) in token_map.domains() {
        let Some(values) = resolved.get(domain) else {
            warn!(domain = %domain, "no data resolved for token domain, skipping substitution");
            continue;
        };
        for token in &tokens.tokens {
            let Some(value) = values.get(&token.field) else {
                continue;
            };
            output = output.replace(&token.raw, &display_value(value));
        }
    }
    output
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves `ESCAPE(((...)))` regions.
///
/// Inside each region double quotes become `\"` and CR/LF/tab characters
/// become single spaces; the wrapper is stripped. Authors mark insertions
/// that land inside JSON string literals this way, after the merge has
/// already run.
pub(crate) fn apply_escapes(text: &str) -> String {
    if !text.contains("ESCAPE(((") {
        return text.to_string();
    }
    let re = Regex::new(r"(?s)ESCAPE\(\(\((.*?)\)\)\)").unwrap();
    re.replace_all(text, |caps: &regex::Captures<'_>| {
        caps[1].replace('"', "\\\"").replace(['\r', '\n', '\t'], " ")
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::extract_tokens;
    use serde_json::json;

    fn resolved_for(domain: &str, values: Value) -> HashMap<String, DomainValues> {
        let mut map = HashMap::new();
        map.insert(
            domain.to_string(),
            values.as_object().cloned().unwrap_or_default(),
        );
        map
    }

    #[test]
    fn test_apply_tokens_replaces_all_occurrences() {
        let template = "{{{RCD.Name}}} + {{{RCD.Name}}}";
        let map = extract_tokens(template, "Case");
        let out = apply_tokens(template, &map, &resolved_for("RCD", json!({"Name": "Acme"})));
        assert_eq!(out, "Acme + Acme");
    }

    #[test]
    fn test_apply_tokens_null_renders_empty() {
        let template = "[{{{RCD.Name}}}]";
        let map = extract_tokens(template, "Case");
        let out = apply_tokens(template, &map, &resolved_for("RCD", json!({"Name": null})));
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_apply_tokens_numbers_use_json_form() {
        let template = r#"{"amount": {{{ROW.Amount__c}}}}"#;
        let map = extract_tokens(template, "Opportunity");
        let out = apply_tokens(
            template,
            &map,
            &resolved_for("ROW", json!({"Amount__c": 1250.5})),
        );
        assert_eq!(out, r#"{"amount": 1250.5}"#);
    }

    #[test]
    fn test_apply_tokens_skips_unresolved_domain() {
        let template = "{{{CTX.Id}}} stays";
        let map = extract_tokens(template, "Case");
        let out = apply_tokens(template, &map, &HashMap::new());
        assert_eq!(out, "{{{CTX.Id}}} stays");
    }

    #[test]
    fn test_apply_escapes_quotes_and_whitespace() {
        assert_eq!(
            apply_escapes(r#"ESCAPE(((He said "hi")))"#),
            r#"He said \"hi\""#
        );
        assert_eq!(
            apply_escapes("a ESCAPE(((line1\nline2\tend))) b"),
            r"a line1 line2 end b"
        );
    }

    #[test]
    fn test_apply_escapes_handles_multiple_regions() {
        let out = apply_escapes(r#"ESCAPE(((a"b))) mid ESCAPE(((c)))"#);
        assert_eq!(out, r#"a\"b mid c"#);
    }

    #[test]
    fn test_apply_escapes_leaves_plain_text_alone() {
        assert_eq!(apply_escapes("nothing here"), "nothing here");
    }
}
