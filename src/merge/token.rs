//! Token extraction.

use regex::Regex;
use std::collections::HashMap;

use crate::platform::FieldSpec;

/// Current-record domain.
pub const DOMAIN_RECORD: &str = "RCD";
/// Current-user domain.
pub const DOMAIN_USER: &str = "USR";
/// Generic value domain (ids, dates).
pub const DOMAIN_GENERIC: &str = "GEN";
/// Caller-supplied row domain.
pub const DOMAIN_ROW: &str = "ROW";
/// Caller-supplied context domain.
pub const DOMAIN_CONTEXT: &str = "CTX";

const LABEL_SUFFIX: &str = ".LBL";

/// One placeholder in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Literal matched substring, delimiters included.
    pub raw: String,
    /// Field path inside the domain, after the label rewrite.
    pub field: String,
    /// Query path with the label suffix stripped (record/user tokens only).
    pub soql_field: Option<String>,
    /// Object-qualified path (record/user tokens only).
    pub lds_field: Option<String>,
    /// True when the original path ended in `.LBL`.
    pub use_label: bool,
}

/// Tokens of one domain plus the field projections they require.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainTokens {
    pub tokens: Vec<Token>,
    /// Deduplicated fetch projections (record/user domains only).
    pub fetch_fields: Vec<FieldSpec>,
}

/// Tokens of a template, grouped by domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenMap {
    domains: HashMap<String, DomainTokens>,
}

impl TokenMap {
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn get(&self, domain: &str) -> Option<&DomainTokens> {
        self.domains.get(domain)
    }

    pub fn domains(&self) -> impl Iterator<Item = (&String, &DomainTokens)> {
        self.domains.iter()
    }

    /// Domains outside the five reserved ones, resolved from configuration.
    pub fn config_domains(&self) -> impl Iterator<Item = (&String, &DomainTokens)> {
        self.domains
            .iter()
            .filter(|(name, _)| !is_reserved_domain(name))
    }

    fn entry(&mut self, domain: &str) -> &mut DomainTokens {
        self.domains.entry(domain.to_string()).or_default()
    }
}

pub fn is_reserved_domain(name: &str) -> bool {
    matches!(
        name,
        DOMAIN_RECORD | DOMAIN_USER | DOMAIN_GENERIC | DOMAIN_ROW | DOMAIN_CONTEXT
    )
}

/// Cheap pre-check used by the merge fast paths.
pub fn has_tokens(template: &str) -> bool {
    template.contains("{{{")
}

/// Scans a template for `{{{DOMAIN.field}}}` tokens.
///
/// The domain is everything before the first `.`. A trailing `.LBL` selects
/// the field's translated label: the token's field is rewritten to
/// `<base>_LBL` and its fetch projection requests the label under that alias.
/// Record tokens qualify their object-scoped path with `object_api_name`,
/// user tokens with `User`. Matches without a field part are left for the
/// substitution pass to ignore; duplicate fields collapse into one entry.
pub fn extract_tokens(template: &str, object_api_name: &str) -> TokenMap {
    let re = Regex::new(r"(?i)\{\{\{([.\w-]*)\}\}\}").unwrap();
    let mut map = TokenMap::default();
    for cap in re.captures_iter(template) {
        let path = cap[1].trim();
        let Some((domain, field_path)) = path.split_once('.') else {
            continue;
        };
        if domain.is_empty() || field_path.is_empty() {
            continue;
        }

        let (field, base, use_label) = match field_path.strip_suffix(LABEL_SUFFIX) {
            Some(base) if !base.is_empty() => (format!("{base}_LBL"), base.to_string(), true),
            _ => (field_path.to_string(), field_path.to_string(), false),
        };

        let entry = map.entry(domain);
        if entry.tokens.iter().any(|t| t.field == field) {
            continue;
        }

        let queried = match domain {
            DOMAIN_RECORD => Some(object_api_name),
            DOMAIN_USER => Some("User"),
            _ => None,
        };
        let (soql_field, lds_field) = match queried {
            Some(object) => (
                Some(base.clone()),
                Some(format!("{object}.{base}")),
            ),
            None => (None, None),
        };

        if queried.is_some() {
            entry.fetch_fields.push(if use_label {
                FieldSpec::labeled(base.clone(), field.clone())
            } else {
                FieldSpec::value(base.clone())
            });
        }
        entry.tokens.push(Token {
            raw: cap[0].to_string(),
            field,
            soql_field,
            lds_field,
            use_label,
        });
    }
    map
}
