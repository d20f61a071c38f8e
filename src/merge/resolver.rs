//! Per-domain token resolution.

use chrono::{DateTime, Days, Months, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use super::token::{DomainTokens, TokenMap};
use crate::config::ConfigCache;
use crate::error::{MergeError, MergeResult};
use crate::platform::{ConfigProvider, FieldSpec, RecordFetcher};
use crate::runtime::Clock;

/// Values resolved for one domain, keyed by token field.
pub(crate) type DomainValues = Map<String, Value>;

/// Looks up a dotted path in caller-provided data.
///
/// Understands both plain JSON maps and platform record shapes, where levels
/// nest under `fields` and leaves wrap as `{value, displayValue}`. Label mode
/// prefers `displayValue` on the final segment and falls back to the raw
/// value when the label is null.
pub(crate) fn lookup_path(data: &Value, path: &str, use_label: bool) -> Option<Value> {
    let mut current = data;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, seg) in segments.iter().enumerate() {
        if let Some(fields) = current.get("fields") {
            if fields.is_object() {
                current = fields;
            }
        }
        current = current.get(seg)?;
        if let Some(obj) = current.as_object() {
            if obj.contains_key("value") {
                if use_label && i + 1 == segments.len() {
                    if let Some(label) = obj.get("displayValue").filter(|v| !v.is_null()) {
                        return Some(label.clone());
                    }
                }
                current = obj.get("value")?;
            }
        }
    }
    Some(current.clone())
}

/// Identity of a record-shaped domain resolution.
pub(crate) struct RecordDomainRequest<'a> {
    pub domain: &'static str,
    pub object: &'a str,
    pub record_id: Option<&'a str>,
    pub provided: Option<&'a Value>,
    /// Names the id in `MissingContext` errors.
    pub id_kind: &'static str,
}

/// Resolves record-shaped tokens (RCD and USR).
///
/// Tokens whose path resolves in the provided data are served directly; the
/// rest are queued and fetched in a single gateway call. Queued fields with
/// no record id to fetch against fail the merge.
pub(crate) async fn resolve_record_domain(
    req: RecordDomainRequest<'_>,
    tokens: &DomainTokens,
    fetcher: &dyn RecordFetcher,
) -> MergeResult<DomainValues> {
    let mut resolved = DomainValues::new();
    let mut queue: Vec<FieldSpec> = Vec::new();
    for token in &tokens.tokens {
        let path = token.soql_field.as_deref().unwrap_or(&token.field);
        if let Some(value) = req
            .provided
            .and_then(|data| lookup_path(data, path, token.use_label))
        {
            resolved.insert(token.field.clone(), value);
            continue;
        }
        queue.push(if token.use_label {
            FieldSpec::labeled(path, token.field.clone())
        } else {
            FieldSpec::value(path)
        });
    }
    if queue.is_empty() {
        return Ok(resolved);
    }

    let Some(record_id) = req.record_id else {
        return Err(MergeError::MissingContext {
            domain: req.domain,
            what: req.id_kind,
        });
    };
    let response = fetcher
        .fetch_fields(req.object, record_id, &queue)
        .await
        .map_err(|e| MergeError::fetch(req.domain, e))?;

    for token in &tokens.tokens {
        if resolved.contains_key(&token.field) {
            continue;
        }
        let key = if token.use_label {
            token.field.as_str()
        } else {
            token.soql_field.as_deref().unwrap_or(&token.field)
        };
        match fetched_value(&response, key) {
            Some(value) => {
                resolved.insert(token.field.clone(), value);
            }
            None => warn!(
                domain = req.domain,
                field = %token.field,
                "fetch response missing field"
            ),
        }
    }
    Ok(resolved)
}

/// Reads a fetch-response value: flat response key first, then a recursive
/// relationship walk.
fn fetched_value(response: &Value, key: &str) -> Option<Value> {
    if let Some(v) = response.get(key) {
        return Some(v.clone());
    }
    lookup_path(response, key, false)
}

/// Resolves generic tokens: context ids and date values off the clock.
///
/// Unknown field names are logged and omitted, leaving their tokens in the
/// template untouched.
pub(crate) fn resolve_generic_domain(
    tokens: &DomainTokens,
    user_id: Option<&str>,
    object_api_name: Option<&str>,
    record_id: Option<&str>,
    clock: &dyn Clock,
    local_date_format: &str,
) -> DomainValues {
    let now = clock.now();
    let mut resolved = DomainValues::new();
    for token in &tokens.tokens {
        let value = match token.field.as_str() {
            "userId" => opt_string(user_id),
            "objectApiName" => opt_string(object_api_name),
            "recordId" => opt_string(record_id),
            "now" => Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            other => match generic_date(other, now, local_date_format) {
                Some(v) => v,
                None => {
                    warn!(field = other, "unsupported generic token field");
                    continue;
                }
            },
        };
        resolved.insert(token.field.clone(), value);
    }
    resolved
}

fn opt_string(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::String(s.to_string()),
        None => Value::Null,
    }
}

fn generic_date(name: &str, now: DateTime<Utc>, local_format: &str) -> Option<Value> {
    let (base, local) = match name.strip_suffix("Local") {
        Some(base) => (base, true),
        None => (name, false),
    };
    let date = now.date_naive();
    let shifted = match base {
        "today" => Some(date),
        "yesterday" => date.checked_sub_days(Days::new(1)),
        "tomorrow" => date.checked_add_days(Days::new(1)),
        "lastWeek" => date.checked_sub_days(Days::new(7)),
        "nextWeek" => date.checked_add_days(Days::new(7)),
        "lastMonth" => date.checked_sub_months(Months::new(1)),
        "nextMonth" => date.checked_add_months(Months::new(1)),
        "lastQuarter" => date.checked_sub_months(Months::new(3)),
        "nextQuarter" => date.checked_add_months(Months::new(3)),
        "lastYear" => date.checked_sub_months(Months::new(12)),
        "nextYear" => date.checked_add_months(Months::new(12)),
        _ => return None,
    }?;
    let text = if local {
        shifted.format(local_format).to_string()
    } else {
        shifted.to_string()
    };
    Some(Value::String(text))
}

/// Projects caller-supplied row/context data onto a domain's tokens.
pub(crate) fn project_provided_domain(tokens: &DomainTokens, data: &Value) -> DomainValues {
    let mut resolved = DomainValues::new();
    for token in &tokens.tokens {
        if let Some(value) = lookup_path(data, &token.field, token.use_label) {
            resolved.insert(token.field.clone(), value);
        }
    }
    resolved
}

/// Resolves configuration-domain tokens through the cache, batching all
/// cache misses across domains into one provider call.
pub(crate) async fn resolve_config_domains(
    token_map: &TokenMap,
    cache: &ConfigCache,
    provider: &dyn ConfigProvider,
) -> MergeResult<HashMap<String, DomainValues>> {
    let mut resolved: HashMap<String, DomainValues> = HashMap::new();
    let mut missing: HashMap<String, Vec<String>> = HashMap::new();
    for (domain, tokens) in token_map.config_domains() {
        let values = resolved.entry(domain.clone()).or_default();
        for token in &tokens.tokens {
            match cache.token_value(domain, &token.field) {
                Some(v) => {
                    values.insert(token.field.clone(), v);
                }
                None => missing
                    .entry(domain.clone())
                    .or_default()
                    .push(token.field.clone()),
            }
        }
    }
    if missing.is_empty() {
        return Ok(resolved);
    }

    let requested: Vec<String> = missing.keys().cloned().collect();
    let response = provider
        .fetch_token_values(&missing)
        .await
        .map_err(|e| MergeError::fetch(requested.join(","), e))?;
    for (domain, fields) in response {
        cache.insert_token_values(&domain, fields.clone());
        let values = resolved.entry(domain).or_default();
        for (field, value) in fields {
            values.insert(field, value);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::extract_tokens;
    use crate::platform::memory::{StaticConfigProvider, StaticRecordFetcher};
    use crate::runtime::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap())
    }

    #[test]
    fn test_lookup_path_plain_map() {
        let data = json!({"Name": "Acme", "Account": {"Owner": {"Name": "Ada"}}});
        assert_eq!(lookup_path(&data, "Name", false), Some(json!("Acme")));
        assert_eq!(
            lookup_path(&data, "Account.Owner.Name", false),
            Some(json!("Ada"))
        );
        assert_eq!(lookup_path(&data, "Missing", false), None);
    }

    #[test]
    fn test_lookup_path_platform_record_shape() {
        let data = json!({
            "fields": {
                "Status__c": {"value": "s1", "displayValue": "Open"},
                "Account": {
                    "value": {
                        "fields": {"Name": {"value": "Acme", "displayValue": null}}
                    },
                    "displayValue": "Acme Corp"
                }
            }
        });
        assert_eq!(lookup_path(&data, "Status__c", false), Some(json!("s1")));
        assert_eq!(lookup_path(&data, "Status__c", true), Some(json!("Open")));
        assert_eq!(
            lookup_path(&data, "Account.Name", false),
            Some(json!("Acme"))
        );
    }

    #[tokio::test]
    async fn test_record_domain_served_from_provided_data() {
        let fetcher = StaticRecordFetcher::new();
        let map = extract_tokens("{{{RCD.Name}}}", "Case");
        let tokens = map.get("RCD").unwrap();
        let provided = json!({"Name": "Acme"});
        let req = RecordDomainRequest {
            domain: "RCD",
            object: "Case",
            record_id: Some("500x0"),
            provided: Some(&provided),
            id_kind: "record id",
        };
        let resolved = resolve_record_domain(req, tokens, &fetcher).await.unwrap();
        assert_eq!(resolved.get("Name"), Some(&json!("Acme")));
        assert_eq!(fetcher.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_record_domain_batches_missing_fields_into_one_fetch() {
        let fetcher = StaticRecordFetcher::new()
            .with_record("Case", "500x0", json!({"Subject": "Hi", "Status__c": "s1"}))
            .with_labels("Case", "500x0", json!({"Status__c": "Open"}));
        let map = extract_tokens(
            "{{{RCD.Subject}}} {{{RCD.Status__c.LBL}}} {{{RCD.Name}}}",
            "Case",
        );
        let tokens = map.get("RCD").unwrap();
        let provided = json!({"Name": "Acme"});
        let req = RecordDomainRequest {
            domain: "RCD",
            object: "Case",
            record_id: Some("500x0"),
            provided: Some(&provided),
            id_kind: "record id",
        };
        let resolved = resolve_record_domain(req, tokens, &fetcher).await.unwrap();
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(resolved.get("Subject"), Some(&json!("Hi")));
        assert_eq!(resolved.get("Status__c_LBL"), Some(&json!("Open")));
        assert_eq!(resolved.get("Name"), Some(&json!("Acme")));
    }

    #[tokio::test]
    async fn test_record_domain_walks_fetched_relationship_paths() {
        let fetcher = StaticRecordFetcher::new().with_record(
            "Case",
            "500x0",
            json!({"Account": {"Owner": {"Name": "Ada"}}}),
        );
        let map = extract_tokens("{{{RCD.Account.Owner.Name}}}", "Case");
        let req = RecordDomainRequest {
            domain: "RCD",
            object: "Case",
            record_id: Some("500x0"),
            provided: None,
            id_kind: "record id",
        };
        let resolved = resolve_record_domain(req, map.get("RCD").unwrap(), &fetcher)
            .await
            .unwrap();
        assert_eq!(resolved.get("Account.Owner.Name"), Some(&json!("Ada")));
    }

    #[tokio::test]
    async fn test_record_domain_requires_record_id_for_fetch() {
        let fetcher = StaticRecordFetcher::new();
        let map = extract_tokens("{{{RCD.Name}}}", "Case");
        let req = RecordDomainRequest {
            domain: "RCD",
            object: "Case",
            record_id: None,
            provided: None,
            id_kind: "record id",
        };
        let err = resolve_record_domain(req, map.get("RCD").unwrap(), &fetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::MissingContext { .. }));
    }

    #[tokio::test]
    async fn test_record_domain_maps_fetch_failures() {
        let fetcher = StaticRecordFetcher::new();
        let map = extract_tokens("{{{RCD.Name}}}", "Case");
        let req = RecordDomainRequest {
            domain: "RCD",
            object: "Case",
            record_id: Some("500x0"),
            provided: None,
            id_kind: "record id",
        };
        let err = resolve_record_domain(req, map.get("RCD").unwrap(), &fetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::FetchError { .. }));
    }

    #[test]
    fn test_generic_domain_ids_and_instant() {
        let map = extract_tokens("{{{GEN.userId}}} {{{GEN.recordId}}} {{{GEN.now}}}", "Case");
        let resolved = resolve_generic_domain(
            map.get("GEN").unwrap(),
            Some("005x0"),
            Some("Case"),
            None,
            &clock(),
            "%m/%d/%Y",
        );
        assert_eq!(resolved.get("userId"), Some(&json!("005x0")));
        assert_eq!(resolved.get("recordId"), Some(&Value::Null));
        assert_eq!(resolved.get("now"), Some(&json!("2024-03-15T10:30:00.000Z")));
    }

    #[test]
    fn test_generic_domain_date_matrix() {
        let map = extract_tokens(
            "{{{GEN.today}}} {{{GEN.yesterday}}} {{{GEN.tomorrow}}} {{{GEN.lastWeek}}} \
             {{{GEN.nextMonth}}} {{{GEN.lastQuarter}}} {{{GEN.nextYear}}} {{{GEN.todayLocal}}}",
            "Case",
        );
        let resolved = resolve_generic_domain(
            map.get("GEN").unwrap(),
            None,
            None,
            None,
            &clock(),
            "%m/%d/%Y",
        );
        assert_eq!(resolved.get("today"), Some(&json!("2024-03-15")));
        assert_eq!(resolved.get("yesterday"), Some(&json!("2024-03-14")));
        assert_eq!(resolved.get("tomorrow"), Some(&json!("2024-03-16")));
        assert_eq!(resolved.get("lastWeek"), Some(&json!("2024-03-08")));
        assert_eq!(resolved.get("nextMonth"), Some(&json!("2024-04-15")));
        assert_eq!(resolved.get("lastQuarter"), Some(&json!("2023-12-15")));
        assert_eq!(resolved.get("nextYear"), Some(&json!("2025-03-15")));
        assert_eq!(resolved.get("todayLocal"), Some(&json!("03/15/2024")));
    }

    #[test]
    fn test_generic_domain_omits_unknown_fields() {
        let map = extract_tokens("{{{GEN.bogus}}} {{{GEN.today}}}", "Case");
        let resolved = resolve_generic_domain(
            map.get("GEN").unwrap(),
            None,
            None,
            None,
            &clock(),
            "%m/%d/%Y",
        );
        assert!(resolved.get("bogus").is_none());
        assert!(resolved.get("today").is_some());
    }

    #[test]
    fn test_generic_month_arithmetic_clamps_to_month_end() {
        let eom = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap());
        let map = extract_tokens("{{{GEN.lastMonth}}}", "Case");
        let resolved =
            resolve_generic_domain(map.get("GEN").unwrap(), None, None, None, &eom, "%m/%d/%Y");
        // February has no 31st; chrono clamps.
        assert_eq!(resolved.get("lastMonth"), Some(&json!("2024-02-29")));
    }

    #[test]
    fn test_project_provided_domain() {
        let map = extract_tokens("{{{ROW.Amount__c}}} {{{ROW.Account.Name}}}", "Opportunity");
        let row = json!({"Amount__c": 1200, "Account": {"Name": "Acme"}});
        let resolved = project_provided_domain(map.get("ROW").unwrap(), &row);
        assert_eq!(resolved.get("Amount__c"), Some(&json!(1200)));
        assert_eq!(resolved.get("Account.Name"), Some(&json!("Acme")));
    }

    #[tokio::test]
    async fn test_config_domains_batch_misses_and_reuse_cache() {
        let provider = StaticConfigProvider::new()
            .with_token_values("SET", json!({"supportEmail": "help@acme.test"}))
            .with_token_values("LBLS", json!({"greeting": "Hello"}));
        let cache = ConfigCache::default();
        let map = extract_tokens("{{{SET.supportEmail}}} {{{LBLS.greeting}}}", "Case");

        let resolved = resolve_config_domains(&map, &cache, &provider).await.unwrap();
        assert_eq!(provider.token_fetch_count(), 1);
        assert_eq!(
            resolved["SET"].get("supportEmail"),
            Some(&json!("help@acme.test"))
        );
        assert_eq!(resolved["LBLS"].get("greeting"), Some(&json!("Hello")));

        // Second resolution is served from the cache.
        let resolved = resolve_config_domains(&map, &cache, &provider).await.unwrap();
        assert_eq!(provider.token_fetch_count(), 1);
        assert_eq!(resolved["LBLS"].get("greeting"), Some(&json!("Hello")));
    }
}
