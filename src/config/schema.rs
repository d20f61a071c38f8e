//! Action-bar configuration records.

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ActionResult};
use crate::merge::{extract_tokens, has_tokens, TokenMap};

/// Configuration record as returned by a
/// [`ConfigProvider`](crate::platform::ConfigProvider).
///
/// `actions` and `channels` arrive as JSON-encoded strings; `actions` may
/// contain merge tokens and is only parsed after contextualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActionConfig {
    #[serde(default)]
    pub label: String,
    /// Actions JSON template, possibly containing merge tokens.
    pub actions: String,
    /// When set, per-action `hidden`/`disabled` expressions are evaluated.
    #[serde(default)]
    pub do_evaluation: bool,
    /// JSON-encoded list of subscribed channel names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<String>,
}

/// Parsed configuration, cached by developer name.
#[derive(Debug, Clone)]
pub struct ActionBarConfig {
    pub name: String,
    pub label: String,
    /// Raw actions JSON with tokens still in place.
    pub template: String,
    /// Token map derived from the template, `None` for token-free templates.
    pub token_map: Option<TokenMap>,
    /// Object the token map was derived against.
    pub object_api_name: String,
    pub do_evaluation: bool,
    pub channels: Vec<String>,
}

impl ActionBarConfig {
    /// Parses a raw configuration record, deriving the token map once.
    pub fn parse(name: &str, raw: &RawActionConfig, object_api_name: &str) -> ActionResult<Self> {
        let channels = match raw.channels.as_deref() {
            None | Some("") => Vec::new(),
            Some(text) => serde_json::from_str::<Vec<String>>(text).map_err(|e| {
                ActionError::ParseError(format!("channels of configuration {name}: {e}"))
            })?,
        };
        let token_map = if has_tokens(&raw.actions) {
            Some(extract_tokens(&raw.actions, object_api_name))
        } else {
            None
        };
        Ok(Self {
            name: name.to_string(),
            label: raw.label.clone(),
            template: raw.actions.clone(),
            token_map,
            object_api_name: object_api_name.to_string(),
            do_evaluation: raw.do_evaluation,
            channels,
        })
    }

    /// Re-derives the token map against a different object.
    ///
    /// Record-domain fields are object-scoped, so a cached configuration
    /// reused from another object context needs a fresh map; the template
    /// itself is unchanged.
    pub fn for_object(&self, object_api_name: &str) -> Self {
        let token_map = if has_tokens(&self.template) {
            Some(extract_tokens(&self.template, object_api_name))
        } else {
            None
        };
        Self {
            token_map,
            object_api_name: object_api_name.to_string(),
            ..self.clone()
        }
    }
}
