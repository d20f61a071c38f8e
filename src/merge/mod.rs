//! Token merge engine.
//!
//! Templates carry `{{{DOMAIN.field}}}` tokens. [`extract_tokens`] derives a
//! [`TokenMap`] once per template; [`MergeEngine`] resolves each domain
//! (record, user, generic, caller-supplied row/context, configuration) and
//! substitutes the values back, finishing with the `ESCAPE(((...)))`
//! post-pass.

mod engine;
mod resolver;
mod substitute;
mod token;

pub(crate) use resolver::lookup_path;

pub use engine::{MergeContext, MergeEngine, MergeOptions};
pub use token::{
    extract_tokens, has_tokens, is_reserved_domain, DomainTokens, Token, TokenMap, DOMAIN_CONTEXT,
    DOMAIN_GENERIC, DOMAIN_RECORD, DOMAIN_ROW, DOMAIN_USER,
};
