//! URL rewriting for `openURL` and `download` actions.

use regex::Regex;

/// Rewrites `SUBSTR(value,'sep',index)` and `LEFT(value,length)` patterns
/// inside a URL template.
///
/// These are string-splitting macros, not expression evaluation: `SUBSTR`
/// splits the captured value on the separator and keeps one element, `LEFT`
/// keeps a leading character count. An out-of-range index yields an empty
/// replacement. Templates without macros pass through unchanged.
pub fn rewrite_url_macros(url: &str) -> String {
    if !url.contains("SUBSTR(") && !url.contains("LEFT(") {
        return url.to_string();
    }

    let substr_re = Regex::new(r"SUBSTR\(([^,()]*),'([^']*)',(\d+)\)").unwrap();
    let rewritten = substr_re.replace_all(url, |caps: &regex::Captures<'_>| {
        let value = &caps[1];
        let sep = &caps[2];
        let index: usize = caps[3].parse().unwrap_or(usize::MAX);
        value
            .split(sep)
            .nth(index)
            .unwrap_or_default()
            .to_string()
    });

    let left_re = Regex::new(r"LEFT\(([^,()]*),(\d+)\)").unwrap();
    let rewritten = left_re.replace_all(&rewritten, |caps: &regex::Captures<'_>| {
        let value = &caps[1];
        let length: usize = caps[2].parse().unwrap_or(usize::MAX);
        value.chars().take(length).collect::<String>()
    });

    rewritten.into_owned()
}

/// Content-document download path served by the platform file servlet.
pub fn document_download_url(document_id: &str) -> String {
    format!("/sfc/servlet.shepherd/document/download/{document_id}")
}

/// Content-version download path; several ids download as one archive.
pub fn version_download_url(version_ids: &[String]) -> String {
    format!(
        "/sfc/servlet.shepherd/version/download/{}",
        version_ids.join("/")
    )
}
