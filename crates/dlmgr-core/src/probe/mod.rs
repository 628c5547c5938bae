//! HTTP HEAD / metadata probing.
//!
//! Uses the curl crate (libcurl) to fetch response headers and confirm
//! `Content-Length`, `Accept-Ranges: bytes`, and capture ETag/Last-Modified
//! for resume safety. Some servers reject HEAD outright (405, or close the
//! connection); in that case we retry with a streaming GET and abort the
//! transfer the moment headers are in, so we pay for at most the headers.

mod parse;

use std::collections::HashMap;
use std::str;
use std::time::Duration;

use crate::error::EngineError;

/// Result of probing a URL: key headers needed for segmented download and resume.
#[derive(Debug, Clone)]
pub struct HeadResult {
    /// The URL after following redirects.
    pub resolved_url: String,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    /// `ETag` value if present (used for resume validation).
    pub etag: Option<String>,
    /// `Last-Modified` value if present (used for resume validation).
    pub last_modified: Option<String>,
    /// `Content-Disposition` value if present (filename hint).
    pub content_disposition: Option<String>,
}

/// Probes a URL for segmented-download planning: `{resolved_url, filename,
/// total_size, supports_range}`. Issues a HEAD first; if the server rejects it
/// (status >= 400) or refuses the method, falls back to a GET whose body is
/// closed as soon as headers are read.
///
/// Runs in the current thread; call from a blocking context if used from async code.
pub fn probe(
    url: &str,
    custom_headers: &HashMap<String, String>,
    timeout: Duration,
) -> Result<HeadResult, EngineError> {
    match probe_with_method(url, custom_headers, true, timeout) {
        Ok(attempt) if attempt.response_code < 400 => Ok(attempt.head),
        _ => probe_with_method(url, custom_headers, false, timeout).map(|a| a.head),
    }
}

struct ProbeAttempt {
    head: HeadResult,
    response_code: u32,
}

fn probe_with_method(
    url: &str,
    custom_headers: &HashMap<String, String>,
    head_method: bool,
    timeout: Duration,
) -> Result<ProbeAttempt, EngineError> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)
        .map_err(|e| EngineError::InvalidUrl(format!("{url}: {e}")))?;
    if head_method {
        easy.nobody(true)
            .map_err(|e| EngineError::TransportError(e.to_string()))?;
    } else {
        easy.get(true)
            .map_err(|e| EngineError::TransportError(e.to_string()))?;
    }
    easy.follow_location(true)
        .map_err(|e| EngineError::TransportError(e.to_string()))?;
    easy.connect_timeout(timeout)
        .map_err(|e| EngineError::TransportError(e.to_string()))?;
    easy.timeout(timeout)
        .map_err(|e| EngineError::TransportError(e.to_string()))?;

    let mut list = curl::easy::List::new();
    for (k, v) in custom_headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))
            .map_err(|e| EngineError::TransportError(e.to_string()))?;
    }
    if !custom_headers.is_empty() {
        easy.http_headers(list)
            .map_err(|e| EngineError::TransportError(e.to_string()))?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(|e| EngineError::TransportError(e.to_string()))?;
        if !head_method {
            // Headers are already captured above; returning a short write makes
            // libcurl abort the transfer once the header block has been delivered,
            // so the GET fallback never pulls the whole body.
            transfer
                .write_function(|_data| Ok(0))
                .map_err(|e| EngineError::TransportError(e.to_string()))?;
        }
        if let Err(e) = transfer.perform() {
            if !(!head_method && e.is_write_error()) {
                return Err(EngineError::TransportError(e.to_string()));
            }
        }
    }

    let response_code = easy
        .response_code()
        .map_err(|e| EngineError::TransportError(e.to_string()))?;
    let resolved_url = easy
        .effective_url()
        .ok()
        .flatten()
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string());

    if response_code >= 400 {
        return Err(EngineError::ProbeFailed(format!(
            "{url} returned HTTP {response_code}"
        )));
    }

    let mut head = parse::parse_headers(&headers);
    head.resolved_url = resolved_url;
    Ok(ProbeAttempt { head, response_code })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_rejects_unparseable_url() {
        let result = probe("not a url", &HashMap::new(), Duration::from_secs(5));
        assert!(result.is_err());
    }
}
