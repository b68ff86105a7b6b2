use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;

// --- URL Construction ---

/// Base URL that endpoint keys are appended to.
pub const BASE_API_URL: &str = "https://cloud.singlebaseapis.com/api";

/// Header name for API key authentication.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header identifying the SDK that issued the request.
pub const SDK_CLIENT_HEADER: &str = "x-sbc-sdk-client";

/// Value sent in [`SDK_CLIENT_HEADER`].
pub const SDK_CLIENT_ID: &str = "singlebase-rs";

/// Builds the endpoint URL for an endpoint key: `<BASE_API_URL>/<endpoint_key>`.
#[must_use]
pub fn construct_endpoint_url(endpoint_key: &str) -> String {
    format!("{BASE_API_URL}/{endpoint_key}")
}

// --- Headers ---

/// Converts a name/value pair into typed header parts.
///
/// The error string names the offending part and is suitable for display.
pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| format!("invalid header name `{name}`: {e}"))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| format!("invalid value for header `{name}`: {e}"))?;
    Ok((header_name, header_value))
}

/// Headers required on every dispatch: API key, SDK client id and JSON content type.
pub(crate) fn base_headers(api_key: &str) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    let (name, value) = parse_header(API_KEY_HEADER, api_key)?;
    headers.insert(name, value);
    headers.insert(
        HeaderName::from_static(SDK_CLIENT_HEADER),
        HeaderValue::from_static(SDK_CLIENT_ID),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Layers per-call headers and the bearer token over the client's headers.
///
/// `client_headers` already holds the base headers overlaid with the client's
/// defaults. On a name collision the later layer replaces the earlier one:
/// per-call headers beat client defaults, and a non-empty bearer token always
/// sets `Authorization`.
///
/// Per-call headers are applied in byte order of their names, so when two
/// names differ only in case the one sorting last wins (`x-tenant` over
/// `X-Tenant`).
pub(crate) fn compose_headers(
    client_headers: &HeaderMap,
    extra_headers: Option<&HashMap<String, String>>,
    bearer_token: Option<&str>,
) -> Result<HeaderMap, String> {
    let mut headers = client_headers.clone();

    let mut extra: Vec<_> = extra_headers.into_iter().flatten().collect();
    extra.sort_unstable_by(|a, b| a.0.cmp(b.0));
    for (name, value) in extra {
        let (name, value) = parse_header(name, value)?;
        headers.insert(name, value);
    }

    if let Some(token) = bearer_token.filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| format!("invalid bearer token: {e}"))?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_construct_endpoint_url() {
        assert_eq!(
            construct_endpoint_url("test"),
            "https://cloud.singlebaseapis.com/api/test"
        );
    }

    #[test]
    fn test_base_headers() {
        let headers = base_headers("abc").unwrap();
        assert_eq!(header(&headers, "x-api-key"), Some("abc"));
        assert_eq!(header(&headers, "x-sbc-sdk-client"), Some("singlebase-rs"));
        assert_eq!(header(&headers, "content-type"), Some("application/json"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_base_headers_rejects_control_characters() {
        let err = base_headers("abc\ndef").unwrap_err();
        assert!(err.contains("x-api-key"));
    }

    #[test]
    fn test_compose_per_call_overrides_client() {
        let mut client_headers = base_headers("abc").unwrap();
        client_headers.insert("x-tenant", HeaderValue::from_static("default"));

        let extra = HashMap::from([("X-Tenant".to_string(), "per-call".to_string())]);
        let headers = compose_headers(&client_headers, Some(&extra), None).unwrap();

        assert_eq!(header(&headers, "x-tenant"), Some("per-call"));
        assert_eq!(headers.get_all("x-tenant").iter().count(), 1);
        // The client's map is left untouched.
        assert_eq!(header(&client_headers, "x-tenant"), Some("default"));
    }

    #[test]
    fn test_compose_case_variants_resolve_deterministically() {
        let client_headers = base_headers("abc").unwrap();

        // Each map gets fresh hasher state, so iteration order varies.
        for _ in 0..16 {
            let extra = HashMap::from([
                ("X-Tenant".to_string(), "upper".to_string()),
                ("x-tenant".to_string(), "lower".to_string()),
                ("X-TENANT".to_string(), "shout".to_string()),
            ]);
            let headers = compose_headers(&client_headers, Some(&extra), None).unwrap();
            assert_eq!(header(&headers, "x-tenant"), Some("lower"));
            assert_eq!(headers.get_all("x-tenant").iter().count(), 1);
        }
    }

    #[test]
    fn test_compose_bearer_wins_over_per_call_authorization() {
        let client_headers = base_headers("abc").unwrap();
        let extra = HashMap::from([("Authorization".to_string(), "Basic xyz".to_string())]);

        let headers = compose_headers(&client_headers, Some(&extra), Some("tok")).unwrap();
        assert_eq!(header(&headers, "authorization"), Some("Bearer tok"));
    }

    #[test]
    fn test_compose_empty_bearer_is_ignored() {
        let client_headers = base_headers("abc").unwrap();
        let headers = compose_headers(&client_headers, None, Some("")).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_compose_rejects_invalid_header_name() {
        let client_headers = base_headers("abc").unwrap();
        let extra = HashMap::from([("bad header".to_string(), "v".to_string())]);

        let err = compose_headers(&client_headers, Some(&extra), None).unwrap_err();
        assert!(err.contains("bad header"));
    }
}
