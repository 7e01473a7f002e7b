/// A parsed upstream: the scheme+host+port triple that identifies the
/// Envoy cluster, plus any path prefix the URL carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpstream {
    pub authority: String,
    pub host: String,
    pub port: u32,
    pub tls: bool,
    pub path_prefix: Option<String>,
}

/// Parses an upstream URL already known to be a valid, validated absolute
/// HTTP(S) URL with a host. Callers upstream of the translator (the
/// Validator) guarantee this invariant, so parse failures here are a
/// translation invariant violation, not a user-facing error.
pub fn parse_upstream(url_str: &str) -> Option<ParsedUpstream> {
    let parsed = url::Url::parse(url_str).ok()?;
    let tls = parsed.scheme() == "https";
    let host = parsed.host_str()?.to_string();
    let port: u32 = parsed.port().unwrap_or(if tls { 443 } else { 80 }).into();
    let authority = format!("{}://{}:{}", parsed.scheme(), host, port);
    let path = parsed.path();
    let path_prefix = if path.is_empty() || path == "/" { None } else { Some(path.trim_end_matches('/').to_string()) };

    Some(ParsedUpstream { authority, host, port, tls, path_prefix })
}
