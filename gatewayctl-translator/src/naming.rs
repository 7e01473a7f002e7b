pub const LISTENER_NAME: &str = "listener_http_8080";
pub const ROUTE_CONFIG_NAME: &str = "route_default";
pub const VIRTUAL_HOST_NAME: &str = "vh_default";

/// Deterministic sanitization of an upstream's `host:port` into a cluster
/// name: lower-case, non-alphanumerics replaced with `_`. The scheme is
/// never part of the emitted name; it still distinguishes cluster
/// *identity* (see `ParsedUpstream::authority`) so http and https to the
/// same host stay separate clusters.
pub fn cluster_name(host_port: &str) -> String {
    let sanitized: String = host_port
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("cluster_{sanitized}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_host_port_into_cluster_name() {
        assert_eq!(cluster_name("api.Weather.com:443"), "cluster_api_weather_com_443");
    }
}
