use envoy_types::pb::google::protobuf::Any;
use gatewayctl_translator::ResourceBundle;
use prost::Message;

pub const LISTENER_TYPE_URL: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";
pub const ROUTE_CONFIG_TYPE_URL: &str =
    "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";
pub const CLUSTER_TYPE_URL: &str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";

pub const KNOWN_TYPE_URLS: [&str; 3] = [LISTENER_TYPE_URL, ROUTE_CONFIG_TYPE_URL, CLUSTER_TYPE_URL];

/// Packs every resource of `type_url` from `bundle` into a `google.protobuf.Any`
/// envelope, in the bundle's existing (deterministic) order.
pub fn resources_for_type(bundle: &ResourceBundle, type_url: &str) -> Vec<Any> {
    match type_url {
        LISTENER_TYPE_URL => bundle.listeners.iter().map(|l| any_of(type_url, l)).collect(),
        ROUTE_CONFIG_TYPE_URL => bundle.route_configs.iter().map(|r| any_of(type_url, r)).collect(),
        CLUSTER_TYPE_URL => bundle.clusters.iter().map(|c| any_of(type_url, c)).collect(),
        _ => Vec::new(),
    }
}

fn any_of(type_url: &str, message: &impl Message) -> Any {
    Any { type_url: type_url.to_string(), value: message.encode_to_vec() }
}
