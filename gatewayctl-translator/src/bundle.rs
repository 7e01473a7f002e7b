use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::Listener;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;

/// The full set of Envoy xDS resources derived from the catalog at a point
/// in time. Structural `PartialEq` on the prost-generated types makes
/// determinism (`translate(x) == translate(x)`) a plain equality check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceBundle {
    pub listeners: Vec<Listener>,
    pub route_configs: Vec<RouteConfiguration>,
    pub clusters: Vec<Cluster>,
}

impl ResourceBundle {
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.route_configs.is_empty() && self.clusters.is_empty()
    }
}
