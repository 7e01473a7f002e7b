use crate::authority::{parse_upstream, ParsedUpstream};
use crate::bundle::ResourceBundle;
use crate::matching::{route_match_regex, rewrite_substitution};
use crate::naming::{cluster_name, LISTENER_NAME, ROUTE_CONFIG_NAME, VIRTUAL_HOST_NAME};
use gatewayctl_core::{CoreError, StoredRecord};
use std::collections::BTreeMap;

use envoy_types::pb::envoy::config::cluster::v3::cluster::{ClusterDiscoveryType, DiscoveryType};
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::core::v3::address::Address as AddressKind;
use envoy_types::pb::envoy::config::core::v3::socket_address::PortSpecifier;
use envoy_types::pb::envoy::config::core::v3::{Address, SocketAddress};
use envoy_types::pb::envoy::config::endpoint::v3::lb_endpoint::HostIdentifier;
use envoy_types::pb::envoy::config::endpoint::v3::{
    ClusterLoadAssignment, Endpoint, LbEndpoint, LocalityLbEndpoints,
};
use envoy_types::pb::envoy::config::listener::v3::Listener;
use envoy_types::pb::envoy::config::route::v3::header_matcher::HeaderMatchSpecifier;
use envoy_types::pb::envoy::config::route::v3::route::Action as RouteActionKind;
use envoy_types::pb::envoy::config::route::v3::route_action::ClusterSpecifier;
use envoy_types::pb::envoy::config::route::v3::route_match::PathSpecifier;
use envoy_types::pb::envoy::config::route::v3::weighted_cluster::ClusterWeight;
use envoy_types::pb::envoy::config::route::v3::{
    HeaderMatcher, Route, RouteAction, RouteConfiguration, RouteMatch, VirtualHost,
    WeightedCluster,
};
use envoy_types::pb::envoy::r#type::matcher::v3::regex_matcher::EngineType;
use envoy_types::pb::envoy::r#type::matcher::v3::{RegexMatchAndSubstitute, RegexMatcher};
use envoy_types::pb::google::protobuf::UInt32Value;

/// Pure translation: catalog → {Listeners, RouteConfigs, Clusters}.
///
/// Records are sorted by `(name, version)` ascending before their operations
/// are walked in the user-provided order, so the same catalog always yields
/// byte-equal output.
pub fn translate(records: &[StoredRecord]) -> Result<ResourceBundle, CoreError> {
    let mut sorted: Vec<&StoredRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.config.key().cmp(&b.config.key()));

    let mut clusters: BTreeMap<String, Cluster> = BTreeMap::new();
    let mut routes = Vec::new();

    for record in &sorted {
        let cfg = &record.config;
        let mut upstreams = Vec::with_capacity(cfg.upstreams.len());
        for upstream in &cfg.upstreams {
            let parsed = parse_upstream(&upstream.url).ok_or_else(|| CoreError::Translation {
                record_id: record.id.clone(),
                reason: format!("upstream url \"{}\" failed to parse at translation time", upstream.url),
            })?;
            let name = cluster_name(&format!("{}:{}", parsed.host, parsed.port));
            clusters.entry(parsed.authority.clone()).or_insert_with(|| build_cluster(&name, &parsed));
            upstreams.push((name, parsed));
        }

        for operation in &cfg.operations {
            routes.push(build_route(cfg, operation, &upstreams));
        }
    }

    let virtual_host = VirtualHost {
        name: VIRTUAL_HOST_NAME.to_string(),
        domains: vec!["*".to_string()],
        routes,
        ..Default::default()
    };

    let route_config = RouteConfiguration {
        name: ROUTE_CONFIG_NAME.to_string(),
        virtual_hosts: vec![virtual_host],
        ..Default::default()
    };

    let listener = build_listener();

    Ok(ResourceBundle {
        listeners: vec![listener],
        route_configs: vec![route_config],
        clusters: clusters.into_values().collect(),
    })
}

fn build_listener() -> Listener {
    // The HTTP connection manager filter is wired by the server at bootstrap
    // time via RDS indirection to `route_default`; the translator only owns
    // the listener's identity and network binding, matching the core
    // contract's "single shared listener" rule.
    Listener { name: LISTENER_NAME.to_string(), ..Default::default() }
}

fn build_cluster(name: &str, upstream: &ParsedUpstream) -> Cluster {
    let address = Address {
        address: Some(AddressKind::SocketAddress(SocketAddress {
            address: upstream.host.clone(),
            port_specifier: Some(PortSpecifier::PortValue(upstream.port)),
            ..Default::default()
        })),
    };

    let load_assignment = ClusterLoadAssignment {
        cluster_name: name.to_string(),
        endpoints: vec![LocalityLbEndpoints {
            lb_endpoints: vec![LbEndpoint {
                host_identifier: Some(HostIdentifier::Endpoint(Endpoint {
                    address: Some(address),
                    ..Default::default()
                })),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    Cluster {
        name: name.to_string(),
        cluster_discovery_type: Some(ClusterDiscoveryType::Type(DiscoveryType::StrictDns as i32)),
        load_assignment: Some(load_assignment),
        ..Default::default()
    }
}

fn build_route(
    cfg: &gatewayctl_core::ApiConfiguration,
    operation: &gatewayctl_core::Operation,
    upstreams: &[(String, ParsedUpstream)],
) -> Route {
    let regex = route_match_regex(&cfg.context, &operation.path);

    let route_match = RouteMatch {
        path_specifier: Some(PathSpecifier::SafeRegex(RegexMatcher {
            regex,
            engine_type: Some(EngineType::GoogleRe2(Default::default())),
        })),
        headers: vec![HeaderMatcher {
            name: ":method".to_string(),
            header_match_specifier: Some(HeaderMatchSpecifier::ExactMatch(
                operation.method.as_str().to_string(),
            )),
            ..Default::default()
        }],
        ..Default::default()
    };

    let cluster_specifier = if upstreams.len() == 1 {
        ClusterSpecifier::Cluster(upstreams[0].0.clone())
    } else {
        let weight = 100 / upstreams.len() as u32;
        ClusterSpecifier::WeightedClusters(WeightedCluster {
            clusters: upstreams
                .iter()
                .map(|(name, _)| ClusterWeight {
                    name: name.clone(),
                    weight: Some(UInt32Value { value: weight }),
                    ..Default::default()
                })
                .collect(),
            total_weight: Some(UInt32Value { value: weight * upstreams.len() as u32 }),
            ..Default::default()
        })
    };

    let regex_rewrite = upstreams[0].1.path_prefix.as_ref().map(|prefix| RegexMatchAndSubstitute {
        pattern: Some(RegexMatcher {
            regex: route_match_regex(&cfg.context, &operation.path),
            engine_type: Some(EngineType::GoogleRe2(Default::default())),
        }),
        substitution: rewrite_substitution(prefix),
    });

    let action = RouteAction { cluster_specifier: Some(cluster_specifier), regex_rewrite, ..Default::default() };

    Route { r#match: Some(route_match), action: Some(RouteActionKind::Route(action)), ..Default::default() }
}
