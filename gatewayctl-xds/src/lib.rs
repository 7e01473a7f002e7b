pub mod resources;
pub mod server;
pub mod snapshot;

pub use server::AdsServer;
pub use snapshot::{Snapshot, SnapshotCache};

pub use envoy_types::pb::envoy::service::discovery::v3::aggregated_discovery_service_server::AggregatedDiscoveryServiceServer;
