use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use envoy_types::pb::envoy::service::discovery::v3::aggregated_discovery_service_server::AggregatedDiscoveryService;
use envoy_types::pb::envoy::service::discovery::v3::{
    DeltaDiscoveryRequest, DeltaDiscoveryResponse, DiscoveryRequest, DiscoveryResponse,
};
use gatewayctl_observability::MetricsCollector;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use crate::resources::{resources_for_type, KNOWN_TYPE_URLS};
use crate::snapshot::{Snapshot, SnapshotCache, GLOBAL_NODE};

/// Per-(stream, type_url) bookkeeping: the version and nonce of the last
/// response sent, used to tell a genuine NACK from a stale ACK that arrived
/// after we already moved the stream on to a newer version.
#[derive(Default)]
struct TypeState {
    last_sent_version: Option<u64>,
    last_sent_nonce: Option<String>,
}

/// Implements the aggregated, state-of-the-world discovery protocol: one
/// bidirectional stream carries requests and responses for every resource
/// type, multiplexed by `type_url`.
pub struct AdsServer {
    snapshots: Arc<SnapshotCache>,
    metrics: Arc<MetricsCollector>,
}

impl AdsServer {
    pub fn new(snapshots: Arc<SnapshotCache>, metrics: Arc<MetricsCollector>) -> Self {
        Self { snapshots, metrics }
    }
}

#[tonic::async_trait]
impl AggregatedDiscoveryService for AdsServer {
    type StreamAggregatedResourcesStream =
        Pin<Box<dyn tokio_stream::Stream<Item = Result<DiscoveryResponse, Status>> + Send + 'static>>;

    async fn stream_aggregated_resources(
        &self,
        request: Request<Streaming<DiscoveryRequest>>,
    ) -> Result<Response<Self::StreamAggregatedResourcesStream>, Status> {
        let incoming = request.into_inner();
        let snapshots = self.snapshots.clone();
        let metrics = self.metrics.clone();
        let (tx, rx) = mpsc::channel(16);

        metrics.xds_active_streams.inc();
        tokio::spawn(async move {
            run_stream(incoming, tx, snapshots, metrics.clone()).await;
            metrics.xds_active_streams.dec();
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    type DeltaAggregatedResourcesStream =
        Pin<Box<dyn tokio_stream::Stream<Item = Result<DeltaDiscoveryResponse, Status>> + Send + 'static>>;

    async fn delta_aggregated_resources(
        &self,
        _request: Request<Streaming<DeltaDiscoveryRequest>>,
    ) -> Result<Response<Self::DeltaAggregatedResourcesStream>, Status> {
        Err(Status::unimplemented("delta xDS is not supported; this server implements state-of-the-world (SotW) ADS only"))
    }
}

async fn run_stream(
    mut incoming: Streaming<DiscoveryRequest>,
    tx: mpsc::Sender<Result<DiscoveryResponse, Status>>,
    snapshots: Arc<SnapshotCache>,
    metrics: Arc<MetricsCollector>,
) {
    let mut node_id: Option<String> = None;
    let mut subscribed: HashMap<String, TypeState> = HashMap::new();
    let mut changes: Option<tokio::sync::broadcast::Receiver<Arc<Snapshot>>> = None;

    loop {
        tokio::select! {
            request = incoming.message() => {
                let request = match request {
                    Ok(Some(request)) => request,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(error = %err, "xds: client stream error");
                        break;
                    }
                };

                if node_id.is_none() {
                    let id = request.node.as_ref().map(|n| n.id.clone()).unwrap_or_default();
                    changes = Some(snapshots.subscribe(GLOBAL_NODE));
                    node_id = Some(id);
                }
                let node = node_id.as_deref().unwrap_or_default();

                if !handle_request(&request, node, &mut subscribed, &snapshots, &metrics, &tx).await {
                    break;
                }
            }
            update = async {
                match changes.as_mut() {
                    Some(rx) => rx.recv().await.ok(),
                    None => std::future::pending().await,
                }
            } => {
                let Some(snapshot) = update else { continue };
                let node = node_id.as_deref().unwrap_or_default();
                for type_url in KNOWN_TYPE_URLS {
                    if subscribed.contains_key(type_url) {
                        send_snapshot(type_url, &snapshot, &mut subscribed, &metrics, &tx).await;
                    }
                }
            }
        }
    }
}

/// Handles one `DiscoveryRequest`. Returns `false` if the stream should close
/// (the send channel is gone).
async fn handle_request(
    request: &DiscoveryRequest,
    node: &str,
    subscribed: &mut HashMap<String, TypeState>,
    snapshots: &SnapshotCache,
    metrics: &MetricsCollector,
    tx: &mpsc::Sender<Result<DiscoveryResponse, Status>>,
) -> bool {
    let type_url = request.type_url.clone();
    let state = subscribed.entry(type_url.clone()).or_default();

    if let Some(detail) = &request.error_detail {
        if state.last_sent_nonce.as_deref() == Some(request.response_nonce.as_str()) {
            warn!(node, %type_url, message = %detail.message, "xds: received NACK");
            metrics.record_nack(&type_url);
        }
        return true;
    }

    if !request.response_nonce.is_empty()
        && state.last_sent_nonce.as_deref() != Some(request.response_nonce.as_str())
    {
        debug!(node, %type_url, "xds: stale ack, ignoring");
        return true;
    }

    debug!(node, %type_url, resources = ?request.resource_names, "xds: subscription (re)established");

    if let Some(snapshot) = snapshots.get_snapshot(GLOBAL_NODE) {
        if state.last_sent_version != Some(snapshot.version) {
            return send_snapshot(&type_url, &snapshot, subscribed, metrics, tx).await;
        }
    }
    true
}

async fn send_snapshot(
    type_url: &str,
    snapshot: &Snapshot,
    subscribed: &mut HashMap<String, TypeState>,
    metrics: &MetricsCollector,
    tx: &mpsc::Sender<Result<DiscoveryResponse, Status>>,
) -> bool {
    let resources = resources_for_type(&snapshot.resources, type_url);
    let nonce = format!("{}-{}", snapshot.version, type_url.len());

    let response = DiscoveryResponse {
        version_info: snapshot.version.to_string(),
        resources,
        type_url: type_url.to_string(),
        nonce: nonce.clone(),
        ..Default::default()
    };

    if let Some(state) = subscribed.get_mut(type_url) {
        state.last_sent_version = Some(snapshot.version);
        state.last_sent_nonce = Some(nonce);
    }

    metrics.record_push(type_url);
    info!(%type_url, version = snapshot.version, "xds: pushed snapshot");
    tx.send(Ok(response)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::LISTENER_TYPE_URL;
    use envoy_types::pb::google::rpc::Status as RpcStatus;
    use gatewayctl_translator::ResourceBundle;

    fn discovery_request(type_url: &str, nonce: &str, nacked: bool) -> DiscoveryRequest {
        DiscoveryRequest {
            type_url: type_url.to_string(),
            response_nonce: nonce.to_string(),
            error_detail: if nacked {
                Some(RpcStatus { code: 13, message: "bad config".to_string(), details: vec![] })
            } else {
                None
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn nack_is_counted_only_against_the_nonce_it_was_sent_for() {
        let snapshots = SnapshotCache::new();
        snapshots.set_snapshot(GLOBAL_NODE, Snapshot { version: 1, resources: ResourceBundle::default() });
        let metrics = MetricsCollector::new().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let mut subscribed = HashMap::new();

        handle_request(&discovery_request(LISTENER_TYPE_URL, "", false), "envoy-1", &mut subscribed, &snapshots, &metrics, &tx)
            .await;
        let pushed = rx.recv().await.unwrap().unwrap();
        assert_eq!(pushed.version_info, "1");

        handle_request(
            &discovery_request(LISTENER_TYPE_URL, &pushed.nonce, true),
            "envoy-1",
            &mut subscribed,
            &snapshots,
            &metrics,
            &tx,
        )
        .await;
        let text = metrics.gather_text();
        assert!(text.contains("gatewayctl_xds_nack_total"));

        snapshots.set_snapshot(GLOBAL_NODE, Snapshot { version: 2, resources: ResourceBundle::default() });
        handle_request(&discovery_request(LISTENER_TYPE_URL, &pushed.nonce, false), "envoy-1", &mut subscribed, &snapshots, &metrics, &tx)
            .await;
        let next = rx.recv().await.unwrap().unwrap();
        assert_eq!(next.version_info, "2");
    }

    #[tokio::test]
    async fn stale_nonce_is_ignored() {
        let snapshots = SnapshotCache::new();
        snapshots.set_snapshot(GLOBAL_NODE, Snapshot { version: 1, resources: ResourceBundle::default() });
        let metrics = MetricsCollector::new().unwrap();
        let (tx, _rx) = mpsc::channel(4);
        let mut subscribed = HashMap::new();

        let sent = handle_request(
            &discovery_request(LISTENER_TYPE_URL, "not-a-real-nonce", false),
            "envoy-1",
            &mut subscribed,
            &snapshots,
            &metrics,
            &tx,
        )
        .await;
        assert!(sent);
        assert!(subscribed.get(LISTENER_TYPE_URL).unwrap().last_sent_version.is_none());
    }
}
