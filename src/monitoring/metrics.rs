// DANS : src/monitoring/metrics.rs

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use warp::Filter;

lazy_static! {
    // --- Flux de logs ---
    pub static ref LOG_NOTIFICATIONS_RECEIVED: IntCounter = register_int_counter!(
        "sniper_log_notifications_received_total", "Nombre total de notifications reçues de logsSubscribe"
    ).unwrap();
    pub static ref SEEN_SIGNATURES: IntGauge = register_int_gauge!(
        "sniper_seen_signatures", "Nombre de signatures actuellement retenues pour la déduplication"
    ).unwrap();
    pub static ref IN_FLIGHT_CANDIDATES: IntGauge = register_int_gauge!(
        "sniper_in_flight_candidates", "Nombre de handlers de notification en cours (y compris en attente d'ouverture)"
    ).unwrap();

    // --- Décisions ---
    pub static ref CANDIDATES_SKIPPED: IntCounterVec = register_int_counter_vec!(
        "sniper_candidates_skipped_total",
        "Candidats abandonnés, segmentés par raison",
        &["reason"] // Labels: "duplicate", "symbol_mismatch", ...
    ).unwrap();
    pub static ref DISPATCHES_EMITTED: IntCounter = register_int_counter!(
        "sniper_dispatches_emitted_total", "Nombre de décisions de dispatch émises"
    ).unwrap();
    pub static ref PENDING_SNIPE_LIST_SIZE: IntGauge = register_int_gauge!(
        "sniper_pending_snipe_list_size", "Nombre de mints dans la snipe list"
    ).unwrap();

    // --- RPC ---
    pub static ref RPC_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sniper_rpc_requests_total",
        "Compteur total des requêtes RPC, segmenté par méthode et statut",
        &["method", "status"] // Labels: "get_transaction", "success" / "failure"
    ).unwrap();
    pub static ref RPC_REQUEST_LATENCY: HistogramVec = register_histogram_vec!(
        "sniper_rpc_request_latency_seconds",
        "Latence des appels RPC vers le nœud Solana",
        &["method"]
    ).unwrap();
}

/// Sert `/metrics` jusqu'à l'annulation du token.
pub async fn start_metrics_server(port: u16, shutdown: CancellationToken) {
    let metrics_route = warp::path!("metrics").map(|| {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            error!(error = %e, "Encodage des métriques échoué");
        }
        warp::reply::with_header(buffer, "content-type", "text/plain; version=0.0.4")
    });

    match warp::serve(metrics_route)
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move { shutdown.cancelled().await })
    {
        Ok((addr, server)) => {
            info!(%addr, "Serveur de métriques exposé sur /metrics");
            server.await;
        }
        Err(e) => error!(error = %e, port, "Impossible de démarrer le serveur de métriques"),
    }
}
