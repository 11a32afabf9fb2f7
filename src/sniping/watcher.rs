// DANS : src/sniping/watcher.rs

use super::{Dispatcher, LogEvent};
use crate::config::LogSubscriptionFilter;
use crate::decoders::raydium::amm_v4::RAYDIUM_AMM_V4_PROGRAM_ID;
use crate::monitoring::metrics;
use anyhow::{Context, Result, bail};
use futures_util::{Stream, StreamExt};
use solana_client::{
    nonblocking::pubsub_client::PubsubClient,
    rpc_config::{RpcTransactionLogsConfig, RpcTransactionLogsFilter},
    rpc_response::RpcLogsResponse,
};
use solana_sdk::commitment_config::CommitmentConfig;
use std::sync::Arc;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{Instrument, info, info_span, warn};

impl From<RpcLogsResponse> for LogEvent {
    fn from(response: RpcLogsResponse) -> Self {
        Self {
            signature: response.signature,
            logs: response.logs,
            err: response.err.map(|e| format!("{:?}", e)),
        }
    }
}

impl LogSubscriptionFilter {
    fn to_rpc_filter(self) -> RpcTransactionLogsFilter {
        match self {
            LogSubscriptionFilter::All => RpcTransactionLogsFilter::All,
            LogSubscriptionFilter::Raydium => {
                RpcTransactionLogsFilter::Mentions(vec![RAYDIUM_AMM_V4_PROGRAM_ID.to_string()])
            }
        }
    }
}

/// Écoute `logsSubscribe` et lance une tâche indépendante par notification.
pub struct LogWatcher {
    wss_url: String,
    filter: LogSubscriptionFilter,
}

impl LogWatcher {
    pub fn new(wss_url: String, filter: LogSubscriptionFilter) -> Self {
        Self { wss_url, filter }
    }

    /// Ne rend la main qu'à l'annulation du token (Ok) ou si le flux se coupe (Err).
    /// Dans les deux cas, les tâches en vol sont attendues avant de sortir.
    pub async fn run(&self, dispatcher: Arc<Dispatcher>, shutdown: CancellationToken) -> Result<()> {
        info!(wss_url = %self.wss_url, filter = ?self.filter, "Connexion au flux de logs");
        let client = PubsubClient::new(&self.wss_url)
            .await
            .with_context(|| format!("Connexion websocket à {} échouée", self.wss_url))?;

        let config = RpcTransactionLogsConfig { commitment: Some(CommitmentConfig::confirmed()) };
        let (stream, unsubscribe) = client
            .logs_subscribe(self.filter.to_rpc_filter(), config)
            .await
            .context("Abonnement logsSubscribe refusé")?;
        info!("Abonnement réussi. Surveillance des nouveaux pools...");

        let stream_ended = pump_events(stream.map(|response| LogEvent::from(response.value)), dispatcher, &shutdown).await;
        unsubscribe().await;

        if stream_ended {
            bail!("Le flux logsSubscribe s'est terminé");
        }
        Ok(())
    }
}

/// Distribue chaque événement à sa propre tâche jusqu'à la fin du flux ou l'annulation,
/// puis attend la fin des tâches en vol. Retourne `true` si le flux s'est terminé de lui-même.
pub async fn pump_events<S>(events: S, dispatcher: Arc<Dispatcher>, shutdown: &CancellationToken) -> bool
where
    S: Stream<Item = LogEvent>,
{
    let tracker = TaskTracker::new();
    let mut events = std::pin::pin!(events);

    let stream_ended = loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break false,
            next = events.next() => match next {
                Some(event) => event,
                None => break true,
            },
        };
        metrics::LOG_NOTIFICATIONS_RECEIVED.inc();

        let dispatcher = dispatcher.clone();
        let span = info_span!("log_event", signature = %event.signature);
        tracker.spawn(
            async move {
                metrics::IN_FLIGHT_CANDIDATES.inc();
                dispatcher.on_log_event(event).await;
                metrics::IN_FLIGHT_CANDIDATES.dec();
            }
            .instrument(span),
        );
    };

    if stream_ended {
        // Plus rien n'arrivera : on n'attend pas l'ouverture des pools encore en suspens.
        warn!("Flux de logs terminé, abandon des candidats en attente");
        shutdown.cancel();
    }
    tracker.close();
    info!(in_flight = tracker.len(), "Attente des tâches en vol");
    tracker.wait().await;
    stream_ended
}
