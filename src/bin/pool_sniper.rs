use anyhow::Result;
use sniper::{
    config::Config,
    execution::run_executor,
    monitoring::{logging, metrics},
    rpc::{MeteredRpcClient, RpcChainGateway},
    sniping::{
        pending::{load_snipe_list, monitor_snipe_list},
        Dispatcher, DispatcherSettings, LogWatcher, PendingSnipeList, SeenSignatures,
    },
};
use std::{path::Path, sync::Arc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DISPATCH_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    logging::setup_logging()?;
    info!("--- Lancement du Pool Sniper ---");

    // --- Initialisation ---
    let config = Config::load()?;
    let shutdown = CancellationToken::new();

    if config.metrics_port != 0 {
        tokio::spawn(metrics::start_metrics_server(config.metrics_port, shutdown.clone()));
    }

    let pending = PendingSnipeList::default();
    if config.use_pending_snipe_list {
        pending.replace(load_snipe_list(Path::new(&config.snipe_list_file)).await?);
        info!(count = pending.len(), file = %config.snipe_list_file, "Snipe list chargée");
        tokio::spawn(monitor_snipe_list(
            pending.clone(),
            config.snipe_list_file.clone(),
            config.snipe_list_refresh_interval(),
            shutdown.clone(),
        ));
    }

    // --- Architecture ---
    let gateway = Arc::new(RpcChainGateway::new(MeteredRpcClient::new(config.solana_rpc_url.clone())));
    let (dispatch_tx, dispatch_rx) = mpsc::channel(DISPATCH_CHANNEL_CAPACITY);
    let executor = tokio::spawn(run_executor(dispatch_rx));

    let dispatcher = Arc::new(Dispatcher::new(
        gateway,
        SeenSignatures::new(config.seen_signatures_capacity, config.seen_signatures_ttl()),
        pending,
        DispatcherSettings::from(&config),
        dispatch_tx,
        shutdown.clone(),
    ));

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C reçu, arrêt en cours...");
            ctrl_c_token.cancel();
        }
    });

    // --- Boucle principale ---
    info!("Surveillance des nouveaux tokens Solana...");
    let watcher = LogWatcher::new(config.solana_wss_url.clone(), config.log_subscription_filter);
    let result = watcher.run(dispatcher.clone(), shutdown.clone()).await;
    if let Err(e) = &result {
        error!(error = ?e, "Erreur critique du flux de logs");
    }

    shutdown.cancel();
    // Le dernier émetteur disparaît avec le dispatcher, ce qui ferme le canal d'exécution.
    drop(dispatcher);
    match executor.await {
        Ok(handled) => info!(handled, "Arrêt terminé"),
        Err(e) => error!(error = %e, "La tâche d'exécution a paniqué"),
    }
    result
}
