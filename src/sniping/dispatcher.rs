// DANS : src/sniping/dispatcher.rs

use super::{
    ChainGateway, DispatchDecision, HandleOutcome, LogEvent, PendingSnipeList, PoolCandidate,
    SeenSignatures, SkipReason,
};
use crate::config::Config;
use crate::decoders::raydium::amm_v4::extract_market_and_lp_info;
use crate::monitoring::metrics;
use solana_sdk::signature::Signature;
use std::{
    str::FromStr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Symbole cible, en minuscules.
    pub target_symbol: String,
    pub check_token_symbol: bool,
    pub use_pending_snipe_list: bool,
}

impl From<&Config> for DispatcherSettings {
    fn from(config: &Config) -> Self {
        Self {
            target_symbol: config.target_symbol(),
            check_token_symbol: config.check_token_symbol,
            use_pending_snipe_list: config.use_pending_snipe_list,
        }
    }
}

fn system_unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Traite chaque notification de logs : déduplication, résolution du pool,
/// filtre, attente de l'ouverture puis transmission à l'exécution.
/// Partagé entre toutes les tâches via `Arc`.
pub struct Dispatcher {
    gateway: Arc<dyn ChainGateway>,
    seen: SeenSignatures,
    pending: PendingSnipeList,
    settings: DispatcherSettings,
    dispatch_tx: mpsc::Sender<DispatchDecision>,
    shutdown: CancellationToken,
    clock: Arc<dyn Fn() -> u64 + Send + Sync>,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        seen: SeenSignatures,
        pending: PendingSnipeList,
        settings: DispatcherSettings,
        dispatch_tx: mpsc::Sender<DispatchDecision>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            seen,
            pending,
            settings,
            dispatch_tx,
            shutdown,
            clock: Arc::new(system_unix_now),
        }
    }

    /// Remplace l'horloge Unix (secondes) utilisée pour calculer l'attente.
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn seen_signatures(&self) -> &SeenSignatures {
        &self.seen
    }

    fn skip(&self, reason: SkipReason) -> HandleOutcome {
        metrics::CANDIDATES_SKIPPED.with_label_values(&[reason.as_str()]).inc();
        HandleOutcome::Skipped(reason)
    }

    pub async fn on_log_event(&self, event: LogEvent) -> HandleOutcome {
        let LogEvent { signature, logs, err } = event;

        // --- 1. Déduplication ---
        if err.is_some() {
            return self.skip(SkipReason::TransactionError);
        }
        if !self.seen.check_and_insert(&signature) {
            return self.skip(SkipReason::Duplicate);
        }
        info!(%signature, "Nouvelle signature trouvée");

        let Ok(parsed_signature) = Signature::from_str(&signature) else {
            error!(%signature, "Signature illisible");
            return self.skip(SkipReason::InvalidSignature);
        };

        // --- 2. Transaction confirmée ---
        match self.gateway.fetch_transaction(&parsed_signature).await {
            Ok(Some(tx)) if tx.failed => return self.skip(SkipReason::TransactionFailed),
            Ok(Some(tx)) => info!(%signature, slot = tx.slot, "Transaction récupérée"),
            Ok(None) => {
                info!(%signature, "Transaction introuvable");
                return self.skip(SkipReason::TransactionUnavailable);
            }
            Err(e) => {
                error!(%signature, error = %e, "Récupération de la transaction échouée");
                return self.skip(SkipReason::TransactionUnavailable);
            }
        }

        // --- 3. Marché et clés du pool ---
        let market_info = match extract_market_and_lp_info(&logs) {
            Ok(info) => info,
            Err(e) => {
                error!(%signature, error = %e, "Logs de création illisibles");
                return self.skip(SkipReason::MalformedLogs);
            }
        };
        let pool_keys = match self.gateway.fetch_pool_keys(&market_info.market_id).await {
            Ok(Some(keys)) => keys,
            Ok(None) => {
                error!(%signature, market = %market_info.market_id, "Impossible d'extraire les clés du pool");
                return self.skip(SkipReason::PoolKeysUnresolved);
            }
            Err(e) => {
                error!(%signature, market = %market_info.market_id, error = %e, "Impossible d'extraire les clés du pool");
                return self.skip(SkipReason::PoolKeysUnresolved);
            }
        };
        let base_mint = pool_keys.base_mint;

        // --- 4. Snipe list ---
        let pending = self.settings.use_pending_snipe_list && self.pending.contains(&base_mint);

        // --- 5. Filtre de symbole ---
        let mut metadata = None;
        if !pending {
            let token_metadata = match self.gateway.fetch_token_metadata(&base_mint).await {
                Ok(Some(m)) if !m.symbol.is_empty() => m,
                Ok(_) => {
                    info!(mint = %base_mint, "Métadonnées du token introuvables, ignoré");
                    return self.skip(SkipReason::MetadataMissing);
                }
                Err(e) => {
                    error!(mint = %base_mint, error = %e, "Récupération des métadonnées échouée");
                    return self.skip(SkipReason::MetadataMissing);
                }
            };

            let symbol_matches = self.settings.check_token_symbol
                && token_metadata.symbol.to_lowercase() == self.settings.target_symbol;
            if !symbol_matches {
                info!(mint = %base_mint, symbol = %token_metadata.symbol, "Symbole hors filtre, token ignoré");
                return self.skip(SkipReason::SymbolMismatch);
            }
            metadata = Some(token_metadata);
        }

        let candidate = PoolCandidate {
            signature,
            market_id: market_info.market_id,
            lp_info: market_info.lp_info,
            pool_keys,
            metadata,
            pending,
        };

        // --- 6. Attente de l'ouverture du pool ---
        let now = (self.clock)();
        let delay = Duration::from_secs(candidate.pool_keys.pool_open_time.saturating_sub(now));
        if !delay.is_zero() {
            info!(mint = %base_mint, delay_secs = delay.as_secs(), "Attente de l'ouverture du pool");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.cancelled() => {
                    warn!(mint = %base_mint, "Arrêt demandé pendant l'attente, candidat abandonné");
                    return self.skip(SkipReason::Cancelled);
                }
            }
        }

        // --- 7. Dispatch ---
        info!(mint = %base_mint, pool = %candidate.pool_keys.id, pending, "Exécution des actions pour le token");
        let decided_at = UNIX_EPOCH + Duration::from_secs((self.clock)());
        let decision = DispatchDecision { candidate, delay, decided_at };
        metrics::DISPATCHES_EMITTED.inc();
        if let Err(e) = self.dispatch_tx.send(decision.clone()).await {
            error!(error = %e, "Canal d'exécution fermé, décision perdue");
        }
        HandleOutcome::Dispatched(decision)
    }
}
