// DANS : src/config.rs

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::time::Duration;

/// Quels logs on demande au nœud via `logsSubscribe`.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogSubscriptionFilter {
    /// Toutes les transactions du cluster (comportement historique du bot).
    All,
    /// Uniquement les transactions qui mentionnent le programme Raydium AMM v4.
    Raydium,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub solana_rpc_url: String,
    pub solana_wss_url: String,

    #[serde(default)]
    pub token_symbol_filter: String,
    #[serde(default = "default_true")]
    pub check_token_symbol: bool,

    #[serde(default)]
    pub use_pending_snipe_list: bool,
    #[serde(default = "default_snipe_list_file")]
    pub snipe_list_file: String,
    #[serde(default = "default_snipe_list_refresh_interval_ms")]
    pub snipe_list_refresh_interval_ms: u64,

    #[serde(default = "default_seen_signatures_capacity")]
    pub seen_signatures_capacity: usize,
    #[serde(default = "default_seen_signatures_ttl_secs")]
    pub seen_signatures_ttl_secs: u64,

    #[serde(default = "default_log_subscription_filter")]
    pub log_subscription_filter: LogSubscriptionFilter,

    /// Port du serveur Prometheus. `0` le désactive.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_true() -> bool { true }
fn default_snipe_list_file() -> String { "snipe-list.txt".to_string() }
fn default_snipe_list_refresh_interval_ms() -> u64 { 20_000 }
fn default_seen_signatures_capacity() -> usize { 100_000 }
fn default_seen_signatures_ttl_secs() -> u64 { 3_600 }
fn default_log_subscription_filter() -> LogSubscriptionFilter { LogSubscriptionFilter::All }
fn default_metrics_port() -> u16 { 9100 }

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>().context("Configuration invalide dans l'environnement")?;
        config.validate()?;
        Ok(config)
    }

    /// Même chose que `load`, mais à partir d'un itérateur de paires (tests, outils).
    pub fn from_iter<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars).context("Configuration invalide")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.seen_signatures_capacity == 0 {
            bail!("SEEN_SIGNATURES_CAPACITY doit être strictement positif");
        }
        if self.use_pending_snipe_list && self.snipe_list_refresh_interval_ms == 0 {
            bail!("SNIPE_LIST_REFRESH_INTERVAL_MS doit être strictement positif");
        }
        Ok(())
    }

    /// Le symbole cible, déjà normalisé en minuscules.
    pub fn target_symbol(&self) -> String {
        self.token_symbol_filter.trim().to_lowercase()
    }

    pub fn seen_signatures_ttl(&self) -> Duration {
        Duration::from_secs(self.seen_signatures_ttl_secs)
    }

    pub fn snipe_list_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.snipe_list_refresh_interval_ms)
    }
}
