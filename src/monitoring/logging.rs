// DANS : src/monitoring/logging.rs
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Le client websocket et le serveur de métriques sont très bavards en `info`.
const DEFAULT_DIRECTIVES: &str = "info,solana_client=warn,solana_pubsub_client=warn,warp=warn,hyper=warn";

/// RUST_LOG s'il est défini et valide, sinon les directives par défaut.
fn build_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Logs JSON sur stdout. Chaque événement porte le span courant,
/// donc la signature en cours de traitement (`log_event`).
/// La fermeture d'un span `log_event` donne la durée totale du candidat.
pub fn setup_logging() -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();

    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_env_filter(build_filter(rust_log.as_deref()))
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("Initialisation du logging échouée : {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_quiets_the_websocket_client() {
        let filter = build_filter(None).to_string();
        assert!(filter.contains("solana_pubsub_client=warn"));
        assert!(filter.contains("info"));
    }

    #[test]
    fn rust_log_overrides_the_defaults() {
        let filter = build_filter(Some("sniper=debug")).to_string();
        assert!(filter.contains("sniper=debug"));
        assert!(!filter.contains("solana_pubsub_client"));
    }
}
