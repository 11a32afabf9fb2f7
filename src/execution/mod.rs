// DANS : src/execution/mod.rs

use crate::sniping::DispatchDecision;
use tokio::sync::mpsc;
use tracing::info;

/// Consomme les décisions du dispatcher jusqu'à la fermeture du canal.
/// Pour l'instant on journalise seulement le candidat : aucun achat n'est envoyé.
pub async fn run_executor(mut decisions: mpsc::Receiver<DispatchDecision>) -> usize {
    let mut handled = 0;
    while let Some(decision) = decisions.recv().await {
        let candidate = &decision.candidate;
        info!(
            mint = %candidate.base_mint(),
            pool = %candidate.pool_keys.id,
            market = %candidate.market_id,
            open_time = candidate.pool_keys.pool_open_time,
            delay_secs = decision.delay.as_secs(),
            pending = candidate.pending,
            symbol = candidate.metadata.as_ref().map(|m| m.symbol.as_str()).unwrap_or(""),
            "Exécution des actions pour le token"
        );
        handled += 1;
    }
    info!(handled, "Canal d'exécution fermé");
    handled
}
