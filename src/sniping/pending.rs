// DANS : src/sniping/pending.rs

use crate::monitoring::metrics;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use solana_sdk::pubkey::Pubkey;
use std::{io::ErrorKind, path::Path, str::FromStr, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// La snipe list : des mints de base pré-approuvés qui contournent le filtre de symbole.
/// Les lecteurs chargent un instantané sans verrou ; le rafraîchissement remplace la liste entière.
#[derive(Clone)]
pub struct PendingSnipeList {
    mints: Arc<ArcSwap<Vec<Pubkey>>>,
}

impl Default for PendingSnipeList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PendingSnipeList {
    pub fn new(mints: Vec<Pubkey>) -> Self {
        Self { mints: Arc::new(ArcSwap::from_pointee(mints)) }
    }

    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.mints.load().contains(mint)
    }

    pub fn snapshot(&self) -> Arc<Vec<Pubkey>> {
        self.mints.load_full()
    }

    pub fn replace(&self, mints: Vec<Pubkey>) {
        metrics::PENDING_SNIPE_LIST_SIZE.set(mints.len() as i64);
        self.mints.store(Arc::new(mints));
    }

    pub fn len(&self) -> usize {
        self.mints.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Un mint par ligne. Les lignes vides et les commentaires `#` sont ignorés,
/// les lignes invalides sont signalées puis ignorées. L'ordre est conservé.
pub fn parse_snipe_list(content: &str) -> Vec<Pubkey> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match Pubkey::from_str(line) {
                Ok(mint) => Some(mint),
                Err(e) => {
                    warn!(line = index + 1, value = line, error = %e, "Mint invalide dans la snipe list, ignoré");
                    None
                }
            }
        })
        .collect()
}

/// Un fichier absent donne une liste vide.
pub async fn load_snipe_list(path: &Path) -> Result<Vec<Pubkey>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(parse_snipe_list(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "Fichier de snipe list introuvable, liste vide");
            Ok(Vec::new())
        }
        Err(e) => Err(e).with_context(|| format!("Impossible de lire la snipe list '{}'", path.display())),
    }
}

/// Relit périodiquement le fichier jusqu'à l'annulation du token.
/// Une lecture en échec garde la liste précédente.
pub async fn monitor_snipe_list(
    list: PendingSnipeList,
    path: impl AsRef<Path>,
    refresh_interval: Duration,
    shutdown: CancellationToken,
) {
    let path = path.as_ref();
    let mut interval = tokio::time::interval(refresh_interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }
        match load_snipe_list(path).await {
            Ok(mints) => {
                if mints.as_slice() != list.snapshot().as_slice() {
                    info!(count = mints.len(), "Snipe list mise à jour");
                }
                list.replace(mints);
            }
            Err(e) => error!(error = %e, "Rafraîchissement de la snipe list échoué"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_order_and_skips_noise() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let content = format!("# tokens à surveiller\n{b}\n\n  {a}  \nnot-a-mint\n");

        assert_eq!(parse_snipe_list(&content), vec![b, a]);
    }

    #[test]
    fn replace_swaps_the_whole_list() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let list = PendingSnipeList::new(vec![a]);
        let reader = list.clone();

        assert!(reader.contains(&a));
        list.replace(vec![b]);
        assert!(!reader.contains(&a));
        assert!(reader.contains(&b));
        assert_eq!(reader.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_gives_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let mints = load_snipe_list(&dir.path().join("absent.txt")).await.unwrap();
        assert!(mints.is_empty());
    }

    #[tokio::test]
    async fn monitor_picks_up_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snipe-list.txt");
        let first = Pubkey::new_unique();
        tokio::fs::write(&path, format!("{first}\n")).await.unwrap();

        let list = PendingSnipeList::default();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(monitor_snipe_list(
            list.clone(),
            path.clone(),
            Duration::from_millis(20),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(list.contains(&first));

        let second = Pubkey::new_unique();
        tokio::fs::write(&path, format!("{second}\n")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(list.contains(&second));
        assert!(!list.contains(&first));

        shutdown.cancel();
        task.await.unwrap();
    }
}
