// DANS : src/sniping/mod.rs

use crate::decoders::raydium::amm_v4::RayInitLog;
use crate::decoders::{PoolKeys, TokenMetadata};
use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::fmt;
use std::time::{Duration, SystemTime};

pub mod dispatcher;
pub mod pending;
pub mod seen;
pub mod watcher;

pub use dispatcher::{Dispatcher, DispatcherSettings};
pub use pending::PendingSnipeList;
pub use seen::SeenSignatures;
pub use watcher::LogWatcher;

/// Une notification `logsSubscribe`, réduite à ce dont le dispatcher a besoin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub signature: String,
    pub logs: Vec<String>,
    /// Erreur de la transaction rapportée par le nœud, le cas échéant.
    pub err: Option<String>,
}

/// Le strict nécessaire d'une transaction confirmée.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    pub slot: u64,
    pub failed: bool,
}

/// Les appels réseau dont le dispatcher dépend.
/// `Ok(None)` signifie "n'existe pas", `Err` signifie "le nœud n'a pas pu répondre".
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn fetch_transaction(&self, signature: &Signature) -> Result<Option<ConfirmedTransaction>>;
    async fn fetch_pool_keys(&self, market_id: &Pubkey) -> Result<Option<PoolKeys>>;
    async fn fetch_token_metadata(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCandidate {
    pub signature: String,
    pub market_id: Pubkey,
    pub lp_info: RayInitLog,
    pub pool_keys: PoolKeys,
    /// `None` pour un candidat de la snipe list : on ne va pas chercher ses métadonnées.
    pub metadata: Option<TokenMetadata>,
    pub pending: bool,
}

impl PoolCandidate {
    pub fn base_mint(&self) -> Pubkey {
        self.pool_keys.base_mint
    }
}

/// Le point de passage vers l'exécution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchDecision {
    pub candidate: PoolCandidate,
    /// Attente effectivement appliquée avant l'ouverture du pool.
    pub delay: Duration,
    pub decided_at: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    TransactionError,
    Duplicate,
    InvalidSignature,
    TransactionUnavailable,
    TransactionFailed,
    MalformedLogs,
    PoolKeysUnresolved,
    MetadataMissing,
    SymbolMismatch,
    Cancelled,
}

impl SkipReason {
    /// Label Prometheus.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::TransactionError => "transaction_error",
            SkipReason::Duplicate => "duplicate",
            SkipReason::InvalidSignature => "invalid_signature",
            SkipReason::TransactionUnavailable => "transaction_unavailable",
            SkipReason::TransactionFailed => "transaction_failed",
            SkipReason::MalformedLogs => "malformed_logs",
            SkipReason::PoolKeysUnresolved => "pool_keys_unresolved",
            SkipReason::MetadataMissing => "metadata_missing",
            SkipReason::SymbolMismatch => "symbol_mismatch",
            SkipReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Dispatched(DispatchDecision),
    Skipped(SkipReason),
}

impl HandleOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, HandleOutcome::Skipped(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            HandleOutcome::Skipped(reason) => Some(*reason),
            HandleOutcome::Dispatched(_) => None,
        }
    }
}
