use crate::monitoring::metrics;
use anyhow::{Context, Result};
use serde_json::json;
use solana_client::{
    client_error::ClientError, nonblocking::rpc_client::RpcClient, rpc_config::RpcTransactionConfig,
    rpc_request::RpcRequest,
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature,
};
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::{future::Future, sync::Arc, time::Instant};

/// Un "wrapper" autour du RpcClient de Solana qui compte et chronomètre chaque appel.
/// Aucun ré-essai : un appel en échec remonte tel quel à l'appelant.
#[derive(Clone)]
pub struct MeteredRpcClient {
    client: Arc<RpcClient>,
}

impl MeteredRpcClient {
    pub fn new(rpc_url: String) -> Self {
        Self {
            client: Arc::new(RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed())),
        }
    }

    pub fn from_client(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    async fn observe<T, F>(method: &'static str, call: F) -> std::result::Result<T, ClientError>
    where
        F: Future<Output = std::result::Result<T, ClientError>>,
    {
        let started = Instant::now();
        let result = call.await;
        metrics::RPC_REQUEST_LATENCY
            .with_label_values(&[method])
            .observe(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "success" } else { "failure" };
        metrics::RPC_REQUESTS_TOTAL.with_label_values(&[method, status]).inc();
        result
    }

    /// Transaction complète, encodage jsonParsed, versions <= 0 acceptées.
    /// Le nœud répond `null` tant que la transaction n'est pas indexée : on rend alors `None`.
    pub async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<EncodedConfirmedTransactionWithStatusMeta>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        let params = json!([signature.to_string(), config]);
        Self::observe("get_transaction", self.client.send(RpcRequest::GetTransaction, params))
            .await
            .with_context(|| format!("getTransaction a échoué pour {}", signature))
    }

    pub async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> Result<Vec<Option<Account>>> {
        Self::observe("get_multiple_accounts", self.client.get_multiple_accounts(pubkeys))
            .await
            .with_context(|| format!("getMultipleAccounts a échoué pour {} comptes", pubkeys.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::collections::HashMap;

    #[tokio::test]
    async fn unindexed_transaction_is_none() {
        let rpc = RpcClient::new_mock_with_mocks(
            "succeeds".to_string(),
            HashMap::from([(RpcRequest::GetTransaction, Value::Null)]),
        );
        let client = MeteredRpcClient::from_client(Arc::new(rpc));

        let tx = client.get_transaction(&Signature::default()).await.unwrap();
        assert!(tx.is_none());
    }

    #[tokio::test]
    async fn rpc_failure_is_an_error() {
        let client = MeteredRpcClient::from_client(Arc::new(RpcClient::new_mock("fails".to_string())));
        assert!(client.get_transaction(&Signature::default()).await.is_err());
    }
}
