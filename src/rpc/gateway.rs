use super::MeteredRpcClient;
use crate::decoders::raydium::amm_v4::{decode_amm_info, decode_market, derive_associated_keys, PoolKeys};
use crate::decoders::token_metadata::{decode_metadata, derive_metadata_address, TokenMetadata};
use crate::sniping::{ChainGateway, ConfirmedTransaction};
use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::{debug, warn};

/// Implémentation réseau de `ChainGateway` au-dessus du RPC HTTP.
pub struct RpcChainGateway {
    client: MeteredRpcClient,
}

impl RpcChainGateway {
    pub fn new(client: MeteredRpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChainGateway for RpcChainGateway {
    async fn fetch_transaction(&self, signature: &Signature) -> Result<Option<ConfirmedTransaction>> {
        let Some(tx) = self.client.get_transaction(signature).await? else {
            return Ok(None);
        };
        let failed = tx
            .transaction
            .meta
            .as_ref()
            .map(|meta| meta.err.is_some())
            .unwrap_or(false);
        Ok(Some(ConfirmedTransaction { slot: tx.slot, failed }))
    }

    async fn fetch_pool_keys(&self, market_id: &Pubkey) -> Result<Option<PoolKeys>> {
        let associated = derive_associated_keys(market_id);
        let amm_id = associated.id;
        let mut accounts = self.client.get_multiple_accounts(&[*market_id, amm_id]).await?.into_iter();

        let (Some(Some(market_account)), Some(Some(amm_account))) = (accounts.next(), accounts.next()) else {
            debug!(market = %market_id, amm = %amm_id, "Marché ou pool absent");
            return Ok(None);
        };
        let market = decode_market(market_id, &market_account.data)?;
        let amm = decode_amm_info(&amm_id, &amm_account.data)?;
        if amm.open_orders != associated.open_orders || amm.base_vault != associated.base_vault {
            warn!(amm = %amm_id, "Comptes du pool différents des PDAs associés, on garde ceux du compte AMM");
        }
        Ok(Some(PoolKeys::assemble(&amm, &market)?))
    }

    async fn fetch_token_metadata(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>> {
        let metadata_address = derive_metadata_address(mint);
        let accounts = self.client.get_multiple_accounts(&[metadata_address]).await?;
        match accounts.into_iter().next().flatten() {
            Some(account) => Ok(Some(decode_metadata(mint, &account.data)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use solana_client::{nonblocking::rpc_client::RpcClient, rpc_request::RpcRequest};
    use std::{collections::HashMap, sync::Arc};

    #[tokio::test]
    async fn transaction_not_yet_indexed_reads_as_absent() {
        let rpc = RpcClient::new_mock_with_mocks(
            "succeeds".to_string(),
            HashMap::from([(RpcRequest::GetTransaction, Value::Null)]),
        );
        let gateway = RpcChainGateway::new(MeteredRpcClient::from_client(Arc::new(rpc)));

        let tx = gateway.fetch_transaction(&Signature::default()).await.unwrap();
        assert_eq!(tx, None);
    }
}
