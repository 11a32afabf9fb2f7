// src/decoders/raydium/amm_v4/events.rs

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

pub const RAY_LOG_PREFIX: &str = "Program log: ray_log: ";

/// Discriminant du premier octet d'un `ray_log`.
const LOG_TYPE_INIT: u8 = 0;

/// Taille exacte d'un `ray_log` d'initialisation :
/// log_type (1) + open_time (8) + 2 décimales (2) + 4 u64 (32) + market (32).
pub const INIT_LOG_LEN: usize = 75;

/// Événement émis par `initialize2` lors de la création d'un pool AMM v4.
/// L'ordre des champs est crucial pour le décodage.
#[derive(BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RayInitLog {
    pub log_type: u8,
    pub open_time: u64,
    pub quote_decimals: u8,
    pub base_decimals: u8,
    pub quote_lot_size: u64,
    pub base_lot_size: u64,
    pub quote_amount: u64,
    pub base_amount: u64,
    pub market: Pubkey,
}

/// Ce que les logs de création nous apprennent : le marché OpenBook
/// et l'état initial de la liquidité.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketAndLpInfo {
    pub market_id: Pubkey,
    pub lp_info: RayInitLog,
}

fn decode_init_log(data_str: &str) -> Option<RayInitLog> {
    let bytes = STANDARD.decode(data_str.trim()).ok()?;
    if bytes.len() != INIT_LOG_LEN || bytes[0] != LOG_TYPE_INIT {
        return None;
    }
    RayInitLog::try_from_slice(&bytes).ok()
}

/// Retourne le premier `ray_log` d'initialisation trouvé dans les logs.
/// Les `ray_log` de swap / dépôt / retrait sont ignorés.
pub fn parse_init_log(logs: &[String]) -> Option<RayInitLog> {
    logs.iter()
        .filter_map(|log| log.strip_prefix(RAY_LOG_PREFIX))
        .find_map(decode_init_log)
}

/// Extrait l'identifiant du marché et les infos LP d'une transaction de création.
pub fn extract_market_and_lp_info(logs: &[String]) -> Result<MarketAndLpInfo> {
    if !logs.iter().any(|log| log.starts_with(RAY_LOG_PREFIX)) {
        return Err(anyhow!("Aucun ray_log dans les {} lignes de log", logs.len()));
    }
    let lp_info = parse_init_log(logs).context("Aucun ray_log d'initialisation décodable")?;
    Ok(MarketAndLpInfo { market_id: lp_info.market, lp_info })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn encode_init_log(open_time: u64, market: &Pubkey) -> String {
        let mut bytes = Vec::with_capacity(INIT_LOG_LEN);
        bytes.push(LOG_TYPE_INIT);
        bytes.extend_from_slice(&open_time.to_le_bytes());
        bytes.push(9); // quote_decimals
        bytes.push(6); // base_decimals
        bytes.extend_from_slice(&1_000u64.to_le_bytes());
        bytes.extend_from_slice(&100u64.to_le_bytes());
        bytes.extend_from_slice(&5_000_000_000u64.to_le_bytes());
        bytes.extend_from_slice(&1_000_000_000_000u64.to_le_bytes());
        bytes.extend_from_slice(market.as_ref());
        format!("{}{}", RAY_LOG_PREFIX, STANDARD.encode(bytes))
    }

    #[test]
    fn extracts_market_and_open_time() {
        let market = Pubkey::new_unique();
        let logs = vec![
            "Program 675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8 invoke [1]".to_string(),
            "Program log: initialize2: InitializeInstruction2 { nonce: 254, open_time: 1700000000 }".to_string(),
            encode_init_log(1_700_000_000, &market),
            "Program 675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8 success".to_string(),
        ];

        let info = extract_market_and_lp_info(&logs).unwrap();
        assert_eq!(info.market_id, market);
        assert_eq!(info.lp_info.open_time, 1_700_000_000);
        assert_eq!(info.lp_info.base_decimals, 6);
        assert_eq!(info.lp_info.quote_amount, 5_000_000_000);
    }

    #[test]
    fn swap_ray_log_is_not_an_init() {
        // Un SwapBaseIn : log_type = 3, taille différente.
        let mut bytes = vec![3u8];
        bytes.extend_from_slice(&[0u8; 56]);
        let logs = vec![format!("{}{}", RAY_LOG_PREFIX, STANDARD.encode(bytes))];

        assert!(parse_init_log(&logs).is_none());
        assert!(extract_market_and_lp_info(&logs).is_err());
    }

    #[test]
    fn logs_without_ray_log_are_rejected() {
        let logs = vec!["Program 11111111111111111111111111111111 invoke [1]".to_string()];
        assert!(extract_market_and_lp_info(&logs).is_err());
        assert!(extract_market_and_lp_info(&[]).is_err());
    }

    #[test]
    fn invalid_base64_is_skipped() {
        let market = Pubkey::new_unique();
        let logs = vec![
            format!("{}%%%not-base64%%%", RAY_LOG_PREFIX),
            encode_init_log(42, &market),
        ];
        assert_eq!(parse_init_log(&logs).map(|l| l.market), Some(market));
    }
}
