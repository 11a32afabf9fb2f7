// DANS: src/decoders/raydium/amm_v4/openbook_market.rs

use anyhow::{Result, anyhow};
use bytemuck::{Pod, Zeroable, try_from_bytes};
use solana_sdk::pubkey::Pubkey;
use std::mem::size_of;

/// Le compte de marché commence par 5 octets de padding ("serum").
const MARKET_HEAD_PADDING: usize = 5;

/// MarketState v3 (Serum / OpenBook), tel qu'il est stocké après le padding de tête.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct MarketStateV3 {
    pub account_flags: u64,
    pub own_address: Pubkey,
    pub vault_signer_nonce: u64,
    pub coin_mint: Pubkey,
    pub pc_mint: Pubkey,
    pub coin_vault: Pubkey,
    pub coin_deposits_total: u64,
    pub coin_fees_accrued: u64,
    pub pc_vault: Pubkey,
    pub pc_deposits_total: u64,
    pub pc_fees_accrued: u64,
    pub pc_dust_threshold: u64,
    pub req_q: Pubkey,
    pub event_q: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub coin_lot_size: u64,
    pub pc_lot_size: u64,
    pub fee_rate_bps: u64,
    pub referrer_rebates_accrued: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMarket {
    pub address: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub event_queue: Pubkey,
    pub vault_signer_nonce: u64,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
}

pub fn decode_market(address: &Pubkey, data: &[u8]) -> Result<DecodedMarket> {
    let raw = data
        .get(MARKET_HEAD_PADDING..MARKET_HEAD_PADDING + size_of::<MarketStateV3>())
        .ok_or_else(|| anyhow!("Données du marché {} trop courtes ({} octets)", address, data.len()))?;
    let market: &MarketStateV3 = try_from_bytes(raw)
        .map_err(|e| anyhow!("Layout du marché {} invalide : {}", address, e))?;

    Ok(DecodedMarket {
        address: *address,
        base_mint: market.coin_mint,
        quote_mint: market.pc_mint,
        base_vault: market.coin_vault,
        quote_vault: market.pc_vault,
        bids: market.bids,
        asks: market.asks,
        event_queue: market.event_q,
        vault_signer_nonce: market.vault_signer_nonce,
        base_lot_size: market.coin_lot_size,
        quote_lot_size: market.pc_lot_size,
    })
}

/// Le "vault signer" du marché : PDA non canonique, dérivé avec le nonce stocké.
pub fn market_authority(market: &DecodedMarket, market_program_id: &Pubkey) -> Result<Pubkey> {
    Pubkey::create_program_address(
        &[&market.address.to_bytes(), &market.vault_signer_nonce.to_le_bytes()],
        market_program_id,
    )
    .map_err(|e| anyhow!("Dérivation du vault signer du marché {} échouée : {}", market.address, e))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bytemuck::bytes_of;

    /// Premier nonce qui donne un vault signer valide pour ce marché.
    fn valid_nonce(address: &Pubkey, market_program_id: &Pubkey) -> u64 {
        (0u64..)
            .find(|nonce| {
                Pubkey::create_program_address(&[&address.to_bytes(), &nonce.to_le_bytes()], market_program_id).is_ok()
            })
            .unwrap()
    }

    pub(crate) fn encode_market(address: &Pubkey, market_program_id: &Pubkey, base_mint: &Pubkey, quote_mint: &Pubkey) -> Vec<u8> {
        let state = MarketStateV3 {
            account_flags: 3,
            own_address: *address,
            vault_signer_nonce: valid_nonce(address, market_program_id),
            coin_mint: *base_mint,
            pc_mint: *quote_mint,
            coin_vault: Pubkey::new_unique(),
            coin_deposits_total: 0,
            coin_fees_accrued: 0,
            pc_vault: Pubkey::new_unique(),
            pc_deposits_total: 0,
            pc_fees_accrued: 0,
            pc_dust_threshold: 0,
            req_q: Pubkey::new_unique(),
            event_q: Pubkey::new_unique(),
            bids: Pubkey::new_unique(),
            asks: Pubkey::new_unique(),
            coin_lot_size: 100,
            pc_lot_size: 10,
            fee_rate_bps: 0,
            referrer_rebates_accrued: 0,
        };
        let mut data = b"serum".to_vec();
        data.extend_from_slice(bytes_of(&state));
        data.extend_from_slice(b"padding");
        data
    }

    #[test]
    fn decodes_market_after_head_padding() {
        let address = Pubkey::new_unique();
        let base = Pubkey::new_unique();
        let quote = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let data = encode_market(&address, &program, &base, &quote);
        assert_eq!(data.len(), 388);

        let market = decode_market(&address, &data).unwrap();
        assert_eq!(market.base_mint, base);
        assert_eq!(market.quote_mint, quote);
        assert_eq!(market.base_lot_size, 100);
        assert!(market_authority(&market, &program).is_ok());
    }

    #[test]
    fn short_market_is_rejected() {
        let address = Pubkey::new_unique();
        assert!(decode_market(&address, &[0u8; 64]).is_err());
    }
}
