// DANS: src/decoders/raydium/amm_v4/pool.rs

use anyhow::{Result, bail};
use bytemuck::{Pod, Zeroable, try_from_bytes};
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;
use std::mem::size_of;

use super::openbook_market::{DecodedMarket, market_authority};

pub const RAYDIUM_AMM_V4_PROGRAM_ID: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

// Les structures on-chain du programme AMM v4.
#[repr(C, packed)] #[derive(Clone, Copy, Pod, Zeroable, Debug)] pub struct Fees { pub min_separate_numerator: u64, pub min_separate_denominator: u64, pub trade_fee_numerator: u64, pub trade_fee_denominator: u64, pub pnl_numerator: u64, pub pnl_denominator: u64, pub swap_fee_numerator: u64, pub swap_fee_denominator: u64, }
#[repr(C, packed)] #[derive(Clone, Copy, Pod, Zeroable, Debug)] pub struct OutPutData { pub need_take_pnl_coin: u64, pub need_take_pnl_pc: u64, pub total_pnl_pc: u64, pub total_pnl_coin: u64, pub pool_open_time: u64, pub punish_pc_amount: u64, pub punish_coin_amount: u64, pub orderbook_to_init_time: u64, pub swap_coin_in_amount: u128, pub swap_pc_out_amount: u128, pub swap_take_pc_fee: u64, pub swap_pc_in_amount: u128, pub swap_coin_out_amount: u128, pub swap_take_coin_fee: u64, }
#[repr(C, packed)] #[derive(Clone, Copy, Pod, Zeroable, Debug)] pub struct AmmInfoData { pub status: u64, pub nonce: u64, pub order_num: u64, pub depth: u64, pub coin_decimals: u64, pub pc_decimals: u64, pub state: u64, pub reset_flag: u64, pub min_size: u64, pub vol_max_cut_ratio: u64, pub amount_wave: u64, pub coin_lot_size: u64, pub pc_lot_size: u64, pub min_price_multiplier: u64, pub max_price_multiplier: u64, pub sys_decimal_value: u64, pub fees: Fees, pub out_put: OutPutData, pub token_coin: Pubkey, pub token_pc: Pubkey, pub coin_mint: Pubkey, pub pc_mint: Pubkey, pub lp_mint: Pubkey, pub open_orders: Pubkey, pub market: Pubkey, pub serum_dex: Pubkey, pub target_orders: Pubkey, pub withdraw_queue: Pubkey, pub token_temp_lp: Pubkey, pub amm_owner: Pubkey, pub lp_amount: u64, pub client_order_id: u64, pub padding: [u64; 2], }

/// Ce qu'on garde du compte AMM. "coin" = base, "pc" = quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAmmInfo {
    pub address: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub withdraw_queue: Pubkey,
    pub lp_vault: Pubkey,
    pub market: Pubkey,
    pub market_program_id: Pubkey,
    pub pool_open_time: u64,
}

pub fn decode_amm_info(address: &Pubkey, data: &[u8]) -> Result<DecodedAmmInfo> {
    if data.len() < size_of::<AmmInfoData>() { bail!("AMM V4 data length mismatch ({} octets).", data.len()); }
    let Ok(pool_struct) = try_from_bytes::<AmmInfoData>(&data[..size_of::<AmmInfoData>()]) else {
        bail!("Layout AMM V4 invalide pour {}.", address);
    };
    if pool_struct.status == 0 { bail!("Pool {} is not initialized.", address); }

    Ok(DecodedAmmInfo {
        address: *address,
        base_mint: pool_struct.coin_mint,
        quote_mint: pool_struct.pc_mint,
        lp_mint: pool_struct.lp_mint,
        base_decimals: pool_struct.coin_decimals as u8,
        quote_decimals: pool_struct.pc_decimals as u8,
        base_vault: pool_struct.token_coin,
        quote_vault: pool_struct.token_pc,
        open_orders: pool_struct.open_orders,
        target_orders: pool_struct.target_orders,
        withdraw_queue: pool_struct.withdraw_queue,
        lp_vault: pool_struct.token_temp_lp,
        market: pool_struct.market,
        market_program_id: pool_struct.serum_dex,
        pool_open_time: pool_struct.out_put.pool_open_time,
    })
}

fn associated_address(market_id: &Pubkey, seed: &[u8]) -> Pubkey {
    let (address, _) = Pubkey::find_program_address(
        &[RAYDIUM_AMM_V4_PROGRAM_ID.as_ref(), market_id.as_ref(), seed],
        &RAYDIUM_AMM_V4_PROGRAM_ID,
    );
    address
}

/// L'adresse du pool est un PDA déterministe du marché OpenBook.
pub fn derive_amm_id(market_id: &Pubkey) -> Pubkey {
    associated_address(market_id, b"amm_associated_seed")
}

/// Les comptes d'un pool créé via `initialize2`, tous dérivés du seul marché.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociatedKeys {
    pub id: Pubkey,
    pub authority: Pubkey,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub lp_mint: Pubkey,
    pub lp_vault: Pubkey,
}

pub fn derive_associated_keys(market_id: &Pubkey) -> AssociatedKeys {
    AssociatedKeys {
        id: derive_amm_id(market_id),
        authority: amm_authority(),
        open_orders: associated_address(market_id, b"open_order_associated_seed"),
        target_orders: associated_address(market_id, b"target_associated_seed"),
        base_vault: associated_address(market_id, b"coin_vault_associated_seed"),
        quote_vault: associated_address(market_id, b"pc_vault_associated_seed"),
        lp_mint: associated_address(market_id, b"lp_mint_associated_seed"),
        lp_vault: associated_address(market_id, b"temp_lp_token_associated_seed"),
    }
}

pub fn amm_authority() -> Pubkey {
    let (authority, _) = Pubkey::find_program_address(&[b"amm authority"], &RAYDIUM_AMM_V4_PROGRAM_ID);
    authority
}

/// Le bundle complet de clés d'un pool AMM v4, prêt pour une instruction de swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolKeys {
    pub id: Pubkey,
    pub program_id: Pubkey,
    pub authority: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub lp_decimals: u8,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub withdraw_queue: Pubkey,
    pub lp_vault: Pubkey,
    pub market_program_id: Pubkey,
    pub market_id: Pubkey,
    pub market_authority: Pubkey,
    pub market_base_vault: Pubkey,
    pub market_quote_vault: Pubkey,
    pub market_bids: Pubkey,
    pub market_asks: Pubkey,
    pub market_event_queue: Pubkey,
    /// Timestamp Unix (secondes) à partir duquel le pool accepte les swaps.
    pub pool_open_time: u64,
}

impl PoolKeys {
    pub fn assemble(amm: &DecodedAmmInfo, market: &DecodedMarket) -> Result<Self> {
        if amm.market != market.address {
            bail!("Le pool {} référence le marché {}, pas {}", amm.address, amm.market, market.address);
        }
        Ok(Self {
            id: amm.address,
            program_id: RAYDIUM_AMM_V4_PROGRAM_ID,
            authority: amm_authority(),
            base_mint: amm.base_mint,
            quote_mint: amm.quote_mint,
            lp_mint: amm.lp_mint,
            base_decimals: amm.base_decimals,
            quote_decimals: amm.quote_decimals,
            lp_decimals: amm.base_decimals,
            open_orders: amm.open_orders,
            target_orders: amm.target_orders,
            base_vault: amm.base_vault,
            quote_vault: amm.quote_vault,
            withdraw_queue: amm.withdraw_queue,
            lp_vault: amm.lp_vault,
            market_program_id: amm.market_program_id,
            market_id: market.address,
            market_authority: market_authority(market, &amm.market_program_id)?,
            market_base_vault: market.base_vault,
            market_quote_vault: market.quote_vault,
            market_bids: market.bids,
            market_asks: market.asks,
            market_event_queue: market.event_queue,
            pool_open_time: amm.pool_open_time,
        })
    }
}
