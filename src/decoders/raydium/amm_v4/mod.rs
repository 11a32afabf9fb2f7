pub mod events;
pub mod openbook_market;
pub mod pool;

// On ré-exporte les éléments principaux pour un accès plus facile
pub use events::{extract_market_and_lp_info, MarketAndLpInfo, RayInitLog};
pub use openbook_market::{decode_market, DecodedMarket};
pub use pool::{
    decode_amm_info, derive_amm_id, derive_associated_keys, AssociatedKeys, DecodedAmmInfo, PoolKeys,
    RAYDIUM_AMM_V4_PROGRAM_ID,
};
