// src/decoders/mod.rs

pub mod raydium;
pub mod token_metadata;

pub use raydium::amm_v4::PoolKeys;
pub use token_metadata::TokenMetadata;
