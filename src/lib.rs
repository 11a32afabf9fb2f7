// src/lib.rs

// On déclare tous nos modules principaux pour les rendre publics et
// utilisables par le binaire pool_sniper.
pub mod config;
pub mod decoders;
pub mod execution;
pub mod monitoring;
pub mod rpc;
pub mod sniping;
