//! Configuration types for the outbox relayer.
//!
//! This crate provides:
//! - Network configurations (mainnet, testnet)
//! - Bridge contract addresses on both chains
//! - A builder for overriding individual addresses

pub mod network;

pub use network::{
    ArbitrumConfig, EthereumConfig, NetworkConfig, NetworkConfigBuilder, NetworkType,
};
