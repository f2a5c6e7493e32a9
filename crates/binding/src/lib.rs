//! Contract bindings for all external contracts.
//!
//! This crate consolidates the Solidity interfaces the bridge client talks to:
//! - Rollup core contracts (ArbSys, NodeInterface, Inbox, Outbox)
//! - Token gateway routers and gateways on both chains
//! - ERC20 tokens
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod arbitrum;
pub mod gateway;
pub mod token;
