use alloy_primitives::{Address, Bytes, U256};
use client::types::{GatewayWithdrawal, L2ToL1Event, OutgoingMessageState};
use serde::{Deserialize, Serialize};

/// Symbol and decimals of the rollup's native currency.
pub const NATIVE_SYMBOL: &str = "ETH";
pub const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Native,
    Token,
}

/// Cache key of an outbound message: `"<batch>,<index>"` in decimal.
pub fn message_key(batch_number: U256, index_in_batch: U256) -> String {
    format!("{batch_number},{index_in_batch}")
}

/// Render a base-unit amount with `decimals` places, trimming trailing zeros
/// but keeping at least one fractional digit (`1000000000000000000`, 18 → `1.0`).
pub fn format_amount(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;

    let (whole, fraction) = if digits.len() > decimals {
        let (whole, fraction) = digits.split_at(digits.len() - decimals);
        (whole.to_string(), fraction.to_string())
    } else {
        ("0".to_string(), format!("{digits:0>decimals$}"))
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

/// A withdrawal as read from chain, before its message state is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedWithdrawal {
    pub id: String,
    pub batch_number: U256,
    pub index_in_batch: U256,
    pub caller: Address,
    pub destination: Address,
    pub asset_type: AssetKind,
    pub amount: U256,
    pub token_address: Option<Address>,
    pub symbol: String,
    pub decimals: u8,
    pub arb_block_num: U256,
    pub eth_block_num: U256,
    pub timestamp: U256,
    pub callvalue: U256,
    pub data: Bytes,
}

impl ObservedWithdrawal {
    /// Native transfer carried by the message itself.
    pub fn native(event: &L2ToL1Event) -> Self {
        Self::from_message(
            event,
            AssetKind::Native,
            event.callvalue,
            None,
            NATIVE_SYMBOL.to_string(),
            NATIVE_DECIMALS,
        )
    }

    /// Token transfer announced by a gateway and carried by `message`.
    pub fn token(
        message: &L2ToL1Event,
        withdrawal: &GatewayWithdrawal,
        symbol: String,
        decimals: u8,
    ) -> Self {
        Self::token_transfer(message, withdrawal.l1_token, withdrawal.amount, symbol, decimals)
    }

    /// Token transfer of `amount` base units of `l1_token`, carried by `message`.
    pub fn token_transfer(
        message: &L2ToL1Event,
        l1_token: Address,
        amount: U256,
        symbol: String,
        decimals: u8,
    ) -> Self {
        Self::from_message(
            message,
            AssetKind::Token,
            amount,
            Some(l1_token),
            symbol,
            decimals,
        )
    }

    fn from_message(
        event: &L2ToL1Event,
        asset_type: AssetKind,
        amount: U256,
        token_address: Option<Address>,
        symbol: String,
        decimals: u8,
    ) -> Self {
        Self {
            id: event.unique_id.to_string(),
            batch_number: event.batch_number,
            index_in_batch: event.index_in_batch,
            caller: event.caller,
            destination: event.destination,
            asset_type,
            amount,
            token_address,
            symbol,
            decimals,
            arb_block_num: event.arb_block_num,
            eth_block_num: event.eth_block_num,
            timestamp: event.timestamp,
            callvalue: event.callvalue,
            data: event.data.clone(),
        }
    }

    pub fn message_key(&self) -> String {
        message_key(self.batch_number, self.index_in_batch)
    }

    pub fn with_state(self, outgoing_message_state: OutgoingMessageState) -> WithdrawalRecord {
        WithdrawalRecord {
            id: self.id,
            batch_number: self.batch_number,
            index_in_batch: self.index_in_batch,
            caller: self.caller,
            destination: self.destination,
            asset_type: self.asset_type,
            amount: self.amount,
            token_address: self.token_address,
            symbol: self.symbol,
            decimals: self.decimals,
            arb_block_num: self.arb_block_num,
            eth_block_num: self.eth_block_num,
            timestamp: self.timestamp,
            callvalue: self.callvalue,
            data: self.data,
            outgoing_message_state,
        }
    }
}

/// One outbound message with its last resolved state.
///
/// `id` is the chain-assigned unique id in decimal; `(batch_number,
/// index_in_batch)` identifies the message on L1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRecord {
    pub id: String,
    pub batch_number: U256,
    pub index_in_batch: U256,
    pub caller: Address,
    pub destination: Address,
    pub asset_type: AssetKind,
    pub amount: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_address: Option<Address>,
    pub symbol: String,
    pub decimals: u8,
    pub arb_block_num: U256,
    pub eth_block_num: U256,
    pub timestamp: U256,
    pub callvalue: U256,
    pub data: Bytes,
    pub outgoing_message_state: OutgoingMessageState,
}

impl WithdrawalRecord {
    pub fn message_key(&self) -> String {
        message_key(self.batch_number, self.index_in_batch)
    }

    /// Amount in whole units, e.g. `1.0` for 10^18 wei.
    pub fn display_amount(&self) -> String {
        format_amount(self.amount, self.decimals)
    }
}
