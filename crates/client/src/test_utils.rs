//! In-memory [`BridgeClient`] for tests.
//!
//! `MockBridge` keeps scripted chain state behind a shared handle: clones see
//! the same state, so a test can keep one handle for assertions while the code
//! under test owns another.

use crate::{
    bridge::BridgeClient,
    types::{
        Chain, EventFilter, GatewayWithdrawal, L2ToL1Event, OutgoingMessageState, SubmittedTx,
        TxReceipt,
    },
    ClientError,
};
use alloy_primitives::{Address, Bytes, Log, TxHash, B256, U256};
use alloy_sol_types::SolEvent;
use binding::arbitrum::IInbox;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Inbox address the mock's deposit receipts are emitted from.
pub const MOCK_INBOX: Address = Address::with_last_byte(0x1b);

/// Metadata of a token known to the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockToken {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub allowance: U256,
    pub l2_address: Option<Address>,
}

impl MockToken {
    pub fn new(name: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            allowance: U256::ZERO,
            l2_address: None,
        }
    }
}

/// A transaction the code under test asked the mock to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    DepositNative { amount: U256 },
    DepositToken { token: Address, amount: U256 },
    Approve { token: Address },
    WithdrawNative { amount: U256 },
    WithdrawToken { token: Address, amount: U256 },
    Execute { batch_number: U256, index_in_batch: U256 },
}

#[derive(Default)]
struct State {
    native_events: Vec<L2ToL1Event>,
    gateway_events: HashMap<Address, Vec<GatewayWithdrawal>>,
    receipts: HashMap<TxHash, TxReceipt>,
    message_states: HashMap<(U256, U256), OutgoingMessageState>,
    tokens: HashMap<Address, MockToken>,
    submissions: Vec<Submission>,
    queued_withdrawal_messages: VecDeque<Vec<L2ToL1Event>>,
    next_inbox_sequence_number: U256,
    receipt_status: bool,
    fail_submissions: bool,
    fail_confirmations: bool,
    fail_state_queries: bool,
    state_query_latency: Option<Duration>,
    fail_native_events: bool,
    failing_gateways: HashSet<Address>,
    failing_receipts: HashSet<TxHash>,
}

struct Inner {
    wallet: Address,
    chain_id: u64,
    state: Mutex<State>,
    tx_counter: AtomicUsize,
    state_queries: AtomicUsize,
    state_queries_in_flight: AtomicUsize,
    peak_state_queries_in_flight: AtomicUsize,
    symbol_calls: AtomicUsize,
    decimals_calls: AtomicUsize,
}

#[derive(Clone)]
pub struct MockBridge {
    inner: Arc<Inner>,
}

impl MockBridge {
    pub fn new(wallet: Address) -> Self {
        Self::with_chain_id(wallet, 1)
    }

    pub fn with_chain_id(wallet: Address, chain_id: u64) -> Self {
        let state = State {
            receipt_status: true,
            next_inbox_sequence_number: U256::from(1),
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                wallet,
                chain_id,
                state: Mutex::new(state),
                tx_counter: AtomicUsize::new(0),
                state_queries: AtomicUsize::new(0),
                state_queries_in_flight: AtomicUsize::new(0),
                peak_state_queries_in_flight: AtomicUsize::new(0),
                symbol_calls: AtomicUsize::new(0),
                decimals_calls: AtomicUsize::new(0),
            }),
        }
    }

    // Scripting

    /// Make an `L2ToL1Transaction` event visible to native event queries.
    pub fn push_native_withdrawal(&self, event: L2ToL1Event) {
        self.inner.state.lock().native_events.push(event);
    }

    /// Make a gateway event visible, with a mined L2 receipt carrying `messages`.
    pub fn push_gateway_withdrawal(
        &self,
        gateway: Address,
        withdrawal: GatewayWithdrawal,
        messages: Vec<L2ToL1Event>,
    ) {
        let receipt = TxReceipt {
            tx_hash: withdrawal.tx_hash,
            block_number: withdrawal.block_number,
            gas_used: 100_000,
            status: true,
            logs: messages.iter().map(L2ToL1Event::to_log).collect(),
        };

        let mut state = self.inner.state.lock();
        state.receipts.insert(withdrawal.tx_hash, receipt);
        state.gateway_events.entry(gateway).or_default().push(withdrawal);
    }

    pub fn set_message_state(
        &self,
        batch_number: U256,
        index_in_batch: U256,
        message_state: OutgoingMessageState,
    ) {
        self.inner
            .state
            .lock()
            .message_states
            .insert((batch_number, index_in_batch), message_state);
    }

    pub fn add_token(&self, address: Address, token: MockToken) {
        self.inner.state.lock().tokens.insert(address, token);
    }

    /// Outbound messages the next withdrawal receipt will carry.
    pub fn queue_withdrawal_messages(&self, messages: Vec<L2ToL1Event>) {
        self.inner
            .state
            .lock()
            .queued_withdrawal_messages
            .push_back(messages);
    }

    pub fn set_next_inbox_sequence_number(&self, sequence_number: U256) {
        self.inner.state.lock().next_inbox_sequence_number = sequence_number;
    }

    /// Status of receipts for subsequent submissions (false = reverted).
    pub fn set_receipt_status(&self, success: bool) {
        self.inner.state.lock().receipt_status = success;
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.inner.state.lock().fail_submissions = fail;
    }

    /// Receipt waits time out instead of returning.
    pub fn fail_confirmations(&self, fail: bool) {
        self.inner.state.lock().fail_confirmations = fail;
    }

    pub fn fail_state_queries(&self, fail: bool) {
        self.inner.state.lock().fail_state_queries = fail;
    }

    /// Every state query takes `latency` before answering.
    pub fn set_state_query_latency(&self, latency: Duration) {
        self.inner.state.lock().state_query_latency = Some(latency);
    }

    pub fn fail_native_events(&self, fail: bool) {
        self.inner.state.lock().fail_native_events = fail;
    }

    pub fn fail_gateway(&self, gateway: Address) {
        self.inner.state.lock().failing_gateways.insert(gateway);
    }

    pub fn fail_receipt(&self, tx_hash: TxHash) {
        self.inner.state.lock().failing_receipts.insert(tx_hash);
    }

    // Inspection

    pub fn submissions(&self) -> Vec<Submission> {
        self.inner.state.lock().submissions.clone()
    }

    /// Number of `outbound_message_state` calls served.
    pub fn state_queries(&self) -> usize {
        self.inner.state_queries.load(Ordering::SeqCst)
    }

    /// Most state queries that were ever running at the same time.
    pub fn peak_state_queries_in_flight(&self) -> usize {
        self.inner.peak_state_queries_in_flight.load(Ordering::SeqCst)
    }

    pub fn symbol_calls(&self) -> usize {
        self.inner.symbol_calls.load(Ordering::SeqCst)
    }

    pub fn decimals_calls(&self) -> usize {
        self.inner.decimals_calls.load(Ordering::SeqCst)
    }

    fn submit(&self, submission: Submission, chain: Chain) -> Result<SubmittedTx, ClientError> {
        let mut state = self.inner.state.lock();
        if state.fail_submissions {
            return Err(ClientError::Provider("mock submission rejected".to_string()));
        }

        let n = self.inner.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let hash = B256::from(U256::from(n) | (U256::from(0xbeefu64) << 240usize));
        let success = state.receipt_status;

        let mut logs = Vec::new();
        match &submission {
            Submission::WithdrawNative { .. } | Submission::WithdrawToken { .. } if success => {
                if let Some(messages) = state.queued_withdrawal_messages.pop_front() {
                    logs.extend(messages.iter().map(L2ToL1Event::to_log));
                }
            }
            Submission::DepositNative { .. } | Submission::DepositToken { .. } if success => {
                let message_num = state.next_inbox_sequence_number;
                state.next_inbox_sequence_number = message_num + U256::from(1);
                logs.push(inbox_delivered_log(message_num));
            }
            Submission::Execute {
                batch_number,
                index_in_batch,
            } if success => {
                state.message_states.insert(
                    (*batch_number, *index_in_batch),
                    OutgoingMessageState::Executed,
                );
            }
            _ => {}
        }

        state.receipts.insert(
            hash,
            TxReceipt {
                tx_hash: hash,
                block_number: Some(n as u64),
                gas_used: 21_000,
                status: success,
                logs,
            },
        );
        state.submissions.push(submission);

        Ok(SubmittedTx { hash, chain })
    }

    fn token(&self, l1_token: Address) -> Result<MockToken, ClientError> {
        self.inner
            .state
            .lock()
            .tokens
            .get(&l1_token)
            .cloned()
            .ok_or_else(|| ClientError::Provider(format!("execution reverted: {l1_token}")))
    }
}

fn inbox_delivered_log(message_num: U256) -> Log {
    let event = IInbox::InboxMessageDelivered {
        messageNum: message_num,
        data: Bytes::new(),
    };
    Log {
        address: MOCK_INBOX,
        data: event.encode_log_data(),
    }
}

/// Native (empty payload) outbound message fixture.
pub fn native_message(
    unique_id: u64,
    batch_number: u64,
    index_in_batch: u64,
    destination: Address,
    callvalue: U256,
) -> L2ToL1Event {
    L2ToL1Event {
        caller: destination,
        destination,
        unique_id: U256::from(unique_id),
        batch_number: U256::from(batch_number),
        index_in_batch: U256::from(index_in_batch),
        arb_block_num: U256::from(1_000 + unique_id),
        eth_block_num: U256::from(500 + unique_id),
        timestamp: U256::from(1_630_000_000u64 + unique_id),
        callvalue,
        data: Bytes::new(),
        tx_hash: None,
    }
}

/// Outbound message emitted by a gateway on behalf of a token withdrawal.
pub fn token_message(
    unique_id: u64,
    batch_number: u64,
    index_in_batch: u64,
    destination: Address,
) -> L2ToL1Event {
    L2ToL1Event {
        // gateway calldata; only non-emptiness matters
        data: Bytes::from_static(&[0x2e, 0x56, 0x7b, 0x36]),
        callvalue: U256::ZERO,
        ..native_message(unique_id, batch_number, index_in_batch, destination, U256::ZERO)
    }
}

impl BridgeClient for MockBridge {
    fn wallet_address(&self) -> Address {
        self.inner.wallet
    }

    fn inbox_address(&self) -> Address {
        MOCK_INBOX
    }

    async fn l1_chain_id(&self) -> Result<u64, ClientError> {
        Ok(self.inner.chain_id)
    }

    async fn deposit_native(&self, amount: U256) -> Result<SubmittedTx, ClientError> {
        self.submit(Submission::DepositNative { amount }, Chain::L1)
    }

    async fn deposit_token(&self, l1_token: Address, amount: U256) -> Result<SubmittedTx, ClientError> {
        self.submit(
            Submission::DepositToken {
                token: l1_token,
                amount,
            },
            Chain::L1,
        )
    }

    async fn approve_token(&self, l1_token: Address) -> Result<SubmittedTx, ClientError> {
        self.submit(Submission::Approve { token: l1_token }, Chain::L1)
    }

    async fn withdraw_native(&self, amount: U256) -> Result<SubmittedTx, ClientError> {
        self.submit(Submission::WithdrawNative { amount }, Chain::L2)
    }

    async fn withdraw_token(&self, l1_token: Address, amount: U256) -> Result<SubmittedTx, ClientError> {
        self.submit(
            Submission::WithdrawToken {
                token: l1_token,
                amount,
            },
            Chain::L2,
        )
    }

    async fn execute_outbound_message(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> Result<SubmittedTx, ClientError> {
        self.submit(
            Submission::Execute {
                batch_number,
                index_in_batch,
            },
            Chain::L1,
        )
    }

    async fn wait_for_receipt(&self, tx: &SubmittedTx) -> Result<TxReceipt, ClientError> {
        let state = self.inner.state.lock();
        if state.fail_confirmations {
            return Err(ClientError::Timeout {
                operation: "wait_for_receipt",
                after: Duration::ZERO,
            });
        }

        state
            .receipts
            .get(&tx.hash)
            .cloned()
            .ok_or(ClientError::MissingReceipt(tx.hash))
    }

    async fn outbound_message_state(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> Result<OutgoingMessageState, ClientError> {
        self.inner.state_queries.fetch_add(1, Ordering::SeqCst);

        let latency = self.inner.state.lock().state_query_latency;
        if let Some(latency) = latency {
            let running = self.inner.state_queries_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner
                .peak_state_queries_in_flight
                .fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(latency).await;
            self.inner.state_queries_in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let state = self.inner.state.lock();
        if state.fail_state_queries {
            return Err(ClientError::Provider("mock state query failed".to_string()));
        }

        Ok(state
            .message_states
            .get(&(batch_number, index_in_batch))
            .copied()
            .unwrap_or(OutgoingMessageState::Unconfirmed))
    }

    async fn native_withdrawal_events(
        &self,
        destination: Address,
        filter: &EventFilter,
    ) -> Result<Vec<L2ToL1Event>, ClientError> {
        let state = self.inner.state.lock();
        if state.fail_native_events {
            return Err(ClientError::Provider("mock log query failed".to_string()));
        }

        Ok(state
            .native_events
            .iter()
            .filter(|event| event.destination == destination)
            .filter(|event| filter.contains(event.arb_block_num.saturating_to::<u64>()))
            .cloned()
            .collect())
    }

    async fn gateway_withdrawal_events(
        &self,
        gateway: Address,
        destination: Address,
        filter: &EventFilter,
    ) -> Result<Vec<GatewayWithdrawal>, ClientError> {
        let state = self.inner.state.lock();
        if state.failing_gateways.contains(&gateway) {
            return Err(ClientError::Provider(format!(
                "mock log query failed for {gateway}"
            )));
        }

        Ok(state
            .gateway_events
            .get(&gateway)
            .into_iter()
            .flatten()
            .filter(|withdrawal| withdrawal.to == destination)
            .filter(|withdrawal| filter.contains(withdrawal.block_number.unwrap_or_default()))
            .cloned()
            .collect())
    }

    async fn l2_transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ClientError> {
        let state = self.inner.state.lock();
        if state.failing_receipts.contains(&tx_hash) {
            return Err(ClientError::Provider(format!(
                "mock receipt lookup failed for {tx_hash}"
            )));
        }

        state
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or(ClientError::MissingReceipt(tx_hash))
    }

    async fn token_symbol(&self, l1_token: Address) -> Result<String, ClientError> {
        self.inner.symbol_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token(l1_token)?.symbol)
    }

    async fn token_decimals(&self, l1_token: Address) -> Result<u8, ClientError> {
        self.inner.decimals_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token(l1_token)?.decimals)
    }

    async fn token_name(&self, l1_token: Address) -> Result<String, ClientError> {
        Ok(self.token(l1_token)?.name)
    }

    async fn token_allowance(&self, l1_token: Address) -> Result<U256, ClientError> {
        Ok(self.token(l1_token)?.allowance)
    }

    async fn l2_token_address(&self, l1_token: Address) -> Result<Address, ClientError> {
        self.token(l1_token)?
            .l2_address
            .ok_or_else(|| ClientError::Provider(format!("no L2 counterpart for {l1_token}")))
    }
}
