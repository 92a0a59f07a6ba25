//! Contract for the RPC transport collaborator.
//!
//! The SDK never speaks JSON-RPC itself. Anything that can answer
//! `getAccountInfo`, `getTransaction` and `sendTransaction` in the shapes below
//! can drive the decoders. [`FixtureClient`] answers from a JSON file and backs
//! the CLI and tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::encoding::{bytes_to_base58, decode_text, Encoding};
use crate::error::{CoreError, CoreResult, EncodingError};

/// `getAccountInfo` result value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Owning program (base58)
    pub owner: String,
    pub lamports: u64,
    /// `[payload, encodingLabel]`
    pub data: (String, Encoding),
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub rent_epoch: Option<u64>,
}

impl AccountInfo {
    /// Resolve the encoded payload into raw bytes.
    pub fn data_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        decode_text(&self.data.0, self.data.1)
    }
}

/// `getTransaction` result value (json encoding, unparsed instructions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[serde(default)]
    pub slot: Option<u64>,
    pub transaction: EncodedTransaction,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedTransaction {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: EncodedMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedMessage {
    pub account_keys: Vec<String>,
    pub instructions: Vec<CompiledInstruction>,
}

/// An instruction referencing accounts by index into `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    /// Instruction data (base58)
    pub data: String,
}

/// The RPC transport the SDK expects from its host.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    async fn get_account_info(&self, address: &str) -> CoreResult<Option<AccountInfo>>;

    async fn get_transaction(&self, signature: &str) -> CoreResult<Option<TransactionResponse>>;

    /// Submit a serialized, signed transaction and return its signature.
    async fn send_transaction(&self, transaction: &[u8]) -> CoreResult<String>;
}

/// On-disk fixture format for [`FixtureClient`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub accounts: HashMap<String, AccountInfo>,
    pub transactions: HashMap<String, TransactionResponse>,
}

/// A [`ChainClient`] answering from recorded responses.
#[derive(Debug, Default)]
pub struct FixtureClient {
    fixture: Fixture,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl FixtureClient {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Load fixtures from a JSON file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            accounts = fixture.accounts.len(),
            transactions = fixture.transactions.len(),
            "loaded RPC fixture"
        );
        Ok(Self::new(fixture))
    }

    /// Transactions submitted through `send_transaction`, in order.
    pub fn sent_transactions(&self) -> Vec<Vec<u8>> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ChainClient for FixtureClient {
    async fn get_account_info(&self, address: &str) -> CoreResult<Option<AccountInfo>> {
        Ok(self.fixture.accounts.get(address).cloned())
    }

    async fn get_transaction(&self, signature: &str) -> CoreResult<Option<TransactionResponse>> {
        Ok(self.fixture.transactions.get(signature).cloned())
    }

    async fn send_transaction(&self, transaction: &[u8]) -> CoreResult<String> {
        // Wire format: compact-u16 signature count, then 64-byte signatures.
        if transaction.len() < 65 || transaction[0] == 0 {
            return Err(CoreError::Rpc(format!(
                "transaction of {} bytes carries no signature",
                transaction.len()
            )));
        }
        let signature = bytes_to_base58(&transaction[1..65]);
        self.sent
            .lock()
            .map_err(|_| CoreError::Rpc("fixture client state poisoned".into()))?
            .push(transaction.to_vec());
        Ok(signature)
    }
}
