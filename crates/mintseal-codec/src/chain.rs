//! Decoding on top of the RPC collaborator: mint lookups and whole
//! transactions.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use mintseal_core::rpc::{ChainClient, CompiledInstruction, TransactionResponse};
use mintseal_core::{bytes_from_base58, Address};

use crate::error::{DecodeError, DecodeResult};
use crate::instruction::{DecodedInstruction, DecoderRegistry, InstructionInput};
use crate::mint::{DecodedMintAccount, MintDecoder};

/// One instruction of a decoded transaction. A failure stays attached to its
/// item; siblings are unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInstruction {
    pub index: usize,
    /// base58 program id, when the index resolved
    pub program_id: Option<String>,
    pub result: DecodeResult<DecodedInstruction>,
}

impl Serialize for TransactionInstruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TransactionInstruction", 3)?;
        s.serialize_field("index", &self.index)?;
        s.serialize_field("programId", &self.program_id)?;
        match &self.result {
            Ok(parsed) => s.serialize_field("parsed", parsed)?,
            Err(e) => s.serialize_field("error", &e.to_string())?,
        }
        s.end()
    }
}

/// Decode every top-level instruction of a `getTransaction` response.
pub fn decode_transaction(
    response: &TransactionResponse,
    registry: &DecoderRegistry,
) -> Vec<TransactionInstruction> {
    let message = &response.transaction.message;
    let keys: Vec<Result<Address, DecodeError>> = message
        .account_keys
        .iter()
        .map(|k| k.parse::<Address>().map_err(DecodeError::from))
        .collect();

    let items: Vec<TransactionInstruction> = message
        .instructions
        .iter()
        .enumerate()
        .map(|(index, ix)| {
            let program_id = message
                .account_keys
                .get(ix.program_id_index as usize)
                .cloned();
            let result = resolve_instruction(ix, &keys)
                .and_then(|input| registry.decode_for_program(&input));
            if let Err(e) = &result {
                tracing::debug!(index, error = %e, "instruction left undecoded");
            }
            TransactionInstruction {
                index,
                program_id,
                result,
            }
        })
        .collect();

    tracing::debug!(
        instructions = items.len(),
        failed = items.iter().filter(|i| i.result.is_err()).count(),
        "decoded transaction"
    );
    items
}

/// Turn an index-based instruction into a decoder input.
pub fn resolve_instruction(
    ix: &CompiledInstruction,
    keys: &[Result<Address, DecodeError>],
) -> DecodeResult<InstructionInput> {
    let lookup = |index: u8| -> DecodeResult<Address> {
        match keys.get(index as usize) {
            Some(Ok(address)) => Ok(*address),
            Some(Err(e)) => Err(e.clone()),
            None => Err(DecodeError::AccountIndexOutOfRange {
                index: index as usize,
                len: keys.len(),
            }),
        }
    };

    let program_id = lookup(ix.program_id_index)?;
    let accounts = ix
        .accounts
        .iter()
        .map(|&i| lookup(i))
        .collect::<DecodeResult<Vec<_>>>()?;
    let data = bytes_from_base58(&ix.data)?;
    Ok(InstructionInput::new(program_id, data, accounts))
}

/// Fetch an account through `client` and decode it as a mint.
pub async fn fetch_mint_account<C: ChainClient>(
    client: &C,
    address: &str,
    decoder: &MintDecoder,
) -> DecodeResult<DecodedMintAccount> {
    let info = client
        .get_account_info(address)
        .await
        .map_err(|e| DecodeError::Rpc(e.to_string()))?
        .ok_or_else(|| DecodeError::AccountNotFound {
            address: address.to_string(),
        })?;
    tracing::debug!(address, owner = %info.owner, lamports = info.lamports, "fetched account");
    decoder.decode_bytes(&info.data_bytes()?)
}

/// Fetch a transaction through `client` and decode its instructions.
pub async fn fetch_transaction<C: ChainClient>(
    client: &C,
    signature: &str,
    registry: &DecoderRegistry,
) -> DecodeResult<Vec<TransactionInstruction>> {
    let response = client
        .get_transaction(signature)
        .await
        .map_err(|e| DecodeError::Rpc(e.to_string()))?
        .ok_or_else(|| DecodeError::Rpc(format!("transaction {signature} not found")))?;
    Ok(decode_transaction(&response, registry))
}
