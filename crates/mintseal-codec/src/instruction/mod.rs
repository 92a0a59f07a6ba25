//! Instruction decoding.
//!
//! Decoders take `{program_id, data, accounts}` and return a
//! [`DecodedInstruction`], serialized as `{"type": ..., "info": {...}}` with
//! amounts as decimal strings and addresses as base58.

mod memo;
mod registry;
mod system;
mod token;

pub use memo::decode_memo_instruction;
pub use registry::{default_registry, DecodeFn, DecoderRegistry};
pub use system::{decode_system_instruction, SystemOpcode};
pub use token::{decode_token_instruction, AuthorityType, TokenOpcode};

use serde::{Deserialize, Serialize};

use mintseal_core::types::u64_string;
use mintseal_core::{bytes_to_hex, Address};

use crate::amount::UiTokenAmount;
use crate::error::{DecodeError, DecodeResult, InstructionPart};

pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PaJEEXCwbQ5sLEDyKKZ";
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

/// Registry names of the built-in decoders.
pub const SPL_TOKEN: &str = "spl-token";
pub const SYSTEM: &str = "system";
pub const SPL_MEMO: &str = "spl-memo";

/// The boundary type handed to every decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionInput {
    pub program_id: Address,
    pub data: Vec<u8>,
    pub accounts: Vec<Address>,
}

impl InstructionInput {
    pub fn new(program_id: Address, data: Vec<u8>, accounts: Vec<Address>) -> Self {
        Self {
            program_id,
            data,
            accounts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "info", rename_all = "camelCase")]
pub enum DecodedInstruction {
    InitializeMint(InitializeMintInfo),
    InitializeAccount(InitializeAccountInfo),
    Transfer(TransferInfo),
    Approve(ApproveInfo),
    Revoke(RevokeInfo),
    SetAuthority(SetAuthorityInfo),
    #[serde(rename = "mint")]
    MintTo(MintToInfo),
    Burn(BurnInfo),
    CloseAccount(CloseAccountInfo),
    FreezeAccount(FreezeInfo),
    ThawAccount(FreezeInfo),
    TransferChecked(TransferCheckedInfo),
    MintToChecked(MintToCheckedInfo),
    BurnChecked(BurnCheckedInfo),
    CreateAccount(CreateAccountInfo),
    #[serde(rename = "system-assign")]
    Assign(AssignInfo),
    #[serde(rename = "system-transfer")]
    SystemTransfer(SystemTransferInfo),
    #[serde(rename = "system-allocate")]
    Allocate(AllocateInfo),
    Memo(String),
    Unknown(UnknownInfo),
}

impl DecodedInstruction {
    /// The `type` tag this instruction serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitializeMint(_) => "initializeMint",
            Self::InitializeAccount(_) => "initializeAccount",
            Self::Transfer(_) => "transfer",
            Self::Approve(_) => "approve",
            Self::Revoke(_) => "revoke",
            Self::SetAuthority(_) => "setAuthority",
            Self::MintTo(_) => "mint",
            Self::Burn(_) => "burn",
            Self::CloseAccount(_) => "closeAccount",
            Self::FreezeAccount(_) => "freezeAccount",
            Self::ThawAccount(_) => "thawAccount",
            Self::TransferChecked(_) => "transferChecked",
            Self::MintToChecked(_) => "mintToChecked",
            Self::BurnChecked(_) => "burnChecked",
            Self::CreateAccount(_) => "createAccount",
            Self::Assign(_) => "system-assign",
            Self::SystemTransfer(_) => "system-transfer",
            Self::Allocate(_) => "system-allocate",
            Self::Memo(_) => "memo",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeMintInfo {
    pub mint: Address,
    pub decimals: u8,
    pub mint_authority: Address,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub freeze_authority: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rent_sysvar: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeAccountInfo {
    pub account: Address,
    pub mint: Address,
    pub owner: Address,
    pub rent_sysvar: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInfo {
    pub source: Address,
    pub destination: Address,
    pub authority: Address,
    #[serde(with = "u64_string")]
    pub amount: u64,
    /// Multisig signers following the authority
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub signers: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveInfo {
    pub source: Address,
    pub delegate: Address,
    pub owner: Address,
    #[serde(with = "u64_string")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeInfo {
    pub source: Address,
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAuthorityInfo {
    /// The mint or token account whose authority changes
    pub account: Address,
    pub authority_type: AuthorityType,
    pub new_authority: Option<Address>,
    pub authority: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintToInfo {
    pub mint: Address,
    pub account: Address,
    pub mint_authority: Address,
    #[serde(with = "u64_string")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnInfo {
    pub account: Address,
    pub mint: Address,
    pub authority: Address,
    #[serde(with = "u64_string")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseAccountInfo {
    pub account: Address,
    pub destination: Address,
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezeInfo {
    pub account: Address,
    pub mint: Address,
    pub freeze_authority: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCheckedInfo {
    pub source: Address,
    pub mint: Address,
    pub destination: Address,
    pub authority: Address,
    pub token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintToCheckedInfo {
    pub mint: Address,
    pub account: Address,
    pub mint_authority: Address,
    pub token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnCheckedInfo {
    pub account: Address,
    pub mint: Address,
    pub authority: Address,
    pub token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountInfo {
    pub source: Address,
    pub new_account: Address,
    #[serde(with = "u64_string")]
    pub lamports: u64,
    #[serde(with = "u64_string")]
    pub space: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignInfo {
    pub account: Address,
    pub owner: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTransferInfo {
    pub source: Address,
    pub destination: Address,
    #[serde(with = "u64_string")]
    pub lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateInfo {
    pub account: Address,
    #[serde(with = "u64_string")]
    pub space: u64,
}

/// An opcode the decoder does not model. Raw data is kept as hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownInfo {
    pub program_id: Address,
    pub opcode: u32,
    pub data: String,
    pub accounts: Vec<Address>,
}

impl UnknownInfo {
    pub(crate) fn from_input(input: &InstructionInput, opcode: u32) -> Self {
        Self {
            program_id: input.program_id,
            opcode,
            data: bytes_to_hex(&input.data),
            accounts: input.accounts.clone(),
        }
    }
}

/// Count checks shared by the per-program decoders.
pub(crate) struct Checker<'a> {
    program: &'static str,
    opcode: u32,
    input: &'a InstructionInput,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(program: &'static str, opcode: u32, input: &'a InstructionInput) -> Self {
        Self {
            program,
            opcode,
            input,
        }
    }

    pub(crate) fn accounts(&self, expected: usize) -> DecodeResult<&'a [Address]> {
        self.check(InstructionPart::Accounts, expected, self.input.accounts.len())?;
        Ok(&self.input.accounts)
    }

    pub(crate) fn data(&self, expected: usize) -> DecodeResult<&'a [u8]> {
        self.check(InstructionPart::Data, expected, self.input.data.len())?;
        Ok(&self.input.data)
    }

    fn check(&self, part: InstructionPart, expected: usize, actual: usize) -> DecodeResult<()> {
        if actual < expected {
            return Err(DecodeError::IncompleteInstruction {
                program: self.program,
                opcode: self.opcode,
                part,
                expected,
                actual,
            });
        }
        Ok(())
    }
}
