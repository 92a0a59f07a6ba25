use serde::{Deserialize, Serialize};

use mintseal_core::Address;

use super::{
    ApproveInfo, BurnCheckedInfo, BurnInfo, Checker, CloseAccountInfo, DecodedInstruction,
    FreezeInfo, InitializeAccountInfo, InitializeMintInfo, InstructionInput, MintToCheckedInfo,
    MintToInfo, RevokeInfo, SetAuthorityInfo, TransferCheckedInfo, TransferInfo, UnknownInfo,
    SPL_TOKEN,
};
use crate::amount::UiTokenAmount;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};

/// Token program opcodes (first data byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenOpcode {
    InitializeMint = 0,
    InitializeAccount = 1,
    Transfer = 3,
    Approve = 4,
    Revoke = 5,
    SetAuthority = 6,
    MintTo = 7,
    Burn = 8,
    CloseAccount = 9,
    FreezeAccount = 10,
    ThawAccount = 11,
    TransferChecked = 12,
    MintToChecked = 14,
    BurnChecked = 15,
}

impl TokenOpcode {
    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::InitializeMint,
            1 => Self::InitializeAccount,
            3 => Self::Transfer,
            4 => Self::Approve,
            5 => Self::Revoke,
            6 => Self::SetAuthority,
            7 => Self::MintTo,
            8 => Self::Burn,
            9 => Self::CloseAccount,
            10 => Self::FreezeAccount,
            11 => Self::ThawAccount,
            12 => Self::TransferChecked,
            14 => Self::MintToChecked,
            15 => Self::BurnChecked,
            _ => return None,
        })
    }

    /// Minimum `(accounts, data bytes)` for this opcode.
    pub fn requirements(self) -> (usize, usize) {
        match self {
            Self::InitializeMint => (2, 35),
            Self::InitializeAccount => (4, 1),
            Self::Transfer | Self::Approve | Self::MintTo | Self::Burn => (3, 9),
            Self::Revoke => (2, 1),
            Self::SetAuthority => (2, 3),
            Self::CloseAccount | Self::FreezeAccount | Self::ThawAccount => (3, 1),
            Self::TransferChecked => (4, 10),
            Self::MintToChecked | Self::BurnChecked => (3, 10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorityType {
    MintTokens,
    FreezeAccount,
    AccountOwner,
    CloseAccount,
}

impl TryFrom<u8> for AuthorityType {
    type Error = DecodeError;

    fn try_from(value: u8) -> DecodeResult<Self> {
        match value {
            0 => Ok(Self::MintTokens),
            1 => Ok(Self::FreezeAccount),
            2 => Ok(Self::AccountOwner),
            3 => Ok(Self::CloseAccount),
            other => Err(DecodeError::InvalidField {
                field: "authorityType",
                reason: format!("unknown authority type {other}"),
            }),
        }
    }
}

/// Decode a token program instruction (classic or 2022; shared opcodes).
pub fn decode_token_instruction(input: &InstructionInput) -> DecodeResult<DecodedInstruction> {
    let Some(&tag) = input.data.first() else {
        return Err(DecodeError::EmptyInstruction { program: SPL_TOKEN });
    };
    let Some(opcode) = TokenOpcode::from_u8(tag) else {
        tracing::debug!(opcode = tag, "unmodelled token opcode");
        return Ok(DecodedInstruction::Unknown(UnknownInfo::from_input(
            input,
            tag as u32,
        )));
    };

    let check = Checker::new(SPL_TOKEN, tag as u32, input);
    let (min_accounts, min_data) = opcode.requirements();
    let accounts = check.accounts(min_accounts)?;
    let data = check.data(min_data)?;
    let mut cursor = ByteCursor::at(data, 1);

    let decoded = match opcode {
        TokenOpcode::InitializeMint => {
            let decimals = cursor.read_u8()?;
            let mint_authority = Address::new(cursor.read_array()?);
            let freeze_authority = match cursor.read_u8()? {
                0 => None,
                _ => {
                    check.data(67)?;
                    Some(Address::new(cursor.read_array()?))
                }
            };
            DecodedInstruction::InitializeMint(InitializeMintInfo {
                mint: accounts[0],
                decimals,
                mint_authority,
                freeze_authority,
                rent_sysvar: Some(accounts[1]),
            })
        }
        TokenOpcode::InitializeAccount => {
            DecodedInstruction::InitializeAccount(InitializeAccountInfo {
                account: accounts[0],
                mint: accounts[1],
                owner: accounts[2],
                rent_sysvar: accounts[3],
            })
        }
        TokenOpcode::Transfer => DecodedInstruction::Transfer(TransferInfo {
            source: accounts[0],
            destination: accounts[1],
            authority: accounts[2],
            amount: cursor.read_u64_le()?,
            signers: accounts[3..].to_vec(),
        }),
        TokenOpcode::Approve => DecodedInstruction::Approve(ApproveInfo {
            source: accounts[0],
            delegate: accounts[1],
            owner: accounts[2],
            amount: cursor.read_u64_le()?,
        }),
        TokenOpcode::Revoke => DecodedInstruction::Revoke(RevokeInfo {
            source: accounts[0],
            owner: accounts[1],
        }),
        TokenOpcode::SetAuthority => {
            let authority_type = AuthorityType::try_from(cursor.read_u8()?)?;
            let new_authority = match cursor.read_u8()? {
                0 => None,
                _ => {
                    check.data(35)?;
                    Some(Address::new(cursor.read_array()?))
                }
            };
            DecodedInstruction::SetAuthority(SetAuthorityInfo {
                account: accounts[0],
                authority_type,
                new_authority,
                authority: accounts[1],
            })
        }
        TokenOpcode::MintTo => DecodedInstruction::MintTo(MintToInfo {
            mint: accounts[0],
            account: accounts[1],
            mint_authority: accounts[2],
            amount: cursor.read_u64_le()?,
        }),
        TokenOpcode::Burn => DecodedInstruction::Burn(BurnInfo {
            account: accounts[0],
            mint: accounts[1],
            authority: accounts[2],
            amount: cursor.read_u64_le()?,
        }),
        TokenOpcode::CloseAccount => DecodedInstruction::CloseAccount(CloseAccountInfo {
            account: accounts[0],
            destination: accounts[1],
            owner: accounts[2],
        }),
        TokenOpcode::FreezeAccount | TokenOpcode::ThawAccount => {
            let info = FreezeInfo {
                account: accounts[0],
                mint: accounts[1],
                freeze_authority: accounts[2],
            };
            if opcode == TokenOpcode::FreezeAccount {
                DecodedInstruction::FreezeAccount(info)
            } else {
                DecodedInstruction::ThawAccount(info)
            }
        }
        TokenOpcode::TransferChecked => {
            let token_amount = read_checked_amount(&mut cursor)?;
            DecodedInstruction::TransferChecked(TransferCheckedInfo {
                source: accounts[0],
                mint: accounts[1],
                destination: accounts[2],
                authority: accounts[3],
                token_amount,
            })
        }
        TokenOpcode::MintToChecked => {
            let token_amount = read_checked_amount(&mut cursor)?;
            DecodedInstruction::MintToChecked(MintToCheckedInfo {
                mint: accounts[0],
                account: accounts[1],
                mint_authority: accounts[2],
                token_amount,
            })
        }
        TokenOpcode::BurnChecked => {
            let token_amount = read_checked_amount(&mut cursor)?;
            DecodedInstruction::BurnChecked(BurnCheckedInfo {
                account: accounts[0],
                mint: accounts[1],
                authority: accounts[2],
                token_amount,
            })
        }
    };

    tracing::debug!(opcode = tag, kind = decoded.kind(), "decoded token instruction");
    Ok(decoded)
}

fn read_checked_amount(cursor: &mut ByteCursor<'_>) -> DecodeResult<UiTokenAmount> {
    let amount = cursor.read_u64_le()?;
    let decimals = cursor.read_u8()?;
    Ok(UiTokenAmount::new(amount, decimals))
}
