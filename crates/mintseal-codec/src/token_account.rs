//! Token account decoder (165-byte holder account).
//!
//! ```text
//! 0..32    mint
//! 32..64   owner
//! 64..72   amount            u64
//! 72..108  delegate          COption<address>
//! 108      state             u8 (0 uninitialized, 1 initialized, 2 frozen)
//! 109..121 is_native         COption<u64> (rent-exempt reserve)
//! 121..129 delegated_amount  u64
//! 129..165 close_authority   COption<address>
//! ```

use serde::{Deserialize, Serialize};

use mintseal_core::{decode_text, Address, Encoding};

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};

pub const TOKEN_ACCOUNT_LEN: usize = 165;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountState {
    Uninitialized,
    Initialized,
    Frozen,
}

impl TryFrom<u8> for AccountState {
    type Error = DecodeError;

    fn try_from(value: u8) -> DecodeResult<Self> {
        match value {
            0 => Ok(AccountState::Uninitialized),
            1 => Ok(AccountState::Initialized),
            2 => Ok(AccountState::Frozen),
            other => Err(DecodeError::InvalidField {
                field: "state",
                reason: format!("unknown account state {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTokenAccount {
    pub mint: Address,
    pub owner: Address,
    #[serde(with = "mintseal_core::types::u64_string")]
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegate: Option<Address>,
    pub state: AccountState,
    pub is_native: bool,
    #[serde(
        with = "mintseal_core::types::opt_u64_string",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub rent_exempt_reserve: Option<u64>,
    #[serde(with = "mintseal_core::types::u64_string")]
    pub delegated_amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_authority: Option<Address>,
}

pub fn decode_token_account(data: &[u8]) -> DecodeResult<DecodedTokenAccount> {
    if data.len() < TOKEN_ACCOUNT_LEN {
        return Err(DecodeError::MalformedAccount {
            len: data.len(),
            expected: TOKEN_ACCOUNT_LEN,
        });
    }

    let mut cursor = ByteCursor::new(data);
    let mint = Address::new(cursor.read_array()?);
    let owner = Address::new(cursor.read_array()?);
    let amount = cursor.read_u64_le()?;
    let delegate = read_optional_address(&mut cursor)?;
    let state = AccountState::try_from(cursor.read_u8()?)?;
    let is_native_option = cursor.read_u32_le()?;
    let reserve = cursor.read_u64_le()?;
    let delegated_amount = cursor.read_u64_le()?;
    let close_authority = read_optional_address(&mut cursor)?;

    Ok(DecodedTokenAccount {
        mint,
        owner,
        amount,
        delegate,
        state,
        is_native: is_native_option != 0,
        rent_exempt_reserve: (is_native_option != 0).then_some(reserve),
        delegated_amount,
        close_authority,
    })
}

pub fn decode_token_account_text(
    text: &str,
    encoding: Encoding,
) -> DecodeResult<DecodedTokenAccount> {
    decode_token_account(&decode_text(text, encoding)?)
}

fn read_optional_address(cursor: &mut ByteCursor<'_>) -> DecodeResult<Option<Address>> {
    let option = cursor.read_u32_le()?;
    let bytes: [u8; 32] = cursor.read_array()?;
    Ok((option != 0).then(|| Address::new(bytes)))
}
