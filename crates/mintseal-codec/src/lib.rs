//! mintseal-codec: binary decoders for token mint accounts, token accounts and
//! program instructions.

pub mod amount;
pub mod chain;
pub mod cursor;
pub mod error;
pub mod instruction;
pub mod mint;
pub mod token_account;

pub use amount::{token_amount_to_ui_string, UiTokenAmount};
pub use chain::{decode_transaction, fetch_mint_account, fetch_transaction, TransactionInstruction};
pub use cursor::ByteCursor;
pub use error::{DecodeError, DecodeResult, InstructionPart};
pub use instruction::{default_registry, DecodedInstruction, DecoderRegistry, InstructionInput};
pub use mint::{
    decode_mint_account, decode_mint_account_text, AccountInput, DecodedMintAccount,
    MintAccountBuilder, MintDecoder, MINT_LEN,
};
pub use token_account::{decode_token_account, decode_token_account_text, DecodedTokenAccount};
