use mintseal_core::Address;

use super::{
    AllocateInfo, AssignInfo, Checker, CreateAccountInfo, DecodedInstruction, InstructionInput,
    SystemTransferInfo, UnknownInfo, SYSTEM,
};
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult, InstructionPart};

/// System program opcodes (first four data bytes, LE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SystemOpcode {
    CreateAccount = 0,
    Assign = 1,
    Transfer = 2,
    Allocate = 8,
}

impl SystemOpcode {
    pub fn from_u32(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => Self::CreateAccount,
            1 => Self::Assign,
            2 => Self::Transfer,
            8 => Self::Allocate,
            _ => return None,
        })
    }

    /// Minimum `(accounts, data bytes)` for this opcode.
    pub fn requirements(self) -> (usize, usize) {
        match self {
            Self::CreateAccount => (2, 20),
            Self::Assign => (1, 36),
            Self::Transfer => (2, 12),
            Self::Allocate => (1, 12),
        }
    }
}

/// Byte length of a CreateAccount payload carrying the owner program.
const CREATE_ACCOUNT_WITH_OWNER_LEN: usize = 52;

pub fn decode_system_instruction(input: &InstructionInput) -> DecodeResult<DecodedInstruction> {
    let mut cursor = ByteCursor::new(&input.data);
    if input.data.is_empty() {
        return Err(DecodeError::EmptyInstruction { program: SYSTEM });
    }
    let tag = cursor
        .read_u32_le()
        .map_err(|_| DecodeError::IncompleteInstruction {
            program: SYSTEM,
            opcode: input.data[0] as u32,
            part: InstructionPart::Data,
            expected: 4,
            actual: input.data.len(),
        })?;
    let Some(opcode) = SystemOpcode::from_u32(tag) else {
        tracing::debug!(opcode = tag, "unmodelled system opcode");
        return Ok(DecodedInstruction::Unknown(UnknownInfo::from_input(input, tag)));
    };

    let check = Checker::new(SYSTEM, tag, input);
    let (min_accounts, min_data) = opcode.requirements();
    let accounts = check.accounts(min_accounts)?;
    let data = check.data(min_data)?;

    let decoded = match opcode {
        SystemOpcode::CreateAccount => {
            let lamports = cursor.read_u64_le()?;
            let space = cursor.read_u64_le()?;
            let owner = if data.len() >= CREATE_ACCOUNT_WITH_OWNER_LEN {
                Some(Address::new(cursor.read_array()?))
            } else {
                None
            };
            DecodedInstruction::CreateAccount(CreateAccountInfo {
                source: accounts[0],
                new_account: accounts[1],
                lamports,
                space,
                owner,
            })
        }
        SystemOpcode::Assign => DecodedInstruction::Assign(AssignInfo {
            account: accounts[0],
            owner: Address::new(cursor.read_array()?),
        }),
        SystemOpcode::Transfer => DecodedInstruction::SystemTransfer(SystemTransferInfo {
            source: accounts[0],
            destination: accounts[1],
            lamports: cursor.read_u64_le()?,
        }),
        SystemOpcode::Allocate => DecodedInstruction::Allocate(AllocateInfo {
            account: accounts[0],
            space: cursor.read_u64_le()?,
        }),
    };

    tracing::debug!(opcode = tag, kind = decoded.kind(), "decoded system instruction");
    Ok(decoded)
}
