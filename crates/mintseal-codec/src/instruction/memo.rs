use super::{DecodedInstruction, InstructionInput};
use crate::error::{DecodeError, DecodeResult};

/// Memo instructions carry UTF-8 text as their whole data.
pub fn decode_memo_instruction(input: &InstructionInput) -> DecodeResult<DecodedInstruction> {
    std::str::from_utf8(&input.data)
        .map(|text| DecodedInstruction::Memo(text.to_string()))
        .map_err(|e| DecodeError::InvalidField {
            field: "memo",
            reason: e.to_string(),
        })
}
