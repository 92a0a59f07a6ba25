//! Named decoder registry with program-id routing.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use mintseal_core::Address;

use super::{
    decode_memo_instruction, decode_system_instruction, decode_token_instruction,
    DecodedInstruction, InstructionInput, MEMO_PROGRAM_ID, SPL_MEMO, SPL_TOKEN, SYSTEM,
    SYSTEM_PROGRAM_ID, TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
use crate::error::{DecodeError, DecodeResult};

pub type DecodeFn = Arc<dyn Fn(&InstructionInput) -> DecodeResult<DecodedInstruction> + Send + Sync>;

/// Decoders keyed by name, plus a program-id to name routing table.
///
/// Each name is registered once; a second registration is rejected.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: RwLock<HashMap<String, DecodeFn>>,
    programs: RwLock<HashMap<Address, String>>,
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.names();
        f.debug_struct("DecoderRegistry")
            .field("decoders", &names)
            .finish()
    }
}

impl DecoderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the token, system and memo decoders and their
    /// program ids already routed.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        let builtin: Vec<(&str, DecodeFn, Vec<&str>)> = vec![
            (
                SPL_TOKEN,
                Arc::new(decode_token_instruction) as DecodeFn,
                vec![TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID],
            ),
            (
                SYSTEM,
                Arc::new(decode_system_instruction) as DecodeFn,
                vec![SYSTEM_PROGRAM_ID],
            ),
            (
                SPL_MEMO,
                Arc::new(decode_memo_instruction) as DecodeFn,
                vec![MEMO_PROGRAM_ID],
            ),
        ];
        for (name, decoder, program_ids) in builtin {
            // fresh registry: names are unique
            let _ = registry.insert(name, decoder);
            for id in program_ids {
                if let Ok(address) = id.parse::<Address>() {
                    registry.route_program(address, name);
                }
            }
        }
        registry
    }

    pub fn register<F>(&self, name: &str, decoder: F) -> DecodeResult<()>
    where
        F: Fn(&InstructionInput) -> DecodeResult<DecodedInstruction> + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(decoder))
    }

    fn insert(&self, name: &str, decoder: DecodeFn) -> DecodeResult<()> {
        let mut decoders = self.decoders.write().unwrap_or_else(PoisonError::into_inner);
        if decoders.contains_key(name) {
            tracing::warn!(name, "rejected duplicate decoder registration");
            return Err(DecodeError::DuplicateDecoder {
                name: name.to_string(),
            });
        }
        decoders.insert(name.to_string(), decoder);
        tracing::debug!(name, "registered instruction decoder");
        Ok(())
    }

    /// Route instructions for `program_id` to the decoder named `name`.
    /// Re-routing a program replaces the previous route.
    pub fn route_program(&self, program_id: Address, name: &str) {
        self.programs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(program_id, name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered decoder names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .decoders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Decoder name routed for `program_id`.
    pub fn program_name(&self, program_id: &Address) -> Option<String> {
        self.programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(program_id)
            .cloned()
    }

    /// Decode with the decoder registered under `name`.
    pub fn decode(&self, name: &str, input: &InstructionInput) -> DecodeResult<DecodedInstruction> {
        let decoder = self
            .decoders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| DecodeError::NoDecoderFound {
                name: name.to_string(),
            })?;
        decoder(input)
    }

    /// Decode with whichever decoder is routed for the instruction's program.
    pub fn decode_for_program(&self, input: &InstructionInput) -> DecodeResult<DecodedInstruction> {
        let name = self
            .program_name(&input.program_id)
            .ok_or_else(|| DecodeError::NoDecoderFound {
                name: input.program_id.to_string(),
            })?;
        self.decode(&name, input)
    }
}

/// Process-wide registry with the built-in decoders, built on first use.
pub fn default_registry() -> &'static DecoderRegistry {
    static REGISTRY: OnceLock<DecoderRegistry> = OnceLock::new();
    REGISTRY.get_or_init(DecoderRegistry::with_builtin)
}
