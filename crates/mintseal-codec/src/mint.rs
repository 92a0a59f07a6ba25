//! Token mint account decoder.
//!
//! Canonical header (82 bytes, little-endian):
//! ```text
//! 0..8    supply                 u64
//! 8       decimals               u8
//! 9       is_initialized         u8 (nonzero = true)
//! 10..14  mint_authority_option  u32
//! 14..46  mint_authority         [u8; 32]
//! 46..50  freeze_authority_option u32
//! 50..82  freeze_authority       [u8; 32]
//! 82..    TLV extension chain
//! ```
//!
//! Each TLV entry has a 4-byte header: `type` (u8), `length` (u16 LE) and one
//! reserved byte. The reserved byte is carried for wire compatibility with
//! existing accounts and is written back as zero by [`DecodedMintAccount::to_bytes`].
//! `type == 0` or `length == 0` ends the chain.

use serde::{Deserialize, Serialize};

use mintseal_core::config::CodecConfig;
use mintseal_core::types::hex_bytes;
use mintseal_core::{bytes_to_hex, decode_text, Address, Encoding, ADDRESS_LEN};

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};

/// Size of the canonical mint header
pub const MINT_LEN: usize = 82;

/// Width of a TLV header (type, length, reserved)
pub const TLV_HEADER_LEN: usize = 4;

/// TLV type carrying token metadata
pub const TOKEN_METADATA_EXTENSION: u8 = 6;

/// Minimum payload length of a decodable metadata extension
pub const TOKEN_METADATA_MIN_LEN: usize = NAME_LEN + SYMBOL_LEN + URI_LEN + ADDRESS_LEN;

const NAME_LEN: usize = 32;
const SYMBOL_LEN: usize = 12;
const URI_LEN: usize = 156;

/// A COption-style authority: presence flag plus the raw address bytes.
///
/// When `option == 0` the address bytes are still present in the account but
/// carry no meaning; use [`OptionalAuthority::address`] rather than reading
/// them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalAuthority {
    pub option: u32,
    #[serde(with = "hex_bytes")]
    pub address: [u8; ADDRESS_LEN],
    /// base58 form of `address`
    pub text_encoding: String,
}

impl OptionalAuthority {
    pub fn new(option: u32, address: [u8; ADDRESS_LEN]) -> Self {
        Self {
            option,
            address,
            text_encoding: Address::new(address).to_string(),
        }
    }

    pub fn none() -> Self {
        Self::new(0, [0u8; ADDRESS_LEN])
    }

    pub fn some(address: Address) -> Self {
        Self::new(1, address.to_bytes())
    }

    pub fn is_some(&self) -> bool {
        self.option != 0
    }

    /// The authority, or `None` when the presence flag is clear.
    pub fn address(&self) -> Option<Address> {
        self.is_some().then(|| Address::new(self.address))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlvExtension {
    #[serde(rename = "type")]
    pub extension_type: u8,
    pub length: u16,
    pub data: Vec<u8>,
    pub hex: String,
}

/// Metadata decoded from a type-6 extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadataExtension {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// hex of the 32-byte update authority
    pub update_authority: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionIssueKind {
    /// Declared span runs past the buffer; parsing stopped here
    Truncated,
    /// Type-6 extension shorter than the metadata layout
    MetadataTooShort,
    /// Metadata text field is not valid UTF-8 (decoded lossily)
    MetadataInvalidUtf8,
    /// Extension limit reached; remaining bytes were not walked
    LimitReached,
}

/// A problem with one TLV entry. Attached to the account instead of failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionIssue {
    pub offset: usize,
    pub extension_type: Option<u8>,
    pub kind: ExtensionIssueKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMintAccount {
    #[serde(with = "mintseal_core::types::u64_string")]
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub mint_authority: OptionalAuthority,
    pub freeze_authority: OptionalAuthority,
    /// hex of the whole input buffer
    pub raw: String,
    pub tlv_extensions: Vec<TlvExtension>,
    pub token_metadata: Option<TokenMetadataExtension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension_issues: Vec<ExtensionIssue>,
}

impl DecodedMintAccount {
    /// Re-serialize the canonical header and the TLV chain.
    ///
    /// Identical to the decoded input whenever every reserved header byte was
    /// zero and nothing followed the last extension.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut builder = MintAccountBuilder::new()
            .supply(self.supply)
            .decimals(self.decimals)
            .initialized(self.is_initialized)
            .raw_mint_authority(self.mint_authority.option, self.mint_authority.address)
            .raw_freeze_authority(self.freeze_authority.option, self.freeze_authority.address);
        for ext in &self.tlv_extensions {
            builder = builder.extension(ext.extension_type, ext.data.clone());
        }
        builder.build()
    }

    /// First extension with the given type.
    pub fn extension(&self, extension_type: u8) -> Option<&TlvExtension> {
        self.tlv_extensions
            .iter()
            .find(|e| e.extension_type == extension_type)
    }
}

/// Account payload as handed over by the caller.
#[derive(Debug, Clone, Copy)]
pub enum AccountInput<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
}

impl<'a> From<&'a [u8]> for AccountInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        AccountInput::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for AccountInput<'a> {
    fn from(text: &'a str) -> Self {
        AccountInput::Text(text)
    }
}

/// Mint decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct MintDecoder {
    default_encoding: Encoding,
    max_extensions: usize,
}

impl Default for MintDecoder {
    fn default() -> Self {
        Self::from_config(&CodecConfig::default())
    }
}

impl MintDecoder {
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            default_encoding: config.default_encoding,
            max_extensions: config.max_tlv_extensions,
        }
    }

    /// Decode bytes, or text in `encoding` (the configured default when `None`).
    pub fn decode(
        &self,
        input: AccountInput<'_>,
        encoding: Option<Encoding>,
    ) -> DecodeResult<DecodedMintAccount> {
        match input {
            AccountInput::Bytes(bytes) => self.decode_bytes(bytes),
            AccountInput::Text(text) => {
                let bytes = decode_text(text, encoding.unwrap_or(self.default_encoding))?;
                self.decode_bytes(&bytes)
            }
        }
    }

    pub fn decode_bytes(&self, data: &[u8]) -> DecodeResult<DecodedMintAccount> {
        if data.len() < MINT_LEN {
            return Err(DecodeError::MalformedAccount {
                len: data.len(),
                expected: MINT_LEN,
            });
        }

        let mut cursor = ByteCursor::new(data);
        let supply = cursor.read_u64_le()?;
        let decimals = cursor.read_u8()?;
        let is_initialized = cursor.read_u8()? != 0;
        let mint_authority = OptionalAuthority::new(cursor.read_u32_le()?, cursor.read_array()?);
        let freeze_authority = OptionalAuthority::new(cursor.read_u32_le()?, cursor.read_array()?);
        debug_assert_eq!(cursor.offset(), MINT_LEN);

        let chain = self.walk_extensions(data);

        tracing::debug!(
            len = data.len(),
            decimals,
            extensions = chain.extensions.len(),
            issues = chain.issues.len(),
            "decoded mint account"
        );

        Ok(DecodedMintAccount {
            supply,
            decimals,
            is_initialized,
            mint_authority,
            freeze_authority,
            raw: bytes_to_hex(data),
            tlv_extensions: chain.extensions,
            token_metadata: chain.metadata,
            extension_issues: chain.issues,
        })
    }

    fn walk_extensions(&self, data: &[u8]) -> ExtensionChain {
        let mut chain = ExtensionChain::default();
        let mut offset = MINT_LEN;

        while offset < data.len() {
            if chain.extensions.len() >= self.max_extensions {
                chain.issues.push(ExtensionIssue {
                    offset,
                    extension_type: None,
                    kind: ExtensionIssueKind::LimitReached,
                    message: format!(
                        "stopped after {} extensions, {} bytes unread",
                        self.max_extensions,
                        data.len() - offset
                    ),
                });
                break;
            }

            let mut cursor = ByteCursor::at(data, offset);
            let extension_type = match cursor.read_u8() {
                Ok(t) => t,
                Err(_) => break,
            };
            if extension_type == 0 {
                break;
            }
            let length = match cursor.read_u16_le() {
                Ok(len) => len,
                Err(e) => {
                    chain.truncated(offset, extension_type, e.to_string());
                    break;
                }
            };
            if length == 0 {
                break;
            }

            let start = offset + TLV_HEADER_LEN;
            let end = start + length as usize;
            if end > data.len() {
                let err = DecodeError::BufferUnderrun {
                    offset: start,
                    requested: length as usize,
                    len: data.len(),
                };
                chain.truncated(offset, extension_type, err.to_string());
                break;
            }

            let payload = &data[start..end];
            if extension_type == TOKEN_METADATA_EXTENSION && chain.metadata.is_none() {
                chain.decode_metadata(offset, payload);
            }
            chain.extensions.push(TlvExtension {
                extension_type,
                length,
                data: payload.to_vec(),
                hex: bytes_to_hex(payload),
            });
            offset = end;
        }

        chain
    }
}

#[derive(Default)]
struct ExtensionChain {
    extensions: Vec<TlvExtension>,
    metadata: Option<TokenMetadataExtension>,
    issues: Vec<ExtensionIssue>,
}

impl ExtensionChain {
    fn truncated(&mut self, offset: usize, extension_type: u8, message: String) {
        tracing::warn!(offset, extension_type, "TLV chain truncated: {message}");
        self.issues.push(ExtensionIssue {
            offset,
            extension_type: Some(extension_type),
            kind: ExtensionIssueKind::Truncated,
            message,
        });
    }

    fn decode_metadata(&mut self, offset: usize, payload: &[u8]) {
        if payload.len() < TOKEN_METADATA_MIN_LEN {
            self.issues.push(ExtensionIssue {
                offset,
                extension_type: Some(TOKEN_METADATA_EXTENSION),
                kind: ExtensionIssueKind::MetadataTooShort,
                message: format!(
                    "metadata extension has {} bytes, need {TOKEN_METADATA_MIN_LEN}",
                    payload.len()
                ),
            });
            return;
        }

        let mut cursor = ByteCursor::new(payload);
        // lengths were checked above
        let (Ok(name), Ok(symbol), Ok(uri), Ok(authority)) = (
            cursor.read_bytes(NAME_LEN),
            cursor.read_bytes(SYMBOL_LEN),
            cursor.read_bytes(URI_LEN),
            cursor.read_bytes(ADDRESS_LEN),
        ) else {
            return;
        };

        let mut invalid = Vec::new();
        let mut text = |field: &'static str, bytes: &[u8]| {
            let trimmed = trim_nul(bytes);
            match std::str::from_utf8(trimmed) {
                Ok(s) => s.to_string(),
                Err(_) => {
                    invalid.push(field);
                    String::from_utf8_lossy(trimmed).into_owned()
                }
            }
        };
        let metadata = TokenMetadataExtension {
            name: text("name", name),
            symbol: text("symbol", symbol),
            uri: text("uri", uri),
            update_authority: bytes_to_hex(authority),
        };

        if !invalid.is_empty() {
            self.issues.push(ExtensionIssue {
                offset,
                extension_type: Some(TOKEN_METADATA_EXTENSION),
                kind: ExtensionIssueKind::MetadataInvalidUtf8,
                message: format!("invalid UTF-8 in {}", invalid.join(", ")),
            });
        }
        self.metadata = Some(metadata);
    }
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Decode a mint account from raw bytes with default limits.
pub fn decode_mint_account(data: &[u8]) -> DecodeResult<DecodedMintAccount> {
    MintDecoder::default().decode_bytes(data)
}

/// Decode a mint account from text in the given encoding.
pub fn decode_mint_account_text(
    text: &str,
    encoding: Encoding,
) -> DecodeResult<DecodedMintAccount> {
    MintDecoder::default().decode(AccountInput::Text(text), Some(encoding))
}

/// Builds canonical mint account buffers.
#[derive(Debug, Clone)]
pub struct MintAccountBuilder {
    supply: u64,
    decimals: u8,
    initialized: bool,
    mint_authority: (u32, [u8; ADDRESS_LEN]),
    freeze_authority: (u32, [u8; ADDRESS_LEN]),
    extensions: Vec<(u8, Vec<u8>)>,
}

impl Default for MintAccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MintAccountBuilder {
    pub fn new() -> Self {
        Self {
            supply: 0,
            decimals: 0,
            initialized: true,
            mint_authority: (0, [0u8; ADDRESS_LEN]),
            freeze_authority: (0, [0u8; ADDRESS_LEN]),
            extensions: Vec::new(),
        }
    }

    pub fn supply(mut self, supply: u64) -> Self {
        self.supply = supply;
        self
    }

    pub fn decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn initialized(mut self, initialized: bool) -> Self {
        self.initialized = initialized;
        self
    }

    pub fn mint_authority(self, authority: Option<Address>) -> Self {
        let (option, bytes) = authority_parts(authority);
        self.raw_mint_authority(option, bytes)
    }

    pub fn freeze_authority(self, authority: Option<Address>) -> Self {
        let (option, bytes) = authority_parts(authority);
        self.raw_freeze_authority(option, bytes)
    }

    pub fn raw_mint_authority(mut self, option: u32, address: [u8; ADDRESS_LEN]) -> Self {
        self.mint_authority = (option, address);
        self
    }

    pub fn raw_freeze_authority(mut self, option: u32, address: [u8; ADDRESS_LEN]) -> Self {
        self.freeze_authority = (option, address);
        self
    }

    /// Append a TLV entry. Payloads longer than `u16::MAX` are truncated.
    pub fn extension(mut self, extension_type: u8, data: Vec<u8>) -> Self {
        self.extensions.push((extension_type, data));
        self
    }

    /// Append a type-6 metadata extension.
    pub fn token_metadata(
        self,
        name: &str,
        symbol: &str,
        uri: &str,
        update_authority: Address,
    ) -> DecodeResult<Self> {
        let mut payload = Vec::with_capacity(TOKEN_METADATA_MIN_LEN);
        payload.extend_from_slice(&nul_padded("name", name, NAME_LEN)?);
        payload.extend_from_slice(&nul_padded("symbol", symbol, SYMBOL_LEN)?);
        payload.extend_from_slice(&nul_padded("uri", uri, URI_LEN)?);
        payload.extend_from_slice(update_authority.as_bytes());
        Ok(self.extension(TOKEN_METADATA_EXTENSION, payload))
    }

    pub fn build(&self) -> Vec<u8> {
        let tail: usize = self
            .extensions
            .iter()
            .map(|(_, d)| TLV_HEADER_LEN + d.len().min(u16::MAX as usize))
            .sum();
        let mut out = Vec::with_capacity(MINT_LEN + tail);
        out.extend_from_slice(&self.supply.to_le_bytes());
        out.push(self.decimals);
        out.push(u8::from(self.initialized));
        out.extend_from_slice(&self.mint_authority.0.to_le_bytes());
        out.extend_from_slice(&self.mint_authority.1);
        out.extend_from_slice(&self.freeze_authority.0.to_le_bytes());
        out.extend_from_slice(&self.freeze_authority.1);

        for (extension_type, data) in &self.extensions {
            let data = &data[..data.len().min(u16::MAX as usize)];
            out.push(*extension_type);
            out.extend_from_slice(&(data.len() as u16).to_le_bytes());
            out.push(0);
            out.extend_from_slice(data);
        }
        out
    }
}

fn authority_parts(authority: Option<Address>) -> (u32, [u8; ADDRESS_LEN]) {
    match authority {
        Some(addr) => (1, addr.to_bytes()),
        None => (0, [0u8; ADDRESS_LEN]),
    }
}

fn nul_padded(field: &'static str, value: &str, width: usize) -> DecodeResult<Vec<u8>> {
    if value.len() > width {
        return Err(DecodeError::InvalidField {
            field,
            reason: format!("{} bytes exceeds the {width}-byte field", value.len()),
        });
    }
    let mut out = value.as_bytes().to_vec();
    out.resize(width, 0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintseal_core::bytes_to_base64;
    use proptest::prelude::*;

    fn authority() -> Address {
        Address::new([0x11; 32])
    }

    #[test]
    fn decodes_canonical_fields() {
        let data = MintAccountBuilder::new()
            .supply(1_000_000_000_000)
            .decimals(9)
            .mint_authority(Some(authority()))
            .build();
        assert_eq!(data.len(), MINT_LEN);

        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.supply, 1_000_000_000_000);
        assert_eq!(mint.decimals, 9);
        assert!(mint.is_initialized);
        assert_eq!(mint.mint_authority.address(), Some(authority()));
        assert_eq!(mint.mint_authority.text_encoding, authority().to_string());
        assert_eq!(mint.freeze_authority.address(), None);
        assert_eq!(mint.raw.len(), MINT_LEN * 2);
    }

    #[test]
    fn field_offsets_are_fixed() {
        let mut data = vec![0u8; MINT_LEN];
        data[0..8].copy_from_slice(&42u64.to_le_bytes());
        data[8] = 6;
        data[9] = 7; // any nonzero value is initialized
        data[10..14].copy_from_slice(&1u32.to_le_bytes());
        data[14..46].copy_from_slice(&[0xAA; 32]);
        data[46..50].copy_from_slice(&0u32.to_le_bytes());
        data[50..82].copy_from_slice(&[0xBB; 32]);

        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.supply, 42);
        assert_eq!(mint.decimals, 6);
        assert!(mint.is_initialized);
        assert_eq!(mint.mint_authority.option, 1);
        assert_eq!(mint.mint_authority.address, [0xAA; 32]);
        // option 0: bytes are kept but the authority is absent
        assert_eq!(mint.freeze_authority.address, [0xBB; 32]);
        assert!(mint.freeze_authority.address().is_none());
    }

    #[test]
    fn short_buffer_is_malformed() {
        let err = decode_mint_account(&[0u8; 81]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedAccount {
                len: 81,
                expected: MINT_LEN
            }
        );
    }

    #[test]
    fn exact_header_has_no_extensions() {
        let mint = decode_mint_account(&[0u8; MINT_LEN]).unwrap();
        assert!(mint.tlv_extensions.is_empty());
        assert!(mint.token_metadata.is_none());
        assert!(mint.extension_issues.is_empty());
    }

    #[test]
    fn extensions_keep_byte_order() {
        let data = MintAccountBuilder::new()
            .extension(3, vec![1, 2, 3])
            .extension(9, vec![4; 10])
            .build();
        let mint = decode_mint_account(&data).unwrap();
        let types: Vec<u8> = mint.tlv_extensions.iter().map(|e| e.extension_type).collect();
        assert_eq!(types, vec![3, 9]);
        assert_eq!(mint.tlv_extensions[0].length, 3);
        assert_eq!(mint.tlv_extensions[0].hex, "010203");
        assert_eq!(mint.tlv_extensions[1].data, vec![4; 10]);
    }

    #[test]
    fn header_is_four_bytes_wide() {
        let mut data = vec![0u8; MINT_LEN];
        // type 5, length 2, reserved byte 0xEE, payload [7, 8]
        data.extend_from_slice(&[5, 2, 0, 0xEE, 7, 8]);
        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.tlv_extensions.len(), 1);
        assert_eq!(mint.tlv_extensions[0].data, vec![7, 8]);
    }

    #[test]
    fn zero_type_terminates_chain() {
        let mut data = MintAccountBuilder::new().extension(2, vec![9; 4]).build();
        data.push(0);
        data.extend_from_slice(&[7, 1, 0, 0, 1]);
        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.tlv_extensions.len(), 1);
        assert_eq!(mint.tlv_extensions[0].extension_type, 2);
        assert!(mint.extension_issues.is_empty());
    }

    #[test]
    fn zero_length_terminates_chain() {
        let mut data = MintAccountBuilder::new().extension(2, vec![9; 4]).build();
        data.extend_from_slice(&[7, 0, 0, 0, 1, 2, 3]);
        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.tlv_extensions.len(), 1);
    }

    #[test]
    fn overrunning_extension_stops_parsing_without_failing() {
        let mut data = MintAccountBuilder::new()
            .supply(5)
            .extension(2, vec![1; 4])
            .build();
        // declares 100 bytes, carries 3
        data.extend_from_slice(&[8, 100, 0, 0, 1, 2, 3]);

        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.supply, 5);
        assert_eq!(mint.tlv_extensions.len(), 1);
        assert_eq!(mint.extension_issues.len(), 1);
        let issue = &mint.extension_issues[0];
        assert_eq!(issue.kind, ExtensionIssueKind::Truncated);
        assert_eq!(issue.extension_type, Some(8));
        assert_eq!(issue.offset, MINT_LEN + TLV_HEADER_LEN + 4);
    }

    #[test]
    fn truncated_header_is_reported() {
        let mut data = vec![0u8; MINT_LEN];
        data.extend_from_slice(&[4, 1]);
        let mint = decode_mint_account(&data).unwrap();
        assert!(mint.tlv_extensions.is_empty());
        assert_eq!(mint.extension_issues[0].kind, ExtensionIssueKind::Truncated);
    }

    #[test]
    fn decodes_token_metadata() {
        let update = Address::new([0x22; 32]);
        let data = MintAccountBuilder::new()
            .decimals(0)
            .token_metadata("Mad Lad #1", "MAD", "https://example.com/1.json", update)
            .unwrap()
            .build();

        let mint = decode_mint_account(&data).unwrap();
        let meta = mint.token_metadata.expect("metadata present");
        assert_eq!(meta.name, "Mad Lad #1");
        assert_eq!(meta.symbol, "MAD");
        assert_eq!(meta.uri, "https://example.com/1.json");
        assert_eq!(meta.update_authority, "22".repeat(32));
        assert_eq!(mint.tlv_extensions[0].length as usize, TOKEN_METADATA_MIN_LEN);
    }

    #[test]
    fn first_metadata_extension_wins() {
        let data = MintAccountBuilder::new()
            .token_metadata("first", "ONE", "a", Address::default())
            .unwrap()
            .token_metadata("second", "TWO", "b", Address::default())
            .unwrap()
            .build();
        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.tlv_extensions.len(), 2);
        assert_eq!(mint.token_metadata.unwrap().name, "first");
    }

    #[test]
    fn short_metadata_extension_is_kept_but_not_decoded() {
        let data = MintAccountBuilder::new()
            .extension(TOKEN_METADATA_EXTENSION, vec![b'x'; 100])
            .build();
        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.tlv_extensions.len(), 1);
        assert!(mint.token_metadata.is_none());
        assert_eq!(
            mint.extension_issues[0].kind,
            ExtensionIssueKind::MetadataTooShort
        );
    }

    #[test]
    fn invalid_utf8_metadata_is_flagged() {
        let mut payload = vec![0u8; TOKEN_METADATA_MIN_LEN];
        payload[0] = 0xFF;
        payload[1] = b'a';
        let data = MintAccountBuilder::new()
            .extension(TOKEN_METADATA_EXTENSION, payload)
            .build();
        let mint = decode_mint_account(&data).unwrap();
        assert!(mint.token_metadata.is_some());
        assert_eq!(
            mint.extension_issues[0].kind,
            ExtensionIssueKind::MetadataInvalidUtf8
        );
    }

    #[test]
    fn metadata_field_too_long_is_rejected() {
        let err = MintAccountBuilder::new()
            .token_metadata(&"n".repeat(33), "S", "u", Address::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "name", .. }));
    }

    #[test]
    fn extension_limit_is_enforced() {
        let mut builder = MintAccountBuilder::new();
        for i in 1..=5 {
            builder = builder.extension(i, vec![i]);
        }
        let decoder = MintDecoder::from_config(&CodecConfig {
            max_tlv_extensions: 3,
            ..CodecConfig::default()
        });
        let mint = decoder.decode_bytes(&builder.build()).unwrap();
        assert_eq!(mint.tlv_extensions.len(), 3);
        assert_eq!(mint.extension_issues[0].kind, ExtensionIssueKind::LimitReached);
    }

    #[test]
    fn text_inputs_decode_like_bytes() {
        let data = MintAccountBuilder::new().supply(77).extension(1, vec![1]).build();
        let from_bytes = decode_mint_account(&data).unwrap();

        let b64 = bytes_to_base64(&data);
        assert_eq!(decode_mint_account_text(&b64, Encoding::Base64).unwrap(), from_bytes);
        let hex = format!("0x{}", bytes_to_hex(&data));
        assert_eq!(decode_mint_account_text(&hex, Encoding::Hex).unwrap(), from_bytes);
        let b58 = mintseal_core::bytes_to_base58(&data);
        assert_eq!(decode_mint_account_text(&b58, Encoding::Base58).unwrap(), from_bytes);

        // default encoding is base64
        let decoded = MintDecoder::default()
            .decode(AccountInput::Text(&b64), None)
            .unwrap();
        assert_eq!(decoded, from_bytes);
    }

    #[test]
    fn bad_text_is_invalid_encoding() {
        let err = decode_mint_account_text("0OIl", Encoding::Base58).unwrap_err();
        assert!(matches!(err, DecodeError::Encoding(_)));
    }

    #[test]
    fn reencode_is_byte_identical() {
        let data = MintAccountBuilder::new()
            .supply(u64::MAX)
            .decimals(2)
            .raw_freeze_authority(0, [0x33; 32])
            .extension(1, vec![1, 2])
            .token_metadata("n", "s", "u", Address::new([1; 32]))
            .unwrap()
            .build();
        let mint = decode_mint_account(&data).unwrap();
        assert_eq!(mint.to_bytes(), data);
    }

    #[test]
    fn json_shape() {
        let data = MintAccountBuilder::new().supply(u64::MAX).build();
        let json = serde_json::to_value(decode_mint_account(&data).unwrap()).unwrap();
        assert_eq!(json["supply"], "18446744073709551615");
        assert_eq!(json["isInitialized"], true);
        assert_eq!(json["mintAuthority"]["option"], 0);
        assert!(json["tokenMetadata"].is_null());
        assert!(json.get("extensionIssues").is_none());
    }

    proptest! {
        #[test]
        fn base64_input_is_transparent(data in proptest::collection::vec(any::<u8>(), MINT_LEN..=400)) {
            let direct = decode_mint_account(&data).unwrap();
            let via_text = decode_mint_account_text(&bytes_to_base64(&data), Encoding::Base64).unwrap();
            prop_assert_eq!(direct, via_text);
        }

        #[test]
        fn arbitrary_tails_never_fail(data in proptest::collection::vec(any::<u8>(), MINT_LEN..=600)) {
            let mint = decode_mint_account(&data).unwrap();
            let walked: usize = mint.tlv_extensions.iter().map(|e| TLV_HEADER_LEN + e.data.len()).sum();
            prop_assert!(MINT_LEN + walked <= data.len());
        }
    }
}
