//! mintseal: token account decoding and client-side encryption CLI
//!
//! Decoding:
//!   mint decode <input>            - decode a mint account (base64/base58/hex)
//!   mint fetch <address>           - fetch and decode a mint from an RPC fixture
//!   token-account decode <input>   - decode a 165-byte token account
//!   ix decode                      - decode one instruction
//!   tx decode <signature>          - decode every instruction of a transaction
//!
//! Encryption:
//!   keygen                         - generate an X25519 key pair
//!   encrypt personal|direct        - encrypt a file or stdin
//!   decrypt                        - decrypt any encryption result
//!   group create|encrypt|decrypt|add-member|remove-member
//!                                  - shared-key groups persisted as JSON files
//!   group create-static|encrypt-static
//!                                  - static groups, opened with `decrypt --group`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use mintseal_codec::{
    decode_token_account_text, default_registry, fetch_mint_account, fetch_transaction,
    AccountInput, InstructionInput, MintDecoder,
};
use mintseal_core::config::MintsealConfig;
use mintseal_core::rpc::FixtureClient;
use mintseal_core::{decode_text, Address, Encoding};
use mintseal_crypto::{
    create_group, decrypt_direct, decrypt_group, decrypt_personal, encrypt_direct, encrypt_group,
    encrypt_personal, CompressionPolicy, EncryptionMethod, EncryptionResult,
    GroupEncryptionMetadata, KeyPair, Permissions, PublicKey, SharedKeyManager,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "mintseal",
    version,
    about = "Token account decoding and client-side encryption",
    long_about = "mintseal: decode token mint accounts, token accounts and instructions, \
                  and encrypt data for one, two or many key holders"
)]
struct Cli {
    /// Path to mintseal.toml configuration file
    #[arg(long, short = 'c', env = "MINTSEAL_CONFIG", default_value = "mintseal.toml")]
    config: PathBuf,

    /// Log level or filter (overrides config)
    #[arg(long, env = "MINTSEAL_LOG")]
    log: Option<String>,

    /// Log output format (overrides config)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Token mint accounts
    Mint {
        #[command(subcommand)]
        action: MintAction,
    },

    /// Token (holder) accounts
    #[command(name = "token-account")]
    TokenAccount {
        #[command(subcommand)]
        action: TokenAccountAction,
    },

    /// Program instructions
    Ix {
        #[command(subcommand)]
        action: IxAction,
    },

    /// Transactions
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },

    /// Generate an X25519 key pair (JSON, includes the secret key)
    Keygen {
        /// Write the key pair here instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Encrypt a file or stdin
    Encrypt {
        #[command(subcommand)]
        action: EncryptAction,
    },

    /// Decrypt a personal, direct or static-group result
    Decrypt {
        /// Key pair file of the reader
        #[arg(long, short = 'k')]
        key: PathBuf,
        /// Encryption result JSON (default: stdin)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Group metadata file, needed for group results
        #[arg(long, short = 'g')]
        group: Option<PathBuf>,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Shared-key groups stored as metadata files
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
}

#[derive(Subcommand, Debug)]
enum MintAction {
    /// Decode mint account data given as text
    Decode {
        input: String,
        /// Text encoding of <input> (default: from config)
        #[arg(long, short = 'e')]
        encoding: Option<Encoding>,
    },
    /// Fetch a mint account through an RPC fixture and decode it
    Fetch {
        address: String,
        /// JSON fixture standing in for the RPC node
        #[arg(long, env = "MINTSEAL_FIXTURE")]
        fixture: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum TokenAccountAction {
    Decode {
        input: String,
        #[arg(long, short = 'e')]
        encoding: Option<Encoding>,
    },
}

#[derive(Subcommand, Debug)]
enum IxAction {
    /// Decode one instruction routed by its program id
    Decode {
        /// Program id (base58)
        #[arg(long, short = 'p')]
        program: Address,
        /// Instruction data
        #[arg(long, short = 'd')]
        data: String,
        /// Encoding of --data
        #[arg(long, default_value = "base58")]
        data_encoding: Encoding,
        /// Account keys in instruction order, comma separated
        #[arg(long, short = 'a', value_delimiter = ',')]
        accounts: Vec<Address>,
    },
}

#[derive(Subcommand, Debug)]
enum TxAction {
    /// Decode every instruction of a transaction from an RPC fixture
    Decode {
        signature: String,
        #[arg(long, env = "MINTSEAL_FIXTURE")]
        fixture: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum EncryptAction {
    /// Only the given key pair can decrypt
    Personal {
        #[arg(long, short = 'k')]
        key: PathBuf,
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Sender and one recipient can decrypt
    Direct {
        /// Sender key pair file
        #[arg(long, short = 'k')]
        key: PathBuf,
        /// Recipient public key (base58)
        #[arg(long)]
        to: PublicKey,
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum GroupAction {
    /// Create a shared-key group; the creator gets full permissions
    Create {
        #[arg(long, short = 'n')]
        name: String,
        /// Creator key pair file
        #[arg(long, short = 'k')]
        key: PathBuf,
        /// Member public keys (base58), comma separated
        #[arg(long, short = 'm', value_delimiter = ',')]
        members: Vec<PublicKey>,
        /// Where to write the group metadata
        #[arg(long, short = 'g')]
        group: PathBuf,
    },
    Encrypt {
        #[arg(long, short = 'g')]
        group: PathBuf,
        #[arg(long, short = 'k')]
        key: PathBuf,
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    Decrypt {
        #[arg(long, short = 'g')]
        group: PathBuf,
        #[arg(long, short = 'k')]
        key: PathBuf,
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Add a member (requires share permission)
    AddMember {
        #[arg(long, short = 'g')]
        group: PathBuf,
        /// Authorizing member's key pair file
        #[arg(long, short = 'k')]
        key: PathBuf,
        #[arg(long, short = 'm')]
        member: PublicKey,
        /// Grant share and revoke as well
        #[arg(long)]
        admin: bool,
    },
    /// Create a static group (no permissions, no rotation)
    CreateStatic {
        #[arg(long, short = 'n')]
        name: String,
        /// Creator key pair file
        #[arg(long, short = 'k')]
        key: PathBuf,
        /// Member public keys (base58), comma separated
        #[arg(long, short = 'm', value_delimiter = ',')]
        members: Vec<PublicKey>,
        /// Where to write the group metadata
        #[arg(long, short = 'g')]
        group: PathBuf,
    },
    /// Encrypt for a static group
    EncryptStatic {
        #[arg(long, short = 'g')]
        group: PathBuf,
        #[arg(long, short = 'k')]
        key: PathBuf,
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Remove a member (requires revoke permission)
    RemoveMember {
        #[arg(long, short = 'g')]
        group: PathBuf,
        #[arg(long, short = 'k')]
        key: PathBuf,
        #[arg(long, short = 'm')]
        member: PublicKey,
        /// Keep the current key instead of rotating (default: from config)
        #[arg(long)]
        no_rotate: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = MintsealConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.unwrap_or(if config.log.format == "json" {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    init_logging(&level, format);

    match cli.command {
        Commands::Mint { action: MintAction::Decode { input, encoding } } => {
            cmd_mint_decode(&config, &input, encoding)
        }
        Commands::Mint { action: MintAction::Fetch { address, fixture } } => {
            cmd_mint_fetch(&config, &address, &fixture).await
        }
        Commands::TokenAccount { action: TokenAccountAction::Decode { input, encoding } } => {
            let encoding = encoding.unwrap_or(config.codec.default_encoding);
            print_json(&decode_token_account_text(&input, encoding)?)
        }
        Commands::Ix { action: IxAction::Decode { program, data, data_encoding, accounts } } => {
            let data = decode_text(&data, data_encoding).context("decoding instruction data")?;
            let input = InstructionInput::new(program, data, accounts);
            print_json(&default_registry().decode_for_program(&input)?)
        }
        Commands::Tx { action: TxAction::Decode { signature, fixture } } => {
            let client = FixtureClient::load(&fixture)
                .with_context(|| format!("loading fixture: {}", fixture.display()))?;
            print_json(&fetch_transaction(&client, &signature, default_registry()).await?)
        }
        Commands::Keygen { out } => cmd_keygen(out.as_deref()),
        Commands::Encrypt { action } => cmd_encrypt(&config, action),
        Commands::Decrypt { key, input, group, out } => {
            cmd_decrypt(&key, input.as_deref(), group.as_deref(), out.as_deref())
        }
        Commands::Group { action } => cmd_group(&config, action),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── I/O helpers ───────────────────────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{rendered}");
    Ok(())
}

/// Read a file, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) => std::fs::read(p).with_context(|| format!("reading {}", p.display())),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Write to a file, or stdout when no path is given.
fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, bytes).with_context(|| format!("writing {}", p.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("writing stdout")?;
            stdout.flush().context("flushing stdout")
        }
    }
}

fn load_key_pair(path: &Path) -> Result<KeyPair> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading key: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing key: {}", path.display()))
}

fn read_result(path: Option<&Path>) -> Result<EncryptionResult> {
    let bytes = read_input(path)?;
    let text = std::str::from_utf8(&bytes).context("encryption result is not UTF-8")?;
    Ok(EncryptionResult::from_json(text)?)
}

fn write_result(path: Option<&Path>, result: &EncryptionResult) -> Result<()> {
    let mut json = result.to_json()?;
    json.push('\n');
    write_output(path, json.as_bytes())
}

// ── decoding commands ─────────────────────────────────────────────────────────

fn cmd_mint_decode(config: &MintsealConfig, input: &str, encoding: Option<Encoding>) -> Result<()> {
    let decoder = MintDecoder::from_config(&config.codec);
    let mint = decoder.decode(AccountInput::Text(input), encoding)?;
    print_json(&mint)
}

async fn cmd_mint_fetch(config: &MintsealConfig, address: &str, fixture: &Path) -> Result<()> {
    let client = FixtureClient::load(fixture)
        .with_context(|| format!("loading fixture: {}", fixture.display()))?;
    let decoder = MintDecoder::from_config(&config.codec);
    let mint = fetch_mint_account(&client, address, &decoder).await?;
    print_json(&mint)
}

// ── encryption commands ───────────────────────────────────────────────────────

fn cmd_keygen(out: Option<&Path>) -> Result<()> {
    let pair = KeyPair::generate();
    let mut json = serde_json::to_string_pretty(&pair)?;
    json.push('\n');
    write_output(out, json.as_bytes())?;
    if out.is_some() {
        eprintln!("public key: {}", pair.public_key);
    }
    Ok(())
}

fn cmd_encrypt(config: &MintsealConfig, action: EncryptAction) -> Result<()> {
    let policy = CompressionPolicy::from_config(&config.crypto);
    match action {
        EncryptAction::Personal { key, input, out } => {
            let owner = load_key_pair(&key)?;
            let plaintext = read_input(input.as_deref())?;
            write_result(out.as_deref(), &encrypt_personal(&plaintext, &owner, &policy)?)
        }
        EncryptAction::Direct { key, to, input, out } => {
            let sender = load_key_pair(&key)?;
            let plaintext = read_input(input.as_deref())?;
            write_result(out.as_deref(), &encrypt_direct(&plaintext, &sender, &to, &policy)?)
        }
    }
}

fn cmd_decrypt(
    key: &Path,
    input: Option<&Path>,
    group: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let reader = load_key_pair(key)?;
    let result = read_result(input)?;
    let plaintext = match result.method {
        EncryptionMethod::Personal => decrypt_personal(&result, &reader)?,
        EncryptionMethod::Direct => decrypt_direct(&result, &reader)?,
        EncryptionMethod::Group => {
            let path = group.context("--group is required for group results")?;
            decrypt_group(&result, &load_static_group(path)?, &reader)?
        }
        EncryptionMethod::SignatureGroup => {
            let path = group.context("--group is required for group results")?;
            let (manager, _) = load_group(path)?;
            manager.decrypt(&result, &reader)?
        }
    };
    write_output(out, &plaintext)
}

fn load_static_group(path: &Path) -> Result<GroupEncryptionMetadata> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading group: {}", path.display()))?;
    Ok(GroupEncryptionMetadata::from_json(&content)?)
}

/// Load a shared-key group file into a fresh manager.
fn load_group(path: &Path) -> Result<(SharedKeyManager, mintseal_crypto::GroupId)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading group: {}", path.display()))?;
    let manager = SharedKeyManager::new();
    let id = manager.import_metadata(&content)?;
    Ok((manager, id))
}

fn save_group(
    manager: &SharedKeyManager,
    id: &mintseal_crypto::GroupId,
    path: &Path,
) -> Result<()> {
    let mut json = manager.export_metadata(id)?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("writing group: {}", path.display()))
}

fn cmd_group(config: &MintsealConfig, action: GroupAction) -> Result<()> {
    let policy = CompressionPolicy::from_config(&config.crypto);
    match action {
        GroupAction::Create { name, key, members, group } => {
            let creator = load_key_pair(&key)?;
            let manager = SharedKeyManager::from_config(&config.crypto);
            let members: Vec<_> = members
                .into_iter()
                .map(|m| (m, Permissions::default()))
                .collect();
            let id = manager.create_shared_key(&name, &creator, &members)?;
            save_group(&manager, &id, &group)?;
            println!("{id}");
            Ok(())
        }
        GroupAction::CreateStatic { name, key, members, group } => {
            let creator = load_key_pair(&key)?;
            let metadata = create_group(&name, &creator, &members)?;
            let mut json = metadata.to_json()?;
            json.push('\n');
            std::fs::write(&group, json)
                .with_context(|| format!("writing group: {}", group.display()))?;
            println!("{}", metadata.group_id);
            Ok(())
        }
        GroupAction::EncryptStatic { group, key, input, out } => {
            let sender = load_key_pair(&key)?;
            let metadata = load_static_group(&group)?;
            let plaintext = read_input(input.as_deref())?;
            write_result(out.as_deref(), &encrypt_group(&plaintext, &metadata, &sender, &policy)?)
        }
        GroupAction::Encrypt { group, key, input, out } => {
            let sender = load_key_pair(&key)?;
            let (manager, id) = load_group(&group)?;
            let manager = manager.with_compression(policy);
            let plaintext = read_input(input.as_deref())?;
            write_result(out.as_deref(), &manager.encrypt(&id, &plaintext, &sender)?)
        }
        GroupAction::Decrypt { group, key, input, out } => {
            let reader = load_key_pair(&key)?;
            let (manager, _) = load_group(&group)?;
            let result = read_result(input.as_deref())?;
            write_output(out.as_deref(), &manager.decrypt(&result, &reader)?)
        }
        GroupAction::AddMember { group, key, member, admin } => {
            let authorizer = load_key_pair(&key)?;
            let (manager, id) = load_group(&group)?;
            let permissions = if admin {
                Permissions::full()
            } else {
                Permissions::default()
            };
            let recipient = manager.add_member(&id, &authorizer, &member, permissions)?;
            save_group(&manager, &id, &group)?;
            tracing::info!(group_id = %id, %member, recipient_id = recipient.0, "member added");
            Ok(())
        }
        GroupAction::RemoveMember { group, key, member, no_rotate } => {
            let authorizer = load_key_pair(&key)?;
            let (manager, id) = load_group(&group)?;
            let rotate = if no_rotate {
                Some(false)
            } else {
                Some(config.crypto.rotate_on_remove)
            };
            manager.remove_member(&id, &authorizer, &member, rotate)?;
            save_group(&manager, &id, &group)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_key(dir: &Path, name: &str) -> (PathBuf, KeyPair) {
        let pair = KeyPair::generate();
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(&pair).unwrap()).unwrap();
        (path, pair)
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_instruction_arguments() {
        let program = Address::new([6u8; 32]).to_string();
        let a = Address::new([1u8; 32]).to_string();
        let b = Address::new([2u8; 32]).to_string();
        let cli = Cli::try_parse_from([
            "mintseal",
            "ix",
            "decode",
            "--program",
            &program,
            "--data",
            "03e8",
            "--data-encoding",
            "hex",
            "--accounts",
            &format!("{a},{b}"),
        ])
        .unwrap();
        match cli.command {
            Commands::Ix { action: IxAction::Decode { accounts, data_encoding, .. } } => {
                assert_eq!(accounts.len(), 2);
                assert_eq!(data_encoding, Encoding::Hex);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn group_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let (admin_key, _) = write_key(dir.path(), "admin.json");
        let (member_key, member) = write_key(dir.path(), "member.json");
        let (_, late) = write_key(dir.path(), "late.json");
        let group = dir.path().join("group.json");
        let config = MintsealConfig::default();

        cmd_group(
            &config,
            GroupAction::Create {
                name: "ops".into(),
                key: admin_key.clone(),
                members: vec![member.public_key],
                group: group.clone(),
            },
        )
        .unwrap();

        cmd_group(
            &config,
            GroupAction::AddMember {
                group: group.clone(),
                key: admin_key.clone(),
                member: late.public_key,
                admin: false,
            },
        )
        .unwrap();

        let plain = dir.path().join("plain.txt");
        let sealed = dir.path().join("sealed.json");
        let opened = dir.path().join("opened.txt");
        std::fs::write(&plain, b"group secret").unwrap();
        cmd_group(
            &config,
            GroupAction::Encrypt {
                group: group.clone(),
                key: admin_key.clone(),
                input: Some(plain),
                out: Some(sealed.clone()),
            },
        )
        .unwrap();

        cmd_decrypt(&member_key, Some(&sealed), Some(&group), Some(&opened)).unwrap();
        assert_eq!(std::fs::read(&opened).unwrap(), b"group secret");

        cmd_group(
            &config,
            GroupAction::RemoveMember {
                group: group.clone(),
                key: admin_key,
                member: late.public_key,
                no_rotate: false,
            },
        )
        .unwrap();
        let (manager, id) = load_group(&group).unwrap();
        let meta = manager.metadata(&id).unwrap();
        assert_eq!(meta.members.len(), 2);
        assert_eq!(meta.key_version, 2);
    }

    #[test]
    fn static_group_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let (creator_key, _) = write_key(dir.path(), "creator.json");
        let (member_key, member) = write_key(dir.path(), "member.json");
        let (outsider_key, _) = write_key(dir.path(), "outsider.json");
        let group = dir.path().join("static.json");
        let config = MintsealConfig::default();

        cmd_group(
            &config,
            GroupAction::CreateStatic {
                name: "board".into(),
                key: creator_key.clone(),
                members: vec![member.public_key],
                group: group.clone(),
            },
        )
        .unwrap();
        assert_eq!(load_static_group(&group).unwrap().key_shares.len(), 2);

        let plain = dir.path().join("minutes.txt");
        let sealed = dir.path().join("minutes.sealed");
        let opened = dir.path().join("minutes.out");
        std::fs::write(&plain, b"static minutes").unwrap();
        cmd_group(
            &config,
            GroupAction::EncryptStatic {
                group: group.clone(),
                key: creator_key,
                input: Some(plain),
                out: Some(sealed.clone()),
            },
        )
        .unwrap();
        assert_eq!(read_result(Some(&sealed)).unwrap().method, EncryptionMethod::Group);

        cmd_decrypt(&member_key, Some(&sealed), Some(&group), Some(&opened)).unwrap();
        assert_eq!(std::fs::read(&opened).unwrap(), b"static minutes");
        assert!(cmd_decrypt(&outsider_key, Some(&sealed), Some(&group), None).is_err());
        assert!(cmd_decrypt(&member_key, Some(&sealed), None, None).is_err());
    }

    #[test]
    fn parses_static_group_commands() {
        let member = KeyPair::generate().public_key.to_string();
        let cli = Cli::try_parse_from([
            "mintseal", "group", "create-static", "-n", "board", "-k", "k.json", "-m", &member,
            "-g", "g.json",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Group { action: GroupAction::CreateStatic { ref members, .. } } if members.len() == 1
        ));
    }

    #[test]
    fn personal_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let (key, _) = write_key(dir.path(), "me.json");
        let plain = dir.path().join("notes.txt");
        let sealed = dir.path().join("notes.sealed");
        let opened = dir.path().join("notes.out");
        std::fs::write(&plain, b"remember the seed").unwrap();

        cmd_encrypt(
            &MintsealConfig::default(),
            EncryptAction::Personal {
                key: key.clone(),
                input: Some(plain),
                out: Some(sealed.clone()),
            },
        )
        .unwrap();
        cmd_decrypt(&key, Some(&sealed), None, Some(&opened)).unwrap();
        assert_eq!(std::fs::read(&opened).unwrap(), b"remember the seed");
    }

    #[test]
    fn group_result_needs_group_file() {
        let dir = tempfile::tempdir().unwrap();
        let (key, pair) = write_key(dir.path(), "me.json");
        let manager = SharedKeyManager::new();
        let id = manager.create_shared_key("solo", &pair, &[]).unwrap();
        let sealed = dir.path().join("sealed.json");
        std::fs::write(&sealed, manager.encrypt(&id, b"x", &pair).unwrap().to_json().unwrap())
            .unwrap();
        assert!(cmd_decrypt(&key, Some(&sealed), None, None).is_err());
    }
}
