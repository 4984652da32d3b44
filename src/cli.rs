//! `multicoin` command line
//!
//! Thin wrapper over [`crate::operations`]. Commands that take a chain
//! `SigningInput` or a keystore read it from a file argument, or from stdin
//! when the argument is absent or `-`.

use crate::coin::{CoinType, Derivation};
use crate::error::{CoreError, CoreResult};
use crate::keystore::{Cipher, EncryptionLevel};
use crate::operations;
use crate::signing::ethereum::message::MessageType;
use crate::types::*;
use crate::utils::config::{self, CoreConfig};
use crate::wallet::DerivationPath;
use crate::log_warn;
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "multicoin", version, about = "Offline multi-chain wallet toolkit")]
pub struct Cli {
    /// Print the `{"success","data","error"}` envelope instead of plain output
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON settings file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List supported coins
    Coins,
    #[command(subcommand)]
    Mnemonic(MnemonicCommand),
    /// Derive a key and address from a mnemonic
    Derive {
        #[arg(long)]
        coin: CoinType,
        /// Read from stdin when omitted
        #[arg(long)]
        mnemonic: Option<String>,
        #[arg(long, default_value = "")]
        passphrase: String,
        #[arg(long, value_parser = parse_derivation, default_value = "default")]
        derivation: Derivation,
        /// Overrides the coin's default path
        #[arg(long)]
        path: Option<DerivationPath>,
    },
    /// Address for a public or private key
    Address {
        #[arg(long)]
        coin: CoinType,
        #[arg(long, conflicts_with = "private_key")]
        public_key: Option<String>,
        #[arg(long)]
        private_key: Option<String>,
        #[arg(long, value_parser = parse_derivation, default_value = "default")]
        derivation: Derivation,
    },
    /// Check an address
    Validate {
        #[arg(long)]
        coin: CoinType,
        address: String,
        #[arg(long, value_parser = parse_derivation, default_value = "default")]
        derivation: Derivation,
    },
    /// Sign a SigningInput
    Sign {
        #[arg(long)]
        coin: CoinType,
        input: Option<PathBuf>,
    },
    /// Plan a UTXO transaction
    Plan {
        #[arg(long)]
        coin: CoinType,
        input: Option<PathBuf>,
    },
    /// Digests to sign externally
    Preimage {
        #[arg(long)]
        coin: CoinType,
        input: Option<PathBuf>,
    },
    /// Assemble a transaction from external signatures
    Compile {
        #[arg(long)]
        coin: CoinType,
        #[arg(long = "signature", required = true)]
        signatures: Vec<String>,
        #[arg(long = "public-key", required = true)]
        public_keys: Vec<String>,
        input: Option<PathBuf>,
    },
    #[command(subcommand)]
    Keystore(KeystoreCommand),
    #[command(subcommand)]
    Message(MessageCommand),
}

#[derive(Debug, Subcommand)]
pub enum MnemonicCommand {
    /// New random mnemonic
    Generate {
        #[arg(long, default_value_t = 128)]
        strength: u32,
    },
    Validate {
        phrase: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeystoreCommand {
    /// Encrypt a mnemonic, a private key, or a fresh mnemonic
    Create {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long, conflicts_with = "private_key")]
        mnemonic: Option<String>,
        #[arg(long)]
        private_key: Option<String>,
        /// Adds the coin's default account
        #[arg(long)]
        coin: Option<CoinType>,
        #[arg(long, value_parser = parse_level)]
        level: Option<EncryptionLevel>,
        #[arg(long, value_parser = parse_cipher)]
        cipher: Option<Cipher>,
    },
    /// Parse a keystore file and print it normalized
    Import {
        input: Option<PathBuf>,
    },
    Decrypt {
        #[arg(long)]
        password: String,
        input: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum MessageCommand {
    /// EIP-191 signature
    Sign {
        #[arg(long)]
        private_key: String,
        #[arg(long)]
        message: String,
        /// Sign with an EIP-155 `v`
        #[arg(long)]
        chain_id: Option<u64>,
    },
    Verify {
        #[arg(long)]
        message: String,
        #[arg(long)]
        signature: String,
        #[arg(long, conflicts_with = "public_key")]
        address: Option<String>,
        #[arg(long)]
        public_key: Option<String>,
    },
}

fn parse_derivation(raw: &str) -> Result<Derivation, String> {
    Derivation::from_name(raw).ok_or_else(|| format!("unknown derivation {}", raw))
}

fn parse_level(raw: &str) -> Result<EncryptionLevel, String> {
    serde_json::from_value(Value::String(raw.to_string())).map_err(|_| format!("unknown level {}", raw))
}

fn parse_cipher(raw: &str) -> Result<Cipher, String> {
    Cipher::from_name(raw).ok_or_else(|| format!("unknown cipher {}", raw))
}

fn decode_hex(raw: &str) -> CoreResult<Vec<u8>> {
    Ok(crate::encoding::decode_hex(raw)?)
}

/// File contents, or stdin for `None` and `-`
fn read_input(path: Option<&Path>) -> CoreResult<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn read_json(path: Option<&Path>) -> CoreResult<Value> {
    Ok(serde_json::from_str(&read_input(path)?)?)
}

/// Result of one command: JSON data plus its plain-text rendering
pub struct Rendered {
    pub data: Value,
    pub text: String,
}

impl Rendered {
    fn json<T: Serialize>(data: &T) -> CoreResult<Self> {
        let data = serde_json::to_value(data)?;
        let text = serde_json::to_string_pretty(&data)?;
        Ok(Self { data, text })
    }

    fn with_text<T: Serialize>(data: &T, text: impl Into<String>) -> CoreResult<Self> {
        Ok(Self {
            data: serde_json::to_value(data)?,
            text: text.into(),
        })
    }
}

pub fn execute(command: &Commands) -> CoreResult<Rendered> {
    match command {
        Commands::Coins => {
            let coins = operations::coins();
            let text = coins
                .iter()
                .map(|c| format!("{:<12} {:<6} {:>9}  {}", c.id, c.symbol, c.slip44, c.derivation_path))
                .collect::<Vec<_>>()
                .join("\n");
            Rendered::with_text(&coins, text)
        }
        Commands::Mnemonic(MnemonicCommand::Generate { strength }) => {
            let response = operations::generate_mnemonic(&MnemonicRequest { strength: *strength })?;
            Rendered::with_text(&response, response.mnemonic.clone())
        }
        Commands::Mnemonic(MnemonicCommand::Validate { phrase }) => {
            let result = operations::validate_mnemonic(&MnemonicValidateRequest {
                mnemonic: phrase.clone(),
            });
            Rendered::with_text(&result, if result.valid { "valid" } else { "invalid" })
        }
        Commands::Derive {
            coin,
            mnemonic,
            passphrase,
            derivation,
            path,
        } => {
            let mnemonic = match mnemonic {
                Some(phrase) => phrase.clone(),
                None => read_input(None)?.trim().to_string(),
            };
            let key = operations::hd_derive(&HdDeriveRequest {
                mnemonic,
                passphrase: passphrase.clone(),
                coin: *coin,
                derivation: *derivation,
                path: path.clone(),
            })?;
            Rendered::json(&key)
        }
        Commands::Address {
            coin,
            public_key,
            private_key,
            derivation,
        } => {
            let info = operations::derive_address(&DeriveAddressRequest {
                coin: *coin,
                public_key: public_key.as_deref().map(decode_hex).transpose()?.unwrap_or_default(),
                private_key: private_key.as_deref().map(decode_hex).transpose()?.unwrap_or_default(),
                derivation: *derivation,
            })?;
            Rendered::with_text(&info, info.address.clone())
        }
        Commands::Validate {
            coin,
            address,
            derivation,
        } => {
            let result = operations::validate_address(&AddressRequest {
                coin: *coin,
                address: address.clone(),
                derivation: *derivation,
            });
            let text = if result.valid { "valid" } else { "invalid" };
            Rendered::with_text(&result, text)
        }
        Commands::Sign { coin, input } => {
            let request = SignRequest {
                coin: *coin,
                input: read_json(input.as_deref())?,
            };
            Rendered::json(&operations::sign(&request)?)
        }
        Commands::Plan { coin, input } => {
            let request = SignRequest {
                coin: *coin,
                input: read_json(input.as_deref())?,
            };
            Rendered::json(&operations::plan(&request)?)
        }
        Commands::Preimage { coin, input } => {
            let request = SignRequest {
                coin: *coin,
                input: read_json(input.as_deref())?,
            };
            Rendered::json(&operations::pre_image_hashes(&request)?)
        }
        Commands::Compile {
            coin,
            signatures,
            public_keys,
            input,
        } => {
            let request = CompileRequest {
                coin: *coin,
                input: read_json(input.as_deref())?,
                signatures: signatures.iter().map(|s| decode_hex(s)).collect::<CoreResult<_>>()?,
                public_keys: public_keys.iter().map(|k| decode_hex(k)).collect::<CoreResult<_>>()?,
            };
            Rendered::json(&operations::compile(&request)?)
        }
        Commands::Keystore(command) => execute_keystore(command),
        Commands::Message(command) => execute_message(command),
    }
}

fn execute_keystore(command: &KeystoreCommand) -> CoreResult<Rendered> {
    match command {
        KeystoreCommand::Create {
            name,
            password,
            mnemonic,
            private_key,
            coin,
            level,
            cipher,
        } => {
            let key = operations::keystore_create(&KeystoreCreateRequest {
                name: name.clone(),
                password: password.clone(),
                mnemonic: mnemonic.clone(),
                private_key: private_key.as_deref().map(decode_hex).transpose()?.unwrap_or_default(),
                coin: *coin,
                level: *level,
                cipher: *cipher,
            })?;
            Rendered::json(&key)
        }
        KeystoreCommand::Import { input } => {
            let key = operations::keystore_import(&KeystoreImportRequest {
                keystore: Value::String(read_input(input.as_deref())?),
            })?;
            Rendered::json(&key)
        }
        KeystoreCommand::Decrypt { password, input } => {
            let secret = operations::keystore_decrypt(&KeystoreDecryptRequest {
                keystore: Value::String(read_input(input.as_deref())?),
                password: password.clone(),
            })?;
            let text = secret
                .mnemonic
                .clone()
                .or_else(|| secret.private_key.clone())
                .unwrap_or_default();
            Rendered::with_text(&secret, text)
        }
    }
}

fn execute_message(command: &MessageCommand) -> CoreResult<Rendered> {
    match command {
        MessageCommand::Sign {
            private_key,
            message,
            chain_id,
        } => {
            let signed = operations::sign_message(&MessageSignRequest {
                private_key: decode_hex(private_key)?,
                message: message.clone(),
                message_type: chain_id.map_or(MessageType::Legacy, |chain_id| MessageType::Eip155 { chain_id }),
            })?;
            Rendered::with_text(&signed, signed.signature.clone())
        }
        MessageCommand::Verify {
            message,
            signature,
            address,
            public_key,
        } => {
            let verification = operations::verify_message(&MessageVerifyRequest {
                message: message.clone(),
                signature: signature.clone(),
                public_key: public_key.as_deref().map(decode_hex).transpose()?.unwrap_or_default(),
                address: address.clone(),
            })?;
            let text = if verification.valid { "valid" } else { "invalid" };
            Rendered::with_text(&verification, text)
        }
    }
}

/// Load `--config`, apply environment overrides and `--verbose`
pub fn configure(cli: &Cli) -> anyhow::Result<()> {
    let base = match &cli.config {
        Some(path) => CoreConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CoreConfig::default(),
    };
    let mut settings = base.with_env();
    if cli.verbose {
        settings.debug_logging = true;
    }
    for warning in config::set_global(settings) {
        log_warn!("cli", "Config", warning = warning);
    }
    Ok(())
}

/// Run the parsed command line, printing to stdout and errors to stderr
pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = configure(&cli) {
        eprintln!("error: {:#}", e);
        return ExitCode::from(2);
    }
    match execute(&cli.command) {
        Ok(rendered) if cli.json => {
            println!("{}", ApiResponse::ok(rendered.data).to_json());
            ExitCode::SUCCESS
        }
        Ok(rendered) => {
            println!("{}", rendered.text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            report(&e, cli.json);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &CoreError, json: bool) {
    if json {
        println!("{}", ApiResponse::<()>::err(error.clone()).to_json());
    } else {
        eprintln!("error: {}", error);
    }
}
