//! Solana legacy-message transfers
//!
//! The message is signed as-is with ed25519; the wire transaction is
//! `compact(signatures) || signatures || message`.

use super::preimage::{verify_signatures, PreSigningOutput};
use super::ChainSigner;
use crate::address::SolanaAddress;
use crate::coin::CoinType;
use crate::crypto::{CurveType, PrivateKey, PublicKey, PublicKeyType};
use crate::encoding::base58::{self, Base58Alphabet};
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::serde_bytes::{hex_bytes, u64_string};
use crate::{log_debug, log_info};
use serde::{Deserialize, Serialize};

const SYSTEM_PROGRAM: [u8; 32] = [0u8; 32];
const MEMO_PROGRAM: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";
const SYSTEM_TRANSFER: u32 = 2;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transfer {
    pub recipient: String,
    #[serde(with = "u64_string")]
    pub value: u64,
    pub memo: Option<String>,
    /// Base58 accounts attached read-only to the transfer, for payment tracking
    pub references: Vec<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SigningInput {
    #[serde(with = "hex_bytes")]
    pub private_key: Vec<u8>,
    /// Base58 sender, used when no private key is given (external signing)
    pub sender: String,
    pub recent_blockhash: String,
    pub transfer: Transfer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningOutput {
    pub encoded: String,
    pub unsigned_tx: String,
    pub signature: String,
    pub error: ErrorCode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl From<CoreError> for SigningOutput {
    fn from(e: CoreError) -> Self {
        Self {
            error: e.code,
            error_message: e.message,
            ..Default::default()
        }
    }
}

/// Solana's short vector length prefix
fn encode_compact_u16(mut value: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn compact_len(len: usize, out: &mut Vec<u8>) -> CoreResult<()> {
    let len = u16::try_from(len).map_err(|_| CoreError::invalid_transaction("Too many items in message"))?;
    encode_compact_u16(len, out);
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct AccountMeta {
    key: [u8; 32],
    signer: bool,
    writable: bool,
}

struct Instruction {
    program: [u8; 32],
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

fn transfer_instruction(from: [u8; 32], to: [u8; 32], lamports: u64, references: &[[u8; 32]]) -> Instruction {
    let mut data = SYSTEM_TRANSFER.to_le_bytes().to_vec();
    data.extend_from_slice(&lamports.to_le_bytes());
    let mut accounts = vec![
        AccountMeta { key: from, signer: true, writable: true },
        AccountMeta { key: to, signer: false, writable: true },
    ];
    accounts.extend(
        references
            .iter()
            .map(|&key| AccountMeta { key, signer: false, writable: false }),
    );
    Instruction {
        program: SYSTEM_PROGRAM,
        accounts,
        data,
    }
}

fn memo_instruction(memo: &str) -> CoreResult<Instruction> {
    let program = SolanaAddress::from_base58(MEMO_PROGRAM)?;
    Ok(Instruction {
        program: *program.bytes(),
        accounts: Vec::new(),
        data: memo.as_bytes().to_vec(),
    })
}

/// Legacy message with its account table
struct Message {
    keys: Vec<AccountMeta>,
    blockhash: [u8; 32],
    instructions: Vec<Instruction>,
}

impl Message {
    fn new(payer: [u8; 32], blockhash: [u8; 32], instructions: Vec<Instruction>) -> Self {
        let mut keys: Vec<AccountMeta> = vec![AccountMeta { key: payer, signer: true, writable: true }];
        let mut add = |meta: AccountMeta| match keys.iter_mut().find(|k| k.key == meta.key) {
            Some(existing) => {
                existing.signer |= meta.signer;
                existing.writable |= meta.writable;
            }
            None => keys.push(meta),
        };
        for account in instructions.iter().flat_map(|i| &i.accounts) {
            add(*account);
        }
        // Program ids go after every instruction account
        for instruction in &instructions {
            add(AccountMeta { key: instruction.program, signer: false, writable: false });
        }
        // Writable signers, readonly signers, writable, readonly; stable within each group
        keys.sort_by_key(|k| (!k.signer, !k.writable));
        Self { keys, blockhash, instructions }
    }

    fn index_of(&self, key: &[u8; 32]) -> CoreResult<u8> {
        self.keys
            .iter()
            .position(|k| &k.key == key)
            .map(|i| i as u8)
            .ok_or_else(|| CoreError::internal("Account missing from message"))
    }

    fn serialize(&self) -> CoreResult<Vec<u8>> {
        let signed = self.keys.iter().filter(|k| k.signer).count();
        let readonly_signed = self.keys.iter().filter(|k| k.signer && !k.writable).count();
        let readonly_unsigned = self.keys.iter().filter(|k| !k.signer && !k.writable).count();

        let mut out = vec![signed as u8, readonly_signed as u8, readonly_unsigned as u8];
        compact_len(self.keys.len(), &mut out)?;
        for key in &self.keys {
            out.extend_from_slice(&key.key);
        }
        out.extend_from_slice(&self.blockhash);
        compact_len(self.instructions.len(), &mut out)?;
        for instruction in &self.instructions {
            out.push(self.index_of(&instruction.program)?);
            compact_len(instruction.accounts.len(), &mut out)?;
            for account in &instruction.accounts {
                out.push(self.index_of(&account.key)?);
            }
            compact_len(instruction.data.len(), &mut out)?;
            out.extend_from_slice(&instruction.data);
        }
        Ok(out)
    }
}

fn decode_hash(value: &str) -> CoreResult<[u8; 32]> {
    base58::decode(value, Base58Alphabet::Bitcoin)
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .ok_or_else(|| CoreError::invalid_input(format!("Invalid recent blockhash: {}", value)))
}

fn sender(input: &SigningInput) -> CoreResult<[u8; 32]> {
    if input.private_key.is_empty() {
        return Ok(*SolanaAddress::from_base58(&input.sender)?.bytes());
    }
    let public = PrivateKey::new(&input.private_key)?.public_key(PublicKeyType::Ed25519)?;
    public
        .bytes()
        .try_into()
        .map_err(|_| CoreError::invalid_public_key("Expected a 32-byte ed25519 key"))
}

fn message_for(input: &SigningInput, from: [u8; 32]) -> CoreResult<Vec<u8>> {
    let to = SolanaAddress::from_base58(&input.transfer.recipient)?;
    let blockhash = decode_hash(&input.recent_blockhash)?;
    let mut instructions = Vec::new();
    if let Some(memo) = input.transfer.memo.as_deref().filter(|m| !m.is_empty()) {
        instructions.push(memo_instruction(memo)?);
    }
    let references = input
        .transfer
        .references
        .iter()
        .map(|r| SolanaAddress::from_base58(r).map(|a| *a.bytes()))
        .collect::<CoreResult<Vec<_>>>()?;
    instructions.push(transfer_instruction(from, *to.bytes(), input.transfer.value, &references));
    Message::new(from, blockhash, instructions).serialize()
}

fn output(message: &[u8], signature: &[u8]) -> SigningOutput {
    let mut encoded = Vec::with_capacity(1 + signature.len() + message.len());
    encode_compact_u16(1, &mut encoded);
    encoded.extend_from_slice(signature);
    encoded.extend_from_slice(message);
    SigningOutput {
        encoded: base58::encode(&encoded, Base58Alphabet::Bitcoin),
        unsigned_tx: base58::encode(message, Base58Alphabet::Bitcoin),
        signature: base58::encode(signature, Base58Alphabet::Bitcoin),
        ..Default::default()
    }
}

pub struct SolanaSigner;

impl ChainSigner for SolanaSigner {
    type Input = SigningInput;
    type Output = SigningOutput;

    fn sign(coin: CoinType, input: &SigningInput) -> CoreResult<SigningOutput> {
        let key = PrivateKey::new(&input.private_key)?;
        let message = message_for(input, sender(input)?)?;
        let signature = key.sign(&message, CurveType::Ed25519)?;
        log_info!(
            "solana",
            "Signed transfer",
            coin = coin.id(),
            value = input.transfer.value,
            recipient = input.transfer.recipient
        );
        Ok(output(&message, &signature))
    }

    fn preimage_hashes(coin: CoinType, input: &SigningInput) -> CoreResult<PreSigningOutput> {
        let message = message_for(input, sender(input)?)?;
        log_debug!("solana", "Computed pre-image", coin = coin.id(), size = message.len());
        Ok(PreSigningOutput {
            data_hash: message.clone(),
            data: message,
            ..Default::default()
        })
    }

    fn compile(
        _coin: CoinType,
        input: &SigningInput,
        signatures: &[Vec<u8>],
        public_keys: &[PublicKey],
    ) -> CoreResult<SigningOutput> {
        let from: [u8; 32] = public_keys
            .first()
            .and_then(|k| k.bytes().try_into().ok())
            .ok_or_else(|| CoreError::invalid_public_key("Expected one ed25519 public key"))?;
        let message = message_for(input, from)?;
        verify_signatures(&[message.clone()], signatures, public_keys)?;
        Ok(output(&message, &signatures[0]))
    }
}
