//! Output scripts and the spent-script forms the signer understands

use crate::address::{BitcoinAddress, BitcoinPayload, CoinAddress};
use crate::coin::CoinType;
use crate::error::{CoreError, CoreResult};

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_1: u8 = 0x51;

pub fn p2pkh(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = vec![OP_DUP, OP_HASH160, 20];
    script.extend_from_slice(hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

pub fn p2sh(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = vec![OP_HASH160, 20];
    script.extend_from_slice(hash);
    script.push(OP_EQUAL);
    script
}

pub fn witness_program(version: u8, program: &[u8]) -> Vec<u8> {
    let op = if version == 0 { OP_0 } else { OP_1 + version - 1 };
    let mut script = vec![op, program.len() as u8];
    script.extend_from_slice(program);
    script
}

/// Script paying to `address` on `coin`, testnet segwit included
pub fn for_address(address: &str, coin: CoinType) -> CoreResult<Vec<u8>> {
    let parsed = BitcoinAddress::parse_any_network(address, coin)?;
    Ok(match parsed.payload() {
        BitcoinPayload::PubkeyHash(hash) => p2pkh(hash),
        BitcoinPayload::ScriptHash(hash) => p2sh(hash),
        BitcoinPayload::Witness { version, program } => witness_program(*version, program),
    })
}

/// Minimal data push
pub fn push_data(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 3);
    match data.len() {
        len if len < OP_PUSHDATA1 as usize => out.push(len as u8),
        len if len <= 0xff => out.extend_from_slice(&[OP_PUSHDATA1, len as u8]),
        len => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
    out
}

/// Form of a previous output's script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpentScript {
    PubkeyHash([u8; 20]),
    PublicKey(Vec<u8>),
    WitnessPubkeyHash([u8; 20]),
}

impl SpentScript {
    pub fn classify(script: &[u8]) -> CoreResult<Self> {
        match script {
            [OP_DUP, OP_HASH160, 20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
                Ok(SpentScript::PubkeyHash(to_hash(hash)))
            }
            [OP_0, 20, hash @ ..] if hash.len() == 20 => Ok(SpentScript::WitnessPubkeyHash(to_hash(hash))),
            [len, key @ .., OP_CHECKSIG] if (*len == 33 || *len == 65) && key.len() == *len as usize => {
                Ok(SpentScript::PublicKey(key.to_vec()))
            }
            _ => Err(CoreError::invalid_transaction(format!(
                "Unsupported script for signing: {}",
                hex::encode(script)
            ))),
        }
    }

    pub fn is_witness(&self) -> bool {
        matches!(self, SpentScript::WitnessPubkeyHash(_))
    }

    /// Script code committed to by the sighash
    pub fn script_code(&self, script: &[u8]) -> Vec<u8> {
        match self {
            SpentScript::WitnessPubkeyHash(hash) => p2pkh(hash),
            _ => script.to_vec(),
        }
    }
}

fn to_hash(bytes: &[u8]) -> [u8; 20] {
    let mut hash = [0u8; 20];
    hash.copy_from_slice(bytes);
    hash
}
