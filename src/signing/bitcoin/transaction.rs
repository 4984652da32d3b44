//! Building and signing the spend described by a plan

use super::plan::TransactionPlan;
use super::script::{self, SpentScript};
use super::sighash::{self, SIGHASH_ALL, SIGHASH_FORKID};
use super::{SigningInput, UnspentTransaction};
use crate::coin::CoinType;
use crate::crypto::hash::hash160;
use crate::crypto::{PrivateKey, PublicKey, PublicKeyType};
use crate::error::{CoreError, CoreResult};
use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};

/// Sighash type for `coin`; Bitcoin Cash always carries the forkid flag
pub fn effective_hash_type(hash_type: u32, coin: CoinType) -> u32 {
    let hash_type = if hash_type == 0 { SIGHASH_ALL } else { hash_type };
    if coin == CoinType::BitcoinCash {
        hash_type | SIGHASH_FORKID
    } else {
        hash_type
    }
}

fn out_point(utxo: &UnspentTransaction) -> OutPoint {
    // JSON carries the display (reversed) txid
    let mut wire = utxo.out_point.hash;
    wire.reverse();
    OutPoint::new(Txid::from_byte_array(wire), utxo.out_point.index)
}

/// Unsigned transaction: plan inputs in order, recipient then change
pub fn unsigned(input: &SigningInput, plan: &TransactionPlan, coin: CoinType) -> CoreResult<Transaction> {
    if plan.utxos.is_empty() {
        return Err(CoreError::invalid_transaction("Plan has no inputs"));
    }
    let mut output = vec![TxOut {
        value: Amount::from_sat(plan.amount),
        script_pubkey: ScriptBuf::from_bytes(script::for_address(&input.to_address, coin)?),
    }];
    if plan.change > 0 {
        output.push(TxOut {
            value: Amount::from_sat(plan.change),
            script_pubkey: ScriptBuf::from_bytes(script::for_address(&input.change_address, coin)?),
        });
    }
    let inputs = plan
        .utxos
        .iter()
        .map(|utxo| TxIn {
            previous_output: out_point(utxo),
            script_sig: ScriptBuf::new(),
            sequence: Sequence(utxo.out_point.sequence),
            witness: Witness::default(),
        })
        .collect();

    Ok(Transaction {
        version: Version(input.version.unwrap_or(1)),
        lock_time: LockTime::from_consensus(input.lock_time),
        input: inputs,
        output,
    })
}

/// What one input needs signed
#[derive(Debug, Clone)]
pub struct InputDigest {
    pub spent: SpentScript,
    pub digest: [u8; 32],
    /// hash160 of the key expected to sign
    pub key_hash: [u8; 20],
}

pub fn input_digests(tx: &Transaction, utxos: &[UnspentTransaction], hash_type: u32) -> CoreResult<Vec<InputDigest>> {
    utxos
        .iter()
        .enumerate()
        .map(|(index, utxo)| {
            let spent = SpentScript::classify(&utxo.script)?;
            let script_code = spent.script_code(&utxo.script);
            let digest = if spent.is_witness() || sighash::is_forkid(hash_type) {
                sighash::bip143(tx, index, &script_code, utxo.amount, hash_type)?
            } else {
                sighash::legacy(tx, index, &script_code, hash_type)?
            };
            let key_hash = match &spent {
                SpentScript::PubkeyHash(hash) | SpentScript::WitnessPubkeyHash(hash) => *hash,
                SpentScript::PublicKey(key) => hash160(key),
            };
            Ok(InputDigest { spent, digest, key_hash })
        })
        .collect()
}

/// Write a DER signature and its public key into input `index`
pub fn apply_signature(
    tx: &mut Transaction,
    index: usize,
    spent: &SpentScript,
    der: &[u8],
    public_key: &[u8],
    hash_type: u32,
) {
    let mut signature = der.to_vec();
    signature.push(hash_type as u8);
    let input = &mut tx.input[index];
    match spent {
        SpentScript::WitnessPubkeyHash(_) => {
            input.witness = Witness::from_slice(&[signature, public_key.to_vec()]);
        }
        SpentScript::PubkeyHash(_) => {
            let mut script_sig = script::push_data(&signature);
            script_sig.extend_from_slice(&script::push_data(public_key));
            input.script_sig = ScriptBuf::from_bytes(script_sig);
        }
        SpentScript::PublicKey(_) => {
            input.script_sig = ScriptBuf::from_bytes(script::push_data(&signature));
        }
    }
}

/// Signing key whose compressed or uncompressed public key hashes to `key_hash`
pub fn find_key<'k>(keys: &'k [PrivateKey], key_hash: &[u8; 20]) -> CoreResult<Option<(&'k PrivateKey, PublicKey)>> {
    for key in keys {
        for key_type in [PublicKeyType::Secp256k1, PublicKeyType::Secp256k1Extended] {
            let public = key.public_key(key_type)?;
            if hash160(public.bytes()) == *key_hash {
                return Ok(Some((key, public)));
            }
        }
    }
    Ok(None)
}
