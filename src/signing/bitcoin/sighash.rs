//! Signature hashes: legacy and BIP143 (segwit v0, and Bitcoin Cash forkid)

use crate::crypto::hash::sha256d;
use crate::error::{CoreError, CoreResult};
use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::Hash;
use bitcoin::sighash::SighashCache;
use bitcoin::{Script, ScriptBuf, Transaction};

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_NONE: u32 = 0x02;
pub const SIGHASH_SINGLE: u32 = 0x03;
pub const SIGHASH_FORKID: u32 = 0x40;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

fn base_type(hash_type: u32) -> u32 {
    hash_type & 0x1f
}

pub fn is_forkid(hash_type: u32) -> bool {
    hash_type & SIGHASH_FORKID != 0
}

/// Pre-segwit digest over the transaction with `script_code` in the signed input
pub fn legacy(tx: &Transaction, input_index: usize, script_code: &[u8], hash_type: u32) -> CoreResult<[u8; 32]> {
    let cache = SighashCache::new(tx);
    let hash = cache
        .legacy_signature_hash(input_index, Script::from_bytes(script_code), hash_type)
        .map_err(|e| CoreError::invalid_transaction(format!("Legacy sighash failed: {}", e)))?;
    Ok(hash.to_byte_array())
}

/// BIP143 digest, used by segwit v0 inputs and by every Bitcoin Cash input
pub fn bip143(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: u64,
    hash_type: u32,
) -> CoreResult<[u8; 32]> {
    let input = tx
        .input
        .get(input_index)
        .ok_or_else(|| CoreError::invalid_transaction(format!("No input at index {}", input_index)))?;
    let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;
    let base = base_type(hash_type);

    let hash_prevouts = if anyone_can_pay {
        [0u8; 32]
    } else {
        let prevouts: Vec<u8> = tx.input.iter().flat_map(|i| serialize(&i.previous_output)).collect();
        sha256d(&prevouts)
    };

    let hash_sequence = if anyone_can_pay || base == SIGHASH_SINGLE || base == SIGHASH_NONE {
        [0u8; 32]
    } else {
        let sequences: Vec<u8> = tx.input.iter().flat_map(|i| i.sequence.0.to_le_bytes()).collect();
        sha256d(&sequences)
    };

    let hash_outputs = if base != SIGHASH_SINGLE && base != SIGHASH_NONE {
        let outputs: Vec<u8> = tx.output.iter().flat_map(serialize).collect();
        sha256d(&outputs)
    } else if base == SIGHASH_SINGLE && input_index < tx.output.len() {
        sha256d(&serialize(&tx.output[input_index]))
    } else {
        [0u8; 32]
    };

    let mut preimage = Vec::with_capacity(156 + script_code.len());
    preimage.extend_from_slice(&tx.version.0.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequence);
    preimage.extend_from_slice(&serialize(&input.previous_output));
    preimage.extend_from_slice(&serialize(&ScriptBuf::from_bytes(script_code.to_vec())));
    preimage.extend_from_slice(&amount.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.0.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&tx.lock_time.to_consensus_u32().to_le_bytes());
    preimage.extend_from_slice(&hash_type.to_le_bytes());
    Ok(sha256d(&preimage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::absolute::LockTime;
    use bitcoin::transaction::Version;
    use bitcoin::{Amount, OutPoint, Sequence, TxIn, TxOut, Txid, Witness};
    use std::str::FromStr;

    /// Unsigned transaction from the BIP143 native P2WPKH example
    fn bip143_example() -> Transaction {
        let input = |txid: &str, vout: u32, sequence: u32| TxIn {
            previous_output: OutPoint::new(Txid::from_str(txid).unwrap(), vout),
            script_sig: ScriptBuf::new(),
            sequence: Sequence(sequence),
            witness: Witness::default(),
        };
        let output = |value: u64, script: &str| TxOut {
            value: Amount::from_sat(value),
            script_pubkey: ScriptBuf::from_bytes(hex::decode(script).unwrap()),
        };
        Transaction {
            version: Version(1),
            lock_time: LockTime::from_consensus(0x11),
            input: vec![
                input("9f96ade4b41d5433f4eda31e1738ec2b36f6e7d1420d94a6af99801a88f7f7ff", 0, 0xffffffee),
                input("8ac60eb9575db5b2d987e29f305b1b819ea83a5c6579d282d189cc04b8e151ef", 1, 0xffffffff),
            ],
            output: vec![
                output(112340000, "76a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac"),
                output(223450000, "76a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac"),
            ],
        }
    }

    #[test]
    fn test_bip143_p2wpkh_digest() {
        let tx = bip143_example();
        let script_code = hex::decode("76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac").unwrap();
        let digest = bip143(&tx, 1, &script_code, 600000000, SIGHASH_ALL).unwrap();
        assert_eq!(
            hex::encode(digest),
            "c37af31116d1b27caf68aae9e3ac82f1477929014d5b917657d0eb49478cb670"
        );
    }

    #[test]
    fn test_out_of_range_input() {
        let tx = bip143_example();
        assert!(bip143(&tx, 5, &[], 0, SIGHASH_ALL).is_err());
        assert!(legacy(&tx, 5, &[], SIGHASH_ALL).is_err());
    }

    #[test]
    fn test_flags() {
        assert!(is_forkid(0x41));
        assert!(!is_forkid(SIGHASH_ALL));
        assert_eq!(base_type(SIGHASH_SINGLE | SIGHASH_ANYONECANPAY), SIGHASH_SINGLE);
    }
}
