//! Signing payload and signed extrinsic (format version 4)

use super::call::CallEncoder;
use crate::crypto::hash::blake2b_256;
use crate::encoding::scale::{Compact, Era, ScaleEncode};

const SIGNED_V4: u8 = 0x84;
const ED25519_SIGNATURE: u8 = 0x00;
/// Payloads longer than this are hashed before signing
const MAX_PLAIN_PAYLOAD: usize = 256;

#[derive(Debug, Clone)]
pub struct Extrinsic {
    pub call: Vec<u8>,
    pub era: Era,
    pub nonce: u64,
    pub tip: u128,
    pub spec_version: u32,
    pub transaction_version: u32,
    pub genesis_hash: [u8; 32],
    pub block_hash: [u8; 32],
    /// Include the `CheckMetadataHash` extension, disabled
    pub check_metadata: bool,
}

impl Extrinsic {
    /// Signed extensions carried inside the extrinsic
    fn encode_extra(&self, out: &mut Vec<u8>) {
        self.era.encode_to(out);
        Compact(self.nonce as u128).encode_to(out);
        Compact(self.tip).encode_to(out);
        if self.check_metadata {
            out.push(0x00);
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut out = self.call.clone();
        self.encode_extra(&mut out);
        self.spec_version.encode_to(&mut out);
        self.transaction_version.encode_to(&mut out);
        out.extend_from_slice(&self.genesis_hash);
        out.extend_from_slice(&self.block_hash);
        if self.check_metadata {
            // No metadata hash
            out.push(0x00);
        }
        out
    }

    /// Bytes handed to ed25519
    pub fn signing_message(&self) -> Vec<u8> {
        let payload = self.payload();
        if payload.len() > MAX_PLAIN_PAYLOAD {
            blake2b_256(&payload).to_vec()
        } else {
            payload
        }
    }

    pub fn encode_signed(&self, encoder: &CallEncoder, signer: &[u8; 32], signature: &[u8]) -> Vec<u8> {
        let mut body = vec![SIGNED_V4];
        encoder.account(signer, &mut body);
        body.push(ED25519_SIGNATURE);
        body.extend_from_slice(signature);
        self.encode_extra(&mut body);
        body.extend_from_slice(&self.call);

        let mut out = Vec::with_capacity(body.len() + 4);
        Compact(body.len() as u128).encode_to(&mut out);
        out.extend_from_slice(&body);
        out
    }
}
