//! Contract call data for the token standards the signer builds itself

use crate::crypto::hash::keccak256;
use crate::serde_bytes::u256_from_u128;

/// Values the token calls need
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address([u8; 20]),
    /// Big-endian uint256
    Uint([u8; 32]),
    Bytes(Vec<u8>),
}

impl Token {
    fn head_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Address(a) => word[12..].copy_from_slice(a),
            Token::Uint(v) => word = *v,
            // Dynamic, written as an offset by the encoder
            Token::Bytes(_) => {}
        }
        word
    }
}

fn uint_word(value: usize) -> [u8; 32] {
    u256_from_u128(value as u128)
}

/// First four bytes of keccak256 over the canonical signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Head/tail encoding of a parameter tuple
pub fn encode_params(tokens: &[Token]) -> Vec<u8> {
    let head_size = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Bytes(bytes) => {
                head.extend_from_slice(&uint_word(head_size + tail.len()));
                tail.extend_from_slice(&uint_word(bytes.len()));
                tail.extend_from_slice(bytes);
                let padding = (32 - bytes.len() % 32) % 32;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
            _ => head.extend_from_slice(&token.head_word()),
        }
    }
    head.extend_from_slice(&tail);
    head
}

pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode_params(tokens));
    data
}

pub fn erc20_transfer(to: [u8; 20], amount: [u8; 32]) -> Vec<u8> {
    encode_call("transfer(address,uint256)", &[Token::Address(to), Token::Uint(amount)])
}

pub fn erc20_approve(spender: [u8; 20], amount: [u8; 32]) -> Vec<u8> {
    encode_call("approve(address,uint256)", &[Token::Address(spender), Token::Uint(amount)])
}

pub fn erc721_transfer_from(from: [u8; 20], to: [u8; 20], token_id: [u8; 32]) -> Vec<u8> {
    encode_call(
        "transferFrom(address,address,uint256)",
        &[Token::Address(from), Token::Address(to), Token::Uint(token_id)],
    )
}

pub fn erc1155_safe_transfer_from(
    from: [u8; 20],
    to: [u8; 20],
    token_id: [u8; 32],
    value: [u8; 32],
    data: Vec<u8>,
) -> Vec<u8> {
    encode_call(
        "safeTransferFrom(address,address,uint256,uint256,bytes)",
        &[
            Token::Address(from),
            Token::Address(to),
            Token::Uint(token_id),
            Token::Uint(value),
            Token::Bytes(data),
        ],
    )
}
