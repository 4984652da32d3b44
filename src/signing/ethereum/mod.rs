//! Ethereum family signer (Ethereum, SmartChain, Polygon)
//!
//! Legacy EIP-155 and EIP-1559 envelopes, with ERC20/721/1155 call data
//! built from the transaction variant.

pub mod abi;
pub mod message;
pub mod rlp;

use super::preimage::{verify_signatures, PreSigningOutput};
use super::ChainSigner;
use crate::address::EthereumAddress;
use crate::coin::CoinType;
use crate::crypto::hash::keccak256;
use crate::crypto::{CurveType, PrivateKey, PublicKey};
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::serde_bytes::{hex_bytes, u128_string, u256_string, u64_string};
use crate::{log_debug, log_info};
use serde::{Deserialize, Serialize};

const EIP1559_TX_TYPE: u8 = 0x02;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    #[default]
    Legacy,
    /// EIP-1559 typed envelope
    Enveloped,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessListItem {
    pub address: String,
    #[serde(with = "crate::serde_bytes::hex_list")]
    pub stored_keys: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transaction {
    Transfer {
        #[serde(with = "u128_string")]
        amount: u128,
        #[serde(default, with = "hex_bytes")]
        data: Vec<u8>,
    },
    Erc20Transfer {
        to: String,
        #[serde(with = "u256_string")]
        amount: [u8; 32],
    },
    Erc20Approve {
        spender: String,
        #[serde(with = "u256_string")]
        amount: [u8; 32],
    },
    Erc721Transfer {
        from: String,
        to: String,
        #[serde(with = "u256_string")]
        token_id: [u8; 32],
    },
    Erc1155Transfer {
        from: String,
        to: String,
        #[serde(with = "u256_string")]
        token_id: [u8; 32],
        #[serde(with = "u256_string")]
        value: [u8; 32],
        #[serde(default, with = "hex_bytes")]
        data: Vec<u8>,
    },
    ContractGeneric {
        #[serde(default, with = "u128_string")]
        amount: u128,
        #[serde(default, with = "hex_bytes")]
        data: Vec<u8>,
    },
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SigningInput {
    #[serde(with = "u64_string")]
    pub chain_id: u64,
    #[serde(with = "u64_string")]
    pub nonce: u64,
    pub tx_mode: TransactionMode,
    #[serde(with = "u128_string")]
    pub gas_price: u128,
    #[serde(with = "u128_string")]
    pub gas_limit: u128,
    #[serde(with = "u128_string")]
    pub max_inclusion_fee_per_gas: u128,
    #[serde(with = "u128_string")]
    pub max_fee_per_gas: u128,
    /// Recipient, or the token contract for token calls; empty deploys a contract
    pub to_address: String,
    #[serde(with = "hex_bytes")]
    pub private_key: Vec<u8>,
    pub access_list: Vec<AccessListItem>,
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningOutput {
    #[serde(with = "hex_bytes")]
    pub encoded: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub v: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub r: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub s: Vec<u8>,
    /// Call data or transfer payload
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub pre_hash: Vec<u8>,
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

fn parse_address(address: &str) -> CoreResult<[u8; 20]> {
    Ok(*EthereumAddress::from_hex(address)?.bytes())
}

/// Transaction fields after the input oneof is resolved
#[derive(Debug, Clone, PartialEq)]
struct UnsignedTransaction {
    mode: TransactionMode,
    chain_id: u64,
    nonce: u64,
    gas_price: u128,
    max_inclusion_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u128,
    to: Option<[u8; 20]>,
    value: u128,
    data: Vec<u8>,
    access_list: Vec<([u8; 20], Vec<Vec<u8>>)>,
}

/// `v` already adjusted for the envelope
struct RecoverableSignature {
    v: u64,
    r: [u8; 32],
    s: [u8; 32],
}

impl UnsignedTransaction {
    fn from_input(input: &SigningInput) -> CoreResult<Self> {
        let transaction = input
            .transaction
            .as_ref()
            .ok_or_else(|| CoreError::invalid_transaction("Missing transaction variant"))?;

        let (to, value, data) = match transaction {
            Transaction::Transfer { amount, data } | Transaction::ContractGeneric { amount, data } => {
                let to = if input.to_address.is_empty() {
                    None
                } else {
                    Some(parse_address(&input.to_address)?)
                };
                (to, *amount, data.clone())
            }
            Transaction::Erc20Transfer { to, amount } => {
                let data = abi::erc20_transfer(parse_address(to)?, *amount);
                (Some(parse_address(&input.to_address)?), 0, data)
            }
            Transaction::Erc20Approve { spender, amount } => {
                let data = abi::erc20_approve(parse_address(spender)?, *amount);
                (Some(parse_address(&input.to_address)?), 0, data)
            }
            Transaction::Erc721Transfer { from, to, token_id } => {
                let data = abi::erc721_transfer_from(parse_address(from)?, parse_address(to)?, *token_id);
                (Some(parse_address(&input.to_address)?), 0, data)
            }
            Transaction::Erc1155Transfer {
                from,
                to,
                token_id,
                value,
                data,
            } => {
                let data = abi::erc1155_safe_transfer_from(
                    parse_address(from)?,
                    parse_address(to)?,
                    *token_id,
                    *value,
                    data.clone(),
                );
                (Some(parse_address(&input.to_address)?), 0, data)
            }
        };

        let access_list = input
            .access_list
            .iter()
            .map(|item| Ok((parse_address(&item.address)?, item.stored_keys.clone())))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            mode: input.tx_mode,
            chain_id: input.chain_id,
            nonce: input.nonce,
            gas_price: input.gas_price,
            max_inclusion_fee_per_gas: input.max_inclusion_fee_per_gas,
            max_fee_per_gas: input.max_fee_per_gas,
            gas_limit: input.gas_limit,
            to,
            value,
            data,
            access_list,
        })
    }

    fn encoded_access_list(&self) -> Vec<u8> {
        let items: Vec<Vec<u8>> = self
            .access_list
            .iter()
            .map(|(address, keys)| {
                let keys: Vec<Vec<u8>> = keys.iter().map(|k| rlp::encode_bytes(k)).collect();
                rlp::encode_list(&[rlp::encode_bytes(address), rlp::encode_list(&keys)])
            })
            .collect();
        rlp::encode_list(&items)
    }

    /// Common leading fields of the signed and unsigned forms
    fn fields(&self) -> Vec<Vec<u8>> {
        match self.mode {
            TransactionMode::Legacy => vec![
                rlp::encode_u64(self.nonce),
                rlp::encode_u128(self.gas_price),
                rlp::encode_u128(self.gas_limit),
                rlp::encode_address(self.to.as_ref()),
                rlp::encode_u128(self.value),
                rlp::encode_bytes(&self.data),
            ],
            TransactionMode::Enveloped => vec![
                rlp::encode_u64(self.chain_id),
                rlp::encode_u64(self.nonce),
                rlp::encode_u128(self.max_inclusion_fee_per_gas),
                rlp::encode_u128(self.max_fee_per_gas),
                rlp::encode_u128(self.gas_limit),
                rlp::encode_address(self.to.as_ref()),
                rlp::encode_u128(self.value),
                rlp::encode_bytes(&self.data),
                self.encoded_access_list(),
            ],
        }
    }

    /// Bytes whose keccak256 is signed
    fn pre_image(&self) -> Vec<u8> {
        let mut fields = self.fields();
        match self.mode {
            TransactionMode::Legacy => {
                // Pre-EIP-155 transactions sign only the six base fields
                if self.chain_id != 0 {
                    fields.push(rlp::encode_u64(self.chain_id));
                    fields.push(rlp::encode_u64(0));
                    fields.push(rlp::encode_u64(0));
                }
                rlp::encode_list(&fields)
            }
            TransactionMode::Enveloped => {
                let mut out = vec![EIP1559_TX_TYPE];
                out.extend_from_slice(&rlp::encode_list(&fields));
                out
            }
        }
    }

    fn pre_hash(&self) -> [u8; 32] {
        keccak256(&self.pre_image())
    }

    /// Split a 65-byte `r || s || recid` signature and fold the recovery id into `v`
    fn signature(&self, raw: &[u8]) -> CoreResult<RecoverableSignature> {
        if raw.len() != 65 {
            return Err(CoreError::invalid_input(format!(
                "Expected a 65-byte signature, got {}",
                raw.len()
            )));
        }
        let recid = match raw[64] {
            v @ (27 | 28) => (v - 27) as u64,
            v => v as u64,
        };
        let v = match self.mode {
            TransactionMode::Legacy if self.chain_id == 0 => recid + 27,
            TransactionMode::Legacy => self
                .chain_id
                .checked_mul(2)
                .and_then(|v| v.checked_add(35 + recid))
                .ok_or_else(|| CoreError::invalid_input("chain_id too large for EIP-155 replay protection"))?,
            TransactionMode::Enveloped => recid,
        };
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&raw[..32]);
        s.copy_from_slice(&raw[32..64]);
        Ok(RecoverableSignature { v, r, s })
    }

    fn encode(&self, signature: &RecoverableSignature) -> Vec<u8> {
        let mut fields = self.fields();
        fields.push(rlp::encode_u64(signature.v));
        fields.push(rlp::encode_uint_bytes(&signature.r));
        fields.push(rlp::encode_uint_bytes(&signature.s));
        match self.mode {
            TransactionMode::Legacy => rlp::encode_list(&fields),
            TransactionMode::Enveloped => {
                let mut out = vec![EIP1559_TX_TYPE];
                out.extend_from_slice(&rlp::encode_list(&fields));
                out
            }
        }
    }

    fn output(&self, signature: &RecoverableSignature) -> SigningOutput {
        let v_bytes = signature.v.to_be_bytes();
        let start = v_bytes.iter().take_while(|&&b| b == 0).count();
        SigningOutput {
            encoded: self.encode(signature),
            v: v_bytes[start..].to_vec(),
            r: signature.r.to_vec(),
            s: signature.s.to_vec(),
            data: self.data.clone(),
            pre_hash: self.pre_hash().to_vec(),
            ..Default::default()
        }
    }
}

pub struct EthereumSigner;

impl ChainSigner for EthereumSigner {
    type Input = SigningInput;
    type Output = SigningOutput;

    fn sign(coin: CoinType, input: &SigningInput) -> CoreResult<SigningOutput> {
        let tx = UnsignedTransaction::from_input(input)?;
        let key = PrivateKey::new(&input.private_key)?;
        let raw = key.sign(&tx.pre_hash(), CurveType::Secp256k1)?;
        let signature = tx.signature(&raw)?;
        log_info!(
            "ethereum",
            "Signed transaction",
            coin = coin.id(),
            chain_id = tx.chain_id,
            nonce = tx.nonce
        );
        Ok(tx.output(&signature))
    }

    fn preimage_hashes(coin: CoinType, input: &SigningInput) -> CoreResult<PreSigningOutput> {
        let tx = UnsignedTransaction::from_input(input)?;
        log_debug!("ethereum", "Computed pre-image", coin = coin.id(), nonce = tx.nonce);
        Ok(PreSigningOutput {
            data_hash: tx.pre_hash().to_vec(),
            data: tx.pre_image(),
            ..Default::default()
        })
    }

    fn compile(
        _coin: CoinType,
        input: &SigningInput,
        signatures: &[Vec<u8>],
        public_keys: &[PublicKey],
    ) -> CoreResult<SigningOutput> {
        let tx = UnsignedTransaction::from_input(input)?;
        verify_signatures(&[tx.pre_hash().to_vec()], signatures, public_keys)?;
        let signature = tx.signature(&signatures[0])?;
        Ok(tx.output(&signature))
    }
}
