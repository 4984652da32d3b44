//! Polkadot and Kusama extrinsics signed with ed25519
//!
//! Balance transfers and staking calls, batched through `utility.batch_all`
//! where one request needs two calls.

pub mod call;
pub mod extrinsic;

use self::call::CallEncoder;
use self::extrinsic::Extrinsic;
use super::preimage::{verify_signatures, PreSigningOutput};
use super::ChainSigner;
use crate::coin::CoinType;
use crate::crypto::{CurveType, PrivateKey, PublicKey, PublicKeyType};
use crate::encoding::scale::Era;
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::serde_bytes::{hex32, hex_bytes, u128_string, u64_string};
use crate::{log_debug, log_info};
use serde::{Deserialize, Serialize};

/// First runtime carrying the `CheckMetadataHash` extension
const METADATA_HASH_SPEC: u32 = 1_002_000;

/// Explicit pallet and method index, for runtimes without a built-in table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CallIndices {
    pub module_index: u8,
    pub method_index: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RewardDestination {
    #[default]
    Staked = 0,
    Stash = 1,
    Controller = 2,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Transfer {
    pub to_address: String,
    #[serde(with = "u128_string")]
    pub value: u128,
    /// Up to 32 bytes, zero padded
    pub memo: Option<String>,
    pub call_indices: Option<CallIndices>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceCall {
    Transfer(Transfer),
    BatchTransfer {
        transfers: Vec<Transfer>,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakingCall {
    Bond {
        /// Empty for runtimes whose `bond` has no controller
        #[serde(default)]
        controller: String,
        #[serde(with = "u128_string")]
        value: u128,
        #[serde(default)]
        reward_destination: RewardDestination,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    BondAndNominate {
        #[serde(default)]
        controller: String,
        #[serde(with = "u128_string")]
        value: u128,
        #[serde(default)]
        reward_destination: RewardDestination,
        nominators: Vec<String>,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    BondExtra {
        #[serde(with = "u128_string")]
        value: u128,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    Unbond {
        #[serde(with = "u128_string")]
        value: u128,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    Rebond {
        #[serde(with = "u128_string")]
        value: u128,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    WithdrawUnbonded {
        #[serde(default)]
        slashing_spans: u32,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    Nominate {
        nominators: Vec<String>,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    Chill {
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
    ChillAndUnbond {
        #[serde(with = "u128_string")]
        value: u128,
        #[serde(default)]
        call_indices: Option<CallIndices>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    BalanceCall(BalanceCall),
    StakingCall(StakingCall),
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EraInput {
    pub block_number: u64,
    pub period: u64,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SigningInput {
    #[serde(with = "hex32")]
    pub block_hash: [u8; 32],
    #[serde(with = "hex32")]
    pub genesis_hash: [u8; 32],
    #[serde(with = "u64_string")]
    pub nonce: u64,
    pub spec_version: u32,
    pub transaction_version: u32,
    #[serde(with = "u128_string")]
    pub tip: u128,
    /// Absent means immortal
    pub era: Option<EraInput>,
    #[serde(with = "hex_bytes")]
    pub private_key: Vec<u8>,
    /// SS58 network; defaults to the coin's prefix
    pub network: Option<u16>,
    pub multi_address: bool,
    /// Defaults to on for runtimes from 1002000
    pub check_metadata: Option<bool>,
    pub call: Option<Call>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningOutput {
    #[serde(with = "hex_bytes")]
    pub encoded: Vec<u8>,
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

fn build(coin: CoinType, input: &SigningInput) -> CoreResult<(CallEncoder, Extrinsic)> {
    let network = input
        .network
        .or_else(|| coin.ss58_prefix())
        .ok_or_else(|| CoreError::unsupported_coin(format!("{} has no SS58 network", coin.name())))?;
    let encoder = CallEncoder::new(network, input.spec_version, input.multi_address);
    let call = match &input.call {
        Some(Call::BalanceCall(call)) => encoder.balance_call(call)?,
        Some(Call::StakingCall(call)) => encoder.staking_call(call)?,
        None => return Err(CoreError::invalid_input("Missing call")),
    };
    let era = input
        .era
        .map(|e| Era::mortal(e.block_number, e.period))
        .unwrap_or(Era::Immortal);

    let extrinsic = Extrinsic {
        call,
        era,
        nonce: input.nonce,
        tip: input.tip,
        spec_version: input.spec_version,
        transaction_version: input.transaction_version,
        genesis_hash: input.genesis_hash,
        block_hash: input.block_hash,
        check_metadata: input
            .check_metadata
            .unwrap_or(input.spec_version >= METADATA_HASH_SPEC),
    };
    Ok((encoder, extrinsic))
}

fn ed25519_key(public: &PublicKey) -> CoreResult<[u8; 32]> {
    public
        .bytes()
        .try_into()
        .map_err(|_| CoreError::invalid_public_key("Expected a 32-byte ed25519 key"))
}

pub struct PolkadotSigner;

impl ChainSigner for PolkadotSigner {
    type Input = SigningInput;
    type Output = SigningOutput;

    fn sign(coin: CoinType, input: &SigningInput) -> CoreResult<SigningOutput> {
        let (encoder, extrinsic) = build(coin, input)?;
        let key = PrivateKey::new(&input.private_key)?;
        let signer = ed25519_key(&key.public_key(PublicKeyType::Ed25519)?)?;
        let signature = key.sign(&extrinsic.signing_message(), CurveType::Ed25519)?;
        log_info!(
            "polkadot",
            "Signed extrinsic",
            coin = coin.id(),
            nonce = input.nonce,
            spec_version = input.spec_version
        );
        Ok(SigningOutput {
            encoded: extrinsic.encode_signed(&encoder, &signer, &signature),
            ..Default::default()
        })
    }

    fn preimage_hashes(coin: CoinType, input: &SigningInput) -> CoreResult<PreSigningOutput> {
        let (_, extrinsic) = build(coin, input)?;
        log_debug!("polkadot", "Computed pre-image", coin = coin.id(), call_size = extrinsic.call.len());
        Ok(PreSigningOutput {
            data_hash: extrinsic.signing_message(),
            data: extrinsic.payload(),
            ..Default::default()
        })
    }

    fn compile(
        coin: CoinType,
        input: &SigningInput,
        signatures: &[Vec<u8>],
        public_keys: &[PublicKey],
    ) -> CoreResult<SigningOutput> {
        let (encoder, extrinsic) = build(coin, input)?;
        verify_signatures(&[extrinsic.signing_message()], signatures, public_keys)?;
        let signer = ed25519_key(&public_keys[0])?;
        Ok(SigningOutput {
            encoded: extrinsic.encode_signed(&encoder, &signer, &signatures[0]),
            ..Default::default()
        })
    }
}
