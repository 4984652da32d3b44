//! Transaction signing
//!
//! Every chain family implements [`ChainSigner`] over its own JSON input and
//! output types. [`AnySigner`] routes by coin, and [`TransactionCompiler`]
//! drives the external-signature flow:
//! 1. Generate pre-image hashes from the unsigned input
//! 2. Accept signatures produced elsewhere
//! 3. Verify and compile them into the final signed transaction

pub mod any_signer;
pub mod bitcoin;
pub mod compiler;
pub mod ethereum;
pub mod polkadot;
pub mod preimage;
pub mod solana;

pub use any_signer::AnySigner;
pub use compiler::TransactionCompiler;
pub use preimage::{HashPublicKey, PreSigningOutput};

use crate::coin::CoinType;
use crate::crypto::PublicKey;
use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One chain family's signer
pub trait ChainSigner {
    type Input: DeserializeOwned;
    /// Errors are carried inside the output
    type Output: Serialize + From<CoreError>;

    fn sign(coin: CoinType, input: &Self::Input) -> CoreResult<Self::Output>;

    fn preimage_hashes(coin: CoinType, input: &Self::Input) -> CoreResult<PreSigningOutput>;

    /// Assemble the signed transaction from externally produced signatures,
    /// checking each against its public key first
    fn compile(
        coin: CoinType,
        input: &Self::Input,
        signatures: &[Vec<u8>],
        public_keys: &[PublicKey],
    ) -> CoreResult<Self::Output>;
}
