//! Transaction Compiler
//!
//! Splits signing in two for hardware wallets and air-gapped devices: the
//! pre-image hashes leave the host unsigned, and the signatures that come
//! back are verified and compiled into a broadcast-ready transaction.

use super::any_signer::{parse_input, to_json, unsupported, ErrorOutput};
use super::bitcoin::BitcoinSigner;
use super::ethereum::EthereumSigner;
use super::polkadot::PolkadotSigner;
use super::preimage::{public_key_for_coin, PreSigningOutput};
use super::solana::SolanaSigner;
use super::ChainSigner;
use crate::coin::{Blockchain, CoinType};
use crate::crypto::PublicKey;
use crate::error::CoreResult;
use crate::log_debug;

fn preimage_with<S: ChainSigner>(coin: CoinType, json: &str) -> String {
    let output = parse_input::<S>(json)
        .and_then(|input| S::preimage_hashes(coin, &input))
        .unwrap_or_else(PreSigningOutput::from);
    to_json(&output)
}

fn compile_with<S: ChainSigner>(
    coin: CoinType,
    json: &str,
    signatures: &[Vec<u8>],
    public_keys: &[Vec<u8>],
) -> String {
    let result = parse_input::<S>(json).and_then(|input| {
        let keys = public_keys
            .iter()
            .map(|bytes| public_key_for_coin(bytes, coin).map_err(Into::into))
            .collect::<CoreResult<Vec<PublicKey>>>()?;
        S::compile(coin, &input, signatures, &keys)
    });
    to_json(&result.unwrap_or_else(S::Output::from))
}

pub struct TransactionCompiler;

impl TransactionCompiler {
    /// Digests to sign for a JSON `SigningInput`, as a JSON `PreSigningOutput`
    pub fn pre_image_hashes(coin: CoinType, json: &str) -> String {
        log_debug!("compiler", "Pre-image requested", coin = coin.id());
        match coin.blockchain() {
            Blockchain::Ethereum => preimage_with::<EthereumSigner>(coin, json),
            Blockchain::Bitcoin => preimage_with::<BitcoinSigner>(coin, json),
            Blockchain::Solana => preimage_with::<SolanaSigner>(coin, json),
            Blockchain::Polkadot => preimage_with::<PolkadotSigner>(coin, json),
            _ => to_json(&PreSigningOutput::from(unsupported(coin))),
        }
    }

    /// Signed transaction as the same JSON `SigningOutput` that
    /// [`AnySigner::sign`](super::AnySigner::sign) returns.
    ///
    /// `signatures[i]` must verify against `public_keys[i]` over the i-th
    /// pre-image digest.
    pub fn compile_with_signatures(
        coin: CoinType,
        json: &str,
        signatures: &[Vec<u8>],
        public_keys: &[Vec<u8>],
    ) -> String {
        log_debug!(
            "compiler",
            "Compiling signatures",
            coin = coin.id(),
            signatures = signatures.len()
        );
        match coin.blockchain() {
            Blockchain::Ethereum => compile_with::<EthereumSigner>(coin, json, signatures, public_keys),
            Blockchain::Bitcoin => compile_with::<BitcoinSigner>(coin, json, signatures, public_keys),
            Blockchain::Solana => compile_with::<SolanaSigner>(coin, json, signatures, public_keys),
            Blockchain::Polkadot => compile_with::<PolkadotSigner>(coin, json, signatures, public_keys),
            _ => to_json(&ErrorOutput::from(unsupported(coin))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CurveType, PrivateKey, PublicKeyType};
    use crate::signing::AnySigner;
    use serde_json::{json, Value};

    const ETH_KEY: &str = "4646464646464646464646464646464646464646464646464646464646464646";
    const SOL_KEY: &str = "8778cc93c6596387e751d2dc693bbd93e434bd233bc5b68a826c56131821cb63";

    fn ethereum_input() -> String {
        json!({
            "chain_id": "1",
            "nonce": "9",
            "gas_price": "20000000000",
            "gas_limit": "21000",
            "to_address": "0x3535353535353535353535353535353535353535",
            "transaction": {"transfer": {"amount": "1000000000000000000"}},
        })
        .to_string()
    }

    fn parse(output: String) -> Value {
        serde_json::from_str(&output).unwrap()
    }

    fn digest(output: &Value) -> Vec<u8> {
        hex::decode(output["data_hash"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_ethereum_round_trip_matches_any_signer() {
        let preimage = parse(TransactionCompiler::pre_image_hashes(CoinType::Ethereum, &ethereum_input()));
        assert_eq!(
            preimage["data_hash"],
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );

        let key = PrivateKey::from_hex(ETH_KEY).unwrap();
        let signature = key.sign(&digest(&preimage), CurveType::Secp256k1).unwrap();
        let public = key.public_key(PublicKeyType::Secp256k1Extended).unwrap();
        let compiled = parse(TransactionCompiler::compile_with_signatures(
            CoinType::Ethereum,
            &ethereum_input(),
            &[signature],
            &[public.bytes().to_vec()],
        ));

        let mut signing: Value = serde_json::from_str(&ethereum_input()).unwrap();
        signing["private_key"] = json!(ETH_KEY);
        let signed = parse(AnySigner::sign(&signing.to_string(), CoinType::Ethereum));
        assert_eq!(compiled["error"], "ok");
        assert_eq!(compiled["encoded"], signed["encoded"]);
    }

    #[test]
    fn test_solana_compile_with_sender() {
        let key = PrivateKey::from_hex(SOL_KEY).unwrap();
        let public = key.public_key(PublicKeyType::Ed25519).unwrap();
        let input = json!({
            "sender": crate::encoding::base58::encode(
                public.bytes(),
                crate::encoding::base58::Base58Alphabet::Bitcoin
            ),
            "recent_blockhash": "11111111111111111111111111111111",
            "transfer": {"recipient": "EN2sCsJ1WDV8UFqsiTXHcUPUxQ4juE71eCknHYYMifkd", "value": 42},
        })
        .to_string();

        let preimage = parse(TransactionCompiler::pre_image_hashes(CoinType::Solana, &input));
        let signature = key.sign(&digest(&preimage), CurveType::Ed25519).unwrap();
        let compiled = parse(TransactionCompiler::compile_with_signatures(
            CoinType::Solana,
            &input,
            &[signature],
            &[public.bytes().to_vec()],
        ));
        assert_eq!(compiled["error"], "ok");
        assert!(!compiled["encoded"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_public_key_fails_verification() {
        let preimage = parse(TransactionCompiler::pre_image_hashes(CoinType::Ethereum, &ethereum_input()));
        let key = PrivateKey::from_hex(ETH_KEY).unwrap();
        let signature = key.sign(&digest(&preimage), CurveType::Secp256k1).unwrap();
        let other = PrivateKey::from_hex(SOL_KEY)
            .unwrap()
            .public_key(PublicKeyType::Secp256k1)
            .unwrap();
        let compiled = parse(TransactionCompiler::compile_with_signatures(
            CoinType::Ethereum,
            &ethereum_input(),
            &[signature],
            &[other.bytes().to_vec()],
        ));
        assert_eq!(compiled["error"], "verification_failed");
    }

    #[test]
    fn test_signature_count_mismatch_and_unsupported_coin() {
        let compiled = parse(TransactionCompiler::compile_with_signatures(
            CoinType::Ethereum,
            &ethereum_input(),
            &[],
            &[],
        ));
        assert_eq!(compiled["error"], "invalid_transaction");

        let preimage = parse(TransactionCompiler::pre_image_hashes(CoinType::Near, "{}"));
        assert_eq!(preimage["error"], "unsupported_coin");
    }
}
