//! Bitcoin family signer (Bitcoin, Litecoin, Dogecoin, Bitcoin Cash)
//!
//! Plans the spend, builds the transaction with the `bitcoin` crate types and
//! signs P2PKH, P2PK and P2WPKH inputs.

pub mod fee;
pub mod input_selector;
pub mod plan;
pub mod script;
pub mod sighash;
pub mod transaction;

pub use plan::{plan, TransactionPlan};

use self::input_selector::SelectableInput;
use super::preimage::{HashPublicKey, PreImageError, PreSigningOutput};
use super::ChainSigner;
use crate::coin::CoinType;
use crate::crypto::hash::hash160;
use crate::crypto::{PrivateKey, PublicKey};
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::serde_bytes::{hex32, hex_bytes, hex_list, u64_string};
use crate::utils::config::DustPolicy;
use crate::{log_debug, log_info};
use bitcoin::consensus::encode::serialize;
use bitcoin::Transaction;
use serde::{Deserialize, Serialize};

fn default_sequence() -> u32 {
    u32::MAX
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutPoint {
    /// Previous transaction id in display order
    #[serde(with = "hex32")]
    pub hash: [u8; 32],
    pub index: u32,
    #[serde(default = "default_sequence")]
    pub sequence: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnspentTransaction {
    pub out_point: OutPoint,
    #[serde(with = "hex_bytes")]
    pub script: Vec<u8>,
    #[serde(with = "u64_string")]
    pub amount: u64,
}

impl SelectableInput for UnspentTransaction {
    fn amount(&self) -> u64 {
        self.amount
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SigningInput {
    /// 0 selects the coin default (ALL, with forkid on Bitcoin Cash)
    pub hash_type: u32,
    #[serde(with = "u64_string")]
    pub amount: u64,
    #[serde(with = "u64_string")]
    pub byte_fee: u64,
    pub to_address: String,
    pub change_address: String,
    #[serde(with = "hex_list")]
    pub private_keys: Vec<Vec<u8>>,
    pub utxos: Vec<UnspentTransaction>,
    pub use_max_amount: bool,
    pub lock_time: u32,
    pub version: Option<i32>,
    /// Precomputed plan, used as is
    pub plan: Option<TransactionPlan>,
    pub dust_policy: Option<DustPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningOutput {
    pub plan: TransactionPlan,
    #[serde(with = "hex_bytes")]
    pub encoded: Vec<u8>,
    pub transaction_id: String,
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

fn resolve_plan(input: &SigningInput, coin: CoinType) -> CoreResult<TransactionPlan> {
    match &input.plan {
        Some(plan) if !plan.error.is_ok() => Err(CoreError::new(plan.error, plan.error_message.clone())),
        Some(plan) => Ok(plan.clone()),
        None => plan(input, coin),
    }
}

fn finish(tx: &Transaction, plan: TransactionPlan, coin: CoinType) -> SigningOutput {
    let transaction_id = tx.compute_txid().to_string();
    log_info!(
        "bitcoin",
        "Signed transaction",
        coin = coin.id(),
        inputs = tx.input.len(),
        txid = transaction_id
    );
    SigningOutput {
        plan,
        encoded: serialize(tx),
        transaction_id,
        ..Default::default()
    }
}

pub struct BitcoinSigner;

impl BitcoinSigner {
    pub fn plan(coin: CoinType, input: &SigningInput) -> CoreResult<TransactionPlan> {
        plan(input, coin)
    }
}

impl ChainSigner for BitcoinSigner {
    type Input = SigningInput;
    type Output = SigningOutput;

    fn sign(coin: CoinType, input: &SigningInput) -> CoreResult<SigningOutput> {
        let plan = resolve_plan(input, coin)?;
        let hash_type = transaction::effective_hash_type(input.hash_type, coin);
        let mut tx = transaction::unsigned(input, &plan, coin)?;
        let digests = transaction::input_digests(&tx, &plan.utxos, hash_type)?;

        let keys = input
            .private_keys
            .iter()
            .map(|k| PrivateKey::new(k))
            .collect::<CoreResult<Vec<_>>>()?;

        for (index, item) in digests.iter().enumerate() {
            let (key, public) = transaction::find_key(&keys, &item.key_hash)?
                .ok_or_else(|| CoreError::signing_failed(format!("No private key for input {}", index)))?;
            let der = key.sign_as_der(&item.digest)?;
            transaction::apply_signature(&mut tx, index, &item.spent, &der, public.bytes(), hash_type);
        }
        Ok(finish(&tx, plan, coin))
    }

    fn preimage_hashes(coin: CoinType, input: &SigningInput) -> CoreResult<PreSigningOutput> {
        let plan = resolve_plan(input, coin)?;
        let hash_type = transaction::effective_hash_type(input.hash_type, coin);
        let tx = transaction::unsigned(input, &plan, coin)?;
        let digests = transaction::input_digests(&tx, &plan.utxos, hash_type)?;
        log_debug!("bitcoin", "Computed pre-images", coin = coin.id(), inputs = digests.len());

        let hash_public_keys: Vec<HashPublicKey> = digests
            .iter()
            .map(|d| HashPublicKey {
                data_hash: d.digest.to_vec(),
                public_key_hash: d.key_hash.to_vec(),
            })
            .collect();
        Ok(PreSigningOutput {
            data_hash: hash_public_keys.first().map(|h| h.data_hash.clone()).unwrap_or_default(),
            data: serialize(&tx),
            hash_public_keys,
            ..Default::default()
        })
    }

    /// Signatures are DER encoded, without the sighash type byte
    fn compile(
        coin: CoinType,
        input: &SigningInput,
        signatures: &[Vec<u8>],
        public_keys: &[PublicKey],
    ) -> CoreResult<SigningOutput> {
        let plan = resolve_plan(input, coin)?;
        let hash_type = transaction::effective_hash_type(input.hash_type, coin);
        let mut tx = transaction::unsigned(input, &plan, coin)?;
        let digests = transaction::input_digests(&tx, &plan.utxos, hash_type)?;

        if signatures.len() != digests.len() || public_keys.len() != digests.len() {
            return Err(PreImageError::SignatureCount {
                expected: digests.len(),
                got: signatures.len().min(public_keys.len()),
            }
            .into());
        }
        for (index, ((item, der), public)) in digests.iter().zip(signatures).zip(public_keys).enumerate() {
            if hash160(public.bytes()) != item.key_hash {
                return Err(PreImageError::PublicKeyMismatch.into());
            }
            if !public.verify_as_der(der, &item.digest) {
                return Err(PreImageError::InvalidSignature(format!("input {}", index)).into());
            }
            transaction::apply_signature(&mut tx, index, &item.spent, der, public.bytes(), hash_type);
        }
        Ok(finish(&tx, plan, coin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PublicKeyType, CurveType};
    use serde_json::json;

    const KEY: &str = "57a64865bce5d4855e99b1cce13327c46171434f2d72eeaf9da53ee075e7f90a";
    const PUBKEY: &str = "028d7dce6d72fb8f7af9566616c6436349c67ad379f2404dd66fe7085fe0fba28f";

    fn display_order(wire: &str) -> String {
        let mut bytes = hex::decode(wire).unwrap();
        bytes.reverse();
        hex::encode(bytes)
    }

    fn sign(value: serde_json::Value, coin: CoinType) -> SigningOutput {
        let input: SigningInput = serde_json::from_value(value).unwrap();
        BitcoinSigner::sign(coin, &input).unwrap()
    }

    fn single_utxo_input(to_address: &str) -> serde_json::Value {
        let key_hash = hash160(&hex::decode(PUBKEY).unwrap());
        let utxo = json!({
            "out_point": {
                "hash": "181c84965c9ea86a5fac32fdbd5f73a21a7a9e749fb6ab97e273af2329f6b911",
                "index": 0,
            },
            "script": hex::encode(script::p2pkh(&key_hash)),
            "amount": "10000",
        });
        json!({
            "version": 2,
            "to_address": to_address,
            "private_keys": [KEY],
            "utxos": [utxo.clone()],
            "plan": {
                "amount": "1000",
                "available_amount": "10000",
                "fee": "9000",
                "change": "0",
                "utxos": [utxo],
            },
        })
    }

    #[test]
    fn test_sign_to_p2pkh() {
        let output = sign(single_utxo_input("12C2h5hXPxyrdvnYUBFaBGFnNNYjpWXhPX"), CoinType::Bitcoin);
        assert_eq!(output.transaction_id, "ff0901ef4796e9a0a82c4f8a6edebe9112cc54c4eefac77f6d4c4dd267b0da86");
        assert_eq!(
            hex::encode(output.encoded),
            "020000000111b9f62923af73e297abb69f749e7a1aa2735fbdfd32ac5f6aa89e5c96841c18000000006b483045022100a42afe29055e70d912c7bc3b113a6a58216ad0eafc7d73ae447df9044e347d900220530c5b4721c0c832d06be4921369792da9187df6fcf17bcf6c77a27d5ed85a200121028d7dce6d72fb8f7af9566616c6436349c67ad379f2404dd66fe7085fe0fba28fffffffff01e8030000000000001976a9140d0e1cec6c2babe8badde5e9b3dea667da90036d88ac00000000"
        );
    }

    #[test]
    fn test_sign_to_p2wpkh() {
        let output = sign(single_utxo_input("bc1qp58pemrv9w473wkauh5m8h4xvldfqqmdk7s5ju"), CoinType::Bitcoin);
        assert_eq!(output.transaction_id, "711566e32e03c01106f019bf1911958979441f5aec5f58b7a368549d4cac569c");
        assert_eq!(
            hex::encode(output.encoded),
            "020000000111b9f62923af73e297abb69f749e7a1aa2735fbdfd32ac5f6aa89e5c96841c18000000006b483045022100cdee6087a59c27f670d04d2782d139b202abdb936643bff8c0a46ec726bbc7ec022072241248659a582ef3460bdd232936fcea77b25b0e024f3841f8ba5e89efd31a0121028d7dce6d72fb8f7af9566616c6436349c67ad379f2404dd66fe7085fe0fba28fffffffff01e8030000000000001600140d0e1cec6c2babe8badde5e9b3dea667da90036d00000000"
        );
    }

    #[test]
    fn test_sign_to_p2sh() {
        let output = sign(single_utxo_input("3BSsey83R7AvczeRrYZihwDTkQ8Khjtewr"), CoinType::Bitcoin);
        assert_eq!(output.transaction_id, "4a476d6bc5e6e7fe13ef4388a22ff75cf9ecebb656483c27f5d884a1f173ac66");
        assert_eq!(
            hex::encode(output.encoded),
            "020000000111b9f62923af73e297abb69f749e7a1aa2735fbdfd32ac5f6aa89e5c96841c18000000006a4730440220079b598713c12210c13f059c477f4ab33f85e80749c0925e0ac655bc0a3b9ca802200e9b83fb57ab3f2c907daeb386f02ed1e459aa058168c9e3b4e9a074ec8db78d0121028d7dce6d72fb8f7af9566616c6436349c67ad379f2404dd66fe7085fe0fba28fffffffff01e80300000000000017a9146b04883a86994629fcc84e558968e2d70a3472fd8700000000"
        );
    }

    #[test]
    fn test_sign_to_p2wsh() {
        let output = sign(
            single_utxo_input("bc1qmtahx7nh2fqlcrf8fgf49mq6ywxnvjssay26aa8qfvf3xd907l6suvaz4x"),
            CoinType::Bitcoin,
        );
        assert_eq!(output.transaction_id, "a0dbacd99420b9fdd08623382efc474174e289cd84765097057a24d2cf67b108");
        assert_eq!(
            hex::encode(output.encoded),
            "020000000111b9f62923af73e297abb69f749e7a1aa2735fbdfd32ac5f6aa89e5c96841c18000000006b483045022100b0ee8b8a5466db1fef9054e29bf2d241f1637dfafe65f87559bc55028153051802201008183146fd71a744cbe66ae01222c4372f2b6d274658d7dfa18ef33ab5ab5b0121028d7dce6d72fb8f7af9566616c6436349c67ad379f2404dd66fe7085fe0fba28fffffffff01e803000000000000220020dafb737a775241fc0d274a1352ec1a238d364a10e915aef4e04b131334aff7f500000000"
        );
    }

    #[test]
    fn test_sign_to_p2tr() {
        let output = sign(
            single_utxo_input("bc1pps3sf8cl8xuy42s9gnyacez9wlwjxpyf32lrxlac7fw4wnuf6e9s0v066l"),
            CoinType::Bitcoin,
        );
        assert_eq!(output.transaction_id, "b37fdb67c208aeb9a42b329eeafe52d9ff870341c8bdc2e09b2a8de64ea13d2a");
        assert_eq!(
            hex::encode(output.encoded),
            "020000000111b9f62923af73e297abb69f749e7a1aa2735fbdfd32ac5f6aa89e5c96841c18000000006b483045022100c85b0030e0f18fdb6bf4b6085945732ed6354aa45beb4da3cc8fb76378ab424a02204aef0ccfd9270549c302ca8fca2aed9e6d459b07e7a1af8477f2137e5ca070f30121028d7dce6d72fb8f7af9566616c6436349c67ad379f2404dd66fe7085fe0fba28fffffffff01e8030000000000002251200c23049f1f39b84aaa0544c9dc644577dd2304898abe337fb8f25d574f89d64b00000000"
        );
    }

    fn bip143_input() -> serde_json::Value {
        let utxos = json!([
            {
                "out_point": {
                    "hash": display_order("fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f"),
                    "index": 0,
                    "sequence": 0xffffffeeu32,
                },
                "script": "2103c9f4836b9a4f77fc0d81f7bcb01b7f1b35916864b9476c241ce9fc198bd25432ac",
                "amount": "1000000",
            },
            {
                "out_point": {
                    "hash": display_order("ef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a"),
                    "index": 1,
                },
                "script": "00141d0f172a0ecb48aee1be1f2687d2963ae33f71a1",
                "amount": "600000000",
            },
        ]);
        json!({
            "hash_type": 1,
            "version": 1,
            "lock_time": 0x11,
            "to_address": "1Cu32FVupVCgHkMMRJdYJugxwo2Aprgk7H",
            "change_address": "16TZ8J6Q5iZKBWizWzFAYnrsaox5Z5aBRV",
            "private_keys": [
                "bbc27228ddcb9209d7fd6f36b02f7dfa6252af40bb2f1cbc7a557da8027ff866",
                "619c335025c7f4012e556c2a58b2506e30b8511b53ade95ea316fd8c3286feb9",
            ],
            "utxos": utxos.clone(),
            "plan": {
                "amount": "112340000",
                "available_amount": "601000000",
                "fee": "265210000",
                "change": "223450000",
                "utxos": utxos,
            },
        })
    }

    const BIP143_SIGNED: &str = "01000000000102fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f00000000494830450221008b9d1dc26ba6a9cb62127b02742fa9d754cd3bebf337f7a55d114c8e5cdd30be022040529b194ba3f9281a99f2b1c0a19c0489bc22ede944ccf4ecbab4cc618ef3ed01eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac000247304402203609e17b84f6a7d30c80bfa610b5b4542f32a8a0d5447a12fb1366d7f01cc44a0220573a954c4518331561406f90300e8f3358f51928d43c212a8caed02de67eebee0121025476c2e83188368da1ff3e292e7acafcdb3566bb0ad253f62fc70f07aeee635711000000";

    #[test]
    fn test_sign_bip143_native_p2wpkh() {
        let output = sign(bip143_input(), CoinType::Bitcoin);
        assert!(output.error.is_ok());
        assert_eq!(hex::encode(output.encoded), BIP143_SIGNED);
    }

    #[test]
    fn test_sign_bitcoin_cash() {
        let input = json!({
            "hash_type": 0x41,
            "amount": "600",
            "byte_fee": "1",
            "to_address": "1Bp9U1ogV3A14FMvKbRJms7ctyso4Z4Tcx",
            "change_address": "1FQc5LdgGHMHEN9nwkjmz6tWkxhPpxBvBU",
            "private_keys": ["7fdafb9db5bc501f2096e7d13d331dc7a75d9594af3d251313ba8b6200f4e384"],
            "utxos": [{
                "out_point": {
                    "hash": display_order("e28c2b955293159898e34c6840d99bf4d390e2ee1c6f606939f18ee1e2000d05"),
                    "index": 2,
                },
                "script": "76a914aff1e0789e5fe316b729577665aa0a04d5b0f8c788ac",
                "amount": "5151",
            }],
        });
        let output = sign(input, CoinType::BitcoinCash);
        assert_eq!(output.plan.fee, 226);
        assert_eq!(output.plan.change, 4325);
        assert_eq!(
            hex::encode(output.encoded),
            concat!(
                "0100000001e28c2b955293159898e34c6840d99bf4d390e2ee1c6f606939f18ee1e2000d05020000006b483045022100b70d158b43cbcded60e6977e93f9a84966bc0cec6f2dfd1463d1223a90563f0d02207548d081069de570a494d0967ba388ff02641d91cadb060587ead95a98d4e3534121038eab72ec78e639d02758e7860cdec018b49498c307791f785aa3019622f4ea5bffffffff025802000000000000",
                "1976a914769bdff96a02f9135a1d19b749db6a78fe07dc9088ac",
                "e510000000000000",
                "1976a9149e089b6889e032d46e3b915a3392edfd616fb1c488ac",
                "00000000"
            )
        );
    }

    #[test]
    fn test_missing_key() {
        let mut value = single_utxo_input("12C2h5hXPxyrdvnYUBFaBGFnNNYjpWXhPX");
        value["private_keys"] = json!(["4646464646464646464646464646464646464646464646464646464646464646"]);
        let input: SigningInput = serde_json::from_value(value).unwrap();
        let err = BitcoinSigner::sign(CoinType::Bitcoin, &input).unwrap_err();
        assert_eq!(err.code, ErrorCode::SigningFailed);
    }

    #[test]
    fn test_preimage_and_compile() {
        let input: SigningInput = serde_json::from_value(bip143_input()).unwrap();
        let preimage = BitcoinSigner::preimage_hashes(CoinType::Bitcoin, &input).unwrap();
        assert_eq!(preimage.hash_public_keys.len(), 2);
        assert_eq!(
            hex::encode(&preimage.hash_public_keys[1].data_hash),
            "c37af31116d1b27caf68aae9e3ac82f1477929014d5b917657d0eb49478cb670"
        );
        assert_eq!(
            hex::encode(&preimage.hash_public_keys[1].public_key_hash),
            "1d0f172a0ecb48aee1be1f2687d2963ae33f71a1"
        );

        let mut signatures = Vec::new();
        let mut public_keys = Vec::new();
        for (hash_key, raw_key) in preimage.hash_public_keys.iter().zip(&input.private_keys) {
            let key = PrivateKey::new(raw_key).unwrap();
            signatures.push(key.sign_as_der(&hash_key.data_hash).unwrap());
            public_keys.push(key.public_key(PublicKeyType::Secp256k1).unwrap());
        }
        let output = BitcoinSigner::compile(CoinType::Bitcoin, &input, &signatures, &public_keys).unwrap();
        assert_eq!(hex::encode(&output.encoded), BIP143_SIGNED);

        public_keys.swap(0, 1);
        let err = BitcoinSigner::compile(CoinType::Bitcoin, &input, &signatures, &public_keys).unwrap_err();
        assert_eq!(err.code, ErrorCode::VerificationFailed);

        // Compact signatures are not accepted
        let key = PrivateKey::new(&input.private_keys[0]).unwrap();
        let compact = key.sign(&preimage.data_hash, CurveType::Secp256k1).unwrap();
        public_keys.swap(0, 1);
        signatures[0] = compact;
        assert!(BitcoinSigner::compile(CoinType::Bitcoin, &input, &signatures, &public_keys).is_err());
    }
}
