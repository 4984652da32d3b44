//! JSON-level operations behind the C ABI and the CLI
//!
//! Each function takes one request from [`crate::types`] and returns a
//! serializable result, so both front ends share one code path.

use crate::address::{AnyAddress, EthereumAddress};
use crate::coin::{CoinInfo, CoinType, Derivation};
use crate::crypto::PrivateKey;
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::keystore::{StoredKey, StoredKeyType};
use crate::signing::ethereum::message;
use crate::signing::preimage::public_key_for_coin;
use crate::signing::{AnySigner, TransactionCompiler};
use crate::types::*;
use crate::utils::config;
use crate::wallet::{mnemonic, HDWallet};
use crate::{log_debug, log_info};
use serde_json::Value;

pub fn coins() -> Vec<CoinInfo> {
    CoinType::all().iter().copied().map(CoinInfo::from).collect()
}

pub fn validate_address(request: &AddressRequest) -> AddressValidation {
    match AnyAddress::with_string_derivation(&request.address, request.coin, request.derivation) {
        Ok(address) => AddressValidation {
            valid: true,
            coin: request.coin,
            normalized: Some(address.description()),
            data: Some(hex::encode(address.data())),
        },
        Err(e) => {
            log_debug!("operations", "Address rejected", coin = request.coin.id(), reason = e.message);
            AddressValidation {
                valid: false,
                coin: request.coin,
                normalized: None,
                data: None,
            }
        }
    }
}

pub fn derive_address(request: &DeriveAddressRequest) -> CoreResult<AddressInfo> {
    let public_key = match (request.public_key.is_empty(), request.private_key.is_empty()) {
        (false, _) => public_key_for_coin(&request.public_key, request.coin)?,
        (true, false) => PrivateKey::new(&request.private_key)?.public_key(request.coin.public_key_type())?,
        (true, true) => return Err(CoreError::invalid_input("Either public_key or private_key is required")),
    };
    let address = AnyAddress::with_public_key_derivation(&public_key, request.coin, request.derivation)?;
    Ok(AddressInfo {
        coin: request.coin,
        address: address.description(),
        public_key: public_key.hex(),
    })
}

pub fn generate_mnemonic(request: &MnemonicRequest) -> CoreResult<MnemonicResponse> {
    let phrase = mnemonic::generate(request.strength)?;
    Ok(MnemonicResponse {
        word_count: phrase.split_whitespace().count(),
        mnemonic: phrase.to_string(),
    })
}

pub fn validate_mnemonic(request: &MnemonicValidateRequest) -> ValidationResult {
    ValidationResult {
        valid: mnemonic::is_valid(&request.mnemonic),
    }
}

pub fn hd_derive(request: &HdDeriveRequest) -> CoreResult<DerivedKey> {
    let wallet = HDWallet::with_mnemonic(&request.mnemonic, &request.passphrase)?;
    let coin = request.coin;
    let path = request
        .path
        .clone()
        .unwrap_or_else(|| coin.derivation_path(request.derivation));
    let key = wallet.get_key(coin, &path)?;
    let public_key = key.public_key(coin.public_key_type())?;
    let address = AnyAddress::with_public_key_derivation(&public_key, coin, request.derivation)?;

    let extended_public_key = match (coin.hd_versions(), request.derivation, &request.path) {
        (Some((version, _)), Derivation::Default, None) => Some(wallet.get_extended_public_key(
            path.purpose().unwrap_or(44),
            coin,
            version,
        )?),
        _ => None,
    };

    log_debug!("operations", "Derived key", coin = coin.id(), path = path);
    Ok(DerivedKey {
        coin,
        address: address.description(),
        public_key: public_key.hex(),
        private_key: hex::encode(key.bytes()),
        extended_public_key,
        path,
    })
}

/// Lift a chain output carrying `error`/`error_message` into a `CoreResult`
fn chain_output(raw: String) -> CoreResult<Value> {
    let output: Value = serde_json::from_str(&raw)?;
    let code = output
        .get("error")
        .cloned()
        .map(serde_json::from_value::<ErrorCode>)
        .transpose()?
        .unwrap_or_default();
    if code == ErrorCode::Ok {
        return Ok(output);
    }
    let message = output
        .get("error_message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Err(CoreError::new(code, message))
}

pub fn sign(request: &SignRequest) -> CoreResult<Value> {
    chain_output(AnySigner::sign(&request.input.to_string(), request.coin))
}

pub fn plan(request: &SignRequest) -> CoreResult<Value> {
    chain_output(AnySigner::plan(&request.input.to_string(), request.coin))
}

pub fn pre_image_hashes(request: &SignRequest) -> CoreResult<Value> {
    chain_output(TransactionCompiler::pre_image_hashes(request.coin, &request.input.to_string()))
}

pub fn compile(request: &CompileRequest) -> CoreResult<Value> {
    chain_output(TransactionCompiler::compile_with_signatures(
        request.coin,
        &request.input.to_string(),
        &request.signatures,
        &request.public_keys,
    ))
}

fn keystore_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn keystore_create(request: &KeystoreCreateRequest) -> CoreResult<StoredKey> {
    let settings = config::global();
    let level = request.level.unwrap_or(settings.kdf_preset);
    let cipher = request.cipher.unwrap_or(settings.default_cipher);
    let name = request.name.as_str();
    let password = request.password.as_str();

    let key = match (&request.mnemonic, request.private_key.is_empty(), request.coin) {
        (_, false, Some(coin)) => StoredKey::create_with_private_key_add_default_address(
            name,
            password,
            coin,
            &request.private_key,
            level,
            cipher,
        )?,
        (_, false, None) => StoredKey::create_with_private_key(name, password, &request.private_key, level, cipher)?,
        (Some(phrase), true, Some(coin)) => {
            StoredKey::create_with_mnemonic_add_default_address(name, password, phrase, coin, level, cipher)?
        }
        (Some(phrase), true, None) => StoredKey::create_with_mnemonic(name, password, phrase, level, cipher)?,
        (None, true, coin) => {
            let mut key = StoredKey::create_with_mnemonic_random(name, password, level, cipher)?;
            if let Some(coin) = coin {
                let wallet = key.wallet(password)?;
                key.account_with_wallet(coin, &wallet)?;
            }
            key
        }
    };
    log_info!("operations", "Keystore created", key_type = key.key_type.as_str(), accounts = key.accounts().len());
    Ok(key)
}

pub fn keystore_import(request: &KeystoreImportRequest) -> CoreResult<StoredKey> {
    StoredKey::import_json(&keystore_text(&request.keystore))
}

pub fn keystore_decrypt(request: &KeystoreDecryptRequest) -> CoreResult<DecryptedSecret> {
    let key = StoredKey::import_json(&keystore_text(&request.keystore))?;
    let secret = match key.key_type {
        StoredKeyType::Mnemonic => DecryptedSecret {
            key_type: key.key_type,
            mnemonic: Some(key.decrypt_mnemonic(&request.password)?.to_string()),
            private_key: None,
        },
        StoredKeyType::PrivateKey => DecryptedSecret {
            key_type: key.key_type,
            mnemonic: None,
            private_key: Some(hex::encode(key.decrypt_private_key(&request.password)?.as_slice())),
        },
    };
    Ok(secret)
}

pub fn sign_message(request: &MessageSignRequest) -> CoreResult<MessageSignature> {
    let key = PrivateKey::new(&request.private_key)?;
    Ok(MessageSignature {
        signature: message::sign_message(&key, &request.message, request.message_type)?,
    })
}

pub fn verify_message(request: &MessageVerifyRequest) -> CoreResult<MessageVerification> {
    let signer = message::recover_address(&request.message, &request.signature).ok();
    let valid = match (request.public_key.is_empty(), &request.address) {
        (false, _) => {
            let public_key = public_key_for_coin(&request.public_key, CoinType::Ethereum)?;
            message::verify_message(&public_key, &request.message, &request.signature)
        }
        (true, Some(address)) => {
            let expected = EthereumAddress::from_hex(address)?;
            signer.as_ref().is_some_and(|s| s.bytes() == expected.bytes())
        }
        (true, None) => return Err(CoreError::invalid_input("Either public_key or address is required")),
    };
    Ok(MessageVerification {
        valid,
        signer: signer.map(|s| s.to_string()),
    })
}
