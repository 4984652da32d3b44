use bitcoin::hashes::{hash160, Hash};
use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{Address, Network, ScriptBuf, Transaction};
use serde_json::{json, Value};
use std::process::Command;
use std::str::FromStr;

const MNEMONIC: &str = "team engine square letter hero song dizzy scrub tornado fabric divert saddle";
const UTXO_KEY: &str = "57a64865bce5d4855e99b1cce13327c46171434f2d72eeaf9da53ee075e7f90a";
const UTXO_PUBKEY: &str = "028d7dce6d72fb8f7af9566616c6436349c67ad379f2404dd66fe7085fe0fba28f";

fn binary() -> &'static std::path::Path {
    assert_cmd::cargo::cargo_bin!("multicoin")
}

/// Run with `--json` and return the parsed envelope
fn run_json(args: &[&str]) -> Value {
    let output = Command::new(binary())
        .arg("--json")
        .args(args)
        .output()
        .expect("cli run succeeds");
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    let envelope: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert_eq!(
        envelope["success"].as_bool(),
        Some(output.status.success()),
        "exit status agrees with envelope: {}",
        stdout
    );
    envelope
}

fn run_json_stdin(args: &[&str], stdin: &str) -> Value {
    let assert = assert_cmd::Command::new(binary())
        .arg("--json")
        .args(args)
        .write_stdin(stdin)
        .assert();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

fn secret_key(hex_key: &str) -> SecretKey {
    SecretKey::from_slice(&hex::decode(hex_key).expect("private hex")).expect("valid secret key")
}

#[test]
fn derived_bitcoin_keys_match_bitcoin_crate() {
    let envelope = run_json(&["derive", "--coin", "bitcoin", "--mnemonic", MNEMONIC]);
    let data = &envelope["data"];
    assert_eq!(data["path"], "m/84'/0'/0'/0/0");

    let secp = Secp256k1::new();
    let secret = secret_key(data["private_key"].as_str().unwrap());
    let public = CompressedPublicKey(secret.public_key(&secp));
    assert_eq!(hex::encode(public.to_bytes()), data["public_key"], "compressed key matches");

    let address = Address::p2wpkh(&public, Network::Bitcoin);
    assert_eq!(address.to_string(), data["address"], "p2wpkh address matches");
    assert_eq!(data["address"], "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny");
}

#[test]
fn legacy_derivation_is_p2pkh() {
    let envelope = run_json(&[
        "derive",
        "--coin",
        "bitcoin",
        "--mnemonic",
        MNEMONIC,
        "--derivation",
        "legacy",
    ]);
    let data = &envelope["data"];
    assert_eq!(data["path"], "m/44'/0'/0'/0/0");

    let secret = secret_key(data["private_key"].as_str().unwrap());
    let public = CompressedPublicKey(secret.public_key(&Secp256k1::new()));
    let address = Address::p2pkh(public, Network::Bitcoin);
    assert_eq!(address.to_string(), data["address"]);
}

#[test]
fn litecoin_address_uses_ltc_hrp() {
    let envelope = run_json(&["derive", "--coin", "litecoin", "--mnemonic", MNEMONIC]);
    let data = &envelope["data"];

    let public = hex::decode(data["public_key"].as_str().unwrap()).expect("public hex");
    let pubkey_hash = hash160::Hash::hash(&public);
    let version = bech32::u5::try_from_u8(0).expect("version u5");
    let converted = bech32::convert_bits(pubkey_hash.as_ref(), 8, 5, true).expect("bech32 bits");
    let mut bech32_data = Vec::with_capacity(1 + converted.len());
    bech32_data.push(version);
    for value in converted {
        bech32_data.push(bech32::u5::try_from_u8(value).expect("convert to u5"));
    }
    let expected = bech32::encode("ltc", bech32_data, bech32::Variant::Bech32).expect("litecoin bech32 encode");
    assert_eq!(data["address"], expected.as_str());
}

#[test]
fn signed_transaction_decodes_with_bitcoin_crate() {
    let secp = Secp256k1::new();
    let public = CompressedPublicKey(secret_key(UTXO_KEY).public_key(&secp));
    assert_eq!(hex::encode(public.to_bytes()), UTXO_PUBKEY);
    let script = ScriptBuf::new_p2pkh(&public.pubkey_hash());

    let utxo = json!({
        "out_point": {
            "hash": "181c84965c9ea86a5fac32fdbd5f73a21a7a9e749fb6ab97e273af2329f6b911",
            "index": 0,
        },
        "script": hex::encode(script.as_bytes()),
        "amount": "10000",
    });
    let input = json!({
        "version": 2,
        "to_address": "bc1qp58pemrv9w473wkauh5m8h4xvldfqqmdk7s5ju",
        "private_keys": [UTXO_KEY],
        "utxos": [utxo.clone()],
        "plan": {
            "amount": "1000",
            "available_amount": "10000",
            "fee": "9000",
            "change": "0",
            "utxos": [utxo],
        },
    });

    let envelope = run_json_stdin(&["sign", "--coin", "bitcoin"], &input.to_string());
    assert_eq!(envelope["success"], true, "{}", envelope);
    let data = &envelope["data"];
    assert_eq!(data["transaction_id"], "711566e32e03c01106f019bf1911958979441f5aec5f58b7a368549d4cac569c");

    let raw = hex::decode(data["encoded"].as_str().unwrap()).expect("encoded hex");
    let tx: Transaction = bitcoin::consensus::deserialize(&raw).expect("consensus decode");
    assert_eq!(tx.compute_txid().to_string(), data["transaction_id"]);
    assert_eq!(tx.output.len(), 1);
    assert_eq!(tx.output[0].value.to_sat(), 1000);

    let recipient = Address::from_str("bc1qp58pemrv9w473wkauh5m8h4xvldfqqmdk7s5ju")
        .expect("address parses")
        .assume_checked();
    assert_eq!(tx.output[0].script_pubkey, recipient.script_pubkey());
    assert_eq!(
        tx.input[0].previous_output.txid.to_string(),
        "181c84965c9ea86a5fac32fdbd5f73a21a7a9e749fb6ab97e273af2329f6b911",
        "out point hash is in display order"
    );
}

#[test]
fn address_command_matches_derive() {
    let derived = run_json(&["derive", "--coin", "ethereum", "--mnemonic", MNEMONIC]);
    let private_key = derived["data"]["private_key"].as_str().unwrap().to_string();
    let envelope = run_json(&["address", "--coin", "ethereum", "--private-key", &private_key]);
    assert_eq!(envelope["data"]["address"], "0x494f60cb6Ac2c8F5E1393aD9FdBdF4Ad589507F7");
    assert_eq!(envelope["data"]["address"], derived["data"]["address"]);
}

#[test]
fn validate_reports_both_outcomes() {
    let good = run_json(&["validate", "--coin", "bitcoin", "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny"]);
    assert_eq!(good["data"]["valid"], true);

    let bad = run_json(&["validate", "--coin", "bitcoin", "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6znz"]);
    assert_eq!(bad["data"]["valid"], false);

    let output = Command::new(binary())
        .args(["validate", "--coin", "bitcoin", "1NyRyFewhZcWMa9XCj3bBxSXPXyoSg8dKz"])
        .output()
        .expect("cli run succeeds");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "valid");
}

#[test]
fn unsupported_coin_fails_with_envelope() {
    let envelope = run_json_stdin(&["sign", "--coin", "stellar"], "{}");
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["error"]["code"], "unsupported_coin");

    assert_cmd::Command::new(binary())
        .args(["sign", "--coin", "stellar"])
        .write_stdin("{}")
        .assert()
        .failure();
}

#[test]
fn keystore_create_then_decrypt_over_stdin() {
    let created = run_json(&[
        "keystore",
        "create",
        "--name",
        "cli",
        "--password",
        "password",
        "--mnemonic",
        MNEMONIC,
        "--coin",
        "bitcoin",
        "--level",
        "light",
    ]);
    let keystore = &created["data"];
    assert_eq!(keystore["type"], "mnemonic");
    assert_eq!(keystore["activeAccounts"][0]["address"], "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny");
    assert_eq!(keystore["crypto"]["kdfparams"]["n"], 4096);

    let decrypted = run_json_stdin(&["keystore", "decrypt", "--password", "password"], &keystore.to_string());
    assert_eq!(decrypted["data"]["mnemonic"], MNEMONIC);

    let wrong = run_json_stdin(&["keystore", "decrypt", "--password", "nope"], &keystore.to_string());
    assert_eq!(wrong["error"]["code"], "invalid_password");
}

#[test]
fn message_sign_and_verify_round_trip() {
    let key = "4646464646464646464646464646464646464646464646464646464646464646";
    let signed = run_json(&["message", "sign", "--private-key", key, "--message", "hello"]);
    let signature = signed["data"]["signature"].as_str().unwrap().to_string();
    assert_eq!(signature.len(), 130);

    let address = run_json(&["address", "--coin", "ethereum", "--private-key", key]);
    let address = address["data"]["address"].as_str().unwrap().to_string();
    let verified = run_json(&[
        "message",
        "verify",
        "--message",
        "hello",
        "--signature",
        &signature,
        "--address",
        &address,
    ]);
    assert_eq!(verified["data"]["valid"], true);
}

#[test]
fn coins_lists_registry() {
    let envelope = run_json(&["coins"]);
    let coins = envelope["data"].as_array().expect("coin list");
    assert_eq!(coins.len(), 20);
    assert!(coins.iter().any(|c| c["id"] == "kusama" && c["ss58_prefix"] == 2));
}
