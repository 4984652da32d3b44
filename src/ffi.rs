//! FFI Layer for multicoin-core
//!
//! All C-ABI exports are defined here. This is the ONLY file that should
//! contain `extern "C"` functions. All functions follow a consistent pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `multicoin_free_string`)
//!
//! Error handling: All functions return JSON with `success` field.
//! On error, `success: false` and `error` object is populated.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::operations;
use crate::types::*;

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any multicoin_* function
///
/// # Safety
/// The pointer must have been returned by a multicoin_* function and not
/// freed before.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(s));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Borrow the C string and deserialize it into a request
///
/// # Safety
/// `input` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
unsafe fn parse_input<T: DeserializeOwned>(input: *const c_char) -> CoreResult<T> {
    if input.is_null() {
        return Err(CoreError::invalid_input("Null input pointer"));
    }
    let c_str = unsafe { CStr::from_ptr(input) };
    let json = c_str
        .to_str()
        .map_err(|_| CoreError::invalid_input("Invalid UTF-8 string"))?;
    Ok(serde_json::from_str(json)?)
}

/// Wrap an operation result in the response envelope
fn respond<T: Serialize>(result: CoreResult<T>) -> *mut c_char {
    string_to_ptr(ApiResponse::from(result).to_json())
}

/// Parse, run, respond
///
/// # Safety
/// Same contract as [`parse_input`].
unsafe fn handle<Req, Resp, F>(input: *const c_char, operation: F) -> *mut c_char
where
    Req: DeserializeOwned,
    Resp: Serialize,
    F: FnOnce(&Req) -> CoreResult<Resp>,
{
    respond(unsafe { parse_input::<Req>(input) }.and_then(|request| operation(&request)))
}

/// Convert Rust string to C string pointer
fn string_to_ptr(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => {
            let fallback: &[u8] =
                b"{\"success\":false,\"data\":null,\"error\":{\"code\":\"internal\",\"message\":\"String conversion failed\"}}";
            CString::new(fallback).map_or(std::ptr::null_mut(), CString::into_raw)
        }
    }
}

// =============================================================================
// Registry and Addresses
// =============================================================================

/// List every supported coin
///
/// # Output
/// ```json
/// { "success": true, "data": [{ "id": "bitcoin", "slip44": 0, ... }] }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn multicoin_coins() -> *mut c_char {
    respond(Ok(operations::coins()))
}

/// Validate an address for a coin
///
/// # Input
/// ```json
/// { "coin": "bitcoin", "address": "bc1q..." }
/// ```
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_validate_address(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, |r: &AddressRequest| Ok(operations::validate_address(r))) }
}

/// Derive an address from a public or private key
///
/// # Input
/// ```json
/// { "coin": "ethereum", "public_key": "04...", "derivation": "default" }
/// ```
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_derive_address(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::derive_address) }
}

// =============================================================================
// Mnemonics and HD Wallets
// =============================================================================

/// Generate a BIP-39 mnemonic
///
/// # Input
/// ```json
/// { "strength": 128 }
/// ```
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_generate_mnemonic(input: *const c_char) -> *mut c_char {
    if input.is_null() {
        return respond(operations::generate_mnemonic(&MnemonicRequest::default()));
    }
    unsafe { handle(input, operations::generate_mnemonic) }
}

/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_validate_mnemonic(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, |r: &MnemonicValidateRequest| Ok(operations::validate_mnemonic(r))) }
}

/// Derive a key and address from a mnemonic
///
/// # Input
/// ```json
/// { "mnemonic": "...", "passphrase": "", "coin": "bitcoin", "path": "m/84'/0'/0'/0/0" }
/// ```
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_hd_derive(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::hd_derive) }
}

// =============================================================================
// Signing
// =============================================================================

/// Sign a chain `SigningInput`
///
/// # Input
/// ```json
/// { "coin": "ethereum", "input": { "chain_id": "1", ... } }
/// ```
///
/// # Output
/// The chain's `SigningOutput` under `data`
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_sign(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::sign) }
}

/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_plan(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::plan) }
}

/// Digests to sign externally; same input shape as `multicoin_sign`
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_pre_image_hashes(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::pre_image_hashes) }
}

/// Compile external signatures into a signed transaction
///
/// # Input
/// ```json
/// { "coin": "ethereum", "input": {...}, "signatures": ["..."], "public_keys": ["..."] }
/// ```
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_compile(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::compile) }
}

// =============================================================================
// Keystore
// =============================================================================

/// Create an encrypted keystore
///
/// # Input
/// ```json
/// { "name": "main", "password": "...", "mnemonic": "...", "coin": "bitcoin", "level": "standard" }
/// ```
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_keystore_create(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::keystore_create) }
}

/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_keystore_import(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::keystore_import) }
}

/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_keystore_decrypt(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::keystore_decrypt) }
}

// =============================================================================
// Messages
// =============================================================================

/// EIP-191 personal message signature
///
/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_sign_message(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::sign_message) }
}

/// # Safety
/// `input` must be a valid NUL-terminated string or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn multicoin_verify_message(input: *const c_char) -> *mut c_char {
    unsafe { handle(input, operations::verify_message) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn call(f: unsafe extern "C" fn(*const c_char) -> *mut c_char, input: &str) -> Value {
        let input = CString::new(input).unwrap();
        let output = unsafe { f(input.as_ptr()) };
        let value = serde_json::from_str(unsafe { CStr::from_ptr(output) }.to_str().unwrap()).unwrap();
        unsafe { multicoin_free_string(output) };
        value
    }

    #[test]
    fn test_null_input() {
        let output = unsafe { multicoin_validate_address(std::ptr::null()) };
        let value: Value = serde_json::from_str(unsafe { CStr::from_ptr(output) }.to_str().unwrap()).unwrap();
        unsafe { multicoin_free_string(output) };
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "invalid_input");
    }

    #[test]
    fn test_coins() {
        let output = multicoin_coins();
        let value: Value = serde_json::from_str(unsafe { CStr::from_ptr(output) }.to_str().unwrap()).unwrap();
        unsafe { multicoin_free_string(output) };
        assert_eq!(value["success"], true);
        assert_eq!(value["data"][0]["id"], "bitcoin");
    }

    #[test]
    fn test_validate_address() {
        let value = call(
            multicoin_validate_address,
            r#"{"coin":"bitcoin","address":"bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny"}"#,
        );
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["valid"], true);
    }

    #[test]
    fn test_malformed_json() {
        let value = call(multicoin_hd_derive, "{not json");
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "json_error");
    }

    #[test]
    fn test_sign_ethereum() {
        let value = call(
            multicoin_sign,
            r#"{"coin":"ethereum","input":{
                "chain_id":"1","nonce":"9","gas_price":"20000000000","gas_limit":"21000",
                "to_address":"0x3535353535353535353535353535353535353535",
                "private_key":"4646464646464646464646464646464646464646464646464646464646464646",
                "transaction":{"transfer":{"amount":"1000000000000000000"}}}}"#,
        );
        assert_eq!(value["success"], true);
        assert!(value["data"]["encoded"].as_str().unwrap().starts_with("f86c09"));
    }

    #[test]
    fn test_sign_failure_in_envelope() {
        let value = call(multicoin_sign, r#"{"coin":"stellar","input":{}}"#);
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "unsupported_coin");
    }
}
