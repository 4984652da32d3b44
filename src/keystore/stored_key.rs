//! Encrypted wallet file holding a mnemonic or a single private key

use super::account::Account;
use super::encryption::{Cipher, EncryptedPayload, EncryptionLevel};
use crate::address::EthereumAddress;
use crate::coin::{CoinType, Derivation};
use crate::crypto::PrivateKey;
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::wallet::{mnemonic, DerivationPath, HDWallet};
use crate::{log_info, log_warn};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

const KEYSTORE_VERSION: u32 = 3;
const MNEMONIC_STRENGTH: u32 = 128;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredKeyType {
    #[serde(rename = "mnemonic")]
    Mnemonic,
    /// Plain Web3 keystores carry no type and hold a private key
    #[default]
    #[serde(rename = "private-key")]
    PrivateKey,
}

impl StoredKeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoredKeyType::Mnemonic => "mnemonic",
            StoredKeyType::PrivateKey => "private-key",
        }
    }
}

fn default_version() -> u32 {
    KEYSTORE_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredKey {
    #[serde(rename = "type", default)]
    pub key_type: StoredKeyType,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "crypto", alias = "Crypto")]
    pub payload: EncryptedPayload,
    #[serde(rename = "activeAccounts", default)]
    pub accounts: Vec<Account>,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Ethereum address of plain Web3 keystores, folded into `accounts` on import
    #[serde(default, skip_serializing)]
    address: Option<String>,
}

impl StoredKey {
    fn new(key_type: StoredKeyType, name: &str, payload: EncryptedPayload) -> Self {
        Self {
            key_type,
            identifier: Some(uuid::Uuid::new_v4().to_string()),
            name: name.to_string(),
            payload,
            accounts: Vec::new(),
            version: KEYSTORE_VERSION,
            address: None,
        }
    }

    pub fn create_with_mnemonic(
        name: &str,
        password: &str,
        phrase: &str,
        level: EncryptionLevel,
        cipher: Cipher,
    ) -> CoreResult<Self> {
        if !mnemonic::is_valid(phrase) {
            return Err(CoreError::new(ErrorCode::InvalidMnemonic, "Invalid mnemonic phrase"));
        }
        let normalized = Zeroizing::new(mnemonic::normalize(phrase));
        let payload = EncryptedPayload::encrypt(password.as_bytes(), normalized.as_bytes(), level, cipher)?;
        log_info!("keystore", "Created mnemonic key", name = name, cipher = cipher.as_str());
        Ok(Self::new(StoredKeyType::Mnemonic, name, payload))
    }

    pub fn create_with_mnemonic_random(
        name: &str,
        password: &str,
        level: EncryptionLevel,
        cipher: Cipher,
    ) -> CoreResult<Self> {
        let phrase = mnemonic::generate(MNEMONIC_STRENGTH)?;
        Self::create_with_mnemonic(name, password, &phrase, level, cipher)
    }

    pub fn create_with_mnemonic_add_default_address(
        name: &str,
        password: &str,
        phrase: &str,
        coin: CoinType,
        level: EncryptionLevel,
        cipher: Cipher,
    ) -> CoreResult<Self> {
        let mut key = Self::create_with_mnemonic(name, password, phrase, level, cipher)?;
        let wallet = HDWallet::with_mnemonic(phrase, "")?;
        key.accounts.push(Account::from_wallet(&wallet, coin, Derivation::Default)?);
        Ok(key)
    }

    pub fn create_with_private_key(
        name: &str,
        password: &str,
        private_key: &[u8],
        level: EncryptionLevel,
        cipher: Cipher,
    ) -> CoreResult<Self> {
        PrivateKey::new(private_key)?;
        let payload = EncryptedPayload::encrypt(password.as_bytes(), private_key, level, cipher)?;
        log_info!("keystore", "Created private key", name = name, cipher = cipher.as_str());
        Ok(Self::new(StoredKeyType::PrivateKey, name, payload))
    }

    pub fn create_with_private_key_add_default_address(
        name: &str,
        password: &str,
        coin: CoinType,
        private_key: &[u8],
        level: EncryptionLevel,
        cipher: Cipher,
    ) -> CoreResult<Self> {
        let mut key = Self::create_with_private_key(name, password, private_key, level, cipher)?;
        key.accounts.push(Account::from_private_key(&PrivateKey::new(private_key)?, coin)?);
        Ok(key)
    }

    /// Parse a keystore file, including plain Web3 v3 files
    pub fn import_json(json: &str) -> CoreResult<Self> {
        let mut key: StoredKey = serde_json::from_str(json)?;
        if key.version != KEYSTORE_VERSION {
            return Err(CoreError::keystore(format!("Unsupported keystore version {}", key.version)));
        }
        if let Some(address) = key.address.take() {
            if key.accounts.is_empty() {
                key.accounts.push(legacy_ethereum_account(&address));
            }
        }
        log_info!(
            "keystore",
            "Imported key",
            key_type = key.key_type.as_str(),
            accounts = key.accounts.len()
        );
        Ok(key)
    }

    pub fn export_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decrypt_mnemonic(&self, password: &str) -> CoreResult<Zeroizing<String>> {
        if self.key_type != StoredKeyType::Mnemonic {
            return Err(CoreError::keystore("Stored key does not hold a mnemonic"));
        }
        let plain = self.payload.decrypt(password.as_bytes())?;
        let phrase = std::str::from_utf8(&plain)
            .map_err(|_| CoreError::keystore("Stored mnemonic is not UTF-8"))?;
        Ok(Zeroizing::new(phrase.to_string()))
    }

    pub fn decrypt_private_key(&self, password: &str) -> CoreResult<Zeroizing<Vec<u8>>> {
        if self.key_type != StoredKeyType::PrivateKey {
            return Err(CoreError::keystore("Stored key does not hold a private key"));
        }
        self.payload.decrypt(password.as_bytes())
    }

    pub fn wallet(&self, password: &str) -> CoreResult<HDWallet> {
        let phrase = self.decrypt_mnemonic(password)?;
        HDWallet::with_mnemonic(&phrase, "")
    }

    /// First account for `coin`, without deriving
    pub fn account(&self, coin: CoinType) -> Option<&Account> {
        self.accounts.iter().find(|a| a.coin == coin)
    }

    /// First account for `coin`, deriving the default one from `wallet` when absent
    pub fn account_with_wallet(&mut self, coin: CoinType, wallet: &HDWallet) -> CoreResult<Account> {
        if let Some(account) = self.account(coin).filter(|a| !a.address.is_empty()) {
            return Ok(account.clone());
        }
        self.account_for_coin_derivation(coin, Derivation::Default, wallet)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn accounts_for_coin(&self, coin: CoinType) -> Vec<&Account> {
        self.accounts.iter().filter(|a| a.coin == coin).collect()
    }

    /// Account for `coin` with `derivation`, derived from `wallet` and appended
    /// when missing; an existing entry with an empty address is filled in
    pub fn account_for_coin_derivation(
        &mut self,
        coin: CoinType,
        derivation: Derivation,
        wallet: &HDWallet,
    ) -> CoreResult<Account> {
        let position = self
            .accounts
            .iter()
            .position(|a| a.coin == coin && a.derivation == derivation);
        match position {
            Some(index) if !self.accounts[index].address.is_empty() => Ok(self.accounts[index].clone()),
            Some(index) => {
                let derived = Account::from_wallet(wallet, coin, derivation)?;
                self.accounts[index] = Account {
                    derivation_path: self.accounts[index].derivation_path.clone(),
                    ..derived
                };
                Ok(self.accounts[index].clone())
            }
            None => {
                let account = Account::from_wallet(wallet, coin, derivation)?;
                self.accounts.push(account.clone());
                Ok(account)
            }
        }
    }

    /// Adds or replaces the account with the same coin and path
    pub fn add_account(&mut self, account: Account) {
        match self
            .accounts
            .iter_mut()
            .find(|a| a.coin == account.coin && a.derivation_path == account.derivation_path)
        {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
    }

    pub fn remove_account(&mut self, coin: CoinType) {
        self.accounts.retain(|a| a.coin != coin);
    }

    pub fn remove_account_derivation(&mut self, coin: CoinType, derivation: Derivation) {
        self.accounts.retain(|a| !(a.coin == coin && a.derivation == derivation));
    }

    pub fn remove_account_path(&mut self, coin: CoinType, path: &DerivationPath) {
        self.accounts.retain(|a| !(a.coin == coin && &a.derivation_path == path));
    }

    /// Private key for `coin`; mnemonic keys also record the account
    pub fn private_key(&mut self, coin: CoinType, derivation: Derivation, password: &str) -> CoreResult<PrivateKey> {
        match self.key_type {
            StoredKeyType::PrivateKey => PrivateKey::new(&self.decrypt_private_key(password)?),
            StoredKeyType::Mnemonic => {
                let wallet = self.wallet(password)?;
                let account = self.account_for_coin_derivation(coin, derivation, &wallet)?;
                wallet.get_key(coin, &account.derivation_path)
            }
        }
    }

    /// Recompute addresses of `coin` accounts from their public keys
    pub fn update_address(&mut self, coin: CoinType) -> CoreResult<()> {
        for account in self.accounts.iter_mut().filter(|a| a.coin == coin) {
            account.refresh_address()?;
        }
        Ok(())
    }

    /// Re-derive every account's key, address and public key from the secret
    pub fn fix_addresses(&mut self, password: &str) -> CoreResult<()> {
        match self.key_type {
            StoredKeyType::Mnemonic => {
                let wallet = self.wallet(password)?;
                for account in self.accounts.iter_mut() {
                    let key = wallet.get_key(account.coin, &account.derivation_path)?;
                    refill(account, &key)?;
                }
            }
            StoredKeyType::PrivateKey => {
                let key = PrivateKey::new(&self.decrypt_private_key(password)?)?;
                for account in self.accounts.iter_mut() {
                    refill(account, &key)?;
                }
            }
        }
        log_info!("keystore", "Fixed addresses", accounts = self.accounts.len());
        Ok(())
    }

    pub fn change_password(&mut self, old_password: &str, new_password: &str) -> CoreResult<()> {
        self.payload = self
            .payload
            .reencrypt(old_password.as_bytes(), new_password.as_bytes())?;
        log_info!("keystore", "Changed password", name = self.name);
        Ok(())
    }
}

fn refill(account: &mut Account, key: &PrivateKey) -> CoreResult<()> {
    let public_key = key.public_key(account.coin.public_key_type())?;
    account.public_key = public_key.hex();
    account.refresh_address()
}

fn legacy_ethereum_account(address: &str) -> Account {
    let raw = address.trim().trim_start_matches("0x").to_ascii_lowercase();
    let address = match EthereumAddress::from_hex(&format!("0x{}", raw)) {
        Ok(parsed) => parsed.checksummed(),
        Err(e) => {
            log_warn!("keystore", "Unparseable legacy address", error = e.message);
            String::new()
        }
    };
    Account {
        address,
        coin: CoinType::Ethereum,
        derivation: Derivation::Default,
        derivation_path: CoinType::Ethereum.derivation_path(Derivation::Default),
        public_key: String::new(),
        extended_public_key: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const PASSWORD: &str = "password";
    const MNEMONIC: &str = "team engine square letter hero song dizzy scrub tornado fabric divert saddle";
    const BTC_KEY: &str = "3a1076bf45ab87712ad64ccb3b10217737f7faacbf2872e88fdd9a537d8fe266";
    const BTC_ZPUB: &str = "zpub6qbsWdbcKW9sC6shTKK4VEhfWvDCoWpfLnnVfYKHLHt31wKYUwH3aFDz4WLjZvjHZ5W4qVEyk37cRwzTbfrrT1Gnu8SgXawASnkdQ994atn";

    fn mnemonic_key() -> StoredKey {
        StoredKey::create_with_mnemonic("name", PASSWORD, MNEMONIC, EncryptionLevel::Light, Cipher::Aes128Ctr)
            .unwrap()
    }

    #[test]
    fn test_create_with_mnemonic() {
        let key = mnemonic_key();
        assert_eq!(key.key_type, StoredKeyType::Mnemonic);
        assert_eq!(key.decrypt_mnemonic(PASSWORD).unwrap().as_str(), MNEMONIC);
        assert!(key.accounts.is_empty());
        assert_eq!(key.wallet(PASSWORD).unwrap().mnemonic(), MNEMONIC);

        let json: Value = serde_json::from_str(&key.export_json().unwrap()).unwrap();
        assert_eq!(json["name"], "name");
        assert_eq!(json["type"], "mnemonic");
        assert_eq!(json["version"], 3);
        assert_eq!(json["crypto"]["kdf"], "scrypt");
        assert_eq!(json["crypto"]["kdfparams"]["n"], 4096);
        assert!(uuid::Uuid::parse_str(json["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_account_with_wallet_derives_once() {
        let mut key = mnemonic_key();
        let wallet = key.wallet(PASSWORD).unwrap();
        let first = key.account_with_wallet(CoinType::Ethereum, &wallet).unwrap();
        assert_eq!(first.address, "0x494f60cb6Ac2c8F5E1393aD9FdBdF4Ad589507F7");
        let again = key.account_with_wallet(CoinType::Ethereum, &wallet).unwrap();
        assert_eq!(again, first);
        assert_eq!(key.accounts.len(), 1);
    }

    #[test]
    fn test_create_with_invalid_mnemonic() {
        let err = StoredKey::create_with_mnemonic(
            "name",
            PASSWORD,
            "team engine square letter hero song dizzy scrub tornado fabric divert",
            EncryptionLevel::Light,
            Cipher::Aes128Ctr,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidMnemonic);
    }

    #[test]
    fn test_mnemonic_default_address() {
        for cipher in [Cipher::Aes128Ctr, Cipher::Aes256Ctr] {
            let mut key = StoredKey::create_with_mnemonic_add_default_address(
                "name",
                PASSWORD,
                MNEMONIC,
                CoinType::Bitcoin,
                EncryptionLevel::Light,
                cipher,
            )
            .unwrap();
            assert_eq!(key.payload.cipher, cipher);
            assert_eq!(key.accounts.len(), 1);
            let account = &key.accounts[0];
            assert_eq!(account.coin, CoinType::Bitcoin);
            assert_eq!(account.address, "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny");
            assert_eq!(
                account.public_key,
                "02df6fc590ab3101bbe0bb5765cbaeab9b5dcfe09ac9315d707047cbd13bc7e006"
            );
            assert_eq!(account.extended_public_key, BTC_ZPUB);

            let private = key.private_key(CoinType::Bitcoin, Derivation::Default, PASSWORD).unwrap();
            assert_eq!(
                hex::encode(private.bytes()),
                "d2568511baea8dc347f14c4e0479eb8ebe29eb5f664ed796e755896250ffd11f"
            );
            assert_eq!(key.accounts.len(), 1);
        }
    }

    #[test]
    fn test_private_key_default_address() {
        let raw = hex::decode(BTC_KEY).unwrap();
        let mut key = StoredKey::create_with_private_key_add_default_address(
            "name",
            PASSWORD,
            CoinType::Bitcoin,
            &raw,
            EncryptionLevel::Light,
            Cipher::Aes256Ctr,
        )
        .unwrap();
        assert_eq!(key.key_type, StoredKeyType::PrivateKey);
        assert_eq!(key.accounts[0].address, "bc1q375sq4kl2nv0mlmup3vm8znn4eqwu7mt6hkwhr");
        let private = key.private_key(CoinType::Bitcoin, Derivation::Default, PASSWORD).unwrap();
        assert_eq!(hex::encode(private.bytes()), BTC_KEY);

        let json: Value = serde_json::from_str(&key.export_json().unwrap()).unwrap();
        assert_eq!(json["type"], "private-key");
        assert_eq!(json["crypto"]["cipher"], "aes-256-ctr");
        assert!(key.wallet(PASSWORD).is_err());
    }

    #[test]
    fn test_invalid_private_key() {
        let result = StoredKey::create_with_private_key_add_default_address(
            "name",
            PASSWORD,
            CoinType::Bitcoin,
            &[0, 1, 2, 3, 4],
            EncryptionLevel::Light,
            Cipher::Aes128Ctr,
        );
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidPrivateKey);
    }

    #[test]
    fn test_derived_accounts() {
        let mut key = mnemonic_key();
        let wallet = key.wallet(PASSWORD).unwrap();

        let eth = key
            .account_for_coin_derivation(CoinType::Ethereum, Derivation::Default, &wallet)
            .unwrap();
        assert_eq!(eth.address, "0x494f60cb6Ac2c8F5E1393aD9FdBdF4Ad589507F7");
        assert_eq!(
            eth.public_key,
            "04cc32a479080d83fdcf69966713f0aad1bc1dc3ecf873b034894e84259841bc1c9b122717803e68905220ff54952d3f5ea2ab2698ca31f843addf94ae73fae9fd"
        );
        assert_eq!(eth.extended_public_key, "");

        let btc = key
            .account_for_coin_derivation(CoinType::Bitcoin, Derivation::Default, &wallet)
            .unwrap();
        assert_eq!(btc.address, "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny");
        let legacy = key
            .account_for_coin_derivation(CoinType::Bitcoin, Derivation::Legacy, &wallet)
            .unwrap();
        assert_eq!(legacy.address, "1NyRyFewhZcWMa9XCj3bBxSXPXyoSg8dKz");
        assert_eq!(key.accounts_for_coin(CoinType::Bitcoin).len(), 2);
        assert_eq!(key.account(CoinType::Bitcoin).unwrap().address, btc.address);

        let sol = key
            .account_for_coin_derivation(CoinType::Solana, Derivation::Default, &wallet)
            .unwrap();
        assert_eq!(sol.address, "HiipoCKL8hX2RVmJTz3vaLy34hS2zLhWWMkUWtw85TmZ");
        assert_eq!(
            sol.public_key,
            "f86b18399096c8134dd185f1e72dd7e26528772a2a998abfd81c5f8c547223d0"
        );
        let private = key.private_key(CoinType::Solana, Derivation::Default, PASSWORD).unwrap();
        assert_eq!(
            hex::encode(private.bytes()),
            "d81b5c525979e487736b69cb84ed8331559de17294f38491b304555c26687e83"
        );
        assert_eq!(key.accounts.len(), 4);
    }

    #[test]
    fn test_add_remove_accounts() {
        let mut key = mnemonic_key();
        let wallet = key.wallet(PASSWORD).unwrap();
        key.account_for_coin_derivation(CoinType::Bitcoin, Derivation::Default, &wallet)
            .unwrap();
        key.account_for_coin_derivation(CoinType::Bitcoin, Derivation::Legacy, &wallet)
            .unwrap();
        key.account_for_coin_derivation(CoinType::Ethereum, Derivation::Default, &wallet)
            .unwrap();
        assert_eq!(key.accounts.len(), 3);

        // Same coin and path replaces
        let mut replacement = key.accounts[2].clone();
        replacement.address = "0x0000000000000000000000000000000000000000".into();
        key.add_account(replacement);
        assert_eq!(key.accounts.len(), 3);

        key.remove_account_derivation(CoinType::Bitcoin, Derivation::Legacy);
        assert_eq!(key.accounts.len(), 2);
        key.remove_account_path(CoinType::Bitcoin, &DerivationPath::parse("m/84'/0'/0'/0/0").unwrap());
        assert_eq!(key.accounts.len(), 1);
        key.remove_account(CoinType::Ethereum);
        assert!(key.accounts.is_empty());
    }

    #[test]
    fn test_wrong_password_and_change_password() {
        let mut key = mnemonic_key();
        assert_eq!(
            key.decrypt_mnemonic("wrong").unwrap_err().code,
            ErrorCode::InvalidPassword
        );
        assert!(key.change_password("wrong", "new").is_err());

        key.change_password(PASSWORD, "new password").unwrap();
        assert!(key.decrypt_mnemonic(PASSWORD).is_err());
        assert_eq!(key.decrypt_mnemonic("new password").unwrap().as_str(), MNEMONIC);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut key = mnemonic_key();
        let wallet = key.wallet(PASSWORD).unwrap();
        key.account_for_coin_derivation(CoinType::Bitcoin, Derivation::Default, &wallet)
            .unwrap();

        let imported = StoredKey::import_json(&key.export_json().unwrap()).unwrap();
        assert_eq!(imported.identifier, key.identifier);
        assert_eq!(imported.accounts, key.accounts);
        assert_eq!(imported.decrypt_mnemonic(PASSWORD).unwrap().as_str(), MNEMONIC);
    }

    #[test]
    fn test_fix_and_update_addresses() {
        let mut key = mnemonic_key();
        let wallet = key.wallet(PASSWORD).unwrap();
        key.account_for_coin_derivation(CoinType::Bitcoin, Derivation::Default, &wallet)
            .unwrap();
        key.accounts[0].address.clear();
        key.update_address(CoinType::Bitcoin).unwrap();
        assert_eq!(key.accounts[0].address, "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny");

        key.accounts[0].address.clear();
        key.accounts[0].public_key.clear();
        key.fix_addresses(PASSWORD).unwrap();
        assert_eq!(key.accounts[0].address, "bc1qturc268v0f2srjh4r2zu4t6zk4gdutqd5a6zny");
    }

    #[test]
    fn test_import_web3_keystore() {
        // Web3 Secret Storage test vector with the legacy address field
        let json = r#"{
            "address": "008aeeda4d805471df9b2a5b0f38a0c3bcba786b",
            "crypto": {
                "cipher": "aes-128-ctr",
                "cipherparams": {"iv": "6087dab2f9fdbbfaddc31a909735c1e6"},
                "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
                "kdf": "pbkdf2",
                "kdfparams": {
                    "c": 262144,
                    "dklen": 32,
                    "prf": "hmac-sha256",
                    "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd"
                },
                "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2"
            },
            "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
            "version": 3
        }"#;
        let key = StoredKey::import_json(json).unwrap();
        assert_eq!(key.key_type, StoredKeyType::PrivateKey);
        assert_eq!(key.identifier.as_deref(), Some("3198bc9c-6672-5ab3-d995-4942343ae5b6"));
        assert_eq!(key.accounts.len(), 1);
        assert_eq!(key.accounts[0].coin, CoinType::Ethereum);
        assert_eq!(key.accounts[0].address, "0x008AeEda4D805471dF9b2A5B0f38A0C3bCBA786b");
        assert_eq!(
            hex::encode(key.decrypt_private_key("testpassword").unwrap().as_slice()),
            "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d"
        );
    }

    #[test]
    fn test_import_rejects_other_versions() {
        let mut json: Value = serde_json::from_str(&mnemonic_key().export_json().unwrap()).unwrap();
        json["version"] = Value::from(1);
        let err = StoredKey::import_json(&json.to_string()).unwrap_err();
        assert_eq!(err.code, ErrorCode::KeystoreError);
    }
}
