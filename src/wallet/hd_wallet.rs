//! Hierarchical Deterministic Wallet
//!
//! Holds a BIP-39 mnemonic and its seed, and derives per-coin keys along
//! BIP-32 (secp256k1), SLIP-10 (nist256p1) or SLIP-10 hardened-only
//! (ed25519) paths.
//!
//! SECURITY: mnemonic, passphrase, entropy and seed are zeroized on drop.

use zeroize::Zeroizing;

use super::derivation_path::{DerivationComponent, DerivationPath, HARDENED};
use super::extended_key::ExtendedKey;
use super::mnemonic;
use crate::coin::{CoinType, Derivation, HdVersion};
use crate::crypto::curves::{self, CurveType};
use crate::crypto::{PrivateKey, PublicKey, PublicKeyType};
use crate::error::{CoreError, CoreResult};
use crate::{log_debug, log_info};

pub struct HDWallet {
    mnemonic: Zeroizing<String>,
    passphrase: Zeroizing<String>,
    entropy: Zeroizing<Vec<u8>>,
    seed: Zeroizing<[u8; 64]>,
}

impl HDWallet {
    /// New random wallet with `strength` bits of entropy
    pub fn new(strength: u32, passphrase: &str) -> CoreResult<Self> {
        let phrase = mnemonic::generate(strength)?;
        log_info!("hd_wallet", "Generated wallet", strength = strength);
        Self::with_mnemonic(&phrase, passphrase)
    }

    pub fn with_mnemonic(phrase: &str, passphrase: &str) -> CoreResult<Self> {
        let normalized = Zeroizing::new(mnemonic::normalize(phrase));
        let seed = mnemonic::to_seed(&normalized, passphrase)?;
        let entropy = mnemonic::to_entropy(&normalized)?;
        Ok(Self {
            mnemonic: normalized,
            passphrase: Zeroizing::new(passphrase.to_string()),
            entropy,
            seed,
        })
    }

    pub fn with_entropy(entropy: &[u8], passphrase: &str) -> CoreResult<Self> {
        let phrase = mnemonic::from_entropy(entropy)?;
        Self::with_mnemonic(&phrase, passphrase)
    }

    pub fn seed(&self) -> &[u8; 64] {
        &self.seed
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    /// Master node private key for a curve
    pub fn get_master_key(&self, curve: CurveType) -> CoreResult<PrivateKey> {
        let (private, _chain_code) = curves::master_key(curve, self.seed.as_ref())?;
        let private = Zeroizing::new(private);
        PrivateKey::new(private.as_ref())
    }

    /// Private key at `path` on the given curve
    pub fn get_key_by_curve(&self, curve: CurveType, path: &DerivationPath) -> CoreResult<PrivateKey> {
        if curve == CurveType::Ed25519 && !path.is_fully_hardened() {
            return Err(CoreError::invalid_path(format!(
                "{} only supports hardened derivation: {}",
                curve, path
            )));
        }

        let (private, mut chain_code) = curves::master_key(curve, self.seed.as_ref())?;
        let mut private = Zeroizing::new(private);
        for index in path.indices() {
            let (child, child_chain) = curves::derive_child(curve, &private, &chain_code, index)?;
            *private = child;
            chain_code = child_chain;
        }

        log_debug!("hd_wallet", "Derived key", curve = curve, path = path);
        PrivateKey::new(private.as_ref())
    }

    pub fn get_key(&self, coin: CoinType, path: &DerivationPath) -> CoreResult<PrivateKey> {
        self.get_key_by_curve(coin.curve(), path)
    }

    pub fn get_key_for_coin(&self, coin: CoinType) -> CoreResult<PrivateKey> {
        self.get_key(coin, &coin.derivation_path(Derivation::Default))
    }

    pub fn get_key_derivation(&self, coin: CoinType, derivation: Derivation) -> CoreResult<PrivateKey> {
        self.get_key(coin, &coin.derivation_path(derivation))
    }

    pub fn get_address_for_coin(&self, coin: CoinType) -> CoreResult<String> {
        self.get_address_derivation(coin, Derivation::Default)
    }

    pub fn get_address_derivation(&self, coin: CoinType, derivation: Derivation) -> CoreResult<String> {
        let key = self.get_key_derivation(coin, derivation)?;
        coin.derive_address_with(&key, derivation)
    }

    fn account_node(&self, purpose: u32, coin: CoinType, version: HdVersion) -> CoreResult<ExtendedKey> {
        if coin.curve() != CurveType::Secp256k1 {
            return Err(CoreError::invalid_input(format!(
                "Extended keys are not supported for {}",
                coin.name()
            )));
        }
        let (private, chain_code) = curves::master_key(CurveType::Secp256k1, self.seed.as_ref())?;
        let mut key = [0u8; 33];
        key[1..].copy_from_slice(&private);
        let master = ExtendedKey {
            version: version.private_version().bytes(),
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
            chain_code,
            key,
        };

        let coin_index = coin
            .derivation_path(Derivation::Default)
            .coin()
            .unwrap_or_else(|| coin.slip44());
        master.derive_path(&[
            DerivationComponent::new(purpose, true),
            DerivationComponent::new(coin_index, true),
            DerivationComponent::new(0, true),
        ])
    }

    /// Account-level extended private key at m/purpose'/coin'/0'
    pub fn get_extended_private_key(&self, purpose: u32, coin: CoinType, version: HdVersion) -> CoreResult<String> {
        if version.is_public() {
            return Err(CoreError::invalid_input(format!("{:?} is a public key version", version)));
        }
        Ok(self.account_node(purpose, coin, version)?.serialize())
    }

    /// Account-level extended public key at m/purpose'/coin'/0'
    pub fn get_extended_public_key(&self, purpose: u32, coin: CoinType, version: HdVersion) -> CoreResult<String> {
        if !version.is_public() {
            return Err(CoreError::invalid_input(format!("{:?} is a private key version", version)));
        }
        let node = self.account_node(purpose, coin, version)?;
        Ok(node.neuter(version.bytes())?.serialize())
    }

    /// Private key for the change/address part of `path` below an account xprv
    pub fn get_private_key_from_extended(extended: &str, coin: CoinType, path: &DerivationPath) -> CoreResult<PrivateKey> {
        let node = Self::parse_account_key(extended, coin)?;
        if !node.is_private() {
            return Err(CoreError::invalid_input("Expected an extended private key"));
        }
        let child = node.derive_path(path.suffix(3))?;
        let private = Zeroizing::new(
            child
                .private_key()
                .ok_or_else(|| CoreError::internal("Derived node lost its private key"))?,
        );
        PrivateKey::new(private.as_ref())
    }

    /// Public key for the change/address part of `path` below an account xpub
    pub fn get_public_key_from_extended(extended: &str, coin: CoinType, path: &DerivationPath) -> CoreResult<PublicKey> {
        let node = Self::parse_account_key(extended, coin)?;
        if path.suffix(3).iter().any(|c| c.full_index() >= HARDENED) {
            return Err(CoreError::invalid_path("Hardened components below the account level"));
        }
        let child = node.derive_path(path.suffix(3))?;
        let compressed = PublicKey::new(&child.public_key()?, PublicKeyType::Secp256k1)?;
        match coin.public_key_type() {
            PublicKeyType::Secp256k1Extended => compressed.uncompressed(),
            _ => Ok(compressed),
        }
    }

    fn parse_account_key(extended: &str, coin: CoinType) -> CoreResult<ExtendedKey> {
        if coin.curve() != CurveType::Secp256k1 {
            return Err(CoreError::invalid_input(format!(
                "Extended keys are not supported for {}",
                coin.name()
            )));
        }
        let node = ExtendedKey::deserialize(extended)?;
        if HdVersion::from_bytes(node.version).is_none() {
            return Err(CoreError::invalid_input(format!(
                "Unknown extended key version {:#010x}",
                node.version
            )));
        }
        Ok(node)
    }
}

impl std::fmt::Debug for HDWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HDWallet([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AnyAddress;

    const WORDS: &str = "ripple scissors kick mammal hire column oak again sun offer wealth tomorrow wagon turn fatal";
    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_create_from_mnemonic() {
        let wallet = HDWallet::with_mnemonic(WORDS, "passphrase").unwrap();
        assert_eq!(wallet.mnemonic(), WORDS);
        assert_eq!(wallet.passphrase(), "passphrase");
        assert_eq!(hex::encode(wallet.entropy()), "ba5821e8c356c05ba5f025d9532fe0f21f65d594");
        assert_eq!(
            hex::encode(wallet.seed()),
            "143cd5fc27ae46eb423efebc41610473f5e24a80f2ca2e2fa7bf167e537f58f4c68310ae487fce82e25bad29bab2530cf77fd724a5ebfc05a45872773d7ee2d6"
        );
    }

    #[test]
    fn test_generate_and_recreate_from_entropy() {
        let wallet = HDWallet::new(256, "x").unwrap();
        assert_eq!(wallet.entropy().len(), 32);
        let again = HDWallet::with_entropy(wallet.entropy(), "x").unwrap();
        assert_eq!(again.mnemonic(), wallet.mnemonic());
        assert_eq!(again.seed(), wallet.seed());
        assert!(HDWallet::new(64, "").is_err());
        assert!(HDWallet::with_mnemonic("ripple scissors kick", "").is_err());
    }

    #[test]
    fn test_derive_ethereum() {
        let wallet = HDWallet::with_mnemonic(WORDS, "TREZOR").unwrap();
        let key = wallet.get_key_for_coin(CoinType::Ethereum).unwrap();
        let public = key.public_key(PublicKeyType::Secp256k1Extended).unwrap();
        assert_eq!(
            public.hex(),
            "0414acbe5a06c68210fcbb77763f9612e45a526990aeb69d692d705f276f558a5ae68268e9389bb099ed5ac84d8d6861110f63644f6e5b447e3f86b4bab5dee011"
        );
        assert_eq!(
            wallet.get_address_for_coin(CoinType::Ethereum).unwrap(),
            "0x27Ef5cDBe01777D62438AfFeb695e33fC2335979"
        );
    }

    #[test]
    fn test_derive_cosmos_and_doge() {
        let wallet = HDWallet::with_mnemonic(
            "attract term foster morning tail foam excite copper disease measure cheese camera rug enroll cause flip sword waste try local purchase between idea thank",
            "",
        )
        .unwrap();
        let key = wallet.get_key_for_coin(CoinType::Cosmos).unwrap();
        assert_eq!(hex::encode(key.bytes()), "80e81ea269e66a0a05b11236df7919fb7fbeedba87452d667489d7403a02f005");

        let wallet = HDWallet::with_mnemonic(WORDS, "TREZOR").unwrap();
        let key = wallet.get_key_for_coin(CoinType::Dogecoin).unwrap();
        assert_eq!(
            key.public_key(PublicKeyType::Secp256k1).unwrap().hex(),
            "039fc134623a37c8ee44881f088a599cc44ba8a95f91f860b99d9d3b11f487e4c0"
        );
        assert_eq!(
            wallet.get_extended_private_key(44, CoinType::Dogecoin, HdVersion::Dgpv).unwrap(),
            "dgpv57ru95KiYUB5oWm2CVQH4heh1f7E9dNGdRHHVThcQkLeQ2HHxVJfFYefnpKrWZ6L6EDKJHUVq4Yyd5kPZKnRePfkCz3EzkySTydXKbgjcxN"
        );
        assert_eq!(
            wallet.get_extended_public_key(44, CoinType::Dogecoin, HdVersion::Dgub).unwrap(),
            "dgub8rjvUmFc6cqR6NRBEj2FBZCHUDUrykPyv24Vea6bCsPex5PzNFrRtr4KN37XgwuVzzC2MikJRW2Ddcp99Ehsqp2iaU4eerNCJVruKxz6Gci"
        );
    }

    #[test]
    fn test_key_by_curve() {
        let wallet = HDWallet::with_mnemonic(WORDS, "").unwrap();
        let path = DerivationPath::parse("m/44'/539'/0'/0/0").unwrap();
        assert_eq!(
            hex::encode(wallet.get_key_by_curve(CurveType::Secp256k1, &path).unwrap().bytes()),
            "4fb8657d6464adcaa086d6758d7f0b6b6fc026c98dc1671fcc6460b5a74abc62"
        );
        assert_eq!(
            hex::encode(wallet.get_key_by_curve(CurveType::Nist256p1, &path).unwrap().bytes()),
            "a13df52d5a5b438bbf921bbf86276e4347fe8e2f2ed74feaaee12b77d6d26f86"
        );
        assert!(wallet.get_key_by_curve(CurveType::Ed25519, &path).is_err());
    }

    #[test]
    fn test_aptos_ed25519_key() {
        let wallet = HDWallet::with_mnemonic(WORDS, "").unwrap();
        let key = wallet.get_key_for_coin(CoinType::Aptos).unwrap();
        assert_eq!(hex::encode(key.bytes()), "7f2634c0e2414a621e96e39c41d09021700cee12ee43328ed094c5580cd0bd6f");
        assert_eq!(
            key.public_key(PublicKeyType::Ed25519).unwrap().hex(),
            "633e5c7e355bdd484706436ce1f06fdf280bd7c2229a7f9b6489684412c6967c"
        );
    }

    #[test]
    fn test_extended_keys() {
        let wallet = HDWallet::with_mnemonic(ABANDON, "").unwrap();
        assert_eq!(
            wallet.get_extended_private_key(44, CoinType::Bitcoin, HdVersion::Xprv).unwrap(),
            "xprv9xpXFhFpqdQK3TmytPBqXtGSwS3DLjojFhTGht8gwAAii8py5X6pxeBnQ6ehJiyJ6nDjWGJfZ95WxByFXVkDxHXrqu53WCRGypk2ttuqncb"
        );
        assert_eq!(
            wallet.get_extended_public_key(44, CoinType::Bitcoin, HdVersion::Xpub).unwrap(),
            "xpub6BosfCnifzxcFwrSzQiqu2DBVTshkCXacvNsWGYJVVhhawA7d4R5WSWGFNbi8Aw6ZRc1brxMyWMzG3DSSSSoekkudhUd9yLb6qx39T9nMdj"
        );
        assert_eq!(
            wallet.get_extended_public_key(49, CoinType::Bitcoin, HdVersion::Ypub).unwrap(),
            "ypub6Ww3ibxVfGzLrAH1PNcjyAWenMTbbAosGNB6VvmSEgytSER9azLDWCxoJwW7Ke7icmizBMXrzBx9979FfaHxHcrArf3zbeJJJUZPf663zsP"
        );
        assert_eq!(
            wallet.get_extended_private_key(84, CoinType::Bitcoin, HdVersion::Zprv).unwrap(),
            "zprvAdG4iTXWBoARxkkzNpNh8r6Qag3irQB8PzEMkAFeTRXxHpbF9z4QgEvBRmfvqWvGp42t42nvgGpNgYSJA9iefm1yYNZKEm7z6qUWCroSQnE"
        );
        assert!(wallet.get_extended_public_key(44, CoinType::Bitcoin, HdVersion::Xprv).is_err());
        assert!(wallet.get_extended_public_key(44, CoinType::Solana, HdVersion::Xpub).is_err());
    }

    #[test]
    fn test_public_key_from_zpub() {
        let zpub = "zpub6rFR7y4Q2AijBEqTUquhVz398htDFrtymD9xYYfG1m4wAcvPhXNfE3EfH1r1ADqtfSdVCToUG868RvUUkgDKf31mGDtKsAYz2oz2AGutZYs";
        let path = DerivationPath::parse("m/44'/0'/0'/0/4").unwrap();
        let public = HDWallet::get_public_key_from_extended(zpub, CoinType::Bitcoin, &path).unwrap();
        assert_eq!(public.hex(), "03995137c8eb3b223c904259e9b571a8939a0ec99b0717684c3936407ca8538c1b");
        let address = AnyAddress::with_public_key(&public, CoinType::Bitcoin).unwrap();
        assert_eq!(address.description(), "bc1qm97vqzgj934vnaq9s53ynkyf9dgr05rargr04n");
    }

    #[test]
    fn test_private_key_from_xprv() {
        let xprv = "xprv9yqEgpMG2KCjvotCxaiMkzmKJpDXz2xZi3yUe4XsURvo9DUbPySW1qRbdeDLiSxZt88hESHUhm2AAe2EqfWM9ucdQzH3xv1HoKoLDqHMK9n";
        let path = DerivationPath::parse("m/44'/145'/0'/0/3").unwrap();
        let key = HDWallet::get_private_key_from_extended(xprv, CoinType::BitcoinCash, &path).unwrap();
        let public = key.public_key(PublicKeyType::Secp256k1).unwrap();
        assert_eq!(public.hex(), "025108168f7e5aad52f7381c18d8f880744dbee21dc02c15abe512da0b1cca7e2f");
        assert_eq!(
            AnyAddress::with_public_key(&public, CoinType::BitcoinCash).unwrap().description(),
            "bitcoincash:qp3y0dyg6ya8nt4n3algazn073egswkytqs00z7rz4"
        );

        assert!(HDWallet::get_private_key_from_extended("xprv9y0000", CoinType::BitcoinCash, &path).is_err());
        assert!(HDWallet::get_private_key_from_extended(xprv, CoinType::Solana, &path).is_err());
    }

    #[test]
    fn test_private_key_from_dgpv() {
        let dgpv = "dgpv595jAJYGBLanByCJXRzrWBZFVXdNisfuPmKRDquCQcwBbwKbeR21AtkETf4EpjBsfsK3kDZgMqhcuky1B9PrT5nxiEcjghxpUVYviHXuCmc";
        let path = DerivationPath::parse("m/44'/3'/0'/0/1").unwrap();
        let key = HDWallet::get_private_key_from_extended(dgpv, CoinType::Dogecoin, &path).unwrap();
        let public = key.public_key(PublicKeyType::Secp256k1).unwrap();
        assert_eq!(public.hex(), "03eb6bf281990ee074a39c71ed8ce78c486066ac433bcf066dd5eb08f87d3a6c34");
        assert_eq!(
            AnyAddress::with_public_key(&public, CoinType::Dogecoin).unwrap().description(),
            "D5taDndQJ1fDF3AM1yWavmJY2BgSi17CUv"
        );
    }
}
