//! Coin registry
//!
//! Every supported chain is a `CoinType` variant. Encoding and signing
//! parameters (curve, derivation path, address prefixes, chain ids) hang
//! off the enum as `match`-based accessors.

use crate::address::AnyAddress;
use crate::crypto::{CurveType, PrivateKey, PublicKeyType};
use crate::error::{CoreError, CoreResult};
use crate::wallet::derivation_path::DerivationPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported coins, identified by SLIP-44 number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinType {
    Bitcoin,
    Litecoin,
    Dogecoin,
    #[serde(rename = "bitcoincash")]
    BitcoinCash,
    Ethereum,
    #[serde(rename = "smartchain")]
    SmartChain,
    Polygon,
    Tron,
    #[serde(rename = "ripple", alias = "xrp")]
    Xrp,
    Cosmos,
    #[serde(rename = "thorchain")]
    THORChain,
    Binance,
    Stellar,
    Algorand,
    Solana,
    Polkadot,
    Kusama,
    Near,
    Aptos,
    Sui,
}

/// Chain family; coins in one family share address and signing code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blockchain {
    Bitcoin,
    Ethereum,
    Tron,
    Ripple,
    Cosmos,
    Stellar,
    Algorand,
    Solana,
    Polkadot,
    Near,
    Aptos,
    Sui,
}

/// Alternative derivations a coin may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    #[default]
    Default,
    Legacy,
    Segwit,
    Testnet,
}

impl Derivation {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" | "" => Some(Derivation::Default),
            "legacy" => Some(Derivation::Legacy),
            "segwit" => Some(Derivation::Segwit),
            "testnet" => Some(Derivation::Testnet),
            _ => None,
        }
    }
}

/// Extended key version prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HdVersion {
    Xpub,
    Xprv,
    Ypub,
    Yprv,
    Zpub,
    Zprv,
    Ltub,
    Ltpv,
    Mtub,
    Mtpv,
    Dgub,
    Dgpv,
}

impl HdVersion {
    pub fn bytes(&self) -> u32 {
        match self {
            HdVersion::Xpub => 0x0488_b21e,
            HdVersion::Xprv => 0x0488_ade4,
            HdVersion::Ypub => 0x049d_7cb2,
            HdVersion::Yprv => 0x049d_7878,
            HdVersion::Zpub => 0x04b2_4746,
            HdVersion::Zprv => 0x04b2_430c,
            HdVersion::Ltub => 0x019d_a462,
            HdVersion::Ltpv => 0x019d_9cfe,
            HdVersion::Mtub => 0x01b2_6ef6,
            HdVersion::Mtpv => 0x01b2_6792,
            HdVersion::Dgub => 0x02fa_cafd,
            HdVersion::Dgpv => 0x02fa_c398,
        }
    }

    pub fn from_bytes(version: u32) -> Option<Self> {
        HdVersion::all().into_iter().find(|v| v.bytes() == version)
    }

    pub fn all() -> [HdVersion; 12] {
        [
            HdVersion::Xpub,
            HdVersion::Xprv,
            HdVersion::Ypub,
            HdVersion::Yprv,
            HdVersion::Zpub,
            HdVersion::Zprv,
            HdVersion::Ltub,
            HdVersion::Ltpv,
            HdVersion::Mtub,
            HdVersion::Mtpv,
            HdVersion::Dgub,
            HdVersion::Dgpv,
        ]
    }

    pub fn is_public(&self) -> bool {
        matches!(
            self,
            HdVersion::Xpub | HdVersion::Ypub | HdVersion::Zpub | HdVersion::Ltub | HdVersion::Mtub | HdVersion::Dgub
        )
    }

    /// BIP purpose conventionally paired with this prefix
    pub fn purpose(&self) -> u32 {
        match self {
            HdVersion::Ypub | HdVersion::Yprv | HdVersion::Mtub | HdVersion::Mtpv => 49,
            HdVersion::Zpub | HdVersion::Zprv => 84,
            _ => 44,
        }
    }

    /// The private counterpart of a public prefix
    pub fn private_version(&self) -> HdVersion {
        match self {
            HdVersion::Xpub => HdVersion::Xprv,
            HdVersion::Ypub => HdVersion::Yprv,
            HdVersion::Zpub => HdVersion::Zprv,
            HdVersion::Ltub => HdVersion::Ltpv,
            HdVersion::Mtub => HdVersion::Mtpv,
            HdVersion::Dgub => HdVersion::Dgpv,
            other => *other,
        }
    }
}

impl CoinType {
    pub fn all() -> &'static [CoinType] {
        &[
            CoinType::Bitcoin,
            CoinType::Litecoin,
            CoinType::Dogecoin,
            CoinType::BitcoinCash,
            CoinType::Ethereum,
            CoinType::SmartChain,
            CoinType::Polygon,
            CoinType::Tron,
            CoinType::Xrp,
            CoinType::Cosmos,
            CoinType::THORChain,
            CoinType::Binance,
            CoinType::Stellar,
            CoinType::Algorand,
            CoinType::Solana,
            CoinType::Polkadot,
            CoinType::Kusama,
            CoinType::Near,
            CoinType::Aptos,
            CoinType::Sui,
        ]
    }

    /// Registry id; also accepts the symbol and a few common aliases
    pub fn from_id(id: &str) -> Option<Self> {
        let lowered = id.trim().to_ascii_lowercase();
        if let Some(coin) = CoinType::all().iter().copied().find(|c| c.id() == lowered) {
            return Some(coin);
        }
        match lowered.as_str() {
            "dogecoin" => return Some(CoinType::Dogecoin),
            "bsc" => return Some(CoinType::SmartChain),
            "matic" => return Some(CoinType::Polygon),
            "bnb" => return Some(CoinType::Binance),
            _ => {}
        }
        CoinType::all()
            .iter()
            .copied()
            .find(|c| c.symbol().eq_ignore_ascii_case(&lowered))
    }

    pub fn from_slip44(value: u32) -> Option<Self> {
        CoinType::all().iter().copied().find(|c| c.slip44() == value)
    }

    pub fn slip44(&self) -> u32 {
        match self {
            CoinType::Bitcoin => 0,
            CoinType::Litecoin => 2,
            CoinType::Dogecoin => 3,
            CoinType::BitcoinCash => 145,
            CoinType::Ethereum => 60,
            CoinType::SmartChain => 20000714,
            CoinType::Polygon => 966,
            CoinType::Tron => 195,
            CoinType::Xrp => 144,
            CoinType::Cosmos => 118,
            CoinType::THORChain => 931,
            CoinType::Binance => 714,
            CoinType::Stellar => 148,
            CoinType::Algorand => 283,
            CoinType::Solana => 501,
            CoinType::Polkadot => 354,
            CoinType::Kusama => 434,
            CoinType::Near => 397,
            CoinType::Aptos => 637,
            CoinType::Sui => 784,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            CoinType::Bitcoin => "bitcoin",
            CoinType::Litecoin => "litecoin",
            CoinType::Dogecoin => "doge",
            CoinType::BitcoinCash => "bitcoincash",
            CoinType::Ethereum => "ethereum",
            CoinType::SmartChain => "smartchain",
            CoinType::Polygon => "polygon",
            CoinType::Tron => "tron",
            CoinType::Xrp => "ripple",
            CoinType::Cosmos => "cosmos",
            CoinType::THORChain => "thorchain",
            CoinType::Binance => "binance",
            CoinType::Stellar => "stellar",
            CoinType::Algorand => "algorand",
            CoinType::Solana => "solana",
            CoinType::Polkadot => "polkadot",
            CoinType::Kusama => "kusama",
            CoinType::Near => "near",
            CoinType::Aptos => "aptos",
            CoinType::Sui => "sui",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CoinType::Bitcoin => "Bitcoin",
            CoinType::Litecoin => "Litecoin",
            CoinType::Dogecoin => "Dogecoin",
            CoinType::BitcoinCash => "Bitcoin Cash",
            CoinType::Ethereum => "Ethereum",
            CoinType::SmartChain => "BNB Smart Chain",
            CoinType::Polygon => "Polygon",
            CoinType::Tron => "Tron",
            CoinType::Xrp => "XRP",
            CoinType::Cosmos => "Cosmos Hub",
            CoinType::THORChain => "THORChain",
            CoinType::Binance => "BNB Beacon Chain",
            CoinType::Stellar => "Stellar",
            CoinType::Algorand => "Algorand",
            CoinType::Solana => "Solana",
            CoinType::Polkadot => "Polkadot",
            CoinType::Kusama => "Kusama",
            CoinType::Near => "NEAR",
            CoinType::Aptos => "Aptos",
            CoinType::Sui => "Sui",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CoinType::Bitcoin => "BTC",
            CoinType::Litecoin => "LTC",
            CoinType::Dogecoin => "DOGE",
            CoinType::BitcoinCash => "BCH",
            CoinType::Ethereum => "ETH",
            CoinType::SmartChain => "BNB",
            CoinType::Polygon => "POL",
            CoinType::Tron => "TRX",
            CoinType::Xrp => "XRP",
            CoinType::Cosmos => "ATOM",
            CoinType::THORChain => "RUNE",
            CoinType::Binance => "BNB",
            CoinType::Stellar => "XLM",
            CoinType::Algorand => "ALGO",
            CoinType::Solana => "SOL",
            CoinType::Polkadot => "DOT",
            CoinType::Kusama => "KSM",
            CoinType::Near => "NEAR",
            CoinType::Aptos => "APT",
            CoinType::Sui => "SUI",
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            CoinType::Bitcoin
            | CoinType::Litecoin
            | CoinType::Dogecoin
            | CoinType::BitcoinCash
            | CoinType::THORChain
            | CoinType::Binance
            | CoinType::Aptos => 8,
            CoinType::Ethereum | CoinType::SmartChain | CoinType::Polygon => 18,
            CoinType::Tron | CoinType::Xrp | CoinType::Cosmos | CoinType::Algorand => 6,
            CoinType::Stellar => 7,
            CoinType::Solana | CoinType::Sui => 9,
            CoinType::Polkadot => 10,
            CoinType::Kusama => 12,
            CoinType::Near => 24,
        }
    }

    pub fn blockchain(&self) -> Blockchain {
        match self {
            CoinType::Bitcoin | CoinType::Litecoin | CoinType::Dogecoin | CoinType::BitcoinCash => {
                Blockchain::Bitcoin
            }
            CoinType::Ethereum | CoinType::SmartChain | CoinType::Polygon => Blockchain::Ethereum,
            CoinType::Tron => Blockchain::Tron,
            CoinType::Xrp => Blockchain::Ripple,
            CoinType::Cosmos | CoinType::THORChain | CoinType::Binance => Blockchain::Cosmos,
            CoinType::Stellar => Blockchain::Stellar,
            CoinType::Algorand => Blockchain::Algorand,
            CoinType::Solana => Blockchain::Solana,
            CoinType::Polkadot | CoinType::Kusama => Blockchain::Polkadot,
            CoinType::Near => Blockchain::Near,
            CoinType::Aptos => Blockchain::Aptos,
            CoinType::Sui => Blockchain::Sui,
        }
    }

    pub fn curve(&self) -> CurveType {
        match self.blockchain() {
            Blockchain::Bitcoin
            | Blockchain::Ethereum
            | Blockchain::Tron
            | Blockchain::Ripple
            | Blockchain::Cosmos => CurveType::Secp256k1,
            _ => CurveType::Ed25519,
        }
    }

    pub fn public_key_type(&self) -> PublicKeyType {
        match self.blockchain() {
            Blockchain::Ethereum | Blockchain::Tron => PublicKeyType::Secp256k1Extended,
            Blockchain::Bitcoin | Blockchain::Ripple | Blockchain::Cosmos => PublicKeyType::Secp256k1,
            _ => PublicKeyType::Ed25519,
        }
    }

    fn default_path(&self) -> &'static str {
        match self {
            CoinType::Bitcoin => "m/84'/0'/0'/0/0",
            CoinType::Litecoin => "m/84'/2'/0'/0/0",
            CoinType::Dogecoin => "m/44'/3'/0'/0/0",
            CoinType::BitcoinCash => "m/44'/145'/0'/0/0",
            CoinType::Ethereum | CoinType::SmartChain | CoinType::Polygon => "m/44'/60'/0'/0/0",
            CoinType::Tron => "m/44'/195'/0'/0/0",
            CoinType::Xrp => "m/44'/144'/0'/0/0",
            CoinType::Cosmos => "m/44'/118'/0'/0/0",
            CoinType::THORChain => "m/44'/931'/0'/0/0",
            CoinType::Binance => "m/44'/714'/0'/0/0",
            CoinType::Stellar => "m/44'/148'/0'",
            CoinType::Algorand => "m/44'/283'/0'/0'/0'",
            CoinType::Solana => "m/44'/501'/0'",
            CoinType::Polkadot => "m/44'/354'/0'/0'/0'",
            CoinType::Kusama => "m/44'/434'/0'/0'/0'",
            CoinType::Near => "m/44'/397'/0'",
            CoinType::Aptos => "m/44'/637'/0'/0'/0'",
            CoinType::Sui => "m/44'/784'/0'/0'/0'",
        }
    }

    /// Derivations this coin offers besides `Default`
    pub fn derivations(&self) -> &'static [Derivation] {
        match self {
            CoinType::Bitcoin => &[Derivation::Default, Derivation::Legacy, Derivation::Testnet],
            CoinType::Litecoin => &[Derivation::Default, Derivation::Legacy],
            _ => &[Derivation::Default],
        }
    }

    fn derivation_path_str(&self, derivation: Derivation) -> &'static str {
        match (self, derivation) {
            (CoinType::Bitcoin, Derivation::Legacy) => "m/44'/0'/0'/0/0",
            (CoinType::Bitcoin, Derivation::Testnet) => "m/84'/1'/0'/0/0",
            (CoinType::Litecoin, Derivation::Legacy) => "m/44'/2'/0'/0/0",
            _ => self.default_path(),
        }
    }

    /// Derivation path for the given derivation; unknown ones fall back to the default
    pub fn derivation_path(&self, derivation: Derivation) -> DerivationPath {
        // Registry literals are well formed
        DerivationPath::parse(self.derivation_path_str(derivation))
            .unwrap_or_else(|_| DerivationPath::from_indices(&[]))
    }

    /// Base58 version bytes (p2pkh, p2sh)
    pub fn base58_prefixes(&self) -> Option<(u8, u8)> {
        match self {
            CoinType::Bitcoin | CoinType::BitcoinCash => Some((0x00, 0x05)),
            CoinType::Litecoin => Some((0x30, 0x32)),
            CoinType::Dogecoin => Some((0x1e, 0x16)),
            CoinType::Tron => Some((0x41, 0x41)),
            CoinType::Xrp => Some((0x00, 0x00)),
            _ => None,
        }
    }

    /// Bech32 human readable part (segwit, cosmos) or CashAddr prefix
    pub fn hrp(&self) -> Option<&'static str> {
        match self {
            CoinType::Bitcoin => Some("bc"),
            CoinType::Litecoin => Some("ltc"),
            CoinType::BitcoinCash => Some("bitcoincash"),
            CoinType::Cosmos => Some("cosmos"),
            CoinType::THORChain => Some("thor"),
            CoinType::Binance => Some("bnb"),
            _ => None,
        }
    }

    pub fn ss58_prefix(&self) -> Option<u16> {
        match self {
            CoinType::Polkadot => Some(0),
            CoinType::Kusama => Some(2),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> Option<&'static str> {
        match self {
            CoinType::Ethereum => Some("1"),
            CoinType::SmartChain => Some("56"),
            CoinType::Polygon => Some("137"),
            CoinType::Cosmos => Some("cosmoshub-4"),
            CoinType::THORChain => Some("thorchain-mainnet-v1"),
            CoinType::Binance => Some("Binance-Chain-Tigris"),
            _ => None,
        }
    }

    /// Default extended key prefixes (public, private)
    pub fn hd_versions(&self) -> Option<(HdVersion, HdVersion)> {
        match self {
            CoinType::Bitcoin | CoinType::Litecoin => Some((HdVersion::Zpub, HdVersion::Zprv)),
            CoinType::Dogecoin => Some((HdVersion::Dgub, HdVersion::Dgpv)),
            CoinType::BitcoinCash => Some((HdVersion::Xpub, HdVersion::Xprv)),
            _ => None,
        }
    }

    pub fn explorer_transaction_url(&self, hash: &str) -> String {
        match self {
            CoinType::Bitcoin => format!("https://mempool.space/tx/{}", hash),
            CoinType::Litecoin => format!("https://blockchair.com/litecoin/transaction/{}", hash),
            CoinType::Dogecoin => format!("https://blockchair.com/dogecoin/transaction/{}", hash),
            CoinType::BitcoinCash => format!("https://blockchair.com/bitcoin-cash/transaction/{}", hash),
            CoinType::Ethereum => format!("https://etherscan.io/tx/{}", hash),
            CoinType::SmartChain => format!("https://bscscan.com/tx/{}", hash),
            CoinType::Polygon => format!("https://polygonscan.com/tx/{}", hash),
            CoinType::Tron => format!("https://tronscan.org/#/transaction/{}", hash),
            CoinType::Xrp => format!("https://bithomp.com/explorer/{}", hash),
            CoinType::Cosmos => format!("https://www.mintscan.io/cosmos/txs/{}", hash),
            CoinType::THORChain => format!("https://viewblock.io/thorchain/tx/{}", hash),
            CoinType::Binance => format!("https://explorer.bnbchain.org/tx/{}", hash),
            CoinType::Stellar => format!("https://stellar.expert/explorer/public/tx/{}", hash),
            CoinType::Algorand => format!("https://allo.info/tx/{}", hash),
            CoinType::Solana => format!("https://solscan.io/tx/{}", hash),
            CoinType::Polkadot => format!("https://polkadot.subscan.io/extrinsic/{}", hash),
            CoinType::Kusama => format!("https://kusama.subscan.io/extrinsic/{}", hash),
            CoinType::Near => format!("https://nearblocks.io/txns/{}", hash),
            CoinType::Aptos => format!("https://explorer.aptoslabs.com/txn/{}", hash),
            CoinType::Sui => format!("https://suiscan.xyz/mainnet/tx/{}", hash),
        }
    }

    pub fn explorer_account_url(&self, address: &str) -> String {
        match self {
            CoinType::Bitcoin => format!("https://mempool.space/address/{}", address),
            CoinType::Litecoin => format!("https://blockchair.com/litecoin/address/{}", address),
            CoinType::Dogecoin => format!("https://blockchair.com/dogecoin/address/{}", address),
            CoinType::BitcoinCash => format!("https://blockchair.com/bitcoin-cash/address/{}", address),
            CoinType::Ethereum => format!("https://etherscan.io/address/{}", address),
            CoinType::SmartChain => format!("https://bscscan.com/address/{}", address),
            CoinType::Polygon => format!("https://polygonscan.com/address/{}", address),
            CoinType::Tron => format!("https://tronscan.org/#/address/{}", address),
            CoinType::Xrp => format!("https://bithomp.com/explorer/{}", address),
            CoinType::Cosmos => format!("https://www.mintscan.io/cosmos/account/{}", address),
            CoinType::THORChain => format!("https://viewblock.io/thorchain/address/{}", address),
            CoinType::Binance => format!("https://explorer.bnbchain.org/address/{}", address),
            CoinType::Stellar => format!("https://stellar.expert/explorer/public/account/{}", address),
            CoinType::Algorand => format!("https://allo.info/account/{}", address),
            CoinType::Solana => format!("https://solscan.io/account/{}", address),
            CoinType::Polkadot => format!("https://polkadot.subscan.io/account/{}", address),
            CoinType::Kusama => format!("https://kusama.subscan.io/account/{}", address),
            CoinType::Near => format!("https://nearblocks.io/address/{}", address),
            CoinType::Aptos => format!("https://explorer.aptoslabs.com/account/{}", address),
            CoinType::Sui => format!("https://suiscan.xyz/mainnet/account/{}", address),
        }
    }

    pub fn validate_address(&self, address: &str) -> bool {
        AnyAddress::is_valid(address, *self)
    }

    /// Address of the default derivation for a raw private key
    pub fn derive_address(&self, private_key: &PrivateKey) -> CoreResult<String> {
        self.derive_address_with(private_key, Derivation::Default)
    }

    pub fn derive_address_with(&self, private_key: &PrivateKey, derivation: Derivation) -> CoreResult<String> {
        let public_key = private_key.public_key(self.public_key_type())?;
        Ok(AnyAddress::with_public_key_derivation(&public_key, *self, derivation)?.description())
    }

    pub fn is_evm(&self) -> bool {
        self.blockchain() == Blockchain::Ethereum
    }

    pub fn is_utxo(&self) -> bool {
        self.blockchain() == Blockchain::Bitcoin
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for CoinType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoinType::from_id(s).ok_or_else(|| CoreError::unsupported_coin(format!("Unknown coin: {}", s)))
    }
}

/// Registry entry as exposed over FFI and the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinInfo {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub slip44: u32,
    pub blockchain: Blockchain,
    pub curve: CurveType,
    pub public_key_type: PublicKeyType,
    pub derivation_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ss58_prefix: Option<u16>,
}

impl From<CoinType> for CoinInfo {
    fn from(coin: CoinType) -> Self {
        CoinInfo {
            id: coin.id().to_string(),
            name: coin.name().to_string(),
            symbol: coin.symbol().to_string(),
            decimals: coin.decimals(),
            slip44: coin.slip44(),
            blockchain: coin.blockchain(),
            curve: coin.curve(),
            public_key_type: coin.public_key_type(),
            derivation_path: coin.derivation_path(Derivation::Default).to_string(),
            hrp: coin.hrp().map(str::to_string),
            chain_id: coin.chain_id().map(str::to_string),
            ss58_prefix: coin.ss58_prefix(),
        }
    }
}
