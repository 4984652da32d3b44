//! JSON entry point routing a signing request to its chain family

use super::bitcoin::{self, BitcoinSigner};
use super::ethereum::EthereumSigner;
use super::polkadot::PolkadotSigner;
use super::solana::SolanaSigner;
use super::ChainSigner;
use crate::coin::{Blockchain, CoinType};
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::log_warn;
use serde::Serialize;

/// Output for requests no signer accepted
#[derive(Debug, Serialize)]
pub(crate) struct ErrorOutput {
    pub error: ErrorCode,
    pub error_message: String,
}

impl From<CoreError> for ErrorOutput {
    fn from(e: CoreError) -> Self {
        Self {
            error: e.code,
            error_message: e.message,
        }
    }
}

pub(crate) fn to_json<T: Serialize>(output: &T) -> String {
    serde_json::to_string(output).unwrap_or_else(|e| {
        format!(
            r#"{{"error":"json_error","error_message":"{}"}}"#,
            e.to_string().replace('"', "'")
        )
    })
}

pub(crate) fn parse_input<S: ChainSigner>(json: &str) -> CoreResult<S::Input> {
    serde_json::from_str(json).map_err(CoreError::from)
}

pub(crate) fn unsupported(coin: CoinType) -> CoreError {
    CoreError::unsupported_coin(format!("{} has no transaction signer", coin.name()))
}

fn sign_with<S: ChainSigner>(json: &str, coin: CoinType) -> String {
    let output = parse_input::<S>(json)
        .and_then(|input| S::sign(coin, &input))
        .unwrap_or_else(|e| {
            log_warn!("any_signer", "Signing failed", coin = coin.id(), code = format!("{:?}", e.code));
            S::Output::from(e)
        });
    to_json(&output)
}

pub struct AnySigner;

impl AnySigner {
    /// Sign a JSON `SigningInput` for `coin` and return the JSON `SigningOutput`
    pub fn sign(json: &str, coin: CoinType) -> String {
        match coin.blockchain() {
            Blockchain::Ethereum => sign_with::<EthereumSigner>(json, coin),
            Blockchain::Bitcoin => sign_with::<BitcoinSigner>(json, coin),
            Blockchain::Solana => sign_with::<SolanaSigner>(json, coin),
            Blockchain::Polkadot => sign_with::<PolkadotSigner>(json, coin),
            _ => to_json(&ErrorOutput::from(unsupported(coin))),
        }
    }

    pub fn supports_json(coin: CoinType) -> bool {
        matches!(
            coin.blockchain(),
            Blockchain::Ethereum | Blockchain::Bitcoin | Blockchain::Solana | Blockchain::Polkadot
        )
    }

    /// Transaction plan for UTXO coins; other coins get an error plan
    pub fn plan(json: &str, coin: CoinType) -> String {
        if coin.blockchain() != Blockchain::Bitcoin {
            return to_json(&bitcoin::TransactionPlan::from(CoreError::not_implemented(format!(
                "{} does not use transaction plans",
                coin.name()
            ))));
        }
        let plan = parse_input::<BitcoinSigner>(json)
            .and_then(|input| BitcoinSigner::plan(coin, &input))
            .unwrap_or_else(bitcoin::TransactionPlan::from);
        to_json(&plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn parse(output: String) -> Value {
        serde_json::from_str(&output).unwrap()
    }

    #[test]
    fn test_sign_ethereum_transfer() {
        let input = json!({
            "chain_id": "1",
            "nonce": "9",
            "gas_price": "20000000000",
            "gas_limit": "21000",
            "to_address": "0x3535353535353535353535353535353535353535",
            "private_key": "4646464646464646464646464646464646464646464646464646464646464646",
            "transaction": {"transfer": {"amount": "1000000000000000000"}},
        });
        let output = parse(AnySigner::sign(&input.to_string(), CoinType::Ethereum));
        assert_eq!(output["error"], "ok");
        assert_eq!(
            output["encoded"],
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let output = parse(AnySigner::sign("{not json", CoinType::Solana));
        assert_eq!(output["error"], "json_error");
        assert!(!output["error_message"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_coin() {
        assert!(!AnySigner::supports_json(CoinType::Stellar));
        assert!(AnySigner::supports_json(CoinType::Kusama));
        let output = parse(AnySigner::sign("{}", CoinType::Stellar));
        assert_eq!(output["error"], "unsupported_coin");
    }

    #[test]
    fn test_plan_only_for_utxo_coins() {
        let output = parse(AnySigner::plan("{}", CoinType::Ethereum));
        assert_eq!(output["error"], "not_implemented");

        let input = json!({
            "amount": "1000",
            "byte_fee": "1",
            "to_address": "1Bp9U1ogV3A14FMvKbRJms7ctyso4Z4Tcx",
            "change_address": "1FQc5LdgGHMHEN9nwkjmz6tWkxhPpxBvBU",
            "utxos": [],
        });
        let output = parse(AnySigner::plan(&input.to_string(), CoinType::Bitcoin));
        assert_eq!(output["error"], "not_enough_utxos");
    }
}
