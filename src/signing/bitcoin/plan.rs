//! Transaction planning: which UTXOs to spend, the fee and the change

use super::fee::fee_calculator;
use super::input_selector::{sum, InputSelector};
use super::{SigningInput, UnspentTransaction};
use crate::coin::CoinType;
use crate::error::{CoreError, CoreResult, ErrorCode};
use crate::log_debug;
use crate::serde_bytes::u64_string;
use crate::utils::config::{self, DustPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionPlan {
    #[serde(with = "u64_string")]
    pub amount: u64,
    #[serde(with = "u64_string")]
    pub available_amount: u64,
    #[serde(with = "u64_string")]
    pub fee: u64,
    #[serde(with = "u64_string")]
    pub change: u64,
    pub utxos: Vec<UnspentTransaction>,
    pub error: ErrorCode,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl From<CoreError> for TransactionPlan {
    fn from(e: CoreError) -> Self {
        Self {
            error: e.code,
            error_message: e.message,
            ..Default::default()
        }
    }
}

fn not_enough_utxos(message: impl Into<String>) -> CoreError {
    CoreError::new(ErrorCode::NotEnoughUtxos, message)
}

fn dust_amount(amount: u64, dust: u64) -> CoreError {
    CoreError::new(
        ErrorCode::DustAmount,
        format!("Amount {} is below the dust threshold {}", amount, dust),
    )
}

pub fn plan(input: &SigningInput, coin: CoinType) -> CoreResult<TransactionPlan> {
    if input.utxos.is_empty() {
        return Err(not_enough_utxos("No UTXOs to spend"));
    }
    if input.amount == 0 && !input.use_max_amount {
        return Err(CoreError::new(ErrorCode::ZeroAmount, "Amount is zero"));
    }

    let calculator = fee_calculator(coin);
    let selector = InputSelector::new(&input.utxos, calculator);
    let byte_fee = input.byte_fee;
    let dust = calculator.calculate_single_input(byte_fee);
    let total = sum(&input.utxos);

    let plan = if input.use_max_amount || input.amount >= total {
        let utxos = selector.select_max_amount(byte_fee);
        if utxos.is_empty() {
            return Err(not_enough_utxos("Every UTXO is below the dust threshold"));
        }
        let available_amount = sum(&utxos);
        let fee = calculator.calculate(utxos.len(), 1, byte_fee);
        if available_amount <= fee {
            return Err(CoreError::insufficient_funds(format!(
                "Available {} does not cover fee {}",
                available_amount, fee
            )));
        }
        let amount = available_amount - fee;
        if amount < dust {
            return Err(dust_amount(amount, dust));
        }
        TransactionPlan {
            amount,
            available_amount,
            fee,
            change: 0,
            utxos,
            ..Default::default()
        }
    } else {
        if input.amount < dust {
            return Err(dust_amount(input.amount, dust));
        }
        let utxos = selector.select(input.amount, byte_fee, InputSelector::<UnspentTransaction>::DEFAULT_NUM_OUTPUTS);
        if utxos.is_empty() {
            return Err(not_enough_utxos(format!("UTXOs cannot cover {}", input.amount)));
        }
        let available_amount = sum(&utxos);
        let mut fee = calculator.calculate(utxos.len(), 2, byte_fee);
        let mut change = available_amount
            .checked_sub(input.amount)
            .and_then(|rest| rest.checked_sub(fee))
            .ok_or_else(|| not_enough_utxos("Selected UTXOs do not cover amount and fee"))?;

        let policy = input.dust_policy.unwrap_or_else(|| config::global().dust_policy);
        if change > 0 && change < dust && policy == DustPolicy::AddToFee {
            fee += change;
            change = 0;
        }
        TransactionPlan {
            amount: input.amount,
            available_amount,
            fee,
            change,
            utxos,
            ..Default::default()
        }
    };

    log_debug!(
        "bitcoin",
        "Planned transaction",
        coin = coin.id(),
        inputs = plan.utxos.len(),
        amount = plan.amount,
        fee = plan.fee,
        change = plan.change
    );
    Ok(plan)
}
