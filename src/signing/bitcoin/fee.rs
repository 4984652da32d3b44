//! Transaction size estimates used for fees and the dust threshold

use crate::coin::CoinType;

pub trait FeeCalculator: Send + Sync {
    fn calculate(&self, inputs: usize, outputs: usize, byte_fee: u64) -> u64;

    /// Fee to spend one more input; also the dust threshold
    fn calculate_single_input(&self, byte_fee: u64) -> u64;
}

/// Legacy P2PKH sizing: `10 + 148 * inputs + 34 * outputs` bytes
#[derive(Debug, Clone, Copy)]
pub struct LinearFeeCalculator {
    pub bytes_base: u64,
    pub bytes_per_input: u64,
    pub bytes_per_output: u64,
}

impl LinearFeeCalculator {
    pub const fn legacy() -> Self {
        Self {
            bytes_base: 10,
            bytes_per_input: 148,
            bytes_per_output: 34,
        }
    }
}

impl FeeCalculator for LinearFeeCalculator {
    fn calculate(&self, inputs: usize, outputs: usize, byte_fee: u64) -> u64 {
        let bytes = self.bytes_base + self.bytes_per_input * inputs as u64 + self.bytes_per_output * outputs as u64;
        bytes.saturating_mul(byte_fee)
    }

    fn calculate_single_input(&self, byte_fee: u64) -> u64 {
        self.bytes_per_input.saturating_mul(byte_fee)
    }
}

/// P2WPKH virtual size: `10 + 101.25 * inputs + 31 * outputs` vbytes, rounded up
#[derive(Debug, Clone, Copy)]
pub struct SegwitFeeCalculator;

impl SegwitFeeCalculator {
    // Sizes in quarter vbytes so the arithmetic stays integral
    const BASE_QUARTERS: u64 = 40;
    const INPUT_QUARTERS: u64 = 405;
    const OUTPUT_QUARTERS: u64 = 124;
}

impl FeeCalculator for SegwitFeeCalculator {
    fn calculate(&self, inputs: usize, outputs: usize, byte_fee: u64) -> u64 {
        let quarters =
            Self::BASE_QUARTERS + Self::INPUT_QUARTERS * inputs as u64 + Self::OUTPUT_QUARTERS * outputs as u64;
        quarters.div_ceil(4).saturating_mul(byte_fee)
    }

    fn calculate_single_input(&self, byte_fee: u64) -> u64 {
        Self::INPUT_QUARTERS.div_ceil(4).saturating_mul(byte_fee)
    }
}

static LEGACY: LinearFeeCalculator = LinearFeeCalculator::legacy();
static SEGWIT: SegwitFeeCalculator = SegwitFeeCalculator;

/// Segwit sizing for coins whose default address is native segwit
pub fn fee_calculator(coin: CoinType) -> &'static dyn FeeCalculator {
    match coin {
        CoinType::Bitcoin | CoinType::Litecoin => &SEGWIT,
        _ => &LEGACY,
    }
}
