//! UTXO selection

use super::fee::FeeCalculator;

/// Anything with a spendable amount
pub trait SelectableInput: Clone {
    fn amount(&self) -> u64;
}

impl SelectableInput for u64 {
    fn amount(&self) -> u64 {
        *self
    }
}

pub fn sum<T: SelectableInput>(inputs: &[T]) -> u64 {
    inputs.iter().map(|i| i.amount()).sum()
}

pub struct InputSelector<'a, T> {
    inputs: &'a [T],
    fee_calculator: &'a dyn FeeCalculator,
}

impl<'a, T: SelectableInput> InputSelector<'a, T> {
    pub const DEFAULT_NUM_OUTPUTS: usize = 2;

    pub fn new(inputs: &'a [T], fee_calculator: &'a dyn FeeCalculator) -> Self {
        Self { inputs, fee_calculator }
    }

    fn dust_threshold(&self, byte_fee: u64) -> u64 {
        self.fee_calculator.calculate_single_input(byte_fee)
    }

    fn filter_out_dust(&self, inputs: &[T], byte_fee: u64) -> Vec<T> {
        let dust = self.dust_threshold(byte_fee);
        inputs.iter().filter(|i| i.amount() > dust).cloned().collect()
    }

    /// Pick the fewest consecutive (by amount) inputs covering `target` plus fee
    ///
    /// Prefers a selection that also leaves non-dust change, choosing the one
    /// closest to twice the target; falls back to any selection covering
    /// target plus fee. Returns nothing when the inputs cannot cover it.
    pub fn select(&self, target: u64, byte_fee: u64, num_outputs: usize) -> Vec<T> {
        if target == 0 || self.inputs.is_empty() || sum(self.inputs) < target {
            return Vec::new();
        }

        let mut sorted = self.inputs.to_vec();
        sorted.sort_by_key(|i| i.amount());
        let n = sorted.len();

        // max_with[x]: sum of the x largest inputs
        let mut max_with = vec![0u64; n + 1];
        for x in 1..=n {
            max_with[x] = max_with[x - 1].saturating_add(sorted[n - x].amount());
        }

        let dust = self.dust_threshold(byte_fee);
        let double_target = target as i128 * 2;

        for num_inputs in 1..=n {
            let fee = self.fee_calculator.calculate(num_inputs, num_outputs, byte_fee);
            let needed = target.saturating_add(fee).saturating_add(dust);
            if max_with[num_inputs] < needed {
                continue;
            }
            let best = sorted
                .windows(num_inputs)
                .filter(|w| sum(w) >= needed)
                .min_by_key(|w| (sum(w) as i128 - double_target).abs());
            if let Some(window) = best {
                return self.filter_out_dust(window, byte_fee);
            }
        }

        for num_inputs in 1..=n {
            let fee = self.fee_calculator.calculate(num_inputs, num_outputs, byte_fee);
            let needed = target.saturating_add(fee);
            if max_with[num_inputs] < needed {
                continue;
            }
            if let Some(window) = sorted.windows(num_inputs).find(|w| sum(w) >= needed) {
                return self.filter_out_dust(window, byte_fee);
            }
        }

        Vec::new()
    }

    /// Accumulate non-dust inputs in their given order until a padded target is met
    pub fn select_simple(&self, target: u64, byte_fee: u64, num_outputs: usize) -> Vec<T> {
        if target == 0 || self.inputs.is_empty() {
            return Vec::new();
        }
        let fee = self.fee_calculator.calculate(self.inputs.len(), num_outputs, byte_fee);
        let increased = (target as f64 * 1.1 + fee as f64 + 1000.0) as u64;
        let dust = self.dust_threshold(byte_fee);

        let mut selected = Vec::new();
        let mut total = 0u64;
        for input in self.inputs.iter().filter(|i| i.amount() > dust) {
            selected.push(input.clone());
            total = total.saturating_add(input.amount());
            if total >= increased {
                return selected;
            }
        }
        Vec::new()
    }

    /// Every input worth more than it costs to spend
    pub fn select_max_amount(&self, byte_fee: u64) -> Vec<T> {
        self.filter_out_dust(self.inputs, byte_fee)
    }
}
