//! Call encoding for the balances, staking and utility pallets

use super::{BalanceCall, CallIndices, RewardDestination, StakingCall, Transfer};
use crate::address::Ss58Address;
use crate::encoding::scale::{Compact, ScaleEncode};
use crate::error::{CoreError, CoreResult};
use lazy_static::lazy_static;
use std::collections::HashMap;

pub const POLKADOT_NETWORK: u16 = 0;
pub const KUSAMA_NETWORK: u16 = 2;

/// First Polkadot runtime whose calls take `MultiAddress` accounts
const POLKADOT_MULTI_ADDRESS_SPEC: u32 = 28;
/// Kusama switched after this runtime
const KUSAMA_MULTI_ADDRESS_SPEC: u32 = 2028;

const BALANCE_TRANSFER: &str = "Balances.transfer";
const STAKING_BOND: &str = "Staking.bond";
const STAKING_BOND_EXTRA: &str = "Staking.bond_extra";
const STAKING_UNBOND: &str = "Staking.unbond";
const STAKING_WITHDRAW_UNBONDED: &str = "Staking.withdraw_unbonded";
const STAKING_NOMINATE: &str = "Staking.nominate";
const STAKING_CHILL: &str = "Staking.chill";
const STAKING_REBOND: &str = "Staking.rebond";
const UTILITY_BATCH: &str = "Utility.batch_all";

lazy_static! {
    static ref CALL_INDICES: HashMap<u16, HashMap<&'static str, [u8; 2]>> = {
        let polkadot = HashMap::from([
            (BALANCE_TRANSFER, [0x05, 0x00]),
            (STAKING_BOND, [0x07, 0x00]),
            (STAKING_BOND_EXTRA, [0x07, 0x01]),
            (STAKING_UNBOND, [0x07, 0x02]),
            (STAKING_WITHDRAW_UNBONDED, [0x07, 0x03]),
            (STAKING_NOMINATE, [0x07, 0x05]),
            (STAKING_CHILL, [0x07, 0x06]),
            (STAKING_REBOND, [0x07, 0x13]),
            (UTILITY_BATCH, [0x1a, 0x02]),
        ]);
        let kusama = HashMap::from([
            (BALANCE_TRANSFER, [0x04, 0x00]),
            (STAKING_BOND, [0x06, 0x00]),
            (STAKING_BOND_EXTRA, [0x06, 0x01]),
            (STAKING_UNBOND, [0x06, 0x02]),
            (STAKING_WITHDRAW_UNBONDED, [0x06, 0x03]),
            (STAKING_NOMINATE, [0x06, 0x05]),
            (STAKING_CHILL, [0x06, 0x06]),
            (STAKING_REBOND, [0x06, 0x13]),
            (UTILITY_BATCH, [0x18, 0x02]),
        ]);
        HashMap::from([(POLKADOT_NETWORK, polkadot), (KUSAMA_NETWORK, kusama)])
    };
}

/// Encodes calls for one network and runtime version
#[derive(Debug, Clone, Copy)]
pub struct CallEncoder {
    network: u16,
    multi_address: bool,
}

impl CallEncoder {
    pub fn new(network: u16, spec_version: u32, multi_address: bool) -> Self {
        let multi_address = multi_address
            || match network {
                POLKADOT_NETWORK => spec_version >= POLKADOT_MULTI_ADDRESS_SPEC,
                KUSAMA_NETWORK => spec_version > KUSAMA_MULTI_ADDRESS_SPEC,
                _ => false,
            };
        Self { network, multi_address }
    }

    pub fn multi_address(&self) -> bool {
        self.multi_address
    }

    fn call_index(&self, name: &str, custom: &Option<CallIndices>) -> CoreResult<[u8; 2]> {
        if let Some(custom) = custom {
            return Ok([custom.module_index, custom.method_index]);
        }
        CALL_INDICES
            .get(&self.network)
            .and_then(|table| table.get(name))
            .copied()
            .ok_or_else(|| {
                CoreError::invalid_input(format!(
                    "No call index for {} on network {}; pass call_indices",
                    name, self.network
                ))
            })
    }

    /// Account id, as `MultiAddress::Id` when the runtime expects it
    pub fn account(&self, key: &[u8; 32], out: &mut Vec<u8>) {
        if self.multi_address {
            out.push(0x00);
        }
        out.extend_from_slice(key);
    }

    fn address(&self, address: &str, out: &mut Vec<u8>) -> CoreResult<()> {
        let parsed = Ss58Address::decode(address)?;
        self.account(parsed.key(), out);
        Ok(())
    }

    fn transfer(&self, transfer: &Transfer) -> CoreResult<Vec<u8>> {
        let mut out = self.call_index(BALANCE_TRANSFER, &transfer.call_indices)?.to_vec();
        self.address(&transfer.to_address, &mut out)?;
        Compact(transfer.value).encode_to(&mut out);
        if let Some(memo) = transfer.memo.as_deref().filter(|m| !m.is_empty()) {
            if memo.len() > 32 {
                return Err(CoreError::invalid_input("Memo is longer than 32 bytes"));
            }
            let mut padded = [0u8; 32];
            padded[..memo.len()].copy_from_slice(memo.as_bytes());
            out.push(0x01);
            out.extend_from_slice(&padded);
        }
        Ok(out)
    }

    fn batch(&self, calls: Vec<Vec<u8>>, custom: &Option<CallIndices>) -> CoreResult<Vec<u8>> {
        let mut out = self.call_index(UTILITY_BATCH, custom)?.to_vec();
        Compact(calls.len() as u128).encode_to(&mut out);
        for call in calls {
            out.extend_from_slice(&call);
        }
        Ok(out)
    }

    pub fn balance_call(&self, call: &BalanceCall) -> CoreResult<Vec<u8>> {
        match call {
            BalanceCall::Transfer(transfer) => self.transfer(transfer),
            BalanceCall::BatchTransfer { transfers, call_indices } => {
                let calls = transfers
                    .iter()
                    .map(|t| self.transfer(t))
                    .collect::<CoreResult<Vec<_>>>()?;
                self.batch(calls, call_indices)
            }
        }
    }

    fn bond(
        &self,
        controller: &str,
        value: u128,
        reward: RewardDestination,
        custom: &Option<CallIndices>,
    ) -> CoreResult<Vec<u8>> {
        let mut out = self.call_index(STAKING_BOND, custom)?.to_vec();
        // Runtimes since 9430 dropped the controller argument
        if !controller.is_empty() {
            self.address(controller, &mut out)?;
        }
        Compact(value).encode_to(&mut out);
        (reward as u8).encode_to(&mut out);
        Ok(out)
    }

    fn nominate(&self, nominators: &[String], custom: &Option<CallIndices>) -> CoreResult<Vec<u8>> {
        let mut out = self.call_index(STAKING_NOMINATE, custom)?.to_vec();
        Compact(nominators.len() as u128).encode_to(&mut out);
        for nominator in nominators {
            self.address(nominator, &mut out)?;
        }
        Ok(out)
    }

    fn value_call(&self, name: &str, value: u128, custom: &Option<CallIndices>) -> CoreResult<Vec<u8>> {
        let mut out = self.call_index(name, custom)?.to_vec();
        Compact(value).encode_to(&mut out);
        Ok(out)
    }

    fn chill(&self, custom: &Option<CallIndices>) -> CoreResult<Vec<u8>> {
        Ok(self.call_index(STAKING_CHILL, custom)?.to_vec())
    }

    pub fn staking_call(&self, call: &StakingCall) -> CoreResult<Vec<u8>> {
        match call {
            StakingCall::Bond {
                controller,
                value,
                reward_destination,
                call_indices,
            } => self.bond(controller, *value, *reward_destination, call_indices),
            StakingCall::BondAndNominate {
                controller,
                value,
                reward_destination,
                nominators,
                call_indices,
            } => {
                let bond = self.bond(controller, *value, *reward_destination, call_indices)?;
                let nominate = self.nominate(nominators, call_indices)?;
                self.batch(vec![bond, nominate], call_indices)
            }
            StakingCall::BondExtra { value, call_indices } => {
                self.value_call(STAKING_BOND_EXTRA, *value, call_indices)
            }
            StakingCall::Unbond { value, call_indices } => self.value_call(STAKING_UNBOND, *value, call_indices),
            StakingCall::Rebond { value, call_indices } => self.value_call(STAKING_REBOND, *value, call_indices),
            StakingCall::WithdrawUnbonded {
                slashing_spans,
                call_indices,
            } => {
                let mut out = self.call_index(STAKING_WITHDRAW_UNBONDED, call_indices)?.to_vec();
                slashing_spans.encode_to(&mut out);
                Ok(out)
            }
            StakingCall::Nominate {
                nominators,
                call_indices,
            } => self.nominate(nominators, call_indices),
            StakingCall::Chill { call_indices } => self.chill(call_indices),
            StakingCall::ChillAndUnbond { value, call_indices } => {
                let chill = self.chill(call_indices)?;
                let unbond = self.value_call(STAKING_UNBOND, *value, call_indices)?;
                self.batch(vec![chill, unbond], call_indices)
            }
        }
    }
}
