//! Spend accounting.
//!
//! An [`AssetAmountDestination`] is handed to
//! [`UtxoSet::get_minimum_spendable`](super::UtxoSet::get_minimum_spendable)
//! by value and handed back filled in: consumed inputs, destination
//! outputs and change outputs. No state is shared between the caller and
//! the selection pass.

use crate::error::{AxvmError, Result};
use crate::input::TransferableInput;
use crate::output::TransferableOutput;
use crate::types::{Address, AssetId};

/// Running totals for one asset during selection.
///
/// `finished` flips once `spent >= amount + burn`; `change` is the excess
/// at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetAmount {
    asset_id: AssetId,
    amount: u64,
    burn: u64,
    spent: u64,
    change: u64,
    finished: bool,
}

impl AssetAmount {
    pub fn new(asset_id: AssetId, amount: u64, burn: u64) -> Self {
        Self {
            asset_id,
            amount,
            burn,
            spent: 0,
            change: 0,
            finished: amount == 0 && burn == 0,
        }
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// Amount delivered to the destinations.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Amount consumed without a matching output: the fee.
    pub fn burn(&self) -> u64 {
        self.burn
    }

    pub fn spent(&self) -> u64 {
        self.spent
    }

    pub fn change(&self) -> u64 {
        self.change
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// `amount + burn`.
    pub fn required(&self) -> Result<u64> {
        self.amount.checked_add(self.burn).ok_or(AxvmError::Overflow)
    }

    /// Records `value` as consumed. Returns whether the target is now met.
    pub fn spend_amount(&mut self, value: u64) -> Result<bool> {
        self.spent = self.spent.checked_add(value).ok_or(AxvmError::Overflow)?;
        let required = self.required()?;
        if self.spent >= required {
            self.change = self.spent - required;
            self.finished = true;
        }
        Ok(self.finished)
    }

    fn add(&mut self, amount: u64, burn: u64) -> Result<()> {
        self.amount = self.amount.checked_add(amount).ok_or(AxvmError::Overflow)?;
        self.burn = self.burn.checked_add(burn).ok_or(AxvmError::Overflow)?;
        let required = self.required()?;
        self.finished = self.spent >= required;
        self.change = self.spent.saturating_sub(required);
        Ok(())
    }
}

/// A spend request plus the results of selecting for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetAmountDestination {
    destinations: Vec<Address>,
    senders: Vec<Address>,
    change_addresses: Vec<Address>,
    amounts: Vec<AssetAmount>,
    pub(crate) inputs: Vec<TransferableInput>,
    pub(crate) outputs: Vec<TransferableOutput>,
    pub(crate) change_outputs: Vec<TransferableOutput>,
}

impl AssetAmountDestination {
    pub fn new(destinations: Vec<Address>, senders: Vec<Address>, change_addresses: Vec<Address>) -> Self {
        Self {
            destinations,
            senders,
            change_addresses,
            ..Self::default()
        }
    }

    /// Requests `amount` of `asset_id` for the destinations plus `burn`
    /// consumed as fee. Requests for the same asset accumulate into one entry.
    pub fn add_asset_amount(&mut self, asset_id: AssetId, amount: u64, burn: u64) -> Result<()> {
        match self.amounts.iter_mut().find(|a| a.asset_id == asset_id) {
            Some(existing) => existing.add(amount, burn),
            None => {
                self.amounts.push(AssetAmount::new(asset_id, amount, burn));
                Ok(())
            }
        }
    }

    pub fn destinations(&self) -> &[Address] {
        &self.destinations
    }

    pub fn senders(&self) -> &[Address] {
        &self.senders
    }

    pub fn change_addresses(&self) -> &[Address] {
        &self.change_addresses
    }

    pub fn amounts(&self) -> &[AssetAmount] {
        &self.amounts
    }

    pub fn asset_amount(&self, asset_id: &AssetId) -> Option<&AssetAmount> {
        self.amounts.iter().find(|a| &a.asset_id == asset_id)
    }

    pub(crate) fn asset_amount_mut(&mut self, asset_id: &AssetId) -> Option<&mut AssetAmount> {
        self.amounts.iter_mut().find(|a| &a.asset_id == asset_id)
    }

    pub fn can_complete(&self) -> bool {
        self.amounts.iter().all(AssetAmount::is_finished)
    }

    pub fn inputs(&self) -> &[TransferableInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransferableOutput] {
        &self.outputs
    }

    pub fn change_outputs(&self) -> &[TransferableOutput] {
        &self.change_outputs
    }

    /// Destination outputs followed by change outputs.
    pub fn all_outputs(&self) -> Vec<TransferableOutput> {
        self.outputs
            .iter()
            .chain(&self.change_outputs)
            .cloned()
            .collect()
    }

    pub fn into_parts(self) -> (Vec<TransferableInput>, Vec<TransferableOutput>, Vec<TransferableOutput>) {
        (self.inputs, self.outputs, self.change_outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(b: u8) -> AssetId {
        AssetId::from_bytes([b; 32])
    }

    #[test]
    fn spend_tracks_change() {
        let mut a = AssetAmount::new(asset(1), 10, 1);
        assert!(!a.spend_amount(5).unwrap());
        assert!(a.spend_amount(7).unwrap());
        assert_eq!(a.spent(), 12);
        assert_eq!(a.change(), 1);
    }

    #[test]
    fn exact_spend_has_no_change() {
        let mut a = AssetAmount::new(asset(1), 4, 0);
        assert!(a.spend_amount(4).unwrap());
        assert_eq!(a.change(), 0);
    }

    #[test]
    fn spend_overflow_is_reported() {
        let mut a = AssetAmount::new(asset(1), u64::MAX, 0);
        a.spend_amount(u64::MAX - 1).unwrap();
        assert_eq!(a.spend_amount(2).unwrap_err(), AxvmError::Overflow);
        let a = AssetAmount::new(asset(1), u64::MAX, 1);
        assert_eq!(a.required().unwrap_err(), AxvmError::Overflow);
    }

    #[test]
    fn same_asset_requests_merge() {
        let mut aad = AssetAmountDestination::new(vec![], vec![], vec![]);
        aad.add_asset_amount(asset(1), 10, 0).unwrap();
        aad.add_asset_amount(asset(1), 0, 2).unwrap();
        aad.add_asset_amount(asset(2), 0, 3).unwrap();
        assert_eq!(aad.amounts().len(), 2);
        let first = aad.asset_amount(&asset(1)).unwrap();
        assert_eq!((first.amount(), first.burn()), (10, 2));
        assert!(!aad.can_complete());
    }
}
