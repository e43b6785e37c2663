//! Greedy coin selection.
//!
//! UTXOs are visited in scan order. A UTXO is consumed whole when its
//! asset is requested and not yet covered, it holds a fungible amount, and
//! the senders meet its threshold at `as_of`. There is no search for a
//! better subset, so results are reproducible for a given set.

use tracing::{debug, warn};

use super::amount::AssetAmountDestination;
use super::UtxoSet;
use crate::error::{AxvmError, Result};
use crate::input::{SecpTransferInput, TransferableInput};
use crate::output::{Output, OutputOwners, SecpTransferOutput, TransferableOutput};

impl UtxoSet {
    /// Covers every requested amount in `aad` from this set and fills in
    /// its inputs, destination outputs and change outputs.
    ///
    /// Destination outputs are created only for a positive amount, locked
    /// with `locktime` and `threshold`. Change goes to the change
    /// addresses, unlocked with threshold one.
    pub fn get_minimum_spendable(
        &self,
        mut aad: AssetAmountDestination,
        as_of: u64,
        locktime: u64,
        threshold: u32,
    ) -> Result<AssetAmountDestination> {
        let senders = aad.senders().to_vec();
        for utxo in self.all_utxos() {
            if aad.can_complete() {
                break;
            }
            let Some(entry) = aad.asset_amount_mut(&utxo.asset_id) else {
                continue;
            };
            if entry.is_finished() {
                continue;
            }
            let Output::SecpTransfer(out) = &utxo.output else {
                warn!(utxo_id = %utxo.utxo_id, kind = %utxo.output.tag(), "skipping output without an amount");
                continue;
            };
            if !out.owners().meets_threshold(&senders, as_of) {
                continue;
            }
            entry.spend_amount(out.amount())?;

            let mut input = SecpTransferInput::new(out.amount());
            input.set_codec(utxo.codec());
            for spender in out.owners().spenders(&senders, as_of) {
                let index = out
                    .owners()
                    .address_index(&spender)
                    .ok_or(AxvmError::AddressNotOwner(spender))?;
                input.add_signature_idx(index, spender);
            }
            debug!(utxo_id = %utxo.utxo_id, amount = out.amount(), "consuming utxo");
            aad.inputs
                .push(TransferableInput::new(utxo.utxo_id, utxo.asset_id, input));
        }

        if let Some(short) = aad.amounts().iter().find(|a| !a.is_finished()) {
            let required = short.required()?;
            warn!(
                asset_id = %short.asset_id(),
                required,
                available = short.spent(),
                "insufficient funds"
            );
            return Err(AxvmError::InsufficientFunds {
                asset_id: short.asset_id(),
                required,
                available: short.spent(),
            });
        }

        let mut outputs = Vec::new();
        let mut change_outputs = Vec::new();
        for amount in aad.amounts() {
            if amount.amount() > 0 {
                let owners = OutputOwners::new(aad.destinations().to_vec(), locktime, threshold)?;
                outputs.push(TransferableOutput::new(
                    amount.asset_id(),
                    SecpTransferOutput::new(amount.amount(), owners),
                ));
            }
            if amount.change() > 0 {
                let owners = OutputOwners::new(aad.change_addresses().to_vec(), 0, 1)?;
                change_outputs.push(TransferableOutput::new(
                    amount.asset_id(),
                    SecpTransferOutput::new(amount.change(), owners),
                ));
            }
        }
        aad.outputs.extend(outputs);
        aad.change_outputs.extend(change_outputs);
        Ok(aad)
    }
}
