//! Transaction builders.
//!
//! Every `build_*` method turns a request plus a [`TxParams`] into an
//! [`UnsignedTx`] whose inputs, outputs and operations come from this set.
//! None of them mutate the set: the caller removes spent UTXOs once the
//! transaction is accepted.
//!
//! Common rules:
//!
//! - An empty `change` slice means change goes back to `from`.
//! - Builders that do not spend the fee asset themselves need
//!   `params.fee_asset_id` whenever `params.fee > 0`.
//! - `params.threshold` larger than the destination list fails before any
//!   UTXO is looked at.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::amount::AssetAmountDestination;
use super::UtxoSet;
use crate::codec::TypeTag;
use crate::config::{NFT_FX_ID, SECP_FX_ID, TxParams};
use crate::error::{AxvmError, Result};
use crate::input::{SecpTransferInput, TransferableInput};
use crate::operation::{
    NftMintOperation, NftTransferOperation, Operation, SecpMintOperation, TransferableOperation,
};
use crate::output::{
    NftMintOutput, NftTransferOutput, Output, OutputOwners, SecpMintOutput, SecpTransferOutput,
    TransferableOutput,
};
use crate::transaction::create_asset::ensure_mint_outputs;
use crate::transaction::{BaseTx, CreateAssetTx, ExportTx, ImportTx, InitialStates, OperationTx, UnsignedTx};
use crate::types::{Address, AssetId, BlockchainId, Utxoid};
use crate::utxo::Utxo;

/// One group of an NFT asset: who may mint into it, and how many of them
/// must sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinterSet {
    pub threshold: u32,
    pub minters: Vec<Address>,
}

impl MinterSet {
    pub fn new(threshold: u32, minters: Vec<Address>) -> Self {
        Self { threshold, minters }
    }
}

fn check_threshold(threshold: u32, to: &[Address]) -> Result<()> {
    if threshold as usize > to.len() {
        return Err(AxvmError::Threshold {
            threshold,
            addresses: to.len(),
        });
    }
    Ok(())
}

fn change_or_from(change: &[Address], from: &[Address]) -> Vec<Address> {
    if change.is_empty() {
        from.to_vec()
    } else {
        change.to_vec()
    }
}

fn base_tx(params: &TxParams, outs: Vec<TransferableOutput>, ins: Vec<TransferableInput>) -> Result<BaseTx> {
    BaseTx::new(params.network_id, params.blockchain_id, outs, ins, params.memo.clone())
}

/// Signature slots for spending an output owned by `owners`.
///
/// Fails with `AddressNotOwner` naming the first candidate outside the
/// owner set, or with `Threshold` when every candidate is an owner but
/// there are too few of them.
fn signers_for(owners: &OutputOwners, from: &[Address], as_of: u64) -> Result<Vec<(u32, Address)>> {
    if !owners.meets_threshold(from, as_of) {
        if let Some(stranger) = from.iter().find(|a| owners.address_index(a).is_none()) {
            return Err(AxvmError::AddressNotOwner(*stranger));
        }
        return Err(AxvmError::Threshold {
            threshold: owners.threshold(),
            addresses: from.len(),
        });
    }
    owners
        .spenders(from, as_of)
        .into_iter()
        .map(|spender| {
            owners
                .address_index(&spender)
                .map(|index| (index, spender))
                .ok_or(AxvmError::AddressNotOwner(spender))
        })
        .collect()
}

impl UtxoSet {
    fn lookup(&self, utxo_id: &Utxoid) -> Result<&Utxo> {
        self.get(utxo_id).ok_or(AxvmError::UtxoNotFound(*utxo_id))
    }

    /// Inputs and change outputs paying `params.fee` in the fee asset, for
    /// builders whose payload spends nothing fungible.
    fn fee_only(
        &self,
        params: &TxParams,
        from: &[Address],
        change: &[Address],
    ) -> Result<(Vec<TransferableInput>, Vec<TransferableOutput>)> {
        if params.fee > 0 && params.fee_asset_id.is_none() {
            return Err(AxvmError::MissingField("fee asset id"));
        }
        let Some(fee_asset) = params.fee_asset_id.filter(|_| params.charges_fee()) else {
            return Ok((Vec::new(), Vec::new()));
        };
        let mut aad = AssetAmountDestination::new(from.to_vec(), from.to_vec(), change_or_from(change, from));
        aad.add_asset_amount(fee_asset, 0, params.fee)?;
        let aad = self.get_minimum_spendable(aad, params.as_of, params.locktime, params.threshold)?;
        let outs = aad.all_outputs();
        let (ins, _, _) = aad.into_parts();
        Ok((ins, outs))
    }

    /// Sends `amount` of `asset_id` to `to`, paying `params.fee` from
    /// `from`. When no fee asset is set, the fee is taken in `asset_id`.
    pub fn build_base_tx(
        &self,
        params: &TxParams,
        amount: u64,
        asset_id: AssetId,
        to: &[Address],
        from: &[Address],
        change: &[Address],
    ) -> Result<UnsignedTx> {
        check_threshold(params.threshold, to)?;
        if amount == 0 {
            return Err(AxvmError::ZeroAmount);
        }
        let fee_asset = params.fee_asset_id.unwrap_or(asset_id);

        let mut aad = AssetAmountDestination::new(to.to_vec(), from.to_vec(), change_or_from(change, from));
        if fee_asset == asset_id {
            aad.add_asset_amount(asset_id, amount, params.fee)?;
        } else {
            aad.add_asset_amount(asset_id, amount, 0)?;
            if params.fee > 0 {
                aad.add_asset_amount(fee_asset, 0, params.fee)?;
            }
        }
        let aad = self.get_minimum_spendable(aad, params.as_of, params.locktime, params.threshold)?;
        let outs = aad.all_outputs();
        let (ins, _, _) = aad.into_parts();

        let base = base_tx(params, outs, ins)?;
        info!(
            %asset_id,
            amount,
            ins = base.ins().len(),
            outs = base.outs().len(),
            "built base transaction"
        );
        Ok(UnsignedTx::new(base))
    }

    /// Creates a new fungible asset. `mint_outputs` join the SECP fx of
    /// `initial_states` and must all be [`SecpMintOutput`]s.
    #[allow(clippy::too_many_arguments)]
    pub fn build_create_asset_tx(
        &self,
        params: &TxParams,
        from: &[Address],
        change: &[Address],
        mut initial_states: InitialStates,
        name: &str,
        symbol: &str,
        denomination: u8,
        mint_outputs: Vec<Output>,
    ) -> Result<UnsignedTx> {
        ensure_mint_outputs(&mint_outputs)?;
        initial_states.add_outputs(SECP_FX_ID, mint_outputs)?;
        let (ins, outs) = self.fee_only(params, from, change)?;

        let base = base_tx(params, outs, ins)?;
        let tx = CreateAssetTx::new(base, name, symbol, denomination, initial_states)?;
        info!(asset_name = name, symbol, denomination, ins = tx.base.ins().len(), "built create-asset transaction");
        Ok(UnsignedTx::new(tx))
    }

    /// Mints with the [`SecpMintOutput`] at `mint_utxo_id`, replacing it with
    /// `mint_owner` and creating `transfer_output`.
    #[allow(clippy::too_many_arguments)]
    pub fn build_secp_mint_tx(
        &self,
        params: &TxParams,
        mint_owner: SecpMintOutput,
        transfer_output: SecpTransferOutput,
        from: &[Address],
        change: &[Address],
        mint_utxo_id: Utxoid,
    ) -> Result<UnsignedTx> {
        let utxo = self.lookup(&mint_utxo_id)?;
        let Output::SecpMint(existing) = &utxo.output else {
            return Err(AxvmError::UnexpectedOutput {
                utxo_id: mint_utxo_id,
                expected: TypeTag::SecpMintOutput,
                got: utxo.output.tag(),
            });
        };
        let (ins, outs) = self.fee_only(params, from, change)?;

        let mut operation: Operation = SecpMintOperation::new(mint_owner, transfer_output).into();
        for (index, spender) in signers_for(existing.owners(), from, params.as_of)? {
            operation.add_signature_idx(index, spender);
        }
        let op = TransferableOperation::new(utxo.asset_id, vec![mint_utxo_id], operation);
        debug!(utxo_id = %mint_utxo_id, "minting from utxo");

        let tx = OperationTx::new(base_tx(params, outs, ins)?, vec![op]);
        info!(asset_id = %utxo.asset_id, "built secp mint transaction");
        Ok(UnsignedTx::new(tx))
    }

    /// Creates an NFT asset with one [`NftMintOutput`] per minter set; the
    /// group id is the set's position. Denomination is always zero.
    pub fn build_create_nft_asset_tx(
        &self,
        params: &TxParams,
        from: &[Address],
        change: &[Address],
        minter_sets: &[MinterSet],
        name: &str,
        symbol: &str,
    ) -> Result<UnsignedTx> {
        let mut initial_states = InitialStates::new();
        for (group_id, set) in minter_sets.iter().enumerate() {
            let owners = OutputOwners::new(set.minters.clone(), params.locktime, set.threshold)?;
            initial_states.add_output(NFT_FX_ID, NftMintOutput::new(group_id as u32, owners))?;
        }
        let (ins, outs) = self.fee_only(params, from, change)?;

        let tx = CreateAssetTx::new(base_tx(params, outs, ins)?, name, symbol, 0, initial_states)?;
        info!(asset_name = name, symbol, groups = minter_sets.len(), "built create-nft-asset transaction");
        Ok(UnsignedTx::new(tx))
    }

    /// Mints `payload` into `group_id` once per UTXO in `utxo_ids`, each of
    /// which must hold an [`NftMintOutput`].
    #[allow(clippy::too_many_arguments)]
    pub fn build_create_nft_mint_tx(
        &self,
        params: &TxParams,
        owners: Vec<OutputOwners>,
        from: &[Address],
        change: &[Address],
        utxo_ids: &[Utxoid],
        group_id: u32,
        payload: Vec<u8>,
    ) -> Result<UnsignedTx> {
        let mut ops = Vec::with_capacity(utxo_ids.len());
        for utxo_id in utxo_ids {
            let utxo = self.lookup(utxo_id)?;
            let Output::NftMint(existing) = &utxo.output else {
                return Err(AxvmError::UnexpectedOutput {
                    utxo_id: *utxo_id,
                    expected: TypeTag::NftMintOutput,
                    got: utxo.output.tag(),
                });
            };
            let mut operation: Operation =
                NftMintOperation::new(group_id, payload.clone(), owners.clone())?.into();
            for (index, spender) in signers_for(existing.owners(), from, params.as_of)? {
                operation.add_signature_idx(index, spender);
            }
            debug!(%utxo_id, group_id, "minting nft");
            ops.push(TransferableOperation::new(utxo.asset_id, vec![*utxo_id], operation));
        }
        let (ins, outs) = self.fee_only(params, from, change)?;

        let tx = OperationTx::new(base_tx(params, outs, ins)?, ops);
        info!(group_id, ops = tx.operations().len(), "built nft mint transaction");
        Ok(UnsignedTx::new(tx))
    }

    /// Moves the NFTs at `utxo_ids` to `to`, keeping each one's group id and
    /// payload.
    pub fn build_nft_transfer_tx(
        &self,
        params: &TxParams,
        to: &[Address],
        from: &[Address],
        change: &[Address],
        utxo_ids: &[Utxoid],
    ) -> Result<UnsignedTx> {
        check_threshold(params.threshold, to)?;
        let mut ops = Vec::with_capacity(utxo_ids.len());
        for utxo_id in utxo_ids {
            let utxo = self.lookup(utxo_id)?;
            let Output::NftTransfer(existing) = &utxo.output else {
                return Err(AxvmError::UnexpectedOutput {
                    utxo_id: *utxo_id,
                    expected: TypeTag::NftTransferOutput,
                    got: utxo.output.tag(),
                });
            };
            let owners = OutputOwners::new(to.to_vec(), params.locktime, params.threshold)?;
            let output = NftTransferOutput::new(existing.group_id(), existing.payload().to_vec(), owners)?;
            let mut operation: Operation = NftTransferOperation::new(output).into();
            for (index, spender) in signers_for(existing.owners(), from, params.as_of)? {
                operation.add_signature_idx(index, spender);
            }
            debug!(%utxo_id, "transferring nft");
            ops.push(TransferableOperation::new(utxo.asset_id, vec![*utxo_id], operation));
        }
        let (ins, outs) = self.fee_only(params, from, change)?;

        let tx = OperationTx::new(base_tx(params, outs, ins)?, ops);
        info!(ops = tx.operations().len(), "built nft transfer transaction");
        Ok(UnsignedTx::new(tx))
    }

    /// Claims `atomics`, UTXOs exported to this chain from `source_chain`,
    /// and sends their value to `to` as one output per asset.
    ///
    /// The fee is deducted from imported UTXOs of the fee asset first. Any
    /// remainder is sourced from this set, and the resulting outputs are
    /// appended to the imported ones.
    pub fn build_import_tx(
        &self,
        params: &TxParams,
        to: &[Address],
        from: &[Address],
        change: &[Address],
        atomics: &[Utxo],
        source_chain: BlockchainId,
    ) -> Result<UnsignedTx> {
        check_threshold(params.threshold, to)?;
        if params.fee > 0 && params.fee_asset_id.is_none() {
            return Err(AxvmError::MissingField("fee asset id"));
        }

        let mut fee_paid = 0u64;
        let mut import_ins = Vec::with_capacity(atomics.len());
        let mut delivered_by_asset: BTreeMap<AssetId, u64> = BTreeMap::new();
        for utxo in atomics {
            let Output::SecpTransfer(out) = &utxo.output else {
                return Err(AxvmError::UnexpectedOutput {
                    utxo_id: utxo.utxo_id,
                    expected: TypeTag::SecpTransferOutput,
                    got: utxo.output.tag(),
                });
            };
            let mut delivered = out.amount();
            if params.charges_fee() && params.fee_asset_id == Some(utxo.asset_id) && fee_paid < params.fee {
                let taken = delivered.min(params.fee - fee_paid);
                fee_paid += taken;
                delivered -= taken;
            }

            let mut input = SecpTransferInput::new(out.amount());
            input.set_codec(utxo.codec());
            for (index, spender) in signers_for(out.owners(), from, params.as_of)? {
                input.add_signature_idx(index, spender);
            }
            import_ins.push(TransferableInput::new(utxo.utxo_id, utxo.asset_id, input));

            let total = delivered_by_asset.entry(utxo.asset_id).or_default();
            *total = total.checked_add(delivered).ok_or(AxvmError::Overflow)?;
            debug!(utxo_id = %utxo.utxo_id, amount = out.amount(), "importing utxo");
        }

        let mut outs = Vec::with_capacity(delivered_by_asset.len());
        for (asset_id, amount) in delivered_by_asset.into_iter().filter(|(_, amount)| *amount > 0) {
            let owners = OutputOwners::new(to.to_vec(), params.locktime, params.threshold)?;
            outs.push(TransferableOutput::new(asset_id, SecpTransferOutput::new(amount, owners)));
        }

        let mut ins = Vec::new();
        let remaining = params.fee - fee_paid;
        if let Some(fee_asset) = params.fee_asset_id.filter(|_| remaining > 0) {
            let mut aad = AssetAmountDestination::new(to.to_vec(), from.to_vec(), change_or_from(change, from));
            aad.add_asset_amount(fee_asset, 0, remaining)?;
            let aad = self.get_minimum_spendable(aad, params.as_of, params.locktime, params.threshold)?;
            outs.extend(aad.all_outputs());
            ins = aad.into_parts().0;
        }

        let tx = ImportTx::new(base_tx(params, outs, ins)?, source_chain, import_ins);
        info!(
            %source_chain,
            imports = tx.import_inputs().len(),
            fee_from_imports = fee_paid,
            "built import transaction"
        );
        Ok(UnsignedTx::new(tx))
    }

    /// Sends `amount` of `asset_id` to `to` on `destination_chain`. Change
    /// stays on this chain; the destination outputs become export outputs.
    #[allow(clippy::too_many_arguments)]
    pub fn build_export_tx(
        &self,
        params: &TxParams,
        amount: u64,
        asset_id: AssetId,
        to: &[Address],
        from: &[Address],
        change: &[Address],
        destination_chain: BlockchainId,
    ) -> Result<UnsignedTx> {
        check_threshold(params.threshold, to)?;
        if amount == 0 {
            return Err(AxvmError::ZeroAmount);
        }
        let fee_asset = params.fee_asset_id.unwrap_or(asset_id);

        let mut aad = AssetAmountDestination::new(to.to_vec(), from.to_vec(), change_or_from(change, from));
        if fee_asset == asset_id {
            aad.add_asset_amount(asset_id, amount, params.fee)?;
        } else {
            aad.add_asset_amount(asset_id, amount, 0)?;
            if params.fee > 0 {
                aad.add_asset_amount(fee_asset, 0, params.fee)?;
            }
        }
        let aad = self.get_minimum_spendable(aad, params.as_of, params.locktime, params.threshold)?;
        let (ins, export_outs, change_outs) = aad.into_parts();

        let tx = ExportTx::new(base_tx(params, change_outs, ins)?, Some(destination_chain), export_outs);
        info!(
            %asset_id,
            amount,
            %destination_chain,
            exports = tx.export_outputs().len(),
            "built export transaction"
        );
        Ok(UnsignedTx::new(tx))
    }
}
