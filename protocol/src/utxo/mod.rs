//! # UTXO Set
//!
//! The wallet-side index of spendable outputs, and the coin-selection
//! engine that turns a spend request into a transaction.
//!
//! ```text
//! mod.rs       -- Utxo, UtxoSet storage, queries and set algebra
//! amount.rs    -- AssetAmount / AssetAmountDestination accumulators
//! selection.rs -- get_minimum_spendable, the greedy selection pass
//! builders.rs  -- the build_*_tx operations
//! ```
//!
//! ## Ordering
//!
//! UTXOs are scanned in insertion order. Re-adding an existing UTXO with
//! `overwrite` keeps its original position. Selection results therefore
//! depend only on what was added and in which order, never on hashing.
//!
//! ## Concurrency
//!
//! A `UtxoSet` is plain data. Callers that share one across threads must
//! serialize mutation against the `build_*` calls, or clone the set first.

pub mod amount;
pub mod builders;
pub mod selection;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::codec::encoding::{Encoding, FieldSpec, Fields, HumanReadable};
use crate::codec::{codec_from_id, CodecVersion, Packable, Reader};
use crate::error::{AxvmError, Result};
use crate::output::Output;
use crate::types::{Address, AssetId, TxId, Utxoid};

pub use amount::{AssetAmount, AssetAmountDestination};
pub use builders::MinterSet;

// ---------------------------------------------------------------------------
// Utxo
// ---------------------------------------------------------------------------

/// `codec:u16, txID:32B, outputIndex:u32, assetID:32B, outputTypeID:u32, body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    codec: CodecVersion,
    pub utxo_id: Utxoid,
    pub asset_id: AssetId,
    pub output: Output,
}

impl Utxo {
    pub fn new(utxo_id: Utxoid, asset_id: AssetId, output: impl Into<Output>) -> Self {
        let output = output.into();
        Self {
            codec: output.codec(),
            utxo_id,
            asset_id,
            output,
        }
    }

    pub fn codec(&self) -> CodecVersion {
        self.codec
    }

    pub fn set_codec_id(&mut self, codec_id: u16) -> Result<()> {
        self.codec = codec_from_id(codec_id)?;
        self.output.set_codec(self.codec);
        Ok(())
    }

    pub fn tx_id(&self) -> TxId {
        self.utxo_id.tx_id
    }

    pub fn output_index(&self) -> u32 {
        self.utxo_id.output_index
    }
}

impl Packable for Utxo {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u16(self.codec.as_u16());
        self.utxo_id.pack(buf);
        self.asset_id.pack(buf);
        self.output.pack(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let codec = codec_from_id(reader.read_u16()?)?;
        let utxo_id = Utxoid::unpack(reader)?;
        let asset_id = AssetId::unpack(reader)?;
        let output = Output::unpack(reader)?;
        Ok(Self {
            codec,
            utxo_id,
            asset_id,
            output,
        })
    }
}

impl HumanReadable for Utxo {
    const SCHEMA: &'static [FieldSpec] = &[
        ("codecID", Encoding::Decimal),
        ("txID", Encoding::Cb58),
        ("outputIdx", Encoding::Decimal),
        ("assetID", Encoding::Cb58),
    ];

    fn to_fields(&self) -> Result<Fields> {
        let mut fields = Fields::new(Self::SCHEMA);
        fields.put_u64("codecID", self.codec.as_u16() as u64)?;
        fields.put_bytes("txID", self.utxo_id.tx_id.as_bytes())?;
        fields.put_u64("outputIdx", self.utxo_id.output_index as u64)?;
        fields.put_bytes("assetID", self.asset_id.as_bytes())?;
        fields.put_object("output", &self.output)?;
        Ok(fields)
    }

    fn from_fields(fields: &Fields) -> Result<Self> {
        let codec_id = u16::try_from(fields.u64("codecID")?).map_err(|_| AxvmError::Overflow)?;
        Ok(Self {
            codec: codec_from_id(codec_id)?,
            utxo_id: Utxoid::new(
                TxId::from_bytes(fields.array("txID")?),
                fields.u32("outputIdx")?,
            ),
            asset_id: AssetId::from_bytes(fields.array("assetID")?),
            output: fields.object("output")?,
        })
    }
}

// ---------------------------------------------------------------------------
// MergeRule
// ---------------------------------------------------------------------------

/// How [`UtxoSet::merge_by_rule`] combines two sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeRule {
    /// UTXOs present in both.
    Intersection,
    /// UTXOs of `self` not in the other set.
    DifferenceSelf,
    /// UTXOs of the other set not in `self`.
    DifferenceNew,
    /// UTXOs in exactly one of the two.
    SymDifference,
    Union,
    /// The union, minus the other set.
    UnionMinusNew,
    /// The union, minus `self`.
    UnionMinusSelf,
}

// ---------------------------------------------------------------------------
// UtxoSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct UtxoSet {
    /// Insertion sequence number to UTXO; iteration order is scan order.
    utxos: BTreeMap<u64, Utxo>,
    index: HashMap<Utxoid, u64>,
    /// Owner address to (UTXO id, locktime).
    address_utxos: HashMap<Address, HashMap<Utxoid, u64>>,
    next_seq: u64,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Adds `utxo`. An existing UTXO with the same id is replaced only when
    /// `overwrite` is set. Returns whether the set changed.
    pub fn add(&mut self, utxo: Utxo, overwrite: bool) -> bool {
        let utxo_id = utxo.utxo_id;
        let seq = match self.index.get(&utxo_id) {
            Some(_) if !overwrite => return false,
            Some(&seq) => {
                self.unindex_addresses(seq);
                seq
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.index.insert(utxo_id, seq);
                seq
            }
        };
        let locktime = utxo.output.owners().locktime();
        for address in utxo.output.owners().addresses() {
            self.address_utxos
                .entry(*address)
                .or_default()
                .insert(utxo_id, locktime);
        }
        debug!(%utxo_id, asset = %utxo.asset_id, "utxo added");
        self.utxos.insert(seq, utxo);
        true
    }

    /// Parses and adds a serialized UTXO.
    pub fn add_bytes(&mut self, bytes: &[u8], overwrite: bool) -> Result<bool> {
        Ok(self.add(Utxo::from_bytes(bytes)?, overwrite))
    }

    /// Adds every UTXO; returns how many changed the set.
    pub fn add_array(&mut self, utxos: impl IntoIterator<Item = Utxo>, overwrite: bool) -> usize {
        utxos
            .into_iter()
            .map(|utxo| self.add(utxo, overwrite))
            .filter(|added| *added)
            .count()
    }

    /// Parses every serialized UTXO before adding any of them.
    pub fn add_array_bytes<B: AsRef<[u8]>>(&mut self, items: &[B], overwrite: bool) -> Result<usize> {
        let utxos = items
            .iter()
            .map(|bytes| Utxo::from_bytes(bytes.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.add_array(utxos, overwrite))
    }

    pub fn remove(&mut self, utxo_id: &Utxoid) -> Option<Utxo> {
        let seq = self.index.remove(utxo_id)?;
        self.unindex_addresses(seq);
        self.utxos.remove(&seq)
    }

    pub fn remove_array(&mut self, utxo_ids: &[Utxoid]) -> Vec<Utxo> {
        utxo_ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    fn unindex_addresses(&mut self, seq: u64) {
        let Some(utxo) = self.utxos.get(&seq) else {
            return;
        };
        for address in utxo.output.owners().addresses() {
            if let Some(ids) = self.address_utxos.get_mut(address) {
                ids.remove(&utxo.utxo_id);
                if ids.is_empty() {
                    self.address_utxos.remove(address);
                }
            }
        }
    }

    pub fn get(&self, utxo_id: &Utxoid) -> Option<&Utxo> {
        self.index.get(utxo_id).and_then(|seq| self.utxos.get(seq))
    }

    pub fn includes(&self, utxo_id: &Utxoid) -> bool {
        self.index.contains_key(utxo_id)
    }

    /// Every UTXO, in scan order.
    pub fn all_utxos(&self) -> impl Iterator<Item = &Utxo> {
        self.utxos.values()
    }

    /// The UTXOs for `utxo_ids` that are present, in the order asked for.
    pub fn utxos_for(&self, utxo_ids: &[Utxoid]) -> Vec<&Utxo> {
        utxo_ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Ids of UTXOs owned by any of `addresses` (all UTXOs when `None`),
    /// in scan order. With `spendable_as_of`, UTXOs still locked at that
    /// time are left out.
    pub fn utxo_ids(&self, addresses: Option<&[Address]>, spendable_as_of: Option<u64>) -> Vec<Utxoid> {
        let Some(addresses) = addresses else {
            return self
                .utxos
                .values()
                .filter(|u| spendable_as_of.map_or(true, |t| u.output.owners().locktime() <= t))
                .map(|u| u.utxo_id)
                .collect();
        };
        let mut wanted = HashSet::new();
        for address in addresses {
            if let Some(ids) = self.address_utxos.get(address) {
                for (id, locktime) in ids {
                    if spendable_as_of.map_or(true, |t| *locktime <= t) {
                        wanted.insert(*id);
                    }
                }
            }
        }
        self.utxos
            .values()
            .filter(|u| wanted.contains(&u.utxo_id))
            .map(|u| u.utxo_id)
            .collect()
    }

    /// Every address owning at least one UTXO, ascending.
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.address_utxos.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Total unlocked amount of `asset_id` owned by any of `addresses`.
    pub fn balance(&self, addresses: &[Address], asset_id: &AssetId, as_of: u64) -> Result<u64> {
        self.utxo_ids(Some(addresses), Some(as_of))
            .iter()
            .filter_map(|id| self.get(id))
            .filter(|u| &u.asset_id == asset_id)
            .filter_map(|u| u.output.amount())
            .try_fold(0u64, |acc, amount| acc.checked_add(amount).ok_or(AxvmError::Overflow))
    }

    /// Distinct assets held by `addresses` (all assets when `None`), ascending.
    pub fn asset_ids(&self, addresses: Option<&[Address]>) -> Vec<AssetId> {
        let ids: BTreeSet<AssetId> = self
            .utxo_ids(addresses, None)
            .iter()
            .filter_map(|id| self.get(id))
            .map(|u| u.asset_id)
            .collect();
        ids.into_iter().collect()
    }

    fn filtered(&self, keep: impl Fn(&Utxo) -> bool) -> Self {
        let mut set = Self::new();
        for utxo in self.utxos.values().filter(|u| keep(u)) {
            set.add(utxo.clone(), false);
        }
        set
    }

    /// `self` followed by the UTXOs of `other` not already present.
    pub fn union(&self, other: &UtxoSet) -> UtxoSet {
        let mut set = self.clone();
        for utxo in other.all_utxos() {
            set.add(utxo.clone(), false);
        }
        set
    }

    pub fn intersection(&self, other: &UtxoSet) -> UtxoSet {
        self.filtered(|u| other.includes(&u.utxo_id))
    }

    pub fn difference(&self, other: &UtxoSet) -> UtxoSet {
        self.filtered(|u| !other.includes(&u.utxo_id))
    }

    pub fn sym_difference(&self, other: &UtxoSet) -> UtxoSet {
        self.difference(other).union(&other.difference(self))
    }

    pub fn merge_by_rule(&self, other: &UtxoSet, rule: MergeRule) -> UtxoSet {
        match rule {
            MergeRule::Intersection => self.intersection(other),
            MergeRule::DifferenceSelf => self.difference(other),
            MergeRule::DifferenceNew => other.difference(self),
            MergeRule::SymDifference => self.sym_difference(other),
            MergeRule::Union => self.union(other),
            MergeRule::UnionMinusNew => self.union(other).difference(other),
            MergeRule::UnionMinusSelf => self.union(other).difference(self),
        }
    }
}
