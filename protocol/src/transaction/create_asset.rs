//! Asset creation.
//!
//! A `CreateAssetTx` is a base transaction followed by
//! `name:u16-prefixed, symbol:u16-prefixed, denomination:u8, InitialStates`.
//! The new asset's id is the id of the signed transaction that creates it.

use std::collections::BTreeMap;

use bytes::{BufMut, BytesMut};

use crate::codec::wire::{check_len, put_count, put_u16_prefixed, put_vec};
use crate::codec::{resolve, Category, CodecVersion, Packable, Reader, TypeTag};
use crate::config::{MAX_DENOMINATION, MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH, NFT_FX_ID, SECP_FX_ID};
use crate::error::{AxvmError, Result};
use crate::output::{ensure_bare_outputs_sorted, sort_bare_outputs, Output};
use crate::transaction::base::BaseTx;

// ---------------------------------------------------------------------------
// InitialStates
// ---------------------------------------------------------------------------

/// Genesis outputs of an asset, grouped by feature extension.
///
/// `numFx:u32, (fxID:u32, numOuts:u32, (typeID:u32, body)*)*`. Fx ids are
/// written in ascending order and each fx's outputs in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InitialStates {
    fxs: BTreeMap<u32, Vec<Output>>,
}

impl InitialStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `output` under `fx_id`. The SECP and NFT fxs only accept their
    /// own output variants.
    pub fn add_output(&mut self, fx_id: u32, output: impl Into<Output>) -> Result<()> {
        let output = output.into();
        let expected = match fx_id {
            SECP_FX_ID => Some((
                "SECP fx output",
                matches!(output, Output::SecpTransfer(_) | Output::SecpMint(_)),
            )),
            NFT_FX_ID => Some((
                "NFT fx output",
                matches!(output, Output::NftMint(_) | Output::NftTransfer(_)),
            )),
            _ => None,
        };
        if let Some((name, false)) = expected {
            return Err(AxvmError::WrongType {
                expected: name.to_string(),
                got: output.tag(),
            });
        }
        let outputs = self.fxs.entry(fx_id).or_default();
        outputs.push(output);
        sort_bare_outputs(outputs);
        Ok(())
    }

    pub fn add_outputs(&mut self, fx_id: u32, outputs: impl IntoIterator<Item = Output>) -> Result<()> {
        for output in outputs {
            self.add_output(fx_id, output)?;
        }
        Ok(())
    }

    /// Outputs registered under `fx_id`.
    pub fn outputs(&self, fx_id: u32) -> &[Output] {
        self.fxs.get(&fx_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fx_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.fxs.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fxs.values().all(Vec::is_empty)
    }

    pub(crate) fn set_codec(&mut self, codec: CodecVersion) {
        for outputs in self.fxs.values_mut() {
            for output in outputs.iter_mut() {
                output.set_codec(codec);
            }
            sort_bare_outputs(outputs);
        }
    }
}

impl Packable for InitialStates {
    fn pack(&self, buf: &mut BytesMut) {
        put_count(buf, self.fxs.len());
        for (fx_id, outputs) in &self.fxs {
            buf.put_u32(*fx_id);
            put_vec(buf, outputs);
        }
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let mut states = Self::new();
        let num_fx = reader.read_u32()?;
        let mut last_fx = None;
        for _ in 0..num_fx {
            let fx_id = reader.read_u32()?;
            if last_fx.is_some_and(|last| last >= fx_id) {
                return Err(AxvmError::NotCanonical("fx ids"));
            }
            last_fx = Some(fx_id);
            let outputs = reader.read_vec(|r| {
                let (tag, codec) = resolve(Category::Output, r.read_u32()?)?;
                Output::unpack_body(tag, codec, r)
            })?;
            ensure_bare_outputs_sorted(&outputs)?;
            states.fxs.entry(fx_id).or_default();
            states.add_outputs(fx_id, outputs)?;
        }
        Ok(states)
    }
}

// ---------------------------------------------------------------------------
// CreateAssetTx
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssetTx {
    pub base: BaseTx,
    name: String,
    symbol: String,
    denomination: u8,
    initial_states: InitialStates,
}

impl CreateAssetTx {
    /// Checks name (128 bytes), symbol (4 bytes) and denomination (32).
    pub fn new(
        base: BaseTx,
        name: impl Into<String>,
        symbol: impl Into<String>,
        denomination: u8,
        initial_states: InitialStates,
    ) -> Result<Self> {
        let name = name.into();
        let symbol = symbol.into();
        check_len("name", name.len(), MAX_NAME_LENGTH)?;
        check_len("symbol", symbol.len(), MAX_SYMBOL_LENGTH)?;
        if denomination > MAX_DENOMINATION {
            return Err(AxvmError::InvalidDenomination(denomination));
        }
        Ok(Self {
            base,
            name,
            symbol,
            denomination,
            initial_states,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn denomination(&self) -> u8 {
        self.denomination
    }

    pub fn initial_states(&self) -> &InitialStates {
        &self.initial_states
    }

    pub(crate) fn set_codec(&mut self, codec: CodecVersion) {
        self.base.set_codec(codec);
        self.initial_states.set_codec(codec);
    }

    /// Fields after the base header.
    pub(crate) fn pack_asset_fields(&self, buf: &mut BytesMut) {
        put_u16_prefixed(buf, self.name.as_bytes());
        put_u16_prefixed(buf, self.symbol.as_bytes());
        buf.put_u8(self.denomination);
        self.initial_states.pack(buf);
    }

    pub(crate) fn unpack_asset_fields(base: BaseTx, reader: &mut Reader<'_>) -> Result<Self> {
        let name = reader.read_string("name")?;
        let symbol = reader.read_string("symbol")?;
        let denomination = reader.read_u8()?;
        let initial_states = InitialStates::unpack(reader)?;
        Self::new(base, name, symbol, denomination, initial_states)
    }
}

impl Packable for CreateAssetTx {
    fn pack(&self, buf: &mut BytesMut) {
        self.base.pack(buf);
        self.pack_asset_fields(buf);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let base = BaseTx::unpack(reader)?;
        Self::unpack_asset_fields(base, reader)
    }
}

/// Errors with [`AxvmError::WrongType`] unless every output is a
/// [`TypeTag::SecpMintOutput`].
pub(crate) fn ensure_mint_outputs(outputs: &[Output]) -> Result<()> {
    match outputs.iter().find(|o| o.tag() != TypeTag::SecpMintOutput) {
        Some(other) => Err(AxvmError::WrongType {
            expected: TypeTag::SecpMintOutput.to_string(),
            got: other.tag(),
        }),
        None => Ok(()),
    }
}
