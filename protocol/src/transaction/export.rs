//! `ExportTx`: a base transaction followed by
//! `destinationChain:32B, numOuts:u32, out*`, the outputs sent to the
//! destination chain's shared memory.
//!
//! The destination chain has to be set before serializing. Without it
//! serialization fails before any byte is written.

use bytes::BytesMut;

use crate::codec::wire::put_vec;
use crate::codec::{CodecVersion, Packable, Reader};
use crate::error::{AxvmError, Result};
use crate::output::{ensure_outputs_sorted, sort_outputs, TransferableOutput};
use crate::transaction::base::BaseTx;
use crate::types::BlockchainId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTx {
    pub base: BaseTx,
    destination_chain: Option<BlockchainId>,
    export_outs: Vec<TransferableOutput>,
}

impl ExportTx {
    pub fn new(
        base: BaseTx,
        destination_chain: Option<BlockchainId>,
        mut export_outs: Vec<TransferableOutput>,
    ) -> Self {
        sort_outputs(&mut export_outs);
        Self {
            base,
            destination_chain,
            export_outs,
        }
    }

    pub fn destination_chain(&self) -> Option<BlockchainId> {
        self.destination_chain
    }

    pub fn set_destination_chain(&mut self, chain: BlockchainId) {
        self.destination_chain = Some(chain);
    }

    pub fn export_outputs(&self) -> &[TransferableOutput] {
        &self.export_outs
    }

    pub(crate) fn set_codec(&mut self, codec: CodecVersion) {
        self.base.set_codec(codec);
        for out in &mut self.export_outs {
            out.output.set_codec(codec);
        }
        sort_outputs(&mut self.export_outs);
    }

    pub fn pack(&self, buf: &mut BytesMut) -> Result<()> {
        let destination = self
            .destination_chain
            .ok_or(AxvmError::MissingField("destination chain"))?;
        self.base.pack(buf);
        destination.pack(buf);
        put_vec(buf, &self.export_outs);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.pack(&mut buf)?;
        Ok(buf.to_vec())
    }

    pub fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let base = BaseTx::unpack(reader)?;
        let destination = BlockchainId::unpack(reader)?;
        let export_outs = reader.read_vec(TransferableOutput::unpack)?;
        ensure_outputs_sorted(&export_outs)?;
        Ok(Self::new(base, Some(destination), export_outs))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let tx = Self::unpack(&mut reader)?;
        reader.finish()?;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseTx {
        BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![]).unwrap()
    }

    #[test]
    fn missing_destination_writes_nothing() {
        let tx = ExportTx::new(base(), None, vec![]);
        let mut buf = BytesMut::new();
        assert_eq!(
            tx.pack(&mut buf).unwrap_err(),
            AxvmError::MissingField("destination chain")
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn roundtrip_with_destination() {
        let mut tx = ExportTx::new(base(), None, vec![]);
        tx.set_destination_chain(BlockchainId::from_bytes([8u8; 32]));
        let bytes = tx.to_bytes().unwrap();
        let back = ExportTx::from_bytes(&bytes).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.destination_chain(), Some(BlockchainId::from_bytes([8u8; 32])));
    }
}
