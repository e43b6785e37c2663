//! The common transaction header.
//!
//! `networkID:u32, blockchainID:32B, numOuts:u32, out*, numIns:u32, in*,
//! memo:u32-prefixed`.
//!
//! Outputs and inputs are stored in canonical order from the moment the
//! transaction is constructed, so the order credentials are produced in
//! is always the order inputs are serialized in.

use bytes::{BufMut, BytesMut};

use crate::codec::wire::{check_len, put_u32_prefixed, put_vec};
use crate::codec::{CodecVersion, Packable, Reader};
use crate::config::MAX_MEMO_LENGTH;
use crate::error::Result;
use crate::input::{ensure_inputs_sorted, sort_inputs, TransferableInput};
use crate::output::{ensure_outputs_sorted, sort_outputs, TransferableOutput};
use crate::types::BlockchainId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: BlockchainId,
    outs: Vec<TransferableOutput>,
    ins: Vec<TransferableInput>,
    memo: Vec<u8>,
}

impl BaseTx {
    /// Sorts `outs` and `ins`; fails if the memo exceeds 256 bytes.
    pub fn new(
        network_id: u32,
        blockchain_id: BlockchainId,
        mut outs: Vec<TransferableOutput>,
        mut ins: Vec<TransferableInput>,
        memo: Vec<u8>,
    ) -> Result<Self> {
        check_len("memo", memo.len(), MAX_MEMO_LENGTH)?;
        sort_outputs(&mut outs);
        sort_inputs(&mut ins);
        Ok(Self {
            network_id,
            blockchain_id,
            outs,
            ins,
            memo,
        })
    }

    pub fn outs(&self) -> &[TransferableOutput] {
        &self.outs
    }

    pub fn ins(&self) -> &[TransferableInput] {
        &self.ins
    }

    pub fn memo(&self) -> &[u8] {
        &self.memo
    }

    pub(crate) fn set_codec(&mut self, codec: CodecVersion) {
        for out in &mut self.outs {
            out.output.set_codec(codec);
        }
        for input in &mut self.ins {
            input.input.set_codec(codec);
        }
        // Type ids take part in the canonical order.
        sort_outputs(&mut self.outs);
    }
}

impl Packable for BaseTx {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.network_id);
        self.blockchain_id.pack(buf);
        put_vec(buf, &self.outs);
        put_vec(buf, &self.ins);
        put_u32_prefixed(buf, &self.memo);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let network_id = reader.read_u32()?;
        let blockchain_id = BlockchainId::unpack(reader)?;
        let outs = reader.read_vec(TransferableOutput::unpack)?;
        ensure_outputs_sorted(&outs)?;
        let ins = reader.read_vec(TransferableInput::unpack)?;
        ensure_inputs_sorted(&ins)?;
        let memo = reader.read_u32_prefixed()?;
        Self::new(network_id, blockchain_id, outs, ins, memo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AxvmError;
    use crate::input::SecpTransferInput;
    use crate::output::{OutputOwners, SecpTransferOutput};
    use crate::types::{Address, AssetId, TxId, Utxoid};

    fn out(amount: u64) -> TransferableOutput {
        let owners = OutputOwners::new(vec![Address::from_bytes([1u8; 20])], 0, 1).unwrap();
        TransferableOutput::new(AssetId::from_bytes([2u8; 32]), SecpTransferOutput::new(amount, owners))
    }

    fn input(tx: u8) -> TransferableInput {
        TransferableInput::new(
            Utxoid::new(TxId::from_bytes([tx; 32]), 0),
            AssetId::from_bytes([2u8; 32]),
            SecpTransferInput::new(10),
        )
    }

    #[test]
    fn layout_and_roundtrip() {
        let tx = BaseTx::new(5, BlockchainId::from_bytes([3u8; 32]), vec![out(1)], vec![input(1)], b"hi".to_vec())
            .unwrap();
        let bytes = tx.to_bytes();
        assert_eq!(&bytes[..4], &5u32.to_be_bytes());
        assert_eq!(&bytes[4..36], &[3u8; 32]);
        assert_eq!(&bytes[36..40], &1u32.to_be_bytes());
        assert_eq!(&bytes[bytes.len() - 6..], &[0, 0, 0, 2, b'h', b'i']);
        assert_eq!(BaseTx::from_bytes(&bytes).unwrap(), tx);
    }

    #[test]
    fn construction_order_does_not_change_bytes() {
        let a = BaseTx::new(1, BlockchainId::default(), vec![out(9), out(1)], vec![input(2), input(1)], vec![])
            .unwrap();
        let b = BaseTx::new(1, BlockchainId::default(), vec![out(1), out(9)], vec![input(1), input(2)], vec![])
            .unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn memo_limit_is_enforced() {
        assert!(BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![0u8; 256]).is_ok());
        let err = BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![0u8; 257]).unwrap_err();
        assert_eq!(
            err,
            AxvmError::FieldTooLong {
                field: "memo",
                len: 257,
                max: 256
            }
        );
    }
}
