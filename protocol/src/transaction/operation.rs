//! `OperationTx`: a base transaction followed by `numOps:u32, op*`.

use bytes::BytesMut;

use crate::codec::wire::put_vec;
use crate::codec::{CodecVersion, Packable, Reader};
use crate::error::Result;
use crate::operation::{ensure_operations_sorted, sort_operations, TransferableOperation};
use crate::transaction::base::BaseTx;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTx {
    pub base: BaseTx,
    ops: Vec<TransferableOperation>,
}

impl OperationTx {
    pub fn new(base: BaseTx, mut ops: Vec<TransferableOperation>) -> Self {
        sort_operations(&mut ops);
        Self { base, ops }
    }

    pub fn operations(&self) -> &[TransferableOperation] {
        &self.ops
    }

    pub(crate) fn set_codec(&mut self, codec: CodecVersion) {
        self.base.set_codec(codec);
        for op in &mut self.ops {
            op.operation.set_codec(codec);
        }
        sort_operations(&mut self.ops);
    }
}

impl Packable for OperationTx {
    fn pack(&self, buf: &mut BytesMut) {
        self.base.pack(buf);
        put_vec(buf, &self.ops);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let base = BaseTx::unpack(reader)?;
        let ops = reader.read_vec(TransferableOperation::unpack)?;
        ensure_operations_sorted(&ops)?;
        Ok(Self::new(base, ops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{NftTransferOperation, SecpMintOperation};
    use crate::output::{NftTransferOutput, OutputOwners, SecpMintOutput, SecpTransferOutput};
    use crate::types::{Address, AssetId, BlockchainId, TxId, Utxoid};

    fn owners() -> OutputOwners {
        OutputOwners::new(vec![Address::from_bytes([1u8; 20])], 0, 1).unwrap()
    }

    fn ops() -> (TransferableOperation, TransferableOperation) {
        let nft = TransferableOperation::new(
            AssetId::from_bytes([1u8; 32]),
            vec![Utxoid::new(TxId::from_bytes([1u8; 32]), 0)],
            NftTransferOperation::new(NftTransferOutput::new(0, vec![1], owners()).unwrap()),
        );
        let mint = TransferableOperation::new(
            AssetId::from_bytes([2u8; 32]),
            vec![Utxoid::new(TxId::from_bytes([2u8; 32]), 0)],
            SecpMintOperation::new(SecpMintOutput::new(owners()), SecpTransferOutput::new(5, owners())),
        );
        (nft, mint)
    }

    #[test]
    fn operations_sorted_by_type_id() {
        let (nft, mint) = ops();
        let base = BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![]).unwrap();
        let a = OperationTx::new(base.clone(), vec![nft.clone(), mint.clone()]);
        let b = OperationTx::new(base, vec![mint, nft]);
        assert_eq!(a.to_bytes(), b.to_bytes());
        // SECP mint (8) before NFT transfer (13).
        assert_eq!(a.operations()[0].operation.type_id(), 8);
        assert_eq!(OperationTx::from_bytes(&a.to_bytes()).unwrap(), a);
    }
}
