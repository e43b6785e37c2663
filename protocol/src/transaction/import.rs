//! `ImportTx`: a base transaction followed by
//! `sourceChain:32B, numIns:u32, in*`, the inputs consumed from the
//! source chain's shared memory.

use bytes::BytesMut;

use crate::codec::wire::put_vec;
use crate::codec::{CodecVersion, Packable, Reader};
use crate::error::Result;
use crate::input::{ensure_inputs_sorted, sort_inputs, TransferableInput};
use crate::transaction::base::BaseTx;
use crate::types::BlockchainId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTx {
    pub base: BaseTx,
    pub source_chain: BlockchainId,
    import_ins: Vec<TransferableInput>,
}

impl ImportTx {
    pub fn new(base: BaseTx, source_chain: BlockchainId, mut import_ins: Vec<TransferableInput>) -> Self {
        sort_inputs(&mut import_ins);
        Self {
            base,
            source_chain,
            import_ins,
        }
    }

    pub fn import_inputs(&self) -> &[TransferableInput] {
        &self.import_ins
    }

    pub(crate) fn set_codec(&mut self, codec: CodecVersion) {
        self.base.set_codec(codec);
        for input in &mut self.import_ins {
            input.input.set_codec(codec);
        }
    }
}

impl Packable for ImportTx {
    fn pack(&self, buf: &mut BytesMut) {
        self.base.pack(buf);
        self.source_chain.pack(buf);
        put_vec(buf, &self.import_ins);
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let base = BaseTx::unpack(reader)?;
        let source_chain = BlockchainId::unpack(reader)?;
        let import_ins = reader.read_vec(TransferableInput::unpack)?;
        ensure_inputs_sorted(&import_ins)?;
        Ok(Self::new(base, source_chain, import_ins))
    }
}
