//! Credentials: the signatures authorizing one input or operation.
//!
//! Wire form is `credTypeID:u32, numSigs:u32, sig(64B)*`. The variant is
//! chosen by the credential tag the input or operation declares; the two
//! variants share a body and differ only in their type id.

use bytes::{BufMut, BytesMut};

use crate::codec::wire::put_vec;
use crate::codec::{codec_from_id, resolve, Category, CodecVersion, Packable, Reader, TypeTag};
use crate::crypto::keys::Signature;
use crate::error::{AxvmError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureList {
    codec: CodecVersion,
    signatures: Vec<Signature>,
}

impl SignatureList {
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Secp(SignatureList),
    Nft(SignatureList),
}

impl Credential {
    /// Empty credential for a declared credential tag.
    pub fn select(tag: TypeTag, codec: CodecVersion) -> Result<Self> {
        let list = SignatureList {
            codec,
            signatures: Vec::new(),
        };
        match tag {
            TypeTag::SecpCredential => Ok(Self::Secp(list)),
            TypeTag::NftCredential => Ok(Self::Nft(list)),
            other => Err(AxvmError::WrongType {
                expected: "credential".to_string(),
                got: other,
            }),
        }
    }

    /// Empty credential for a wire credential id.
    pub fn select_by_id(type_id: u32) -> Result<Self> {
        let (tag, codec) = resolve(Category::Credential, type_id)?;
        Self::select(tag, codec)
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Secp(_) => TypeTag::SecpCredential,
            Self::Nft(_) => TypeTag::NftCredential,
        }
    }

    fn list(&self) -> &SignatureList {
        match self {
            Self::Secp(list) | Self::Nft(list) => list,
        }
    }

    fn list_mut(&mut self) -> &mut SignatureList {
        match self {
            Self::Secp(list) | Self::Nft(list) => list,
        }
    }

    pub fn codec(&self) -> CodecVersion {
        self.list().codec
    }

    pub fn type_id(&self) -> u32 {
        self.tag().type_id(self.codec())
    }

    pub fn set_codec_id(&mut self, codec_id: u16) -> Result<()> {
        self.list_mut().codec = codec_from_id(codec_id)?;
        Ok(())
    }

    pub fn signatures(&self) -> &[Signature] {
        self.list().signatures()
    }

    pub fn add_signature(&mut self, signature: Signature) {
        self.list_mut().signatures.push(signature);
    }
}

impl Packable for Credential {
    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32(self.type_id());
        put_vec(buf, self.signatures());
    }

    fn unpack(reader: &mut Reader<'_>) -> Result<Self> {
        let mut credential = Self::select_by_id(reader.read_u32()?)?;
        credential.list_mut().signatures = reader.read_vec(Signature::unpack)?;
        Ok(credential)
    }
}
