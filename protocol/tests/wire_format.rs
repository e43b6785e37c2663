//! Byte-level wire format checks.
//!
//! Expected encodings are assembled field by field here, independently of
//! the crate's own writers, so a layout change fails loudly.

use axvm_protocol::codec::{resolve, Category, CodecVersion, Packable, TypeTag};
use axvm_protocol::config::SECP_FX_ID;
use axvm_protocol::credential::Credential;
use axvm_protocol::crypto::Signature;
use axvm_protocol::error::{AxvmError, ErrorKind};
use axvm_protocol::input::{SecpTransferInput, TransferableInput};
use axvm_protocol::output::{Output, OutputOwners, SecpMintOutput, SecpTransferOutput, TransferableOutput};
use axvm_protocol::transaction::{
    BaseTx, CreateAssetTx, ExportTx, GenesisAsset, InitialStates, SignedTx, Transaction, UnsignedTx,
};
use axvm_protocol::types::{Address, AssetId, BlockchainId, TxId, Utxoid};

fn be32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

fn be64(v: u64) -> [u8; 8] {
    v.to_be_bytes()
}

#[test]
fn base_tx_layout() {
    let owner = Address::from_bytes([0x11; 20]);
    let asset = AssetId::from_bytes([0x22; 32]);
    let chain = BlockchainId::from_bytes([0x33; 32]);
    let owners = OutputOwners::new(vec![owner], 9, 1).unwrap();
    let out = TransferableOutput::new(asset, SecpTransferOutput::new(500, owners));
    let mut input = SecpTransferInput::new(600);
    input.add_signature_idx(0, owner);
    let ins = vec![TransferableInput::new(Utxoid::new(TxId::from_bytes([0x44; 32]), 2), asset, input)];
    let tx = UnsignedTx::new(BaseTx::new(12345, chain, vec![out], ins, b"hi".to_vec()).unwrap());

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0, 0]); // codec
    expected.extend_from_slice(&be32(0)); // BaseTx
    expected.extend_from_slice(&be32(12345));
    expected.extend_from_slice(&[0x33; 32]);
    expected.extend_from_slice(&be32(1)); // outs
    expected.extend_from_slice(&[0x22; 32]);
    expected.extend_from_slice(&be32(7)); // SecpTransferOutput
    expected.extend_from_slice(&be64(500));
    expected.extend_from_slice(&be64(9));
    expected.extend_from_slice(&be32(1));
    expected.extend_from_slice(&be32(1));
    expected.extend_from_slice(&[0x11; 20]);
    expected.extend_from_slice(&be32(1)); // ins
    expected.extend_from_slice(&[0x44; 32]);
    expected.extend_from_slice(&be32(2));
    expected.extend_from_slice(&[0x22; 32]);
    expected.extend_from_slice(&be32(5)); // SecpTransferInput
    expected.extend_from_slice(&be64(600));
    expected.extend_from_slice(&be32(1));
    expected.extend_from_slice(&be32(0));
    expected.extend_from_slice(&be32(2)); // memo
    expected.extend_from_slice(b"hi");

    assert_eq!(tx.to_bytes().unwrap(), expected);
    assert_eq!(UnsignedTx::from_bytes(&expected).unwrap(), tx);
}

#[test]
fn signed_tx_appends_credentials() {
    let tx = UnsignedTx::new(BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![]).unwrap());
    let mut credential = Credential::select(TypeTag::SecpCredential, CodecVersion::V0).unwrap();
    credential.add_signature(Signature::from_bytes([0x5a; 64]));
    let signed = SignedTx::new(tx.clone(), vec![credential]);

    let mut expected = tx.to_bytes().unwrap();
    expected.extend_from_slice(&be32(1));
    expected.extend_from_slice(&be32(9));
    expected.extend_from_slice(&be32(1));
    expected.extend_from_slice(&[0x5a; 64]);
    assert_eq!(signed.to_bytes().unwrap(), expected);
}

#[test]
fn type_ids_per_codec() {
    let table = [
        (TypeTag::SecpMintOutput, 6, 65537),
        (TypeTag::SecpTransferOutput, 7, 65538),
        (TypeTag::NftTransferOutput, 11, 65539),
        (TypeTag::NftMintOutput, 10, 65540),
        (TypeTag::SecpTransferInput, 5, 65541),
        (TypeTag::SecpMintOperation, 8, 65542),
        (TypeTag::NftMintOperation, 12, 65543),
        (TypeTag::NftTransferOperation, 13, 65544),
        (TypeTag::SecpCredential, 9, 65545),
        (TypeTag::NftCredential, 14, 65546),
    ];
    for (tag, v0, v1) in table {
        assert_eq!(tag.type_id(CodecVersion::V0), v0, "{tag}");
        assert_eq!(tag.type_id(CodecVersion::V1), v1, "{tag}");
        assert_eq!(resolve(tag.category(), v1).unwrap(), (tag, CodecVersion::V1));
    }
    assert_eq!(TypeTag::ExportTx.type_id(CodecVersion::V1), 4);
}

#[test]
fn unknown_output_type_is_a_codec_error() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0x22; 32]);
    bytes.extend_from_slice(&be32(99));
    let err = TransferableOutput::from_bytes(&bytes).unwrap_err();
    assert_eq!(
        err,
        AxvmError::UnknownTypeId {
            category: Category::Output,
            type_id: 99,
        }
    );
    assert_eq!(err.kind(), ErrorKind::Codec);
    assert!(!err.is_user_facing());
}

#[test]
fn truncated_and_trailing_bytes_are_rejected() {
    let tx = UnsignedTx::new(BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![]).unwrap());
    let bytes = tx.to_bytes().unwrap();
    assert!(matches!(
        UnsignedTx::from_bytes(&bytes[..bytes.len() - 1]),
        Err(AxvmError::UnexpectedEof { .. })
    ));
    let mut extra = bytes.clone();
    extra.push(0);
    assert_eq!(UnsignedTx::from_bytes(&extra).unwrap_err(), AxvmError::TrailingBytes(1));
}

#[test]
fn export_without_destination_fails_cleanly() {
    let base = BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![]).unwrap();
    let tx = UnsignedTx::new(ExportTx::new(base, None, vec![]));
    let err = tx.to_bytes().unwrap_err();
    assert_eq!(err, AxvmError::MissingField("destination chain"));
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn memo_limit_applies() {
    assert!(BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![0; 256]).is_ok());
    assert!(matches!(
        BaseTx::new(1, BlockchainId::default(), vec![], vec![], vec![0; 257]),
        Err(AxvmError::FieldTooLong { field: "memo", .. })
    ));
}

#[test]
fn create_asset_layout_and_limits() {
    let owners = OutputOwners::new(vec![Address::from_bytes([1; 20])], 0, 1).unwrap();
    let mut states = InitialStates::new();
    states.add_output(SECP_FX_ID, SecpMintOutput::new(owners.clone())).unwrap();
    let base = BaseTx::new(5, BlockchainId::default(), vec![], vec![], vec![]).unwrap();

    let tx = CreateAssetTx::new(base.clone(), "Gold", "GLD", 32, states.clone()).unwrap();
    let bytes = UnsignedTx::new(tx).to_bytes().unwrap();
    let parsed = UnsignedTx::from_bytes(&bytes).unwrap();
    let Transaction::CreateAsset(parsed) = parsed.transaction() else {
        panic!("expected create-asset");
    };
    assert_eq!(parsed.denomination(), 32);
    assert_eq!(parsed.initial_states().outputs(SECP_FX_ID), &[Output::from(SecpMintOutput::new(owners))]);

    assert_eq!(
        CreateAssetTx::new(base.clone(), "Gold", "GLD", 33, states.clone()).unwrap_err(),
        AxvmError::InvalidDenomination(33)
    );
    assert!(matches!(
        CreateAssetTx::new(base, "Gold", "GOLDS", 0, states),
        Err(AxvmError::FieldTooLong { field: "symbol", .. })
    ));
}

#[test]
fn genesis_asset_roundtrip() {
    let owners = OutputOwners::new(vec![Address::from_bytes([3; 20])], 0, 1).unwrap();
    let mut states = InitialStates::new();
    states
        .add_output(SECP_FX_ID, SecpTransferOutput::new(360_000_000_000, owners))
        .unwrap();
    let asset = GenesisAsset::new("AXC", "AXC", "AXC", 9, states, vec![]).unwrap();

    let bytes = asset.to_bytes(12345);
    let back = GenesisAsset::from_bytes(&bytes).unwrap();
    assert_eq!(back.alias(), "AXC");
    assert_eq!(back.name(), "AXC");
    assert_eq!(back.symbol(), "AXC");
    assert_eq!(back.denomination(), 9);
    assert_eq!(back.initial_states(), asset.initial_states());
    assert_eq!(back.asset_id(12345), asset.asset_id(12345));
}

#[test]
fn empty_owners_roundtrip() {
    let owners = OutputOwners::new(vec![], 0, 0).unwrap();
    let bytes = owners.to_bytes();
    assert_eq!(bytes, [0u8; 16].to_vec());
    assert_eq!(<OutputOwners as Packable>::from_bytes(&bytes).unwrap(), owners);

    let out = TransferableOutput::new(AssetId::from_bytes([1; 32]), SecpTransferOutput::new(5, owners));
    let bytes = out.to_bytes();
    assert_eq!(TransferableOutput::from_bytes(&bytes).unwrap(), out);
}

#[test]
fn max_denomination_roundtrip() {
    let owners = OutputOwners::new(vec![Address::from_bytes([1; 20])], 0, 1).unwrap();
    let mut states = InitialStates::new();
    states.add_output(SECP_FX_ID, SecpMintOutput::new(owners)).unwrap();
    let base = BaseTx::new(5, BlockchainId::default(), vec![], vec![], vec![]).unwrap();
    let tx = UnsignedTx::new(CreateAssetTx::new(base, "Dust", "DST", 32, states).unwrap());

    let bytes = tx.to_bytes().unwrap();
    let back = UnsignedTx::from_bytes(&bytes).unwrap();
    let Transaction::CreateAsset(parsed) = back.transaction() else {
        panic!("expected create-asset");
    };
    assert_eq!(parsed.denomination(), 32);
    assert_eq!(back.to_bytes().unwrap(), bytes);
}

#[test]
fn owner_addresses_must_be_sorted_and_unique() {
    let owners_bytes = |addrs: &[[u8; 20]]| {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&be64(0));
        bytes.extend_from_slice(&be32(1));
        bytes.extend_from_slice(&be32(addrs.len() as u32));
        for addr in addrs {
            bytes.extend_from_slice(addr);
        }
        bytes
    };

    let sorted = owners_bytes(&[[1; 20], [2; 20]]);
    let owners = <OutputOwners as Packable>::from_bytes(&sorted).unwrap();
    assert_eq!(owners.to_bytes(), sorted);

    for bad in [owners_bytes(&[[2; 20], [1; 20]]), owners_bytes(&[[1; 20], [1; 20]])] {
        let err = <OutputOwners as Packable>::from_bytes(&bad).unwrap_err();
        assert_eq!(err, AxvmError::NotCanonical("owner addresses"));
        assert_eq!(err.kind(), ErrorKind::Codec);
    }
}

#[test]
fn unsorted_outputs_are_rejected() {
    let owners = OutputOwners::new(vec![Address::from_bytes([1; 20])], 0, 1).unwrap();
    let asset = AssetId::from_bytes([2; 32]);
    let outs = vec![
        TransferableOutput::new(asset, SecpTransferOutput::new(1, owners.clone())),
        TransferableOutput::new(asset, SecpTransferOutput::new(2, owners)),
    ];
    let tx = UnsignedTx::new(BaseTx::new(1, BlockchainId::default(), outs, vec![], vec![]).unwrap());
    let bytes = tx.to_bytes().unwrap();

    // codec, tx type, network id, chain id, output count
    let start = 2 + 4 + 4 + 32 + 4;
    let len = 32 + 4 + 8 + 8 + 4 + 4 + 20;
    let mut swapped = bytes.clone();
    swapped[start..start + len].copy_from_slice(&bytes[start + len..start + 2 * len]);
    swapped[start + len..start + 2 * len].copy_from_slice(&bytes[start..start + len]);

    assert_eq!(UnsignedTx::from_bytes(&bytes).unwrap(), tx);
    assert_eq!(
        UnsignedTx::from_bytes(&swapped).unwrap_err(),
        AxvmError::NotCanonical("outputs")
    );
}

#[test]
fn genesis_alias_is_bounded() {
    let err = GenesisAsset::new("a".repeat(70_000), "AXC", "AXC", 9, InitialStates::new(), vec![])
        .unwrap_err();
    assert_eq!(
        err,
        AxvmError::FieldTooLong {
            field: "alias",
            len: 70_000,
            max: u16::MAX as usize,
        }
    );

    let widest = GenesisAsset::new("a".repeat(u16::MAX as usize), "AXC", "AXC", 9, InitialStates::new(), vec![])
        .unwrap();
    let bytes = widest.to_bytes(1);
    assert_eq!(&bytes[..2], &[0xff, 0xff]);
    assert_eq!(GenesisAsset::from_bytes(&bytes).unwrap().alias().len(), u16::MAX as usize);
}

#[test]
fn genesis_requires_zero_chain_id() {
    let asset = GenesisAsset::new("AXC", "AXC", "AXC", 9, InitialStates::new(), vec![]).unwrap();
    let mut bytes = asset.to_bytes(1);
    // alias prefix and text, then the network id
    let chain_start = 2 + 3 + 4;
    bytes[chain_start] = 0xff;
    assert!(matches!(
        GenesisAsset::from_bytes(&bytes),
        Err(AxvmError::Encoding { encoding: "genesis", .. })
    ));
}
