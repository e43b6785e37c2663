// Coin selection benchmarks for the AXVM client core.
//
// Covers building base transactions from wallets of increasing size, the
// worst case where every UTXO has to be consumed, and signing the result.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use axvm_protocol::config::TxParams;
use axvm_protocol::crypto::{Ed25519KeyPair, KeyChain};
use axvm_protocol::output::{OutputOwners, SecpTransferOutput};
use axvm_protocol::types::{Address, AssetId, BlockchainId, TxId, Utxoid};
use axvm_protocol::utxo::{Utxo, UtxoSet};

fn asset() -> AssetId {
    AssetId::from_bytes([0xa1; 32])
}

fn wallet(owner: Address, size: usize) -> UtxoSet {
    let mut set = UtxoSet::new();
    for i in 0..size {
        let mut tx = [0u8; 32];
        tx[..8].copy_from_slice(&(i as u64).to_be_bytes());
        let owners = OutputOwners::new(vec![owner], 0, 1).expect("single owner");
        set.add(
            Utxo::new(Utxoid::new(TxId::from_bytes(tx), 0), asset(), SecpTransferOutput::new(10, owners)),
            false,
        );
    }
    set
}

fn bench_build_base_tx(c: &mut Criterion) {
    let owner = Address::from_bytes([1; 20]);
    let to = Address::from_bytes([2; 20]);
    let params = TxParams::new(1, BlockchainId::default()).as_of(0).fee(1);

    let mut group = c.benchmark_group("utxo/build_base_tx");
    for size in [10usize, 100, 1_000] {
        let set = wallet(owner, size);
        // Half the wallet: forces a long scan.
        let amount = (size as u64 * 10) / 2;
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &set, |b, set| {
            b.iter(|| set.build_base_tx(&params, amount, asset(), &[to], &[owner], &[]));
        });
    }
    group.finish();
}

fn bench_insufficient_funds(c: &mut Criterion) {
    let owner = Address::from_bytes([1; 20]);
    let to = Address::from_bytes([2; 20]);
    let params = TxParams::new(1, BlockchainId::default()).as_of(0);
    let set = wallet(owner, 1_000);

    c.bench_function("utxo/insufficient_funds_1000", |b| {
        b.iter(|| set.build_base_tx(&params, 1_000_000, asset(), &[to], &[owner], &[]));
    });
}

fn bench_sign_built_tx(c: &mut Criterion) {
    let mut keychain = KeyChain::new();
    let owner = keychain.add_key(Ed25519KeyPair::from_seed(&[9; 32]));
    let to = Address::from_bytes([2; 20]);
    let params = TxParams::new(1, BlockchainId::default()).as_of(0);
    let set = wallet(owner, 64);
    let unsigned = set
        .build_base_tx(&params, 640, asset(), &[to], &[owner], &[])
        .expect("wallet covers amount");

    c.bench_function("utxo/sign_64_inputs", |b| {
        b.iter(|| unsigned.clone().sign(&keychain));
    });
}

criterion_group!(
    benches,
    bench_build_base_tx,
    bench_insufficient_funds,
    bench_sign_built_tx,
);
criterion_main!(benches);
