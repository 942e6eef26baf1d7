// Signing & verification benchmarks for the wallet core.
//
// Covers keypair generation, address encoding, building and signing a
// transfer, and full verification of a signed payload.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use symbol_wallet::config::NetworkType;
use symbol_wallet::identity::{Address, Keypair};
use symbol_wallet::network::context::NetworkContext;
use symbol_wallet::transaction::builder::TransferTransactionBuilder;
use symbol_wallet::transaction::signing::sign;
use symbol_wallet::transaction::types::{GenerationHash, MosaicId};
use symbol_wallet::transaction::verification::verify_signed;

fn context() -> NetworkContext {
    NetworkContext {
        network: NetworkType::Testnet,
        epoch_adjustment: 1_667_250_467,
        generation_hash: GenerationHash([0x49; 32]),
        currency_id: MosaicId(0x72C0_212E_67A0_8BCE),
        fee_multiplier: 100,
    }
}

fn bench_keypair_generation(c: &mut Criterion) {
    c.bench_function("ed25519/keypair_generate", |b| {
        b.iter(|| Keypair::generate(NetworkType::Testnet));
    });
}

fn bench_address_parse(c: &mut Criterion) {
    let encoded = Keypair::generate(NetworkType::Testnet).address().pretty();

    c.bench_function("address/parse_pretty", |b| {
        b.iter(|| Address::parse(&encoded).unwrap());
    });
}

fn bench_build_and_sign(c: &mut Criterion) {
    let ctx = context();
    let keypair = Keypair::generate(NetworkType::Testnet);
    let recipient = Keypair::generate(NetworkType::Testnet).address().encoded();
    let mut group = c.benchmark_group("transfer/build_and_sign");

    for message_len in [0usize, 32, 256, 1000] {
        let message = "m".repeat(message_len);
        group.throughput(Throughput::Bytes(message_len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(message_len), &message, |b, message| {
            b.iter(|| {
                let tx = TransferTransactionBuilder::new(&ctx)
                    .now_millis(1_700_000_000_000)
                    .build(&recipient, 10_000_000, message)
                    .unwrap();
                sign(&tx, &keypair, &ctx.generation_hash).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let ctx = context();
    let keypair = Keypair::generate(NetworkType::Testnet);
    let recipient = Keypair::generate(NetworkType::Testnet).address().encoded();
    let tx = TransferTransactionBuilder::new(&ctx)
        .now_millis(1_700_000_000_000)
        .build(&recipient, 10_000_000, "hello")
        .unwrap();
    let signed = sign(&tx, &keypair, &ctx.generation_hash).unwrap();

    c.bench_function("transfer/verify_signed", |b| {
        b.iter(|| verify_signed(&signed, &ctx.generation_hash).unwrap());
    });
}

criterion_group!(
    benches,
    bench_keypair_generation,
    bench_address_parse,
    bench_build_and_sign,
    bench_verify,
);
criterion_main!(benches);
