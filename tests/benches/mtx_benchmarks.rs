//! # Meta-Transaction Benchmarks
//!
//! | Path | Operation |
//! |------|-----------|
//! | typed signing | digest of a `MintVehicleSign` message |
//! | ecdsa | signer recovery from a 65-byte signature |
//! | abi | `NodeMinted` log decode and calldata encode |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use k256::ecdsa::SigningKey;
use mt_01_abi_codec::{registry_interface, AbiValue};
use mt_02_typed_signing::{build_digest, messages, recover_signer, sign_digest, Eip712Domain};
use shared_types::U256;
use std::time::Duration;

fn domain() -> Eip712Domain {
    let mut contract = [0u8; 20];
    contract[0] = 0x5f;
    Eip712Domain::new("DIMO", "1", 31337, contract)
}

fn bench_typed_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed-signing");
    group.measurement_time(Duration::from_secs(5));

    for attrs in [1usize, 8, 32] {
        let names: Vec<String> = (0..attrs).map(|i| format!("attr-{i}")).collect();
        let infos: Vec<String> = (0..attrs).map(|i| format!("value-{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let infos: Vec<&str> = infos.iter().map(String::as_str).collect();
        let message = messages::mint_vehicle_sign(U256::from(7), [0xAB; 20], &names, &infos);

        group.throughput(Throughput::Elements(attrs as u64));
        group.bench_with_input(BenchmarkId::new("mint_vehicle_digest", attrs), &message, |b, m| {
            b.iter(|| build_digest(black_box(&domain()), black_box(m)))
        });
    }
    group.finish();
}

fn bench_signer_recovery(c: &mut Criterion) {
    let key = SigningKey::from_slice(&[7u8; 32]).expect("valid scalar");
    let message = messages::claim_aftermarket_device_sign(U256::from(1), [0x11; 20]);
    let digest = build_digest(&domain(), &message).expect("digest");
    let signature = sign_digest(&key, &digest).expect("sign");

    c.bench_function("ecdsa/recover_signer", |b| {
        b.iter(|| recover_signer(black_box(&digest), black_box(&signature)))
    });
}

fn bench_abi(c: &mut Criterion) {
    let iface = registry_interface().expect("registry");
    let minted = iface.event("NodeMinted").expect("event");
    let log = minted
        .encode_log(&[AbiValue::uint(1), AbiValue::uint(211)])
        .expect("encode");

    let mut group = c.benchmark_group("abi");
    group.bench_function("decode_node_minted", |b| {
        b.iter(|| minted.decode_log(black_box(&log.topics), black_box(&log.data)))
    });

    let args = vec![
        AbiValue::uint(42),
        AbiValue::Address([0x22; 20]),
        AbiValue::Array(vec![AbiValue::Tuple(vec![AbiValue::string("Make"), AbiValue::string("Tesla")]); 8]),
        AbiValue::Bytes(vec![0x33; 65]),
    ];
    group.bench_function("encode_mint_vehicle_call", |b| {
        b.iter(|| iface.encode_call("mintVehicleSign", black_box(&args)))
    });
    group.finish();
}

criterion_group!(benches, bench_typed_digest, bench_signer_recovery, bench_abi);
criterion_main!(benches);
