//! Criterion benchmarks for the spend pipeline hot paths.
//!
//! Covers: selection over large candidate sets, fee and dust arithmetic,
//! and the full build pipeline against an in-memory coin view.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use beck_core::traits::{ChangeSource, FeeEstimator};
use beck_core::types::{
    Hash256, OutPoint, ScriptDescriptor, ScriptKind, SpendTarget, UnspentOutput,
};
use beck_core::view::MemoryCoinView;
use beck_spend::assemble::{build_transaction, SpendRequest};
use beck_spend::fee::{FeeMode, FeePolicy, FeePolicyConfig, FeeRateSpec};
use beck_spend::select::{CoinSelector, Eligibility, SelectionTarget};

struct FlatEstimator;

impl FeeEstimator for FlatEstimator {
    fn fee_rate(&self, _target_blocks: u64) -> u64 {
        1000
    }
}

struct BenchChangeSource;

impl ChangeSource for BenchChangeSource {
    fn fresh_change_script(&self) -> ScriptDescriptor {
        make_script(0xCC)
    }
}

fn make_script(seed: u8) -> ScriptDescriptor {
    ScriptDescriptor {
        kind: ScriptKind::PubkeyHash,
        payload: Hash256([seed; 32]),
    }
}

/// `n` coins with a deterministic spread of values.
fn make_coins(n: usize) -> Vec<UnspentOutput> {
    (0..n)
        .map(|i| {
            let mut txid = [0u8; 32];
            txid[..8].copy_from_slice(&(i as u64).to_le_bytes());
            UnspentOutput {
                outpoint: OutPoint {
                    txid: Hash256(txid),
                    index: 0,
                },
                value: 5_000 + (i as u64 * 37) % 95_000,
                script: make_script(i as u8),
                confirmations: 6,
                from_coinbase: false,
                is_change: false,
                manually_locked: false,
                watch_only: false,
            }
        })
        .collect()
}

fn explicit_policy(rate: u64) -> FeePolicy {
    let config = FeePolicyConfig {
        rate: FeeRateSpec::Explicit {
            rate,
            mode: FeeMode::PerKilobyte,
        },
        ..FeePolicyConfig::default()
    };
    FeePolicy::resolve(&config, &FlatEstimator)
}

fn bench_selection(c: &mut Criterion) {
    let coins_1k = make_coins(1000);
    let coins_10k = make_coins(10_000);
    let policy = explicit_policy(1000);
    let target = SelectionTarget {
        value: 2_000_000,
        output_kinds: vec![ScriptKind::PubkeyHash],
        fee_from_recipients: false,
    };

    c.bench_function("select_1k_candidates", |b| {
        b.iter(|| {
            CoinSelector::select(
                black_box(&coins_1k),
                Eligibility::default(),
                &target,
                &policy,
            )
        })
    });

    c.bench_function("select_10k_candidates", |b| {
        b.iter(|| {
            CoinSelector::select(
                black_box(&coins_10k),
                Eligibility::default(),
                &target,
                &policy,
            )
        })
    });
}

fn bench_fee_math(c: &mut Criterion) {
    let policy = explicit_policy(12_345);

    c.bench_function("required_fee", |b| {
        b.iter(|| policy.required_fee(black_box(522)))
    });

    c.bench_function("dust_threshold", |b| {
        b.iter(|| policy.dust_threshold(black_box(ScriptKind::PubkeyHash)))
    });
}

fn bench_full_build(c: &mut Criterion) {
    let mut request = SpendRequest::new(vec![SpendTarget {
        script: make_script(0xAA),
        value: 2_000_000,
        subtract_fee: false,
    }]);
    request.fee = FeePolicyConfig {
        rate: FeeRateSpec::Explicit {
            rate: 1000,
            mode: FeeMode::PerKilobyte,
        },
        ..FeePolicyConfig::default()
    };

    // A build reserves its inputs, so every iteration needs a fresh view.
    c.bench_function("build_transaction_1k_coins", |b| {
        b.iter_batched(
            || MemoryCoinView::with_coins(make_coins(1000)),
            |view| {
                build_transaction(
                    black_box(&request),
                    &view,
                    &FlatEstimator,
                    &BenchChangeSource,
                )
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_selection, bench_fee_math, bench_full_build);
criterion_main!(benches);
