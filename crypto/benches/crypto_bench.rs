use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tcr_types::{Param, VoteOption};

fn blake2b_256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("blake2b_256_256B", |b| {
        b.iter(|| tcr_crypto::blake2b_256(black_box(&data)))
    });
}

fn vote_commitment_bench(c: &mut Criterion) {
    c.bench_function("vote_commitment", |b| {
        b.iter(|| tcr_crypto::vote_commitment(black_box(VoteOption::For), black_box(420)))
    });
}

fn proposal_id_bench(c: &mut Criterion) {
    c.bench_function("proposal_id", |b| {
        b.iter(|| tcr_crypto::proposal_id(black_box(Param::VoteQuorum), black_box(51), black_box(7)))
    });
}

criterion_group!(
    benches,
    blake2b_256_bench,
    vote_commitment_bench,
    proposal_id_bench
);
criterion_main!(benches);
