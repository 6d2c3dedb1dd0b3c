//! 认证性能基准测试

use chrono::Duration;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::Map;
use shelf_auth_core::TokenService;
use shelf_identity::domain::services::{ActivationLedger, Argon2PasswordHasher, PasswordHasher};

const SECRET: &[u8] = b"benchmark-signing-key-0123456789abcdef";

fn password_hashing_benchmark(c: &mut Criterion) {
    let hasher = Argon2PasswordHasher::new();

    c.bench_function("password_hash", |b| {
        b.iter(|| hasher.hash(black_box("Test1234!")))
    });
}

fn password_verification_benchmark(c: &mut Criterion) {
    let hasher = Argon2PasswordHasher::new();
    let hashed = hasher.hash("Test1234!").unwrap();

    c.bench_function("password_verify", |b| {
        b.iter(|| hasher.verify(black_box("Test1234!"), black_box(&hashed)))
    });
}

fn token_issue_benchmark(c: &mut Criterion) {
    let service = TokenService::new(SECRET, 3600);
    let authorities = vec!["USER".to_string()];

    c.bench_function("token_issue", |b| {
        b.iter(|| service.issue(Map::new(), black_box("a@x.com"), black_box(&authorities)))
    });
}

fn token_verify_benchmark(c: &mut Criterion) {
    let service = TokenService::new(SECRET, 3600);
    let token = service
        .issue(Map::new(), "a@x.com", &["USER".to_string()])
        .unwrap();

    c.bench_function("token_verify", |b| {
        b.iter(|| service.verify(black_box(&token)))
    });
}

fn activation_code_generation_benchmark(c: &mut Criterion) {
    let ledger = ActivationLedger::new(6, Duration::minutes(5));

    c.bench_function("activation_code_generate", |b| {
        b.iter(|| ledger.generate_code())
    });
}

criterion_group!(
    benches,
    password_hashing_benchmark,
    password_verification_benchmark,
    token_issue_benchmark,
    token_verify_benchmark,
    activation_code_generation_benchmark
);

criterion_main!(benches);
