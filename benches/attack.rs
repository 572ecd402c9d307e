use padding_oracle::{AttackConfig, OracleService, PaddingOracleAttack};

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};

const MESSAGE: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod";

fn bench_attack(c: &mut Criterion, name: &str, parallel: bool) {
    let oracle = OracleService::new(*b"YELLOW SUBMARINE", StdRng::seed_from_u64(101));
    let ciphertext = oracle.encrypt(MESSAGE);
    let config = AttackConfig {
        parallel,
        ..AttackConfig::default()
    };
    let attack = PaddingOracleAttack::new(&oracle, config);
    c.bench_function(name, |b| b.iter(|| attack.attack(&ciphertext).unwrap()));
}

pub fn sequential_attack(c: &mut Criterion) {
    bench_attack(c, "attack_sequential", false);
}

pub fn parallel_attack(c: &mut Criterion) {
    bench_attack(c, "attack_parallel", true);
}

criterion_group!(benches, sequential_attack, parallel_attack);
criterion_main!(benches);
