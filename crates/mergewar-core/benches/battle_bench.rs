use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mergewar_core::archetype::UnitType;
use mergewar_core::arena::Arena;
use mergewar_core::config::BattleTuning;
use mergewar_core::grid::{GridCell, GRID_COLS};
use mergewar_core::level::{Difficulty, LevelGenerator, ProceduralGenerator};
use mergewar_core::stats::{derive_stats, ArtifactLevels, StatContext};
use mergewar_core::{Battle, Side};

/// A crowded board: a full bottom row of players against a Hell roster.
fn crowded_arena() -> Arena {
    let mut arena = Arena::new();
    let ctx = StatContext::default();
    let types = [UnitType::Tank, UnitType::Archer, UnitType::Mage, UnitType::Infantry];
    for x in 0..GRID_COLS {
        for (row, y) in [7, 6].into_iter().enumerate() {
            let unit_type = types[(x as usize + row) % types.len()];
            arena.spawn_unit(unit_type, 3, Side::Player, GridCell::new(x, y), &ctx);
        }
    }
    let enemies = ProceduralGenerator::new(1)
        .generate(40, Difficulty::Hell)
        .map(|config| config.enemies)
        .unwrap_or_default();
    for spawn in enemies {
        arena.spawn_unit(spawn.unit_type, spawn.level, Side::Enemy, spawn.cell, &StatContext::flat(4));
    }
    arena
}

fn bench_battle_tick(c: &mut Criterion) {
    let template = crowded_arena();

    c.bench_function("battle_tick", |b| {
        b.iter_batched(
            || {
                let mut arena = template.clone();
                let battle = Battle::start(
                    &mut arena,
                    StatContext::default(),
                    StatContext::flat(4),
                    BattleTuning::default(),
                    0.0,
                );
                (arena, battle)
            },
            |(mut arena, mut battle)| {
                for frame in 1..=10 {
                    black_box(battle.tick(&mut arena, f64::from(frame) * 16.0));
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_full_battle(c: &mut Criterion) {
    let template = crowded_arena();

    c.bench_function("full_battle", |b| {
        b.iter(|| {
            let mut arena = template.clone();
            let mut battle = Battle::start(
                &mut arena,
                StatContext::default(),
                StatContext::flat(4),
                BattleTuning::default(),
                0.0,
            );
            let mut t = 0.0;
            // Stalemate detection bounds this loop
            while battle.outcome().is_none() {
                t += 16.0;
                battle.tick(&mut arena, black_box(t));
            }
            battle.ticks()
        })
    });
}

fn bench_derive_stats(c: &mut Criterion) {
    let artifacts = ArtifactLevels::default();
    c.bench_function("derive_stats", |b| {
        b.iter(|| {
            for unit_type in UnitType::ALL {
                black_box(derive_stats(black_box(unit_type), 5, 3, &artifacts));
            }
        })
    });
}

criterion_group!(benches, bench_battle_tick, bench_full_battle, bench_derive_stats);
criterion_main!(benches);
