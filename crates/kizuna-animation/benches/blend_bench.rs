use criterion::{criterion_group, criterion_main, Criterion};
use kizuna_animation::{AnimationCommand, AnimationConfig, Animator, ContentCatalog};
use kizuna_core::{MotionHandle, ParameterStore, QualityLevel, QualityProfile};
use std::hint::black_box;
use std::sync::Arc;

fn busy_animator(level: QualityLevel) -> Animator {
    let catalog = ContentCatalog::standard();
    let mut animator = Animator::new(
        AnimationConfig::default(),
        Arc::new(ParameterStore::with_standard_parameters()),
        catalog.clone(),
        QualityProfile::for_level(level),
        Some(1),
    );

    // Two overlapping motions and an expression mid-fade.
    for name in ["idle", "tap_body_01"] {
        if let Ok(definition) = catalog.resolve_motion(name) {
            animator.apply(AnimationCommand::PlayMotion {
                handle: MotionHandle::fresh(),
                definition,
                looping: true,
                intensity: 1.0,
            });
        }
    }
    if let Ok(definition) = catalog.resolve_expression("happy") {
        animator.apply(AnimationCommand::PlayExpression {
            definition,
            fade_secs: Some(1.0),
        });
    }
    animator
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("Blend Loop");

    for level in [QualityLevel::High, QualityLevel::UltraLow] {
        let mut animator = busy_animator(level);
        group.bench_function(format!("Animator::tick ({level})"), |b| {
            b.iter(|| black_box(animator.tick(black_box(1.0 / 60.0))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
