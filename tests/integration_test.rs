use anyhow::Result;
use glam::Vec2;
use particle_engine::render::gather_instances;
use particle_engine::{
    EffectManager, EmissionProfile, Emitter, ParticlePool, Simulator, MAX_STEP_SECONDS,
};
use proptest::prelude::*;
use std::sync::Arc;

fn fixed_lifetime_profile(rate: f32, lifetime: f32) -> Arc<EmissionProfile> {
    Arc::new(
        EmissionProfile::default()
            .with_rate(rate)
            .with_lifetime(lifetime, lifetime),
    )
}

#[test]
fn test_steady_state_live_count() -> Result<()> {
    // rate=60, lifetime=1.0：2 秒后存活数稳定在 60 (±1)
    let mut manager = EffectManager::new();
    manager.spawn_continuous(fixed_lifetime_profile(60.0, 1.0), Vec2::ZERO)?;

    for _ in 0..120 {
        manager.update(1.0 / 60.0);
    }

    let live = manager.live_particles();
    assert!(
        (59..=61).contains(&live),
        "steady state live count was {live}, expected 60 (±1)"
    );
    Ok(())
}

#[test]
fn test_burst_drains_and_collects() -> Result<()> {
    // 20 个爆发粒子，寿命 0.5 秒：0.5 秒后全部消亡且特效被回收
    let mut manager = EffectManager::new();
    let handle = manager.spawn_burst(fixed_lifetime_profile(0.0, 0.5), Vec2::ZERO, 20)?;

    assert_eq!(manager.live_particles(), 20);

    for _ in 0..40 {
        manager.update(1.0 / 60.0);
    }

    assert_eq!(manager.live_particles(), 0);
    assert!(!manager.is_alive(handle));
    Ok(())
}

#[test]
fn test_stall_clamped_to_max_step() {
    // 5 秒的模拟卡顿被钳制：单步年龄推进不超过 MAX_STEP_SECONDS
    let mut manager = EffectManager::new();
    manager
        .spawn_burst(fixed_lifetime_profile(0.0, 1.0), Vec2::ZERO, 10)
        .unwrap();

    manager.update(5.0);
    assert_eq!(manager.live_particles(), 10);

    // 被钳制的时间不追帧：需要完整的 1 秒模拟时间才消亡
    let steps = (1.0 / MAX_STEP_SECONDS).ceil() as usize;
    for _ in 0..steps {
        manager.update(MAX_STEP_SECONDS);
    }
    assert_eq!(manager.live_particles(), 0);
}

#[test]
fn test_mixed_blend_effects_coexist() -> Result<()> {
    // 同帧内的 Alpha 与 Additive 特效各自独立追踪；
    // 提交顺序（Alpha 在前）由渲染器单元测试覆盖
    let mut manager = EffectManager::new();
    manager.spawn_continuous(Arc::new(EmissionProfile::smoke()), Vec2::ZERO)?;
    manager.spawn_continuous(Arc::new(EmissionProfile::fire()), Vec2::new(50.0, 0.0))?;

    for _ in 0..30 {
        manager.update(1.0 / 60.0);
    }
    assert_eq!(manager.effect_count(), 2);
    assert!(manager.live_particles() > 0);
    Ok(())
}

#[test]
fn test_full_simulation_pipeline() -> Result<()> {
    // 发射 -> 模拟 -> 打包 的完整一帧
    let profile = fixed_lifetime_profile(100.0, 2.0);
    let mut pool = ParticlePool::new(64)?;
    let mut emitter = Emitter::new(profile, Vec2::new(10.0, 20.0))?;

    for _ in 0..6 {
        emitter.update(1.0 / 60.0, &mut pool);
        Simulator::step(&mut pool, 1.0 / 60.0);
    }

    let instances = gather_instances(&pool);
    assert_eq!(instances.len(), pool.live_count());
    assert!(!instances.is_empty());

    // 渲染字段与模拟状态一致
    let mut checked = 0;
    pool.for_each_live(|_, p| {
        let inst = &instances[checked];
        assert_eq!(inst.position, p.position.to_array());
        assert_eq!(inst.size, p.size);
        checked += 1;
    });
    Ok(())
}

proptest! {
    /// 任意 dt 切分下，发射总数收敛于 rate * T（±1）
    #[test]
    fn prop_emission_converges_for_any_dt_sequence(
        steps in prop::collection::vec(0.001f32..0.05, 1..200),
        rate in 10.0f32..200.0,
    ) {
        let profile = Arc::new(EmissionProfile::default().with_rate(rate));
        let mut pool = ParticlePool::new(4096).unwrap();
        let mut emitter = Emitter::new(profile, Vec2::ZERO).unwrap();

        let mut total_time = 0.0f32;
        for dt in &steps {
            emitter.update(*dt, &mut pool);
            total_time += dt;
        }

        let expected = rate * total_time;
        let spawned = emitter.spawned_total() as f32;
        prop_assert!(
            (spawned - expected).abs() <= 1.01,
            "spawned {} for expected {}", spawned, expected
        );
    }

    /// 池分配永不超过容量，超额请求全部安全丢弃
    #[test]
    fn prop_pool_never_exceeds_capacity(
        capacity in 1usize..256,
        requests in 0usize..512,
    ) {
        let mut pool = ParticlePool::new(capacity).unwrap();
        let mut granted = 0usize;
        for _ in 0..requests {
            if pool.allocate().is_some() {
                granted += 1;
            }
        }
        prop_assert!(granted <= capacity);
        prop_assert_eq!(pool.live_count(), granted.min(capacity));
    }

    /// 存活粒子在任意时刻满足 0 <= age <= lifetime，
    /// 且 size 恰为 t = age/lifetime 处的线性插值
    #[test]
    fn prop_age_bounds_and_derived_visuals(
        dt in 0.001f32..0.1,
        steps in 1usize..100,
    ) {
        let profile = Arc::new(
            EmissionProfile::default()
                .with_rate(200.0)
                .with_lifetime(0.2, 1.5)
                .with_size(10.0, 10.0, 2.0),
        );
        let mut pool = ParticlePool::new(512).unwrap();
        let mut emitter = Emitter::new(profile, Vec2::ZERO).unwrap();

        for _ in 0..steps {
            emitter.update(dt, &mut pool);
            Simulator::step(&mut pool, dt);

            let mut ok = true;
            pool.for_each_live(|_, p| {
                if p.age < 0.0 || p.age > p.lifetime {
                    ok = false;
                }
                let t = p.age / p.lifetime;
                let expected_size = 10.0 + (2.0 - 10.0) * t;
                if (p.size - expected_size).abs() > 1e-3 {
                    ok = false;
                }
            });
            prop_assert!(ok);
        }
    }
}
