//! 粒子发射器
//!
//! 发射器唯一的职责是出生：按小数累加器驱动的连续发射，
//! 或绕过累加器的一次性爆发。运动与消亡由 [`Simulator`](crate::Simulator)
//! 负责，发射器从不回头修改已出生的粒子。

use glam::Vec2;
use rand::Rng;
use std::ops::Range;
use std::sync::Arc;

use crate::core::error::ConfigError;
use crate::particle::Particle;
use crate::pool::ParticlePool;
use crate::profile::{EmissionProfile, EmitterShape};

/// 粒子发射器
///
/// 持有一份共享的不可变配置与少量活动状态。
/// 小数累加器跨帧以减法保留余数（从不清零），
/// 保证任意帧率粒度下发射总数收敛于 `rate * T`。
pub struct Emitter {
    /// 发射配置（共享只读）
    profile: Arc<EmissionProfile>,
    /// 发射器世界位置
    pub position: Vec2,
    /// 是否继续连续发射
    active: bool,
    /// 小数出生累加器
    accumulator: f32,
    /// 已运行时间（用于 duration 判断）
    elapsed: f32,
    /// 累计出生数
    spawned_total: u64,
    /// 因池满被丢弃的出生请求数
    dropped: u64,
}

impl Emitter {
    /// 创建发射器
    ///
    /// 配置在此校验；非法配置直接拒绝，不创建发射器。
    pub fn new(profile: Arc<EmissionProfile>, position: Vec2) -> Result<Self, ConfigError> {
        profile.validate()?;
        Ok(Self {
            profile,
            position,
            active: true,
            accumulator: 0.0,
            elapsed: 0.0,
            spawned_total: 0,
            dropped: 0,
        })
    }

    /// 连续发射的每帧更新
    ///
    /// 累加 `rate * dt`；每达到 1.0 尝试分配并出生一个粒子。
    /// 池满时该次出生被静默丢弃（计入统计），累加器照常扣减，
    /// 避免背压解除后的补偿性倾泻。
    pub fn update(&mut self, dt: f32, pool: &mut ParticlePool) {
        if !self.active {
            return;
        }

        self.elapsed += dt;
        if let Some(duration) = self.profile.duration {
            if self.elapsed >= duration {
                self.active = false;
                return;
            }
        }

        self.accumulator += self.profile.rate * dt;
        let mut rng = rand::thread_rng();
        while self.accumulator >= 1.0 {
            self.accumulator -= 1.0;
            if !self.spawn_one(pool, &mut rng) {
                self.dropped += 1;
                log::trace!("Spawn dropped: pool full ({} slots)", pool.capacity());
            }
        }
    }

    /// 一次性爆发
    ///
    /// 绕过累加器立即出生 `count` 个粒子，随后停用连续发射。
    pub fn burst(&mut self, count: u32, pool: &mut ParticlePool) {
        let mut rng = rand::thread_rng();
        for _ in 0..count {
            if !self.spawn_one(pool, &mut rng) {
                self.dropped += 1;
            }
        }
        self.active = false;
    }

    /// 停止发射
    ///
    /// 对出生立即生效；已出生的粒子不受影响，自然走完寿命。
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// 是否仍在连续发射
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 发射配置
    #[inline]
    pub fn profile(&self) -> &EmissionProfile {
        &self.profile
    }

    /// 累计出生数
    #[inline]
    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    /// 因池满被丢弃的出生请求数
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// 出生一个粒子：分配槽位并从配置范围全量采样填充
    ///
    /// 槽位残留上一个粒子的字段，这里必须逐字段覆盖。
    fn spawn_one<R: Rng>(&mut self, pool: &mut ParticlePool, rng: &mut R) -> bool {
        let Some(slot) = pool.allocate() else {
            return false;
        };

        let p = &self.profile;
        let speed = sample(rng, &p.speed);
        let angle = sample(rng, &p.angle);
        let start_size = sample(rng, &p.start_size);

        *pool.get_mut(slot) = Particle {
            position: self.position + sample_shape(rng, p.shape),
            velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
            acceleration: p.gravity,
            age: 0.0,
            lifetime: sample(rng, &p.lifetime),
            size: start_size,
            start_size,
            end_size: sample(rng, &p.end_size),
            color: p.start_color,
            start_color: p.start_color,
            end_color: p.end_color,
            rotation: 0.0,
            rotation_speed: sample(rng, &p.rotation_speed),
            drag: sample(rng, &p.drag),
            drift_frequency: sample(rng, &p.drift_frequency),
            drift_amplitude: sample(rng, &p.drift_amplitude),
            drift_phase: rng.gen_range(0.0..std::f32::consts::TAU),
            alive: true,
        };
        self.spawned_total += 1;
        true
    }
}

/// 范围均匀采样（退化范围直接返回端点）
fn sample<R: Rng>(rng: &mut R, range: &Range<f32>) -> f32 {
    if range.start >= range.end {
        range.start
    } else {
        rng.gen_range(range.clone())
    }
}

/// 形状内均匀采样出生偏移
fn sample_shape<R: Rng>(rng: &mut R, shape: EmitterShape) -> Vec2 {
    match shape {
        EmitterShape::Point => Vec2::ZERO,
        EmitterShape::Disc { radius } => {
            // sqrt 修正保证面积均匀而非半径均匀
            let r = radius * rng.gen::<f32>().sqrt();
            let theta = rng.gen_range(0.0..std::f32::consts::TAU);
            Vec2::new(theta.cos(), theta.sin()) * r
        }
        EmitterShape::Rectangle { half_extents } => Vec2::new(
            rng.gen_range(-half_extents.x..=half_extents.x),
            rng.gen_range(-half_extents.y..=half_extents.y),
        ),
        EmitterShape::Line { half_extent } => half_extent * rng.gen_range(-1.0..=1.0f32),
    }
}
