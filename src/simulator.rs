//! 粒子模拟器
//!
//! 每帧把池内所有存活粒子推进一个时间步。模拟器是 `age` 与存活标记的
//! 唯一修改者，寿命不变量（`0 <= age <= lifetime`，过期当步回收）
//! 由构造保证，不是用户可见的错误条件。
//!
//! 逐粒子工作完全独立（不读取其他粒子的状态），
//! 如需并行只有这段循环可以安全分片；池的分配/回收必须保持单线程。

use crate::pool::ParticlePool;

/// 粒子模拟器
///
/// 无状态：所有逐粒子参数都存储在粒子记录里。
pub struct Simulator;

impl Simulator {
    /// 推进池内每个存活粒子一个时间步
    ///
    /// 每个粒子依次执行：
    /// 1. 加速度积分进速度
    /// 2. 阻力衰减 `velocity *= drag^dt`（帧率无关的每秒保留比例）
    /// 3. 速度积分进位置
    /// 4. 漂移扰动（按正弦路径的差分施加，步长无关）
    /// 5. 推进年龄
    /// 6. `age >= lifetime` 则当步回收槽位，不再做后续工作
    /// 7. 否则按 `t = age/lifetime` 线性插值大小与颜色，推进旋转
    pub fn step(pool: &mut ParticlePool, dt: f32) {
        for slot in 0..pool.capacity() {
            if !pool.is_live(slot) {
                continue;
            }

            let p = pool.get_mut(slot);

            p.velocity += p.acceleration * dt;
            p.velocity *= p.drag.powf(dt);
            p.position += p.velocity * dt;

            if p.has_drift() {
                // 位置跟随 sin 路径的精确增量，避免扰动幅度随帧率变化
                let omega = std::f32::consts::TAU * p.drift_frequency;
                let next = (omega * (p.age + dt) + p.drift_phase).sin();
                let prev = (omega * p.age + p.drift_phase).sin();
                p.position.x += p.drift_amplitude * (next - prev);
            }

            p.age += dt;

            if p.age >= p.lifetime {
                pool.release(slot);
                continue;
            }

            let t = p.life_t();
            p.size = p.start_size + (p.end_size - p.start_size) * t;
            p.color = p.start_color.lerp(p.end_color, t);
            p.rotation += p.rotation_speed * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Particle;
    use glam::{Vec2, Vec4};

    fn spawn(pool: &mut ParticlePool, p: Particle) -> usize {
        let slot = pool.allocate().unwrap();
        *pool.get_mut(slot) = Particle { alive: true, ..p };
        slot
    }

    #[test]
    fn test_integration_order() {
        let mut pool = ParticlePool::new(1).unwrap();
        let slot = spawn(
            &mut pool,
            Particle {
                velocity: Vec2::new(10.0, 0.0),
                acceleration: Vec2::new(0.0, 100.0),
                lifetime: 10.0,
                ..Default::default()
            },
        );

        Simulator::step(&mut pool, 0.5);
        let p = pool.get(slot);
        // 先积分加速度，再积分位置（半隐式欧拉）
        assert!((p.velocity.y - 50.0).abs() < 1e-4);
        assert!((p.position.y - 25.0).abs() < 1e-4);
        assert!((p.position.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_drag_is_frame_rate_independent() {
        // 同样的 1 秒，1 步和 60 步的衰减结果一致
        let proto = Particle {
            velocity: Vec2::new(100.0, 0.0),
            drag: 0.5,
            lifetime: 10.0,
            ..Default::default()
        };

        let mut coarse = ParticlePool::new(1).unwrap();
        let a = spawn(&mut coarse, proto);
        Simulator::step(&mut coarse, 1.0);

        let mut fine = ParticlePool::new(1).unwrap();
        let b = spawn(&mut fine, proto);
        for _ in 0..60 {
            Simulator::step(&mut fine, 1.0 / 60.0);
        }

        let va = coarse.get(a).velocity.x;
        let vb = fine.get(b).velocity.x;
        assert!((va - 50.0).abs() < 0.1, "coarse velocity {va}");
        assert!((va - vb).abs() < 0.5, "coarse {va} vs fine {vb}");
    }

    #[test]
    fn test_age_bounds_and_interpolation() {
        let mut pool = ParticlePool::new(1).unwrap();
        let slot = spawn(
            &mut pool,
            Particle {
                lifetime: 1.0,
                start_size: 10.0,
                end_size: 0.0,
                start_color: Vec4::ONE,
                end_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
                ..Default::default()
            },
        );

        Simulator::step(&mut pool, 0.25);
        let p = pool.get(slot);
        assert!(p.age >= 0.0 && p.age <= p.lifetime);
        // size/color 是 t = age/lifetime 处的精确线性插值
        assert!((p.size - 7.5).abs() < 1e-4);
        assert!((p.color.w - 0.75).abs() < 1e-4);
    }

    #[test]
    fn test_expired_released_same_step() {
        let mut pool = ParticlePool::new(1).unwrap();
        let slot = spawn(
            &mut pool,
            Particle {
                lifetime: 0.1,
                ..Default::default()
            },
        );

        Simulator::step(&mut pool, 0.2);
        assert!(!pool.is_live(slot));

        // 下一次遍历不再出现
        let mut count = 0;
        pool.for_each_live(|_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_exact_lifetime_boundary_dies() {
        let mut pool = ParticlePool::new(1).unwrap();
        spawn(
            &mut pool,
            Particle {
                lifetime: 0.5,
                ..Default::default()
            },
        );

        // age == lifetime 也在同一步死亡（>=，不是 >）
        Simulator::step(&mut pool, 0.5);
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn test_drift_displacement_follows_sine_path() {
        // 漂移以差分施加：任意步长切分后的净位移都等于 sin 路径的精确值
        let proto = Particle {
            lifetime: 10.0,
            drift_frequency: 1.0,
            drift_amplitude: 5.0,
            drift_phase: 0.0,
            ..Default::default()
        };

        let mut coarse = ParticlePool::new(1).unwrap();
        let a = spawn(&mut coarse, proto);
        Simulator::step(&mut coarse, 0.25);

        let mut fine = ParticlePool::new(1).unwrap();
        let b = spawn(&mut fine, proto);
        for _ in 0..25 {
            Simulator::step(&mut fine, 0.01);
        }

        let expected = 5.0 * (std::f32::consts::TAU * 0.25f32).sin();
        assert!((coarse.get(a).position.x - expected).abs() < 1e-3);
        assert!((fine.get(b).position.x - expected).abs() < 1e-2);
    }

    #[test]
    fn test_rotation_advances() {
        let mut pool = ParticlePool::new(1).unwrap();
        let slot = spawn(
            &mut pool,
            Particle {
                lifetime: 10.0,
                rotation_speed: 2.0,
                ..Default::default()
            },
        );

        Simulator::step(&mut pool, 0.5);
        assert!((pool.get(slot).rotation - 1.0).abs() < 1e-5);
    }
}
