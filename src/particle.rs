//! 粒子记录
//!
//! 单个粒子的全部模拟状态。纯值类型，除池槽位索引外没有任何标识。

use glam::{Vec2, Vec4};

/// 粒子记录
///
/// 存活期间满足 `0 <= age <= lifetime`；`size` 和 `color` 是
/// `age / lifetime` 的派生量，由 [`Simulator`](crate::Simulator)
/// 每步重算，出生后不可独立赋值。
///
/// `alive == false` 的记录不会被模拟或渲染，其槽位随时可被复用；
/// 槽位复用时字段不清零，由下一次出生采样全量覆盖。
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// 世界坐标位置
    pub position: Vec2,
    /// 速度（单位/秒）
    pub velocity: Vec2,
    /// 加速度（通常为配置的重力）
    pub acceleration: Vec2,
    /// 已存活时间（秒）
    pub age: f32,
    /// 总寿命（秒），出生时固定
    pub lifetime: f32,
    /// 当前大小
    pub size: f32,
    /// 出生大小
    pub start_size: f32,
    /// 消亡大小
    pub end_size: f32,
    /// 当前颜色 (RGBA)
    pub color: Vec4,
    /// 出生颜色
    pub start_color: Vec4,
    /// 消亡颜色
    pub end_color: Vec4,
    /// 当前旋转（弧度）
    pub rotation: f32,
    /// 旋转速度（弧度/秒）
    pub rotation_speed: f32,
    /// 阻力系数：每秒速度保留比例，(0, 1]
    pub drag: f32,
    /// 漂移频率（Hz）
    pub drift_frequency: f32,
    /// 漂移振幅（0 = 漂移关闭）
    pub drift_amplitude: f32,
    /// 漂移相位（弧度）
    pub drift_phase: f32,
    /// 存活标记
    pub alive: bool,
}

impl Particle {
    /// 生命周期进度 `age / lifetime`，范围 [0, 1]
    #[inline]
    pub fn life_t(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// 是否配置了漂移扰动
    #[inline]
    pub fn has_drift(&self) -> bool {
        self.drift_amplitude != 0.0
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            age: 0.0,
            lifetime: 0.0,
            size: 1.0,
            start_size: 1.0,
            end_size: 1.0,
            color: Vec4::ONE,
            start_color: Vec4::ONE,
            end_color: Vec4::ONE,
            rotation: 0.0,
            rotation_speed: 0.0,
            drag: 1.0,
            drift_frequency: 0.0,
            drift_amplitude: 0.0,
            drift_phase: 0.0,
            alive: false,
        }
    }
}
