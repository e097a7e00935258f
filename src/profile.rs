//! 发射配置
//!
//! [`EmissionProfile`] 描述一个发射器如何出生粒子：形状、速度范围、
//! 寿命范围、视觉插值端点与混合模式。构造后不可变，可被多个发射器
//! 通过 `Arc` 共享（只读，无逐实例状态）。
//!
//! 所有数值范围在 [`EmissionProfile::validate`] 中校验，
//! 非法配置在 Emitter 构造期被拒绝，不进入运行期。

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::core::error::ConfigError;

/// 持续发射的池容量安全余量
///
/// 稳态存活数为 `rate * max_lifetime`，余量吸收发射抖动，
/// 超出部分按背压策略丢弃。
pub const POOL_MARGIN: usize = 8;

/// 发射形状
///
/// 出生位置在形状内均匀采样，再叠加发射器的世界位置。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum EmitterShape {
    /// 点发射
    Point,
    /// 圆盘内均匀发射
    Disc { radius: f32 },
    /// 矩形内均匀发射
    Rectangle { half_extents: Vec2 },
    /// 线段上均匀发射（以发射器位置为中点）
    Line { half_extent: Vec2 },
}

impl Default for EmitterShape {
    fn default() -> Self {
        Self::Point
    }
}

/// 混合模式标签
///
/// Additive 在重叠处满足交换律（与提交顺序无关），Alpha 不满足。
/// 渲染器据此分组提交：Alpha 组在前、Additive 组在后，
/// 组内一律不排序（Alpha 组的重叠伪影是已知且接受的限制）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// 标准 Alpha 混合（顺序相关）
    Alpha,
    /// 加法混合（顺序无关，适合发光类效果）
    Additive,
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::Alpha
    }
}

/// 发射配置
///
/// 字段均为出生采样的均匀范围或插值端点。`duration` 为 `Some` 时，
/// 持续发射在该时长后自动停止（粒子仍自然消亡）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionProfile {
    /// 每秒发射数量
    pub rate: f32,
    /// 爆发模式的默认出生数量（`spawn_burst` 未显式给出数量时使用）
    pub burst_count: u32,
    /// 发射形状
    pub shape: EmitterShape,
    /// 初速度大小范围（单位/秒）
    pub speed: Range<f32>,
    /// 初速度方向范围（弧度）
    pub angle: Range<f32>,
    /// 重力加速度
    pub gravity: Vec2,
    /// 阻力系数范围：每秒速度保留比例，(0, 1]
    pub drag: Range<f32>,
    /// 寿命范围（秒）
    pub lifetime: Range<f32>,
    /// 出生大小范围
    pub start_size: Range<f32>,
    /// 消亡大小范围
    pub end_size: Range<f32>,
    /// 出生颜色 (RGBA)
    pub start_color: Vec4,
    /// 消亡颜色 (RGBA)
    pub end_color: Vec4,
    /// 旋转速度范围（弧度/秒）
    pub rotation_speed: Range<f32>,
    /// 漂移频率范围（Hz）
    pub drift_frequency: Range<f32>,
    /// 漂移振幅范围（0..0 = 漂移关闭）
    pub drift_amplitude: Range<f32>,
    /// 混合模式
    pub blend_mode: BlendMode,
    /// 发射持续时间（None = 无限）
    pub duration: Option<f32>,
}

impl Default for EmissionProfile {
    fn default() -> Self {
        Self {
            rate: 50.0,
            burst_count: 0,
            shape: EmitterShape::Point,
            speed: 20.0..60.0,
            angle: 0.0..std::f32::consts::TAU,
            gravity: Vec2::ZERO,
            drag: 1.0..1.0,
            lifetime: 1.0..2.0,
            start_size: 4.0..8.0,
            end_size: 0.0..1.0,
            start_color: Vec4::ONE,
            end_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
            rotation_speed: 0.0..0.0,
            drift_frequency: 0.0..0.0,
            drift_amplitude: 0.0..0.0,
            blend_mode: BlendMode::Alpha,
            duration: None,
        }
    }
}

impl EmissionProfile {
    /// 设置发射速率
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    /// 设置爆发出生数量
    pub fn with_burst_count(mut self, count: u32) -> Self {
        self.burst_count = count;
        self
    }

    /// 设置发射形状
    pub fn with_shape(mut self, shape: EmitterShape) -> Self {
        self.shape = shape;
        self
    }

    /// 设置初速度范围
    pub fn with_speed(mut self, min: f32, max: f32) -> Self {
        self.speed = min..max;
        self
    }

    /// 设置发射方向范围（弧度）
    pub fn with_angle(mut self, min: f32, max: f32) -> Self {
        self.angle = min..max;
        self
    }

    /// 设置重力
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// 设置寿命范围
    pub fn with_lifetime(mut self, min: f32, max: f32) -> Self {
        self.lifetime = min..max;
        self
    }

    /// 设置大小插值端点
    pub fn with_size(mut self, start_min: f32, start_max: f32, end: f32) -> Self {
        self.start_size = start_min..start_max;
        self.end_size = end..end;
        self
    }

    /// 设置颜色插值端点
    pub fn with_colors(mut self, start: Vec4, end: Vec4) -> Self {
        self.start_color = start;
        self.end_color = end;
        self
    }

    /// 设置阻力系数范围
    pub fn with_drag(mut self, min: f32, max: f32) -> Self {
        self.drag = min..max;
        self
    }

    /// 设置漂移扰动
    pub fn with_drift(mut self, frequency: Range<f32>, amplitude: Range<f32>) -> Self {
        self.drift_frequency = frequency;
        self.drift_amplitude = amplitude;
        self
    }

    /// 设置混合模式
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// 设置发射持续时间
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    /// 校验配置
    ///
    /// 任何 `min > max` 的范围、非正寿命、负速率、
    /// (0, 1] 之外的阻力、负的形状尺寸都会被拒绝。
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("speed", &self.speed)?;
        check_range("angle", &self.angle)?;
        check_range("drag", &self.drag)?;
        check_range("lifetime", &self.lifetime)?;
        check_range("start_size", &self.start_size)?;
        check_range("end_size", &self.end_size)?;
        check_range("rotation_speed", &self.rotation_speed)?;
        check_range("drift_frequency", &self.drift_frequency)?;
        check_range("drift_amplitude", &self.drift_amplitude)?;

        if self.lifetime.start <= 0.0 {
            return Err(ConfigError::NonPositiveLifetime(self.lifetime.start));
        }
        if self.rate < 0.0 {
            return Err(ConfigError::NegativeRate(self.rate));
        }
        if self.drag.start <= 0.0 || self.drag.end > 1.0 {
            return Err(ConfigError::InvalidDrag(self.drag.start));
        }
        match self.shape {
            EmitterShape::Disc { radius } if radius < 0.0 => {
                return Err(ConfigError::NegativeExtent(radius));
            }
            EmitterShape::Rectangle { half_extents } if half_extents.min_element() < 0.0 => {
                return Err(ConfigError::NegativeExtent(half_extents.min_element()));
            }
            _ => {}
        }
        Ok(())
    }

    /// 持续发射的建议池容量：稳态存活数上界 + 余量
    pub fn steady_state_capacity(&self) -> usize {
        (self.rate * self.lifetime.end).ceil() as usize + POOL_MARGIN
    }

    // ========================================================================
    // 预设配置
    // ========================================================================

    /// 火焰：向上窜动的加法混合粒子，带横向漂移
    pub fn fire() -> Self {
        Self {
            rate: 80.0,
            shape: EmitterShape::Disc { radius: 4.0 },
            speed: 30.0..55.0,
            angle: -1.75..-1.39, // 向上 ±10°
            gravity: Vec2::new(0.0, -20.0),
            drag: 0.6..0.8,
            lifetime: 0.6..1.2,
            start_size: 8.0..14.0,
            end_size: 1.0..2.0,
            start_color: Vec4::new(1.0, 0.85, 0.3, 1.0),
            end_color: Vec4::new(0.9, 0.15, 0.05, 0.0),
            drift_frequency: 1.5..3.0,
            drift_amplitude: 2.0..5.0,
            blend_mode: BlendMode::Additive,
            ..Default::default()
        }
    }

    /// 烟雾：缓慢上升、逐渐扩散消散的 Alpha 混合粒子
    pub fn smoke() -> Self {
        Self {
            rate: 25.0,
            shape: EmitterShape::Disc { radius: 3.0 },
            speed: 8.0..18.0,
            angle: -1.92..-1.22, // 向上 ±20°
            gravity: Vec2::new(0.0, -5.0),
            drag: 0.5..0.7,
            lifetime: 2.0..3.5,
            start_size: 6.0..10.0,
            end_size: 20.0..28.0,
            start_color: Vec4::new(0.35, 0.35, 0.35, 0.8),
            end_color: Vec4::new(0.5, 0.5, 0.5, 0.0),
            rotation_speed: -0.8..0.8,
            drift_frequency: 0.3..0.8,
            drift_amplitude: 4.0..9.0,
            blend_mode: BlendMode::Alpha,
            ..Default::default()
        }
    }

    /// 火花：受重力的一次性迸发，加法混合
    pub fn sparks() -> Self {
        Self {
            rate: 0.0,
            burst_count: 24,
            shape: EmitterShape::Point,
            speed: 80.0..220.0,
            angle: 0.0..std::f32::consts::TAU,
            gravity: Vec2::new(0.0, 300.0),
            drag: 0.3..0.5,
            lifetime: 0.3..0.7,
            start_size: 2.0..3.0,
            end_size: 0.0..0.5,
            start_color: Vec4::new(1.0, 0.95, 0.6, 1.0),
            end_color: Vec4::new(1.0, 0.4, 0.1, 0.0),
            blend_mode: BlendMode::Additive,
            ..Default::default()
        }
    }
}

fn check_range(field: &'static str, range: &Range<f32>) -> Result<(), ConfigError> {
    if range.start > range.end {
        return Err(ConfigError::InvalidRange {
            field,
            min: range.start,
            max: range.end,
        });
    }
    Ok(())
}
