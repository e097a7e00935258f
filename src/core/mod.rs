//! 核心模块
//!
//! 提供引擎范围内的错误类型与全局常量。

pub mod error;

pub use error::{ConfigError, ParticleError};

/// 单步模拟允许的最大时间增量（秒）
///
/// 宿主循环卡顿（加载、断点、窗口拖动）会产生异常大的 `dt`，
/// 直接积分会导致粒子瞬移和发射器一次性倾泻大量粒子。
/// 超过该值的 `dt` 在 [`EffectManager::update`](crate::EffectManager::update)
/// 入口处被钳制，多余的时间被丢弃（单次钳制，不做追帧补偿）。
pub const MAX_STEP_SECONDS: f32 = 0.1;
