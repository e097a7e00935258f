//! 统一错误处理模块
//!
//! 提供引擎范围内的统一错误类型定义
//!
//! ## 错误类型分层
//!
//! - **配置层错误** (`ConfigError`): 发射配置校验失败（范围倒置、非法容量等），
//!   在 Emitter 构造时检测并拒绝，不产生未定义的运行时行为
//! - **引擎层错误** (`ParticleError`): 顶层错误，供宿主统一聚合
//!
//! 渲染层不可失败（空池是无操作，提交只是排队），所以这里没有渲染错误；
//! 容量耗尽（池满丢弃新粒子）是既定的背压策略，同样不是错误。

use thiserror::Error;

/// 粒子引擎顶层错误类型
#[derive(Error, Debug)]
pub enum ParticleError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// 发射配置错误
///
/// 所有变体都在构造期（`EmissionProfile::validate` /
/// `ParticlePool::new`）被检测，运行期不再出现。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid range for {field}: min {min} > max {max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("Lifetime must be positive, got {0}")]
    NonPositiveLifetime(f32),

    #[error("Emission rate must not be negative, got {0}")]
    NegativeRate(f32),

    #[error("Continuous emission requires a positive rate, got {0}")]
    ZeroEmission(f32),

    #[error("Drag must be within (0, 1], got {0}")]
    InvalidDrag(f32),

    #[error("Shape extent must not be negative, got {0}")]
    NegativeExtent(f32),

    #[error("Pool capacity must be positive")]
    ZeroCapacity,
}
