//! # Particle Engine
//!
//! A high-performance 2D particle simulation and batched rendering engine built with Rust.
//!
//! ## Features
//!
//! - **Fixed-Capacity Pooling**: 固定容量粒子池，侵入式空闲链表，O(1) 分配/回收，运行时零扩容
//! - **Frame-Rate-Independent Emission**: 小数累加器保证任意帧率下发射速率收敛
//! - **Batched Rendering**: 共享四边形几何 + 逐实例属性流，每个混合模式分组一次 Draw Call
//! - **Blend-Mode Partitioning**: Alpha 组先于 Additive 组提交，利用加法混合的可交换性省去排序
//! - **Effect Lifecycle**: 一次性爆发与持续发射的统一生命周期管理与自动回收
//!
//! ## Architecture Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Effect Manager                        │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Emission (Emitter)                                   │
//! │     - 累加器驱动的连续发射 / 一次性爆发                      │
//! │     - 从 EmissionProfile 范围均匀采样初始化                 │
//! │                                                          │
//! │  2. Simulation (Simulator)                               │
//! │     - 积分运动、阻力衰减、漂移扰动                           │
//! │     - 生命周期推进与过期回收                                │
//! │     - 颜色/大小随生命周期线性插值                            │
//! │                                                          │
//! │  3. Rendering (ParticleBatchRenderer)                    │
//! │     - 逐实例属性打包上传                                    │
//! │     - 按混合模式分组，每组一次实例化绘制                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! use particle_engine::{EffectManager, EmissionProfile};
//! use std::sync::Arc;
//!
//! let mut manager = EffectManager::new();
//! let fire = Arc::new(EmissionProfile::fire());
//! let handle = manager.spawn_continuous(fire, glam::Vec2::new(100.0, 200.0))?;
//!
//! // 每帧：
//! manager.update(delta_time);
//! manager.render(&mut renderer, &device, &queue, view_projection);
//! renderer.draw(&mut render_pass);
//! ```

/// Core functionality: errors and engine-wide constants
pub mod core;
/// Particle record: per-particle simulation state
pub mod particle;
/// Fixed-capacity particle pool with free-list reuse
pub mod pool;
/// Immutable emission profiles (configuration surface)
pub mod profile;
/// Emitters: accumulator-driven spawning and bursts
pub mod emitter;
/// Simulator: per-frame particle integration
pub mod simulator;
/// Effect manager: effect lifecycle and per-frame driving
pub mod manager;
/// Batched GPU rendering with blend-mode partitioning
pub mod render;

pub use crate::core::error::{ConfigError, ParticleError};
pub use crate::core::MAX_STEP_SECONDS;
pub use emitter::Emitter;
pub use manager::{EffectHandle, EffectManager, ManagerStats};
pub use particle::Particle;
pub use pool::ParticlePool;
pub use profile::{BlendMode, EmissionProfile, EmitterShape};
pub use render::{ParticleBatchRenderer, ParticleInstance};
pub use simulator::Simulator;
