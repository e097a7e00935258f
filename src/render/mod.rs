//! 批量粒子渲染模块
//!
//! 把池内所有存活粒子转换为单次 GPU 提交：共享一份四边形几何，
//! 逐实例属性流替换每份拷贝的位置/大小/旋转/颜色，
//! 每个混合模式分组恰好一次实例化绘制。
//!
//! ## 架构设计
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                Particle Batch Renderer                   │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Gather (CPU)                                         │
//! │     - 按池遍历顺序打包存活粒子的渲染字段                     │
//! │     - 紧凑的逐实例缓冲区，每池一次 write_buffer             │
//! │                                                          │
//! │  2. Partition                                            │
//! │     - 按混合模式分组：Alpha 组在前，Additive 组在后          │
//! │     - Additive 满足交换律，组内无需排序                     │
//! │                                                          │
//! │  3. Instanced Draw                                       │
//! │     - 每组一次 draw：共享四边形 × N 份实例                  │
//! │     - 深度写入禁用                                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 已知限制
//!
//! Alpha 组内不排序：重叠的 Alpha 粒子可能出现顺序伪影。
//! 这是以省去每帧 O(N log N) 排序为代价的既定取舍，不是缺陷。

pub mod batch;

pub use batch::{gather_instances, ParticleBatchRenderer, ParticleInstance};
