//! 特效管理器
//!
//! 持有全部活动特效（发射器 + 专属粒子池），每帧驱动
//! 发射 -> 模拟 -> 渲染排队，并回收已结束的一次性特效。
//!
//! 单线程协作模型：所有池变更（分配/回收）只发生在 `update` 内部
//! 同步调用的发射与模拟中；渲染排队严格在当帧模拟完成之后。

use glam::{Mat4, Vec2};
use std::sync::Arc;

use crate::core::error::ConfigError;
use crate::core::MAX_STEP_SECONDS;
use crate::emitter::Emitter;
use crate::pool::ParticlePool;
use crate::profile::EmissionProfile;
use crate::render::ParticleBatchRenderer;
use crate::simulator::Simulator;

/// 特效句柄
///
/// 不透明 ID。特效被回收后句柄失效：对失效句柄的所有操作
/// 都是无操作，不会崩溃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle(u64);

/// 一个活动特效：发射器与其专属粒子池
struct Effect {
    id: u64,
    emitter: Emitter,
    pool: ParticlePool,
}

/// 管理器统计
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagerStats {
    /// 累计出生粒子数
    pub total_spawned: u64,
    /// 累计因池满被丢弃的出生请求数
    pub total_dropped: u64,
    /// 累计回收的特效数
    pub effects_collected: u64,
}

/// 特效管理器
pub struct EffectManager {
    /// 活动特效，槽位顺序即渲染层序
    effects: Vec<Effect>,
    /// 单调递增的句柄 ID
    next_id: u64,
    /// 已回收特效的统计基数
    stats_base: ManagerStats,
}

impl EffectManager {
    /// 创建空管理器
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
            next_id: 0,
            stats_base: ManagerStats::default(),
        }
    }

    /// 启动一个持续发射特效
    ///
    /// 池容量取稳态存活数上界加余量：`ceil(rate * max_lifetime) + margin`。
    /// 配置非法时拒绝创建；速率非正的配置在这里同样被拒绝，
    /// 否则会得到一个永不出生、只能靠 `stop` 才会消失的空特效。
    pub fn spawn_continuous(
        &mut self,
        profile: Arc<EmissionProfile>,
        position: Vec2,
    ) -> Result<EffectHandle, ConfigError> {
        if profile.rate <= 0.0 {
            return Err(ConfigError::ZeroEmission(profile.rate));
        }
        let capacity = profile.steady_state_capacity();
        let pool = ParticlePool::new(capacity)?;
        let emitter = Emitter::new(profile, position)?;
        Ok(self.push_effect(emitter, pool))
    }

    /// 启动一个一次性爆发特效
    ///
    /// 立即出生 `count` 个粒子并停用连续发射；
    /// `count == 0` 时回退到配置的 `burst_count`。
    /// 粒子全部消亡后特效在下一次 `update` 中被回收。
    pub fn spawn_burst(
        &mut self,
        profile: Arc<EmissionProfile>,
        position: Vec2,
        count: u32,
    ) -> Result<EffectHandle, ConfigError> {
        let count = if count == 0 { profile.burst_count } else { count };
        let mut pool = ParticlePool::new(count.max(1) as usize)?;
        let mut emitter = Emitter::new(profile, position)?;
        emitter.burst(count, &mut pool);
        Ok(self.push_effect(emitter, pool))
    }

    /// 停止一个特效的发射
    ///
    /// 对出生立即生效；已在飞行中的粒子走完自然寿命，
    /// 期间特效不会被回收。失效句柄是无操作。
    pub fn stop(&mut self, handle: EffectHandle) {
        if let Some(effect) = self.find_mut(handle) {
            effect.emitter.stop();
        }
    }

    /// 移动一个特效的发射位置（失效句柄是无操作）
    pub fn set_position(&mut self, handle: EffectHandle, position: Vec2) {
        if let Some(effect) = self.find_mut(handle) {
            effect.emitter.position = position;
        }
    }

    /// 句柄对应的特效是否仍被追踪
    pub fn is_alive(&self, handle: EffectHandle) -> bool {
        self.effects.iter().any(|e| e.id == handle.0)
    }

    /// 每帧更新：发射、模拟、回收
    ///
    /// `dt` 被钳制到 [`MAX_STEP_SECONDS`]，宿主卡顿不会导致模拟爆炸；
    /// 超出部分直接丢弃（单次钳制，不追帧）。
    ///
    /// 回收条件是两部分的：发射器已停用 **且** 池已排空。
    /// 只停用不排空的特效继续动画，保证停止的持续特效不会
    /// 带着飞行中的粒子凭空消失。
    pub fn update(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_STEP_SECONDS);

        for effect in &mut self.effects {
            effect.emitter.update(dt, &mut effect.pool);
        }
        for effect in &mut self.effects {
            Simulator::step(&mut effect.pool, dt);
        }

        let stats_base = &mut self.stats_base;
        self.effects.retain(|effect| {
            let finished = !effect.emitter.is_active() && effect.pool.is_drained();
            if finished {
                log::debug!(
                    "Effect {} collected ({} spawned, {} dropped)",
                    effect.id,
                    effect.emitter.spawned_total(),
                    effect.emitter.dropped()
                );
                stats_base.total_spawned += effect.emitter.spawned_total();
                stats_base.total_dropped += effect.emitter.dropped();
                stats_base.effects_collected += 1;
            }
            !finished
        });
    }

    /// 把所有追踪中的池排入批量渲染器，按管理器层序（创建顺序）
    ///
    /// 宿主随后在渲染通道内调用 [`ParticleBatchRenderer::draw`]。
    pub fn render(
        &self,
        renderer: &mut ParticleBatchRenderer,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view_projection: Mat4,
    ) {
        renderer.begin_frame(queue, view_projection);
        for effect in &self.effects {
            renderer.queue_pool(
                device,
                queue,
                &effect.pool,
                effect.emitter.profile().blend_mode,
            );
        }
    }

    /// 立即清除所有特效与粒子
    ///
    /// 唯一的强制取消路径；正常停止请用 [`stop`](Self::stop)。
    pub fn clear(&mut self) {
        for effect in &mut self.effects {
            effect.pool.kill_all();
            self.stats_base.total_spawned += effect.emitter.spawned_total();
            self.stats_base.total_dropped += effect.emitter.dropped();
            self.stats_base.effects_collected += 1;
        }
        self.effects.clear();
    }

    /// 当前追踪的特效数
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// 当前全部池的存活粒子总数
    pub fn live_particles(&self) -> usize {
        self.effects.iter().map(|e| e.pool.live_count()).sum()
    }

    /// 聚合统计（含已回收特效）
    pub fn stats(&self) -> ManagerStats {
        let mut stats = self.stats_base;
        for effect in &self.effects {
            stats.total_spawned += effect.emitter.spawned_total();
            stats.total_dropped += effect.emitter.dropped();
        }
        stats
    }

    fn push_effect(&mut self, emitter: Emitter, pool: ParticlePool) -> EffectHandle {
        let id = self.next_id;
        self.next_id += 1;
        log::debug!("Effect {} started (pool capacity {})", id, pool.capacity());
        self.effects.push(Effect { id, emitter, pool });
        EffectHandle(id)
    }

    fn find_mut(&mut self, handle: EffectHandle) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| e.id == handle.0)
    }
}

impl Default for EffectManager {
    fn default() -> Self {
        Self::new()
    }
}
