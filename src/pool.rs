//! 固定容量粒子池
//!
//! 预分配的粒子存储区 + 侵入式空闲链表，分配与回收均为 O(1)，
//! 池的整个生命周期内不发生任何再分配。
//!
//! 容量耗尽时 [`ParticlePool::allocate`] 返回 `None`，新的出生请求被
//! 静默丢弃——不排队、不重试。这是既定的背压策略：以视觉完整性换取
//! 确定性的内存上界。

use crate::core::error::ConfigError;
use crate::particle::Particle;

/// 空闲链表的结尾哨兵
const FREE_END: u32 = u32::MAX;

/// 固定容量粒子池
///
/// 每个死亡槽位在 `next_free` 中记录下一个空闲槽位的索引，
/// 构成侵入式单向链表，分配（弹头）和回收（压头）都不需要扫描。
///
/// 槽位回收时不清零：字段保持上一个粒子的残留值，
/// 由下一次出生采样全量覆盖（见 `Emitter::spawn_one`）。
pub struct ParticlePool {
    /// 粒子存储区，构造后长度固定
    particles: Vec<Particle>,
    /// 死亡槽位的空闲链表后继索引（存活槽位的条目无意义）
    next_free: Vec<u32>,
    /// 空闲链表头
    free_head: u32,
    /// 当前存活数
    live_count: usize,
}

impl ParticlePool {
    /// 创建容量为 `capacity` 的粒子池
    ///
    /// 零容量在此被拒绝，而不是在运行期产生空池的未定义行为。
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        // 初始空闲链表: 0 -> 1 -> ... -> capacity-1 -> END
        let next_free: Vec<u32> = (1..=capacity)
            .map(|i| if i < capacity { i as u32 } else { FREE_END })
            .collect();

        Ok(Self {
            particles: vec![Particle::default(); capacity],
            next_free,
            free_head: 0,
            live_count: 0,
        })
    }

    /// 分配一个槽位
    ///
    /// O(1)。返回的槽位已标记存活，但字段是上一个占用者的残留值，
    /// 调用方必须全量填充。容量耗尽时返回 `None`。
    pub fn allocate(&mut self) -> Option<usize> {
        if self.free_head == FREE_END {
            return None;
        }

        let slot = self.free_head as usize;
        self.free_head = self.next_free[slot];
        self.particles[slot].alive = true;
        self.live_count += 1;
        Some(slot)
    }

    /// 回收一个槽位
    ///
    /// O(1)。仅标记死亡并挂回空闲链表，不清零、不压缩。
    /// 对已死亡槽位重复调用是无操作。
    pub fn release(&mut self, slot: usize) {
        if !self.particles[slot].alive {
            return;
        }
        self.particles[slot].alive = false;
        self.next_free[slot] = self.free_head;
        self.free_head = slot as u32;
        self.live_count -= 1;
    }

    /// 按槽位索引顺序遍历每个存活粒子
    ///
    /// 遍历顺序与出生时间无关，调用方不得依赖任何时序含义。
    pub fn for_each_live<F: FnMut(usize, &Particle)>(&self, mut f: F) {
        for (slot, p) in self.particles.iter().enumerate() {
            if p.alive {
                f(slot, p);
            }
        }
    }

    /// 槽位是否存活
    #[inline]
    pub fn is_live(&self, slot: usize) -> bool {
        self.particles[slot].alive
    }

    /// 获取粒子（不检查存活状态）
    #[inline]
    pub fn get(&self, slot: usize) -> &Particle {
        &self.particles[slot]
    }

    /// 获取粒子的可变引用（不检查存活状态）
    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> &mut Particle {
        &mut self.particles[slot]
    }

    /// 池容量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// 当前存活粒子数
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// 池是否已无存活粒子
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.live_count == 0
    }

    /// 立即杀死所有存活粒子
    ///
    /// 唯一的强制清除路径，仅由显式清空调用（自然消亡不走这里）。
    pub fn kill_all(&mut self) {
        for slot in 0..self.particles.len() {
            self.release(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(ParticlePool::new(0), Err(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn test_allocate_to_capacity() {
        let mut pool = ParticlePool::new(4).unwrap();

        for _ in 0..4 {
            assert!(pool.allocate().is_some());
        }
        assert_eq!(pool.live_count(), 4);

        // 第 N+1 次请求返回 None，不越界
        assert!(pool.allocate().is_none());
        assert_eq!(pool.live_count(), 4);
    }

    #[test]
    fn test_release_then_reallocate() {
        let mut pool = ParticlePool::new(2).unwrap();
        let a = pool.allocate().unwrap();
        let _b = pool.allocate().unwrap();

        pool.release(a);
        assert_eq!(pool.live_count(), 1);

        // 回收后立即可复用，且拿到的就是刚释放的槽位
        let c = pool.allocate().unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut pool = ParticlePool::new(2).unwrap();
        let a = pool.allocate().unwrap();

        pool.release(a);
        pool.release(a);
        assert_eq!(pool.live_count(), 0);

        // 链表未被破坏：仍可分配满容量
        assert!(pool.allocate().is_some());
        assert!(pool.allocate().is_some());
        assert!(pool.allocate().is_none());
    }

    #[test]
    fn test_for_each_live_skips_dead() {
        let mut pool = ParticlePool::new(3).unwrap();
        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        let _c = pool.allocate().unwrap();
        pool.release(b);

        let mut visited = Vec::new();
        pool.for_each_live(|slot, _| visited.push(slot));
        assert_eq!(visited.len(), 2);
        assert!(visited.contains(&a));
        assert!(!visited.contains(&b));

        // 索引顺序
        let mut sorted = visited.clone();
        sorted.sort_unstable();
        assert_eq!(visited, sorted);
    }

    #[test]
    fn test_slot_not_zeroed_on_release() {
        let mut pool = ParticlePool::new(1).unwrap();
        let a = pool.allocate().unwrap();
        pool.get_mut(a).size = 42.0;
        pool.release(a);

        // 残留值保留，由调用方在下一次出生时覆盖
        let b = pool.allocate().unwrap();
        assert_eq!(b, a);
        assert_eq!(pool.get(b).size, 42.0);
    }

    #[test]
    fn test_kill_all() {
        let mut pool = ParticlePool::new(8).unwrap();
        for _ in 0..8 {
            pool.allocate();
        }
        pool.kill_all();
        assert!(pool.is_drained());
        // 全部回到空闲链表
        for _ in 0..8 {
            assert!(pool.allocate().is_some());
        }
    }
}
