//! # Reaction 模块
//!
//! 触摸反应的随机选择。
//!
//! 随机源可替换：运行时默认使用系统熵初始化的 [`StdRandom`]，
//! 测试中可以固定种子，或使用 [`ScriptedRandom`] 按预设序列返回下标。

use crate::config::ReactionEntry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// 均匀随机源
pub trait RandomSource {
    /// 返回 `[0, upper)` 内的均匀随机下标，`upper` 保证大于 1
    fn next_index(&mut self, upper: usize) -> usize;
}

/// 基于 [`StdRng`] 的随机源
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// 使用系统熵初始化
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// 使用固定种子初始化（结果可复现）
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 有种子用种子，否则用系统熵
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }
}

/// 按预设序列返回下标的随机源
///
/// 序列耗尽后返回 0。记录调用次数，便于断言"未调用随机源"。
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    queue: VecDeque<usize>,
    calls: usize,
}

impl ScriptedRandom {
    pub fn new(sequence: impl IntoIterator<Item = usize>) -> Self {
        Self {
            queue: sequence.into_iter().collect(),
            calls: 0,
        }
    }

    /// 被调用的次数
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.calls += 1;
        self.queue.pop_front().unwrap_or(0) % upper
    }
}

/// 从反应列表中选择一条
///
/// - 空列表返回 `None`
/// - 单条直接返回，不消耗随机数
/// - 多条均匀随机
pub fn select_reaction<'a>(
    entries: &'a [ReactionEntry],
    rng: &mut dyn RandomSource,
) -> Option<&'a ReactionEntry> {
    match entries.len() {
        0 => None,
        1 => entries.first(),
        n => entries.get(rng.next_index(n)),
    }
}
