//! # Timer 模块
//!
//! 一次性定时器队列。
//!
//! 定时器与帧循环相互独立：宿主在每次轮询时传入当前时间，
//! 到期的动作按到期时间（相同时按登记顺序）依次取出。
//! 新登记的定时器不会取消已有的定时器，多个定时器并存时先到期者先执行。

use std::collections::BTreeMap;

/// 定时器句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// 到期时间键：微秒整数 + 登记序号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DeadlineKey {
    deadline_us: u64,
    seq: u64,
}

/// 定时器队列
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    entries: BTreeMap<DeadlineKey, A>,
    next_seq: u64,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// 登记一个在 `now_ms + delay_ms` 到期的动作
    pub fn schedule(&mut self, now_ms: f64, delay_ms: u64, action: A) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let deadline_ms = now_ms.max(0.0) + delay_ms as f64;
        let key = DeadlineKey {
            deadline_us: (deadline_ms * 1000.0).round() as u64,
            seq,
        };
        self.entries.insert(key, action);
        TimerId(seq)
    }

    /// 取消定时器，返回被取消的动作
    pub fn cancel(&mut self, id: TimerId) -> Option<A> {
        let key = self.entries.keys().find(|key| key.seq == id.0).copied()?;
        self.entries.remove(&key)
    }

    /// 取消满足条件的所有定时器
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&A) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, action| !predicate(action));
        before - self.entries.len()
    }

    /// 取出所有已到期的动作
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<A> {
        let now_us = (now_ms.max(0.0) * 1000.0).round() as u64;
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().deadline_us > now_us {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    /// 清空所有定时器
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 最早的到期时间（毫秒）
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.entries
            .keys()
            .next()
            .map(|key| key.deadline_us as f64 / 1000.0)
    }
}
