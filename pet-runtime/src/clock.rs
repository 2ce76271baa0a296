//! # Clock 模块
//!
//! 帧间隔（秒）计算，以及可替换的时间源。
//!
//! 定时器与帧循环共用同一个时间源，测试时用 [`ManualTimeSource`]
//! 手动推进时间即可得到确定的结果。

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// 时间源
pub trait TimeSource {
    /// 单调递增的当前时间（毫秒）
    fn now_ms(&self) -> f64;
}

/// 系统单调时钟
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// 手动推进的时间源
///
/// 克隆后共享同一个时间值。
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<f64>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 推进指定毫秒
    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    /// 设置绝对时间
    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// 帧时钟
pub struct Clock {
    source: Rc<dyn TimeSource>,
    last_ms: f64,
    delta_seconds: f32,
}

impl Clock {
    pub fn new(source: Rc<dyn TimeSource>) -> Self {
        let last_ms = source.now_ms();
        Self {
            source,
            last_ms,
            delta_seconds: 0.0,
        }
    }

    /// 更新并返回距上次更新的秒数
    pub fn update(&mut self) -> f32 {
        let now = self.source.now_ms();
        // 时间源不会回退，这里只是防止负值
        self.delta_seconds = ((now - self.last_ms).max(0.0) / 1000.0) as f32;
        self.last_ms = now;
        self.delta_seconds
    }

    /// 上次更新得到的秒数
    pub fn delta_time(&self) -> f32 {
        self.delta_seconds
    }

    /// 当前时间（毫秒）
    pub fn now_ms(&self) -> f64 {
        self.source.now_ms()
    }

    /// 共享的时间源
    pub fn source(&self) -> Rc<dyn TimeSource> {
        Rc::clone(&self.source)
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("last_ms", &self.last_ms)
            .field("delta_seconds", &self.delta_seconds)
            .finish()
    }
}
