//! # Pet Runtime
//!
//! 桌宠动画运行时的纯逻辑核心。
//!
//! ## 架构概述
//!
//! `pet-runtime` 不做任何 IO，也不依赖动画引擎。
//! 宿主层（`pet-host`）负责读取文件、驱动引擎和音频，
//! 并在需要时调用这里的数据模型与算法：
//!
//! ```text
//! Host                               Runtime
//!   │  config_pet.json / model3.json    │
//!   │──── bytes ──────────────────────►│ PetConfig / ModelSettings
//!   │  pointer (logical px)             │
//!   │──── (x, y) ─────────────────────►│ CoordTransform → model space
//!   │  tap hit                          │
//!   │──── &[ReactionEntry] ───────────►│ select_reaction(rng)
//!   │◄─── &ReactionEntry ──────────────│
//!   │  now_ms                           │
//!   │──── drain_due ──────────────────►│ TimerQueue
//! ```
//!
//! ## 模块结构
//!
//! - [`config`]：宠物配置（触摸区域、反应条目）
//! - [`settings`]：模型设定文件
//! - [`math`]：矩阵
//! - [`coord`]：坐标转换
//! - [`clock`]：帧时钟与时间源
//! - [`drag`]：拖拽平滑
//! - [`reaction`]：反应选择与随机源
//! - [`timer`]：定时器队列
//! - [`error`]：错误类型

pub mod clock;
pub mod config;
pub mod coord;
pub mod drag;
pub mod error;
pub mod math;
pub mod reaction;
pub mod settings;
pub mod timer;

// 重导出核心类型
pub use clock::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use config::{PET_CONFIG_FILE, PetConfig, ReactionEntry, ReactionKind, TouchRegion};
pub use coord::{CoordTransform, DEFAULT_PHYSICAL_SCALE, SurfaceSize};
pub use drag::DragTracker;
pub use error::{ConfigError, PetRuntimeError, PetRuntimeResult, SettingsError};
pub use math::{Matrix44, ModelMatrix, ScreenRect, ViewMatrix};
pub use reaction::{RandomSource, ScriptedRandom, StdRandom, select_reaction};
pub use settings::{ModelSettings, MotionRef, motion_key};
pub use timer::{TimerId, TimerQueue};
