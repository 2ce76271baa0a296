//! # Pet Host 层
//!
//! 桌宠动画运行时的宿主层实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 资源读取（目录 / ZIP / 内存）与并发加载
//! - 驱动动画引擎（通过 [`engine::AnimationEngine`] 组合，不继承）
//! - 音频播放与字幕
//! - 指针交互与触摸反应
//! - 逐帧循环与实例注册表
//!
//! 纯逻辑（配置模型、矩阵、坐标转换、反应选择、定时器）位于 `pet-runtime`。
//!
//! ```text
//! PetRegistry ──► PetRuntime ──► AnimationModel ──► dyn AnimationEngine
//!                     │               ▲
//!                     │               └── AssetLoader ──► AssetProvider
//!                     ├──► InteractionEngine ──► TimerQueue / RandomSource
//!                     ├──► dyn AudioPlayer
//!                     ├──► dyn CaptionSurface
//!                     └──► dyn PetSurface
//! ```

pub mod audio;
pub mod caption;
pub mod config;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod model;
pub mod registry;
pub mod resources;
pub mod runtime;
pub mod surface;

pub use audio::{AudioError, AudioEvent, AudioPlayer, RodioAudioPlayer, volume_from_percent};
pub use caption::{Caption, CaptionBoard, CaptionId, CaptionPhase, CaptionSurface};
pub use config::{
    AssetSourceType, ConfigStore, JsonConfigStore, MemoryConfigStore, RuntimeOptions, StoreError,
};
pub use engine::{
    AnimationEngine, EngineError, ExpressionHandle, MotionHandle, MotionPriority,
    MotionQueueHandle, TextureImage,
};
pub use error::{DispatchError, LoadFailure, LoadStage, PetError, PetResult};
pub use interaction::{InteractionEngine, PressState, TapOutcome};
pub use model::{AnimationModel, AssetLoader, LipSyncSource};
pub use registry::{PetId, PetRegistry};
pub use resources::{
    AssetProvider, FsSource, MemorySource, ResourceError, ResourceSource, SourceProvider,
    ZipSource,
};
pub use runtime::{PetParams, PetRuntime, RuntimeState};
pub use surface::{FrameRequest, PetSurface, PointerButton, PointerEvent};
