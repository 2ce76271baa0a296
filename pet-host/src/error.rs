//! # Error 模块
//!
//! 宿主层统一错误类型。
//!
//! 只有会中断调用的情况才是错误：
//!
//! - [`PetError::FatalLoad`]：加载失败，模型不可用
//! - [`PetError::Dispatch`]：反应派发失败（音频拉取 / 解码），表情保持原状
//! - [`PetError::Surface`]：绘制表面不可用
//! - [`PetError::Config`]：宠物配置无法读取
//!
//! 可选资源缺失、未知名称、动作预约被拒绝、未命中等情况只记录日志（或静默），
//! 不会出现在这里。

use crate::audio::AudioError;
use crate::config::StoreError;
use crate::engine::EngineError;
use crate::resources::ResourceError;
use pet_runtime::SettingsError;
use thiserror::Error;

/// 加载阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Settings,
    Model,
    Expressions,
    Physics,
    Pose,
    UserData,
    Motions,
    Textures,
    Renderer,
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoadStage::Settings => "模型设定",
            LoadStage::Model => "模型",
            LoadStage::Expressions => "表情",
            LoadStage::Physics => "物理",
            LoadStage::Pose => "姿势",
            LoadStage::UserData => "用户数据",
            LoadStage::Motions => "动作",
            LoadStage::Textures => "纹理",
            LoadStage::Renderer => "渲染器",
        };
        f.write_str(name)
    }
}

/// 加载失败的原因
#[derive(Error, Debug)]
pub enum LoadFailure {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("纹理解码失败: {path} - {source}")]
    Texture {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("加载任务中断: {0}")]
    Join(String),
}

/// 宿主层错误
#[derive(Error, Debug)]
pub enum PetError {
    /// 加载失败
    #[error("加载{stage}失败: {source}")]
    FatalLoad {
        stage: LoadStage,
        #[source]
        source: LoadFailure,
    },

    /// 反应派发失败
    #[error("反应派发失败: {0}")]
    Dispatch(#[from] DispatchError),

    /// 绘制表面不可用
    #[error("绘制表面不可用: {0}")]
    Surface(String),

    /// 宠物配置读取失败
    #[error("宠物配置读取失败: {0}")]
    Config(#[from] StoreError),
}

impl PetError {
    /// 构造加载失败
    pub fn load(stage: LoadStage, source: impl Into<LoadFailure>) -> Self {
        PetError::FatalLoad {
            stage,
            source: source.into(),
        }
    }
}

/// 反应派发错误
#[derive(Error, Debug)]
pub enum DispatchError {
    /// 音频拉取失败
    #[error("音频拉取失败: {0}")]
    Fetch(#[from] ResourceError),

    /// 音频无法播放
    #[error("音频无法播放: {0}")]
    Audio(#[from] AudioError),
}

/// Result 类型别名
pub type PetResult<T> = Result<T, PetError>;
