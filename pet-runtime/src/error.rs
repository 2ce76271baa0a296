//! # Error 模块
//!
//! 定义 pet-runtime 中使用的错误类型。

use thiserror::Error;

/// 模型设定（model3.json）解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// JSON 格式错误
    #[error("模型设定解析失败: {message}")]
    InvalidJson { message: String },

    /// 未声明模型文件
    #[error("模型设定缺少模型文件名（FileReferences.Moc）")]
    MissingModelFile,
}

/// 宠物配置（config_pet.json）解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// JSON 格式错误
    #[error("宠物配置解析失败: {message}")]
    InvalidJson { message: String },
}

/// pet-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PetRuntimeError {
    /// 模型设定错误
    #[error("模型设定错误: {0}")]
    Settings(#[from] SettingsError),

    /// 宠物配置错误
    #[error("宠物配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type PetRuntimeResult<T> = Result<T, PetRuntimeError>;
