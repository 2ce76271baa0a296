//! # Config 模块
//!
//! 运行时选项与宠物配置存储。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 选项文件 (pet_host.json)
//! 3. 默认值（最低）

mod store;

pub use store::{ConfigStore, JsonConfigStore, MemoryConfigStore, StoreError, set_field};

use pet_runtime::DEFAULT_PHYSICAL_SCALE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 资源来源类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetSourceType {
    /// 宠物目录
    #[default]
    Fs,
    /// 打包的 ZIP
    Zip,
}

/// 运行时选项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeOptions {
    /// 宠物根目录（Fs 模式）
    #[serde(default = "default_pets_root")]
    pub pets_root: PathBuf,

    /// 资源来源类型
    #[serde(default)]
    pub asset_source: AssetSourceType,

    /// ZIP 文件路径（仅 Zip 模式使用）
    #[serde(default)]
    pub zip_path: Option<String>,

    /// 画布超采样倍率
    #[serde(default = "default_physical_scale")]
    pub physical_scale: f32,

    /// 无法从窗口获取时使用的设备像素比
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f32,

    /// 初始音量（0 - 100）
    #[serde(default = "default_volume")]
    pub volume: u8,

    /// 新反应是否取消尚未执行的表情回归
    ///
    /// 默认关闭：多个回归定时器并存，先到期者先执行。
    #[serde(default)]
    pub supersede_pending_reversion: bool,

    /// 反应选择随机种子（调试用，缺省使用系统熵）
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_pets_root() -> PathBuf {
    PathBuf::from("pets")
}

fn default_physical_scale() -> f32 {
    DEFAULT_PHYSICAL_SCALE
}

fn default_device_pixel_ratio() -> f32 {
    1.0
}

fn default_volume() -> u8 {
    100
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            pets_root: default_pets_root(),
            asset_source: AssetSourceType::default(),
            zip_path: None,
            physical_scale: default_physical_scale(),
            device_pixel_ratio: default_device_pixel_ratio(),
            volume: default_volume(),
            supersede_pending_reversion: false,
            rng_seed: None,
        }
    }
}

/// 选项错误
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OptionsError {
    #[error("选项序列化失败: {0}")]
    SerializationFailed(String),
    #[error("选项 IO 错误: {0}")]
    IoError(String),
    #[error("选项验证失败: {0}")]
    ValidationFailed(String),
}

impl RuntimeOptions {
    /// 加载选项文件
    ///
    /// 文件不存在或解析失败时返回默认选项并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "选项文件不存在，使用默认选项");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(options) => {
                    info!(path = %path.display(), "选项文件加载成功");
                    options
                }
                Err(e) => {
                    warn!(error = %e, "选项文件解析失败，使用默认选项");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "选项文件读取失败，使用默认选项");
                Self::default()
            }
        }
    }

    /// 保存选项
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OptionsError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| OptionsError::SerializationFailed(e.to_string()))?;
        fs::write(path, json).map_err(|e| OptionsError::IoError(e.to_string()))
    }

    /// 验证选项
    pub fn validate(&self) -> Result<(), OptionsError> {
        match self.asset_source {
            AssetSourceType::Fs => {
                if !self.pets_root.exists() {
                    return Err(OptionsError::ValidationFailed(format!(
                        "宠物目录不存在: {:?}",
                        self.pets_root
                    )));
                }
            }
            AssetSourceType::Zip => {
                let zip_path = self.zip_path.as_ref().ok_or_else(|| {
                    OptionsError::ValidationFailed("Zip 模式必须配置 zip_path".to_string())
                })?;
                if !Path::new(zip_path).exists() {
                    return Err(OptionsError::ValidationFailed(format!(
                        "ZIP 文件不存在: {}",
                        zip_path
                    )));
                }
            }
        }

        if !(self.physical_scale > 0.0) {
            return Err(OptionsError::ValidationFailed(
                "physical_scale 必须大于 0".to_string(),
            ));
        }
        if !(self.device_pixel_ratio > 0.0) {
            return Err(OptionsError::ValidationFailed(
                "device_pixel_ratio 必须大于 0".to_string(),
            ));
        }
        if self.volume > 100 {
            return Err(OptionsError::ValidationFailed(
                "音量必须在 0 - 100 之间".to_string(),
            ));
        }

        Ok(())
    }
}
