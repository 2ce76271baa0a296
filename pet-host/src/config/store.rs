//! 宠物配置存储
//!
//! 读取 `config_pet.json`，并支持按点分路径写回单个字段。

use pet_runtime::{ConfigError, PET_CONFIG_FILE, PetConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{info, warn};

/// 配置存储错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("配置 IO 错误: {path} - {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Parse(#[from] ConfigError),

    #[error("无效的字段路径: {0}")]
    InvalidFieldPath(String),
}

/// 配置存储
pub trait ConfigStore {
    /// 读取宠物配置
    fn read_config(&self) -> Result<PetConfig, StoreError>;

    /// 写入一个字段，`field_path` 为点分路径（如 `touchList.0.drawableName`）
    fn write_field(&self, field_path: &str, value: Value) -> Result<(), StoreError>;
}

/// 基于 JSON 文件的配置存储
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// 指定配置文件路径
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 宠物目录下的 `config_pet.json`
    pub fn for_pet_dir(pet_dir: impl AsRef<Path>) -> Self {
        Self::new(pet_dir.as_ref().join(PET_CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: impl std::fmt::Display) -> StoreError {
        StoreError::Io {
            path: self.path.to_string_lossy().to_string(),
            message: e.to_string(),
        }
    }

    fn read_value(&self) -> Result<Value, StoreError> {
        let content = std::fs::read(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_slice(&content).map_err(|e| {
            StoreError::Parse(ConfigError::InvalidJson {
                message: e.to_string(),
            })
        })
    }
}

impl ConfigStore for JsonConfigStore {
    fn read_config(&self) -> Result<PetConfig, StoreError> {
        let value = self.read_value()?;
        let config = PetConfig::from_value(value)?;
        info!(path = %self.path.display(), "宠物配置加载成功");
        for warning in config.validate() {
            warn!(warning = %warning, "宠物配置警告");
        }
        Ok(config)
    }

    fn write_field(&self, field_path: &str, value: Value) -> Result<(), StoreError> {
        let mut root = self.read_value()?;
        set_field(&mut root, field_path, value)?;
        let json = serde_json::to_string_pretty(&root).map_err(|e| self.io_error(e))?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// 内存配置存储
#[derive(Debug)]
pub struct MemoryConfigStore {
    value: Mutex<Value>,
}

impl MemoryConfigStore {
    pub fn new(value: Value) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// 当前 JSON 内容
    pub fn snapshot(&self) -> Value {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn read_config(&self) -> Result<PetConfig, StoreError> {
        Ok(PetConfig::from_value(self.snapshot())?)
    }

    fn write_field(&self, field_path: &str, value: Value) -> Result<(), StoreError> {
        let mut root = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        set_field(&mut root, field_path, value)
    }
}

/// 按点分路径设置 JSON 字段
///
/// 对象中缺失的键会被创建；数组只能写入已有下标。
pub fn set_field(root: &mut Value, field_path: &str, value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = field_path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidFieldPath(field_path.to_string()));
    }

    let mut current = root;
    for segment in &segments {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }
        current = match current {
            Value::Array(items) => {
                let index: usize = segment
                    .parse()
                    .map_err(|_| StoreError::InvalidFieldPath(field_path.to_string()))?;
                items
                    .get_mut(index)
                    .ok_or_else(|| StoreError::InvalidFieldPath(field_path.to_string()))?
            }
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            _ => return Err(StoreError::InvalidFieldPath(field_path.to_string())),
        };
    }

    *current = value;
    Ok(())
}
