//! # Resource Source 模块
//!
//! 资源来源抽象层，支持从文件系统、ZIP 包或内存读取宠物资源。
//!
//! 所有路径参数都是逻辑路径（见 [`super::path`]），
//! 由具体实现决定如何解析到实际位置。

use super::error::{Origin, ResourceError};
use super::path::normalize_logical_path;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// 资源来源 trait（同步）
///
/// - `FsSource`：从宠物目录读取
/// - `ZipSource`：从打包的宠物 ZIP 读取
/// - `MemorySource`：内存中的文件表（嵌入 / 测试）
pub trait ResourceSource: Send + Sync {
    /// 读取资源字节
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;

    /// 获取资源的完整路径（用于日志）
    fn full_path(&self, path: &str) -> String;
}

/// 文件系统资源来源
#[derive(Debug, Clone)]
pub struct FsSource {
    /// 资源根目录
    base_path: PathBuf,
}

impl FsSource {
    /// 创建文件系统资源来源
    ///
    /// # 参数
    /// - `base_path`: 宠物根目录（如 `pets`）
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, logical_path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(logical_path))
    }
}

impl ResourceSource for FsSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let full_path = self.resolve(path);

        std::fs::read(&full_path).map_err(|e| {
            let path = full_path.to_string_lossy().to_string();
            match e.kind() {
                std::io::ErrorKind::NotFound => ResourceError::NotFound { path },
                _ => ResourceError::read(path, Origin::File, e),
            }
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn full_path(&self, path: &str) -> String {
        self.resolve(path).to_string_lossy().to_string()
    }
}

/// ZIP 文件资源来源
///
/// 首次访问时建立条目索引并缓存。
pub struct ZipSource {
    /// ZIP 文件路径
    zip_path: PathBuf,
    /// 条目索引缓存（逻辑路径 -> ZIP 内索引）
    index_cache: Mutex<Option<HashMap<String, usize>>>,
}

impl ZipSource {
    pub fn new(zip_path: impl Into<PathBuf>) -> Self {
        Self {
            zip_path: zip_path.into(),
            index_cache: Mutex::new(None),
        }
    }

    fn open_archive(&self) -> Result<zip::ZipArchive<File>, ResourceError> {
        let archive_path = self.zip_path.to_string_lossy();
        let file = File::open(&self.zip_path)
            .map_err(|e| ResourceError::read(&*archive_path, Origin::Zip, e))?;
        zip::ZipArchive::new(file)
            .map_err(|e| ResourceError::read(&*archive_path, Origin::Zip, e))
    }

    fn build_index(&self) -> Result<HashMap<String, usize>, ResourceError> {
        let mut archive = self.open_archive()?;

        let mut index = HashMap::new();
        for i in 0..archive.len() {
            if let Ok(entry) = archive.by_index(i)
                && !entry.is_dir()
            {
                index.insert(normalize_logical_path(entry.name()), i);
            }
        }

        Ok(index)
    }

    fn lookup(&self, logical_path: &str) -> Result<Option<usize>, ResourceError> {
        let mut cache = self
            .index_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if cache.is_none() {
            *cache = Some(self.build_index()?);
        }
        Ok(cache
            .as_ref()
            .and_then(|index| index.get(logical_path).copied()))
    }
}

impl ResourceSource for ZipSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let zip_path = normalize_logical_path(path);

        let file_index = self
            .lookup(&zip_path)?
            .ok_or_else(|| ResourceError::NotFound {
                path: zip_path.clone(),
            })?;

        let mut archive = self.open_archive()?;
        let mut entry = archive
            .by_index(file_index)
            .map_err(|e| ResourceError::read(zip_path.as_str(), Origin::Zip, e))?;

        let mut buffer = Vec::new();
        entry
            .read_to_end(&mut buffer)
            .map_err(|e| ResourceError::read(zip_path.as_str(), Origin::Zip, e))?;

        Ok(buffer)
    }

    fn exists(&self, path: &str) -> bool {
        matches!(self.lookup(&normalize_logical_path(path)), Ok(Some(_)))
    }

    fn full_path(&self, path: &str) -> String {
        format!(
            "zip://{}#{}",
            self.zip_path.display(),
            normalize_logical_path(path)
        )
    }
}

/// 内存资源来源
#[derive(Debug, Default)]
pub struct MemorySource {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加（或覆盖）一个文件
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_logical_path(path), bytes.into());
    }

    /// 链式添加文件
    pub fn with_file(self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// 移除一个文件
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize_logical_path(path))
    }
}

impl ResourceSource for MemorySource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let logical = normalize_logical_path(path);
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&logical)
            .cloned()
            .ok_or(ResourceError::NotFound { path: logical })
    }

    fn exists(&self, path: &str) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&normalize_logical_path(path))
    }

    fn full_path(&self, path: &str) -> String {
        format!("memory://{}", normalize_logical_path(path))
    }
}
