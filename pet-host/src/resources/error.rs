//! 资源错误

use std::fmt;
use thiserror::Error;

/// 资源来源类型（用于错误信息）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    File,
    Zip,
    Memory,
    /// 后台读取任务
    Task,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::File => "文件",
            Origin::Zip => "ZIP",
            Origin::Memory => "内存",
            Origin::Task => "读取任务",
        };
        f.write_str(name)
    }
}

/// 资源读取错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("资源未找到: {path}")]
    NotFound { path: String },

    /// 存在但读取失败
    #[error("{origin}读取失败: {path} - {message}")]
    Read {
        path: String,
        origin: Origin,
        message: String,
    },

    /// 内容无法解析
    #[error("无效的资源格式: {path} - {message}")]
    InvalidFormat { path: String, message: String },
}

impl ResourceError {
    pub(crate) fn read(path: impl Into<String>, origin: Origin, message: impl fmt::Display) -> Self {
        ResourceError::Read {
            path: path.into(),
            origin,
            message: message.to_string(),
        }
    }

    /// 出错的资源路径
    pub fn path(&self) -> &str {
        match self {
            ResourceError::NotFound { path }
            | ResourceError::Read { path, .. }
            | ResourceError::InvalidFormat { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceError::NotFound { .. })
    }
}
