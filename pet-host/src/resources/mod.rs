//! # Resources 模块
//!
//! 资源提供者：动画运行时读取字节与 JSON 的唯一入口。
//!
//! ## 设计
//!
//! - [`AssetProvider`] 是异步接口，每次调用都是一个挂起点，
//!   加载器在此之上并发拉取资源。
//! - [`ResourceSource`] 是同步的存储后端（文件系统 / ZIP / 内存），
//!   通过 [`SourceProvider`] 适配成 [`AssetProvider`]，
//!   实际读取放到阻塞线程池中执行。

mod error;
pub mod path;
mod source;

pub use error::{Origin, ResourceError};
pub use path::normalize_logical_path;
pub use source::{FsSource, MemorySource, ResourceSource, ZipSource};

use std::future::Future;
use std::sync::Arc;

/// 资源提供者
pub trait AssetProvider: Send + Sync + 'static {
    /// 读取原始字节
    fn read_bytes(&self, path: &str)
    -> impl Future<Output = Result<Vec<u8>, ResourceError>> + Send;

    /// 读取并解析 JSON
    fn read_json(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<serde_json::Value, ResourceError>> + Send {
        let path = path.to_string();
        async move {
            let bytes = self.read_bytes(&path).await?;
            serde_json::from_slice(&bytes).map_err(|e| ResourceError::InvalidFormat {
                path,
                message: e.to_string(),
            })
        }
    }
}

/// 把同步的 [`ResourceSource`] 适配为 [`AssetProvider`]
#[derive(Clone)]
pub struct SourceProvider {
    source: Arc<dyn ResourceSource>,
}

impl SourceProvider {
    pub fn new(source: impl ResourceSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// 底层资源来源
    pub fn source(&self) -> &Arc<dyn ResourceSource> {
        &self.source
    }
}

impl std::fmt::Debug for SourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceProvider")
            .field("root", &self.source.full_path(""))
            .finish()
    }
}

impl AssetProvider for SourceProvider {
    fn read_bytes(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ResourceError>> + Send {
        let source = Arc::clone(&self.source);
        let path = path.to_string();
        async move {
            let logical = path.clone();
            tokio::task::spawn_blocking(move || source.read(&logical))
                .await
                .map_err(|e| ResourceError::read(path, Origin::Task, e))?
        }
    }
}
