//! # 路径规范化模块
//!
//! 资源提供者只接受**逻辑路径**：相对于宠物根目录，使用 `/` 分隔。
//!
//! 一个宠物目录的布局：
//!
//! ```text
//! <pet>/
//!   config_pet.json
//!   audio/<audioName>
//!   <live2dFolder>/<modelJsonName>     模型设定
//!   <live2dFolder>/...                 设定中引用的其余文件
//! ```

use pet_runtime::PET_CONFIG_FILE;

/// 音频子目录
pub const AUDIO_DIR: &str = "audio";

/// 规范化逻辑路径
///
/// - 统一使用 `/` 分隔符
/// - 去掉 `.` 与空组件
/// - 处理 `..`（不会越过根）
pub fn normalize_logical_path(path: &str) -> String {
    let unified = path.replace('\\', "/");

    let mut components: Vec<&str> = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    components.join("/")
}

/// 拼接目录与相对路径后规范化
pub fn join_logical(base: &str, relative: &str) -> String {
    if base.is_empty() {
        return normalize_logical_path(relative);
    }
    normalize_logical_path(&format!("{}/{}", base, relative))
}

/// `<pet>/config_pet.json`
pub fn pet_config_path(pet_dir: &str) -> String {
    join_logical(pet_dir, PET_CONFIG_FILE)
}

/// `<pet>/audio/<name>`
pub fn audio_path(pet_dir: &str, audio_name: &str) -> String {
    join_logical(&join_logical(pet_dir, AUDIO_DIR), audio_name)
}

/// 模型目录：`<pet>/<live2dFolder>`
pub fn model_home(pet_dir: &str, live2d_folder: &str) -> String {
    join_logical(pet_dir, live2d_folder)
}
