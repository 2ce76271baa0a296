//! # Settings 模块
//!
//! 模型设定文件（`*.model3.json`）的数据模型。
//!
//! 设定文件描述模型二进制、纹理、物理、姿势、用户数据、表情、动作分组、
//! 效果参数组（眨眼 / 口型）以及布局。所有路径都相对于模型目录。

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 眨眼参数组名称
pub const GROUP_EYE_BLINK: &str = "EyeBlink";
/// 口型同步参数组名称
pub const GROUP_LIP_SYNC: &str = "LipSync";

/// 表情引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionRef {
    /// 表情名称
    pub name: String,
    /// 表情文件
    pub file: String,
    /// 淡入时间（秒，可选）
    #[serde(default)]
    pub fade_in_time: Option<f32>,
    /// 淡出时间（秒，可选）
    #[serde(default)]
    pub fade_out_time: Option<f32>,
}

/// 动作引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MotionRef {
    /// 动作文件
    pub file: String,
    /// 淡入时间（秒），负数或缺省表示使用动作文件自身的设定
    #[serde(default)]
    pub fade_in_time: Option<f32>,
    /// 淡出时间（秒）
    #[serde(default)]
    pub fade_out_time: Option<f32>,
    /// 伴随音频（目前仅保留）
    #[serde(default)]
    pub sound: Option<String>,
}

impl MotionRef {
    /// 有效的淡入时间（非负才生效）
    pub fn fade_in(&self) -> Option<f32> {
        self.fade_in_time.filter(|t| *t >= 0.0)
    }

    /// 有效的淡出时间（非负才生效）
    pub fn fade_out(&self) -> Option<f32> {
        self.fade_out_time.filter(|t| *t >= 0.0)
    }
}

/// 文件引用
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileReferences {
    /// 模型二进制
    #[serde(default)]
    pub moc: String,
    /// 纹理列表（下标即纹理单元）
    #[serde(default)]
    pub textures: Vec<String>,
    /// 物理设定
    #[serde(default)]
    pub physics: Option<String>,
    /// 姿势设定
    #[serde(default)]
    pub pose: Option<String>,
    /// 用户数据
    #[serde(default)]
    pub user_data: Option<String>,
    /// 显示信息（仅保留）
    #[serde(default)]
    pub display_info: Option<String>,
    /// 表情列表
    #[serde(default)]
    pub expressions: Vec<ExpressionRef>,
    /// 动作分组
    #[serde(default)]
    pub motions: BTreeMap<String, Vec<MotionRef>>,
}

/// 参数组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterGroup {
    /// 目标类型（通常是 `Parameter`）
    #[serde(default)]
    pub target: String,
    /// 组名
    pub name: String,
    /// 参数 ID 列表
    #[serde(default)]
    pub ids: Vec<String>,
}

/// 命中区域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HitArea {
    /// 图形网格 ID
    pub id: String,
    /// 区域名称
    #[serde(default)]
    pub name: String,
}

/// 模型设定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelSettings {
    /// 格式版本
    #[serde(default)]
    pub version: u32,
    /// 文件引用
    pub file_references: FileReferences,
    /// 参数组
    #[serde(default)]
    pub groups: Vec<ParameterGroup>,
    /// 命中区域
    #[serde(default)]
    pub hit_areas: Vec<HitArea>,
    /// 布局（键如 `width`、`center_x`）
    #[serde(default)]
    pub layout: HashMap<String, f32>,
}

/// 设定警告
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsWarning {
    /// 没有声明纹理
    NoTextures,
    /// 某个纹理文件名为空（会被跳过）
    EmptyTexture { index: usize },
    /// 表情名重复（后加载的会覆盖先加载的）
    DuplicateExpression { name: String },
    /// 动作分组为空
    EmptyMotionGroup { group: String },
}

impl std::fmt::Display for SettingsWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsWarning::NoTextures => write!(f, "模型没有声明任何纹理"),
            SettingsWarning::EmptyTexture { index } => {
                write!(f, "纹理 {} 的文件名为空，将被跳过", index)
            }
            SettingsWarning::DuplicateExpression { name } => {
                write!(f, "表情 '{}' 重复声明，后者覆盖前者", name)
            }
            SettingsWarning::EmptyMotionGroup { group } => {
                write!(f, "动作分组 '{}' 为空", group)
            }
        }
    }
}

impl ModelSettings {
    /// 从字节解析设定
    ///
    /// 模型文件名为空时返回 [`SettingsError::MissingModelFile`]。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_slice(bytes).map_err(|e| SettingsError::InvalidJson {
                message: e.to_string(),
            })?;

        if settings.model_file_name().is_empty() {
            return Err(SettingsError::MissingModelFile);
        }

        Ok(settings)
    }

    /// 模型二进制文件名
    pub fn model_file_name(&self) -> &str {
        &self.file_references.moc
    }

    /// 物理设定文件名（空字符串视为未声明）
    pub fn physics_file_name(&self) -> Option<&str> {
        non_empty(&self.file_references.physics)
    }

    /// 姿势设定文件名
    pub fn pose_file_name(&self) -> Option<&str> {
        non_empty(&self.file_references.pose)
    }

    /// 用户数据文件名
    pub fn user_data_file_name(&self) -> Option<&str> {
        non_empty(&self.file_references.user_data)
    }

    /// 表情列表
    pub fn expressions(&self) -> &[ExpressionRef] {
        &self.file_references.expressions
    }

    /// 纹理列表，`(纹理单元, 文件名)`，跳过空文件名
    pub fn textures(&self) -> impl Iterator<Item = (usize, &str)> {
        self.file_references
            .textures
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(index, name)| (index, name.as_str()))
    }

    /// 动作分组（按组名排序，保证加载顺序稳定）
    pub fn motion_groups(&self) -> impl Iterator<Item = (&str, &[MotionRef])> {
        self.file_references
            .motions
            .iter()
            .map(|(group, motions)| (group.as_str(), motions.as_slice()))
    }

    /// 查找指定分组的动作
    pub fn motion(&self, group: &str, index: usize) -> Option<&MotionRef> {
        self.file_references.motions.get(group)?.get(index)
    }

    /// 指定参数组的参数 ID
    pub fn group_ids(&self, group_name: &str) -> Vec<String> {
        self.groups
            .iter()
            .filter(|group| group.name == group_name)
            .flat_map(|group| group.ids.iter().cloned())
            .collect()
    }

    /// 眨眼参数 ID
    pub fn eye_blink_ids(&self) -> Vec<String> {
        self.group_ids(GROUP_EYE_BLINK)
    }

    /// 口型同步参数 ID
    pub fn lip_sync_ids(&self) -> Vec<String> {
        self.group_ids(GROUP_LIP_SYNC)
    }

    /// 校验设定，返回警告列表
    pub fn validate(&self) -> Vec<SettingsWarning> {
        let mut warnings = Vec::new();

        if self.file_references.textures.is_empty() {
            warnings.push(SettingsWarning::NoTextures);
        }
        for (index, name) in self.file_references.textures.iter().enumerate() {
            if name.is_empty() {
                warnings.push(SettingsWarning::EmptyTexture { index });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for expression in self.expressions() {
            if !seen.insert(expression.name.as_str()) {
                warnings.push(SettingsWarning::DuplicateExpression {
                    name: expression.name.clone(),
                });
            }
        }

        for (group, motions) in self.motion_groups() {
            if motions.is_empty() {
                warnings.push(SettingsWarning::EmptyMotionGroup {
                    group: group.to_string(),
                });
            }
        }

        warnings
    }
}

/// 动作缓存键：`<group>_<index>`
pub fn motion_key(group: &str, index: usize) -> String {
    format!("{}_{}", group, index)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|name| !name.is_empty())
}
