//! # Config 模块
//!
//! 宠物配置（`config_pet.json`）的数据模型。
//!
//! 每次会话只读取一次，会话期间不可变。JSON 使用 camelCase 键名，
//! 与配置文件保持一致。

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// 宠物配置文件名
pub const PET_CONFIG_FILE: &str = "config_pet.json";

/// 反应类型
///
/// 目前只有表情反应一种。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReactionKind {
    /// 切换表情
    #[default]
    Expression,
}

/// 反应条目
///
/// 描述一次触摸反应：表情、可选音频、可选字幕以及结束后的回归延时。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEntry {
    /// 反应类型
    #[serde(rename = "type", default)]
    pub kind: ReactionKind,
    /// 表情名称
    pub expression_name: String,
    /// 音频文件名（位于 `<pet>/audio/` 下）
    #[serde(default)]
    pub audio_name: Option<String>,
    /// 字幕文本
    #[serde(default)]
    pub text: Option<String>,
    /// 回归默认表情前的延时（毫秒）
    #[serde(rename = "delayed", default, deserialize_with = "delay_millis")]
    pub delayed_ms: u64,
}

/// 延时可以写成任意非负数字，小数向上取整到毫秒
fn delay_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "delayed 必须是非负数字，实际为 {}",
            value
        )));
    }
    Ok(value.ceil() as u64)
}

impl ReactionEntry {
    /// 是否带音频
    pub fn has_audio(&self) -> bool {
        self.audio_name.as_deref().is_some_and(|name| !name.is_empty())
    }

    /// 字幕文本（空字符串视为无字幕）
    pub fn caption(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// 触摸区域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchRegion {
    /// 图形网格索引（用于命中测试）
    pub drawable_id: usize,
    /// 图形网格 ID（仅用于辨识）
    #[serde(default)]
    pub drawable_name: String,
    /// 可选反应列表
    #[serde(default)]
    pub relationship: Vec<ReactionEntry>,
}

/// 宠物配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetConfig {
    /// 默认待机表情
    pub default_expression: String,
    /// 需要隐藏的部件名称（透明度置 0）
    #[serde(default)]
    pub shield_part_list: Vec<String>,
    /// 休眠反应
    #[serde(default)]
    pub sleep: Option<Vec<ReactionEntry>>,
    /// 唤醒反应
    #[serde(default)]
    pub awaken: Option<Vec<ReactionEntry>>,
    /// 触摸区域（按声明顺序进行命中测试）
    #[serde(default)]
    pub touch_list: Vec<TouchRegion>,
}

/// 配置警告
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// 默认表情为空
    EmptyDefaultExpression,
    /// 触摸区域没有任何反应
    EmptyRelationship { drawable_id: usize },
    /// 重复的触摸区域（后声明的永远不会命中）
    DuplicateRegion { drawable_id: usize },
    /// 反应条目的表情名为空
    EmptyExpressionName { drawable_id: usize, index: usize },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::EmptyDefaultExpression => write!(f, "defaultExpression 为空"),
            ConfigWarning::EmptyRelationship { drawable_id } => {
                write!(f, "触摸区域 {} 没有配置任何反应", drawable_id)
            }
            ConfigWarning::DuplicateRegion { drawable_id } => {
                write!(f, "触摸区域 {} 重复声明，只有第一个会生效", drawable_id)
            }
            ConfigWarning::EmptyExpressionName { drawable_id, index } => {
                write!(f, "触摸区域 {} 的第 {} 个反应缺少表情名", drawable_id, index)
            }
        }
    }
}

impl PetConfig {
    /// 从字节解析配置
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(bytes).map_err(|e| ConfigError::InvalidJson {
            message: e.to_string(),
        })
    }

    /// 从已解析的 JSON 值构建配置
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidJson {
            message: e.to_string(),
        })
    }

    /// 校验配置，返回警告列表
    ///
    /// 警告不阻止运行，只用于诊断。
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.default_expression.is_empty() {
            warnings.push(ConfigWarning::EmptyDefaultExpression);
        }

        let mut seen = HashSet::new();
        for region in &self.touch_list {
            if !seen.insert(region.drawable_id) {
                warnings.push(ConfigWarning::DuplicateRegion {
                    drawable_id: region.drawable_id,
                });
            }
            if region.relationship.is_empty() {
                warnings.push(ConfigWarning::EmptyRelationship {
                    drawable_id: region.drawable_id,
                });
            }
            for (index, entry) in region.relationship.iter().enumerate() {
                if entry.expression_name.is_empty() {
                    warnings.push(ConfigWarning::EmptyExpressionName {
                        drawable_id: region.drawable_id,
                        index,
                    });
                }
            }
        }

        warnings
    }

    /// 所有被引用的表情名（默认表情 + 各类反应），去重并保持首次出现顺序
    pub fn referenced_expressions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let entries = self
            .touch_list
            .iter()
            .flat_map(|region| region.relationship.iter())
            .chain(self.sleep.iter().flatten())
            .chain(self.awaken.iter().flatten());

        for name in std::iter::once(self.default_expression.as_str())
            .chain(entries.map(|entry| entry.expression_name.as_str()))
        {
            if !name.is_empty() && seen.insert(name) {
                names.push(name);
            }
        }
        names
    }

    /// 所有被引用的音频文件名，去重
    pub fn referenced_audio(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.touch_list
            .iter()
            .flat_map(|region| region.relationship.iter())
            .chain(self.sleep.iter().flatten())
            .chain(self.awaken.iter().flatten())
            .filter_map(|entry| entry.audio_name.as_deref())
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .collect()
    }
}
