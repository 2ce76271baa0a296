//! # Engine 模块
//!
//! 动画引擎能力接口。
//!
//! 网格变形、动作曲线插值、物理模拟和纹理混合都由外部引擎完成，
//! 这里只描述宿主需要调用的能力：
//!
//! - 加载：模型 / 表情 / 动作 / 物理 / 姿势 / 用户数据
//! - 参数：快照、读写、提交
//! - 效果：眨眼、呼吸、表情、物理、姿势
//! - 查询：画布尺寸、图形网格 ID、命中测试、部件透明度
//! - 动作队列：预约、开始、停止
//! - 渲染：创建/销毁渲染器、绑定纹理、绘制
//!
//! [`crate::model::AnimationModel`] 持有一个引擎实例（组合而非继承）。

pub mod texture;

pub use texture::{MipLevel, TextureImage, decode_texture};

use pet_runtime::Matrix44;
use thiserror::Error;

/// 引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 二进制 / JSON 数据无法被引擎解析
    #[error("引擎无法解析 {kind}: {name} - {message}")]
    ParseFailed {
        kind: String,
        name: String,
        message: String,
    },

    /// 模型尚未加载
    #[error("模型尚未加载")]
    ModelNotLoaded,

    /// 渲染器错误
    #[error("渲染器错误: {0}")]
    Renderer(String),
}

/// 动作句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionHandle(pub u64);

/// 表情句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpressionHandle(pub u64);

/// 动作队列条目句柄，负数表示无效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionQueueHandle(pub i64);

impl MotionQueueHandle {
    /// 无效句柄（预约失败时返回）
    pub const INVALID: Self = Self(-1);

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl std::fmt::Display for MotionQueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "motion-queue#{}", self.0)
    }
}

/// 动作优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MotionPriority {
    None = 0,
    Idle = 1,
    Normal = 2,
    Force = 3,
}

/// 动作播放结束回调，参数为动作缓存键
pub type MotionFinished = Box<dyn FnMut(&str)>;

/// 动作配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionConfig {
    /// 淡入时间（秒）
    pub fade_in: Option<f32>,
    /// 淡出时间（秒）
    pub fade_out: Option<f32>,
    /// 眨眼效果参数
    pub eye_blink_ids: Vec<String>,
    /// 口型效果参数
    pub lip_sync_ids: Vec<String>,
}

/// 呼吸效果的单个通道
///
/// 参数值 = `offset + peak * sin(2π * t / cycle)`，按 `weight` 混合。
#[derive(Debug, Clone, PartialEq)]
pub struct BreathParameter {
    pub parameter_id: String,
    pub offset: f32,
    pub peak: f32,
    pub cycle: f32,
    pub weight: f32,
}

impl BreathParameter {
    pub fn new(parameter_id: &str, offset: f32, peak: f32, cycle: f32, weight: f32) -> Self {
        Self {
            parameter_id: parameter_id.to_string(),
            offset,
            peak,
            cycle,
            weight,
        }
    }
}

/// 标准参数 ID
pub mod params {
    pub const ANGLE_X: &str = "ParamAngleX";
    pub const ANGLE_Y: &str = "ParamAngleY";
    pub const ANGLE_Z: &str = "ParamAngleZ";
    pub const BODY_ANGLE_X: &str = "ParamBodyAngleX";
    pub const EYE_BALL_X: &str = "ParamEyeBallX";
    pub const EYE_BALL_Y: &str = "ParamEyeBallY";
    pub const BREATH: &str = "ParamBreath";
}

/// 默认呼吸通道：头部三轴、身体 X 轴与呼吸参数
pub fn default_breath_parameters() -> Vec<BreathParameter> {
    vec![
        BreathParameter::new(params::ANGLE_X, 0.0, 15.0, 6.5345, 0.5),
        BreathParameter::new(params::ANGLE_Y, 0.0, 8.0, 3.5345, 0.5),
        BreathParameter::new(params::ANGLE_Z, 0.0, 10.0, 5.5345, 0.5),
        BreathParameter::new(params::BODY_ANGLE_X, 0.0, 4.0, 15.5345, 0.5),
        BreathParameter::new(params::BREATH, 0.5, 0.5, 3.2345, 1.0),
    ]
}

/// 视口（物理像素）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 动画引擎能力接口
pub trait AnimationEngine {
    // ── 加载 ──

    /// 加载模型二进制
    fn load_model(&mut self, bytes: &[u8]) -> Result<(), EngineError>;

    /// 解析表情数据
    fn load_expression(&mut self, name: &str, bytes: &[u8])
    -> Result<ExpressionHandle, EngineError>;

    /// 设置表情淡入淡出时间
    fn configure_expression(
        &mut self,
        handle: ExpressionHandle,
        fade_in: Option<f32>,
        fade_out: Option<f32>,
    );

    /// 释放表情
    fn release_expression(&mut self, handle: ExpressionHandle);

    /// 解析动作数据
    fn load_motion(&mut self, name: &str, bytes: &[u8]) -> Result<MotionHandle, EngineError>;

    /// 配置动作（淡入淡出、效果参数）
    fn configure_motion(&mut self, handle: MotionHandle, config: &MotionConfig);

    /// 设置 / 替换动作结束回调
    fn set_motion_finished(&mut self, handle: MotionHandle, callback: Option<MotionFinished>);

    /// 释放动作
    fn release_motion(&mut self, handle: MotionHandle);

    fn load_physics(&mut self, bytes: &[u8]) -> Result<(), EngineError>;

    fn load_pose(&mut self, bytes: &[u8]) -> Result<(), EngineError>;

    fn load_user_data(&mut self, bytes: &[u8]) -> Result<(), EngineError>;

    /// 创建眨眼控制器
    fn create_eye_blink(&mut self, parameter_ids: &[String]);

    /// 创建呼吸控制器
    fn create_breath(&mut self, parameters: &[BreathParameter]);

    // ── 参数 ──

    /// 恢复参数快照
    fn load_parameters(&mut self);

    /// 保存参数快照
    fn save_parameters(&mut self);

    /// 在当前值上叠加 `value * weight`
    fn add_parameter_value(&mut self, parameter_id: &str, value: f32, weight: f32);

    /// 把参数写入模型
    fn commit_parameters(&mut self);

    // ── 每帧更新 ──

    /// 动作队列是否已全部结束
    fn is_motion_finished(&self) -> bool;

    /// 推进动作，返回本帧是否有动作写入参数
    fn update_motion(&mut self, dt: f32) -> bool;

    fn update_eye_blink(&mut self, dt: f32);

    fn update_expression(&mut self, dt: f32);

    fn update_breath(&mut self, dt: f32);

    fn evaluate_physics(&mut self, dt: f32);

    fn update_pose(&mut self, dt: f32);

    // ── 查询 ──

    /// 模型画布尺寸（模型单位）
    fn canvas_size(&self) -> (f32, f32);

    /// 图形网格下标对应的 ID
    fn drawable_id(&self, index: usize) -> Option<String>;

    /// 命中测试（模型视图空间坐标）
    fn hit_test(&self, drawable_id: &str, x: f32, y: f32) -> bool;

    /// 按部件 ID 设置透明度，部件不存在时返回 `false`
    fn set_part_opacity(&mut self, part_id: &str, opacity: f32) -> bool;

    // ── 表情 / 动作队列 ──

    /// 切换当前表情
    fn set_expression(&mut self, handle: ExpressionHandle);

    /// 按优先级预约动作，失败表示已有更高优先级的动作
    fn reserve_motion(&mut self, priority: MotionPriority) -> bool;

    /// 开始播放动作
    fn start_motion(&mut self, handle: MotionHandle, priority: MotionPriority)
    -> MotionQueueHandle;

    fn stop_all_motions(&mut self);

    // ── 渲染 ──

    fn create_renderer(&mut self) -> Result<(), EngineError>;

    fn delete_renderer(&mut self);

    /// 上传纹理到指定纹理单元
    fn bind_texture(&mut self, unit: usize, texture: &TextureImage) -> Result<(), EngineError>;

    /// 绘制
    fn draw(&mut self, mvp: &Matrix44, viewport: Viewport);

    /// 释放引擎全局资源
    fn dispose(&mut self);
}
