//! # Model 模块
//!
//! 动画模型外观：持有一个 [`AnimationEngine`]，
//! 负责每帧参数计算、绘制、表情切换、命中测试与动作播放。
//!
//! 资源加载见 [`loader`]。
//!
//! ## 每帧更新顺序
//!
//! ```text
//! 恢复参数快照
//! → 动作（动作队列未结束时）
//! → 保存参数快照
//! → 眨眼（本帧没有动作写入参数时）
//! → 表情淡入淡出
//! → 拖拽偏移（头部三轴 / 身体 / 眼球）
//! → 呼吸 → 物理 → 口型 → 姿势
//! → 提交参数
//! ```

pub mod loader;

pub use loader::AssetLoader;

use crate::engine::{
    AnimationEngine, ExpressionHandle, MotionConfig, MotionFinished, MotionHandle,
    MotionPriority, MotionQueueHandle, Viewport, params,
};
use crate::resources::{AssetProvider, path::join_logical};
use pet_runtime::{DragTracker, Matrix44, ModelMatrix, ModelSettings, motion_key};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 口型同步权重
const LIP_SYNC_WEIGHT: f32 = 0.8;

/// 口型同步音量来源
pub trait LipSyncSource {
    /// 当前音量（0.0 - 1.0）
    fn level(&mut self) -> f32;
}

/// 动画模型
pub struct AnimationModel {
    engine: Box<dyn AnimationEngine>,
    /// 模型目录（逻辑路径）
    home_dir: String,
    settings: Option<ModelSettings>,
    model_matrix: ModelMatrix,
    view_matrix: Matrix44,
    /// `<group>_<index>` → 动作
    motions: HashMap<String, MotionHandle>,
    /// 表情名 → 表情
    expressions: HashMap<String, ExpressionHandle>,
    eye_blink_ids: Vec<String>,
    lip_sync_ids: Vec<String>,
    has_eye_blink: bool,
    has_breath: bool,
    has_physics: bool,
    has_pose: bool,
    drag: DragTracker,
    lip_sync: Option<Box<dyn LipSyncSource>>,
    /// 画布物理像素尺寸
    canvas_width: f32,
    canvas_height: f32,
    loaded: bool,
}

impl AnimationModel {
    /// 创建模型外观
    ///
    /// # 参数
    /// - `engine`: 动画引擎实例
    /// - `home_dir`: 模型目录（设定文件中的路径都相对于它）
    /// - `canvas_width` / `canvas_height`: 画布物理像素尺寸
    pub fn new(
        engine: Box<dyn AnimationEngine>,
        home_dir: impl Into<String>,
        canvas_width: f32,
        canvas_height: f32,
    ) -> Self {
        Self {
            engine,
            home_dir: home_dir.into(),
            settings: None,
            model_matrix: ModelMatrix::new(1.0, 1.0),
            view_matrix: Matrix44::new(),
            motions: HashMap::new(),
            expressions: HashMap::new(),
            eye_blink_ids: Vec::new(),
            lip_sync_ids: Vec::new(),
            has_eye_blink: false,
            has_breath: false,
            has_physics: false,
            has_pose: false,
            drag: DragTracker::new(),
            lip_sync: None,
            canvas_width,
            canvas_height,
            loaded: false,
        }
    }

    // ── 状态查询 ──

    /// 资源是否全部加载完成
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn home_dir(&self) -> &str {
        &self.home_dir
    }

    pub fn settings(&self) -> Option<&ModelSettings> {
        self.settings.as_ref()
    }

    pub fn model_matrix(&self) -> &ModelMatrix {
        &self.model_matrix
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    pub fn has_expression(&self, name: &str) -> bool {
        self.expressions.contains_key(name)
    }

    pub fn motion_count(&self) -> usize {
        self.motions.len()
    }

    pub fn has_motion(&self, key: &str) -> bool {
        self.motions.contains_key(key)
    }

    /// 平滑后的拖拽值
    pub fn drag(&self) -> (f32, f32) {
        (self.drag.x(), self.drag.y())
    }

    pub fn engine(&self) -> &dyn AnimationEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn AnimationEngine {
        self.engine.as_mut()
    }

    // ── 配置 ──

    /// 画布尺寸变化
    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.canvas_width = width;
        self.canvas_height = height;
    }

    /// 设置视图矩阵（每帧由运行时从坐标转换器复制）
    pub fn set_view_matrix(&mut self, view: &Matrix44) {
        self.view_matrix = *view;
    }

    /// 设置口型同步音量来源
    pub fn set_lip_sync_source(&mut self, source: Option<Box<dyn LipSyncSource>>) {
        self.lip_sync = source;
    }

    // ── 加载器使用的内部接口 ──

    pub(crate) fn set_settings(&mut self, settings: ModelSettings) {
        self.settings = Some(settings);
    }

    pub(crate) fn set_effect_ids(&mut self, eye_blink_ids: Vec<String>, lip_sync_ids: Vec<String>) {
        self.eye_blink_ids = eye_blink_ids;
        self.lip_sync_ids = lip_sync_ids;
    }

    pub(crate) fn effect_ids(&self) -> (&[String], &[String]) {
        (&self.eye_blink_ids, &self.lip_sync_ids)
    }

    pub(crate) fn set_controllers(
        &mut self,
        eye_blink: bool,
        breath: bool,
        physics: bool,
        pose: bool,
    ) {
        self.has_eye_blink = eye_blink;
        self.has_breath = breath;
        self.has_physics = physics;
        self.has_pose = pose;
    }

    pub(crate) fn set_model_matrix(&mut self, matrix: ModelMatrix) {
        self.model_matrix = matrix;
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    /// 登记表情，同名旧表情会被释放
    pub(crate) fn register_expression(&mut self, name: &str, handle: ExpressionHandle) {
        if let Some(old) = self.expressions.insert(name.to_string(), handle)
            && old != handle
        {
            debug!(name = %name, "替换已加载的表情");
            self.engine.release_expression(old);
        }
    }

    /// 登记动作，同键旧动作会被释放
    pub(crate) fn register_motion(&mut self, key: &str, handle: MotionHandle) {
        if let Some(old) = self.motions.insert(key.to_string(), handle)
            && old != handle
        {
            debug!(key = %key, "替换已加载的动作");
            self.engine.release_motion(old);
        }
    }

    /// 释放所有缓存的动作与表情
    pub fn release_resources(&mut self) {
        for (_, handle) in self.expressions.drain() {
            self.engine.release_expression(handle);
        }
        for (_, handle) in self.motions.drain() {
            self.engine.release_motion(handle);
        }
        self.loaded = false;
    }

    /// 释放资源并销毁引擎全局资源
    pub fn dispose(&mut self) {
        self.release_resources();
        self.engine.delete_renderer();
        self.engine.dispose();
    }

    // ── 每帧 ──

    /// 计算本帧参数
    pub fn update(&mut self, dt: f32) {
        self.drag.update(dt);
        let drag_x = self.drag.x();
        let drag_y = self.drag.y();

        let engine = self.engine.as_mut();
        engine.load_parameters();

        let mut motion_updated = false;
        if !engine.is_motion_finished() {
            motion_updated = engine.update_motion(dt);
        }

        engine.save_parameters();

        if !motion_updated && self.has_eye_blink {
            engine.update_eye_blink(dt);
        }

        engine.update_expression(dt);

        engine.add_parameter_value(params::ANGLE_X, drag_x * 30.0, 1.0);
        engine.add_parameter_value(params::ANGLE_Y, drag_y * 30.0, 1.0);
        engine.add_parameter_value(params::ANGLE_Z, drag_x * drag_y * -30.0, 1.0);
        engine.add_parameter_value(params::BODY_ANGLE_X, drag_x * 10.0, 1.0);
        engine.add_parameter_value(params::EYE_BALL_X, drag_x, 1.0);
        engine.add_parameter_value(params::EYE_BALL_Y, drag_y, 1.0);

        if self.has_breath {
            engine.update_breath(dt);
        }

        if self.has_physics {
            engine.evaluate_physics(dt);
        }

        if let Some(lip_sync) = self.lip_sync.as_mut() {
            let value = lip_sync.level();
            for id in &self.lip_sync_ids {
                engine.add_parameter_value(id, value, LIP_SYNC_WEIGHT);
            }
        }

        if self.has_pose {
            engine.update_pose(dt);
        }

        engine.commit_parameters();
    }

    /// 绘制
    ///
    /// `view_projection` 为投影 × 视图矩阵，模型放置矩阵在这里乘入。
    /// 未加载完成时什么也不做。
    pub fn draw(&mut self, view_projection: &Matrix44) {
        if !self.loaded {
            return;
        }

        let mut mvp = *view_projection;
        mvp.multiply_by(self.model_matrix.matrix());

        let viewport = Viewport {
            x: 0.0,
            y: 0.0,
            width: self.canvas_width,
            height: self.canvas_height,
        };
        self.engine.draw(&mvp, viewport);
    }

    /// 投影矩阵：按画布宽高比修正
    ///
    /// 模型比画布更宽、且画布为竖长时，以宽度为准放置模型。
    pub fn projection(&mut self) -> Matrix44 {
        let width = self.canvas_width;
        let height = self.canvas_height;
        let mut projection = Matrix44::new();

        let (model_width, _) = self.engine.canvas_size();
        if model_width > 1.0 && width < height {
            self.model_matrix.set_width(2.0);
            projection.scale(1.0, width / height);
        } else {
            projection.scale(height / width, 1.0);
        }

        projection.multiply_by(&self.view_matrix);
        projection
    }

    /// 一帧：更新参数并绘制
    pub fn on_update(&mut self, dt: f32) {
        let projection = self.projection();
        self.update(dt);
        self.draw(&projection);
    }

    // ── 交互 ──

    /// 切换表情，未知表情只记录日志
    pub fn set_expression(&mut self, name: &str) -> bool {
        match self.expressions.get(name) {
            Some(handle) => {
                self.engine.set_expression(*handle);
                true
            }
            None => {
                warn!(expression = %name, "表情不存在");
                false
            }
        }
    }

    /// 设置部件透明度
    pub fn set_part_opacity(&mut self, part_name: &str, opacity: f32) {
        if !self.engine.set_part_opacity(part_name, opacity) {
            warn!(part = %part_name, "部件不存在");
        }
    }

    /// 命中测试：`(x, y)` 是否落在第 `drawable_index` 个图形网格上
    pub fn on_tap(&self, drawable_index: usize, x: f32, y: f32) -> bool {
        match self.engine.drawable_id(drawable_index) {
            Some(id) => self.engine.hit_test(&id, x, y),
            None => {
                debug!(index = drawable_index, "图形网格下标越界");
                false
            }
        }
    }

    /// 设置拖拽目标（模型视图空间）
    pub fn on_drag(&mut self, x: f32, y: f32) {
        self.drag.set(x, y);
    }

    /// 播放动作
    ///
    /// 预约失败时返回 [`MotionQueueHandle::INVALID`]。
    /// 未缓存的动作会先拉取、解析并配置，再交给动作队列。
    pub async fn start_motion<P: AssetProvider>(
        &mut self,
        provider: &P,
        group: &str,
        index: usize,
        priority: MotionPriority,
        on_finished: Option<MotionFinished>,
    ) -> MotionQueueHandle {
        if !self.engine.reserve_motion(priority) {
            info!(group = %group, index, "动作预约失败");
            return MotionQueueHandle::INVALID;
        }

        let key = motion_key(group, index);

        let handle = match self.motions.get(&key).copied() {
            Some(handle) => {
                self.engine.set_motion_finished(handle, on_finished);
                handle
            }
            None => match self.fetch_motion(provider, group, index, &key).await {
                Some(handle) => {
                    self.engine.set_motion_finished(handle, on_finished);
                    handle
                }
                None => return MotionQueueHandle::INVALID,
            },
        };

        debug!(motion = %key, "开始动作");
        self.engine.start_motion(handle, priority)
    }

    async fn fetch_motion<P: AssetProvider>(
        &mut self,
        provider: &P,
        group: &str,
        index: usize,
        key: &str,
    ) -> Option<MotionHandle> {
        let motion = match self.settings.as_ref().and_then(|s| s.motion(group, index)) {
            Some(motion) => motion.clone(),
            None => {
                warn!(motion = %key, "动作未在模型设定中声明");
                return None;
            }
        };

        let path = join_logical(&self.home_dir, &motion.file);
        let bytes = match provider.read_bytes(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, motion = %key, "动作拉取失败");
                return None;
            }
        };

        let handle = match self.engine.load_motion(key, &bytes) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, motion = %key, "动作解析失败");
                return None;
            }
        };

        let config = MotionConfig {
            fade_in: motion.fade_in(),
            fade_out: motion.fade_out(),
            eye_blink_ids: self.eye_blink_ids.clone(),
            lip_sync_ids: self.lip_sync_ids.clone(),
        };
        self.engine.configure_motion(handle, &config);
        self.register_motion(key, handle);
        Some(handle)
    }
}

impl std::fmt::Debug for AnimationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationModel")
            .field("home_dir", &self.home_dir)
            .field("loaded", &self.loaded)
            .field("expressions", &self.expressions.len())
            .field("motions", &self.motions.len())
            .finish()
    }
}
