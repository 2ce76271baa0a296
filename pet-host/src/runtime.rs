//! # Runtime 模块
//!
//! 单个宠物实例的运行循环。
//!
//! ## 生命周期
//!
//! ```text
//! Created ──start()──► Starting ──加载完成──► Running ──stop()──► Stopped
//!                          │
//!                          └──加载失败──► Failed ──stop()──► Stopped
//! ```
//!
//! - `start()`：读取宠物配置，加载模型资源，隐藏屏蔽部件，
//!   设置默认表情，然后请求第一帧
//! - `tick()`：宿主在帧回调中调用，更新并绘制一帧后请求下一帧
//! - `stop()`：任何状态下都可以调用，重复调用无副作用
//!
//! 所有方法都在同一线程上调用；资源拉取的并发由加载器内部处理。

use crate::audio::{AudioPlayer, volume_from_percent};
use crate::caption::{CaptionBoard, CaptionSurface};
use crate::config::{ConfigStore, RuntimeOptions, StoreError};
use crate::engine::{AnimationEngine, MotionFinished, MotionPriority, MotionQueueHandle};
use crate::error::{DispatchError, PetError, PetResult};
use crate::interaction::{InteractionEngine, TapOutcome};
use crate::model::{AnimationModel, AssetLoader};
use crate::resources::AssetProvider;
use crate::resources::path::{model_home, pet_config_path};
use crate::surface::{FrameRequest, PetSurface, PointerEvent};
use pet_runtime::{
    Clock, CoordTransform, PetConfig, RandomSource, StdRandom, SurfaceSize, SystemTimeSource,
    TimeSource,
};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 启动参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetParams {
    /// 宠物目录（逻辑路径）
    pub pet_dir: String,
    /// 模型所在子目录
    pub live2d_folder: String,
    /// 模型设定文件名
    pub model_json_name: String,
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Created,
    Starting,
    Running,
    Failed,
    Stopped,
}

/// 宠物运行时
pub struct PetRuntime<P: AssetProvider> {
    params: PetParams,
    options: RuntimeOptions,
    loader: AssetLoader<P>,
    config_store: Option<Box<dyn ConfigStore>>,
    surface: Box<dyn PetSurface>,
    audio: Box<dyn AudioPlayer>,
    caption: Box<dyn CaptionSurface>,
    /// 启动时移入模型
    engine: Option<Box<dyn AnimationEngine>>,
    model: Option<AnimationModel>,
    interaction: Option<InteractionEngine>,
    rng: Option<Box<dyn RandomSource>>,
    clock: Clock,
    coords: CoordTransform,
    frame: Option<FrameRequest>,
    state: RuntimeState,
}

impl<P: AssetProvider> PetRuntime<P> {
    /// 创建运行时
    ///
    /// 宠物配置默认通过资源提供者读取 `<pet_dir>/config_pet.json`，
    /// 字幕默认使用 [`CaptionBoard`]，时间源默认使用系统时钟。
    pub fn new(
        params: PetParams,
        provider: Arc<P>,
        engine: Box<dyn AnimationEngine>,
        surface: Box<dyn PetSurface>,
        audio: Box<dyn AudioPlayer>,
    ) -> Self {
        let coords = CoordTransform::new(surface.size());
        Self {
            params,
            options: RuntimeOptions::default(),
            loader: AssetLoader::new(provider),
            config_store: None,
            surface,
            audio,
            caption: Box::new(CaptionBoard::new()),
            engine: Some(engine),
            model: None,
            interaction: None,
            rng: None,
            clock: Clock::new(Rc::new(SystemTimeSource::new())),
            coords,
            frame: None,
            state: RuntimeState::Created,
        }
    }

    pub fn with_options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    /// 使用指定的配置存储读取宠物配置
    pub fn with_config_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn with_caption(mut self, caption: Box<dyn CaptionSurface>) -> Self {
        self.caption = caption;
        self
    }

    pub fn with_time_source(mut self, source: Rc<dyn TimeSource>) -> Self {
        self.clock = Clock::new(source);
        self
    }

    /// 反应选择使用的随机源（缺省按 `rng_seed` 选项创建）
    pub fn with_random_source(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Some(rng);
        self
    }

    // ── 状态查询 ──

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn params(&self) -> &PetParams {
        &self.params
    }

    pub fn model(&self) -> Option<&AnimationModel> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut AnimationModel> {
        self.model.as_mut()
    }

    pub fn interaction(&self) -> Option<&InteractionEngine> {
        self.interaction.as_ref()
    }

    pub fn coords(&self) -> &CoordTransform {
        &self.coords
    }

    pub fn audio(&self) -> &dyn AudioPlayer {
        self.audio.as_ref()
    }

    /// 是否有尚未执行的帧请求
    pub fn has_pending_frame(&self) -> bool {
        self.frame.is_some()
    }

    // ── 生命周期 ──

    /// 启动：加载资源并开始逐帧更新
    pub async fn start(&mut self) -> PetResult<()> {
        if self.state != RuntimeState::Created {
            warn!(state = ?self.state, "运行时已启动过，忽略");
            return Ok(());
        }
        self.state = RuntimeState::Starting;

        match self.start_inner().await {
            Ok(()) => {
                self.state = RuntimeState::Running;
                info!(pet = %self.params.pet_dir, "宠物已启动");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, pet = %self.params.pet_dir, "宠物启动失败");
                if let Some(mut model) = self.model.take() {
                    model.dispose();
                }
                self.state = RuntimeState::Failed;
                Err(e)
            }
        }
    }

    async fn start_inner(&mut self) -> PetResult<()> {
        let config = self.read_config().await?;

        let surface = self.surface_size();
        if !surface.is_drawable() {
            return Err(PetError::Surface(format!(
                "尺寸无效: {}x{}",
                surface.logical_width, surface.logical_height
            )));
        }
        self.coords = CoordTransform::new(surface);

        let Some(engine) = self.engine.take() else {
            return Err(PetError::Surface("动画引擎已被释放".to_string()));
        };

        let home = model_home(&self.params.pet_dir, &self.params.live2d_folder);
        let loader = self.loader.clone();
        // 先放进 self，加载中途被取消时 stop() 仍能释放
        let model = self.model.insert(AnimationModel::new(
            engine,
            home,
            surface.physical_width(),
            surface.physical_height(),
        ));
        loader.load(model, &self.params.model_json_name).await?;

        for part in &config.shield_part_list {
            model.set_part_opacity(part, 0.0);
        }
        model.set_expression(&config.default_expression);

        self.audio
            .set_volume(volume_from_percent(f32::from(self.options.volume)));

        let rng = self
            .rng
            .take()
            .unwrap_or_else(|| Box::new(StdRandom::from_seed_option(self.options.rng_seed)));
        self.interaction = Some(
            InteractionEngine::new(config, self.params.pet_dir.clone(), rng)
                .with_supersede_pending_reversion(self.options.supersede_pending_reversion),
        );

        self.clock.update();
        self.frame = Some(self.surface.request_frame());
        Ok(())
    }

    async fn read_config(&self) -> PetResult<PetConfig> {
        if let Some(store) = &self.config_store {
            return Ok(store.read_config()?);
        }

        let path = pet_config_path(&self.params.pet_dir);
        let bytes = self
            .loader
            .provider()
            .read_bytes(&path)
            .await
            .map_err(|e| StoreError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?;
        let config = PetConfig::from_bytes(&bytes).map_err(StoreError::from)?;
        for warning in config.validate() {
            warn!(warning = %warning, path = %path, "宠物配置警告");
        }
        Ok(config)
    }

    fn surface_size(&self) -> SurfaceSize {
        let mut size = self.surface.size();
        if !(size.device_pixel_ratio > 0.0) {
            size = size.with_device_pixel_ratio(self.options.device_pixel_ratio);
        }
        size.with_physical_scale(self.options.physical_scale)
    }

    /// 一帧
    ///
    /// 只在运行中生效；处理完毕后请求下一帧，帧之间不会重叠。
    pub fn tick(&mut self) {
        if self.state != RuntimeState::Running {
            return;
        }
        self.frame = None;

        let dt = self.clock.update();
        let now = self.clock.now_ms();

        if let Some(model) = self.model.as_mut() {
            model.set_view_matrix(self.coords.view().matrix());
            model.on_update(dt);

            if let Some(interaction) = self.interaction.as_mut() {
                interaction.poll(now, model, self.audio.as_mut(), self.caption.as_mut());
            }
        }

        self.frame = Some(self.surface.request_frame());
    }

    /// 绘制表面尺寸变化
    pub fn on_resize(&mut self) {
        let surface = self.surface_size();
        if !surface.is_drawable() {
            debug!("绘制表面尺寸无效，忽略");
            return;
        }
        self.coords = CoordTransform::new(surface);
        if let Some(model) = self.model.as_mut() {
            model.set_canvas_size(surface.physical_width(), surface.physical_height());
        }
    }

    /// 停止并释放全部资源
    ///
    /// 任何状态下都可以调用，重复调用无副作用。
    pub fn stop(&mut self) {
        if self.state == RuntimeState::Stopped {
            return;
        }

        if let Some(frame) = self.frame.take() {
            self.surface.cancel_frame(frame);
        }
        if let Some(mut interaction) = self.interaction.take() {
            interaction.clear();
        }
        self.audio.stop();
        if let Some(mut model) = self.model.take() {
            model.dispose();
        }
        self.engine = None;
        self.caption.clear();
        self.surface.remove();

        self.state = RuntimeState::Stopped;
        info!(pet = %self.params.pet_dir, "宠物已停止");
    }

    // ── 宿主接口 ──

    /// 设置音量（0 - 100，超出范围会被截断）
    pub fn change_volume(&mut self, percent: f32) {
        self.audio.set_volume(volume_from_percent(percent));
    }

    /// 重建渲染器（绘制上下文丢失后）
    pub async fn reload_renderer(&mut self) -> PetResult<()> {
        let loader = self.loader.clone();
        match self.model.as_mut() {
            Some(model) => loader.reload_renderer(model).await,
            None => Ok(()),
        }
    }

    /// 播放动作
    pub async fn start_motion(
        &mut self,
        group: &str,
        index: usize,
        priority: MotionPriority,
        on_finished: Option<MotionFinished>,
    ) -> MotionQueueHandle {
        let provider = Arc::clone(self.loader.provider());
        match self.model.as_mut() {
            Some(model) => {
                model
                    .start_motion(provider.as_ref(), group, index, priority, on_finished)
                    .await
            }
            None => MotionQueueHandle::INVALID,
        }
    }

    // ── 指针 ──

    pub fn on_pointer_down(&mut self, event: &PointerEvent) {
        if self.state != RuntimeState::Running {
            return;
        }
        if let Some(interaction) = self.interaction.as_mut() {
            interaction.on_pointer_down(event, self.surface.as_mut());
        }
    }

    pub fn on_pointer_move(&mut self, event: &PointerEvent) {
        if self.state != RuntimeState::Running {
            return;
        }
        if let (Some(interaction), Some(model)) = (self.interaction.as_mut(), self.model.as_mut())
        {
            interaction.on_pointer_move(event, &self.coords, model);
        }
    }

    /// 抬起指针并派发反应
    ///
    /// 音频反应会在这里拉取音频；拉取或解码失败时返回
    /// [`PetError::Dispatch`]，表情与字幕保持原状。
    pub async fn on_pointer_up(&mut self, event: &PointerEvent) -> PetResult<TapOutcome> {
        if self.state != RuntimeState::Running {
            return Ok(TapOutcome::Ignored);
        }
        let (Some(interaction), Some(model)) = (self.interaction.as_mut(), self.model.as_mut())
        else {
            return Ok(TapOutcome::Ignored);
        };

        let now = self.clock.now_ms();
        let outcome =
            interaction.on_pointer_up(event, self.surface.as_mut(), &self.coords, model, now);

        if let TapOutcome::Audio {
            audio_path, entry, ..
        } = &outcome
        {
            let bytes = match self.loader.provider().read_bytes(audio_path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, audio = %audio_path, "反应音频拉取失败");
                    return Err(DispatchError::Fetch(e).into());
                }
            };

            if let Some(interaction) = self.interaction.as_mut()
                && let Err(e) = interaction.bind_audio(entry.clone(), bytes, self.audio.as_mut())
            {
                warn!(error = %e, audio = %audio_path, "反应音频无法播放");
                return Err(e.into());
            }
        }

        Ok(outcome)
    }
}

impl<P: AssetProvider> std::fmt::Debug for PetRuntime<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetRuntime")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("model", &self.model)
            .field("interaction", &self.interaction)
            .finish()
    }
}
