//! # Interaction 模块
//!
//! 指针交互与触摸反应。
//!
//! ## 指针状态机
//!
//! ```text
//! Idle ──down(主键)──► Pressed ──move──► Pressed（拖拽）
//!   ▲                     │
//!   └──────── up ─────────┘  命中测试 → 选择反应 → 派发
//! ```
//!
//! ## 反应派发
//!
//! - 无音频：立即切换表情，`delayed_ms` 后回到默认表情
//! - 有音频：拉取音频并设置音源；可播放时显示字幕、播放、切换表情；
//!   播放结束 `delayed_ms` 后隐藏字幕并回到默认表情
//!
//! 音频事件的监听是一次性的，新的音频反应会替换尚未完成的监听。
//! 回归定时器相互独立，新反应默认不会取消之前的定时器，
//! 先到期者先执行（可能提前把新表情改回默认表情），
//! 打开 `supersede_pending_reversion` 后新反应会取消尚未执行的回归，
//! 取消发生在反应确定生效之后（无音频反应切换表情时、音频反应设置音源成功后），
//! 派发失败时之前的回归保持不变。

use crate::audio::{AudioEvent, AudioPlayer};
use crate::caption::{CaptionId, CaptionSurface};
use crate::error::DispatchError;
use crate::model::AnimationModel;
use crate::resources::path::audio_path;
use crate::surface::{PetSurface, PointerEvent};
use pet_runtime::{
    CoordTransform, PetConfig, RandomSource, ReactionEntry, TimerQueue, select_reaction,
};
use tracing::{debug, info, warn};

/// 指针状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressState {
    Idle,
    Pressed {
        pointer_id: u64,
        /// 按下位置（逻辑像素）
        start: (f32, f32),
        /// 最近一次记录的位置（逻辑像素）
        last: (f32, f32),
    },
}

/// 抬起指针后的结果
#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    /// 非主键，忽略
    Ignored,
    /// 没有命中任何触摸区域（或命中区域没有反应）
    Miss,
    /// 无音频反应，已切换表情并登记回归
    Silent { region: usize, expression: String },
    /// 音频反应，调用方需拉取 `audio_path` 后调用 [`InteractionEngine::bind_audio`]
    Audio {
        region: usize,
        audio_path: String,
        entry: ReactionEntry,
    },
}

/// 回归动作
#[derive(Debug, Clone, PartialEq)]
pub struct Reversion {
    /// 回归到的表情
    pub expression: String,
    /// 需要隐藏的字幕
    pub caption: Option<CaptionId>,
}

/// 音频反应所处阶段
#[derive(Debug, Clone, PartialEq)]
enum AudioStage {
    /// 等待可播放
    AwaitCanPlay,
    /// 等待播放结束
    AwaitEnded { caption: Option<CaptionId> },
}

#[derive(Debug, Clone)]
struct PendingAudio {
    entry: ReactionEntry,
    stage: AudioStage,
}

/// 交互引擎
pub struct InteractionEngine {
    config: PetConfig,
    pet_dir: String,
    state: PressState,
    rng: Box<dyn RandomSource>,
    timers: TimerQueue<Reversion>,
    pending_audio: Option<PendingAudio>,
    supersede_pending_reversion: bool,
}

impl InteractionEngine {
    /// 创建交互引擎
    ///
    /// # 参数
    /// - `config`: 宠物配置（会话期间不变）
    /// - `pet_dir`: 宠物目录（音频位于 `<pet_dir>/audio/`）
    /// - `rng`: 反应选择的随机源
    pub fn new(config: PetConfig, pet_dir: impl Into<String>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            config,
            pet_dir: pet_dir.into(),
            state: PressState::Idle,
            rng,
            timers: TimerQueue::new(),
            pending_audio: None,
            supersede_pending_reversion: false,
        }
    }

    /// 新反应是否取消尚未执行的回归
    pub fn with_supersede_pending_reversion(mut self, supersede: bool) -> Self {
        self.supersede_pending_reversion = supersede;
        self
    }

    pub fn config(&self) -> &PetConfig {
        &self.config
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.state, PressState::Pressed { .. })
    }

    /// 尚未执行的回归数量
    pub fn pending_reversions(&self) -> usize {
        self.timers.len()
    }

    /// 是否有尚未完成的音频反应
    pub fn has_pending_audio(&self) -> bool {
        self.pending_audio.is_some()
    }

    // ── 指针 ──

    pub fn on_pointer_down(&mut self, event: &PointerEvent, surface: &mut dyn PetSurface) {
        if !event.is_primary() {
            return;
        }

        surface.set_pointer_capture(event.pointer_id);
        self.state = PressState::Pressed {
            pointer_id: event.pointer_id,
            start: (event.x, event.y),
            last: (event.x, event.y),
        };
    }

    /// 按下状态下移动：上一次记录的位置换算到模型空间作为拖拽目标
    pub fn on_pointer_move(
        &mut self,
        event: &PointerEvent,
        coords: &CoordTransform,
        model: &mut AnimationModel,
    ) {
        let PressState::Pressed { last, .. } = &mut self.state else {
            return;
        };

        let (x, y) = coords.device_to_model(last.0, last.1);
        model.on_drag(x, y);
        *last = (event.x, event.y);
    }

    /// 抬起指针：命中测试并选择反应
    ///
    /// 无音频反应在这里直接完成；音频反应返回 [`TapOutcome::Audio`]，
    /// 由调用方拉取音频。
    pub fn on_pointer_up(
        &mut self,
        event: &PointerEvent,
        surface: &mut dyn PetSurface,
        coords: &CoordTransform,
        model: &mut AnimationModel,
        now_ms: f64,
    ) -> TapOutcome {
        // 先退出按下状态，再判断按键
        self.state = PressState::Idle;
        if !event.is_primary() {
            return TapOutcome::Ignored;
        }

        surface.release_pointer_capture(event.pointer_id);
        model.on_drag(0.0, 0.0);

        let (x, y) = coords.device_to_model(event.x, event.y);

        let Some(region_index) = self
            .config
            .touch_list
            .iter()
            .position(|region| model.on_tap(region.drawable_id, x, y))
        else {
            return TapOutcome::Miss;
        };

        let region = &self.config.touch_list[region_index];
        let Some(entry) = select_reaction(&region.relationship, self.rng.as_mut()).cloned() else {
            debug!(drawable = region.drawable_id, "触摸区域没有配置反应");
            return TapOutcome::Miss;
        };

        info!(
            drawable = region.drawable_id,
            expression = %entry.expression_name,
            "触摸反应"
        );

        match entry.audio_name.as_deref().filter(|name| !name.is_empty()) {
            Some(audio_name) => TapOutcome::Audio {
                region: region_index,
                audio_path: audio_path(&self.pet_dir, audio_name),
                entry,
            },
            None => {
                self.apply_silent(&entry, model, now_ms);
                TapOutcome::Silent {
                    region: region_index,
                    expression: entry.expression_name,
                }
            }
        }
    }

    fn apply_silent(&mut self, entry: &ReactionEntry, model: &mut AnimationModel, now_ms: f64) {
        self.supersede_reversions();
        model.set_expression(&entry.expression_name);
        self.timers.schedule(
            now_ms,
            entry.delayed_ms,
            Reversion {
                expression: self.config.default_expression.clone(),
                caption: None,
            },
        );
    }

    /// 设置音频反应的音源，等待可播放事件
    ///
    /// 替换尚未完成的音频反应监听。
    pub fn bind_audio(
        &mut self,
        entry: ReactionEntry,
        bytes: Vec<u8>,
        audio: &mut dyn AudioPlayer,
    ) -> Result<(), DispatchError> {
        if self.pending_audio.is_some() {
            debug!("替换尚未完成的音频反应");
        }
        self.pending_audio = None;
        audio.set_source(bytes)?;
        self.supersede_reversions();
        self.pending_audio = Some(PendingAudio {
            entry,
            stage: AudioStage::AwaitCanPlay,
        });
        Ok(())
    }

    fn supersede_reversions(&mut self) {
        if self.supersede_pending_reversion && !self.timers.is_empty() {
            debug!(count = self.timers.len(), "取消尚未执行的回归");
            self.timers.clear();
        }
    }

    // ── 轮询 ──

    /// 处理音频事件与到期的回归
    pub fn poll(
        &mut self,
        now_ms: f64,
        model: &mut AnimationModel,
        audio: &mut dyn AudioPlayer,
        caption: &mut dyn CaptionSurface,
    ) {
        while let Some(event) = audio.poll_event() {
            self.handle_audio_event(event, now_ms, model, audio, caption);
        }

        for reversion in self.timers.drain_due(now_ms) {
            if let Some(id) = reversion.caption {
                caption.hide(id);
            }
            model.set_expression(&reversion.expression);
        }
    }

    fn handle_audio_event(
        &mut self,
        event: AudioEvent,
        now_ms: f64,
        model: &mut AnimationModel,
        audio: &mut dyn AudioPlayer,
        caption: &mut dyn CaptionSurface,
    ) {
        let Some(pending) = self.pending_audio.as_mut() else {
            debug!(?event, "没有等待中的音频反应");
            return;
        };

        match (event, &pending.stage) {
            (AudioEvent::CanPlay, AudioStage::AwaitCanPlay) => {
                // 播放失败时不显示字幕、不切换表情
                if let Err(e) = audio.play() {
                    warn!(error = %e, "反应音频无法播放");
                    self.pending_audio = None;
                    return;
                }
                let shown = pending.entry.caption().map(|text| caption.show(text));
                model.set_expression(&pending.entry.expression_name);
                pending.stage = AudioStage::AwaitEnded { caption: shown };
            }
            (AudioEvent::Ended, AudioStage::AwaitEnded { caption: shown }) => {
                let reversion = Reversion {
                    expression: self.config.default_expression.clone(),
                    caption: *shown,
                };
                let delay = pending.entry.delayed_ms;
                self.pending_audio = None;
                self.timers.schedule(now_ms, delay, reversion);
            }
            (event, stage) => {
                warn!(?event, ?stage, "忽略不匹配的音频事件");
            }
        }
    }

    /// 清除所有定时器与音频监听
    pub fn clear(&mut self) {
        self.timers.clear();
        self.pending_audio = None;
        self.state = PressState::Idle;
    }
}

impl std::fmt::Debug for InteractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionEngine")
            .field("pet_dir", &self.pet_dir)
            .field("state", &self.state)
            .field("pending_reversions", &self.timers.len())
            .field("pending_audio", &self.pending_audio.is_some())
            .finish()
    }
}
