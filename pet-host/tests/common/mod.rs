//! 集成测试共用的替身与夹具
//!
//! 替身都把调用记录到共享的日志里，测试在把替身交给运行时之后
//! 仍可以通过日志断言发生了什么。

#![allow(dead_code)]

use pet_host::engine::{
    AnimationEngine, BreathParameter, EngineError, ExpressionHandle, MotionConfig,
    MotionFinished, MotionHandle, MotionPriority, MotionQueueHandle, TextureImage, Viewport,
};
use pet_host::{
    AudioError, AudioEvent, AudioPlayer, CaptionId, CaptionSurface, FrameRequest, MemorySource,
    PetParams, PetRuntime, PetSurface, RuntimeOptions, SourceProvider,
};
use pet_runtime::{ManualTimeSource, Matrix44, RandomSource, ScriptedRandom, SurfaceSize};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::rc::Rc;
use std::sync::Arc;

pub const PET_DIR: &str = "hiyori";
pub const LIVE2D_FOLDER: &str = "live2d";
pub const MODEL_JSON: &str = "hiyori.model3.json";

// ── 动画引擎 ──

/// 模型视图空间中的矩形命中区域
#[derive(Debug, Clone, Copy)]
pub struct HitRect {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl HitRect {
    pub const ALL: HitRect = HitRect {
        left: -10.0,
        right: 10.0,
        bottom: -10.0,
        top: 10.0,
    };
    pub const UPPER: HitRect = HitRect {
        left: -10.0,
        right: 10.0,
        bottom: 0.0,
        top: 10.0,
    };
    pub const LOWER: HitRect = HitRect {
        left: -10.0,
        right: 10.0,
        bottom: -10.0,
        top: 0.0,
    };

    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

#[derive(Default)]
pub struct EngineLog {
    /// 按顺序记录的调用（每帧更新顺序断言用）
    pub calls: Vec<String>,
    pub model_loaded: bool,
    pub expressions: HashMap<u64, String>,
    pub expression_fades: HashMap<u64, (Option<f32>, Option<f32>)>,
    pub released_expressions: Vec<u64>,
    pub motions: HashMap<u64, String>,
    pub motion_configs: HashMap<u64, MotionConfig>,
    pub released_motions: Vec<u64>,
    pub finished_callbacks: HashMap<u64, bool>,
    pub started_motions: Vec<String>,
    pub physics_loaded: bool,
    pub pose_loaded: bool,
    pub user_data_loaded: bool,
    pub eye_blink_ids: Option<Vec<String>>,
    pub breath: Option<Vec<BreathParameter>>,
    pub parameters: Vec<(String, f32, f32)>,
    pub current_expression: Option<String>,
    pub expression_history: Vec<String>,
    pub part_opacity: Vec<(String, f32)>,
    pub parts: Vec<String>,
    pub drawables: Vec<(String, HitRect)>,
    pub hit_tests: Vec<String>,
    pub canvas: (f32, f32),
    pub renderer: bool,
    pub renderers_created: usize,
    pub textures: Vec<(usize, (u32, u32))>,
    pub draws: usize,
    pub disposed: bool,
    /// 预约是否成功
    pub allow_reserve: bool,
    /// 解析失败的表情名
    pub fail_expression: Option<String>,
    pub motion_finished: bool,
}

pub struct FakeEngine {
    log: Rc<RefCell<EngineLog>>,
    next_handle: u64,
    next_queue: i64,
    callbacks: HashMap<u64, MotionFinished>,
}

impl FakeEngine {
    pub fn new() -> (Self, Rc<RefCell<EngineLog>>) {
        let log = Rc::new(RefCell::new(EngineLog {
            canvas: (1.0, 1.0),
            allow_reserve: true,
            motion_finished: true,
            parts: vec!["PartArmA".to_string(), "PartArmB".to_string()],
            drawables: vec![
                ("ArtMesh_Head".to_string(), HitRect::UPPER),
                ("ArtMesh_Body".to_string(), HitRect::LOWER),
                ("ArtMesh_All".to_string(), HitRect::ALL),
            ],
            ..EngineLog::default()
        }));
        (
            Self {
                log: Rc::clone(&log),
                next_handle: 1,
                next_queue: 0,
                callbacks: HashMap::new(),
            },
            log,
        )
    }

    fn handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn call(&self, name: &str) {
        self.log.borrow_mut().calls.push(name.to_string());
    }
}

impl AnimationEngine for FakeEngine {
    fn load_model(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::ParseFailed {
                kind: "moc".to_string(),
                name: String::new(),
                message: "empty".to_string(),
            });
        }
        self.log.borrow_mut().model_loaded = true;
        Ok(())
    }

    fn load_expression(&mut self, name: &str, _bytes: &[u8]) -> Result<ExpressionHandle, EngineError> {
        if self.log.borrow().fail_expression.as_deref() == Some(name) {
            return Err(EngineError::ParseFailed {
                kind: "expression".to_string(),
                name: name.to_string(),
                message: "broken".to_string(),
            });
        }
        let handle = self.handle();
        self.log.borrow_mut().expressions.insert(handle, name.to_string());
        Ok(ExpressionHandle(handle))
    }

    fn configure_expression(
        &mut self,
        handle: ExpressionHandle,
        fade_in: Option<f32>,
        fade_out: Option<f32>,
    ) {
        self.log
            .borrow_mut()
            .expression_fades
            .insert(handle.0, (fade_in, fade_out));
    }

    fn release_expression(&mut self, handle: ExpressionHandle) {
        let mut log = self.log.borrow_mut();
        log.expressions.remove(&handle.0);
        log.released_expressions.push(handle.0);
    }

    fn load_motion(&mut self, name: &str, _bytes: &[u8]) -> Result<MotionHandle, EngineError> {
        let handle = self.handle();
        self.log.borrow_mut().motions.insert(handle, name.to_string());
        Ok(MotionHandle(handle))
    }

    fn configure_motion(&mut self, handle: MotionHandle, config: &MotionConfig) {
        self.log
            .borrow_mut()
            .motion_configs
            .insert(handle.0, config.clone());
    }

    fn set_motion_finished(&mut self, handle: MotionHandle, callback: Option<MotionFinished>) {
        self.log
            .borrow_mut()
            .finished_callbacks
            .insert(handle.0, callback.is_some());
        match callback {
            Some(callback) => {
                self.callbacks.insert(handle.0, callback);
            }
            None => {
                self.callbacks.remove(&handle.0);
            }
        }
    }

    fn release_motion(&mut self, handle: MotionHandle) {
        self.callbacks.remove(&handle.0);
        let mut log = self.log.borrow_mut();
        log.motions.remove(&handle.0);
        log.released_motions.push(handle.0);
    }

    fn load_physics(&mut self, _bytes: &[u8]) -> Result<(), EngineError> {
        self.log.borrow_mut().physics_loaded = true;
        Ok(())
    }

    fn load_pose(&mut self, _bytes: &[u8]) -> Result<(), EngineError> {
        self.log.borrow_mut().pose_loaded = true;
        Ok(())
    }

    fn load_user_data(&mut self, _bytes: &[u8]) -> Result<(), EngineError> {
        self.log.borrow_mut().user_data_loaded = true;
        Ok(())
    }

    fn create_eye_blink(&mut self, parameter_ids: &[String]) {
        self.log.borrow_mut().eye_blink_ids = Some(parameter_ids.to_vec());
    }

    fn create_breath(&mut self, parameters: &[BreathParameter]) {
        self.log.borrow_mut().breath = Some(parameters.to_vec());
    }

    fn load_parameters(&mut self) {
        self.call("load_parameters");
    }

    fn save_parameters(&mut self) {
        self.call("save_parameters");
    }

    fn add_parameter_value(&mut self, parameter_id: &str, value: f32, weight: f32) {
        self.call(&format!("add:{}", parameter_id));
        self.log
            .borrow_mut()
            .parameters
            .push((parameter_id.to_string(), value, weight));
    }

    fn commit_parameters(&mut self) {
        self.call("commit_parameters");
    }

    fn is_motion_finished(&self) -> bool {
        self.log.borrow().motion_finished
    }

    fn update_motion(&mut self, _dt: f32) -> bool {
        self.call("update_motion");
        true
    }

    fn update_eye_blink(&mut self, _dt: f32) {
        self.call("update_eye_blink");
    }

    fn update_expression(&mut self, _dt: f32) {
        self.call("update_expression");
    }

    fn update_breath(&mut self, _dt: f32) {
        self.call("update_breath");
    }

    fn evaluate_physics(&mut self, _dt: f32) {
        self.call("evaluate_physics");
    }

    fn update_pose(&mut self, _dt: f32) {
        self.call("update_pose");
    }

    fn canvas_size(&self) -> (f32, f32) {
        self.log.borrow().canvas
    }

    fn drawable_id(&self, index: usize) -> Option<String> {
        self.log
            .borrow()
            .drawables
            .get(index)
            .map(|(id, _)| id.clone())
    }

    fn hit_test(&self, drawable_id: &str, x: f32, y: f32) -> bool {
        let mut log = self.log.borrow_mut();
        log.hit_tests.push(drawable_id.to_string());
        log.drawables
            .iter()
            .find(|(id, _)| id == drawable_id)
            .is_some_and(|(_, rect)| rect.contains(x, y))
    }

    fn set_part_opacity(&mut self, part_id: &str, opacity: f32) -> bool {
        let mut log = self.log.borrow_mut();
        if !log.parts.iter().any(|part| part == part_id) {
            return false;
        }
        log.part_opacity.push((part_id.to_string(), opacity));
        true
    }

    fn set_expression(&mut self, handle: ExpressionHandle) {
        let mut log = self.log.borrow_mut();
        if let Some(name) = log.expressions.get(&handle.0).cloned() {
            log.current_expression = Some(name.clone());
            log.expression_history.push(name);
        }
    }

    fn reserve_motion(&mut self, _priority: MotionPriority) -> bool {
        self.log.borrow().allow_reserve
    }

    fn start_motion(&mut self, handle: MotionHandle, _priority: MotionPriority) -> MotionQueueHandle {
        let name = self
            .log
            .borrow()
            .motions
            .get(&handle.0)
            .cloned()
            .unwrap_or_default();
        self.log.borrow_mut().started_motions.push(name);
        let queue = self.next_queue;
        self.next_queue += 1;
        MotionQueueHandle(queue)
    }

    fn stop_all_motions(&mut self) {
        self.call("stop_all_motions");
    }

    fn create_renderer(&mut self) -> Result<(), EngineError> {
        let mut log = self.log.borrow_mut();
        log.renderer = true;
        log.renderers_created += 1;
        log.textures.clear();
        Ok(())
    }

    fn delete_renderer(&mut self) {
        self.log.borrow_mut().renderer = false;
    }

    fn bind_texture(&mut self, unit: usize, texture: &TextureImage) -> Result<(), EngineError> {
        self.log
            .borrow_mut()
            .textures
            .push((unit, (texture.width(), texture.height())));
        Ok(())
    }

    fn draw(&mut self, _mvp: &Matrix44, _viewport: Viewport) {
        self.log.borrow_mut().draws += 1;
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed = true;
    }
}

// ── 绘制表面 ──

#[derive(Debug)]
pub struct SurfaceLog {
    pub size: SurfaceSize,
    pub captured: Vec<u64>,
    pub released: Vec<u64>,
    pub frames_requested: u64,
    pub frames_cancelled: Vec<FrameRequest>,
    pub removed: bool,
}

pub struct FakeSurface {
    log: Rc<RefCell<SurfaceLog>>,
}

impl FakeSurface {
    pub fn new(width: f32, height: f32) -> (Self, Rc<RefCell<SurfaceLog>>) {
        let log = Rc::new(RefCell::new(SurfaceLog {
            size: SurfaceSize::new(width, height),
            captured: Vec::new(),
            released: Vec::new(),
            frames_requested: 0,
            frames_cancelled: Vec::new(),
            removed: false,
        }));
        (
            Self {
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl PetSurface for FakeSurface {
    fn size(&self) -> SurfaceSize {
        self.log.borrow().size
    }

    fn set_pointer_capture(&mut self, pointer_id: u64) {
        self.log.borrow_mut().captured.push(pointer_id);
    }

    fn release_pointer_capture(&mut self, pointer_id: u64) {
        self.log.borrow_mut().released.push(pointer_id);
    }

    fn request_frame(&mut self) -> FrameRequest {
        let mut log = self.log.borrow_mut();
        log.frames_requested += 1;
        FrameRequest(log.frames_requested)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.log.borrow_mut().frames_cancelled.push(request);
    }

    fn remove(&mut self) {
        self.log.borrow_mut().removed = true;
    }
}

// ── 音频 ──

#[derive(Debug, Default)]
pub struct AudioLog {
    pub sources: Vec<Vec<u8>>,
    pub plays: usize,
    pub stops: usize,
    pub volume: f32,
    /// 由测试推入的事件
    pub events: VecDeque<AudioEvent>,
    /// 下一次 set_source 是否失败
    pub fail_decode: bool,
    /// play 是否失败（输出设备不可用）
    pub fail_play: bool,
}

pub struct FakeAudio {
    log: Rc<RefCell<AudioLog>>,
}

impl FakeAudio {
    pub fn new() -> (Self, Rc<RefCell<AudioLog>>) {
        let log = Rc::new(RefCell::new(AudioLog {
            volume: 1.0,
            ..AudioLog::default()
        }));
        (
            Self {
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl AudioPlayer for FakeAudio {
    fn set_source(&mut self, bytes: Vec<u8>) -> Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        if log.fail_decode {
            return Err(AudioError::Decode("unsupported".to_string()));
        }
        log.sources.push(bytes);
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        if log.fail_play {
            return Err(AudioError::Output("no device".to_string()));
        }
        log.plays += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stops += 1;
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.borrow_mut().volume = volume;
    }

    fn volume(&self) -> f32 {
        self.log.borrow().volume
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        self.log.borrow_mut().events.pop_front()
    }
}

// ── 字幕 ──

#[derive(Debug, Default)]
pub struct CaptionLog {
    pub shown: Vec<(CaptionId, String)>,
    pub hidden: Vec<CaptionId>,
    pub current: Option<CaptionId>,
    pub cleared: bool,
}

pub struct FakeCaption {
    log: Rc<RefCell<CaptionLog>>,
    next_id: u64,
}

impl FakeCaption {
    pub fn new() -> (Self, Rc<RefCell<CaptionLog>>) {
        let log = Rc::new(RefCell::new(CaptionLog::default()));
        (
            Self {
                log: Rc::clone(&log),
                next_id: 0,
            },
            log,
        )
    }
}

impl CaptionSurface for FakeCaption {
    fn show(&mut self, text: &str) -> CaptionId {
        let id = CaptionId(self.next_id);
        self.next_id += 1;
        let mut log = self.log.borrow_mut();
        log.shown.push((id, text.to_string()));
        log.current = Some(id);
        id
    }

    fn hide(&mut self, id: CaptionId) {
        let mut log = self.log.borrow_mut();
        log.hidden.push(id);
        if log.current == Some(id) {
            log.current = None;
        }
    }

    fn clear(&mut self) {
        let mut log = self.log.borrow_mut();
        log.current = None;
        log.cleared = true;
    }
}

// ── 夹具 ──

/// 编码一张纯色 PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

/// 默认宠物配置
///
/// - 区域 0（上半身）：单个无音频反应 `smile`，延时 200ms
/// - 区域 1（下半身）：带音频和字幕的反应 `shy`，延时 100ms
pub fn default_config() -> Value {
    json!({
        "defaultExpression": "normal",
        "shieldPartList": ["PartArmB"],
        "touchList": [
            {
                "drawableId": 0,
                "drawableName": "ArtMesh_Head",
                "relationship": [
                    { "type": "Expression", "expressionName": "smile", "audioName": null, "text": null, "delayed": 200 }
                ]
            },
            {
                "drawableId": 1,
                "drawableName": "ArtMesh_Body",
                "relationship": [
                    { "type": "Expression", "expressionName": "shy", "audioName": "a.mp3", "text": "Hi", "delayed": 100 }
                ]
            }
        ]
    })
}

/// 默认模型设定
pub fn default_settings() -> Value {
    json!({
        "Version": 3,
        "FileReferences": {
            "Moc": "hiyori.moc3",
            "Textures": ["textures/texture_00.png", "", "textures/texture_02.png"],
            "Physics": "hiyori.physics3.json",
            "Expressions": [
                { "Name": "normal", "File": "exp/normal.exp3.json" },
                { "Name": "smile", "File": "exp/smile.exp3.json", "FadeInTime": 0.3 },
                { "Name": "shy", "File": "exp/shy.exp3.json" },
                { "Name": "angry", "File": "exp/angry.exp3.json" }
            ],
            "Motions": {
                "Idle": [
                    { "File": "motion/idle_0.motion3.json", "FadeInTime": 0.5, "FadeOutTime": -1.0 },
                    { "File": "motion/idle_1.motion3.json" }
                ],
                "TapBody": [
                    { "File": "motion/tap_0.motion3.json" }
                ]
            }
        },
        "Groups": [
            { "Target": "Parameter", "Name": "EyeBlink", "Ids": ["ParamEyeLOpen", "ParamEyeROpen"] },
            { "Target": "Parameter", "Name": "LipSync", "Ids": ["ParamMouthOpenY"] }
        ],
        "Layout": { "width": 2.0, "center_x": 0.0 }
    })
}

/// 内存中的宠物目录
pub struct PetFixture {
    pub source: MemorySource,
}

impl PetFixture {
    pub fn new() -> Self {
        Self::with(default_config(), default_settings())
    }

    pub fn with(config: Value, settings: Value) -> Self {
        let source = MemorySource::new();
        let home = format!("{}/{}", PET_DIR, LIVE2D_FOLDER);

        source.insert(
            &format!("{}/config_pet.json", PET_DIR),
            serde_json::to_vec(&config).expect("config json"),
        );
        source.insert(
            &format!("{}/{}", home, MODEL_JSON),
            serde_json::to_vec(&settings).expect("settings json"),
        );
        source.insert(&format!("{}/hiyori.moc3", home), b"moc3".to_vec());
        source.insert(&format!("{}/hiyori.physics3.json", home), b"{}".to_vec());
        for name in ["normal", "smile", "shy", "angry"] {
            source.insert(&format!("{}/exp/{}.exp3.json", home, name), b"{}".to_vec());
        }
        for file in ["idle_0", "idle_1", "tap_0"] {
            source.insert(&format!("{}/motion/{}.motion3.json", home, file), b"{}".to_vec());
        }
        source.insert(&format!("{}/textures/texture_00.png", home), png_bytes(8, 8));
        source.insert(&format!("{}/textures/texture_02.png", home), png_bytes(4, 2));
        source.insert(&format!("{}/audio/a.mp3", PET_DIR), b"ID3 fake mp3".to_vec());

        Self { source }
    }

    pub fn model_path(file: &str) -> String {
        format!("{}/{}/{}", PET_DIR, LIVE2D_FOLDER, file)
    }

    pub fn provider(self) -> Arc<SourceProvider> {
        Arc::new(SourceProvider::new(self.source))
    }
}

pub fn params() -> PetParams {
    PetParams {
        pet_dir: PET_DIR.to_string(),
        live2d_folder: LIVE2D_FOLDER.to_string(),
        model_json_name: MODEL_JSON.to_string(),
    }
}

/// 组装好的运行时与全部替身日志
pub struct Harness {
    pub runtime: PetRuntime<SourceProvider>,
    pub engine: Rc<RefCell<EngineLog>>,
    pub surface: Rc<RefCell<SurfaceLog>>,
    pub audio: Rc<RefCell<AudioLog>>,
    pub caption: Rc<RefCell<CaptionLog>>,
    pub time: ManualTimeSource,
}

impl Harness {
    pub fn new(fixture: PetFixture) -> Self {
        Self::with_options(fixture, RuntimeOptions::default(), Box::new(ScriptedRandom::new([])))
    }

    pub fn with_options(
        fixture: PetFixture,
        options: RuntimeOptions,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let (engine, engine_log) = FakeEngine::new();
        let (surface, surface_log) = FakeSurface::new(200.0, 200.0);
        let (audio, audio_log) = FakeAudio::new();
        let (caption, caption_log) = FakeCaption::new();
        let time = ManualTimeSource::new();

        let runtime = PetRuntime::new(
            params(),
            fixture.provider(),
            Box::new(engine),
            Box::new(surface),
            Box::new(audio),
        )
        .with_options(options)
        .with_caption(Box::new(caption))
        .with_time_source(Rc::new(time.clone()))
        .with_random_source(rng);

        Self {
            runtime,
            engine: engine_log,
            surface: surface_log,
            audio: audio_log,
            caption: caption_log,
            time,
        }
    }

    /// 推进时间并执行一帧
    pub fn advance(&mut self, ms: f64) {
        self.time.advance(ms);
        self.runtime.tick();
    }

    pub fn current_expression(&self) -> Option<String> {
        self.engine.borrow().current_expression.clone()
    }

    /// 模型空间点对应的逻辑坐标
    pub fn device_point(&self, x: f32, y: f32) -> (f32, f32) {
        self.runtime.coords().model_to_device(x, y)
    }
}
