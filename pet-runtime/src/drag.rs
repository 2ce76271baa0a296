//! # Drag 模块
//!
//! 拖拽目标点的平滑跟随。
//!
//! 写入的是目标位置，每帧以受限的速度与加速度向目标靠近，
//! 接近目标时减速，避免头部/眼球朝向突变。

/// 参考帧率
const FRAME_RATE: f32 = 30.0;
/// 视为已到达目标的距离
const EPSILON: f32 = 0.01;
/// 朝向参数每 100ms 最大变化量（40 / 10 秒）
const FACE_PARAM_MAX_V: f32 = 40.0 / 10.0;
/// 从静止加速到最大速度所需时间（秒）
const TIME_TO_MAX_SPEED: f32 = 0.15;

/// 拖拽跟随器
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragTracker {
    face_target_x: f32,
    face_target_y: f32,
    face_x: f32,
    face_y: f32,
    face_vx: f32,
    face_vy: f32,
    last_time_seconds: f32,
    user_time_seconds: f32,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置目标位置（通常在 `[-1, 1]` 范围内）
    pub fn set(&mut self, x: f32, y: f32) {
        self.face_target_x = x;
        self.face_target_y = y;
    }

    /// 当前平滑后的 X
    pub fn x(&self) -> f32 {
        self.face_x
    }

    /// 当前平滑后的 Y
    pub fn y(&self) -> f32 {
        self.face_y
    }

    /// 目标位置
    pub fn target(&self) -> (f32, f32) {
        (self.face_target_x, self.face_target_y)
    }

    /// 推进 `dt` 秒
    pub fn update(&mut self, dt: f32) {
        self.user_time_seconds += dt;

        let max_v = FACE_PARAM_MAX_V / FRAME_RATE;

        if self.last_time_seconds == 0.0 {
            self.last_time_seconds = self.user_time_seconds;
            return;
        }

        let delta_time_weight = (self.user_time_seconds - self.last_time_seconds) * FRAME_RATE;
        self.last_time_seconds = self.user_time_seconds;

        let frame_to_max_speed = TIME_TO_MAX_SPEED * FRAME_RATE;
        let max_a = delta_time_weight * max_v / frame_to_max_speed;

        let dx = self.face_target_x - self.face_x;
        let dy = self.face_target_y - self.face_y;

        if dx.abs() <= EPSILON && dy.abs() <= EPSILON {
            return;
        }

        let d = (dx * dx + dy * dy).sqrt();
        let vx = max_v * dx / d;
        let vy = max_v * dy / d;

        let mut ax = vx - self.face_vx;
        let mut ay = vy - self.face_vy;
        let a = (ax * ax + ay * ay).sqrt();

        if a > max_a {
            ax *= max_a / a;
            ay *= max_a / a;
        }

        self.face_vx += ax;
        self.face_vy += ay;

        // 按剩余距离限制速度，保证能在目标处停住
        let braking_v = 0.5 * ((max_a * max_a + 16.0 * max_a * d - 8.0 * max_a * d).sqrt() - max_a);
        let current_v = (self.face_vx * self.face_vx + self.face_vy * self.face_vy).sqrt();
        if current_v > braking_v {
            self.face_vx *= braking_v / current_v;
            self.face_vy *= braking_v / current_v;
        }

        self.face_x += self.face_vx;
        self.face_y += self.face_vy;
    }
}
