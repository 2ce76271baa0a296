//! # Surface 模块
//!
//! 宠物的绘制表面：尺寸、指针捕获、逐帧调度与移除。
//!
//! 宿主窗口负责实现 [`PetSurface`]，并把指针事件转换为 [`PointerEvent`]。

use pet_runtime::SurfaceSize;

/// 指针按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// 主键（通常为左键）
    Primary,
    Secondary,
    Middle,
    Other(u16),
}

/// 指针事件
///
/// 坐标为相对绘制表面左上角的逻辑像素。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u64,
    pub button: PointerButton,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    /// 主键事件
    pub fn primary(pointer_id: u64, x: f32, y: f32) -> Self {
        Self {
            pointer_id,
            button: PointerButton::Primary,
            x,
            y,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.button == PointerButton::Primary
    }
}

/// 帧请求句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// 绘制表面
pub trait PetSurface {
    /// 当前尺寸
    fn size(&self) -> SurfaceSize;

    /// 捕获指针，后续事件即使移出表面也会送达
    fn set_pointer_capture(&mut self, pointer_id: u64);

    /// 释放指针捕获
    fn release_pointer_capture(&mut self, pointer_id: u64);

    /// 请求下一帧，宿主在下一帧到来时调用运行时的 `tick`
    fn request_frame(&mut self) -> FrameRequest;

    /// 取消尚未执行的帧请求
    fn cancel_frame(&mut self, request: FrameRequest);

    /// 移除表面（画布、音频元素等）
    fn remove(&mut self);
}
