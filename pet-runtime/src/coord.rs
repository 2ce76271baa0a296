//! # Coord 模块
//!
//! 设备像素 ↔ 逻辑屏幕 ↔ 模型视图空间的坐标转换。
//!
//! 画布的物理像素尺寸 = 逻辑尺寸 × 设备像素比 × 超采样倍率。
//! 指针事件给出的是逻辑坐标，转换前需要先乘回物理像素。
//!
//! 屏幕空间以画布中心为原点，Y 轴向上，较窄的一边映射到 `[-1, 1]`。

use crate::math::{Matrix44, ScreenRect, ViewMatrix};

/// 视图最大缩放倍率
pub const VIEW_MAX_SCALE: f32 = 2.0;
/// 视图最小缩放倍率
pub const VIEW_MIN_SCALE: f32 = 1.0;
/// 视图最大可视矩形
pub const VIEW_MAX_RECT: ScreenRect = ScreenRect {
    left: -2.0,
    right: 2.0,
    bottom: -2.0,
    top: 2.0,
};

/// 默认超采样倍率
///
/// 部分模型在原生分辨率下略显模糊，画布按此倍率放大绘制。
pub const DEFAULT_PHYSICAL_SCALE: f32 = 1.25;

/// 绘制表面尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    /// 逻辑宽度（CSS 像素 / 窗口逻辑像素）
    pub logical_width: f32,
    /// 逻辑高度
    pub logical_height: f32,
    /// 设备像素比
    pub device_pixel_ratio: f32,
    /// 超采样倍率
    pub physical_scale: f32,
}

impl SurfaceSize {
    pub fn new(logical_width: f32, logical_height: f32) -> Self {
        Self {
            logical_width,
            logical_height,
            device_pixel_ratio: 1.0,
            physical_scale: 1.0,
        }
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn with_physical_scale(mut self, scale: f32) -> Self {
        self.physical_scale = scale;
        self
    }

    /// 逻辑坐标到物理像素的倍率
    pub fn pixel_scale(&self) -> f32 {
        self.device_pixel_ratio * self.physical_scale
    }

    /// 物理像素宽度
    pub fn physical_width(&self) -> f32 {
        (self.logical_width * self.pixel_scale()).floor()
    }

    /// 物理像素高度
    pub fn physical_height(&self) -> f32 {
        (self.logical_height * self.pixel_scale()).floor()
    }

    /// 尺寸是否可用于绘制
    pub fn is_drawable(&self) -> bool {
        self.physical_width() >= 1.0 && self.physical_height() >= 1.0
    }
}

/// 坐标转换器
///
/// 尺寸变化后需要重新构建。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordTransform {
    surface: SurfaceSize,
    device_to_screen: Matrix44,
    view: ViewMatrix,
}

impl CoordTransform {
    pub fn new(surface: SurfaceSize) -> Self {
        let width = surface.physical_width();
        let height = surface.physical_height();
        let ratio = width / height;
        let left = -ratio;
        let right = ratio;
        let bottom = -1.0;
        let top = 1.0;

        let mut view = ViewMatrix::new();
        view.set_screen_rect(ScreenRect::new(left, right, bottom, top));
        view.matrix_mut().scale(1.0, 1.0);
        view.set_max_scale(VIEW_MAX_SCALE);
        view.set_min_scale(VIEW_MIN_SCALE);
        view.set_max_screen_rect(VIEW_MAX_RECT);

        let mut device_to_screen = Matrix44::new();
        if width > height {
            let screen_w = (right - left).abs();
            device_to_screen.scale_relative(screen_w / width, -screen_w / width);
        } else {
            let screen_h = (top - bottom).abs();
            device_to_screen.scale_relative(screen_h / height, -screen_h / height);
        }
        device_to_screen.translate_relative(-width * 0.5, -height * 0.5);

        Self {
            surface,
            device_to_screen,
            view,
        }
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn view(&self) -> &ViewMatrix {
        &self.view
    }

    /// 逻辑坐标换算为物理像素
    pub fn to_physical(&self, x: f32, y: f32) -> (f32, f32) {
        let scale = self.surface.pixel_scale();
        (x * scale, y * scale)
    }

    /// 物理像素 → 屏幕空间（不经过视图矩阵）
    pub fn device_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.device_to_screen.transform_x(x),
            self.device_to_screen.transform_y(y),
        )
    }

    /// 逻辑坐标 → 模型视图空间
    pub fn device_to_model(&self, x: f32, y: f32) -> (f32, f32) {
        let (px, py) = self.to_physical(x, y);
        let (sx, sy) = self.device_to_screen(px, py);
        (
            self.view.invert_transform_x(sx),
            self.view.invert_transform_y(sy),
        )
    }

    /// 模型视图空间 → 逻辑坐标（[`Self::device_to_model`] 的逆）
    pub fn model_to_device(&self, x: f32, y: f32) -> (f32, f32) {
        let sx = self.view.transform_x(x);
        let sy = self.view.transform_y(y);
        let px = self.device_to_screen.invert_transform_x(sx);
        let py = self.device_to_screen.invert_transform_y(sy);
        let scale = self.surface.pixel_scale();
        (px / scale, py / scale)
    }
}
