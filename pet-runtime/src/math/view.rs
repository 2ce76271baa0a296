//! 视图矩阵
//!
//! 在 [`Matrix44`] 之上增加屏幕矩形、最大可视矩形以及缩放范围，
//! 用于平移/缩放时的范围限制。

use super::Matrix44;

/// 矩形范围（左、右、下、上）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl ScreenRect {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }
}

/// 视图矩阵
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewMatrix {
    matrix: Matrix44,
    screen: ScreenRect,
    max_screen: ScreenRect,
    max_scale: f32,
    min_scale: f32,
}

impl Default for ViewMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewMatrix {
    pub fn new() -> Self {
        Self {
            matrix: Matrix44::new(),
            screen: ScreenRect::default(),
            max_screen: ScreenRect::default(),
            max_scale: 1.0,
            min_scale: 1.0,
        }
    }

    /// 底层矩阵
    pub fn matrix(&self) -> &Matrix44 {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut Matrix44 {
        &mut self.matrix
    }

    pub fn set_screen_rect(&mut self, rect: ScreenRect) {
        self.screen = rect;
    }

    pub fn set_max_screen_rect(&mut self, rect: ScreenRect) {
        self.max_screen = rect;
    }

    pub fn set_max_scale(&mut self, scale: f32) {
        self.max_scale = scale;
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn set_min_scale(&mut self, scale: f32) {
        self.min_scale = scale;
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn is_max_scale(&self) -> bool {
        self.matrix.scale_x() >= self.max_scale
    }

    pub fn is_min_scale(&self) -> bool {
        self.matrix.scale_x() <= self.min_scale
    }

    pub fn invert_transform_x(&self, src: f32) -> f32 {
        self.matrix.invert_transform_x(src)
    }

    pub fn invert_transform_y(&self, src: f32) -> f32 {
        self.matrix.invert_transform_y(src)
    }

    pub fn transform_x(&self, src: f32) -> f32 {
        self.matrix.transform_x(src)
    }

    pub fn transform_y(&self, src: f32) -> f32 {
        self.matrix.transform_y(src)
    }

    /// 平移视图，保证最大可视矩形始终覆盖屏幕矩形
    pub fn adjust_translate(&mut self, mut x: f32, mut y: f32) {
        let sx = self.matrix.scale_x();
        let sy = self.matrix.scale_y();
        let tx = self.matrix.translate_x();
        let ty = self.matrix.translate_y();

        if sx * self.max_screen.left + (tx + x) > self.screen.left {
            x = self.screen.left - sx * self.max_screen.left - tx;
        }
        if sx * self.max_screen.right + (tx + x) < self.screen.right {
            x = self.screen.right - sx * self.max_screen.right - tx;
        }
        if sy * self.max_screen.top + (ty + y) < self.screen.top {
            y = self.screen.top - sy * self.max_screen.top - ty;
        }
        if sy * self.max_screen.bottom + (ty + y) > self.screen.bottom {
            y = self.screen.bottom - sy * self.max_screen.bottom - ty;
        }

        let mut t = Matrix44::new();
        t.translate(x, y);
        self.matrix.multiply_by(&t);
    }

    /// 以 `(cx, cy)` 为中心缩放，目标倍率限制在 `[min_scale, max_scale]`
    pub fn adjust_scale(&mut self, cx: f32, cy: f32, mut scale: f32) {
        let current = self.matrix.scale_x();
        let target = scale * current;

        if target < self.min_scale {
            if current > 0.0 {
                scale = self.min_scale / current;
            }
        } else if target > self.max_scale && current > 0.0 {
            scale = self.max_scale / current;
        }

        let mut to_origin = Matrix44::new();
        to_origin.translate(-cx, -cy);
        let mut zoom = Matrix44::new();
        zoom.scale(scale, scale);
        let mut back = Matrix44::new();
        back.translate(cx, cy);

        self.matrix.multiply_by(&to_origin);
        self.matrix.multiply_by(&zoom);
        self.matrix.multiply_by(&back);
    }
}
