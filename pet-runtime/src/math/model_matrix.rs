//! 模型放置矩阵
//!
//! 把模型画布坐标映射到视图空间。构造时按高度 2.0 等比缩放，
//! 之后可以用布局表（`width`、`center_x` 等）调整尺寸与位置。

use super::Matrix44;
use std::collections::HashMap;

/// 模型放置矩阵
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMatrix {
    matrix: Matrix44,
    width: f32,
    height: f32,
}

impl ModelMatrix {
    /// 根据模型画布尺寸创建，默认高度为 2.0
    pub fn new(width: f32, height: f32) -> Self {
        let mut model = Self {
            matrix: Matrix44::new(),
            width,
            height,
        };
        model.set_height(2.0);
        model
    }

    pub fn matrix(&self) -> &Matrix44 {
        &self.matrix
    }

    /// 模型画布宽度
    pub fn canvas_width(&self) -> f32 {
        self.width
    }

    /// 模型画布高度
    pub fn canvas_height(&self) -> f32 {
        self.height
    }

    /// 等比缩放到指定宽度
    pub fn set_width(&mut self, w: f32) {
        let scale = w / self.width;
        self.matrix.scale(scale, scale);
    }

    /// 等比缩放到指定高度
    pub fn set_height(&mut self, h: f32) {
        let scale = h / self.height;
        self.matrix.scale(scale, scale);
    }

    pub fn top(&mut self, y: f32) {
        self.set_y(y);
    }

    pub fn bottom(&mut self, y: f32) {
        let h = self.height * self.matrix.scale_y();
        self.matrix.set_translate_y(y - h);
    }

    pub fn left(&mut self, x: f32) {
        self.set_x(x);
    }

    pub fn right(&mut self, x: f32) {
        let w = self.width * self.matrix.scale_x();
        self.matrix.set_translate_x(x - w);
    }

    pub fn center_x(&mut self, x: f32) {
        let w = self.width * self.matrix.scale_x();
        self.matrix.set_translate_x(x - w / 2.0);
    }

    pub fn set_x(&mut self, x: f32) {
        self.matrix.set_translate_x(x);
    }

    pub fn center_y(&mut self, y: f32) {
        let h = self.height * self.matrix.scale_y();
        self.matrix.set_translate_y(y - h / 2.0);
    }

    pub fn set_y(&mut self, y: f32) {
        self.matrix.set_translate_y(y);
    }

    /// 应用布局表
    ///
    /// 先处理尺寸（`width`/`height`），再处理位置，
    /// 位置键依赖缩放后的尺寸。未知键忽略。
    pub fn setup_from_layout(&mut self, layout: &HashMap<String, f32>) {
        for (key, value) in layout {
            match key.as_str() {
                "width" => self.set_width(*value),
                "height" => self.set_height(*value),
                _ => {}
            }
        }

        for (key, value) in layout {
            match key.as_str() {
                "x" => self.set_x(*value),
                "y" => self.set_y(*value),
                "center_x" => self.center_x(*value),
                "center_y" => self.center_y(*value),
                "top" => self.top(*value),
                "bottom" => self.bottom(*value),
                "left" => self.left(*value),
                "right" => self.right(*value),
                _ => {}
            }
        }
    }
}
