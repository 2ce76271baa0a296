//! 4x4 变换矩阵
//!
//! 列主序存储（下标 12/13 为平移），只用到缩放和平移两种 2D 仿射变换。
//! "relative" 系列操作把新变换作用在已有变换之前：
//! 点先经过新变换，再经过原有变换。

/// 4x4 矩阵
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix44 {
    tr: [f32; 16],
}

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

impl Default for Matrix44 {
    fn default() -> Self {
        Self::new()
    }
}

impl Matrix44 {
    /// 单位矩阵
    pub fn new() -> Self {
        Self { tr: IDENTITY }
    }

    /// 重置为单位矩阵
    pub fn load_identity(&mut self) {
        self.tr = IDENTITY;
    }

    /// 矩阵数组（提交给渲染器）
    pub fn as_array(&self) -> &[f32; 16] {
        &self.tr
    }

    /// `a` 与 `b` 相乘：结果先应用 `a` 再应用 `b`
    pub fn multiply(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
        let mut c = [0.0f32; 16];
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[k + i * 4] * b[j + k * 4];
                }
                c[j + i * 4] = sum;
            }
        }
        c
    }

    pub fn scale_x(&self) -> f32 {
        self.tr[0]
    }

    pub fn scale_y(&self) -> f32 {
        self.tr[5]
    }

    pub fn translate_x(&self) -> f32 {
        self.tr[12]
    }

    pub fn translate_y(&self) -> f32 {
        self.tr[13]
    }

    /// 变换 X 坐标
    pub fn transform_x(&self, src: f32) -> f32 {
        self.tr[0] * src + self.tr[12]
    }

    /// 变换 Y 坐标
    pub fn transform_y(&self, src: f32) -> f32 {
        self.tr[5] * src + self.tr[13]
    }

    /// 逆变换 X 坐标
    pub fn invert_transform_x(&self, src: f32) -> f32 {
        (src - self.tr[12]) / self.tr[0]
    }

    /// 逆变换 Y 坐标
    pub fn invert_transform_y(&self, src: f32) -> f32 {
        (src - self.tr[13]) / self.tr[5]
    }

    /// 在当前变换前追加平移
    pub fn translate_relative(&mut self, x: f32, y: f32) {
        let mut t = IDENTITY;
        t[12] = x;
        t[13] = y;
        self.tr = Self::multiply(&t, &self.tr);
    }

    /// 直接设置平移量
    pub fn translate(&mut self, x: f32, y: f32) {
        self.tr[12] = x;
        self.tr[13] = y;
    }

    /// 直接设置 X 平移量
    pub fn set_translate_x(&mut self, x: f32) {
        self.tr[12] = x;
    }

    /// 直接设置 Y 平移量
    pub fn set_translate_y(&mut self, y: f32) {
        self.tr[13] = y;
    }

    /// 在当前变换前追加缩放
    pub fn scale_relative(&mut self, x: f32, y: f32) {
        let mut t = IDENTITY;
        t[0] = x;
        t[5] = y;
        self.tr = Self::multiply(&t, &self.tr);
    }

    /// 直接设置缩放量
    pub fn scale(&mut self, x: f32, y: f32) {
        self.tr[0] = x;
        self.tr[5] = y;
    }

    /// 在当前变换前追加另一个矩阵（点先经过 `m`）
    pub fn multiply_by(&mut self, m: &Matrix44) {
        self.tr = Self::multiply(&m.tr, &self.tr);
    }
}
