//! # Math 模块
//!
//! 动画模型使用的 2D 仿射矩阵：通用 4x4 矩阵、视图矩阵和模型放置矩阵。

mod matrix;
mod model_matrix;
mod view;

pub use matrix::Matrix44;
pub use model_matrix::ModelMatrix;
pub use view::{ScreenRect, ViewMatrix};
