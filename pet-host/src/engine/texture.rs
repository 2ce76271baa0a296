//! 纹理解码
//!
//! 解码为 RGBA8，预乘 alpha，并生成完整的 mipmap 链（逐级减半到 1x1）。

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba, RgbaImage};

/// 单级 mipmap
#[derive(Debug, Clone, PartialEq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    /// RGBA8，预乘 alpha
    pub pixels: Vec<u8>,
}

/// 解码后的纹理
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    /// 第 0 级为原始尺寸
    pub levels: Vec<MipLevel>,
}

impl TextureImage {
    pub fn width(&self) -> u32 {
        self.levels.first().map(|level| level.width).unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.levels.first().map(|level| level.height).unwrap_or(0)
    }
}

/// 解码纹理字节
pub fn decode_texture(bytes: &[u8]) -> Result<TextureImage, image::ImageError> {
    let mut base = image::load_from_memory(bytes)?.to_rgba8();
    premultiply_alpha(&mut base);
    Ok(TextureImage {
        levels: build_mip_chain(base),
    })
}

/// 预乘 alpha
pub fn premultiply_alpha(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        *pixel = Rgba([scale(r), scale(g), scale(b), a]);
    }
}

fn build_mip_chain(base: RgbaImage) -> Vec<MipLevel> {
    let mut levels = Vec::new();
    let mut current: ImageBuffer<Rgba<u8>, Vec<u8>> = base;

    loop {
        let (width, height) = current.dimensions();
        let next = if width > 1 || height > 1 {
            let next_w = (width / 2).max(1);
            let next_h = (height / 2).max(1);
            Some(imageops::resize(&current, next_w, next_h, FilterType::Triangle))
        } else {
            None
        };

        levels.push(MipLevel {
            width,
            height,
            pixels: current.into_raw(),
        });

        match next {
            Some(image) => current = image,
            None => break,
        }
    }

    levels
}
