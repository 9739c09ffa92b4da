//! Letterbox 变换: 保持宽高比缩放并对称填充到模型输入尺寸
//!
//! 正向映射 `(x, y) -> (s*x + dx, s*y + dy)` 把原始帧坐标送入
//! letterbox 画布, 逆向映射把模型空间的检测框还原到原始帧。

use image::{imageops, Rgb, RgbImage};

use crate::detection::Detection;

/// 单次请求的 letterbox 上下文
#[derive(Clone, Copy, Debug)]
pub struct Letterbox {
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    inner_w: u32,
    inner_h: u32,
    scale: f64,
    dx: u32,
    dy: u32,
    pad: u8,
}

impl Letterbox {
    /// 由原始尺寸与模型输入尺寸推导缩放比与偏移
    pub fn new(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, pad: u8) -> Self {
        let scale = (dst_w as f64 / src_w as f64).min(dst_h as f64 / src_h as f64);
        let inner_w = (src_w as f64 * scale).round() as u32;
        let inner_h = (src_h as f64 * scale).round() as u32;
        let dx = (dst_w - inner_w) / 2;
        let dy = (dst_h - inner_h) / 2;

        Self {
            src_w,
            src_h,
            dst_w,
            dst_h,
            inner_w,
            inner_h,
            scale,
            dx,
            dy,
            pad,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offsets(&self) -> (u32, u32) {
        (self.dx, self.dy)
    }

    pub fn inner_size(&self) -> (u32, u32) {
        (self.inner_w, self.inner_h)
    }

    /// 原始帧坐标 -> letterbox 画布坐标
    pub fn forward(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.dx as f64, y * self.scale + self.dy as f64)
    }

    /// letterbox 画布坐标 -> 原始帧坐标
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.dx as f64) / self.scale,
            (y - self.dy as f64) / self.scale,
        )
    }

    /// 双线性缩放到内接尺寸, 再嵌入填充色画布
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        let resized = imageops::resize(
            img,
            self.inner_w,
            self.inner_h,
            imageops::FilterType::Triangle,
        );

        let mut canvas =
            RgbImage::from_pixel(self.dst_w, self.dst_h, Rgb([self.pad, self.pad, self.pad]));
        imageops::replace(&mut canvas, &resized, self.dx as i64, self.dy as i64);
        canvas
    }

    /// 模型空间检测框还原到原始帧, 并夹取到帧内
    ///
    /// 结果保证 `0 <= x`, `0 <= y`, `w >= 1`, `h >= 1`, 且框不超出帧边界。
    pub fn to_original(&self, det: &Detection) -> Detection {
        let src_w = self.src_w as f64;
        let src_h = self.src_h as f64;

        let mut x = (det.x() as f64 - self.dx as f64) / self.scale;
        let mut y = (det.y() as f64 - self.dy as f64) / self.scale;
        let mut w = det.w() as f64 / self.scale;
        let mut h = det.h() as f64 / self.scale;

        x = x.clamp(0.0, src_w - 1.0);
        y = y.clamp(0.0, src_h - 1.0);
        w = w.min(src_w - x).max(1.0);
        h = h.min(src_h - y).max(1.0);

        Detection::new(
            x as i32,
            y as i32,
            w as i32,
            h as i32,
            det.class_id(),
            det.confidence(),
        )
    }
}
