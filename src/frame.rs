//! 帧缓冲: RPC Frame 消息与本地像素缓冲的互转
//!
//! 帧数据按原生通道顺序 (BGR, 3 字节/像素) 传输, 处理流水线为每个
//! 请求持有独立副本并把标注直接写进该副本。

use image::RgbImage;
use thiserror::Error;

use crate::proto;

/// 8 位三通道帧 (对应 CV_8UC3)
pub const ELM_TYPE_8UC3: i32 = 16;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("unsupported frame format: elm_type={elm_type} elm_size={elm_size}")]
    UnsupportedFormat { elm_type: i32, elm_size: i32 },
    #[error("frame has non-positive dimensions: {rows}x{cols}")]
    BadDimensions { rows: i32, cols: i32 },
}

/// 视频帧数据
#[derive(Clone, Debug, Default)]
pub struct Frame {
    rows: i32,
    cols: i32,
    elm_type: i32,
    elm_size: i32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(rows: i32, cols: i32, elm_type: i32, elm_size: i32, data: Vec<u8>) -> Self {
        Self {
            rows,
            cols,
            elm_type,
            elm_size,
            data,
        }
    }

    /// 从 RPC 消息解码并校验尺寸
    pub fn from_proto(p: &proto::Frame) -> Result<Self, FrameError> {
        if p.rows <= 0 || p.cols <= 0 {
            return Err(FrameError::BadDimensions {
                rows: p.rows,
                cols: p.cols,
            });
        }
        if p.elm_size != 3 {
            return Err(FrameError::UnsupportedFormat {
                elm_type: p.elm_type,
                elm_size: p.elm_size,
            });
        }

        let expected = p.rows as usize * p.cols as usize * p.elm_size as usize;
        if p.data.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                actual: p.data.len(),
            });
        }

        Ok(Self {
            rows: p.rows,
            cols: p.cols,
            elm_type: p.elm_type,
            elm_size: p.elm_size,
            data: p.data.clone(),
        })
    }

    pub fn to_proto(&self) -> proto::Frame {
        proto::Frame {
            rows: self.rows,
            cols: self.cols,
            elm_type: self.elm_type,
            elm_size: self.elm_size,
            data: self.data.clone(),
        }
    }

    /// 像素缓冲转 `RgbImage` 容器
    ///
    /// 字节不做重排, 容器内的通道语义仍是帧的原生顺序。
    pub fn to_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.cols as u32, self.rows as u32, self.data.clone())
    }

    /// 从像素容器构造帧, 保留给定的元素类型标记
    pub fn from_image(img: &RgbImage, elm_type: i32) -> Self {
        Self {
            rows: img.height() as i32,
            cols: img.width() as i32,
            elm_type,
            elm_size: 3,
            data: img.as_raw().clone(),
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn elm_type(&self) -> i32 {
        self.elm_type
    }

    pub fn elm_size(&self) -> i32 {
        self.elm_size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// 原地交换每个像素的第 1/3 通道 (BGR 与 RGB 互转)
pub fn swap_channels(img: &mut RgbImage) {
    for pixel in img.pixels_mut() {
        pixel.0.swap(0, 2);
    }
}
