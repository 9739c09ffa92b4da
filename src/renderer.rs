//! 帧标注渲染: 区域覆盖层 + 检测框
//!
//! 先画区域层 (顶点包围盒 + 半透明填充 + 标签), 再画检测层
//! (调色板描边 + 类别置信度标签)。渲染只依赖输入帧与两份列表,
//! 相同输入产生逐字节相同的输出。

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::warn;

use crate::detection::{class_color, class_name, Detection};
use crate::geometry::{Polygon, PolygonType};

/// 区域填充透明度
const ZONE_ALPHA: f32 = 0.3;
/// 标签字号
const FONT_SCALE: f32 = 16.0;
/// 无字体时估算标签尺寸用的字符宽度/行高
const FALLBACK_CHAR_W: u32 = 8;
const FALLBACK_LINE_H: u32 = 14;

/// 包含区颜色 (帧原生通道顺序)
const INCLUSION_COLOR: (u8, u8, u8) = (0, 128, 0);
/// 排除区颜色
const EXCLUSION_COLOR: (u8, u8, u8) = (128, 128, 128);

/// 帧标注渲染器
///
/// 字体可选: 加载失败时仍然绘制标签底色矩形, 只跳过文字。
pub struct Renderer {
    font: Option<FontVec>,
}

impl Renderer {
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font }
    }

    /// 从字体文件构造, 文件不可用时退化为无文字渲染
    pub fn with_font_file(path: &Path) -> Self {
        let font = std::fs::read(path)
            .ok()
            .and_then(|data| FontVec::try_from_vec(data).ok());

        if font.is_none() {
            warn!(
                "label font not available at {}, labels are drawn without text",
                path.display()
            );
        }

        Self { font }
    }

    /// 依次绘制区域层与检测层
    pub fn render(&self, frame: &mut RgbImage, zones: &[Polygon], detections: &[Detection]) {
        self.draw_zones(frame, zones);
        self.draw_detections(frame, detections);
    }

    /// 区域覆盖层: 顶点包围盒 + 半透明填充 + "P{i} {TYPE} (Pri:{p})" 标签
    pub fn draw_zones(&self, frame: &mut RgbImage, zones: &[Polygon]) {
        let (cols, rows) = (frame.width() as f64, frame.height() as f64);

        for (i, zone) in zones.iter().enumerate() {
            if zone.vertices().len() < 3 {
                continue;
            }
            let Some((min_x, min_y, max_x, max_y)) = zone.bounding_box() else {
                continue;
            };

            // 夹取到帧内
            let left = min_x.max(0.0) as i32;
            let top = min_y.max(0.0) as i32;
            let right = max_x.min(cols) as i32;
            let bottom = max_y.min(rows) as i32;
            if right <= left || bottom <= top {
                continue;
            }

            let color = match zone.kind() {
                PolygonType::Inclusion => INCLUSION_COLOR,
                _ => EXCLUSION_COLOR,
            };

            draw_hollow_rect_mut(
                frame,
                Rect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32),
                Rgb([color.0, color.1, color.2]),
            );
            blend_rect(frame, left, top, right, bottom, color, ZONE_ALPHA);

            let label = format!(
                "P{} {} (Pri:{})",
                i + 1,
                zone.kind().label(),
                zone.priority()
            );
            self.draw_label(frame, left, top + 5, &label, color, (0, 0, 0));
        }
    }

    /// 检测层: 1px 描边 + "{class}: {conf:.2}" 标签
    pub fn draw_detections(&self, frame: &mut RgbImage, detections: &[Detection]) {
        for det in detections {
            let color = class_color(det.class_id());

            draw_hollow_rect_mut(
                frame,
                Rect::at(det.x(), det.y()).of_size(det.w().max(1) as u32, det.h().max(1) as u32),
                Rgb([color.0, color.1, color.2]),
            );

            let label = format!("{}: {:.2}", class_name(det.class_id()), det.confidence());
            let (_, text_h) = self.measure(&label);
            let label_top = (det.y() - 5 - text_h as i32).max(0);
            self.draw_label(frame, det.x(), label_top, &label, color, (255, 255, 255));
        }
    }

    /// 标签 = 填充底色矩形 + 文字 (字体缺失时只画矩形)
    fn draw_label(
        &self,
        frame: &mut RgbImage,
        x: i32,
        top: i32,
        text: &str,
        bg: (u8, u8, u8),
        fg: (u8, u8, u8),
    ) {
        let (text_w, text_h) = self.measure(text);
        if text_w == 0 || text_h == 0 {
            return;
        }

        draw_filled_rect_mut(
            frame,
            Rect::at(x, top).of_size(text_w, text_h + 2),
            Rgb([bg.0, bg.1, bg.2]),
        );

        if let Some(font) = &self.font {
            draw_text_mut(
                frame,
                Rgb([fg.0, fg.1, fg.2]),
                x,
                top,
                PxScale::from(FONT_SCALE),
                font,
                text,
            );
        }
    }

    fn measure(&self, text: &str) -> (u32, u32) {
        match &self.font {
            Some(font) => text_size(PxScale::from(FONT_SCALE), font, text),
            None => (text.len() as u32 * FALLBACK_CHAR_W, FALLBACK_LINE_H),
        }
    }
}

/// 半透明矩形填充: `color * alpha + base * (1 - alpha)`
fn blend_rect(
    frame: &mut RgbImage,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    color: (u8, u8, u8),
    alpha: f32,
) {
    let x0 = left.max(0) as u32;
    let y0 = top.max(0) as u32;
    let x1 = (right.max(0) as u32).min(frame.width());
    let y1 = (bottom.max(0) as u32).min(frame.height());
    let overlay = [color.0 as f32, color.1 as f32, color.2 as f32];

    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = frame.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended = overlay[c] * alpha + pixel.0[c] as f32 * (1.0 - alpha);
                pixel.0[c] = blended.round() as u8;
            }
        }
    }
}
