//! 服务端命令行参数

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;

use crate::models::input_size_for_model;
use crate::pipeline::PipelineSettings;

/// 检测服务参数
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "区域过滤目标检测服务", long_about = None)]
pub struct Args {
    /// 服务监听地址 (host:port)
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    pub address: String,

    /// 检测模型路径 (ONNX)
    #[arg(short, long)]
    pub model: String,

    /// 模型输入宽度 (与 --height 同时给出时覆盖路径推断)
    #[arg(long)]
    pub width: Option<u32>,

    /// 模型输入高度
    #[arg(long)]
    pub height: Option<u32>,

    /// 请求级置信度阈值 (0.0-1.0)
    #[arg(short, long, default_value_t = 0.5)]
    pub confidence: f32,

    /// 输出解析与 NMS 的分数阈值
    #[arg(long, default_value_t = 0.1)]
    pub thr: f32,

    /// NMS IoU 阈值
    #[arg(long, default_value_t = 0.45)]
    pub nms: f32,

    /// 构建输入张量时做 BGR->RGB 通道交换 (--rgb=false 关闭)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub rgb: bool,

    /// letterbox 填充灰度值
    #[arg(long, default_value_t = 114)]
    pub padvalue: u8,

    /// 标签字体文件
    #[arg(
        long,
        default_value = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
    )]
    pub font: PathBuf,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 启动前的参数校验
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.model.is_empty(), "model path is required");
        ensure!(
            (0.0..=1.0).contains(&self.confidence),
            "confidence threshold must be between 0.0 and 1.0"
        );
        ensure!(
            (0.0..=1.0).contains(&self.thr),
            "score threshold must be between 0.0 and 1.0"
        );
        ensure!(
            (0.0..=1.0).contains(&self.nms),
            "NMS threshold must be between 0.0 and 1.0"
        );
        if let (Some(w), Some(h)) = (self.width, self.height) {
            ensure!(w > 0 && h > 0, "width and height must be positive values");
        }
        Ok(())
    }

    /// 模型输入尺寸: 显式宽高优先, 否则按模型路径推断
    pub fn input_size(&self) -> (u32, u32) {
        input_size_for_model(&self.model, self.width, self.height)
    }

    /// 汇总成流水线参数
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let (model_w, model_h) = self.input_size();
        PipelineSettings {
            model_w,
            model_h,
            thr: self.thr,
            nms: self.nms,
            swap_rb: self.rgb,
            pad: self.padvalue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["server", "--model", "models/yolov7.onnx"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let a = args(&[]);
        assert_eq!(a.address, "127.0.0.1:50051");
        assert_eq!(a.confidence, 0.5);
        assert_eq!(a.thr, 0.1);
        assert_eq!(a.nms, 0.45);
        assert!(a.rgb);
        assert_eq!(a.padvalue, 114);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_input_size_from_model_path() {
        assert_eq!(args(&[]).input_size(), (640, 640));

        let mut plain = args(&[]);
        plain.model = "models/resnet50.onnx".to_string();
        assert_eq!(plain.input_size(), (224, 224));
    }

    #[test]
    fn test_explicit_size_overrides() {
        let a = args(&["--width", "416", "--height", "416"]);
        assert_eq!(a.input_size(), (416, 416));
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut a = args(&[]);
        a.confidence = 1.5;
        assert!(a.validate().is_err());

        let mut a = args(&[]);
        a.thr = -0.1;
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_pipeline_settings_carry_options() {
        let a = args(&["--thr", "0.25", "--nms", "0.6", "--padvalue", "128", "--rgb", "false"]);
        let settings = a.pipeline_settings();
        assert_eq!(settings.thr, 0.25);
        assert_eq!(settings.nms, 0.6);
        assert_eq!(settings.pad, 128);
        assert!(!settings.swap_rb);
        assert_eq!((settings.model_w, settings.model_h), (640, 640));
    }
}
