// 该文件是 Jiema （解码） 项目的一部分。
// src/model.rs - 解码器接口
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use tracing::error;

use crate::config::PpConfig;
use crate::error::PpError;
use crate::mem::BufferPool;
use crate::result::{PpResult, PpType};
use crate::tensor::{Dequant, NnRuntime, Quantization, RawTensor, TensorSpec};

pub(crate) mod blazeface;
pub(crate) mod deeplab_v3;
pub(crate) mod detect;
pub(crate) mod iseg_yolo_v8;
pub(crate) mod movenet;
pub(crate) mod palm;
pub(crate) mod pose_yolo_v8;
pub(crate) mod ssd;
pub(crate) mod st_yolox;
pub(crate) mod yolo_v2;
pub(crate) mod yolo_v5;
pub(crate) mod yolo_v8;

/// 后处理解码器
///
/// 每个实例独占自己的参数与缓冲。`run` 返回的结果借用解码器内部缓冲，
/// 下一次 `run` 或 `deinit` 之前有效。
pub trait Decoder: Send {
  /// 注册名，例如 `pp_od_yolo_v2_uf`
  fn name(&self) -> &'static str;

  fn pp_type(&self) -> PpType;

  /// 按顺序列出 `run` 需要的输入张量
  fn input_spec(&self) -> &[TensorSpec];

  fn is_ready(&self) -> bool;

  fn run(&mut self, inputs: &[RawTensor<'_>]) -> Result<&PpResult, PpError>;

  /// 释放全部缓冲，可重复调用；之后 `run` 返回 [`PpError::NotReady`]
  fn deinit(&mut self);

  fn set_confidence_threshold(&mut self, threshold: f32);

  fn confidence_threshold(&self) -> f32;

  fn set_nms_threshold(&mut self, threshold: f32);

  fn nms_threshold(&self) -> f32;
}

/// 初始化所需的上下文
pub struct InitContext<'a> {
  pub config: PpConfig,
  pub pool: BufferPool,
  pub runtime: Option<&'a dyn NnRuntime>,
}

impl InitContext<'_> {
  /// 运行时提供的输出量化参数，缺省时用 `1/255, 0`
  pub(crate) fn output_quantization(&self, index: usize) -> Quantization {
    self
      .runtime
      .and_then(|rt| rt.output_quantization(index))
      .unwrap_or_default()
  }
}

/// 检测类家族的可调参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionSettings {
  pub confidence: f32,
  pub nms: f32,
  pub max_boxes: usize,
}

impl DetectionSettings {
  pub const fn new(confidence: f32, nms: f32, max_boxes: usize) -> Self {
    Self {
      confidence,
      nms,
      max_boxes,
    }
  }

  /// 用 `confidence_threshold` / `iou_threshold` / `max_detections` 覆盖默认值
  pub fn configure(mut self, cfg: &PpConfig) -> Self {
    cfg.override_f32("confidence_threshold", &mut self.confidence);
    cfg.override_f32("iou_threshold", &mut self.nms);
    cfg.override_usize("max_detections", &mut self.max_boxes);
    self
  }
}

/// 检查输入张量数量与类型，并按量化参数构造视图
pub(crate) fn bind_inputs<'a>(
  family: &'static str,
  spec: &[TensorSpec],
  quants: &[Quantization],
  inputs: &[RawTensor<'a>],
) -> Result<Vec<Dequant<'a>>, PpError> {
  if inputs.len() != spec.len() {
    error!(
      "{}: 预期输入张量数量为 {}, 实际为 {}",
      family,
      spec.len(),
      inputs.len()
    );
    return Err(PpError::InputCount {
      family,
      expected: spec.len(),
      actual: inputs.len(),
    });
  }

  inputs
    .iter()
    .zip(spec)
    .enumerate()
    .map(|(index, (tensor, want))| {
      if tensor.dtype() != want.dtype {
        error!(
          "{}: 输入张量 {} ({}) 类型错误: 期望 {:?}, 实际 {:?}",
          family,
          index,
          want.name,
          want.dtype,
          tensor.dtype()
        );
        return Err(PpError::InputType {
          family,
          index,
          expected: want.dtype,
          actual: tensor.dtype(),
        });
      }
      let quant = quants.get(index).copied().unwrap_or_default();
      Ok(Dequant::new(*tensor, quant))
    })
    .collect()
}

/// 由配置推出的尺寸（张量长度、框数量等），计算溢出时视为配置无效
///
/// 必须在申请任何缓冲之前调用，调用方用 `checked_mul` / `checked_add` 组合出 `value`。
pub(crate) fn checked_geometry(
  family: &'static str,
  what: &str,
  value: Option<usize>,
) -> Result<usize, PpError> {
  value.ok_or_else(|| {
    error!("{}: {} 超出可表示范围", family, what);
    PpError::InvalidConfig {
      family,
      reason: format!("{} 超出可表示范围", what),
    }
  })
}

/// 必需的扁平锚框数组，至少 `expected` 个值
pub(crate) fn required_floats(
  cfg: &PpConfig,
  family: &'static str,
  key: &'static str,
  expected: usize,
) -> Result<Vec<f32>, PpError> {
  check_anchors(cfg.floats(key), family, key, expected)
}

/// `key` 只用于报错，嵌套配置中的锚框由调用方读取后传入
pub(crate) fn check_anchors(
  values: Option<Vec<f32>>,
  family: &'static str,
  key: &'static str,
  expected: usize,
) -> Result<Vec<f32>, PpError> {
  let Some(values) = values else {
    error!("{}: 缺少必需的锚框配置 `{}`", family, key);
    return Err(PpError::MissingAnchors { family, key });
  };
  if values.len() < expected {
    error!(
      "{}: 锚框配置 `{}` 需要 {} 个值, 实际 {} 个",
      family,
      key,
      expected,
      values.len()
    );
    return Err(PpError::InvalidAnchors {
      family,
      key,
      expected,
      actual: values.len(),
    });
  }
  Ok(values)
}

/// 必需的锚点对数组，至少 `expected` 对
pub(crate) fn required_points(
  cfg: &PpConfig,
  family: &'static str,
  key: &'static str,
  expected: usize,
) -> Result<Vec<[f32; 2]>, PpError> {
  let Some(points) = cfg.points(key) else {
    error!("{}: 缺少必需的锚框配置 `{}`", family, key);
    return Err(PpError::MissingAnchors { family, key });
  };
  if points.len() < expected {
    error!(
      "{}: 锚框配置 `{}` 需要 {} 对, 实际 {} 对",
      family,
      key,
      expected,
      points.len()
    );
    return Err(PpError::InvalidAnchors {
      family,
      key,
      expected: 2 * expected,
      actual: 2 * points.len(),
    });
  }
  Ok(points)
}
