// 该文件是 Jiema （解码） 项目的一部分。
// src/model/deeplab_v3.rs - pp_sseg_deeplab_v3_uf
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

use std::sync::Arc;

use tracing::{debug, error, info};

use super::{Decoder, InitContext, bind_inputs, checked_geometry};
use crate::error::PpError;
use crate::kernel::deeplab_v3::DeepLabV3;
use crate::labels::{LabelTable, VOC_CLASSES};
use crate::result::{PpResult, PpType, SsegOutput};
use crate::tensor::{RawTensor, TensorSpec};

pub const NAME: &str = "pp_sseg_deeplab_v3_uf";

const DEFAULT_CLASSES: usize = 21;
const DEFAULT_SIZE: usize = 513;

pub(crate) struct DeepLabV3Decoder {
  kernel: DeepLabV3,
  result: Option<PpResult>,
}

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut nb_classes = DEFAULT_CLASSES;
  let mut width = DEFAULT_SIZE;
  let mut height = DEFAULT_SIZE;
  cfg.override_usize("num_classes", &mut nb_classes);
  cfg.override_usize("width", &mut width);
  cfg.override_usize("height", &mut height);

  if nb_classes > u8::MAX as usize + 1 {
    error!("{}: 类别数 {} 超出类别图范围", NAME, nb_classes);
    return Err(PpError::InvalidConfig {
      family: NAME,
      reason: format!("类别数 {} 超过 256", nb_classes),
    });
  }

  let pixels = checked_geometry(NAME, "类别图像素数", width.checked_mul(height))?;
  checked_geometry(NAME, "logits 长度", pixels.checked_mul(nb_classes))?;

  let labels = LabelTable::from_config(cfg, nb_classes, "unknown", &VOC_CLASSES);
  let kernel = DeepLabV3::new(width, height, nb_classes);
  let class_map = ctx.pool.slots(kernel.pixels(), 0, |_| 0u8)?;
  info!(
    "{}: 初始化完成, 输出 {}x{}, 类别数 {}",
    NAME, width, height, nb_classes
  );

  Ok(Box::new(DeepLabV3Decoder {
    kernel,
    result: Some(PpResult::Sseg(SsegOutput {
      class_map,
      width,
      height,
      labels: Arc::new(labels),
    })),
  }))
}

/// 语义分割没有阈值概念，阈值的设置被忽略，读取恒为 0
impl Decoder for DeepLabV3Decoder {
  fn name(&self) -> &'static str {
    NAME
  }

  fn pp_type(&self) -> PpType {
    PpType::Sseg
  }

  fn input_spec(&self) -> &[TensorSpec] {
    self.kernel.input_spec()
  }

  fn is_ready(&self) -> bool {
    self.result.is_some()
  }

  fn run(&mut self, inputs: &[RawTensor<'_>]) -> Result<&PpResult, PpError> {
    let Some(result) = self.result.as_mut() else {
      error!("{}: 解码器未初始化或已释放", NAME);
      return Err(PpError::NotReady { family: NAME });
    };

    let views = bind_inputs(NAME, self.kernel.input_spec(), &[], inputs)?;
    result.reset();
    if let PpResult::Sseg(out) = &mut *result {
      self.kernel.decode(&views[0], &mut out.class_map)?;
      debug!("{}: 输出类别图 {} 像素", NAME, out.class_map.len());
    }
    Ok(&*result)
  }

  fn deinit(&mut self) {
    if self.result.take().is_some() {
      info!("{}: 已释放全部缓冲", NAME);
    }
  }

  fn set_confidence_threshold(&mut self, _threshold: f32) {}

  fn confidence_threshold(&self) -> f32 {
    0.0
  }

  fn set_nms_threshold(&mut self, _threshold: f32) {}

  fn nms_threshold(&self) -> f32 {
    0.0
  }
}
