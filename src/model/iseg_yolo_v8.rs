// 该文件是 Jiema （解码） 项目的一部分。
// src/model/iseg_yolo_v8.rs - pp_iseg_yolo_v8_ui
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

use tracing::debug;

use super::detect::{DetectionDecoder, DetectionKind};
use super::{Decoder, DetectionSettings, InitContext, checked_geometry};
use crate::error::PpError;
use crate::kernel::iseg_yolo_v8::IsegYoloV8;
use crate::kernel::yolo_v8::ChannelMajor;
use crate::labels::{COCO_CLASSES, LabelTable};

pub const NAME: &str = "pp_iseg_yolo_v8_ui";

const DEFAULT_CLASSES: usize = 80;
const DEFAULT_TOTAL_BOXES: usize = 8400;
const DEFAULT_MASK_SIZE: usize = 32;
const DEFAULT_NB_MASKS: usize = 32;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.5, 0.45, 100);

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut nb_classes = DEFAULT_CLASSES;
  let mut total_boxes = DEFAULT_TOTAL_BOXES;
  let mut mask_size = DEFAULT_MASK_SIZE;
  let mut nb_masks = DEFAULT_NB_MASKS;
  cfg.override_usize("num_classes", &mut nb_classes);
  cfg.override_usize("total_boxes", &mut total_boxes);
  cfg.override_usize("mask_size", &mut mask_size);
  cfg.override_usize("num_masks", &mut nb_masks);

  let layout = ChannelMajor {
    nb_classes,
    total_boxes,
    extra_channels: nb_masks,
  };
  checked_geometry(NAME, "检测张量长度", layout.checked_tensor_len())?;
  let mask_len = checked_geometry(NAME, "掩码尺寸", mask_size.checked_mul(mask_size))?;
  checked_geometry(NAME, "原型掩码长度", mask_len.checked_mul(nb_masks))?;

  // 检测输出与原型掩码分别量化
  let quants = vec![ctx.output_quantization(0), ctx.output_quantization(1)];
  debug!(
    "{}: 掩码 {}x{}, {} 个系数, 输出量化 {:?}",
    NAME, mask_size, mask_size, nb_masks, quants
  );

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let labels = LabelTable::from_config(cfg, nb_classes, "unknown", &COCO_CLASSES);
  let kernel = IsegYoloV8::new(nb_classes, total_boxes, mask_size, nb_masks);

  let decoder = DetectionDecoder::new(
    NAME,
    kernel,
    settings,
    labels,
    quants,
    DetectionKind::Iseg,
    &ctx.pool,
  )?;
  Ok(Box::new(decoder))
}
