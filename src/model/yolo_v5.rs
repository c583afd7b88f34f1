// 该文件是 Jiema （解码） 项目的一部分。
// src/model/yolo_v5.rs - pp_od_yolo_v5_uu
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
use crate::kernel::yolo_v5::YoloV5;
use crate::labels::{COCO_CLASSES, LabelTable};
use crate::tensor::DType;

pub const NAME: &str = "pp_od_yolo_v5_uu";

const DEFAULT_CLASSES: usize = 80;
const DEFAULT_TOTAL_BOXES: usize = 25200;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.5, 0.45, 100);

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut nb_classes = DEFAULT_CLASSES;
  let mut total_boxes = DEFAULT_TOTAL_BOXES;
  cfg.override_usize("num_classes", &mut nb_classes);
  cfg.override_usize("total_boxes", &mut total_boxes);
  checked_geometry(
    NAME,
    "输出张量长度",
    nb_classes
      .checked_add(5)
      .and_then(|stride| stride.checked_mul(total_boxes)),
  )?;

  // 运行时给出的量化参数可被配置覆盖
  let mut quant = ctx.output_quantization(0);
  quant.override_from(cfg);
  debug!(
    "{}: 输出量化 scale {}, zero_point {}",
    NAME, quant.scale, quant.zero_point
  );

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let labels = LabelTable::from_config(cfg, nb_classes, "unknown", &COCO_CLASSES);
  let kernel = YoloV5::new(nb_classes, total_boxes, DType::U8);

  let decoder = DetectionDecoder::new(
    NAME,
    kernel,
    settings,
    labels,
    vec![quant],
    DetectionKind::Od,
    &ctx.pool,
  )?;
  Ok(Box::new(decoder))
}
