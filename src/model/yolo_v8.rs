// 该文件是 Jiema （解码） 项目的一部分。
// src/model/yolo_v8.rs - pp_od_yolo_v8_uf / pp_od_yolo_v8_ui
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

use super::detect::{DetectionDecoder, DetectionKind};
use super::{Decoder, DetectionSettings, InitContext, checked_geometry};
use crate::error::PpError;
use crate::kernel::yolo_v8::{ChannelMajor, YoloV8};
use crate::labels::{COCO_CLASSES, LabelTable};
use crate::tensor::DType;

pub const NAME_UF: &str = "pp_od_yolo_v8_uf";
pub const NAME_UI: &str = "pp_od_yolo_v8_ui";

const DEFAULT_CLASSES: usize = 80;
const DEFAULT_TOTAL_BOXES: usize = 1344;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.5, 0.45, 100);

/// 浮点输出
pub(crate) fn init_uf(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  init(NAME_UF, DType::F32, ctx)
}

/// int8 输出，量化参数来自运行时或配置
pub(crate) fn init_ui(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  init(NAME_UI, DType::I8, ctx)
}

fn init(name: &'static str, dtype: DType, ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut nb_classes = DEFAULT_CLASSES;
  let mut total_boxes = DEFAULT_TOTAL_BOXES;
  cfg.override_usize("num_classes", &mut nb_classes);
  cfg.override_usize("total_boxes", &mut total_boxes);

  let layout = ChannelMajor {
    nb_classes,
    total_boxes,
    extra_channels: 0,
  };
  checked_geometry(name, "输出张量长度", layout.checked_tensor_len())?;

  let quants = match dtype {
    DType::F32 => Vec::new(),
    DType::I8 | DType::U8 => {
      let mut quant = ctx.output_quantization(0);
      quant.override_from(cfg);
      vec![quant]
    }
  };

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let labels = LabelTable::from_config(cfg, nb_classes, "unknown", &COCO_CLASSES);
  let kernel = YoloV8::new(nb_classes, total_boxes, dtype);

  let decoder = DetectionDecoder::new(
    name,
    kernel,
    settings,
    labels,
    quants,
    DetectionKind::Od,
    &ctx.pool,
  )?;
  Ok(Box::new(decoder))
}
