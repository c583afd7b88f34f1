// 该文件是 Jiema （解码） 项目的一部分。
// src/model/yolo_v2.rs - pp_od_yolo_v2_uf
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
use super::{Decoder, DetectionSettings, InitContext, checked_geometry, required_floats};
use crate::error::PpError;
use crate::kernel::yolo_v2::{GridScale, YoloV2};
use crate::labels::{COCO_CLASSES, LabelTable};

pub const NAME: &str = "pp_od_yolo_v2_uf";

const DEFAULT_CLASSES: usize = 80;
const DEFAULT_GRID: usize = 13;
const DEFAULT_ANCHORS: usize = 5;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.5, 0.45, 100);

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut nb_classes = DEFAULT_CLASSES;
  let mut grid_width = DEFAULT_GRID;
  let mut grid_height = DEFAULT_GRID;
  let mut nb_anchors = DEFAULT_ANCHORS;
  cfg.override_usize("num_classes", &mut nb_classes);
  cfg.override_usize("grid_width", &mut grid_width);
  cfg.override_usize("grid_height", &mut grid_height);
  cfg.override_usize("num_anchors", &mut nb_anchors);

  let nb_values = checked_geometry(NAME, "锚框数值个数", nb_anchors.checked_mul(2))?;
  let mut anchors = required_floats(cfg, NAME, "anchors", nb_values)?;
  anchors.truncate(nb_values);
  debug!(
    "{}: 网格 {}x{}, 锚框 {:?}",
    NAME, grid_width, grid_height, anchors
  );

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let labels = LabelTable::from_config(cfg, nb_classes, "unknown", &COCO_CLASSES);
  let scale = GridScale {
    grid_width,
    grid_height,
    anchors,
  };
  checked_geometry(NAME, "输出张量长度", scale.checked_tensor_len(nb_classes))?;
  let kernel = YoloV2::new(nb_classes, scale);

  let decoder = DetectionDecoder::new(
    NAME,
    kernel,
    settings,
    labels,
    Vec::new(),
    DetectionKind::Od,
    &ctx.pool,
  )?;
  Ok(Box::new(decoder))
}
