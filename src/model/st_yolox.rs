// 该文件是 Jiema （解码） 项目的一部分。
// src/model/st_yolox.rs - pp_od_st_yolox_uf
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
use super::{Decoder, DetectionSettings, InitContext, check_anchors, checked_geometry};
use crate::config::PpConfig;
use crate::error::PpError;
use crate::kernel::st_yolox::StYolox;
use crate::kernel::yolo_v2::GridScale;
use crate::labels::LabelTable;

pub const NAME: &str = "pp_od_st_yolox_uf";

const DEFAULT_CLASSES: usize = 1;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.6, 0.5, 100);

/// 各尺度的配置名、锚框键名与默认网格
const SCALES: [(&str, &str, usize); 3] = [
  ("large", "scales.large.anchors", 60),
  ("medium", "scales.medium.anchors", 30),
  ("small", "scales.small.anchors", 15),
];

fn parse_scale(
  scales: Option<&PpConfig>,
  nb_classes: usize,
  (which, anchors_key, default_grid): (&'static str, &'static str, usize),
) -> Result<GridScale, PpError> {
  let section = scales.and_then(|s| s.section(which)).unwrap_or_default();

  let mut grid_width = default_grid;
  let mut grid_height = default_grid;
  section.override_usize("grid_width", &mut grid_width);
  section.override_usize("grid_height", &mut grid_height);

  let mut anchors = check_anchors(section.floats("anchors"), NAME, anchors_key, 2)?;
  anchors.truncate(anchors.len() / 2 * 2);
  debug!(
    "{}: {} 尺度网格 {}x{}, {} 个锚框",
    NAME,
    which,
    grid_width,
    grid_height,
    anchors.len() / 2
  );

  let scale = GridScale {
    grid_width,
    grid_height,
    anchors,
  };
  checked_geometry(NAME, "输出张量长度", scale.checked_tensor_len(nb_classes))?;
  Ok(scale)
}

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut nb_classes = DEFAULT_CLASSES;
  cfg.override_usize("num_classes", &mut nb_classes);

  let scales = cfg.section("scales");
  let large = parse_scale(scales.as_ref(), nb_classes, SCALES[0])?;
  let medium = parse_scale(scales.as_ref(), nb_classes, SCALES[1])?;
  let small = parse_scale(scales.as_ref(), nb_classes, SCALES[2])?;
  checked_geometry(
    NAME,
    "候选框总数",
    large
      .checked_nb_boxes()
      .and_then(|n| n.checked_add(medium.checked_nb_boxes()?))
      .and_then(|n| n.checked_add(small.checked_nb_boxes()?)),
  )?;

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let labels = LabelTable::from_config(cfg, nb_classes, "unknown", &[]);
  let kernel = StYolox::new(nb_classes, large, medium, small);

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
