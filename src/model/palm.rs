// 该文件是 Jiema （解码） 项目的一部分。
// src/model/palm.rs - pp_mpe_pd_uf
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

use super::detect::{DetectionDecoder, DetectionKind};
use super::{Decoder, DetectionSettings, InitContext, checked_geometry, required_points};
use crate::error::PpError;
use crate::kernel::palm::PalmDetector;
use crate::labels::{LabelTable, Skeleton};

pub const NAME: &str = "pp_mpe_pd_uf";

const DEFAULT_SIZE: usize = 256;
const DEFAULT_KEYPOINTS: usize = 7;
const DEFAULT_TOTAL_DETECTIONS: usize = 896;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.5, 0.3, 10);

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut width = DEFAULT_SIZE;
  let mut height = DEFAULT_SIZE;
  let mut nb_keypoints = DEFAULT_KEYPOINTS;
  let mut total_detections = DEFAULT_TOTAL_DETECTIONS;
  cfg.override_usize("image_width", &mut width);
  cfg.override_usize("image_height", &mut height);
  cfg.override_usize("num_keypoints", &mut nb_keypoints);
  cfg.override_usize("total_detections", &mut total_detections);
  checked_geometry(
    NAME,
    "回归张量长度",
    nb_keypoints
      .checked_mul(2)
      .and_then(|n| n.checked_add(4))
      .and_then(|stride| stride.checked_mul(total_detections)),
  )?;

  let anchors = required_points(cfg, NAME, "anchors", total_detections)?;

  // 只有一个类别，名称取配置中的第一项
  let first = cfg
    .all_strings("class_names")
    .and_then(|names| names.into_iter().next())
    .flatten();
  let labels = LabelTable::new(vec![first], "palm");

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let skeleton = Skeleton::from_config(cfg, nb_keypoints);
  let kernel = PalmDetector::new(width, height, nb_keypoints, total_detections, anchors);

  let decoder = DetectionDecoder::new(
    NAME,
    kernel,
    settings,
    labels,
    Vec::new(),
    DetectionKind::Mpe(Arc::new(skeleton)),
    &ctx.pool,
  )?;
  Ok(Box::new(decoder))
}
