// 该文件是 Jiema （解码） 项目的一部分。
// src/model/blazeface.rs - pp_od_fd_blazeface_uu
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
use crate::kernel::blazeface::{ANCHOR_STRIDE, BlazeFace, Branch};
use crate::labels::LabelTable;

pub const NAME: &str = "pp_od_fd_blazeface_uu";

const DEFAULT_IN_SIZE: usize = 128;
const DEFAULT_CLASSES: usize = 1;
const DEFAULT_KEYPOINTS: usize = 6;
const DEFAULT_DETECTIONS_0: usize = 512;
const DEFAULT_DETECTIONS_1: usize = 384;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.6, 0.3, 10);

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut in_size = DEFAULT_IN_SIZE;
  let mut nb_classes = DEFAULT_CLASSES;
  let mut nb_keypoints = DEFAULT_KEYPOINTS;
  let mut detections_0 = DEFAULT_DETECTIONS_0;
  let mut detections_1 = DEFAULT_DETECTIONS_1;
  cfg.override_usize("image_size", &mut in_size);
  cfg.override_usize("num_classes", &mut nb_classes);
  cfg.override_usize("num_keypoints", &mut nb_keypoints);
  cfg.override_usize("detections_0", &mut detections_0);
  cfg.override_usize("detections_1", &mut detections_1);

  let regression = checked_geometry(
    NAME,
    "回归通道数",
    nb_keypoints.checked_mul(2).and_then(|n| n.checked_add(4)),
  )?;
  for (what, nb_detections) in [
    ("第一分支回归张量长度", detections_0),
    ("第二分支回归张量长度", detections_1),
  ] {
    checked_geometry(NAME, what, nb_detections.checked_mul(regression))?;
  }
  checked_geometry(NAME, "候选框总数", detections_0.checked_add(detections_1))?;

  // 回归通道不少于 ANCHOR_STRIDE，锚框长度不会溢出
  let anchors_0 = required_floats(cfg, NAME, "anchors_0", detections_0 * ANCHOR_STRIDE)?;
  let anchors_1 = required_floats(cfg, NAME, "anchors_1", detections_1 * ANCHOR_STRIDE)?;

  // 输出顺序 scores_0, scores_1, boxes_0, boxes_1，各自带量化参数
  let quants = (0..4).map(|i| ctx.output_quantization(i)).collect::<Vec<_>>();
  debug!("{}: 输入尺寸 {}, 输出量化 {:?}", NAME, in_size, quants);

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let labels = LabelTable::from_config(cfg, nb_classes, "face", &[]);
  let kernel = BlazeFace::new(
    in_size,
    nb_keypoints,
    Branch {
      nb_detections: detections_0,
      anchors: anchors_0,
    },
    Branch {
      nb_detections: detections_1,
      anchors: anchors_1,
    },
  );

  let decoder = DetectionDecoder::new(
    NAME,
    kernel,
    settings,
    labels,
    quants,
    DetectionKind::Od,
    &ctx.pool,
  )?;
  Ok(Box::new(decoder))
}
