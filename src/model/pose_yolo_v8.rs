// 该文件是 Jiema （解码） 项目的一部分。
// src/model/pose_yolo_v8.rs - pp_mpe_yolo_v8_uf
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
use super::{Decoder, DetectionSettings, InitContext, checked_geometry};
use crate::error::PpError;
use crate::kernel::pose_yolo_v8::PoseYoloV8;
use crate::kernel::yolo_v8::ChannelMajor;
use crate::labels::{LabelTable, Skeleton};

pub const NAME: &str = "pp_mpe_yolo_v8_uf";

const DEFAULT_CLASSES: usize = 2;
const DEFAULT_TOTAL_BOXES: usize = 1344;
const DEFAULT_KEYPOINTS: usize = 17;
const DEFAULT_SETTINGS: DetectionSettings = DetectionSettings::new(0.6, 0.5, 10);

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut nb_classes = DEFAULT_CLASSES;
  let mut total_boxes = DEFAULT_TOTAL_BOXES;
  let mut nb_keypoints = DEFAULT_KEYPOINTS;
  cfg.override_usize("num_classes", &mut nb_classes);
  cfg.override_usize("total_boxes", &mut total_boxes);
  cfg.override_usize("num_keypoints", &mut nb_keypoints);

  let layout = ChannelMajor {
    nb_classes,
    total_boxes,
    extra_channels: checked_geometry(NAME, "关键点通道数", nb_keypoints.checked_mul(3))?,
  };
  checked_geometry(NAME, "输出张量长度", layout.checked_tensor_len())?;

  let settings = DEFAULT_SETTINGS.configure(cfg);
  let labels = LabelTable::from_config(cfg, nb_classes, "unknown", &[]);
  let skeleton = Skeleton::from_config(cfg, nb_keypoints);
  let kernel = PoseYoloV8::new(nb_classes, total_boxes, nb_keypoints);

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
