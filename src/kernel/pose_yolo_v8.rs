// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/pose_yolo_v8.rs - YOLOv8 多人姿态解码
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

use super::yolo_v8::ChannelMajor;
use super::{Candidate, DetectKernel};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::result::Keypoint;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 布局 `[4 + nc + 3K][N]`，每个关键点占 `x, y, conf` 三个通道
#[derive(Debug, Clone)]
pub struct PoseYoloV8 {
  layout: ChannelMajor,
  nb_keypoints: usize,
  inputs: [TensorSpec; 1],
}

impl PoseYoloV8 {
  pub fn new(nb_classes: usize, total_boxes: usize, nb_keypoints: usize) -> Self {
    let layout = ChannelMajor {
      nb_classes,
      total_boxes,
      extra_channels: 3 * nb_keypoints,
    };
    Self {
      layout,
      nb_keypoints,
      inputs: [TensorSpec {
        name: "detections",
        dtype: DType::F32,
        len: layout.tensor_len(),
      }],
    }
  }
}

impl DetectKernel for PoseYoloV8 {
  fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  fn max_candidates(&self) -> usize {
    self.layout.total_boxes
  }

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    self.layout.decode(&inputs[0], conf_threshold, out)
  }

  fn nb_keypoints(&self) -> usize {
    self.nb_keypoints
  }

  fn keypoints(&self, inputs: &[Dequant<'_>], cand: &Candidate, out: &mut [Keypoint]) {
    let first = 4 + self.layout.nb_classes;
    for (k, kp) in out.iter_mut().enumerate().take(self.nb_keypoints) {
      let channel = first + 3 * k;
      *kp = Keypoint {
        x: self.layout.at(&inputs[0], channel, cand.source),
        y: self.layout.at(&inputs[0], channel + 1, cand.source),
        conf: self.layout.at(&inputs[0], channel + 2, cand.source),
      };
    }
  }
}
