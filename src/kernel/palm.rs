// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/palm.rs - 手掌检测解码
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

use super::{Candidate, DetectKernel, sigmoid};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::result::Keypoint;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 两个输入：分数 logits `[N]` 与回归 `[N][4 + 2K]`；
/// 锚框为归一化中心点 `(x, y)` 对，偏移以输入像素为单位
#[derive(Debug, Clone)]
pub struct PalmDetector {
  width: f32,
  height: f32,
  nb_keypoints: usize,
  total_detections: usize,
  anchors: Vec<[f32; 2]>,
  inputs: [TensorSpec; 2],
}

impl PalmDetector {
  pub fn new(
    width: usize,
    height: usize,
    nb_keypoints: usize,
    total_detections: usize,
    anchors: Vec<[f32; 2]>,
  ) -> Self {
    let spec = |name, len| TensorSpec {
      name,
      dtype: DType::F32,
      len,
    };
    Self {
      width: width as f32,
      height: height as f32,
      nb_keypoints,
      total_detections,
      anchors,
      inputs: [
        spec("probs", total_detections),
        spec("boxes", total_detections * (4 + 2 * nb_keypoints)),
      ],
    }
  }

  fn stride(&self) -> usize {
    4 + 2 * self.nb_keypoints
  }
}

impl DetectKernel for PalmDetector {
  fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  fn max_candidates(&self) -> usize {
    self.total_detections
  }

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    let (probs, boxes) = (&inputs[0], &inputs[1]);
    probs.require(0, self.total_detections)?;
    boxes.require(1, self.total_detections * self.stride())?;
    if self.anchors.len() < self.total_detections {
      return Err(KernelError::AnchorMismatch {
        expected: 2 * self.total_detections,
        actual: 2 * self.anchors.len(),
      });
    }

    for i in 0..self.total_detections {
      let conf = sigmoid(probs.get(i));
      if conf < conf_threshold {
        continue;
      }

      let base = i * self.stride();
      let [ax, ay] = self.anchors[i];
      let pushed = out.push(Candidate {
        x_center: ax + boxes.get(base) / self.width,
        y_center: ay + boxes.get(base + 1) / self.height,
        width: boxes.get(base + 2) / self.width,
        height: boxes.get(base + 3) / self.height,
        conf,
        class_index: 0,
        source: i,
      });
      if !pushed {
        break;
      }
    }
    Ok(())
  }

  fn nb_keypoints(&self) -> usize {
    self.nb_keypoints
  }

  /// 关键点置信度恒为 1
  fn keypoints(&self, inputs: &[Dequant<'_>], cand: &Candidate, out: &mut [Keypoint]) {
    let boxes = &inputs[1];
    let base = cand.source * self.stride();
    let [ax, ay] = self.anchors[cand.source];
    for (k, kp) in out.iter_mut().enumerate().take(self.nb_keypoints) {
      *kp = Keypoint {
        x: ax + boxes.get(base + 4 + 2 * k) / self.width,
        y: ay + boxes.get(base + 5 + 2 * k) / self.height,
        conf: 1.0,
      };
    }
  }
}
