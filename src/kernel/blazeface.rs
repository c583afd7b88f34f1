// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/blazeface.rs - BlazeFace 人脸检测解码
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

use super::{Candidate, DetectKernel, require_anchors, sigmoid};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 每个锚框在配置中占 4 个值 `x, y, w, h`，解码只用到中心点
pub const ANCHOR_STRIDE: usize = 4;

/// 一个检测分支：分数 `[N]`，回归 `[N][4 + 2K]`，锚框 `[N][4]`
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
  pub nb_detections: usize,
  pub anchors: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct BlazeFace {
  in_size: f32,
  nb_keypoints: usize,
  branches: [Branch; 2],
  inputs: [TensorSpec; 4],
}

impl BlazeFace {
  pub fn new(in_size: usize, nb_keypoints: usize, branch_0: Branch, branch_1: Branch) -> Self {
    let spec = |name, len| TensorSpec {
      name,
      dtype: DType::U8,
      len,
    };
    let regression = 4 + 2 * nb_keypoints;
    let inputs = [
      spec("scores_0", branch_0.nb_detections),
      spec("scores_1", branch_1.nb_detections),
      spec("boxes_0", branch_0.nb_detections * regression),
      spec("boxes_1", branch_1.nb_detections * regression),
    ];
    Self {
      in_size: in_size as f32,
      nb_keypoints,
      branches: [branch_0, branch_1],
      inputs,
    }
  }

  fn regression_len(&self) -> usize {
    4 + 2 * self.nb_keypoints
  }
}

impl DetectKernel for BlazeFace {
  fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  fn max_candidates(&self) -> usize {
    self.branches.iter().map(|b| b.nb_detections).sum()
  }

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    let stride = self.regression_len();
    let mut offset = 0;

    for (b, branch) in self.branches.iter().enumerate() {
      let scores = &inputs[b];
      let boxes = &inputs[2 + b];
      scores.require(b, branch.nb_detections)?;
      boxes.require(2 + b, branch.nb_detections * stride)?;
      require_anchors(&branch.anchors, branch.nb_detections * ANCHOR_STRIDE)?;

      for i in 0..branch.nb_detections {
        let conf = sigmoid(scores.get(i));
        if conf < conf_threshold {
          continue;
        }

        let base = i * stride;
        let ax = branch.anchors[ANCHOR_STRIDE * i];
        let ay = branch.anchors[ANCHOR_STRIDE * i + 1];
        let pushed = out.push(Candidate {
          x_center: ax + boxes.get(base) / self.in_size,
          y_center: ay + boxes.get(base + 1) / self.in_size,
          width: boxes.get(base + 2) / self.in_size,
          height: boxes.get(base + 3) / self.in_size,
          conf,
          class_index: 0,
          source: offset + i,
        });
        if !pushed {
          return Ok(());
        }
      }
      offset += branch.nb_detections;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mem::BufferPool;
  use crate::tensor::{Quantization, RawTensor};

  // scale 1, zp 128：255 => 127 => sigmoid ≈ 1
  fn view(raw: &[u8]) -> Dequant<'_> {
    Dequant::new(RawTensor::from(raw), Quantization::new(1.0, 128))
  }

  #[test]
  fn second_branch_sources_are_offset() {
    let branch = |n| Branch {
      nb_detections: n,
      anchors: vec![0.5; n * ANCHOR_STRIDE],
    };
    let kernel = BlazeFace::new(100, 0, branch(1), branch(2));

    let scores_0 = [0u8];
    let scores_1 = [0u8, 255];
    let boxes_0 = [128u8; 4];
    let boxes_1 = [128u8, 128, 128, 128, 138, 128, 148, 148];

    let pool = BufferPool::unbounded();
    let mut out = pool.slots(kernel.max_candidates(), 0, |_| Candidate::default()).unwrap();
    let inputs = [view(&scores_0), view(&scores_1), view(&boxes_0), view(&boxes_1)];
    kernel.decode(&inputs, 0.6, &mut out).unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].source, 2);
    assert!((out[0].x_center - 0.6).abs() < 1e-6);
    assert!((out[0].width - 0.2).abs() < 1e-6);
  }
}
