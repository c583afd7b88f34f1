// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/yolo_v2.rs - YOLOv2 网格解码
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

use super::{Candidate, DetectKernel, require_anchors, sigmoid, softmax_max};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 类别分数的激活方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassActivation {
  /// YOLOv2：类别 logits 做 softmax
  Softmax,
  /// YOLOX：每个类别独立 sigmoid
  Sigmoid,
}

/// 一个检测头的网格与锚框，锚框以网格单元为单位，成对存放 `(w, h)`
#[derive(Debug, Clone, PartialEq)]
pub struct GridScale {
  pub grid_width: usize,
  pub grid_height: usize,
  pub anchors: Vec<f32>,
}

impl GridScale {
  pub fn nb_anchors(&self) -> usize {
    self.anchors.len() / 2
  }

  /// 该检测头输出的框数量
  pub fn nb_boxes(&self) -> usize {
    self.grid_width * self.grid_height * self.nb_anchors()
  }

  /// 原始张量长度 `[gh][gw][na][5 + nc]`
  pub fn tensor_len(&self, nb_classes: usize) -> usize {
    self.nb_boxes() * (5 + nb_classes)
  }

  pub fn checked_nb_boxes(&self) -> Option<usize> {
    self
      .grid_width
      .checked_mul(self.grid_height)?
      .checked_mul(self.nb_anchors())
  }

  pub fn checked_tensor_len(&self, nb_classes: usize) -> Option<usize> {
    self.checked_nb_boxes()?.checked_mul(nb_classes.checked_add(5)?)
  }

  /// 解码一个检测头；`source_offset` 为该头第一个框在全部候选中的下标
  pub fn decode(
    &self,
    index: usize,
    input: &Dequant<'_>,
    nb_classes: usize,
    activation: ClassActivation,
    conf_threshold: f32,
    source_offset: usize,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    let nb_anchors = self.nb_anchors();
    let stride = 5 + nb_classes;
    input.require(index, self.tensor_len(nb_classes))?;
    require_anchors(&self.anchors, 2 * nb_anchors)?;

    let gw = self.grid_width as f32;
    let gh = self.grid_height as f32;

    for row in 0..self.grid_height {
      for col in 0..self.grid_width {
        for a in 0..nb_anchors {
          let slot = (row * self.grid_width + col) * nb_anchors + a;
          let base = slot * stride;

          let objectness = sigmoid(input.get(base + 4));
          if objectness < conf_threshold {
            continue;
          }

          let (class_index, class_score) = match activation {
            ClassActivation::Softmax => softmax_max(nb_classes, |c| input.get(base + 5 + c)),
            ClassActivation::Sigmoid => {
              let (idx, logit) = super::argmax(nb_classes, |c| input.get(base + 5 + c));
              (idx, sigmoid(logit))
            }
          };
          let conf = objectness * class_score;
          if conf < conf_threshold {
            continue;
          }

          let pushed = out.push(Candidate {
            x_center: (col as f32 + sigmoid(input.get(base))) / gw,
            y_center: (row as f32 + sigmoid(input.get(base + 1))) / gh,
            width: self.anchors[2 * a] * input.get(base + 2).exp() / gw,
            height: self.anchors[2 * a + 1] * input.get(base + 3).exp() / gh,
            conf,
            class_index: class_index as i32,
            source: source_offset + slot,
          });
          if !pushed {
            return Ok(());
          }
        }
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone)]
pub struct YoloV2 {
  nb_classes: usize,
  scale: GridScale,
  inputs: [TensorSpec; 1],
}

impl YoloV2 {
  pub fn new(nb_classes: usize, scale: GridScale) -> Self {
    let inputs = [TensorSpec {
      name: "detections",
      dtype: DType::F32,
      len: scale.tensor_len(nb_classes),
    }];
    Self {
      nb_classes,
      scale,
      inputs,
    }
  }
}

impl DetectKernel for YoloV2 {
  fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  fn max_candidates(&self) -> usize {
    self.scale.nb_boxes()
  }

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    self.scale.decode(
      0,
      &inputs[0],
      self.nb_classes,
      ClassActivation::Softmax,
      conf_threshold,
      0,
      out,
    )
  }
}
