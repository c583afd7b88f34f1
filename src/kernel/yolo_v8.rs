// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/yolo_v8.rs - YOLOv8 通道优先解码
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

use super::{Candidate, DetectKernel, argmax};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::tensor::{DType, Dequant, TensorSpec};

/// YOLOv8 系列共用的通道优先布局 `[channels][N]`
///
/// 前 4 个通道为归一化的 `xc, yc, w, h`，随后 `nb_classes` 个通道为类别概率，
/// 姿态与分割模型在其后还有附加通道。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMajor {
  pub nb_classes: usize,
  pub total_boxes: usize,
  pub extra_channels: usize,
}

impl ChannelMajor {
  pub fn channels(&self) -> usize {
    4 + self.nb_classes + self.extra_channels
  }

  pub fn tensor_len(&self) -> usize {
    self.channels() * self.total_boxes
  }

  /// 配置给出的几何参数可能溢出，构造内核之前先用它检查
  pub fn checked_tensor_len(&self) -> Option<usize> {
    self
      .nb_classes
      .checked_add(self.extra_channels)?
      .checked_add(4)?
      .checked_mul(self.total_boxes)
  }

  #[inline]
  pub fn at(&self, input: &Dequant<'_>, channel: usize, i: usize) -> f32 {
    input.get(channel * self.total_boxes + i)
  }

  pub fn decode(
    &self,
    input: &Dequant<'_>,
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    input.require(0, self.tensor_len())?;

    for i in 0..self.total_boxes {
      let (class_index, conf) = argmax(self.nb_classes, |c| self.at(input, 4 + c, i));
      if conf < conf_threshold {
        continue;
      }

      let pushed = out.push(Candidate {
        x_center: self.at(input, 0, i),
        y_center: self.at(input, 1, i),
        width: self.at(input, 2, i),
        height: self.at(input, 3, i),
        conf,
        class_index: class_index as i32,
        source: i,
      });
      if !pushed {
        break;
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone)]
pub struct YoloV8 {
  layout: ChannelMajor,
  inputs: [TensorSpec; 1],
}

impl YoloV8 {
  pub fn new(nb_classes: usize, total_boxes: usize, dtype: DType) -> Self {
    let layout = ChannelMajor {
      nb_classes,
      total_boxes,
      extra_channels: 0,
    };
    Self {
      layout,
      inputs: [TensorSpec {
        name: "detections",
        dtype,
        len: layout.tensor_len(),
      }],
    }
  }
}

impl DetectKernel for YoloV8 {
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
}
