// 该文件是 Jiema （解码） 项目的一部分。
// src/result.rs - 后处理结果
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

//! 所有坐标均为归一化的 [0, 1] 左上角格式 `x, y, width, height`。
//! 结果缓冲在解码器初始化时申请，每次 `run` 就地改写。

use std::sync::Arc;

use crate::labels::{LabelTable, Skeleton};
use crate::mem::PoolVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PpType {
  None,
  Od,
  Mpe,
  Seg,
  Class,
  Pd,
  Spe,
  Iseg,
  Sseg,
}

impl PpType {
  pub fn as_str(&self) -> &'static str {
    match self {
      PpType::None => "none",
      PpType::Od => "od",
      PpType::Mpe => "mpe",
      PpType::Seg => "seg",
      PpType::Class => "class",
      PpType::Pd => "pd",
      PpType::Spe => "spe",
      PpType::Iseg => "iseg",
      PpType::Sseg => "sseg",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
  pub x: f32,
  pub y: f32,
  pub conf: f32,
}

/// 目标检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct OdDetect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
  pub conf: f32,
  pub class_name: Arc<str>,
}

/// 多人姿态 / 手掌检测结果，`keypoints` 长度等于配置的关键点数量
#[derive(Debug, Clone, PartialEq)]
pub struct MpeDetect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
  pub conf: f32,
  pub class_name: Arc<str>,
  pub keypoints: Vec<Keypoint>,
}

/// 实例分割结果，`mask` 为 `mask_size * mask_size` 的 0/1 掩码
#[derive(Debug, Clone, PartialEq)]
pub struct IsegDetect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
  pub conf: f32,
  pub class_name: Arc<str>,
  pub mask: Vec<u8>,
}

#[derive(Debug)]
pub struct OdOutput {
  pub(crate) detects: PoolVec<OdDetect>,
}

impl OdOutput {
  pub fn detects(&self) -> &[OdDetect] {
    &self.detects
  }

  pub fn nb_detect(&self) -> usize {
    self.detects.len()
  }
}

#[derive(Debug)]
pub struct MpeOutput {
  pub(crate) detects: PoolVec<MpeDetect>,
  pub(crate) skeleton: Arc<Skeleton>,
}

impl MpeOutput {
  pub fn detects(&self) -> &[MpeDetect] {
    &self.detects
  }

  pub fn nb_detect(&self) -> usize {
    self.detects.len()
  }

  pub fn skeleton(&self) -> &Skeleton {
    &self.skeleton
  }
}

/// 单人姿态结果
#[derive(Debug)]
pub struct SpeOutput {
  pub(crate) keypoints: PoolVec<Keypoint>,
  pub(crate) skeleton: Arc<Skeleton>,
}

impl SpeOutput {
  pub fn keypoints(&self) -> &[Keypoint] {
    &self.keypoints
  }

  pub fn skeleton(&self) -> &Skeleton {
    &self.skeleton
  }
}

#[derive(Debug)]
pub struct IsegOutput {
  pub(crate) detects: PoolVec<IsegDetect>,
  pub(crate) mask_size: usize,
}

impl IsegOutput {
  pub fn detects(&self) -> &[IsegDetect] {
    &self.detects
  }

  pub fn nb_detect(&self) -> usize {
    self.detects.len()
  }

  pub fn mask_size(&self) -> usize {
    self.mask_size
  }
}

/// 语义分割结果：逐像素类别图，行优先
#[derive(Debug)]
pub struct SsegOutput {
  pub(crate) class_map: PoolVec<u8>,
  pub(crate) width: usize,
  pub(crate) height: usize,
  pub(crate) labels: Arc<LabelTable>,
}

impl SsegOutput {
  pub fn class_map(&self) -> &[u8] {
    &self.class_map
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn num_classes(&self) -> usize {
    self.labels.nb_classes()
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }
}

/// 后处理结果，每个解码器固定产出其中一种
#[derive(Debug)]
pub enum PpResult {
  Od(OdOutput),
  Mpe(MpeOutput),
  Spe(SpeOutput),
  Iseg(IsegOutput),
  Sseg(SsegOutput),
}

impl PpResult {
  pub fn pp_type(&self) -> PpType {
    match self {
      PpResult::Od(_) => PpType::Od,
      PpResult::Mpe(_) => PpType::Mpe,
      PpResult::Spe(_) => PpType::Spe,
      PpResult::Iseg(_) => PpType::Iseg,
      PpResult::Sseg(_) => PpType::Sseg,
    }
  }

  /// 检测类结果至少有一个目标时有效；姿态与语义分割在解码成功后有效
  pub fn is_valid(&self) -> bool {
    match self {
      PpResult::Od(out) => out.nb_detect() > 0,
      PpResult::Mpe(out) => out.nb_detect() > 0,
      PpResult::Iseg(out) => out.nb_detect() > 0,
      PpResult::Spe(out) => !out.keypoints.is_empty(),
      PpResult::Sseg(out) => !out.class_map.is_empty(),
    }
  }

  pub(crate) fn reset(&mut self) {
    match self {
      PpResult::Od(out) => out.detects.clear(),
      PpResult::Mpe(out) => out.detects.clear(),
      PpResult::Iseg(out) => out.detects.clear(),
      PpResult::Spe(out) => out.keypoints.clear(),
      PpResult::Sseg(out) => out.class_map.clear(),
    }
  }

  pub fn as_od(&self) -> Option<&OdOutput> {
    match self {
      PpResult::Od(out) => Some(out),
      _ => None,
    }
  }

  pub fn as_mpe(&self) -> Option<&MpeOutput> {
    match self {
      PpResult::Mpe(out) => Some(out),
      _ => None,
    }
  }

  pub fn as_spe(&self) -> Option<&SpeOutput> {
    match self {
      PpResult::Spe(out) => Some(out),
      _ => None,
    }
  }

  pub fn as_iseg(&self) -> Option<&IsegOutput> {
    match self {
      PpResult::Iseg(out) => Some(out),
      _ => None,
    }
  }

  pub fn as_sseg(&self) -> Option<&SsegOutput> {
    match self {
      PpResult::Sseg(out) => Some(out),
      _ => None,
    }
  }

  /// 检测数量；单人姿态与语义分割恒为 0 或 1
  pub fn nb_detect(&self) -> usize {
    match self {
      PpResult::Od(out) => out.nb_detect(),
      PpResult::Mpe(out) => out.nb_detect(),
      PpResult::Iseg(out) => out.nb_detect(),
      PpResult::Spe(_) | PpResult::Sseg(_) => self.is_valid() as usize,
    }
  }
}
