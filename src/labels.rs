// 该文件是 Jiema （解码） 项目的一部分。
// src/labels.rs - 类别名称与关键点骨架
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

use tracing::warn;

use crate::config::PpConfig;

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// Pascal VOC 语义分割类别（含背景）
pub const VOC_CLASSES: [&str; 21] = [
  "background",
  "aeroplane",
  "bicycle",
  "bird",
  "boat",
  "bottle",
  "bus",
  "car",
  "cat",
  "chair",
  "cow",
  "diningtable",
  "dog",
  "horse",
  "motorbike",
  "person",
  "pottedplant",
  "sheep",
  "sofa",
  "train",
  "tvmonitor",
];

/// 类别名称表
///
/// 类别下标满足 `0 <= idx < nb_classes` 且配置了名称时返回该名称，
/// 其余情况一律返回回退名称。
#[derive(Debug, Clone)]
pub struct LabelTable {
  nb_classes: usize,
  /// 只保存配置过的名称，长度不超过 `nb_classes`
  names: Vec<Option<Arc<str>>>,
  fallback: Arc<str>,
}

impl LabelTable {
  pub fn new(names: Vec<Option<String>>, fallback: &str) -> Self {
    Self::with_classes(names.len(), names, fallback)
  }

  pub fn with_classes(nb_classes: usize, mut names: Vec<Option<String>>, fallback: &str) -> Self {
    names.truncate(nb_classes);
    Self {
      nb_classes,
      names: names.into_iter().map(|n| n.map(Arc::from)).collect(),
      fallback: Arc::from(fallback),
    }
  }

  /// 从配置的 `class_names` 读取前 `nb_classes` 项；
  /// 未配置且内置表长度恰好等于类别数时使用内置表
  pub fn from_config(cfg: &PpConfig, nb_classes: usize, fallback: &str, builtin: &[&str]) -> Self {
    let names = match cfg.all_strings("class_names") {
      Some(names) => names,
      None if builtin.len() == nb_classes => builtin.iter().map(|n| Some(n.to_string())).collect(),
      None => Vec::new(),
    };
    Self::with_classes(nb_classes, names, fallback)
  }

  pub fn nb_classes(&self) -> usize {
    self.nb_classes
  }

  pub fn fallback(&self) -> &Arc<str> {
    &self.fallback
  }

  pub fn get(&self, class_index: usize) -> Option<&Arc<str>> {
    self.names.get(class_index)?.as_ref()
  }

  pub fn resolve(&self, class_index: i32) -> Arc<str> {
    usize::try_from(class_index)
      .ok()
      .and_then(|idx| self.get(idx))
      .unwrap_or(&self.fallback)
      .clone()
  }
}

/// 关键点名称与骨架连线
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
  pub nb_keypoints: usize,
  /// 配置过的关键点名称，长度不超过 `nb_keypoints`
  pub keypoint_names: Vec<Option<Arc<str>>>,
  pub connections: Vec<(u8, u8)>,
}

impl Skeleton {
  pub fn from_config(cfg: &PpConfig, nb_keypoints: usize) -> Self {
    let keypoint_names = cfg
      .all_strings("keypoint_names")
      .unwrap_or_default()
      .into_iter()
      .take(nb_keypoints)
      .map(|n| n.map(Arc::from))
      .collect();

    let connections = cfg
      .connections("keypoint_connections")
      .unwrap_or_default()
      .into_iter()
      .filter(|&(from, to)| {
        let valid = (from as usize) < nb_keypoints && (to as usize) < nb_keypoints;
        if !valid {
          warn!("关键点连线 ({}, {}) 超出关键点数量 {}, 已忽略", from, to, nb_keypoints);
        }
        valid
      })
      .collect();

    Self {
      nb_keypoints,
      keypoint_names,
      connections,
    }
  }

  pub fn nb_keypoints(&self) -> usize {
    self.nb_keypoints
  }

  pub fn keypoint_name(&self, index: usize) -> Option<&str> {
    self.keypoint_names.get(index)?.as_deref()
  }
}
