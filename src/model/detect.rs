// 该文件是 Jiema （解码） 项目的一部分。
// src/model/detect.rs - 检测类解码器
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

use tracing::{debug, error, info};

use super::{Decoder, DetectionSettings, bind_inputs};
use crate::error::PpError;
use crate::kernel::{Candidate, DetectKernel, nms};
use crate::labels::{LabelTable, Skeleton};
use crate::mem::{BufferPool, PoolVec, filled};
use crate::project::{clamp_keypoints, project};
use crate::result::{
  IsegDetect, IsegOutput, Keypoint, MpeDetect, MpeOutput, OdDetect, OdOutput, PpResult, PpType,
};
use crate::tensor::{Quantization, RawTensor, TensorSpec};

/// 检测结果的形态
#[derive(Debug, Clone)]
pub(crate) enum DetectionKind {
  Od,
  Mpe(Arc<Skeleton>),
  Iseg,
}

struct DetectionState {
  candidates: PoolVec<Candidate>,
  result: PpResult,
}

/// 所有检测类家族共用的解码器：内核解码、NMS、投影
pub(crate) struct DetectionDecoder<K> {
  name: &'static str,
  kernel: K,
  settings: DetectionSettings,
  labels: Arc<LabelTable>,
  quants: Vec<Quantization>,
  pp_type: PpType,
  state: Option<DetectionState>,
}

impl<K: DetectKernel> DetectionDecoder<K> {
  /// 申请候选缓冲与结果缓冲；任一申请失败时已申请的缓冲随之释放
  pub(crate) fn new(
    name: &'static str,
    kernel: K,
    mut settings: DetectionSettings,
    labels: LabelTable,
    quants: Vec<Quantization>,
    kind: DetectionKind,
    pool: &BufferPool,
  ) -> Result<Self, PpError> {
    let candidates = pool.slots(kernel.max_candidates(), 0, |_| Candidate::default())?;

    // 输出数量不会超过候选数量
    settings.max_boxes = settings.max_boxes.min(kernel.max_candidates());
    let limit = settings.max_boxes;
    let fallback = labels.fallback().clone();
    let (pp_type, result) = match kind {
      DetectionKind::Od => {
        let detects = pool.slots(limit, 0, |_| OdDetect {
          x: 0.0,
          y: 0.0,
          width: 0.0,
          height: 0.0,
          conf: 0.0,
          class_name: fallback.clone(),
        })?;
        (PpType::Od, PpResult::Od(OdOutput { detects }))
      }
      DetectionKind::Mpe(skeleton) => {
        let nb_keypoints = kernel.nb_keypoints();
        let extra = nb_keypoints.saturating_mul(std::mem::size_of::<Keypoint>());
        let detects = pool.try_slots(limit, extra, |_| {
          Ok(MpeDetect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            conf: 0.0,
            class_name: fallback.clone(),
            keypoints: filled(nb_keypoints, Keypoint::default())?,
          })
        })?;
        (PpType::Mpe, PpResult::Mpe(MpeOutput { detects, skeleton }))
      }
      DetectionKind::Iseg => {
        let mask_size = kernel.mask_size();
        let mask_len = mask_size * mask_size;
        let detects = pool.try_slots(limit, mask_len, |_| {
          Ok(IsegDetect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            conf: 0.0,
            class_name: fallback.clone(),
            mask: filled(mask_len, 0u8)?,
          })
        })?;
        (PpType::Iseg, PpResult::Iseg(IsegOutput { detects, mask_size }))
      }
    };

    info!(
      "{}: 初始化完成, 类别数 {}, 候选容量 {}, 最多输出 {} 个, 置信度阈值 {}, NMS 阈值 {}",
      name,
      labels.nb_classes(),
      kernel.max_candidates(),
      limit,
      settings.confidence,
      settings.nms
    );

    Ok(Self {
      name,
      kernel,
      settings,
      labels: Arc::new(labels),
      quants,
      pp_type,
      state: Some(DetectionState { candidates, result }),
    })
  }
}

impl<K: DetectKernel> Decoder for DetectionDecoder<K> {
  fn name(&self) -> &'static str {
    self.name
  }

  fn pp_type(&self) -> PpType {
    self.pp_type
  }

  fn input_spec(&self) -> &[TensorSpec] {
    self.kernel.input_spec()
  }

  fn is_ready(&self) -> bool {
    self.state.is_some()
  }

  fn run(&mut self, inputs: &[RawTensor<'_>]) -> Result<&PpResult, PpError> {
    let Some(state) = self.state.as_mut() else {
      error!("{}: 解码器未初始化或已释放", self.name);
      return Err(PpError::NotReady { family: self.name });
    };

    let views = bind_inputs(self.name, self.kernel.input_spec(), &self.quants, inputs)?;
    state.result.reset();
    state.candidates.clear();

    self
      .kernel
      .decode(&views, self.settings.confidence, &mut state.candidates)?;
    let nb_candidates = state.candidates.len();
    nms(&mut state.candidates, self.settings.nms);

    let kernel = &self.kernel;
    let labels = &self.labels;
    let limit = self.settings.max_boxes;
    let nb_detect = match &mut state.result {
      PpResult::Od(out) => project(&state.candidates, labels, limit, &mut out.detects, |_, _| {}),
      PpResult::Mpe(out) => project(
        &state.candidates,
        labels,
        limit,
        &mut out.detects,
        |cand, detect| {
          kernel.keypoints(&views, cand, &mut detect.keypoints);
          clamp_keypoints(&mut detect.keypoints);
        },
      ),
      PpResult::Iseg(out) => project(
        &state.candidates,
        labels,
        limit,
        &mut out.detects,
        |cand, detect| kernel.mask(&views, cand, &mut detect.mask),
      ),
      PpResult::Spe(_) | PpResult::Sseg(_) => 0,
    };

    debug!(
      "{}: 候选 {} 个, NMS 后 {} 个, 输出 {} 个",
      self.name,
      nb_candidates,
      state.candidates.len(),
      nb_detect
    );
    Ok(&state.result)
  }

  fn deinit(&mut self) {
    if self.state.take().is_some() {
      info!("{}: 已释放全部缓冲", self.name);
    }
  }

  fn set_confidence_threshold(&mut self, threshold: f32) {
    self.settings.confidence = threshold;
  }

  fn confidence_threshold(&self) -> f32 {
    self.settings.confidence
  }

  fn set_nms_threshold(&mut self, threshold: f32) {
    self.settings.nms = threshold;
  }

  fn nms_threshold(&self) -> f32 {
    self.settings.nms
  }
}
