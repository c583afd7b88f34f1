// 该文件是 Jiema （解码） 项目的一部分。
// src/output.rs - 结果输出
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

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::frame::TensorFrame;
use crate::result::{Keypoint, PpResult};
use crate::{FromUrl, FromUrlWithScheme};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("输出文件锁已损坏")]
  Poisoned,
}

fn keypoints_json(keypoints: &[Keypoint]) -> Value {
  keypoints
    .iter()
    .map(|kp| json!([kp.x, kp.y, kp.conf]))
    .collect()
}

/// 结果的 JSON 表示，掩码与类别图只输出尺寸
pub fn result_to_json(result: &PpResult) -> Value {
  let objects: Vec<Value> = match result {
    PpResult::Od(out) => out
      .detects()
      .iter()
      .map(|d| {
        json!({
          "x": d.x, "y": d.y, "width": d.width, "height": d.height,
          "conf": d.conf, "class": &*d.class_name,
        })
      })
      .collect(),
    PpResult::Mpe(out) => out
      .detects()
      .iter()
      .map(|d| {
        json!({
          "x": d.x, "y": d.y, "width": d.width, "height": d.height,
          "conf": d.conf, "class": &*d.class_name,
          "keypoints": keypoints_json(&d.keypoints),
        })
      })
      .collect(),
    PpResult::Iseg(out) => out
      .detects()
      .iter()
      .map(|d| {
        json!({
          "x": d.x, "y": d.y, "width": d.width, "height": d.height,
          "conf": d.conf, "class": &*d.class_name,
          "mask_pixels": d.mask.iter().filter(|&&m| m != 0).count(),
        })
      })
      .collect(),
    PpResult::Spe(out) => vec![json!({ "keypoints": keypoints_json(out.keypoints()) })],
    PpResult::Sseg(out) => vec![json!({
      "width": out.width(),
      "height": out.height(),
      "num_classes": out.num_classes(),
    })],
  };

  json!({
    "type": result.pp_type().as_str(),
    "valid": result.is_valid(),
    "nb_detect": result.nb_detect(),
    "objects": objects,
  })
}

/// `log://` 把结果写到日志
#[derive(Debug, Default)]
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch);
    }
    Ok(LogOutput)
  }
}

impl Render<TensorFrame, PpResult> for LogOutput {
  type Error = OutputError;

  fn render_result(&self, _frame: &TensorFrame, result: &PpResult) -> Result<(), Self::Error> {
    info!(
      "结果类型 {}, 数量 {}",
      result.pp_type().as_str(),
      result.nb_detect()
    );
    match result {
      PpResult::Od(out) => {
        for d in out.detects() {
          info!(
            "  {} {:.3} [{:.3}, {:.3}, {:.3}, {:.3}]",
            d.class_name, d.conf, d.x, d.y, d.width, d.height
          );
        }
      }
      PpResult::Mpe(out) => {
        for d in out.detects() {
          info!(
            "  {} {:.3} [{:.3}, {:.3}, {:.3}, {:.3}] {} 个关键点",
            d.class_name,
            d.conf,
            d.x,
            d.y,
            d.width,
            d.height,
            d.keypoints.len()
          );
        }
      }
      PpResult::Iseg(out) => {
        for d in out.detects() {
          info!(
            "  {} {:.3} [{:.3}, {:.3}, {:.3}, {:.3}]",
            d.class_name, d.conf, d.x, d.y, d.width, d.height
          );
        }
      }
      PpResult::Spe(out) => {
        let skeleton = out.skeleton();
        for (i, kp) in out.keypoints().iter().enumerate() {
          let name = skeleton.keypoint_name(i).unwrap_or("?");
          info!("  {} {:.3} ({:.3}, {:.3})", name, kp.conf, kp.x, kp.y);
        }
      }
      PpResult::Sseg(out) => {
        info!("  类别图 {}x{}", out.width(), out.height());
      }
    }
    Ok(())
  }
}

/// `jsonl:///path/out.jsonl` 每次追加一行 JSON
pub struct JsonLinesOutput {
  file: Mutex<File>,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch);
    }
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(url.path())?;
    Ok(JsonLinesOutput {
      file: Mutex::new(file),
    })
  }
}

impl Render<TensorFrame, PpResult> for JsonLinesOutput {
  type Error = OutputError;

  fn render_result(&self, _frame: &TensorFrame, result: &PpResult) -> Result<(), Self::Error> {
    let mut line = result_to_json(result);
    line["time"] = json!(Utc::now().to_rfc3339());
    let mut file = self.file.lock().map_err(|_| OutputError::Poisoned)?;
    serde_json::to_writer(&mut *file, &line)?;
    writeln!(file)?;
    Ok(())
  }
}

pub enum OutputWrapper {
  Log(LogOutput),
  JsonLines(JsonLinesOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      LogOutput::SCHEME => Ok(OutputWrapper::Log(LogOutput::from_url(url)?)),
      JsonLinesOutput::SCHEME => Ok(OutputWrapper::JsonLines(JsonLinesOutput::from_url(url)?)),
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render<TensorFrame, PpResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &TensorFrame, result: &PpResult) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Log(output) => output.render_result(frame, result),
      OutputWrapper::JsonLines(output) => output.render_result(frame, result),
    }
  }
}
