// 该文件是 Jiema （解码） 项目的一部分。
// src/input.rs - 张量文件输入
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

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::frame::TensorFrame;
use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("目录 {0} 中没有 .bin 张量文件")]
  Empty(PathBuf),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

const TENSOR_FILE_SCHEME: &str = "tensor";
const TENSOR_FILE_EXT: &str = "bin";

/// 从磁盘读取一帧原始输出
///
/// `tensor:///path/out.bin` 读取单个张量；`tensor:///path/dir` 读取目录中全部
/// `.bin` 文件，按文件名排序后依次作为第 0、1、... 个输入。
pub struct TensorFileInput {
  frame: Option<TensorFrame>,
}

impl FromUrlWithScheme for TensorFileInput {
  const SCHEME: &'static str = TENSOR_FILE_SCHEME;
}

impl FromUrl for TensorFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch);
    }

    let path = Path::new(url.path());
    let files = if path.is_dir() {
      list_tensor_files(path)?
    } else {
      vec![path.to_path_buf()]
    };

    let blobs = files
      .iter()
      .map(|file| {
        debug!("读取张量文件: {}", file.display());
        fs::read(file)
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(TensorFileInput {
      frame: Some(TensorFrame::from(blobs)),
    })
  }
}

fn list_tensor_files(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
  let mut files = fs::read_dir(dir)?
    .map(|entry| entry.map(|entry| entry.path()))
    .collect::<Result<Vec<_>, _>>()?;
  files.retain(|file| file.extension().is_some_and(|ext| ext == TENSOR_FILE_EXT));
  files.sort();

  if files.is_empty() {
    return Err(InputError::Empty(dir.to_path_buf()));
  }
  Ok(files)
}

impl Iterator for TensorFileInput {
  type Item = TensorFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frame.take()
  }
}
