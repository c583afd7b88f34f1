// 该文件是 Jiema （解码） 项目的一部分。
// src/error.rs - 错误定义
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

use thiserror::Error;

use crate::tensor::DType;

/// 解码内核错误，由 `run` 原样向上传递
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
  #[error("输入张量 {index} 长度不足: 期望至少 {expected}, 实际 {actual}")]
  ShortInput {
    index: usize,
    expected: usize,
    actual: usize,
  },
  #[error("锚框数量不足: 需要 {expected} 个值, 实际 {actual} 个")]
  AnchorMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PpError {
  #[error("{family}: 缺少必需的锚框配置 `{key}`")]
  MissingAnchors {
    family: &'static str,
    key: &'static str,
  },
  #[error("{family}: 锚框配置 `{key}` 无效, 需要 {expected} 个值, 实际 {actual} 个")]
  InvalidAnchors {
    family: &'static str,
    key: &'static str,
    expected: usize,
    actual: usize,
  },
  #[error("{family}: 配置无效: {reason}")]
  InvalidConfig {
    family: &'static str,
    reason: String,
  },
  #[error("内存池不足: 申请 {requested} 字节, 剩余 {available} 字节")]
  OutOfMemory { requested: usize, available: usize },
  #[error("{family}: 预期输入张量数量为 {expected}, 实际为 {actual}")]
  InputCount {
    family: &'static str,
    expected: usize,
    actual: usize,
  },
  #[error("{family}: 输入张量 {index} 类型错误: 期望 {expected:?}, 实际 {actual:?}")]
  InputType {
    family: &'static str,
    index: usize,
    expected: DType,
    actual: DType,
  },
  #[error("{family}: 解码器未初始化或已释放")]
  NotReady { family: &'static str },
  #[error("解码错误: {0}")]
  Decode(#[from] KernelError),
}
