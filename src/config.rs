// 该文件是 Jiema （解码） 项目的一部分。
// src/config.rs - 后处理 JSON 配置
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

//! 后处理参数可以放在根对象，也可以嵌套在 `postprocess_params` 键下。
//! 解析按字段容错：某个字段缺失或类型错误时跳过该字段，保留默认值。

use serde_json::{Map, Value};
use tracing::warn;

const PARAMS_KEY: &str = "postprocess_params";

#[derive(Debug, Clone, Default)]
pub struct PpConfig {
  params: Option<Map<String, Value>>,
}

impl PpConfig {
  /// 解析 JSON 文本；`None` 或解析失败都得到空配置
  pub fn parse(json: Option<&str>) -> Self {
    let Some(text) = json else {
      return Self::default();
    };

    match serde_json::from_str::<Value>(text) {
      Ok(root) => Self::from_value(root),
      Err(e) => {
        warn!("后处理配置不是合法的 JSON, 使用默认参数: {}", e);
        Self::default()
      }
    }
  }

  pub fn from_value(root: Value) -> Self {
    let params = match root {
      Value::Object(mut map) => match map.remove(PARAMS_KEY) {
        Some(Value::Object(inner)) => Some(inner),
        Some(_) => {
          warn!("`{}` 不是对象, 忽略全部参数", PARAMS_KEY);
          None
        }
        None => Some(map),
      },
      _ => {
        warn!("后处理配置根节点不是对象, 使用默认参数");
        None
      }
    };
    Self { params }
  }

  pub fn is_empty(&self) -> bool {
    self.params.as_ref().is_none_or(Map::is_empty)
  }

  fn get(&self, key: &str) -> Option<&Value> {
    self.params.as_ref()?.get(key)
  }

  pub fn number(&self, key: &str) -> Option<f64> {
    let value = self.get(key)?;
    let number = value.as_f64();
    if number.is_none() {
      warn!("配置字段 `{}` 不是数字, 已忽略", key);
    }
    number
  }

  pub fn f32(&self, key: &str) -> Option<f32> {
    self.number(key).map(|v| v as f32)
  }

  pub fn i32(&self, key: &str) -> Option<i32> {
    self.number(key).map(|v| v as i32)
  }

  /// 非负整数字段，负数视为无效
  pub fn usize(&self, key: &str) -> Option<usize> {
    let v = self.number(key)?;
    if v < 0.0 {
      warn!("配置字段 `{}` 为负数 {}, 已忽略", key, v);
      return None;
    }
    Some(v as usize)
  }

  /// 按下标读取字符串数组的前 `count` 项，非字符串的项为 `None`
  pub fn strings(&self, key: &str, count: usize) -> Option<Vec<Option<String>>> {
    let items = self.array(key)?;
    Some(
      (0..count)
        .map(|i| items.get(i).and_then(Value::as_str).map(str::to_owned))
        .collect(),
    )
  }

  /// 字符串数组的全部项
  pub fn all_strings(&self, key: &str) -> Option<Vec<Option<String>>> {
    let len = self.array(key)?.len();
    self.strings(key, len)
  }

  /// 扁平浮点数组，非数字的项记为 0，空数组视为缺失
  pub fn floats(&self, key: &str) -> Option<Vec<f32>> {
    let items = self.array(key)?;
    if items.is_empty() {
      return None;
    }
    Some(
      items
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect(),
    )
  }

  /// 点数组，同时接受 `[[x, y], ...]` 和扁平的 `[x, y, ...]` 两种写法
  pub fn points(&self, key: &str) -> Option<Vec<[f32; 2]>> {
    let items = self.array(key)?;
    if items.is_empty() {
      return None;
    }

    if items.iter().all(Value::is_array) {
      let points = items
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
          Some([x, y, ..]) => [
            x.as_f64().unwrap_or(0.0) as f32,
            y.as_f64().unwrap_or(0.0) as f32,
          ],
          _ => [0.0, 0.0],
        })
        .collect();
      return Some(points);
    }

    let flat = self.floats(key)?;
    Some(flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
  }

  /// 关键点连线 `[[from, to], ...]`，格式不对或下标超过 255 的项被跳过
  pub fn connections(&self, key: &str) -> Option<Vec<(u8, u8)>> {
    let index = |v: &Value| v.as_u64().and_then(|i| u8::try_from(i).ok());
    let items = self.array(key)?;
    let pairs = items
      .iter()
      .filter_map(|pair| {
        let edge = match pair.as_array().map(Vec::as_slice) {
          Some([from, to]) => index(from).zip(index(to)),
          _ => None,
        };
        if edge.is_none() {
          warn!("配置字段 `{}` 中存在无效连线 {}, 已忽略", key, pair);
        }
        edge
      })
      .collect();
    Some(pairs)
  }

  /// 嵌套对象
  pub fn section(&self, key: &str) -> Option<PpConfig> {
    match self.get(key)? {
      Value::Object(map) => Some(PpConfig {
        params: Some(map.clone()),
      }),
      _ => {
        warn!("配置字段 `{}` 不是对象, 已忽略", key);
        None
      }
    }
  }

  fn array(&self, key: &str) -> Option<&Vec<Value>> {
    let value = self.get(key)?;
    let items = value.as_array();
    if items.is_none() {
      warn!("配置字段 `{}` 不是数组, 已忽略", key);
    }
    items
  }

  /// 字段存在时覆盖目标值
  pub fn override_f32(&self, key: &str, target: &mut f32) {
    if let Some(v) = self.f32(key) {
      *target = v;
    }
  }

  pub fn override_usize(&self, key: &str, target: &mut usize) {
    if let Some(v) = self.usize(key) {
      *target = v;
    }
  }
}
