// 该文件是 Jiema （解码） 项目的一部分。
// src/mem.rs - 大块内存池抽象
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

//! 解码器的输出缓冲与临时缓冲都从 [`BufferPool`] 申请。
//! 内存池只做字节记账：每次申请得到一个 [`Lease`]，释放时自动归还，
//! 这样测试可以检查申请与释放次数是否平衡。

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::error::PpError;

#[derive(Debug, Default)]
struct PoolInner {
  capacity: Option<usize>,
  in_use: AtomicUsize,
  peak: AtomicUsize,
  allocations: AtomicUsize,
  releases: AtomicUsize,
}

/// 内存池统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
  pub allocations: usize,
  pub releases: usize,
  pub bytes_in_use: usize,
  pub peak_bytes: usize,
}

impl PoolStats {
  /// 尚未归还的租约数量
  pub fn live(&self) -> usize {
    self.allocations - self.releases
  }
}

/// 可克隆的内存池句柄，克隆体共享同一份记账
#[derive(Debug, Clone, Default)]
pub struct BufferPool {
  inner: Arc<PoolInner>,
}

impl BufferPool {
  /// 不限容量的内存池
  pub fn unbounded() -> Self {
    Self::default()
  }

  /// 限定总字节数的内存池，超出时申请失败
  pub fn with_capacity(bytes: usize) -> Self {
    Self {
      inner: Arc::new(PoolInner {
        capacity: Some(bytes),
        ..PoolInner::default()
      }),
    }
  }

  pub fn stats(&self) -> PoolStats {
    PoolStats {
      allocations: self.inner.allocations.load(Ordering::Acquire),
      releases: self.inner.releases.load(Ordering::Acquire),
      bytes_in_use: self.inner.in_use.load(Ordering::Acquire),
      peak_bytes: self.inner.peak.load(Ordering::Acquire),
    }
  }

  /// 申请 `bytes` 字节的租约
  pub fn lease(&self, bytes: usize) -> Result<Lease, PpError> {
    let inner = &self.inner;
    let reserved = inner
      .in_use
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
        let next = used.checked_add(bytes)?;
        match inner.capacity {
          Some(cap) if next > cap => None,
          _ => Some(next),
        }
      });

    match reserved {
      Ok(previous) => {
        inner.peak.fetch_max(previous + bytes, Ordering::AcqRel);
        inner.allocations.fetch_add(1, Ordering::AcqRel);
        Ok(Lease {
          pool: Arc::clone(inner),
          bytes,
        })
      }
      Err(used) => {
        let available = inner.capacity.unwrap_or(usize::MAX).saturating_sub(used);
        warn!("内存池不足: 申请 {} 字节, 剩余 {} 字节", bytes, available);
        Err(PpError::OutOfMemory {
          requested: bytes,
          available,
        })
      }
    }
  }

  /// 申请 `capacity` 个槽位的定长缓冲，`extra_bytes` 为每个槽位内部额外占用的字节数
  pub fn slots<T>(
    &self,
    capacity: usize,
    extra_bytes: usize,
    mut init: impl FnMut(usize) -> T,
  ) -> Result<PoolVec<T>, PpError> {
    self.try_slots(capacity, extra_bytes, |i| Ok(init(i)))
  }

  /// 槽位的构造本身也可能申请内存并失败；失败时租约随之归还
  pub fn try_slots<T>(
    &self,
    capacity: usize,
    extra_bytes: usize,
    mut init: impl FnMut(usize) -> Result<T, PpError>,
  ) -> Result<PoolVec<T>, PpError> {
    let bytes = capacity.saturating_mul(std::mem::size_of::<T>().saturating_add(extra_bytes));
    let lease = self.lease(bytes)?;
    debug!("申请缓冲: {} 个槽位, {} 字节", capacity, bytes);

    let mut slots = reserve(capacity)?;
    for i in 0..capacity {
      slots.push(init(i)?);
    }
    Ok(PoolVec {
      slots,
      len: 0,
      _lease: lease,
    })
  }
}

/// 预留 `len` 个元素的空间，系统分配失败时返回 [`PpError::OutOfMemory`]
///
/// 不限容量的内存池不做字节限制，超大的申请在这里失败。
pub fn reserve<T>(len: usize) -> Result<Vec<T>, PpError> {
  let mut items = Vec::new();
  items.try_reserve_exact(len).map_err(|e| {
    let requested = len.saturating_mul(std::mem::size_of::<T>());
    warn!("系统内存不足: 申请 {} 字节, {}", requested, e);
    PpError::OutOfMemory {
      requested,
      available: 0,
    }
  })?;
  Ok(items)
}

/// 长度为 `len`、元素均为 `value` 的向量
pub fn filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>, PpError> {
  let mut items = reserve(len)?;
  items.resize(len, value);
  Ok(items)
}

/// 内存池租约，析构时归还
#[derive(Debug)]
pub struct Lease {
  pool: Arc<PoolInner>,
  bytes: usize,
}

impl Drop for Lease {
  fn drop(&mut self) {
    self.pool.in_use.fetch_sub(self.bytes, Ordering::AcqRel);
    self.pool.releases.fetch_add(1, Ordering::AcqRel);
  }
}

/// 从内存池申请的定长槽位缓冲
///
/// 槽位在申请时全部构造完毕，之后只改写内容、不再分配；
/// `len` 记录当前有效的槽位数量。
#[derive(Debug)]
pub struct PoolVec<T> {
  slots: Vec<T>,
  len: usize,
  _lease: Lease,
}

impl<T> PoolVec<T> {
  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  pub fn is_full(&self) -> bool {
    self.len == self.slots.len()
  }

  pub fn clear(&mut self) {
    self.len = 0;
  }

  pub fn truncate(&mut self, len: usize) {
    self.len = self.len.min(len);
  }

  /// 将有效长度设为 `len`（不超过容量），返回实际长度
  pub fn activate(&mut self, len: usize) -> usize {
    self.len = len.min(self.slots.len());
    self.len
  }

  /// 写入一个值，缓冲已满时返回 `false`
  pub fn push(&mut self, value: T) -> bool {
    self.push_with(|slot| *slot = value)
  }

  /// 就地改写下一个槽位，缓冲已满时返回 `false`
  pub fn push_with(&mut self, fill: impl FnOnce(&mut T)) -> bool {
    match self.slots.get_mut(self.len) {
      Some(slot) => {
        fill(slot);
        self.len += 1;
        true
      }
      None => false,
    }
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    &mut self.slots[..self.len]
  }
}

impl<T> Deref for PoolVec<T> {
  type Target = [T];

  fn deref(&self) -> &Self::Target {
    &self.slots[..self.len]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lease_and_release_are_balanced() {
    let pool = BufferPool::unbounded();
    {
      let _a = pool.lease(16).unwrap();
      let _b = pool.slots(4, 0, |_| 0u32).unwrap();
      let stats = pool.stats();
      assert_eq!(stats.allocations, 2);
      assert_eq!(stats.bytes_in_use, 32);
    }
    let stats = pool.stats();
    assert_eq!(stats.live(), 0);
    assert_eq!(stats.bytes_in_use, 0);
    assert_eq!(stats.peak_bytes, 32);
  }

  #[test]
  fn bounded_pool_rejects_oversized_lease() {
    let pool = BufferPool::with_capacity(10);
    let _held = pool.lease(8).unwrap();
    let err = pool.lease(4).unwrap_err();
    assert_eq!(
      err,
      PpError::OutOfMemory {
        requested: 4,
        available: 2
      }
    );
    assert_eq!(pool.stats().allocations, 1);
  }

  #[test]
  fn unreservable_slots_fail_without_leaking() {
    let pool = BufferPool::unbounded();
    let err = pool.slots(usize::MAX / 4, 0, |_| 0u64).unwrap_err();
    assert!(matches!(err, PpError::OutOfMemory { .. }));
    let stats = pool.stats();
    assert_eq!(stats.allocations, 1);
    assert_eq!(stats.live(), 0);
    assert_eq!(stats.bytes_in_use, 0);
  }

  #[test]
  fn failing_slot_init_returns_lease() {
    let pool = BufferPool::unbounded();
    let err = pool
      .try_slots(3, 0, |i| match i {
        2 => filled(usize::MAX / 2, 0u32),
        _ => filled(1, 0u32),
      })
      .unwrap_err();
    assert!(matches!(err, PpError::OutOfMemory { .. }));
    assert_eq!(pool.stats().live(), 0);
  }

  #[test]
  fn pool_vec_stops_at_capacity() {
    let pool = BufferPool::unbounded();
    let mut buf = pool.slots(2, 0, |_| 0i32).unwrap();
    assert!(buf.push(1));
    assert!(buf.push(2));
    assert!(!buf.push(3));
    assert_eq!(&buf[..], &[1, 2]);
    buf.truncate(1);
    assert_eq!(&buf[..], &[1]);
    buf.clear();
    assert!(buf.is_empty());
    assert_eq!(buf.activate(5), 2);
  }
}
