//! # blk-cache - 块对齐老化读缓存
//!
//! 位于任意偏移字节读取与底层可寻址存储之间的固定容量读缓存。
//! 适用于以较大对齐块为高效访问单位的存储（文件、块设备、远端对象等）。
//!
//! ## 模块组织
//!
//! ```text
//! blk-cache
//! ├── config    # 块大小 / 槽位数配置，TOML 加载
//! ├── storage   # Storage 能力接口与 std 流适配器
//! ├── slot      # 缓存槽位与有界年龄计数
//! ├── cache     # AgingBlockCache：查找、淘汰、读取、flush
//! ├── stats     # 命中率等观测计数
//! └── error     # 错误类型
//! ```
//!
//! ## 使用方式
//!
//! ```
//! use std::io::Cursor;
//! use blk_cache::{AgingBlockCache, CacheConfig, IoStorage};
//!
//! let data: Vec<u8> = (0..1024).map(|i| (i % 256) as u8).collect();
//! let config = CacheConfig::default().with_block_size(32).with_slot_count(4);
//! let mut cache = AgingBlockCache::new(config, IoStorage::new(Cursor::new(data)));
//!
//! let mut buf = [0u8; 50];
//! let outcome = cache.read(100, &mut buf);
//! assert!(outcome.is_complete());
//! assert_eq!(buf[0], 100);
//! ```
//!
//! 缓存不做内部加锁，多线程访问需由调用方串行化。

pub mod cache;
pub mod config;
pub mod error;
pub mod slot;
pub mod stats;
pub mod storage;

pub use cache::{AgingBlockCache, ReadOutcome, ReadStatus};
pub use config::{CacheConfig, DEFAULT_BLOCK_SIZE, DEFAULT_SLOT_COUNT};
pub use error::{CacheError, Result};
pub use slot::{AGE_FLOOR, AGE_MAX, Age};
pub use stats::CacheStats;
pub use storage::{IoStorage, Storage};
