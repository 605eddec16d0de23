// 块缓存配置（Cache Configuration）
//
// 提供块缓存的配置管理功能，支持：
// - 默认配置（1024 字节块，8 个槽位）
// - 配置校验（块大小必须是 2 的幂）
// - 从 TOML 文件加载

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// 默认块大小（字节）
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// 默认槽位数量
pub const DEFAULT_SLOT_COUNT: usize = 8;

/// 块缓存配置
///
/// 创建后不可变。存储句柄与读写回调不属于配置，
/// 由 [`crate::AgingBlockCache::new`] 单独传入。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 块大小（字节），必须是 2 的幂
    pub block_size: usize,
    /// 同时缓存的块数量
    pub slot_count: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            slot_count: DEFAULT_SLOT_COUNT,
        }
    }
}

impl CacheConfig {
    /// 设置块大小
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// 设置槽位数量
    pub fn with_slot_count(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self
    }

    /// 校验配置
    ///
    /// # 返回
    /// - `Ok(())`: 配置合法
    /// - `Err(CacheError::InvalidConfig)`: 块大小为 0 或不是 2 的幂，或槽位数为 0
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || !self.block_size.is_power_of_two() {
            return Err(CacheError::InvalidConfig(format!(
                "block_size={} (must be a non-zero power of two)",
                self.block_size
            )));
        }

        if self.slot_count == 0 {
            return Err(CacheError::InvalidConfig(
                "slot_count=0 (must be at least 1)".to_string(),
            ));
        }

        Ok(())
    }

    /// 从 TOML 字符串解析配置，缺省字段使用默认值
    ///
    /// # 示例
    /// ```
    /// use blk_cache::CacheConfig;
    ///
    /// let config = CacheConfig::from_toml_str("block_size = 32\nslot_count = 4").unwrap();
    /// assert_eq!(config.block_size, 32);
    /// assert_eq!(config.slot_count, 4);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CacheConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// 将位置向下对齐到块起始
    ///
    /// 仅在 `block_size` 为 2 的幂时结果正确。
    #[inline]
    pub fn align_down(&self, pos: u64) -> u64 {
        pos & !(self.block_size as u64 - 1)
    }
}
