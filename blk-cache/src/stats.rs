/// 缓存统计信息
///
/// 只用于观测，不影响缓存内容。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 命中次数
    pub hits: u64,
    /// 未命中（需要从存储加载）次数
    pub misses: u64,
    /// 覆盖了有效块的装载次数
    pub evictions: u64,
    /// 装载失败次数（seek/read 错误或到达存储末尾）
    pub load_failures: u64,
    /// flush 成功写回的块数
    pub flushed_blocks: u64,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}
