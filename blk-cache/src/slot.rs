//! 缓存槽位与年龄计数器
//!
//! 年龄是一个有界的近似 LRU 计数器：命中或加载时递增，其他块未命中时衰减。
//!
//! 衰减策略为“下限为 1”（floor-at-one）：一旦槽位装载了有效数据，
//! 衰减不会使其变为空闲，只有最小年龄淘汰或 flush 才会让出该槽位。

/// 年龄上限
pub const AGE_MAX: u8 = 100;

/// 有效槽位衰减的下限
pub const AGE_FLOOR: u8 = 1;

/// 槽位年龄
///
/// `0` 表示空闲，`1..=AGE_MAX` 表示持有有效块。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Age(u8);

impl Age {
    /// 空闲槽位
    pub const FREE: Age = Age(0);

    /// 刚加载的块
    pub const FRESH: Age = Age(1);

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_free(self) -> bool {
        self.0 == 0
    }

    /// 访问一次：递增，饱和于 `AGE_MAX`
    pub fn touch(&mut self) {
        if !self.is_free() && self.0 < AGE_MAX {
            self.0 += 1;
        }
    }

    /// 衰减一次：有效槽位不低于 `AGE_FLOOR`，空闲槽位保持空闲
    pub fn decay(&mut self) {
        if self.0 > AGE_FLOOR {
            self.0 -= 1;
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

/// 缓存槽位
///
/// 缓冲区在构造时分配一次，之后只改写内容，不再重新分配。
#[derive(Debug)]
pub struct CacheSlot {
    /// 块起始偏移，仅在 `age > 0` 时有意义
    block_start: u64,
    /// 块数据，容量为 `block_size`
    buf: Box<[u8]>,
    /// `buf` 中有效字节数
    valid_len: usize,
    age: Age,
}

impl CacheSlot {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_start: 0,
            buf: vec![0u8; block_size].into_boxed_slice(),
            valid_len: 0,
            age: Age::FREE,
        }
    }

    pub fn block_start(&self) -> u64 {
        self.block_start
    }

    pub fn valid_len(&self) -> usize {
        self.valid_len
    }

    pub fn age(&self) -> Age {
        self.age
    }

    pub fn is_valid(&self) -> bool {
        !self.age.is_free()
    }

    /// 是否持有 `block_start` 对应的块
    pub fn holds(&self, block_start: u64) -> bool {
        self.is_valid() && self.block_start == block_start
    }

    pub fn touch(&mut self) {
        self.age.touch();
    }

    pub fn decay(&mut self) {
        self.age.decay();
    }

    /// 标记为空闲，缓冲区内容保留但不再可信
    pub fn invalidate(&mut self) {
        self.age.clear();
    }

    /// 为装载准备整块缓冲区，同时使槽位失效直到 [`CacheSlot::fill`] 完成
    pub fn begin_load(&mut self, block_start: u64) -> &mut [u8] {
        self.block_start = block_start;
        self.valid_len = 0;
        self.age.clear();
        &mut self.buf
    }

    /// 完成装载
    pub fn fill(&mut self, valid_len: usize) {
        debug_assert!(valid_len <= self.buf.len());
        self.valid_len = valid_len.min(self.buf.len());
        self.age = Age::FRESH;
    }

    /// 有效数据
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.valid_len]
    }

    /// 从块内偏移 `offset` 开始的有效数据，越界时为空
    pub fn data_from(&self, offset: usize) -> &[u8] {
        self.data().get(offset..).unwrap_or(&[])
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}
