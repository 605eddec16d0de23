// 随机读取校验（Verification Harness）
//
// 生成已知内容的文件，通过缓存做随机范围读取，并与原始内容逐字节比对。

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use blk_cache::{AgingBlockCache, CacheConfig, CacheStats, IoStorage};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// 文件内容：第 i 个字节为 i mod 256
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// 生成测试文件
pub fn gen_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(data)
        .with_context(|| format!("Failed to write {} bytes", data.len()))?;
    Ok(())
}

/// 一次校验运行的汇总
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub iterations: usize,
    pub out_of_range: usize,
    pub bytes_verified: u64,
    pub stats: CacheStats,
}

/// 随机读取并校验
///
/// # 参数
/// - `path`: 由 [`gen_file`] 生成的文件
/// - `expected`: 文件原始内容
/// - `config`: 缓存配置
/// - `iterations`: 读取次数
/// - `seed`: 随机种子
///
/// 读取位置取自 `[0, 2 * len)`，超出文件的位置必须返回 0 字节。
pub fn verify_reads(
    path: &Path,
    expected: &[u8],
    config: CacheConfig,
    iterations: usize,
    seed: u64,
) -> Result<RunSummary> {
    let storage = IoStorage::open(path, false)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut cache = AgingBlockCache::try_new(config, storage)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let len = expected.len();
    let mut buf = vec![0u8; len.max(1)];
    let mut out_of_range = 0;
    let mut bytes_verified = 0u64;

    for i in 0..iterations {
        let pos = rng.gen_range(0..(len as u64 * 2).max(1));
        let n = rng.gen_range(0..len.max(1));

        let outcome = cache.read(pos, &mut buf[..n]);
        if let Some(e) = outcome.error() {
            bail!("Iteration {}: read at {} failed: {}", i, pos, e);
        }

        if pos as usize >= len {
            if outcome.bytes != 0 {
                bail!(
                    "Iteration {}: read at {} past end returned {} bytes",
                    i,
                    pos,
                    outcome.bytes
                );
            }
            out_of_range += 1;
            continue;
        }

        let start = pos as usize;
        let end = (start + n).min(len);
        if outcome.bytes != end - start || buf[..outcome.bytes] != expected[start..end] {
            bail!(
                "Iteration {}: mismatch at {} (requested {}, got {})",
                i,
                pos,
                n,
                outcome.bytes
            );
        }

        log::debug!("Iteration {}: verified {} bytes at {}", i, outcome.bytes, pos);
        bytes_verified += outcome.bytes as u64;
    }

    Ok(RunSummary {
        iterations,
        out_of_range,
        bytes_verified,
        stats: cache.stats(),
    })
}
