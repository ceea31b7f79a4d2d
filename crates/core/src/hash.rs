use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

const CHUNK_SIZE: usize = 1 << 20;

pub fn file_hash(path: &Path) -> Result<u64> {
    let mut file = File::open(path)
        .with_context(|| format!("ハッシュ対象を開けませんでした: {}", path.display()))?;

    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("ハッシュ対象を読めませんでした: {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.digest())
}

pub fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let len_a = fs::metadata(a)
        .with_context(|| format!("ファイル情報を取得できませんでした: {}", a.display()))?
        .len();
    let len_b = fs::metadata(b)
        .with_context(|| format!("ファイル情報を取得できませんでした: {}", b.display()))?
        .len();
    if len_a != len_b {
        return Ok(false);
    }

    Ok(file_hash(a)? == file_hash(b)?)
}
