//! 内容缓存 - 按源 URI 把远程视频缓存到本地目录
//!
//! 每个条目落地为两个文件：
//! - `<sha256(uri)>.bin` 媒体内容
//! - `<sha256(uri)>.json` 元数据（uri、首次下载时间、大小）
//!
//! 下载按块写入 `<key>.bin.tmp`，完成后改名，中途失败不会留下条目。
//! 过期只看首次下载时间，重复读取不会延长寿命。
//! 并发控制只有按 key 的临界区：同一 URI 的并发请求串行执行（只下载一次），
//! 不同 URI 之间互不阻塞，清理扫描也逐个 key 加锁。

pub mod clock;

use crate::error::{CacheError, ClientError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex as KeyMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

pub use clock::{Clock, ManualClock, SystemClock};

/// 默认保留天数
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

const DATA_EXTENSION: &str = "bin";
const META_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";
/// 目录中属于缓存的文件后缀（key 之后的部分）
const ENTRY_SUFFIXES: &[&str] = &["bin", "json", "bin.tmp", "json.tmp"];

/// 媒体内容的分块流
pub type MediaStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// 媒体下载能力（缓存未命中时调用）
///
/// 返回分块流而不是完整内容，缓存边收边写临时文件。
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<MediaStream, ClientError>;
}

/// 条目元数据（sidecar JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    uri: String,
    fetched_at: DateTime<Utc>,
    size: u64,
}

/// 已缓存的媒体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    /// 源 URI
    pub uri: String,
    /// 本地文件路径
    pub path: PathBuf,
    /// 字节数
    pub size: u64,
    /// 首次下载时间
    pub fetched_at: DateTime<Utc>,
}

impl MediaHandle {
    /// 打开本地文件（读取媒体元信息等）
    pub async fn open(&self) -> io::Result<fs::File> {
        fs::File::open(&self.path).await
    }

    /// 按源 URI 扩展名推断 MIME 类型
    pub fn mime_hint(&self) -> &'static str {
        let path = self.uri.split(['?', '#']).next().unwrap_or_default();
        let name = path.rsplit('/').next().unwrap_or_default();
        let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("mp4") | None => "video/mp4",
            Some(_) => "application/octet-stream",
        }
    }
}

/// 内容缓存
pub struct ContentCache {
    root: PathBuf,
    retention: chrono::Duration,
    fetcher: Arc<dyn MediaFetcher>,
    clock: Arc<dyn Clock>,
    key_locks: Mutex<HashMap<String, KeySlot>>,
}

/// 单个 key 的锁及其持有/等待者数量
struct KeySlot {
    lock: Arc<KeyMutex<()>>,
    users: usize,
}

/// 单个 key 的临界区，释放时回收空闲的锁
///
/// 在等待锁之前创建，等待被取消时同样会登记释放。
struct KeyGuard<'a> {
    cache: &'a ContentCache,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.cache.release_key_lock(&self.key);
    }
}

impl ContentCache {
    /// 创建缓存
    pub fn new(root: impl Into<PathBuf>, retention_days: u32, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self {
            root: root.into(),
            retention: chrono::Duration::days(i64::from(retention_days)),
            fetcher,
            clock: Arc::new(SystemClock),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 替换时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 设置保留时长（精确到秒，测试用）
    pub fn with_retention(mut self, retention: chrono::Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> chrono::Duration {
        self.retention
    }

    /// URI 对应的条目 key
    pub fn entry_key(uri: &str) -> String {
        hex::encode(Sha256::digest(uri.as_bytes()))
    }

    /// 获取媒体：命中未过期条目直接返回，否则下载并落地
    pub async fn get_or_fetch(&self, uri: &str) -> Result<MediaHandle, CacheError> {
        let key = Self::entry_key(uri);
        let _guard = self.lock_key(&key).await;

        match self.read_meta(&key).await {
            Some(meta) if !self.is_expired(&meta) => {
                if let Some(handle) = self.handle_if_present(&key, meta).await {
                    debug!(uri = %uri, "Cache hit");
                    return Ok(handle);
                }
            }
            Some(meta) => {
                debug!(uri = %uri, fetched_at = %meta.fetched_at, "Cache entry expired");
                self.remove_entry_files(&key).await?;
            }
            None => {}
        }

        self.store(uri, &key).await
    }

    /// 返回已缓存条目的本地文件，不存在或已过期时返回 `CacheError::Miss`
    pub async fn resolve_local_file(&self, uri: &str) -> Result<MediaHandle, CacheError> {
        let key = Self::entry_key(uri);
        let _guard = self.lock_key(&key).await;

        match self.read_meta(&key).await {
            Some(meta) if !self.is_expired(&meta) => self
                .handle_if_present(&key, meta)
                .await
                .ok_or_else(|| CacheError::Miss(uri.to_string())),
            _ => Err(CacheError::Miss(uri.to_string())),
        }
    }

    /// 删除过期条目（以及损坏、残缺的条目），返回删除数量
    pub async fn remove_expired(&self) -> Result<usize, CacheError> {
        let keys = match self.scan_keys().await {
            Ok(keys) => keys,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for key in keys {
            let _guard = self.lock_key(&key).await;
            let leftovers = self.remove_temp_files(&key).await?;
            if leftovers > 0 {
                debug!(key = %key, leftovers, "Removed unfinished cache writes");
            }
            let stale = match self.read_meta(&key).await {
                Some(meta) => {
                    self.is_expired(&meta)
                        || !fs::try_exists(self.data_path(&key)).await.unwrap_or(false)
                }
                None => true,
            };
            if stale {
                self.remove_entry_files(&key).await?;
                removed += 1;
                debug!(key = %key, "Removed cache entry");
            }
        }

        if removed > 0 {
            info!(removed, root = %self.root.display(), "Expired cache entries removed");
        }
        Ok(removed)
    }

    /// 列出当前有效条目（按下载时间排序）
    pub async fn entries(&self) -> Result<Vec<MediaHandle>, CacheError> {
        let keys = match self.scan_keys().await {
            Ok(keys) => keys,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut handles = Vec::new();
        for key in keys {
            if let Some(meta) = self.read_meta(&key).await {
                if self.is_expired(&meta) {
                    continue;
                }
                if let Some(handle) = self.handle_if_present(&key, meta).await {
                    handles.push(handle);
                }
            }
        }
        handles.sort_by_key(|h| h.fetched_at);
        Ok(handles)
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, DATA_EXTENSION))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, META_EXTENSION))
    }

    fn is_expired(&self, meta: &EntryMeta) -> bool {
        self.clock.now() - meta.fetched_at > self.retention
    }

    async fn lock_key(&self, key: &str) -> KeyGuard<'_> {
        let lock = {
            let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
            let slot = locks.entry(key.to_string()).or_insert_with(|| KeySlot {
                lock: Arc::new(KeyMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            slot.lock.clone()
        };
        let mut key_guard = KeyGuard {
            cache: self,
            key: key.to_string(),
            guard: None,
        };
        key_guard.guard = Some(lock.lock_owned().await);
        key_guard
    }

    fn release_key_lock(&self, key: &str) {
        let mut locks = self.key_locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = locks.get_mut(key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                locks.remove(key);
            }
        }
    }

    async fn scan_keys(&self) -> io::Result<BTreeSet<String>> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut keys = BTreeSet::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some((stem, suffix)) = name.to_str().and_then(|n| n.split_once('.')) else {
                continue;
            };
            if ENTRY_SUFFIXES.contains(&suffix) {
                keys.insert(stem.to_string());
            }
        }
        Ok(keys)
    }

    async fn read_meta(&self, key: &str) -> Option<EntryMeta> {
        let content = fs::read(self.meta_path(key)).await.ok()?;
        match serde_json::from_slice(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupted cache metadata");
                None
            }
        }
    }

    async fn handle_if_present(&self, key: &str, meta: EntryMeta) -> Option<MediaHandle> {
        let path = self.data_path(key);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return None;
        }
        Some(MediaHandle {
            uri: meta.uri,
            path,
            size: meta.size,
            fetched_at: meta.fetched_at,
        })
    }

    /// 下载并落地，调用方需持有该 key 的锁
    async fn store(&self, uri: &str, key: &str) -> Result<MediaHandle, CacheError> {
        fs::create_dir_all(&self.root).await?;

        let data_path = self.data_path(key);
        let partial_path = temp_path(&data_path);
        let size = match self.download_to(uri, &partial_path).await {
            Ok(size) => size,
            Err(e) => {
                remove_if_exists(&partial_path).await?;
                return Err(e);
            }
        };

        let meta = EntryMeta {
            uri: uri.to_string(),
            fetched_at: self.clock.now(),
            size,
        };
        let meta_json = serde_json::to_vec(&meta)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // 先写数据再写元数据，元数据存在即代表条目完整
        fs::rename(&partial_path, &data_path).await?;
        write_atomic(&self.meta_path(key), &meta_json).await?;

        info!(uri = %uri, size = meta.size, "Media cached");
        Ok(MediaHandle {
            uri: meta.uri,
            path: data_path,
            size: meta.size,
            fetched_at: meta.fetched_at,
        })
    }

    /// 把下载流逐块写入 `path`，返回字节数
    async fn download_to(&self, uri: &str, path: &Path) -> Result<u64, CacheError> {
        let fetch_error = |source: ClientError| CacheError::Fetch {
            uri: uri.to_string(),
            source,
        };

        let mut stream = self.fetcher.fetch(uri).await.map_err(fetch_error)?;
        let mut file = fs::File::create(path).await?;
        let mut size = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(fetch_error)?;
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.sync_all().await?;
        debug!(uri = %uri, size, "Media downloaded");
        Ok(size)
    }

    async fn remove_entry_files(&self, key: &str) -> io::Result<()> {
        remove_if_exists(&self.meta_path(key)).await?;
        remove_if_exists(&self.data_path(key)).await?;
        Ok(())
    }

    /// 删除未完成的写入（中断的下载、未改名的元数据），返回删除数量
    async fn remove_temp_files(&self, key: &str) -> io::Result<usize> {
        let mut removed = 0;
        for path in [temp_path(&self.data_path(key)), temp_path(&self.meta_path(key))] {
            if remove_if_exists(&path).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

async fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// 写临时文件后原子替换
async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = temp_path(path);
    fs::write(&temp, bytes).await?;
    fs::rename(&temp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct FakeFetcher {
        online: AtomicBool,
        /// 发出第一块后连接中断
        truncate: AtomicBool,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                online: AtomicBool::new(true),
                truncate: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaFetcher for FakeFetcher {
        async fn fetch(&self, uri: &str) -> Result<MediaStream, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if !self.online.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("network unreachable".to_string()));
            }
            let tail = if self.truncate.load(Ordering::SeqCst) {
                Err(ClientError::Transport("connection reset".to_string()))
            } else {
                Ok(Bytes::from(uri.to_string()))
            };
            Ok(stream::iter(vec![Ok(Bytes::from_static(b"bytes of ")), tail]).boxed())
        }
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn setup(fetcher: Arc<FakeFetcher>) -> (TempDir, Arc<ManualClock>, ContentCache) {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(start_time()));
        let cache = ContentCache::new(dir.path().join("media"), 7, fetcher).with_clock(clock.clone());
        (dir, clock, cache)
    }

    #[test]
    fn test_mime_hint_from_uri() {
        let handle = |uri: &str| MediaHandle {
            uri: uri.to_string(),
            path: PathBuf::from("/tmp/x.bin"),
            size: 0,
            fetched_at: start_time(),
        };
        assert_eq!(handle("http://x/promo.MP4?sig=abc").mime_hint(), "video/mp4");
        assert_eq!(handle("http://x/a.jpeg").mime_hint(), "image/jpeg");
        assert_eq!(handle("http://x/a.webm").mime_hint(), "application/octet-stream");
        assert_eq!(handle("http://cdn.example.com/media/42").mime_hint(), "video/mp4");
    }

    #[tokio::test]
    async fn test_get_or_fetch_stores_and_hits() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, _clock, cache) = setup(fetcher.clone());

        let first = cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        assert_eq!(first.size, "bytes of http://x/v.mp4".len() as u64);
        assert_eq!(first.fetched_at, start_time());
        assert_eq!(
            tokio::fs::read(&first.path).await.unwrap(),
            b"bytes of http://x/v.mp4"
        );

        fetcher.online.store(false, Ordering::SeqCst);
        let second = cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_cache() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.online.store(false, Ordering::SeqCst);
        let (_dir, _clock, cache) = setup(fetcher);

        let err = cache.get_or_fetch("http://x/v.mp4").await.unwrap_err();
        assert!(matches!(err, CacheError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_retention_is_ingestion_based() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, clock, cache) = setup(fetcher.clone());

        cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        clock.advance(chrono::Duration::days(4));
        cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        assert_eq!(fetcher.calls(), 1);

        // 读取不会延长寿命
        clock.advance(chrono::Duration::days(4));
        assert!(matches!(
            cache.resolve_local_file("http://x/v.mp4").await,
            Err(CacheError::Miss(_))
        ));

        let refreshed = cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(refreshed.fetched_at, start_time() + chrono::Duration::days(8));
    }

    #[tokio::test]
    async fn test_resolve_local_file_requires_fetch_first() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, _clock, cache) = setup(fetcher);

        assert!(matches!(
            cache.resolve_local_file("http://x/v.mp4").await,
            Err(CacheError::Miss(_))
        ));

        let handle = cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        let local = cache.resolve_local_file("http://x/v.mp4").await.unwrap();
        assert_eq!(local, handle);
        assert!(local.open().await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_expired_is_idempotent() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, clock, cache) = setup(fetcher);

        cache.get_or_fetch("http://x/old.mp4").await.unwrap();
        clock.advance(chrono::Duration::days(6));
        cache.get_or_fetch("http://x/new.mp4").await.unwrap();
        clock.advance(chrono::Duration::days(2));

        assert_eq!(cache.remove_expired().await.unwrap(), 1);
        let after_first: Vec<String> = cache.entries().await.unwrap().into_iter().map(|h| h.uri).collect();
        assert_eq!(cache.remove_expired().await.unwrap(), 0);
        let after_second: Vec<String> = cache.entries().await.unwrap().into_iter().map(|h| h.uri).collect();

        assert_eq!(after_first, vec!["http://x/new.mp4".to_string()]);
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_remove_expired_on_missing_root() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, _clock, cache) = setup(fetcher);
        assert_eq!(cache.remove_expired().await.unwrap(), 0);
        assert!(cache.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_expired_cleans_orphans() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, _clock, cache) = setup(fetcher);

        cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        let orphan = cache.root().join(format!("{}.bin", ContentCache::entry_key("http://x/gone.mp4")));
        tokio::fs::write(&orphan, b"partial").await.unwrap();

        assert_eq!(cache.remove_expired().await.unwrap(), 1);
        assert!(!orphan.exists());
        assert_eq!(cache.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_nothing() {
        let fetcher = Arc::new(FakeFetcher::new());
        fetcher.truncate.store(true, Ordering::SeqCst);
        let (_dir, _clock, cache) = setup(fetcher.clone());

        let err = cache.get_or_fetch("http://x/v.mp4").await.unwrap_err();
        match err {
            CacheError::Fetch { uri, source } => {
                assert_eq!(uri, "http://x/v.mp4");
                assert_eq!(source, ClientError::Transport("connection reset".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(std::fs::read_dir(cache.root()).unwrap().count(), 0);
        assert!(matches!(
            cache.resolve_local_file("http://x/v.mp4").await,
            Err(CacheError::Miss(_))
        ));

        // 恢复后重新完整下载
        fetcher.truncate.store(false, Ordering::SeqCst);
        let handle = cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        assert_eq!(
            tokio::fs::read(&handle.path).await.unwrap(),
            b"bytes of http://x/v.mp4"
        );
    }

    #[tokio::test]
    async fn test_remove_expired_cleans_temp_files() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, _clock, cache) = setup(fetcher);

        cache.get_or_fetch("http://x/v.mp4").await.unwrap();
        let live_key = ContentCache::entry_key("http://x/v.mp4");
        let stray_meta = cache.root().join(format!("{}.json.tmp", live_key));
        let partial = cache
            .root()
            .join(format!("{}.bin.tmp", ContentCache::entry_key("http://x/gone.mp4")));
        tokio::fs::write(&stray_meta, b"{").await.unwrap();
        tokio::fs::write(&partial, b"partial").await.unwrap();

        assert_eq!(cache.remove_expired().await.unwrap(), 1);
        assert!(!stray_meta.exists());
        assert!(!partial.exists());
        assert_eq!(cache.entries().await.unwrap().len(), 1);
        assert_eq!(cache.remove_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_key_lock() {
        let fetcher = Arc::new(FakeFetcher {
            delay: Duration::from_millis(200),
            ..FakeFetcher::new()
        });
        let (_dir, _clock, cache) = setup(fetcher.clone());
        let cache = Arc::new(cache);

        let holder = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_or_fetch("http://x/v.mp4").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_or_fetch("http://x/v.mp4").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());
        holder.await.unwrap().unwrap();

        assert!(cache.key_locks.lock().unwrap().is_empty());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_key_downloads_once() {
        let fetcher = Arc::new(FakeFetcher {
            delay: Duration::from_millis(50),
            ..FakeFetcher::new()
        });
        let (_dir, _clock, cache) = setup(fetcher.clone());

        let (a, b) = tokio::join!(
            cache.get_or_fetch("http://x/v.mp4"),
            cache.get_or_fetch("http://x/v.mp4")
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fetcher.calls(), 1);
        assert!(cache.key_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_fetch_independently() {
        let fetcher = Arc::new(FakeFetcher::new());
        let (_dir, _clock, cache) = setup(fetcher.clone());

        let (a, b) = tokio::join!(
            cache.get_or_fetch("http://x/a.mp4"),
            cache.get_or_fetch("http://x/b.mp4")
        );
        assert_ne!(a.unwrap().path, b.unwrap().path);
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_entry_key_is_stable_hex() {
        let key = ContentCache::entry_key("http://x/v.mp4");
        assert_eq!(key.len(), 64);
        assert_eq!(key, ContentCache::entry_key("http://x/v.mp4"));
        assert_ne!(key, ContentCache::entry_key("http://x/w.mp4"));
    }
}
