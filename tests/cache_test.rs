use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use proximity_display::cache::{MediaFetcher, MediaStream};
use proximity_display::error::{CacheError, ClientError};
use proximity_display::{ContentCache, ManualClock};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct Network {
    online: AtomicBool,
    downloads: AtomicUsize,
}

impl Network {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            downloads: AtomicUsize::new(0),
        })
    }

    fn go_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaFetcher for Network {
    async fn fetch(&self, uri: &str) -> Result<MediaStream, ClientError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("network unreachable".to_string()));
        }
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let chunks: Vec<Result<Bytes, ClientError>> = uri
            .as_bytes()
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}

fn setup() -> (TempDir, Arc<Network>, Arc<ManualClock>, ContentCache) {
    let dir = TempDir::new().unwrap();
    let network = Network::new();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
    ));
    let cache = ContentCache::new(dir.path(), 7, network.clone()).with_clock(clock.clone());
    (dir, network, clock, cache)
}

async fn membership(cache: &ContentCache) -> BTreeSet<String> {
    cache
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.uri)
        .collect()
}

#[tokio::test]
async fn test_second_fetch_is_served_offline() {
    let (_dir, network, _clock, cache) = setup();

    let first = cache.get_or_fetch("http://x/promo.mp4").await.unwrap();
    assert_eq!(first.size, "http://x/promo.mp4".len() as u64);
    assert_eq!(std::fs::read(&first.path).unwrap(), b"http://x/promo.mp4");
    network.go_offline();
    let second = cache.get_or_fetch("http://x/promo.mp4").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(network.downloads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_offline_miss_is_fetch_error() {
    let (_dir, network, _clock, cache) = setup();
    network.go_offline();

    let err = cache.get_or_fetch("http://x/new.mp4").await.unwrap_err();
    match err {
        CacheError::Fetch { uri, source } => {
            assert_eq!(uri, "http://x/new.mp4");
            assert_eq!(source.kind(), "transport");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_sweep_twice_yields_same_membership() {
    let (_dir, _network, clock, cache) = setup();

    cache.get_or_fetch("http://x/old.mp4").await.unwrap();
    clock.advance(ChronoDuration::days(5));
    cache.get_or_fetch("http://x/new.mp4").await.unwrap();
    clock.advance(ChronoDuration::days(3));

    let removed = cache.remove_expired().await.unwrap();
    let after_first = membership(&cache).await;
    assert_eq!(removed, 1);

    assert_eq!(cache.remove_expired().await.unwrap(), 0);
    let after_second = membership(&cache).await;

    assert_eq!(after_first, after_second);
    assert_eq!(
        after_second,
        BTreeSet::from(["http://x/new.mp4".to_string()])
    );
}

#[tokio::test]
async fn test_reads_do_not_extend_retention() {
    let (_dir, network, clock, cache) = setup();

    cache.get_or_fetch("http://x/a.mp4").await.unwrap();
    for _ in 0..6 {
        clock.advance(ChronoDuration::days(1));
        cache.resolve_local_file("http://x/a.mp4").await.unwrap();
    }

    clock.advance(ChronoDuration::days(2));
    assert!(matches!(
        cache.resolve_local_file("http://x/a.mp4").await,
        Err(CacheError::Miss(_))
    ));

    // 过期后重新下载
    cache.get_or_fetch("http://x/a.mp4").await.unwrap();
    assert_eq!(network.downloads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sweep_runs_alongside_fetches() {
    let (_dir, network, clock, cache) = setup();
    let cache = Arc::new(cache);

    cache.get_or_fetch("http://x/stale.mp4").await.unwrap();
    clock.advance(ChronoDuration::days(8));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let cache = cache.clone();
        tasks.push(tokio::spawn(async move {
            cache.get_or_fetch(&format!("http://x/{}.mp4", i)).await
        }));
    }
    let sweep = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.remove_expired().await })
    };

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    sweep.await.unwrap().unwrap();

    let members = membership(&cache).await;
    assert_eq!(members.len(), 8);
    assert!(!members.contains("http://x/stale.mp4"));
    assert_eq!(network.downloads.load(Ordering::SeqCst), 9);
}
