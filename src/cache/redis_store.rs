//! Redis Tier
//!
//! Remote, shared primary tier. The connection is established lazily and
//! dropped after I/O failures or timeouts, so the next operation reconnects.
//! Every operation runs under a deadline; a timeout is reported like any
//! other tier failure.
//!
//! Only one connect attempt runs at a time. While it is in flight, and for
//! `reconnect_backoff` after it fails, operations fail fast with
//! [`CacheError::Unavailable`] so an outage never queues requests behind the
//! connect deadline.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::cache::CacheBackend;
use crate::error::{CacheError, CacheResult};

// == Redis Store Config ==
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379/0`
    pub url: String,
    /// Prepended to every key written by this process
    pub namespace: String,
    /// Deadline for a single command
    pub operation_timeout: Duration,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
    /// How long operations fail fast after a failed connect
    pub reconnect_backoff: Duration,
    /// COUNT hint for each SCAN page
    pub scan_count: usize,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            namespace: "transit:".to_string(),
            operation_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(2),
            reconnect_backoff: Duration::from_secs(5),
            scan_count: 500,
        }
    }
}

// == Link State ==
enum Link {
    /// No connection; the next operation starts an attempt
    Idle,
    /// An attempt is in flight
    Connecting,
    Ready(ConnectionManager),
    /// Last attempt failed; retry once `until` has passed
    Down { until: Instant },
}

fn lock(link: &Mutex<Link>) -> MutexGuard<'_, Link> {
    link.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Milliseconds for `SET .. PX`. PX rejects zero, so sub-millisecond TTLs
/// round up; TTLs beyond `u64` milliseconds saturate.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Escapes SCAN MATCH metacharacters so `text` matches only itself.
fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

// == Redis Store ==
pub struct RedisStore {
    config: RedisStoreConfig,
    client: Client,
    link: Arc<Mutex<Link>>,
}

impl RedisStore {
    /// Validates the URL. No connection is made until [`CacheBackend::connect`]
    /// or the first operation.
    pub fn new(config: RedisStoreConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str())?;

        Ok(Self {
            config,
            client,
            link: Arc::new(Mutex::new(Link::Idle)),
        })
    }

    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.namespace, key)
    }

    /// Returns the live connection, or starts an attempt when none is in
    /// flight and the backoff has passed.
    async fn connection(&self) -> CacheResult<ConnectionManager> {
        {
            let mut link = lock(&self.link);
            match &*link {
                Link::Ready(conn) => return Ok(conn.clone()),
                Link::Connecting => {
                    return Err(CacheError::Unavailable(
                        "Redis connection attempt in progress".to_string(),
                    ))
                }
                Link::Down { until } if Instant::now() < *until => {
                    return Err(CacheError::Unavailable(
                        "Redis unreachable, waiting to reconnect".to_string(),
                    ))
                }
                Link::Idle | Link::Down { .. } => {}
            }
            *link = Link::Connecting;
        }

        self.establish().await
    }

    /// Runs the connect on its own task, which records the outcome even if
    /// the caller is cancelled. A panic inside the client's handshake is
    /// reported as an unavailable tier.
    async fn establish(&self) -> CacheResult<ConnectionManager> {
        let client = self.client.clone();
        let link = Arc::clone(&self.link);
        let connect_timeout = self.config.connect_timeout;
        let backoff = self.config.reconnect_backoff;
        let url = self.config.url.clone();

        let attempt = tokio::spawn(async move {
            let result = match timeout(connect_timeout, ConnectionManager::new(client)).await {
                Ok(Ok(conn)) => Ok(conn),
                Ok(Err(err)) => Err(CacheError::from(err)),
                Err(_) => Err(CacheError::Timeout(connect_timeout)),
            };

            let mut state = lock(&link);
            match &result {
                Ok(conn) => {
                    *state = Link::Ready(conn.clone());
                    info!(url = %url, "Connected to Redis");
                }
                Err(err) => {
                    *state = Link::Down {
                        until: Instant::now() + backoff,
                    };
                    warn!(
                        url = %url,
                        error = %err,
                        retry_in = ?backoff,
                        "Redis connect failed"
                    );
                }
            }
            result
        });

        match attempt.await {
            Ok(result) => result,
            Err(err) => {
                *lock(&self.link) = Link::Down {
                    until: Instant::now() + backoff,
                };
                error!(url = %self.config.url, error = %err, "Redis connect aborted");
                Err(CacheError::Unavailable(format!("Redis connect aborted: {}", err)))
            }
        }
    }

    fn reset(&self) {
        let mut link = lock(&self.link);
        if matches!(*link, Link::Ready(_)) {
            *link = Link::Idle;
            warn!(url = %self.config.url, "Dropped Redis connection; will reconnect on next use");
        }
    }

    /// Runs one command against the connection under the operation deadline.
    async fn run<T, F, Fut>(&self, op: F) -> CacheResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let conn = self.connection().await?;

        match timeout(self.config.operation_timeout, op(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
                    self.reset();
                }
                Err(err.into())
            }
            Err(_) => {
                self.reset();
                Err(CacheError::Timeout(self.config.operation_timeout))
            }
        }
    }

    /// Collects every namespaced key matching `glob` with SCAN, one page per
    /// command so no single call blocks the server.
    async fn scan_keys(&self, glob: String) -> CacheResult<Vec<String>> {
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let glob = glob.clone();
            let count = self.config.scan_count;
            let (next, page): (u64, Vec<String>) = self
                .run(|mut conn| async move {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(glob)
                        .arg("COUNT")
                        .arg(count)
                        .query_async(&mut conn)
                        .await
                })
                .await?;

            keys.extend(page);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }
}

#[async_trait]
impl CacheBackend for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> CacheResult<()> {
        self.connection().await.map(|_| ())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let full_key = self.full_key(key);
        self.run(|mut conn| async move { conn.get::<_, Option<String>>(full_key).await })
            .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let full_key = self.full_key(key);
        let value = value.to_string();
        let ttl_ms = ttl_millis(ttl);

        self.run(|mut conn| async move {
            redis::cmd("SET")
                .arg(full_key)
                .arg(value)
                .arg("PX")
                .arg(ttl_ms)
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let full_key = self.full_key(key);
        let removed: u64 = self
            .run(|mut conn| async move { conn.del::<_, u64>(full_key).await })
            .await?;
        Ok(removed > 0)
    }

    fn supports_pattern_delete(&self) -> bool {
        true
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let glob = format!(
            "{}*{}*",
            escape_glob(&self.config.namespace),
            escape_glob(pattern)
        );
        let keys = self.scan_keys(glob).await?;

        let mut removed = 0;
        for chunk in keys.chunks(self.config.scan_count.max(1)) {
            let chunk = chunk.to_vec();
            let count: u64 = self.run(|mut conn| async move { conn.del::<_, u64>(chunk).await }).await?;
            removed += count;
        }

        debug!(pattern = %pattern, removed, "Redis pattern delete finished");
        Ok(removed)
    }

    async fn close(&self) -> CacheResult<()> {
        *lock(&self.link) = Link::Idle;
        info!(url = %self.config.url, "Redis connection closed");
        Ok(())
    }
}
