//! Cache-Aside Wrappers
//!
//! Higher-order functions that take an async function value and return a new
//! callable value:
//!
//! - [`cached`] memoizes the function's result in the [`TieredCache`], keyed
//!   by its arguments.
//! - [`invalidate_cache`] runs a mutating function and, only if it succeeds,
//!   deletes an exact key or clears a key pattern.
//!
//! Errors from the wrapped function pass through unchanged, and neither
//! wrapper touches the cache when one occurs. Concurrent misses on the same
//! key are not coalesced: each caller runs the function and writes its
//! result, last writer wins.

use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{build_key, IntoKeyArgs, PatternInvalidation, TieredCache};

/// TTL used by [`cached`] unless overridden
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Computes a cache key directly from a call's arguments.
pub type KeyFunction<A> = Arc<dyn Fn(&A) -> String + Send + Sync>;

type WrappedFn<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

fn erase<A, T, E, F, Fut>(func: F) -> WrappedFn<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move |args: A| func(args).boxed())
}

// == Cache Options ==
/// Configuration for [`cached`].
pub struct CacheOptions<A> {
    ttl: Duration,
    prefix: Option<String>,
    key_function: Option<KeyFunction<A>>,
}

impl<A> CacheOptions<A> {
    pub fn new() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            prefix: None,
            key_function: None,
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Key prefix. Defaults to the source location of the [`cached`] call,
    /// so each wrapper gets its own keys.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Replaces prefix-plus-arguments key building entirely.
    pub fn key_function<K>(mut self, key_function: K) -> Self
    where
        K: Fn(&A) -> String + Send + Sync + 'static,
    {
        self.key_function = Some(Arc::new(key_function));
        self
    }
}

impl<A> Default for CacheOptions<A> {
    fn default() -> Self {
        Self::new()
    }
}

// == Cached ==
/// Read-through wrapper returned by [`cached`]. Clones share the function
/// and the store.
pub struct Cached<A, T, E> {
    cache: Arc<TieredCache>,
    ttl: Duration,
    prefix: String,
    key_function: Option<KeyFunction<A>>,
    func: WrappedFn<A, T, E>,
}

impl<A, T, E> Clone for Cached<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
            prefix: self.prefix.clone(),
            key_function: self.key_function.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

/// Wraps `func` so its results are served from `cache` when present.
#[track_caller]
pub fn cached<A, T, E, F, Fut>(
    cache: Arc<TieredCache>,
    options: CacheOptions<A>,
    func: F,
) -> Cached<A, T, E>
where
    A: IntoKeyArgs + Send + 'static,
    T: Serialize + DeserializeOwned + Send + 'static,
    E: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let caller = Location::caller();
    let prefix = options
        .prefix
        .unwrap_or_else(|| format!("{}:{}:{}", caller.file(), caller.line(), caller.column()));

    Cached {
        cache,
        ttl: options.ttl,
        prefix,
        key_function: options.key_function,
        func: erase(func),
    }
}

impl<A, T, E> Cached<A, T, E>
where
    A: IntoKeyArgs,
    T: Serialize + DeserializeOwned,
{
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Key this wrapper reads and writes for `args`.
    pub fn key_for(&self, args: &A) -> String {
        match &self.key_function {
            Some(key_function) => key_function(args),
            None => build_key(&self.prefix, &args.key_args()),
        }
    }

    /// Returns the cached result for `args`, or runs the function and caches
    /// its `Ok` result.
    pub async fn call(&self, args: A) -> Result<T, E> {
        let key = self.key_for(&args);

        if let Some(hit) = self.cache.get::<T>(&key).await {
            return Ok(hit);
        }

        let value = (self.func)(args).await?;
        if !self.cache.set(&key, &value, self.ttl).await {
            debug!(key = %key, "Result computed but not cached");
        }
        Ok(value)
    }
}

// == Invalidate Options ==
/// Configuration for [`invalidate_cache`]. A key function wins over a prefix
/// when both are set; with neither, the wrapper only runs the function.
pub struct InvalidateOptions<A> {
    prefix: Option<String>,
    key_function: Option<KeyFunction<A>>,
}

impl<A> InvalidateOptions<A> {
    pub fn new() -> Self {
        Self {
            prefix: None,
            key_function: None,
        }
    }

    /// Clear every key containing `prefix` after a successful call.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Delete exactly the key computed from the call's arguments.
    pub fn key_function<K>(mut self, key_function: K) -> Self
    where
        K: Fn(&A) -> String + Send + Sync + 'static,
    {
        self.key_function = Some(Arc::new(key_function));
        self
    }
}

impl<A> Default for InvalidateOptions<A> {
    fn default() -> Self {
        Self::new()
    }
}

// == Invalidating ==
/// Invalidate-after-write wrapper returned by [`invalidate_cache`].
pub struct Invalidating<A, T, E> {
    cache: Arc<TieredCache>,
    prefix: Option<String>,
    key_function: Option<KeyFunction<A>>,
    func: WrappedFn<A, T, E>,
}

impl<A, T, E> Clone for Invalidating<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            prefix: self.prefix.clone(),
            key_function: self.key_function.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

/// Wraps a mutating `func` so matching cache entries are dropped after it
/// succeeds.
pub fn invalidate_cache<A, T, E, F, Fut>(
    cache: Arc<TieredCache>,
    options: InvalidateOptions<A>,
    func: F,
) -> Invalidating<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Invalidating {
        cache,
        prefix: options.prefix,
        key_function: options.key_function,
        func: erase(func),
    }
}

impl<A, T, E> Invalidating<A, T, E> {
    /// Runs the function; on success invalidates, then returns its value.
    pub async fn call(&self, args: A) -> Result<T, E> {
        // Computed up front: the arguments move into the function.
        let key = self.key_function.as_ref().map(|key_function| key_function(&args));

        let value = (self.func)(args).await?;

        if let Some(key) = key {
            self.cache.delete(&key).await;
        } else if let Some(prefix) = &self.prefix {
            match self.cache.clear_pattern(prefix).await {
                PatternInvalidation::Cleared { removed } => {
                    debug!(prefix = %prefix, removed, "Invalidated cached entries")
                }
                outcome => {
                    warn!(prefix = %prefix, ?outcome, "Cached entries may be stale until they expire")
                }
            }
        }

        Ok(value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::mock::ScriptedBackend;
    use crate::cache::{KeyArgs, LocalStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> (Arc<ScriptedBackend>, Arc<TieredCache>) {
        let primary = Arc::new(ScriptedBackend::new("primary", true));
        let cache = Arc::new(TieredCache::new(
            primary.clone(),
            Arc::new(LocalStore::new(100)),
        ));
        (primary, cache)
    }

    fn counted_square(
        cache: Arc<TieredCache>,
        calls: Arc<AtomicUsize>,
    ) -> Cached<u64, u64, String> {
        cached(cache, CacheOptions::new().prefix("square"), move |n: u64| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(n * n)
            }
        })
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let (_, cache) = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let square = counted_square(cache, calls.clone());

        assert_eq!(square.call(4).await, Ok(16));
        assert_eq!(square.call(4).await, Ok(16));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(square.call(5).await, Ok(25));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_key_uses_prefix_and_args() {
        let (primary, cache) = store();
        let square = counted_square(cache, Arc::new(AtomicUsize::new(0)));

        assert_eq!(square.key_for(&9), "square:9");
        square.call(9).await.unwrap();
        assert!(primary.contains("square:9"));
    }

    #[tokio::test]
    async fn test_default_prefix_is_call_site() {
        async fn lookup(_: ()) -> Result<u8, ()> {
            Ok(1)
        }

        let (_, cache) = store();
        let wrapped = cached(cache, CacheOptions::new(), lookup);
        assert!(wrapped.prefix().starts_with(file!()));
        assert_eq!(wrapped.ttl(), DEFAULT_TTL);
    }

    #[tokio::test]
    async fn test_unprefixed_closures_do_not_share_keys() {
        let (_, cache) = store();
        let routes = cached(cache.clone(), CacheOptions::new(), |id: u64| async move {
            Ok::<_, ()>(format!("route {}", id))
        });
        let stops = cached(cache, CacheOptions::new(), |id: u64| async move {
            Ok::<_, ()>(format!("stop {}", id))
        });

        assert_ne!(routes.prefix(), stops.prefix());
        assert_eq!(routes.call(1).await, Ok("route 1".to_string()));
        assert_eq!(stops.call(1).await, Ok("stop 1".to_string()));
    }

    #[tokio::test]
    async fn test_key_function_overrides_key_builder() {
        let (primary, cache) = store();
        let options = CacheOptions::new()
            .prefix("ignored")
            .key_function(|args: &KeyArgs| format!("custom:{}", args.signature()));
        let wrapped = cached(cache, options, |_: KeyArgs| async { Ok::<_, ()>(true) });

        let args = KeyArgs::new().named("lat", 1);
        wrapped.call(args).await.unwrap();

        assert!(primary.contains("custom:lat=1"));
    }

    #[tokio::test]
    async fn test_error_is_returned_and_not_cached() {
        let (_, cache) = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let flaky = cached(
            cache,
            CacheOptions::new().prefix("flaky"),
            move |_: ()| {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err("database unavailable".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
        );

        assert_eq!(flaky.call(()).await, Err("database unavailable".to_string()));
        assert_eq!(flaky.call(()).await, Ok(1));
        assert_eq!(flaky.call(()).await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_caching_survives_primary_outage() {
        let (primary, cache) = store();
        primary.set_online(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let square = counted_square(cache, calls.clone());

        square.call(3).await.unwrap();
        square.call(3).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_by_prefix_after_success() {
        let (primary, cache) = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let square = counted_square(cache.clone(), calls.clone());
        let reset = invalidate_cache(
            cache,
            InvalidateOptions::new().prefix("square"),
            |_: ()| async { Ok::<_, String>(()) },
        );

        square.call(2).await.unwrap();
        reset.call(()).await.unwrap();
        assert!(!primary.contains("square:2"));

        square.call(2).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let (primary, cache) = store();
        let square = counted_square(cache.clone(), Arc::new(AtomicUsize::new(0)));
        let broken = invalidate_cache(
            cache,
            InvalidateOptions::new().prefix("square"),
            |_: ()| async { Err::<(), _>("constraint violated") },
        );

        square.call(2).await.unwrap();

        assert_eq!(broken.call(()).await, Err("constraint violated"));
        assert!(primary.contains("square:2"));
    }

    #[tokio::test]
    async fn test_invalidate_exact_key_wins_over_prefix() {
        let (primary, cache) = store();
        let square = counted_square(cache.clone(), Arc::new(AtomicUsize::new(0)));
        let forget = invalidate_cache(
            cache,
            InvalidateOptions::new()
                .prefix("square")
                .key_function(|n: &u64| format!("square:{}", n)),
            |n: u64| async move { Ok::<_, ()>(n) },
        );

        square.call(2).await.unwrap();
        square.call(3).await.unwrap();
        assert_eq!(forget.call(2).await, Ok(2));

        assert!(!primary.contains("square:2"));
        assert!(primary.contains("square:3"));
    }

    #[tokio::test]
    async fn test_unsupported_pattern_is_tolerated() {
        let primary = Arc::new(ScriptedBackend::new("primary", false));
        let cache = Arc::new(TieredCache::new(primary.clone(), Arc::new(LocalStore::new(10))));
        let square = counted_square(cache.clone(), Arc::new(AtomicUsize::new(0)));
        let reset = invalidate_cache(
            cache,
            InvalidateOptions::new().prefix("square"),
            |_: ()| async { Ok::<_, ()>("done") },
        );

        square.call(2).await.unwrap();

        assert_eq!(reset.call(()).await, Ok("done"));
        assert!(primary.contains("square:2"));
    }
}
