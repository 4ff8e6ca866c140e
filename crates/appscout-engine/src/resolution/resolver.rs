//! Retrying, caching element resolution.
//!
//! A [`Resolver`] turns [`ElementDescriptor`]s into live [`ElementHandle`]s over
//! a [`RemoteSession`]. Successful lookups are cached per (selector,
//! description) until [`Resolver::invalidate`] is called; failed lookups are
//! retried with capped exponential backoff.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::backoff::exponential_delay;
use super::cache::{CacheEntry, ElementCache};
use super::counters::{CounterSnapshot, PerformanceCounters};
use super::result::{AttemptError, ResolutionError};
use crate::config::{AppscoutConfig, ConditionConfig, ResolverConfig};
use crate::descriptor::ElementDescriptor;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::session::{ElementHandle, RemoteSession};

/// Element resolver bound to one session and one navigation context.
pub struct Resolver {
    session: Arc<dyn RemoteSession>,
    config: ResolverConfig,
    condition: ConditionConfig,
    cache: ElementCache,
    counters: PerformanceCounters,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Resolver {
    pub fn new(session: Arc<dyn RemoteSession>) -> Self {
        Self {
            session,
            config: ResolverConfig::default(),
            condition: ConditionConfig::default(),
            cache: ElementCache::new(),
            counters: PerformanceCounters::default(),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn from_config(session: Arc<dyn RemoteSession>, config: &AppscoutConfig) -> Self {
        Self::new(session)
            .with_config(config.resolver.clone())
            .with_condition_config(config.condition.clone())
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_condition_config(mut self, condition: ConditionConfig) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn session(&self) -> &Arc<dyn RemoteSession> {
        &self.session
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &ElementCache {
        &self.cache
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Resolve a descriptor to a visible element, consulting the cache first.
    ///
    /// `timeout` bounds each attempt and defaults to the configured
    /// `default_timeout_ms`.
    pub async fn resolve(
        &self,
        descriptor: &ElementDescriptor,
        timeout: Option<Duration>,
    ) -> Result<ElementHandle, ResolutionError> {
        self.counters.record_lookup();

        let key = descriptor.cache_key();
        let flight = self.cache.flight(&key);
        if let Some(Ok(entry)) = flight.get() {
            self.counters.record_hit();
            debug!("Cache hit for '{}'", descriptor.description);
            return Ok(entry.handle.clone());
        }

        let timeout = timeout.unwrap_or_else(|| self.config.default_timeout());
        let mut resolved_here = false;
        let flag = &mut resolved_here;
        let outcome = flight
            .get_or_init(move || async move {
                *flag = true;
                self.resolve_uncached(descriptor, timeout).await
            })
            .await;

        match outcome {
            Ok(entry) => {
                // Another lookup of the same key populated it while we waited.
                if !resolved_here {
                    self.counters.record_hit();
                    debug!("Shared in-flight lookup for '{}'", descriptor.description);
                }
                Ok(entry.handle.clone())
            }
            Err(e) => {
                self.cache.discard(&key, &flight);
                Err(e.clone())
            }
        }
    }

    /// Resolve several descriptors concurrently, preserving input order.
    ///
    /// Every lookup runs to completion before the batch reports. If any fails,
    /// the first failure in input order is returned and no handles are;
    /// siblings that succeeded stay cached.
    pub async fn resolve_parallel(
        &self,
        descriptors: &[ElementDescriptor],
    ) -> Result<Vec<ElementHandle>, ResolutionError> {
        let results = join_all(descriptors.iter().map(|d| self.resolve(d, None))).await;
        results.into_iter().collect()
    }

    /// Drop every cached handle. Call after anything that changes the screen.
    pub fn invalidate(&self) {
        let dropped = self.cache.clear();
        for handle in &dropped {
            self.session.release(handle);
        }
        debug!("Invalidated {} cached element(s)", dropped.len());
    }

    /// Poll `predicate` using the configured attempt count and initial delay.
    pub async fn await_condition<T, F, Fut>(&self, predicate: F) -> Result<T, ResolutionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, ResolutionError>>,
    {
        self.await_condition_with(
            self.condition.max_attempts,
            self.condition.initial_delay(),
            predicate,
        )
        .await
    }

    /// Poll `predicate` until it yields `Some`, doubling the delay after each
    /// miss. Exhaustion returns the last predicate error if there was one,
    /// otherwise [`ResolutionError::ConditionTimeout`].
    pub async fn await_condition_with<T, F, Fut>(
        &self,
        max_attempts: u32,
        initial_delay: Duration,
        mut predicate: F,
    ) -> Result<T, ResolutionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, ResolutionError>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match predicate().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => debug!("Condition not yet satisfied (attempt {})", attempt),
                Err(e) => {
                    debug!("Condition check failed (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts {
                let delay = exponential_delay(attempt, initial_delay, None);
                self.session.sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or(ResolutionError::ConditionTimeout {
            attempts: max_attempts,
        }))
    }

    async fn resolve_uncached(
        &self,
        descriptor: &ElementDescriptor,
        timeout: Duration,
    ) -> Result<CacheEntry, ResolutionError> {
        let started = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        let last_error = loop {
            attempt += 1;
            match self.attempt(descriptor, timeout).await {
                Ok(handle) => {
                    let elapsed = started.elapsed();
                    self.counters.record_wait(elapsed);
                    info!(
                        "Resolved '{}' on attempt {} in {} ms",
                        descriptor.description,
                        attempt,
                        elapsed.as_millis()
                    );
                    return Ok(CacheEntry {
                        handle,
                        resolved_at: Instant::now(),
                        elapsed,
                    });
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = exponential_delay(
                        attempt,
                        self.config.backoff_base(),
                        Some(self.config.backoff_cap()),
                    );
                    warn!(
                        "Attempt {}/{} for '{}' failed: {}. Retrying in {} ms",
                        attempt,
                        max_attempts,
                        descriptor.description,
                        err,
                        delay.as_millis()
                    );
                    self.session.sleep(delay).await;
                }
                Err(err) => {
                    if !err.is_retryable() {
                        warn!(
                            "Attempt {} for '{}' failed and is not retryable: {}",
                            attempt, descriptor.description, err
                        );
                    }
                    break err;
                }
            }
        };

        error!(
            "Giving up on '{}' after {} attempt(s): {}",
            descriptor, attempt, last_error
        );
        self.capture_diagnostics(descriptor).await;

        Err(ResolutionError::ResolutionFailure {
            description: descriptor.description.clone(),
            attempts: attempt,
            last_error: last_error.to_string(),
        })
    }

    /// One locate-then-visible round trip, bounded by `timeout`.
    async fn attempt(
        &self,
        descriptor: &ElementDescriptor,
        timeout: Duration,
    ) -> Result<ElementHandle, AttemptError> {
        match tokio::time::timeout(timeout, self.locate_visible(descriptor, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(AttemptError::TimedOut(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    async fn locate_visible(
        &self,
        descriptor: &ElementDescriptor,
        timeout: Duration,
    ) -> Result<ElementHandle, AttemptError> {
        let handle = self
            .session
            .locate(descriptor.strategy, &descriptor.selector, timeout)
            .await?
            .ok_or(AttemptError::NotFound)?;

        match self.session.is_visible(&handle).await {
            Ok(true) => Ok(handle),
            Ok(false) => {
                self.session.release(&handle);
                Err(AttemptError::NotVisible)
            }
            Err(e) => {
                self.session.release(&handle);
                Err(e.into())
            }
        }
    }

    async fn capture_diagnostics(&self, descriptor: &ElementDescriptor) {
        match self.session.screenshot().await {
            Ok(bytes) => {
                self.diagnostics
                    .record_failure(&descriptor.description, bytes)
                    .await
            }
            Err(e) => warn!(
                "Failed to capture screenshot for '{}': {}",
                descriptor.description, e
            ),
        }
    }
}
