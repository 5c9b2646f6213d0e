// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Concurrent descriptor cache with lazy resolution.
//!
//! # Resolution
//! A miss fetches documentation (with retry), classifies it, encodes the
//! descriptor and caches the bytes. Resolution runs in its own task; every
//! caller waiting on the same command shares that one task and receives
//! identical bytes. Different commands resolve in parallel.
//!
//! # Cancellation
//! Each waiting caller is counted. Dropping a caller's future decrements
//! the count, and the resolution task is aborted only when no caller is
//! left waiting. A task that still has waiters runs to completion.
//!
//! # Locking
//! A single `std::sync::Mutex` guards the ready and pending tables. It is
//! never held across an `.await`.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::AbortHandle;

pub mod provider;
pub mod retry;

pub use provider::{DocumentationProvider, ManPageProvider, ProviderError, StaticProvider};
pub use retry::RetryPolicy;

use crate::classifier::RiskClassifier;
use crate::codec::{CoarseTimestamp, CommandDescriptor, DescriptorCodec, PerformanceHints, ProtocolVersion};
use crate::core::command::{CommandError, CommandName};
use crate::core::types::CommandIdentity;

/// Errors returned by the store.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StoreError {
    /// The command string is not a valid command name.
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] CommandError),
    /// The resolution task ended without producing a descriptor.
    #[error("Descriptor resolution was aborted")]
    ResolutionAborted,
}

/// Shared, immutable encoded descriptor
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct DescriptorBytes(Arc<[u8]>);

impl DescriptorBytes {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// True when both handles share one allocation
    pub fn ptr_eq(&self, other: &DescriptorBytes) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<u8>> for DescriptorBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }
}

impl Deref for DescriptorBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for DescriptorBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DescriptorBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DescriptorBytes({})", self.to_hex())
    }
}

/// Counters since the store was created
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StoreStats {
    /// Calls answered from the cache
    pub hits: u64,
    /// Calls that had to wait for a resolution (started or joined)
    pub misses: u64,
    /// Resolution tasks started
    pub resolutions: u64,
}

struct PendingEntry {
    rx: watch::Receiver<Option<DescriptorBytes>>,
    waiters: usize,
    generation: u64,
    abort: AbortHandle,
}

#[derive(Default)]
struct StoreState {
    ready: HashMap<String, DescriptorBytes>,
    pending: HashMap<String, PendingEntry>,
    next_generation: u64,
}

struct StoreInner {
    classifier: RiskClassifier,
    codec: DescriptorCodec,
    retry: RetryPolicy,
    state: Mutex<StoreState>,
    hits: AtomicU64,
    misses: AtomicU64,
    resolutions: AtomicU64,
}

impl StoreInner {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // The tables stay consistent across a panic, so poisoning is ignored
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches, classifies and encodes one command
    async fn resolve(&self, name: &CommandName, provider: &dyn DocumentationProvider) -> DescriptorBytes {
        let documentation = self.retry.fetch(provider, name.as_str()).await;
        let classification = self.classifier.classify(name, documentation.as_deref());
        let descriptor = CommandDescriptor::new(
            self.codec.version(),
            CommandIdentity::of(name),
            classification.risk,
            classification.capabilities,
            PerformanceHints::estimate(classification.capabilities),
            CoarseTimestamp::now(),
        );
        log::info!("resolved {}: {}", name, descriptor);
        DescriptorBytes::from(self.codec.encode(&descriptor))
    }

    /// Removes the pending entry of `generation`, if it is still the current one
    fn clear_pending(&self, key: &str, generation: u64) -> Option<PendingEntry> {
        let mut state = self.lock();
        if state.pending.get(key).map(|entry| entry.generation) == Some(generation) {
            state.pending.remove(key)
        } else {
            None
        }
    }
}

/// Outcome of registering interest in a command
enum Joined {
    Ready(DescriptorBytes),
    Waiting {
        rx: watch::Receiver<Option<DescriptorBytes>>,
        generation: u64,
    },
}

/// Counts one caller against a pending entry for as long as it waits
struct WaiterGuard {
    inner: Arc<StoreInner>,
    key: String,
    generation: u64,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.inner.lock();
            let remaining = match state.pending.get_mut(&self.key) {
                Some(entry) if entry.generation == self.generation => {
                    entry.waiters = entry.waiters.saturating_sub(1);
                    Some(entry.waiters)
                }
                _ => None,
            };
            if remaining == Some(0) {
                state.pending.remove(&self.key)
            } else {
                None
            }
        };
        if let Some(entry) = abandoned {
            entry.abort.abort();
            log::debug!("resolution of {} aborted, no callers left", self.key);
        }
    }
}

/// Removes a task's pending entry if the task ends without publishing
struct TaskCleanup {
    inner: Arc<StoreInner>,
    key: String,
    generation: u64,
    published: bool,
}

impl Drop for TaskCleanup {
    fn drop(&mut self) {
        if !self.published && self.inner.clear_pending(&self.key, self.generation).is_some() {
            log::warn!("resolution of {} ended without a descriptor", self.key);
        }
    }
}

/// Concurrent cache of encoded descriptors
///
/// Cloning is cheap and every clone shares the same cache.
#[derive(Clone)]
pub struct DescriptorStore {
    inner: Arc<StoreInner>,
}

impl DescriptorStore {
    pub fn new(classifier: RiskClassifier, version: ProtocolVersion) -> Self {
        Self::build(classifier, DescriptorCodec::new(version), RetryPolicy::default())
    }

    /// Replaces the retry policy
    ///
    /// Builder step for use right after `new`: the returned store starts
    /// with an empty cache and shares nothing with `self`.
    pub fn with_retry(self, retry: RetryPolicy) -> Self {
        Self::build(self.inner.classifier.clone(), self.inner.codec, retry)
    }

    fn build(classifier: RiskClassifier, codec: DescriptorCodec, retry: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                classifier,
                codec,
                retry,
                state: Mutex::new(StoreState::default()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                resolutions: AtomicU64::new(0),
            }),
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.inner.codec.version()
    }

    pub fn codec(&self) -> DescriptorCodec {
        self.inner.codec
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.inner.classifier
    }

    /// Cached bytes for `command`, without doing any work
    pub fn lookup(&self, command: &str) -> Option<DescriptorBytes> {
        let name = CommandName::parse(command).ok()?;
        self.inner.lock().ready.get(name.as_str()).cloned()
    }

    /// Cached bytes for `command`, resolving them first on a miss
    ///
    /// # Errors
    /// - `StoreError::InvalidCommand` when `command` is not a valid command name
    /// - `StoreError::ResolutionAborted` when the resolution task died
    pub async fn get_or_create(
        &self,
        command: &str,
        provider: Arc<dyn DocumentationProvider>,
    ) -> Result<DescriptorBytes, StoreError> {
        let name = CommandName::parse(command)?;
        self.wait(name, provider, true).await
    }

    /// Re-resolves `command` and atomically replaces its cached bytes
    ///
    /// Lookups keep returning the previous bytes until the new ones are in.
    /// A refresh that finds a resolution already running joins it.
    pub async fn refresh(
        &self,
        command: &str,
        provider: Arc<dyn DocumentationProvider>,
    ) -> Result<DescriptorBytes, StoreError> {
        let name = CommandName::parse(command)?;
        self.wait(name, provider, false).await
    }

    /// Number of cached descriptors
    pub fn len(&self) -> usize {
        self.inner.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of resolutions currently running
    pub fn in_flight(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            resolutions: self.inner.resolutions.load(Ordering::Relaxed),
        }
    }

    async fn wait(
        &self,
        name: CommandName,
        provider: Arc<dyn DocumentationProvider>,
        use_cache: bool,
    ) -> Result<DescriptorBytes, StoreError> {
        let key = name.as_str().to_string();
        let (mut rx, generation) = match self.join_or_spawn(name, provider, use_cache) {
            Joined::Ready(bytes) => return Ok(bytes),
            Joined::Waiting { rx, generation } => (rx, generation),
        };

        let _guard = WaiterGuard {
            inner: Arc::clone(&self.inner),
            key,
            generation,
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        };
        outcome.ok_or(StoreError::ResolutionAborted)
    }

    /// Returns cached bytes, or registers the caller on a (possibly new) resolution
    fn join_or_spawn(&self, name: CommandName, provider: Arc<dyn DocumentationProvider>, use_cache: bool) -> Joined {
        let key = name.as_str().to_string();
        let mut state = self.inner.lock();

        if use_cache {
            if let Some(bytes) = state.ready.get(&key) {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("cache hit for {}", key);
                return Joined::Ready(bytes.clone());
            }
        }
        self.inner.misses.fetch_add(1, Ordering::Relaxed);

        if let Some(entry) = state.pending.get_mut(&key) {
            entry.waiters += 1;
            log::debug!("joining resolution of {} ({} waiting)", key, entry.waiters);
            return Joined::Waiting {
                rx: entry.rx.clone(),
                generation: entry.generation,
            };
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run_resolution(
            Arc::clone(&self.inner),
            name,
            provider,
            generation,
            tx,
        ));
        self.inner.resolutions.fetch_add(1, Ordering::Relaxed);

        // The task cannot publish before this entry exists: publishing takes the lock held here
        state.pending.insert(
            key,
            PendingEntry {
                rx: rx.clone(),
                waiters: 1,
                generation,
                abort: task.abort_handle(),
            },
        );
        Joined::Waiting { rx, generation }
    }
}

impl fmt::Debug for DescriptorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorStore")
            .field("version", &self.version())
            .field("len", &self.len())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

async fn run_resolution(
    inner: Arc<StoreInner>,
    name: CommandName,
    provider: Arc<dyn DocumentationProvider>,
    generation: u64,
    tx: watch::Sender<Option<DescriptorBytes>>,
) {
    let key = name.as_str().to_string();
    let mut cleanup = TaskCleanup {
        inner: Arc::clone(&inner),
        key: key.clone(),
        generation,
        published: false,
    };

    let bytes = inner.resolve(&name, provider.as_ref()).await;

    {
        let mut state = inner.lock();
        state.ready.insert(key.clone(), bytes.clone());
        if state.pending.get(&key).map(|entry| entry.generation) == Some(generation) {
            state.pending.remove(&key);
        }
    }
    cleanup.published = true;

    // Waiters that gave up in the meantime leave no receiver behind
    let _ = tx.send(Some(bytes));
}

#[cfg(test)]
mod tests;
