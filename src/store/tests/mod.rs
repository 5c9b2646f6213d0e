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

//! Descriptor store tests
//!
//! - Provider tests (static table, retry policy, man page naming)
//! - Store tests (single flight, cancellation, refresh, failure handling)

#[cfg(test)]
mod provider_tests;


use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::store::{DocumentationProvider, ProviderError};

/// Counts calls and serves one fixed page after a short delay
pub(super) struct CountingProvider {
    pub calls: AtomicUsize,
    pub doc: Mutex<Option<String>>,
    pub delay: Duration,
}

impl CountingProvider {
    pub fn new(doc: Option<&str>, delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            doc: Mutex::new(doc.map(String::from)),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_doc(&self, doc: &str) {
        *self.doc.lock().unwrap() = Some(doc.to_string());
    }
}

#[async_trait]
impl DocumentationProvider for CountingProvider {
    async fn get_documentation(&self, _command: &str) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.doc.lock().unwrap().clone())
    }
}

/// Blocks commands named `gated` until the gate is opened
pub(super) struct GatedProvider {
    pub gate: Notify,
    pub started: AtomicUsize,
    pub finished: AtomicBool,
}

impl GatedProvider {
    pub fn new() -> Self {
        Self {
            gate: Notify::new(),
            started: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DocumentationProvider for GatedProvider {
    async fn get_documentation(&self, command: &str) -> Result<Option<String>, ProviderError> {
        if command == "gated" {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.finished.store(true, Ordering::SeqCst);
        }
        Ok(Some("list directory contents".to_string()))
    }
}

/// Fails transiently `failures` times, then serves `doc`
pub(super) struct FlakyProvider {
    pub calls: AtomicUsize,
    pub failures: usize,
    pub doc: String,
}

#[async_trait]
impl DocumentationProvider for FlakyProvider {
    async fn get_documentation(&self, _command: &str) -> Result<Option<String>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(ProviderError::Transient(format!("attempt {} timed out", call + 1)))
        } else {
            Ok(Some(self.doc.clone()))
        }
    }
}

/// Always fails permanently
pub(super) struct BrokenProvider {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DocumentationProvider for BrokenProvider {
    async fn get_documentation(&self, _command: &str) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Permanent("documentation service rejected the request".to_string()))
    }
}
