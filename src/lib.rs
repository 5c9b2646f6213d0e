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

//! Capability Descriptors
//!
//! Compact, fixed-size binary descriptors of what a shell command can do,
//! so an agent can decide whether to run it without reading its manual.
//!
//! # Features
//!
//! - **Risk Classification:** Keyword and pattern scoring of command documentation
//! - **Fixed-Size Encoding:** 20, 24 or 32 byte big-endian records with a checksum
//! - **Family Compression:** Delta-encoded subcommand families (`git push`, `git log`, ...)
//! - **Descriptor Store:** Async cache with a single resolution per command
//!
//! # Architecture
//!
//! - **`core`:** Vocabulary (risk tiers, capability flags, command names)
//! - **`classifier`:** Documentation to risk tier and capabilities
//! - **`codec`:** Descriptor to bytes and back, with corruption detection
//! - **`family`:** Parent descriptor plus per-member deltas
//! - **`store`:** Concurrent cache over a documentation provider
//!
//! # Safety posture
//!
//! - **Unknown is never safe:** missing documentation classifies as `CRITICAL`
//! - **Corrupt is never safe:** a failed decode maps to the most conservative tier
//! - **No shell:** command names with shell metacharacters are rejected
//! - **Memory-safe:** 100% safe Rust (no unsafe blocks)
//!
//! # Examples
//!
//! ## Classifying and encoding a command
//!
//! ```
//! use capdesc::classifier::RiskClassifier;
//! use capdesc::codec::{CoarseTimestamp, CommandDescriptor, DescriptorCodec, PerformanceHints, ProtocolVersion};
//! use capdesc::core::{CommandIdentity, CommandName};
//!
//! let name = CommandName::parse("rm")?;
//! let doc = "rm - remove files or directories\n\
//!            Delete and destroy: remove files recursively, force removal.";
//! let classification = RiskClassifier::default().classify(&name, Some(doc));
//!
//! let descriptor = CommandDescriptor::new(
//!     ProtocolVersion::V2,
//!     CommandIdentity::of(&name),
//!     classification.risk,
//!     classification.capabilities,
//!     PerformanceHints::estimate(classification.capabilities),
//!     CoarseTimestamp::now(),
//! );
//!
//! let codec = DescriptorCodec::new(ProtocolVersion::V2);
//! let bytes = codec.encode(&descriptor);
//! assert_eq!(bytes.len(), 24);
//! assert_eq!(codec.decode(&bytes)?, descriptor);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Resolving through the store
//!
//! ```no_run
//! use capdesc::classifier::RiskClassifier;
//! use capdesc::codec::ProtocolVersion;
//! use capdesc::store::{DescriptorStore, ManPageProvider};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = DescriptorStore::new(RiskClassifier::default(), ProtocolVersion::V2);
//! let bytes = store.get_or_create("git push", Arc::new(ManPageProvider::new())).await?;
//! println!("{}", bytes.to_hex());
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod codec;
pub mod core;
pub mod family;
pub mod store;

// Re-export commonly used types for convenience
pub use classifier::{Classification, RiskClassifier};
pub use codec::{CommandDescriptor, DescriptorCodec, ProtocolVersion};
pub use core::{CapabilityFlag, CapabilityFlags, CommandName, RiskLevel};
pub use family::{compress_family, group_families, CommandFamily};
pub use store::{DescriptorBytes, DescriptorStore};
