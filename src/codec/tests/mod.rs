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

//! Descriptor codec tests
//!
//! - Layout tests (pinned sizes, field widths, saturation helpers)
//! - Codec tests (round trip, corruption detection, validation order)


#[cfg(test)]
mod layout_tests;

use crate::codec::{CoarseTimestamp, CommandDescriptor, PerformanceHints, ProtocolVersion};
use crate::core::{CapabilityFlag, CapabilityFlags, CommandIdentity, CommandName, RiskLevel};

/// Descriptor with every field populated, for `version`
pub(super) fn sample_descriptor(version: ProtocolVersion) -> CommandDescriptor {
    let name = CommandName::parse("rm").unwrap();
    let flags: CapabilityFlags = [
        CapabilityFlag::Destructive,
        CapabilityFlag::FileOperations,
        CapabilityFlag::RecursiveOperations,
    ]
    .into_iter()
    .collect();

    CommandDescriptor::new(
        version,
        CommandIdentity::of(&name),
        RiskLevel::HighRisk,
        flags,
        PerformanceHints::new(200, 12, 3),
        CoarseTimestamp(20_100),
    )
}
