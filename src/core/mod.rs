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

//! src/core/mod.rs
//!
//! Core vocabulary of the protocol
//!
//! This module contains the value types every other layer speaks:
//! - Risk tiers and the agent decision attached to each tier
//! - Capability flags and their wire bitset
//! - Validated command names and their fixed-width identity
//!
//! Nothing in here performs I/O or holds state.

pub mod command;
pub mod types;

pub use command::{CommandError, CommandName};
pub use types::*;

#[cfg(test)]
mod tests;
