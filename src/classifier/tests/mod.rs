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

//! Risk classification tests
//!
//! Contains test suites for documentation-driven classification:
//! - Rule tests (built-in tables, thresholds, synopsis extraction)
//! - Config tests (TOML layers, composition, load-time validation)
//! - Integration tests (end-to-end classification of real documentation)



#[cfg(test)]
mod rules_tests;

/// Abridged `rm(1)` page
pub(super) const RM_DOC: &str = "\
NAME
       rm - remove files or directories

SYNOPSIS
       rm [OPTION]... [FILE]...

DESCRIPTION
       This manual page documents the GNU version of rm.  rm removes each
       specified file.  By default, it does not remove directories.

       -f, --force
              ignore nonexistent files and arguments, never prompt

       -r, -R, --recursive
              remove directories and their contents recursively
";

/// Abridged `ls(1)` page
pub(super) const LS_DOC: &str = "\
NAME
       ls - list directory contents
";
