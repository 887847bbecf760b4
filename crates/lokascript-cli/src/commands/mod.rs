// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! CLI command implementations.

pub mod analyze;
pub mod check;
pub mod compile;
pub mod languages;
pub mod pattern_match;
pub mod tokens;
