// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Configuration.
//!
//! Settings are read from `LONELYPSP_*` environment variables and from an
//! optional json, yaml or toml file. File values win over environment values.
//!

pub mod build;
pub mod params;

pub use build::build_config;
