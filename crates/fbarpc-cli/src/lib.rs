// Copyright 2025 fbarpc Authors
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

//! # FBA Model Service CLI
//!
//! Command-line scripts that queue analyses on a remote FBA model service.
//!
//! Each script parses its flags with `argh`, maps them onto the service's
//! parameter object through a static flag table, validates the result and
//! sends it as a single JSON-RPC call. The analyses themselves run on the
//! server; the scripts only print the handle of the queued job.
//!
//! ## Key Commands
//!
//! - `fba runfba`: Queue flux balance analysis on a model
//! - `fba gapfill`: Queue gap-filling of a model
//! - `fba rxnsensitivity`: Queue reaction sensitivity analysis
//! - `fba checkjob`: Show the status of a queued job
//! - `fba call`: Make a raw call (outputs JSON for scripting)
//! - `fba serve`: Run the JSON-RPC dispatch server

pub mod scripts;
pub mod translate;
