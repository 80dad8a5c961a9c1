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

//! # Flag Translation
//!
//! Maps command-line flag values onto a request parameter object using a
//! static table of `(flag, path)` pairs. Paths may be dotted, in which case
//! nested objects are created along the way:
//!
//! ```
//! use fbarpc_cli::translate::{translate, FlagTable};
//! use serde_json::json;
//!
//! const TABLE: FlagTable = &[("media", "formulation.media"), ("fva", "fva")];
//!
//! let params = translate(TABLE, vec![
//!     ("media", Some(json!("Carbon-D-Glucose"))),
//!     ("fva", None),
//! ]).unwrap();
//! assert_eq!(serde_json::Value::Object(params), json!({"formulation": {"media": "Carbon-D-Glucose"}}));
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use fbarpc_common::protocol::error::FbaError;

/// `(flag name, parameter path)` pairs for one script.
pub type FlagTable = &'static [(&'static str, &'static str)];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    #[error("Unknown flag: --{0}")]
    UnknownFlag(String),

    #[error("Flag --{flag} conflicts with another value at '{path}'")]
    Conflict { flag: String, path: String },
}

impl From<TranslateError> for FbaError {
    fn from(err: TranslateError) -> Self {
        FbaError::InvalidRequest(err.to_string())
    }
}

/// Builds a parameter object from flag values.
///
/// Unset flags (`None`) are skipped so that the parameter defaults apply.
/// The result depends only on the table and the flags given.
pub fn translate(
    table: FlagTable,
    flags: Vec<(&str, Option<Value>)>,
) -> Result<Map<String, Value>, TranslateError> {
    let mut params = Map::new();

    for (flag, value) in flags {
        let path = table
            .iter()
            .find(|(name, _)| *name == flag)
            .map(|(_, path)| *path)
            .ok_or_else(|| TranslateError::UnknownFlag(flag.to_string()))?;

        let Some(value) = value else {
            continue;
        };
        insert_path(&mut params, flag, path, value)?;
    }

    Ok(params)
}

fn insert_path(
    params: &mut Map<String, Value>,
    flag: &str,
    path: &str,
    value: Value,
) -> Result<(), TranslateError> {
    let conflict = || TranslateError::Conflict {
        flag: flag.to_string(),
        path: path.to_string(),
    };

    let mut segments = path.split('.').peekable();
    let mut current = params;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if current.contains_key(segment) {
                return Err(conflict());
            }
            current.insert(segment.to_string(), value);
            return Ok(());
        }

        current = match current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(map) => map,
            _ => return Err(conflict()),
        };
    }

    Ok(())
}

/// Splits a list flag such as `rxn00001,rxn00002;rxn00003`.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// A list flag as a JSON array, or `None` when the flag was not given.
pub fn list_value(raw: Option<&str>) -> Option<Value> {
    raw.map(|raw| Value::from(split_list(raw)))
}

/// A switch as `true`, or `None` when it was not given.
pub fn switch_value(set: bool) -> Option<Value> {
    set.then_some(Value::Bool(true))
}
