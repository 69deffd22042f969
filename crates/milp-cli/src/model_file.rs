//! JSON model files.
//!
//! ```json
//! { "A": [[2, 1, 1, 0], [20, 1, 0, 1]], "b": [40, 100], "c": [-10, -1, 0, 0],
//!   "xLB": [2, 0, 0, 0], "xUB": [3, null, null, null], "xINT": [true, false, false, false] }
//! ```
//!
//! `null` in `xLB` means minus infinity and in `xUB` plus infinity. Missing
//! bounds default to `[0, inf)` and missing `xINT` to all continuous.

use std::path::{Path, PathBuf};

use milp_solver::Model;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(rename = "A")]
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    #[serde(rename = "xLB", default, skip_serializing_if = "Option::is_none")]
    pub x_lb: Option<Vec<Option<f64>>>,
    #[serde(rename = "xUB", default, skip_serializing_if = "Option::is_none")]
    pub x_ub: Option<Vec<Option<f64>>>,
    #[serde(rename = "xINT", default, skip_serializing_if = "Option::is_none")]
    pub x_int: Option<Vec<bool>>,
}

impl ModelFile {
    pub fn into_model(self) -> Model {
        let mut model = Model::new(self.a, self.b, self.c);
        if let Some(lower) = self.x_lb {
            model.x_lb = lower.into_iter().map(|v| v.unwrap_or(f64::NEG_INFINITY)).collect();
        }
        if let Some(upper) = self.x_ub {
            model.x_ub = upper.into_iter().map(|v| v.unwrap_or(f64::INFINITY)).collect();
        }
        if let Some(flags) = self.x_int {
            model.x_int = flags;
        }
        model
    }
}

pub fn parse(source: &str) -> Result<Model, LoadError> {
    let file: ModelFile = serde_json::from_str(source)?;
    Ok(file.into_model())
}

pub fn load(path: impl AsRef<Path>) -> Result<Model, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&source)
}
