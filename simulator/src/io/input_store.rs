//! Factor input load/save helpers with schema + constraint validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::input::{FactorInput, parse_input};

/// Load and validate a factor input file.
///
/// Validation failures keep their [`InputError`](crate::core::input::InputError)
/// as the root cause so callers can tell them apart from I/O errors.
pub fn load_input(path: &Path) -> Result<FactorInput> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read input {}", path.display()))?;
    let input = parse_input(&raw).with_context(|| format!("validate input {}", path.display()))?;
    Ok(input)
}

/// Write an input as pretty-printed JSON with a trailing newline.
pub fn write_input(path: &Path, input: &FactorInput) -> Result<()> {
    input.validate()?;
    let mut buf = serde_json::to_string_pretty(input).context("serialize input json")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write input {}", path.display()))
}
