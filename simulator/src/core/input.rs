//! Factor input record, its coded enums, and the validation gate.
//!
//! Raw JSON passes through two checks before it becomes a [`FactorInput`]:
//! the embedded JSON Schema (shape, enum codes, msgType-driven required
//! quantities) and the field constraints serde cannot express.

use std::fmt;
use std::sync::LazyLock;

use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON Schema (Draft 2020-12) for factor input files.
pub const INPUT_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/factor_input/v1.schema.json"
));

static INPUT_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(INPUT_SCHEMA).expect("embedded input schema should be valid json");
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .expect("embedded input schema should compile")
});

/// Structurally invalid input. Raised before any evaluation step runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("parse factor input: {0}")]
    Syntax(String),
    #[error("factor input schema validation failed:\n- {}", .0.join("\n- "))]
    Schema(Vec<String>),
    #[error("factor input field types: {0}")]
    FieldType(String),
    #[error("unknown {field} code {code}")]
    UnknownCode { field: &'static str, code: i64 },
    #[error("factor input constraints failed:\n- {}", .0.join("\n- "))]
    Constraint(Vec<String>),
}

/// MF#63 security type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecType {
    Fut,
    Opt,
    Other(String),
}

impl SecType {
    pub fn as_str(&self) -> &str {
        match self {
            SecType::Fut => "FUT",
            SecType::Opt => "OPT",
            SecType::Other(raw) => raw,
        }
    }

    /// Only futures and options take part in the calculation.
    pub fn is_eligible(&self) -> bool {
        matches!(self, SecType::Fut | SecType::Opt)
    }
}

impl From<String> for SecType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "FUT" => SecType::Fut,
            "OPT" => SecType::Opt,
            _ => SecType::Other(raw),
        }
    }
}

impl From<&str> for SecType {
    fn from(raw: &str) -> Self {
        SecType::from(raw.to_string())
    }
}

impl From<SecType> for String {
    fn from(sec_type: SecType) -> Self {
        match sec_type {
            SecType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message kind carried by the input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MsgType {
    Trade,
    Position,
}

impl MsgType {
    pub const fn code(self) -> i64 {
        match self {
            MsgType::Trade => 4,
            MsgType::Position => 6,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MsgType::Trade => "trade",
            MsgType::Position => "position",
        }
    }
}

impl TryFrom<i64> for MsgType {
    type Error = InputError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            4 => Ok(MsgType::Trade),
            6 => Ok(MsgType::Position),
            _ => Err(InputError::UnknownCode {
                field: "msgType",
                code,
            }),
        }
    }
}

impl From<MsgType> for i64 {
    fn from(msg_type: MsgType) -> Self {
        msg_type.code()
    }
}

/// Holding direction as coded by the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Direction {
    Long,
    Short,
    ShortVariant,
}

/// Sign-relevant reduction of [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Direction {
    pub const fn code(self) -> i64 {
        match self {
            Direction::Long => 1,
            Direction::Short => 2,
            Direction::ShortVariant => 3,
        }
    }

    pub const fn side(self) -> Side {
        match self {
            Direction::Long => Side::Long,
            Direction::Short | Direction::ShortVariant => Side::Short,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = InputError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Direction::Long),
            2 => Ok(Direction::Short),
            3 => Ok(Direction::ShortVariant),
            _ => Err(InputError::UnknownCode {
                field: "direction",
                code,
            }),
        }
    }
}

impl From<Direction> for i64 {
    fn from(direction: Direction) -> Self {
        direction.code()
    }
}

/// PR#10007 netting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum NettingMode {
    NoNetting,
    Netting,
}

impl NettingMode {
    pub const fn code(self) -> i64 {
        match self {
            NettingMode::NoNetting => 2,
            NettingMode::Netting => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            NettingMode::NoNetting => "no netting",
            NettingMode::Netting => "netting",
        }
    }
}

impl TryFrom<i64> for NettingMode {
    type Error = InputError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            2 => Ok(NettingMode::NoNetting),
            3 => Ok(NettingMode::Netting),
            _ => Err(InputError::UnknownCode {
                field: "nettingMode",
                code,
            }),
        }
    }
}

impl From<NettingMode> for i64 {
    fn from(mode: NettingMode) -> Self {
        mode.code()
    }
}

/// One input row for the derivative market-value factor.
///
/// All three quantity fields are carried so that form state survives a
/// msgType switch, but only the ones relevant to `msg_type` are ever read
/// (see [`FactorInput::quantities`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FactorInput {
    pub sec_type: SecType,
    pub msg_type: MsgType,
    #[serde(default)]
    pub hold_qty: i64,
    #[serde(default)]
    pub buy_qty: i64,
    #[serde(default)]
    pub sell_qty: i64,
    pub multiplier: f64,
    pub latest_price: f64,
    pub direction: Direction,
    pub netting_mode: NettingMode,
}

/// The quantity fields that matter for a given message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantities {
    Position { hold: i64 },
    Trade { buy: i64, sell: i64 },
}

impl Default for FactorInput {
    fn default() -> Self {
        Self {
            sec_type: SecType::Fut,
            msg_type: MsgType::Position,
            hold_qty: 100,
            buy_qty: 0,
            sell_qty: 0,
            multiplier: 10.0,
            latest_price: 50.5,
            direction: Direction::Long,
            netting_mode: NettingMode::NoNetting,
        }
    }
}

impl FactorInput {
    pub fn quantities(&self) -> Quantities {
        match self.msg_type {
            MsgType::Position => Quantities::Position {
                hold: self.hold_qty,
            },
            MsgType::Trade => Quantities::Trade {
                buy: self.buy_qty,
                sell: self.sell_qty,
            },
        }
    }

    /// Check the constraints serde cannot enforce on a constructed value.
    pub fn validate(&self) -> Result<(), InputError> {
        let mut errors = validate_fields(self);
        if errors.is_empty() {
            errors.extend(validate_magnitude(self));
        }
        if errors.is_empty() {
            return Ok(());
        }
        Err(InputError::Constraint(errors))
    }
}

/// Field-level constraints. Each check looks at exactly one field.
pub fn validate_fields(input: &FactorInput) -> Vec<String> {
    let mut errors = Vec::new();

    if input.sec_type.as_str().trim().is_empty() {
        errors.push("secType must be non-empty".to_string());
    }
    if !input.multiplier.is_finite() || input.multiplier <= 0.0 {
        errors.push(format!(
            "multiplier must be a positive number, got {}",
            input.multiplier
        ));
    }
    if !input.latest_price.is_finite() {
        errors.push(format!(
            "latestPrice must be finite, got {}",
            input.latest_price
        ));
    }

    errors
}

/// The running value must stay finite through both multiplications.
fn validate_magnitude(input: &FactorInput) -> Option<String> {
    let qty = match input.quantities() {
        Quantities::Position { hold } => i128::from(hold),
        Quantities::Trade { buy, sell } => i128::from(buy) - i128::from(sell),
    };
    let scaled = qty as f64 * input.multiplier;
    let value = scaled * input.latest_price;
    if scaled.is_finite() && value.is_finite() {
        return None;
    }
    Some(format!(
        "quantity {qty} × multiplier {} × latestPrice {} is out of range",
        input.multiplier, input.latest_price
    ))
}

/// Parse, schema-check, and constraint-check a raw JSON factor input.
pub fn parse_input(raw: &str) -> Result<FactorInput, InputError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| InputError::Syntax(err.to_string()))?;
    parse_input_value(value)
}

/// Same as [`parse_input`] for an already-parsed JSON document.
pub fn parse_input_value(value: Value) -> Result<FactorInput, InputError> {
    validate_schema(&value)?;
    let input: FactorInput =
        serde_json::from_value(value).map_err(|err| InputError::FieldType(err.to_string()))?;
    input.validate()?;
    Ok(input)
}

fn validate_schema(instance: &Value) -> Result<(), InputError> {
    let messages: Vec<String> = INPUT_VALIDATOR
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(InputError::Schema(messages));
    }
    Ok(())
}
