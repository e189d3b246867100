//! Decision trace produced by one evaluation.
//!
//! A [`TraceResult`] is immutable once built: it either concludes with a
//! numeric value or with a short-circuit message, never both.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Terminal classification of an evaluation; selects the graph path to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathId {
    SkipType,
    SkipQty,
    NoNetting,
    Netting,
}

impl PathId {
    /// Every outcome the evaluator can produce.
    pub const ALL: [PathId; 4] = [
        PathId::SkipType,
        PathId::SkipQty,
        PathId::NoNetting,
        PathId::Netting,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PathId::SkipType => "skip-type",
            PathId::SkipQty => "skip-qty",
            PathId::NoNetting => "no-netting",
            PathId::Netting => "netting",
        }
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audited decision or computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStep {
    pub name: String,
    pub expression: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl DecisionStep {
    pub fn check(name: &str, expression: String, passed: bool) -> Self {
        Self {
            name: name.to_string(),
            expression,
            passed,
            value: None,
        }
    }

    pub fn computed(name: &str, expression: String, value: f64) -> Self {
        Self {
            name: name.to_string(),
            expression,
            passed: true,
            value: Some(value),
        }
    }
}

/// How an evaluation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Conclusion {
    Value(f64),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceResult {
    steps: Vec<DecisionStep>,
    conclusion: Conclusion,
    path: PathId,
}

impl TraceResult {
    pub(crate) fn completed(steps: Vec<DecisionStep>, value: f64, path: PathId) -> Self {
        Self {
            steps,
            conclusion: Conclusion::Value(value),
            path,
        }
    }

    pub(crate) fn skipped(steps: Vec<DecisionStep>, message: &str, path: PathId) -> Self {
        Self {
            steps,
            conclusion: Conclusion::Skipped(message.to_string()),
            path,
        }
    }

    pub fn steps(&self) -> &[DecisionStep] {
        &self.steps
    }

    pub fn conclusion(&self) -> &Conclusion {
        &self.conclusion
    }

    pub fn path(&self) -> PathId {
        self.path
    }

    pub fn result(&self) -> Option<f64> {
        match self.conclusion {
            Conclusion::Value(value) => Some(value),
            Conclusion::Skipped(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.conclusion {
            Conclusion::Value(_) => None,
            Conclusion::Skipped(message) => Some(message),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.conclusion, Conclusion::Skipped(_))
    }
}

/// Wire shape: `result` and `error` as sibling optional fields.
#[derive(Serialize)]
struct TraceWire<'a> {
    steps: &'a [DecisionStep],
    result: Option<f64>,
    error: Option<&'a str>,
    outcome: PathId,
}

impl Serialize for TraceResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TraceWire {
            steps: &self.steps,
            result: self.result(),
            error: self.error(),
            outcome: self.path,
        }
        .serialize(serializer)
    }
}
