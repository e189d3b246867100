//! Documented test cases and expected-value comparison.

use serde::Serialize;

use crate::core::input::{Direction, FactorInput, MsgType, NettingMode, SecType};
use crate::core::trace::{Conclusion, TraceResult};

/// A named input with its documented expected result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    /// File-name friendly identifier.
    pub slug: &'static str,
    pub description: &'static str,
    pub input: FactorInput,
    pub expected: f64,
}

pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "FUT, no netting",
            slug: "fut-no-netting",
            description: "Futures position, quantities summed directly",
            input: FactorInput::default(),
            expected: 50500.0,
        },
        Preset {
            name: "OPT, netting (long)",
            slug: "opt-netting-long",
            description: "Options position, netting mode, long direction",
            input: FactorInput {
                sec_type: SecType::Opt,
                msg_type: MsgType::Position,
                hold_qty: 200,
                buy_qty: 0,
                sell_qty: 0,
                multiplier: 100.0,
                latest_price: 3.2,
                direction: Direction::Long,
                netting_mode: NettingMode::Netting,
            },
            expected: 64000.0,
        },
        Preset {
            name: "OPT, netting (short)",
            slug: "opt-netting-short",
            description: "Options trade, netting mode, short direction",
            input: FactorInput {
                sec_type: SecType::Opt,
                msg_type: MsgType::Trade,
                hold_qty: 0,
                buy_qty: 150,
                sell_qty: 80,
                multiplier: 100.0,
                latest_price: 3.2,
                direction: Direction::Short,
                netting_mode: NettingMode::Netting,
            },
            expected: -22400.0,
        },
    ]
}

/// Look up a preset by position.
pub fn preset(index: usize) -> Option<Preset> {
    builtin_presets().into_iter().nth(index)
}

/// Result of comparing a trace against an expected value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Expectation {
    Match {
        expected: f64,
    },
    Mismatch {
        expected: f64,
        actual: f64,
        /// `actual - expected`.
        difference: f64,
    },
    /// The evaluation short-circuited, so there is nothing to compare.
    NoResult {
        error: String,
    },
}

impl Expectation {
    pub fn is_match(&self) -> bool {
        matches!(self, Expectation::Match { .. })
    }
}

/// Compare `trace` with `expected`, allowing an absolute `tolerance`.
pub fn check_expected(trace: &TraceResult, expected: f64, tolerance: f64) -> Expectation {
    let actual = match trace.conclusion() {
        Conclusion::Value(actual) => *actual,
        Conclusion::Skipped(error) => {
            return Expectation::NoResult {
                error: error.clone(),
            };
        }
    };
    let difference = actual - expected;
    if difference.abs() <= tolerance {
        Expectation::Match { expected }
    } else {
        Expectation::Mismatch {
            expected,
            actual,
            difference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::evaluator::evaluate;

    #[test]
    fn every_preset_meets_its_expectation() {
        for preset in builtin_presets() {
            let trace = evaluate(&preset.input);
            let outcome = check_expected(&trace, preset.expected, 1e-9);
            assert!(outcome.is_match(), "{}: {:?}", preset.name, outcome);
        }
    }

    #[test]
    fn presets_pass_field_validation() {
        for preset in builtin_presets() {
            preset.input.validate().expect("preset should be valid");
        }
    }

    #[test]
    fn mismatch_reports_signed_difference() {
        let trace = evaluate(&FactorInput::default());
        let outcome = check_expected(&trace, 50000.0, 1e-9);
        assert_eq!(
            outcome,
            Expectation::Mismatch {
                expected: 50000.0,
                actual: 50500.0,
                difference: 500.0,
            }
        );
    }

    #[test]
    fn skipped_trace_has_no_result_to_compare() {
        let trace = evaluate(&FactorInput {
            hold_qty: 0,
            ..FactorInput::default()
        });
        let outcome = check_expected(&trace, 0.0, 1e-9);
        assert_eq!(
            outcome,
            Expectation::NoResult {
                error: "quantity is zero".to_string()
            }
        );
    }

    #[test]
    fn preset_lookup_is_bounded() {
        assert_eq!(preset(2).map(|p| p.slug), Some("opt-netting-short"));
        assert!(preset(3).is_none());
    }
}
