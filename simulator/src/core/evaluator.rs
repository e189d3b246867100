//! Rule evaluator for the derivative market-value factor.
//!
//! Evaluation order is fixed:
//!
//! 1. security type gate (`skip-type` on failure)
//! 2. quantity gate (`skip-qty` on failure)
//! 3. netting mode record
//! 4. signed quantity
//! 5. × contract multiplier
//! 6. GROUP → SUM
//! 7. × latest price
//!
//! The latest price is applied after the group sum. It varies over time, so
//! multiplying it into each row before the reduction gives wrong totals once a
//! group holds more than one row.

use crate::core::input::{Direction, FactorInput, NettingMode, Quantities, Side};
use crate::core::trace::{DecisionStep, PathId, TraceResult};

pub const STEP_TYPE_GATE: &str = "Eligibility: security type";
pub const STEP_QUANTITY_GATE: &str = "Eligibility: quantity";
pub const STEP_NETTING_MODE: &str = "Netting mode";
pub const STEP_MULTIPLIER: &str = "Apply contract multiplier";
pub const STEP_AGGREGATE: &str = "GROUP -> SUM";
pub const STEP_LATEST_PRICE: &str = "Apply latest price";

pub const TYPE_NOT_ELIGIBLE: &str = "type not eligible";
pub const QUANTITY_IS_ZERO: &str = "quantity is zero";

/// Group-level reduction applied between the multiplier and the price.
///
/// Grouping itself happens upstream; implementations only see the per-row
/// values of one group.
pub trait Aggregator {
    fn aggregate(&self, rows: &[f64]) -> f64;

    /// Audit expression for the reduction.
    fn describe(&self, rows: &[f64], total: f64) -> String;
}

/// Plain sum over the single demonstrated row.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleRowSum;

impl Aggregator for SingleRowSum {
    fn aggregate(&self, rows: &[f64]) -> f64 {
        rows.iter().sum()
    }

    fn describe(&self, rows: &[f64], total: f64) -> String {
        if rows.len() == 1 {
            format!("SUM = {total} (single row)")
        } else {
            format!("SUM over {} rows = {total}", rows.len())
        }
    }
}

/// Evaluate `input` with the built-in single-row aggregation.
pub fn evaluate(input: &FactorInput) -> TraceResult {
    evaluate_with(input, &SingleRowSum)
}

/// Evaluate `input`, delegating step 6 to `aggregator`.
pub fn evaluate_with(input: &FactorInput, aggregator: &dyn Aggregator) -> TraceResult {
    let mut steps = Vec::with_capacity(7);

    let eligible = input.sec_type.is_eligible();
    steps.push(DecisionStep::check(
        STEP_TYPE_GATE,
        format!(
            "MF#63 = \"{}\" -> {}",
            input.sec_type,
            if eligible {
                "in {FUT, OPT}, eligible"
            } else {
                "not in {FUT, OPT}, skip"
            }
        ),
        eligible,
    ));
    if !eligible {
        return TraceResult::skipped(steps, TYPE_NOT_ELIGIBLE, PathId::SkipType);
    }

    let quantities = input.quantities();
    let (has_quantity, expression) = quantity_gate(quantities);
    steps.push(DecisionStep::check(STEP_QUANTITY_GATE, expression, has_quantity));
    if !has_quantity {
        return TraceResult::skipped(steps, QUANTITY_IS_ZERO, PathId::SkipQty);
    }

    steps.push(DecisionStep::check(
        STEP_NETTING_MODE,
        format!(
            "PR#10007 = {} -> {} mode",
            input.netting_mode.code(),
            input.netting_mode.label()
        ),
        true,
    ));

    let signed = signed_quantity(quantities, input.netting_mode, input.direction);
    steps.push(DecisionStep::check(signed.name, signed.expression, true));

    let per_row = signed.qty as f64 * input.multiplier;
    steps.push(DecisionStep::computed(
        STEP_MULTIPLIER,
        format!("{} × MF#131({}) = {per_row}", signed.qty, input.multiplier),
        per_row,
    ));

    let rows = [per_row];
    let total = aggregator.aggregate(&rows);
    steps.push(DecisionStep::computed(
        STEP_AGGREGATE,
        aggregator.describe(&rows, total),
        total,
    ));

    let value = total * input.latest_price;
    steps.push(DecisionStep::computed(
        STEP_LATEST_PRICE,
        format!("{total} × MF#129({}) = {value}", input.latest_price),
        value,
    ));

    TraceResult::completed(steps, value, path_for(input.netting_mode))
}

fn path_for(mode: NettingMode) -> PathId {
    match mode {
        NettingMode::NoNetting => PathId::NoNetting,
        NettingMode::Netting => PathId::Netting,
    }
}

fn quantity_gate(quantities: Quantities) -> (bool, String) {
    match quantities {
        Quantities::Position { hold } => {
            let ok = hold != 0;
            let verdict = if ok { "≠ 0 -> evaluate" } else { "= 0 -> skip" };
            (ok, format!("msgType = position(6), MF#7 = {hold} {verdict}"))
        }
        Quantities::Trade { buy, sell } => {
            let ok = buy != 0 || sell != 0;
            let verdict = if ok {
                "not both 0 -> evaluate"
            } else {
                "both 0 -> skip"
            };
            (
                ok,
                format!("msgType = trade(4), MF#5 = {buy}, MF#6 = {sell} {verdict}"),
            )
        }
    }
}

struct SignedQuantity {
    name: &'static str,
    expression: String,
    qty: i128,
}

/// Step 4. Quantities are widened to `i128` so negation and subtraction of
/// any `i64` pair cannot overflow.
fn signed_quantity(
    quantities: Quantities,
    mode: NettingMode,
    direction: Direction,
) -> SignedQuantity {
    let dir = direction_label(direction);
    match (quantities, mode, direction.side()) {
        (Quantities::Position { hold }, NettingMode::NoNetting, Side::Long | Side::Short) => {
            SignedQuantity {
                name: "Position quantity (no netting)",
                expression: format!("msgType = position -> qty = MF#7 = {hold}"),
                qty: i128::from(hold),
            }
        }
        (Quantities::Trade { buy, sell }, NettingMode::NoNetting, Side::Long | Side::Short) => {
            let qty = i128::from(buy) - i128::from(sell);
            SignedQuantity {
                name: "Trade quantity (no netting)",
                expression: format!(
                    "msgType = trade -> qty = MF#5 − MF#6 = {buy} − {sell} = {qty}"
                ),
                qty,
            }
        }
        (Quantities::Position { hold }, NettingMode::Netting, Side::Long) => SignedQuantity {
            name: "Position quantity (netting, signed by direction)",
            expression: format!("direction = {dir} -> MF#7 = {hold}"),
            qty: i128::from(hold),
        },
        (Quantities::Position { hold }, NettingMode::Netting, Side::Short) => {
            let qty = -i128::from(hold);
            SignedQuantity {
                name: "Position quantity (netting, signed by direction)",
                expression: format!("direction = {dir} -> −MF#7 = {qty}"),
                qty,
            }
        }
        (Quantities::Trade { buy, sell }, NettingMode::Netting, Side::Long) => {
            let qty = i128::from(buy) - i128::from(sell);
            SignedQuantity {
                name: "Trade quantity (netting, signed by direction)",
                expression: format!("direction = {dir} -> MF#5 − MF#6 = {buy} − {sell} = {qty}"),
                qty,
            }
        }
        (Quantities::Trade { buy, sell }, NettingMode::Netting, Side::Short) => {
            let qty = i128::from(sell) - i128::from(buy);
            SignedQuantity {
                name: "Trade quantity (netting, signed by direction)",
                expression: format!("direction = {dir} -> MF#6 − MF#5 = {sell} − {buy} = {qty}"),
                qty,
            }
        }
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "long(1)",
        Direction::Short => "short(2)",
        Direction::ShortVariant => "short(3)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{MsgType, SecType};
    use crate::core::presets::builtin_presets;

    fn names(trace: &TraceResult) -> Vec<&str> {
        trace.steps().iter().map(|step| step.name.as_str()).collect()
    }

    #[test]
    fn presets_evaluate_to_documented_values() {
        let presets = builtin_presets();
        let fut = evaluate(&presets[0].input);
        assert_eq!(fut.result(), Some(50500.0));
        assert_eq!(fut.path(), PathId::NoNetting);

        let opt_long = evaluate(&presets[1].input);
        assert_eq!(opt_long.result(), Some(64000.0));
        assert_eq!(opt_long.path(), PathId::Netting);

        let opt_short = evaluate(&presets[2].input);
        assert_eq!(opt_short.result(), Some(-22400.0));
        assert_eq!(opt_short.path(), PathId::Netting);
    }

    #[test]
    fn ineligible_type_short_circuits_after_one_step() {
        let input = FactorInput {
            sec_type: SecType::from("STK"),
            ..FactorInput::default()
        };
        let trace = evaluate(&input);
        assert_eq!(trace.path(), PathId::SkipType);
        assert_eq!(trace.result(), None);
        assert_eq!(trace.error(), Some(TYPE_NOT_ELIGIBLE));
        assert_eq!(trace.steps().len(), 1);
        assert!(!trace.steps()[0].passed);
        assert!(trace.steps()[0].expression.contains("\"STK\""));
    }

    #[test]
    fn zero_hold_short_circuits_after_two_steps() {
        let input = FactorInput {
            hold_qty: 0,
            ..FactorInput::default()
        };
        let trace = evaluate(&input);
        assert_eq!(trace.path(), PathId::SkipQty);
        assert_eq!(trace.error(), Some(QUANTITY_IS_ZERO));
        assert_eq!(names(&trace), vec![STEP_TYPE_GATE, STEP_QUANTITY_GATE]);
        assert!(trace.steps()[0].passed);
        assert!(!trace.steps()[1].passed);
    }

    #[test]
    fn zero_trade_quantities_short_circuit_even_with_stale_hold() {
        let input = FactorInput {
            msg_type: MsgType::Trade,
            hold_qty: 500,
            buy_qty: 0,
            sell_qty: 0,
            ..FactorInput::default()
        };
        let trace = evaluate(&input);
        assert_eq!(trace.path(), PathId::SkipQty);
        assert_eq!(trace.steps().len(), 2);
    }

    #[test]
    fn one_sided_trade_passes_quantity_gate() {
        let input = FactorInput {
            msg_type: MsgType::Trade,
            buy_qty: 0,
            sell_qty: 5,
            multiplier: 2.0,
            latest_price: 1.0,
            ..FactorInput::default()
        };
        let trace = evaluate(&input);
        assert_eq!(trace.result(), Some(-10.0));
        assert_eq!(trace.path(), PathId::NoNetting);
    }

    #[test]
    fn completed_trace_records_all_steps_in_order() {
        let trace = evaluate(&FactorInput::default());
        assert_eq!(
            names(&trace),
            vec![
                STEP_TYPE_GATE,
                STEP_QUANTITY_GATE,
                STEP_NETTING_MODE,
                "Position quantity (no netting)",
                STEP_MULTIPLIER,
                STEP_AGGREGATE,
                STEP_LATEST_PRICE,
            ]
        );
        let values: Vec<Option<f64>> = trace.steps().iter().map(|step| step.value).collect();
        assert_eq!(
            values,
            vec![None, None, None, None, Some(1000.0), Some(1000.0), Some(50500.0)]
        );
        assert!(trace.steps().iter().all(|step| step.passed));
        assert_eq!(trace.steps()[4].expression, "100 × MF#131(10) = 1000");
        assert_eq!(trace.steps()[6].expression, "1000 × MF#129(50.5) = 50500");
    }

    #[test]
    fn netting_position_negates_for_both_short_codes() {
        for direction in [Direction::Short, Direction::ShortVariant] {
            let input = FactorInput {
                netting_mode: NettingMode::Netting,
                direction,
                ..FactorInput::default()
            };
            let trace = evaluate(&input);
            assert_eq!(trace.result(), Some(-50500.0));
            assert_eq!(trace.path(), PathId::Netting);
        }
    }

    #[test]
    fn no_netting_ignores_direction() {
        let long = evaluate(&FactorInput::default());
        let short = evaluate(&FactorInput {
            direction: Direction::Short,
            ..FactorInput::default()
        });
        assert_eq!(long.result(), short.result());
    }

    #[test]
    fn netting_trade_long_keeps_buy_minus_sell() {
        let input = FactorInput {
            msg_type: MsgType::Trade,
            buy_qty: 150,
            sell_qty: 80,
            multiplier: 1.0,
            latest_price: 1.0,
            netting_mode: NettingMode::Netting,
            ..FactorInput::default()
        };
        let trace = evaluate(&input);
        assert_eq!(trace.result(), Some(70.0));
        assert!(trace.steps()[3].expression.contains("150 − 80 = 70"));
    }

    #[test]
    fn evaluation_is_deterministic() {
        for preset in builtin_presets() {
            assert_eq!(evaluate(&preset.input), evaluate(&preset.input));
        }
    }

    #[test]
    fn every_well_formed_combination_concludes_exactly_once() {
        let sec_types = [SecType::Fut, SecType::Opt, SecType::from("STK")];
        let msg_types = [MsgType::Trade, MsgType::Position];
        let directions = [Direction::Long, Direction::Short, Direction::ShortVariant];
        let modes = [NettingMode::NoNetting, NettingMode::Netting];
        for sec_type in &sec_types {
            for msg_type in msg_types {
                for direction in directions {
                    for netting_mode in modes {
                        for qty in [0, 7] {
                            let input = FactorInput {
                                sec_type: sec_type.clone(),
                                msg_type,
                                hold_qty: qty,
                                buy_qty: qty,
                                sell_qty: 0,
                                direction,
                                netting_mode,
                                ..FactorInput::default()
                            };
                            let trace = evaluate(&input);
                            assert!(trace.result().is_some() != trace.error().is_some());
                            assert!(PathId::ALL.contains(&trace.path()));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn extreme_quantities_do_not_overflow() {
        let input = FactorInput {
            msg_type: MsgType::Trade,
            buy_qty: i64::MIN,
            sell_qty: i64::MAX,
            multiplier: 1.0,
            latest_price: 1.0,
            direction: Direction::Short,
            netting_mode: NettingMode::Netting,
            ..FactorInput::default()
        };
        let trace = evaluate(&input);
        let expected = (i128::from(i64::MAX) - i128::from(i64::MIN)) as f64;
        assert_eq!(trace.result(), Some(expected));
    }

    struct Doubled;

    impl Aggregator for Doubled {
        fn aggregate(&self, rows: &[f64]) -> f64 {
            rows.iter().sum::<f64>() * 2.0
        }

        fn describe(&self, _rows: &[f64], total: f64) -> String {
            format!("DOUBLED = {total}")
        }
    }

    #[test]
    fn aggregation_is_pluggable_and_precedes_price() {
        let trace = evaluate_with(&FactorInput::default(), &Doubled);
        assert_eq!(trace.steps()[5].expression, "DOUBLED = 2000");
        assert_eq!(trace.result(), Some(101000.0));
    }
}
