//! Owned simulation session: current input, latest trace, and the replay.
//!
//! Every mutation of the input goes through this struct, which is what keeps
//! the replay in sync with the trace: an edit or preset load cancels the
//! running animation and drops the trace before anything else happens.

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::core::animation::Frame;
use crate::core::evaluator::evaluate;
use crate::core::input::{Direction, FactorInput, InputError, MsgType, NettingMode, SecType};
use crate::core::presets::{Expectation, builtin_presets, check_expected};
use crate::core::sequencer::PathSequencer;
use crate::core::trace::TraceResult;
use crate::io::config::SimulatorConfig;
use crate::scheduler::AnimationScheduler;

/// A single-field edit from the input form.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    SecType(SecType),
    MsgType(MsgType),
    HoldQty(i64),
    BuyQty(i64),
    SellQty(i64),
    Multiplier(f64),
    LatestPrice(f64),
    Direction(Direction),
    NettingMode(NettingMode),
}

impl FieldEdit {
    pub fn field(&self) -> &'static str {
        match self {
            FieldEdit::SecType(_) => "secType",
            FieldEdit::MsgType(_) => "msgType",
            FieldEdit::HoldQty(_) => "holdQty",
            FieldEdit::BuyQty(_) => "buyQty",
            FieldEdit::SellQty(_) => "sellQty",
            FieldEdit::Multiplier(_) => "multiplier",
            FieldEdit::LatestPrice(_) => "latestPrice",
            FieldEdit::Direction(_) => "direction",
            FieldEdit::NettingMode(_) => "nettingMode",
        }
    }

    fn apply(self, input: &mut FactorInput) {
        match self {
            FieldEdit::SecType(value) => input.sec_type = value,
            FieldEdit::MsgType(value) => input.msg_type = value,
            FieldEdit::HoldQty(value) => input.hold_qty = value,
            FieldEdit::BuyQty(value) => input.buy_qty = value,
            FieldEdit::SellQty(value) => input.sell_qty = value,
            FieldEdit::Multiplier(value) => input.multiplier = value,
            FieldEdit::LatestPrice(value) => input.latest_price = value,
            FieldEdit::Direction(value) => input.direction = value,
            FieldEdit::NettingMode(value) => input.netting_mode = value,
        }
    }
}

pub struct Session {
    input: FactorInput,
    active_preset: Option<usize>,
    expected: Option<f64>,
    tolerance: f64,
    trace: Option<TraceResult>,
    sequencer: PathSequencer,
    scheduler: AnimationScheduler,
}

impl Session {
    /// New session holding the configured default preset.
    pub fn new(sequencer: PathSequencer, config: &SimulatorConfig) -> Result<Self> {
        let mut session = Self {
            input: FactorInput::default(),
            active_preset: None,
            expected: None,
            tolerance: config.match_tolerance,
            trace: None,
            sequencer,
            scheduler: AnimationScheduler::new(config.tick_interval()),
        };
        session.load_preset(config.default_preset)?;
        Ok(session)
    }

    pub fn input(&self) -> &FactorInput {
        &self.input
    }

    pub fn active_preset(&self) -> Option<usize> {
        self.active_preset
    }

    pub fn expected(&self) -> Option<f64> {
        self.expected
    }

    pub fn trace(&self) -> Option<&TraceResult> {
        self.trace.as_ref()
    }

    pub fn sequencer(&self) -> &PathSequencer {
        &self.sequencer
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    /// Replace the whole input with preset `index` and adopt its expected value.
    pub fn load_preset(&mut self, index: usize) -> Result<()> {
        let preset = builtin_presets()
            .into_iter()
            .nth(index)
            .ok_or_else(|| anyhow!("unknown preset {index}"))?;
        self.invalidate();
        debug!(preset = preset.name, "load preset");
        self.input = preset.input;
        self.expected = Some(preset.expected);
        self.active_preset = Some(index);
        Ok(())
    }

    /// Replace the whole input, e.g. with one loaded from a file.
    pub fn replace_input(&mut self, input: FactorInput) {
        self.invalidate();
        self.input = input;
        self.active_preset = None;
    }

    pub fn edit(&mut self, edit: FieldEdit) {
        self.invalidate();
        debug!(field = edit.field(), "edit field");
        edit.apply(&mut self.input);
        self.active_preset = None;
    }

    pub fn set_expected(&mut self, expected: Option<f64>) {
        self.expected = expected;
    }

    /// Evaluate the current input and start replaying its path.
    pub fn execute(&mut self) -> Result<&TraceResult, InputError> {
        self.invalidate();
        self.input.validate()?;
        let trace = evaluate(&self.input);
        info!(
            outcome = %trace.path(),
            steps = trace.steps().len(),
            result = ?trace.result(),
            "evaluated"
        );
        self.scheduler.start(self.sequencer.sequence_for(trace.path()));
        Ok(&*self.trace.insert(trace))
    }

    /// Compare the latest trace with the expected value, if both exist.
    pub fn expectation(&self) -> Option<Expectation> {
        let trace = self.trace.as_ref()?;
        let expected = self.expected?;
        Some(check_expected(trace, expected, self.tolerance))
    }

    /// Wait for the next replay frame; `None` when nothing is running.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.scheduler.next_frame().await
    }

    pub fn frame(&self) -> Frame {
        self.scheduler.frame()
    }

    fn invalidate(&mut self) {
        self.scheduler.cancel();
        self.trace = None;
    }
}
