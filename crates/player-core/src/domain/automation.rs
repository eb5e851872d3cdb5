//! Goal automation run tracking.
//!
//! The host runs the automation loop; the player only starts it, asks it to
//! stop, and mirrors the streamed `automation_status` messages into an
//! [`AutomationRun`].
//!
//! # Who decides whether a run is active?
//!
//! The host.  `start` optimistically marks the run as running so the operator
//! sees immediate feedback, but `stop` only *requests* cancellation: the
//! local flag stays set until a status message reports `is_running = false`
//! or carries a finish reason.
//!
//! # History reconciliation
//!
//! The host re-sends the latest step in every status message, so history is
//! an upsert keyed by step number: a step seen again replaces its entry in
//! place, a new step is appended.  Delivering the same step twice therefore
//! leaves exactly one entry for it.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::protocol::messages::{AutomationStatus, LastAction, OutboundMessage};
use crate::sink::MessageSink;

/// Step budget used when the caller does not provide one.
pub const DEFAULT_MAX_STEPS: u32 = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutomationError {
    #[error("goal is empty")]
    EmptyGoal,

    #[error("an automation run is already in progress")]
    AlreadyRunning,

    #[error("failed to send the automation request")]
    SendFailed,
}

/// Display classification of a terminal history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Warning,
    Info,
    Error,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// Why the host ended a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    GoalAchieved,
    MaxSteps,
    UserStopped,
    Error,
    /// Any reason code the player does not recognise, echoed verbatim.
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "goal_achieved" => Self::GoalAchieved,
            "max_steps" => Self::MaxSteps,
            "user_stopped" => Self::UserStopped,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn classification(&self) -> Classification {
        match self {
            Self::GoalAchieved => Classification::Success,
            Self::MaxSteps => Classification::Warning,
            Self::UserStopped | Self::Other(_) => Classification::Info,
            Self::Error => Classification::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::GoalAchieved => "Goal achieved!".to_string(),
            Self::MaxSteps => "Reached the maximum number of steps.".to_string(),
            Self::UserStopped => "Stopped by the user.".to_string(),
            Self::Error => "An error occurred.".to_string(),
            Self::Other(raw) => format!("Finished: {raw}"),
        }
    }
}

/// Key of a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStep {
    /// Step 0 is the synthetic start entry; host steps are positive.
    Step(u32),
    /// Terminal entry appended when the run finishes.
    Finished(FinishReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub step: HistoryStep,
    /// The host's action type, `"start"` for step 0, or the classification
    /// name for a terminal entry.
    pub action_type: String,
    pub thought: String,
}

impl HistoryEntry {
    fn from_last_action(step: u32, action: &LastAction) -> Self {
        Self {
            step: HistoryStep::Step(step),
            action_type: action.action_type.clone(),
            thought: action.thought.clone().unwrap_or_default(),
        }
    }

    fn finished(reason: FinishReason) -> Self {
        Self {
            action_type: reason.classification().as_str().to_string(),
            thought: reason.message(),
            step: HistoryStep::Finished(reason),
        }
    }

    /// Classification for terminal entries, `None` for steps.
    pub fn classification(&self) -> Option<Classification> {
        match &self.step {
            HistoryStep::Finished(reason) => Some(reason.classification()),
            HistoryStep::Step(_) => None,
        }
    }
}

/// Local mirror of the host's automation runner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationRun {
    pub goal: String,
    pub max_steps: u32,
    pub running: bool,
    pub current_step: u32,
    pub progress_percent: f64,
    pub progress_description: Option<String>,
    /// Model confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub finish_reason: Option<FinishReason>,
    pub history: Vec<HistoryEntry>,
}

impl AutomationRun {
    /// Inserts or replaces the entry for `entry.step`.
    fn upsert(&mut self, entry: HistoryEntry) {
        match self.history.iter_mut().find(|e| e.step == entry.step) {
            Some(existing) => *existing = entry,
            None => self.history.push(entry),
        }
    }

    fn last_is_finished_with(&self, reason: &FinishReason) -> bool {
        matches!(self.history.last(), Some(HistoryEntry { step: HistoryStep::Finished(r), .. }) if r == reason)
    }
}

#[derive(Debug, Clone)]
pub struct AutomationCoordinator {
    run: AutomationRun,
    default_max_steps: u32,
}

impl AutomationCoordinator {
    pub fn new(default_max_steps: u32) -> Self {
        Self { run: AutomationRun::default(), default_max_steps: default_max_steps.max(1) }
    }

    pub fn run(&self) -> &AutomationRun {
        &self.run
    }

    pub fn is_running(&self) -> bool {
        self.run.running
    }

    /// Sends a start request and resets the local run.
    ///
    /// `max_steps` of `None` or zero uses the default budget.
    ///
    /// # Errors
    ///
    /// - [`AutomationError::EmptyGoal`] for a blank goal.
    /// - [`AutomationError::AlreadyRunning`] while a run is active.
    /// - [`AutomationError::SendFailed`] when the sink dropped the message;
    ///   the local run is left untouched.
    pub fn start(&mut self, goal: &str, max_steps: Option<u32>, sink: &dyn MessageSink) -> Result<(), AutomationError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(AutomationError::EmptyGoal);
        }
        if self.run.running {
            return Err(AutomationError::AlreadyRunning);
        }
        let max_steps = max_steps.filter(|n| *n > 0).unwrap_or(self.default_max_steps);
        if !sink.send(&OutboundMessage::goal_start(goal, max_steps)) {
            warn!("automation start not sent: transport is not open");
            return Err(AutomationError::SendFailed);
        }

        info!(max_steps, "automation started");
        self.run = AutomationRun {
            goal: goal.to_string(),
            max_steps,
            running: true,
            history: vec![HistoryEntry {
                step: HistoryStep::Step(0),
                action_type: "start".to_string(),
                thought: format!("Goal automation started: \"{goal}\""),
            }],
            ..AutomationRun::default()
        };
        Ok(())
    }

    /// Requests cancellation.  The local running flag is not changed; the
    /// host confirms through the next status message.
    ///
    /// # Errors
    ///
    /// [`AutomationError::SendFailed`] when the sink dropped the message.
    pub fn stop(&mut self, sink: &dyn MessageSink) -> Result<(), AutomationError> {
        if !sink.send(&OutboundMessage::goal_stop()) {
            warn!("automation stop not sent: transport is not open");
            return Err(AutomationError::SendFailed);
        }
        info!("automation stop requested");
        Ok(())
    }

    /// Applies one `automation_status` message.
    ///
    /// Returns the finish reason when this status appended a terminal entry.
    pub fn on_status(&mut self, status: &AutomationStatus) -> Option<FinishReason> {
        let run = &mut self.run;
        run.running = status.is_running;
        run.current_step = status.current_step;
        if status.max_steps > 0 {
            run.max_steps = status.max_steps;
        }
        if !status.goal.is_empty() {
            run.goal = status.goal.clone();
        }

        match &status.goal_status {
            Some(goal_status) => {
                run.progress_percent = goal_status.progress_percent;
                run.progress_description =
                    Some(goal_status.progress_description.clone()).filter(|d| !d.is_empty());
                run.confidence = goal_status.confidence;
            }
            None => {
                run.progress_percent = 0.0;
                run.progress_description = None;
                run.confidence = 0.0;
            }
        }

        if let Some(action) = &status.last_action {
            match u32::try_from(action.step) {
                Ok(step) if step > 0 => run.upsert(HistoryEntry::from_last_action(step, action)),
                _ => debug!(step = action.step, "ignoring last_action without a positive step"),
            }
        }

        let raw = status.finish_reason.as_deref().filter(|r| !r.is_empty())?;
        let reason = FinishReason::parse(raw);
        run.running = false;
        run.finish_reason = Some(reason.clone());
        if run.last_is_finished_with(&reason) {
            debug!(reason = raw, "duplicate finish status ignored");
            return None;
        }
        info!(reason = raw, steps = run.current_step, "automation finished");
        run.history.push(HistoryEntry::finished(reason.clone()));
        Some(reason)
    }
}

impl Default for AutomationCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{AutomationRequest, GoalStatus};
    use crate::sink::tests::RecordingSink;

    fn status(running: bool, step: u32) -> AutomationStatus {
        AutomationStatus {
            is_running: running,
            current_step: step,
            max_steps: 50,
            goal: "open settings".to_string(),
            goal_status: None,
            last_action: None,
            finish_reason: None,
        }
    }

    fn last_action(step: i64, action_type: &str, thought: &str) -> Option<LastAction> {
        Some(LastAction { step, action_type: action_type.to_string(), thought: Some(thought.to_string()) })
    }

    fn started() -> (AutomationCoordinator, RecordingSink) {
        let sink = RecordingSink::open();
        let mut auto = AutomationCoordinator::default();
        auto.start("open settings", Some(20), &sink).unwrap();
        (auto, sink)
    }

    #[test]
    fn test_start_sends_request_and_records_step_zero() {
        // Arrange
        let sink = RecordingSink::open();
        let mut auto = AutomationCoordinator::default();

        // Act
        auto.start("  open settings ", Some(20), &sink).unwrap();

        // Assert
        assert_eq!(sink.sent(), vec![OutboundMessage::goal_start("open settings", 20)]);
        assert!(auto.is_running());
        assert_eq!(auto.run().history.len(), 1);
        assert_eq!(auto.run().history[0].step, HistoryStep::Step(0));
        assert_eq!(auto.run().history[0].action_type, "start");
        assert!(auto.run().history[0].thought.contains("open settings"));
    }

    #[test]
    fn test_start_uses_default_max_steps() {
        let sink = RecordingSink::open();
        let mut auto = AutomationCoordinator::default();

        auto.start("g", None, &sink).unwrap();

        assert_eq!(
            sink.sent(),
            vec![OutboundMessage::GoalAutomation(AutomationRequest::Start { goal: "g".into(), max_steps: 50 })]
        );
    }

    #[test]
    fn test_zero_max_steps_falls_back_to_default() {
        let sink = RecordingSink::open();
        let mut auto = AutomationCoordinator::new(7);
        auto.start("g", Some(0), &sink).unwrap();
        assert_eq!(auto.run().max_steps, 7);
    }

    #[test]
    fn test_blank_goal_is_rejected() {
        let sink = RecordingSink::open();
        let mut auto = AutomationCoordinator::default();

        assert_eq!(auto.start("  ", None, &sink), Err(AutomationError::EmptyGoal));
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn test_start_while_running_is_rejected() {
        let (mut auto, sink) = started();
        assert_eq!(auto.start("another", None, &sink), Err(AutomationError::AlreadyRunning));
        assert_eq!(sink.sent().len(), 1);
    }

    #[test]
    fn test_failed_start_keeps_previous_run() {
        let sink = RecordingSink::closed();
        let mut auto = AutomationCoordinator::default();

        assert_eq!(auto.start("g", None, &sink), Err(AutomationError::SendFailed));
        assert!(!auto.is_running());
        assert!(auto.run().history.is_empty());
    }

    #[test]
    fn test_stop_does_not_change_running_state() {
        let (mut auto, sink) = started();

        auto.stop(&sink).unwrap();

        assert!(auto.is_running());
        assert_eq!(sink.sent().last(), Some(&OutboundMessage::goal_stop()));
    }

    #[test]
    fn test_status_confirms_stop() {
        let (mut auto, _sink) = started();
        auto.on_status(&status(false, 2));
        assert!(!auto.is_running());
    }

    #[test]
    fn test_same_step_twice_is_upserted() {
        let (mut auto, _sink) = started();

        auto.on_status(&AutomationStatus { last_action: last_action(3, "click", "first"), ..status(true, 3) });
        auto.on_status(&AutomationStatus { last_action: last_action(3, "double_click", "second"), ..status(true, 3) });

        let step3: Vec<_> = auto.run().history.iter().filter(|e| e.step == HistoryStep::Step(3)).collect();
        assert_eq!(step3.len(), 1);
        assert_eq!(step3[0].action_type, "double_click");
        assert_eq!(step3[0].thought, "second");
    }

    #[test]
    fn test_out_of_order_steps_are_kept_in_arrival_order() {
        let (mut auto, _sink) = started();

        auto.on_status(&AutomationStatus { last_action: last_action(2, "click", "b"), ..status(true, 2) });
        auto.on_status(&AutomationStatus { last_action: last_action(1, "click", "a"), ..status(true, 2) });

        let steps: Vec<_> = auto.run().history.iter().map(|e| e.step.clone()).collect();
        assert_eq!(steps, vec![HistoryStep::Step(0), HistoryStep::Step(2), HistoryStep::Step(1)]);
    }

    #[test]
    fn test_non_positive_step_is_ignored() {
        let (mut auto, _sink) = started();
        auto.on_status(&AutomationStatus { last_action: last_action(0, "click", "x"), ..status(true, 0) });
        auto.on_status(&AutomationStatus { last_action: last_action(-1, "click", "x"), ..status(true, 0) });
        assert_eq!(auto.run().history.len(), 1);
    }

    #[test]
    fn test_progress_fields_are_mirrored() {
        let (mut auto, _sink) = started();

        auto.on_status(&AutomationStatus {
            goal_status: Some(GoalStatus {
                progress_percent: 40.0,
                progress_description: "settings icon found".into(),
                confidence: 0.8,
            }),
            ..status(true, 4)
        });

        let run = auto.run();
        assert_eq!(run.progress_percent, 40.0);
        assert_eq!(run.progress_description.as_deref(), Some("settings icon found"));
        assert_eq!(run.confidence, 0.8);
        assert_eq!(run.current_step, 4);
        assert_eq!(run.max_steps, 50);
    }

    #[test]
    fn test_status_without_goal_status_resets_progress() {
        // Arrange
        let (mut auto, _sink) = started();
        auto.on_status(&AutomationStatus {
            goal_status: Some(GoalStatus {
                progress_percent: 60.0,
                progress_description: "menu open".into(),
                confidence: 0.9,
            }),
            ..status(true, 6)
        });

        // Act
        auto.on_status(&status(true, 7));

        // Assert
        let run = auto.run();
        assert_eq!(run.progress_percent, 0.0);
        assert_eq!(run.progress_description, None);
        assert_eq!(run.confidence, 0.0);
        assert_eq!(run.current_step, 7);
    }

    #[test]
    fn test_max_steps_finish_is_warning_and_stops_run() {
        let (mut auto, _sink) = started();

        let finished = auto.on_status(&AutomationStatus {
            finish_reason: Some("max_steps".into()),
            ..status(true, 50)
        });

        assert_eq!(finished, Some(FinishReason::MaxSteps));
        assert!(!auto.is_running());
        let last = auto.run().history.last().unwrap();
        assert_eq!(last.classification(), Some(Classification::Warning));
        assert_eq!(last.thought, "Reached the maximum number of steps.");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::parse("goal_achieved").classification(), Classification::Success);
        assert_eq!(FinishReason::parse("user_stopped").classification(), Classification::Info);
        assert_eq!(FinishReason::parse("error").classification(), Classification::Error);
        let other = FinishReason::parse("timeout");
        assert_eq!(other.classification(), Classification::Info);
        assert_eq!(other.message(), "Finished: timeout");
    }

    #[test]
    fn test_duplicate_finish_is_not_appended_twice() {
        let (mut auto, _sink) = started();
        let done = AutomationStatus { finish_reason: Some("goal_achieved".into()), ..status(false, 5) };

        assert!(auto.on_status(&done).is_some());
        assert!(auto.on_status(&done).is_none());

        let terminals = auto.run().history.iter().filter(|e| e.classification().is_some()).count();
        assert_eq!(terminals, 1);
    }

    #[test]
    fn test_new_start_after_finish_clears_history() {
        let (mut auto, sink) = started();
        auto.on_status(&AutomationStatus { finish_reason: Some("user_stopped".into()), ..status(false, 1) });

        auto.start("next goal", None, &sink).unwrap();

        assert_eq!(auto.run().history.len(), 1);
        assert_eq!(auto.run().finish_reason, None);
    }
}
