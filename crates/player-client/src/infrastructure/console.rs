//! Line-oriented operator console for the headless player.
//!
//! Each stdin line is parsed into a [`ConsoleCommand`]; session events are
//! rendered back as single human-readable lines.  Pointer coordinates are
//! given in local surface pixels, exactly as a windowing toolkit would
//! report them.

use player_core::domain::automation::AutomationRun;
use player_core::domain::command::CommandOutcome;
use player_core::keymap::KeyInput;
use player_core::LocalPoint;
use thiserror::Error;

use crate::application::session::{SessionControl, SessionEvent};

pub const HELP: &str = "\
commands:
  ai <instruction>              send a natural-language command
  goal [--max N] <goal>         start a goal automation run
  stop                          request the running automation to stop
  click X Y | dblclick X Y | rclick X Y
  drag X1 Y1 X2 Y2
  scroll up|down X Y
  key [ctrl] [cmd] [alt] [shift] KEY
  type <text>                   type text on the remote host
  quality N | fps N             stream settings
  status | snapshot | connect | disconnect | help | quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command '{0}' (type 'help')")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Session(SessionControl),
    Status,
    Snapshot,
    Help,
    Quit,
}

/// Parses one console line.  Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// [`ConsoleError`] describing what was wrong with the line.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "ai" => {
            if rest.is_empty() {
                return Err(ConsoleError::Usage("ai <instruction>"));
            }
            ConsoleCommand::Session(SessionControl::Command(rest.to_string()))
        }
        "goal" => parse_goal(&args)?,
        "stop" => ConsoleCommand::Session(SessionControl::StopGoal),
        "click" => ConsoleCommand::Session(SessionControl::Click(point(&args, "click X Y")?)),
        "dblclick" => ConsoleCommand::Session(SessionControl::DoubleClick(point(&args, "dblclick X Y")?)),
        "rclick" => ConsoleCommand::Session(SessionControl::RightClick(point(&args, "rclick X Y")?)),
        "drag" => {
            const USAGE: &str = "drag X1 Y1 X2 Y2";
            let [x1, y1, x2, y2] = args.as_slice() else {
                return Err(ConsoleError::Usage(USAGE));
            };
            ConsoleCommand::Session(SessionControl::Drag {
                from: LocalPoint::new(number(x1)?, number(y1)?),
                to: LocalPoint::new(number(x2)?, number(y2)?),
            })
        }
        "scroll" => {
            const USAGE: &str = "scroll up|down X Y";
            let [direction, x, y] = args.as_slice() else {
                return Err(ConsoleError::Usage(USAGE));
            };
            let delta_y = match direction.to_ascii_lowercase().as_str() {
                "up" => -1.0,
                "down" => 1.0,
                _ => return Err(ConsoleError::Usage(USAGE)),
            };
            ConsoleCommand::Session(SessionControl::Scroll { at: LocalPoint::new(number(x)?, number(y)?), delta_y })
        }
        "key" => ConsoleCommand::Session(SessionControl::Key(parse_key(&args)?)),
        "type" => {
            if rest.is_empty() {
                return Err(ConsoleError::Usage("type <text>"));
            }
            ConsoleCommand::Session(SessionControl::Type(rest.to_string()))
        }
        "quality" => ConsoleCommand::Session(SessionControl::Quality(single_u32(&args, "quality N")?)),
        "fps" => ConsoleCommand::Session(SessionControl::Fps(single_u32(&args, "fps N")?)),
        "connect" => ConsoleCommand::Session(SessionControl::Connect),
        "disconnect" => ConsoleCommand::Session(SessionControl::Disconnect),
        "status" => ConsoleCommand::Status,
        "snapshot" => ConsoleCommand::Snapshot,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(ConsoleError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_goal(args: &[&str]) -> Result<ConsoleCommand, ConsoleError> {
    const USAGE: &str = "goal [--max N] <goal>";
    let (max_steps, words) = match args {
        ["--max", n, words @ ..] => (Some(n.parse::<u32>().map_err(|_| ConsoleError::InvalidNumber(n.to_string()))?), words),
        words => (None, words),
    };
    if words.is_empty() {
        return Err(ConsoleError::Usage(USAGE));
    }
    Ok(ConsoleCommand::Session(SessionControl::StartGoal { goal: words.join(" "), max_steps }))
}

fn parse_key(args: &[&str]) -> Result<KeyInput, ConsoleError> {
    const USAGE: &str = "key [ctrl] [cmd] [alt] [shift] KEY";
    let Some((key, modifiers)) = args.split_last() else {
        return Err(ConsoleError::Usage(USAGE));
    };
    let mut input = KeyInput::plain(*key);
    for modifier in modifiers {
        input = match modifier.to_ascii_lowercase().as_str() {
            "ctrl" => input.with_ctrl(),
            "cmd" | "meta" => input.with_meta(),
            "alt" => input.with_alt(),
            "shift" => input.with_shift(),
            _ => return Err(ConsoleError::Usage(USAGE)),
        };
    }
    Ok(input)
}

fn point(args: &[&str], usage: &'static str) -> Result<LocalPoint, ConsoleError> {
    let [x, y] = args else {
        return Err(ConsoleError::Usage(usage));
    };
    Ok(LocalPoint::new(number(x)?, number(y)?))
}

fn single_u32(args: &[&str], usage: &'static str) -> Result<u32, ConsoleError> {
    let [value] = args else {
        return Err(ConsoleError::Usage(usage));
    };
    value.parse().map_err(|_| ConsoleError::InvalidNumber(value.to_string()))
}

fn number(text: &str) -> Result<f64, ConsoleError> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConsoleError::InvalidNumber(text.to_string()))
}

/// Renders a session event as one display line.
pub fn render_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Connected => "connected".to_string(),
        SessionEvent::Disconnected { code: Some(code), reason } if !reason.is_empty() => {
            format!("disconnected ({code}: {reason})")
        }
        SessionEvent::Disconnected { code: Some(code), .. } => format!("disconnected ({code})"),
        SessionEvent::Disconnected { code: None, .. } => "disconnected".to_string(),
        SessionEvent::TransportError(error) => format!("connection error: {error}"),
        SessionEvent::ReconnectScheduled { attempt, delay } => {
            format!("reconnecting in {} ms (attempt {attempt})", delay.as_millis())
        }
        SessionEvent::ReconnectExhausted { attempts } => {
            format!("gave up after {attempts} reconnect attempts; type 'connect' to retry")
        }
        SessionEvent::ServerStatus { status, message } => format!("[{status}] {message}"),
        SessionEvent::ServerError { message, code: Some(code) } => format!("server error [{code}]: {message}"),
        SessionEvent::ServerError { message, code: None } => format!("server error: {message}"),
        SessionEvent::ActionFailed { message, .. } => format!("action failed: {message}"),
        SessionEvent::CommandFinished(CommandOutcome::Succeeded { thought, action }) => {
            format!("ai: {thought} -> {action}")
        }
        SessionEvent::CommandFinished(CommandOutcome::Failed { error }) => format!("ai failed: {error}"),
        SessionEvent::Rejected(reason) => format!("rejected: {reason}"),
        SessionEvent::AutomationProgress(run) => render_progress(run),
        SessionEvent::AutomationFinished(reason) => {
            format!("[goal] {}: {}", reason.classification().as_str(), reason.message())
        }
        SessionEvent::Stats(stats) => {
            format!("fps {} | {} | frames {}", stats.fps, stats.resolution, stats.frames)
        }
    }
}

fn render_progress(run: &AutomationRun) -> String {
    let state = if run.running { "running" } else { "idle" };
    let mut line = format!(
        "[goal] {state} step {}/{} ({:.0}%)",
        run.current_step, run.max_steps, run.progress_percent
    );
    if let Some(description) = &run.progress_description {
        line.push_str(" - ");
        line.push_str(description);
    }
    if let Some(last) = run.history.last() {
        line.push_str(&format!(" | last: {}", last.action_type));
    }
    line
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::SessionStats;
    use player_core::domain::automation::FinishReason;
    use std::time::Duration;

    fn control(line: &str) -> SessionControl {
        match parse_line(line).unwrap() {
            Some(ConsoleCommand::Session(control)) => control,
            other => panic!("expected a session control, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_line_is_ignored() {
        // Arrange / Act
        let parsed = parse_line("   ").unwrap();

        // Assert
        assert_eq!(parsed, None);
    }

    #[test]
    fn test_ai_keeps_the_whole_instruction() {
        assert_eq!(control("ai  open the  settings page"), SessionControl::Command("open the  settings page".into()));
    }

    #[test]
    fn test_goal_with_and_without_step_budget() {
        assert_eq!(
            control("goal --max 12 log in as admin"),
            SessionControl::StartGoal { goal: "log in as admin".into(), max_steps: Some(12) }
        );
        assert_eq!(control("goal log in"), SessionControl::StartGoal { goal: "log in".into(), max_steps: None });
    }

    #[test]
    fn test_goal_without_text_is_usage_error() {
        assert!(matches!(parse_line("goal --max 3"), Err(ConsoleError::Usage(_))));
    }

    #[test]
    fn test_pointer_commands() {
        assert_eq!(control("click 100 50"), SessionControl::Click(LocalPoint::new(100.0, 50.0)));
        assert_eq!(control("rclick 1 2"), SessionControl::RightClick(LocalPoint::new(1.0, 2.0)));
        assert_eq!(
            control("drag 0 0 30.5 40"),
            SessionControl::Drag { from: LocalPoint::new(0.0, 0.0), to: LocalPoint::new(30.5, 40.0) }
        );
        assert_eq!(
            control("scroll up 5 6"),
            SessionControl::Scroll { at: LocalPoint::new(5.0, 6.0), delta_y: -1.0 }
        );
    }

    #[test]
    fn test_bad_coordinates_are_rejected() {
        assert_eq!(parse_line("click ten 5"), Err(ConsoleError::InvalidNumber("ten".into())));
        assert!(matches!(parse_line("click 5"), Err(ConsoleError::Usage(_))));
        assert_eq!(parse_line("click NaN 5"), Err(ConsoleError::InvalidNumber("NaN".into())));
    }

    #[test]
    fn test_key_with_modifiers() {
        assert_eq!(control("key ctrl shift T"), SessionControl::Key(KeyInput::plain("T").with_ctrl().with_shift()));
        assert_eq!(control("key Enter"), SessionControl::Key(KeyInput::plain("Enter")));
        assert!(matches!(parse_line("key hyper x"), Err(ConsoleError::Usage(_))));
    }

    #[test]
    fn test_settings_and_local_commands() {
        assert_eq!(control("quality 70"), SessionControl::Quality(70));
        assert_eq!(control("FPS 15"), SessionControl::Fps(15));
        assert_eq!(parse_line("snapshot").unwrap(), Some(ConsoleCommand::Snapshot));
        assert_eq!(parse_line("exit").unwrap(), Some(ConsoleCommand::Quit));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse_line("fly 1 2"), Err(ConsoleError::UnknownCommand("fly".into())));
    }

    #[test]
    fn test_render_command_outcomes() {
        let ok = SessionEvent::CommandFinished(CommandOutcome::Succeeded {
            thought: "analysis complete".into(),
            action: "done".into(),
        });
        let failed = SessionEvent::CommandFinished(CommandOutcome::Failed { error: "connection lost".into() });

        assert_eq!(render_event(&ok), "ai: analysis complete -> done");
        assert_eq!(render_event(&failed), "ai failed: connection lost");
    }

    #[test]
    fn test_render_automation_finish_and_reconnect() {
        assert_eq!(
            render_event(&SessionEvent::AutomationFinished(FinishReason::MaxSteps)),
            "[goal] warning: Reached the maximum number of steps."
        );
        assert_eq!(
            render_event(&SessionEvent::ReconnectScheduled { attempt: 2, delay: Duration::from_millis(2000) }),
            "reconnecting in 2000 ms (attempt 2)"
        );
    }

    #[test]
    fn test_render_stats_and_disconnect() {
        let stats = SessionEvent::Stats(SessionStats { fps: 24, resolution: "1920x1080".into(), frames: 9 });
        assert_eq!(render_event(&stats), "fps 24 | 1920x1080 | frames 9");
        assert_eq!(
            render_event(&SessionEvent::Disconnected { code: Some(1006), reason: String::new() }),
            "disconnected (1006)"
        );
    }

    #[test]
    fn test_render_progress_includes_description() {
        let run = AutomationRun {
            goal: "g".into(),
            max_steps: 10,
            running: true,
            current_step: 3,
            progress_percent: 30.0,
            progress_description: Some("filling the form".into()),
            ..AutomationRun::default()
        };

        assert_eq!(
            render_event(&SessionEvent::AutomationProgress(run)),
            "[goal] running step 3/10 (30%) - filling the form"
        );
    }
}
