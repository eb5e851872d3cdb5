//! Session orchestrator: the composition point of the player.
//!
//! A [`Session`] owns one of each component and routes between them:
//!
//! ```text
//!  transport events ──► handle_event ──► FramePipeline      (screen)
//!                                    ├──► CommandCoordinator (ai_response)
//!                                    ├──► AutomationCoordinator (automation_status)
//!                                    └──► SessionEvent fan-out (everything else)
//!
//!  local input ──► GestureTranslator ──► transport.send
//!  operator    ──► Command / Automation coordinators ──► transport.send
//! ```
//!
//! The session is driven from a single task.  Every handler runs to
//! completion before the next event is taken, so no two components ever
//! interleave within one message dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use player_core::domain::automation::{AutomationCoordinator, AutomationError, AutomationRun, FinishReason};
use player_core::domain::command::{CommandCoordinator, CommandError, CommandOutcome};
use player_core::domain::connection::{ConnectionState, TransportEvent};
use player_core::domain::gesture::{GestureTranslator, PointerButton};
use player_core::keymap::KeyInput;
use player_core::protocol::messages::{ActionResultStatus, ConfigSetting};
use player_core::{Action, InboundMessage, LocalPoint, MessageSink, OutboundMessage};
use tracing::{debug, info, warn};

use super::fanout::EventFanout;
use super::frame_pipeline::{FramePipeline, Surface};
use crate::domain::config::PlayerConfig;

/// The transport as seen by the session: a message sink that can also be
/// opened, closed and queried.
pub trait SessionTransport: MessageSink {
    /// Opens the connection unless one is already open or being opened.
    fn connect(&self);

    /// Closes the connection with a normal close code and suppresses
    /// automatic reconnection.
    fn disconnect(&self);

    fn state(&self) -> ConnectionState;
}

/// Periodic statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub fps: u32,
    /// `"<w>x<h>"` of the remote surface, or `"-"` before the first frame.
    pub resolution: String,
    pub frames: u64,
}

/// Everything the presentation layer needs to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connected,
    Disconnected { code: Option<u16>, reason: String },
    TransportError(String),
    ReconnectScheduled { attempt: u32, delay: Duration },
    ReconnectExhausted { attempts: u32 },
    /// A host `status` notice such as `connected` or `config_updated`.
    ServerStatus { status: String, message: String },
    ServerError { message: String, code: Option<String> },
    /// The host reported that an action could not be executed.
    ActionFailed { message: String, code: Option<String> },
    CommandFinished(CommandOutcome),
    /// A local validation failure; nothing was sent.
    Rejected(String),
    AutomationProgress(AutomationRun),
    AutomationFinished(FinishReason),
    Stats(SessionStats),
}

/// Operator requests, as produced by a front end.
///
/// Pointer variants carry local surface coordinates and replay the event
/// sequence a windowing toolkit would deliver for that gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionControl {
    Connect,
    Disconnect,
    Command(String),
    StartGoal { goal: String, max_steps: Option<u32> },
    StopGoal,
    Click(LocalPoint),
    DoubleClick(LocalPoint),
    RightClick(LocalPoint),
    Drag { from: LocalPoint, to: LocalPoint },
    Scroll { at: LocalPoint, delta_y: f64 },
    Key(KeyInput),
    Type(String),
    Quality(u32),
    Fps(u32),
}

pub struct Session<S: Surface, T: SessionTransport> {
    transport: Arc<T>,
    pipeline: FramePipeline<S>,
    gestures: GestureTranslator,
    command: CommandCoordinator,
    automation: AutomationCoordinator,
    events: EventFanout<SessionEvent>,
}

impl<S: Surface, T: SessionTransport> Session<S, T> {
    pub fn new(config: &PlayerConfig, surface: S, transport: Arc<T>) -> Self {
        Self {
            transport,
            pipeline: FramePipeline::new(surface, config.fps_window),
            gestures: GestureTranslator::new(),
            command: CommandCoordinator::new(config.command_timeout),
            automation: AutomationCoordinator::new(config.default_max_steps),
            events: EventFanout::new(),
        }
    }

    /// Registers a presentation subscriber.
    pub fn subscribe(&self) -> tokio::sync::mpsc::UnboundedReceiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn connect(&self) {
        self.transport.connect();
    }

    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn pipeline(&self) -> &FramePipeline<S> {
        &self.pipeline
    }

    pub fn automation(&self) -> &AutomationRun {
        self.automation.run()
    }

    pub fn is_awaiting_command(&self) -> bool {
        self.command.is_awaiting()
    }

    pub fn input_enabled(&self) -> bool {
        self.gestures.is_enabled()
    }

    // ── Transport events ──────────────────────────────────────────────────────

    /// Routes one transport event.
    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                info!("session connected");
                self.gestures.set_enabled(true);
                self.events.publish(SessionEvent::Connected);
            }
            TransportEvent::Message(message) => self.dispatch(message).await,
            TransportEvent::Error(error) => {
                warn!("transport error: {error}");
                self.events.publish(SessionEvent::TransportError(error));
            }
            TransportEvent::Closed { code, reason } => {
                info!(?code, %reason, "session disconnected");
                self.gestures.set_enabled(false);
                self.pipeline.clear();
                if let Some(outcome) = self.command.on_connection_lost() {
                    self.events.publish(SessionEvent::CommandFinished(outcome));
                }
                self.events.publish(SessionEvent::Disconnected { code, reason });
            }
            TransportEvent::ReconnectScheduled { attempt, delay } => {
                self.events.publish(SessionEvent::ReconnectScheduled { attempt, delay });
            }
            TransportEvent::ReconnectExhausted { attempts } => {
                self.events.publish(SessionEvent::ReconnectExhausted { attempts });
            }
        }
    }

    async fn dispatch(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Screen(frame) => {
                // Decode failures are already logged by the pipeline.
                let _ = self.pipeline.ingest(frame).await;
            }
            InboundMessage::Status(notice) => {
                info!(status = %notice.status, "server status: {}", notice.message);
                self.events.publish(SessionEvent::ServerStatus { status: notice.status, message: notice.message });
            }
            InboundMessage::AiResponse(response) => {
                let outcome = self.command.on_response(&response);
                self.events.publish(SessionEvent::CommandFinished(outcome));
            }
            InboundMessage::AutomationStatus(status) => {
                let finished = self.automation.on_status(&status);
                self.events.publish(SessionEvent::AutomationProgress(self.automation.run().clone()));
                if let Some(reason) = finished {
                    self.events.publish(SessionEvent::AutomationFinished(reason));
                }
            }
            InboundMessage::Error(error) => {
                warn!(code = ?error.code, "server error: {}", error.message);
                self.events.publish(SessionEvent::ServerError { message: error.message, code: error.code });
            }
            InboundMessage::ActionResult(result) => match result.status {
                ActionResultStatus::Success => debug!("action acknowledged"),
                ActionResultStatus::Error => {
                    let message = result.message.unwrap_or_else(|| "action failed".to_string());
                    warn!(code = ?result.code, "action failed on the host: {message}");
                    self.events.publish(SessionEvent::ActionFailed { message, code: result.code });
                }
            },
        }
    }

    // ── Local input ───────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, button: PointerButton, at: LocalPoint) {
        self.gestures.pointer_down(button, at, &self.pipeline);
    }

    pub fn pointer_move(&mut self, at: LocalPoint) {
        self.gestures.pointer_move(at);
    }

    pub fn pointer_up(&mut self, button: PointerButton, at: LocalPoint) {
        let action = self.gestures.pointer_up(button, at, &self.pipeline);
        self.emit(action);
    }

    pub fn pointer_leave(&mut self) {
        self.gestures.pointer_leave();
    }

    /// A click event.  Emits a `click` action and draws the click cue.
    pub fn click(&mut self, button: PointerButton, at: LocalPoint) {
        let action = self.gestures.click(button, at, &self.pipeline);
        if matches!(action, Some(Action::Click { .. })) {
            self.pipeline.show_click_feedback(at);
        }
        self.emit(action);
    }

    pub fn double_click(&mut self, at: LocalPoint) {
        let action = self.gestures.double_click(at, &self.pipeline);
        self.emit(action);
    }

    pub fn right_click(&mut self, at: LocalPoint) {
        let action = self.gestures.right_click(at, &self.pipeline);
        self.emit(action);
    }

    pub fn wheel(&mut self, at: LocalPoint, delta_y: f64) {
        let action = self.gestures.wheel(at, delta_y, &self.pipeline);
        self.emit(action);
    }

    pub fn key_down(&mut self, input: &KeyInput) {
        let action = self.gestures.key_down(input);
        self.emit(action);
    }

    /// Sends an explicit `type` action.  Blank text is ignored.
    pub fn type_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.emit(Some(Action::Type { text: text.to_string() }));
    }

    fn emit(&self, action: Option<Action>) {
        let Some(action) = action else {
            return;
        };
        let kind = action.kind();
        if !self.transport.send(&OutboundMessage::action(action)) {
            debug!(kind, "action dropped: transport is not open");
        }
    }

    // ── Operator requests ─────────────────────────────────────────────────────

    /// Submits a natural-language command.
    ///
    /// # Errors
    ///
    /// See [`CommandCoordinator::submit`].
    pub fn submit_command(&mut self, instruction: &str) -> Result<(), CommandError> {
        self.command.submit(instruction, self.transport.as_ref(), Instant::now())
    }

    /// # Errors
    ///
    /// See [`AutomationCoordinator::start`].
    pub fn start_automation(&mut self, goal: &str, max_steps: Option<u32>) -> Result<(), AutomationError> {
        self.automation.start(goal, max_steps, self.transport.as_ref())?;
        self.events.publish(SessionEvent::AutomationProgress(self.automation.run().clone()));
        Ok(())
    }

    /// # Errors
    ///
    /// [`AutomationError::SendFailed`] when the transport is not open.
    pub fn stop_automation(&mut self) -> Result<(), AutomationError> {
        self.automation.stop(self.transport.as_ref())
    }

    /// Returns whether the setting was sent.
    pub fn set_quality(&self, quality: u32) -> bool {
        self.send_config(ConfigSetting::Quality, quality)
    }

    pub fn set_fps(&self, fps: u32) -> bool {
        self.send_config(ConfigSetting::Fps, fps)
    }

    fn send_config(&self, setting: ConfigSetting, value: u32) -> bool {
        let sent = self.transport.send(&OutboundMessage::config(setting, value));
        if !sent {
            warn!(?setting, value, "config not sent: transport is not open");
        }
        sent
    }

    /// Applies one operator request.  Validation failures are published as
    /// [`SessionEvent::Rejected`].
    pub fn apply(&mut self, control: SessionControl) {
        let rejected = match control {
            SessionControl::Connect => {
                self.connect();
                None
            }
            SessionControl::Disconnect => {
                self.disconnect();
                None
            }
            SessionControl::Command(instruction) => self.submit_command(&instruction).err().map(|e| e.to_string()),
            SessionControl::StartGoal { goal, max_steps } => {
                self.start_automation(&goal, max_steps).err().map(|e| e.to_string())
            }
            SessionControl::StopGoal => self.stop_automation().err().map(|e| e.to_string()),
            SessionControl::Click(at) => {
                self.pointer_down(PointerButton::Primary, at);
                self.pointer_up(PointerButton::Primary, at);
                self.click(PointerButton::Primary, at);
                None
            }
            SessionControl::DoubleClick(at) => {
                self.double_click(at);
                None
            }
            SessionControl::RightClick(at) => {
                self.right_click(at);
                None
            }
            SessionControl::Drag { from, to } => {
                self.pointer_down(PointerButton::Primary, from);
                self.pointer_move(to);
                self.pointer_up(PointerButton::Primary, to);
                self.click(PointerButton::Primary, to);
                None
            }
            SessionControl::Scroll { at, delta_y } => {
                self.wheel(at, delta_y);
                None
            }
            SessionControl::Key(input) => {
                self.key_down(&input);
                None
            }
            SessionControl::Type(text) => {
                self.type_text(&text);
                None
            }
            SessionControl::Quality(value) => {
                self.set_quality(value);
                None
            }
            SessionControl::Fps(value) => {
                self.set_fps(value);
                None
            }
        };

        if let Some(reason) = rejected {
            warn!("request rejected: {reason}");
            self.events.publish(SessionEvent::Rejected(reason));
        }
    }

    // ── Timers ────────────────────────────────────────────────────────────────

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            fps: self.pipeline.fps(),
            resolution: self.pipeline.resolution(),
            frames: self.pipeline.frame_count(),
        }
    }

    pub fn publish_stats(&self) {
        self.events.publish(SessionEvent::Stats(self.stats()));
    }

    /// Resolves a command that has waited past its timeout.
    pub fn poll_timeouts(&mut self, now: Instant) {
        if let Some(outcome) = self.command.poll_timeout(now) {
            self.events.publish(SessionEvent::CommandFinished(outcome));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::surface::mock::{MockSurface, SurfaceCall};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use image::{ImageFormat, Rgba, RgbaImage};
    use player_core::protocol::messages::{
        ActionResult, AiResponse, AutomationStatus, LastAction, ScreenFrame, ScrollDirection, StatusNotice,
    };
    use player_core::{CoordinateMapper, RemotePoint, SurfaceSize};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    /// Records sends; `open` decides whether sends are accepted.
    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<OutboundMessage>>,
        open: AtomicBool,
        connects: AtomicU32,
        disconnects: AtomicU32,
    }

    impl MockTransport {
        fn open() -> Arc<Self> {
            let transport = Self::default();
            transport.open.store(true, Ordering::SeqCst);
            Arc::new(transport)
        }

        fn sent(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl MessageSink for MockTransport {
        fn send(&self, message: &OutboundMessage) -> bool {
            if !self.open.load(Ordering::SeqCst) {
                return false;
            }
            self.sent.lock().unwrap().push(message.clone());
            true
        }
    }

    impl SessionTransport for MockTransport {
        fn connect(&self) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }

        fn disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }

        fn state(&self) -> ConnectionState {
            if self.open.load(Ordering::SeqCst) {
                ConnectionState::Open
            } else {
                ConnectionState::Closed
            }
        }
    }

    fn png_base64(width: u32, height: u32) -> String {
        let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        STANDARD.encode(bytes)
    }

    fn screen(width: u32, height: u32, raster: (u32, u32)) -> TransportEvent {
        TransportEvent::Message(InboundMessage::Screen(ScreenFrame {
            width,
            height,
            data: png_base64(raster.0, raster.1),
            timestamp: Some(1.5),
        }))
    }

    fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn connected_session(transport: Arc<MockTransport>) -> Session<MockSurface, MockTransport> {
        let mut session = Session::new(&PlayerConfig::default(), MockSurface::new(), transport);
        session.handle_event(TransportEvent::Opened).await;
        session
    }

    #[tokio::test]
    async fn test_click_on_half_size_surface_maps_to_remote_coordinates() {
        // Arrange
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        session.handle_event(screen(1920, 1080, (960, 540))).await;

        // Act
        session.apply(SessionControl::Click(LocalPoint::new(100.0, 50.0)));

        // Assert
        assert_eq!(transport.sent(), vec![OutboundMessage::action(Action::Click { x: 200, y: 100 })]);
        assert_eq!(session.pipeline().surface().click_markers(), vec![LocalPoint::new(100.0, 50.0)]);
    }

    #[tokio::test]
    async fn test_console_click_far_outside_raster_surface_is_harmless() {
        use crate::infrastructure::console::{parse_line, ConsoleCommand};
        use crate::infrastructure::RasterSurface;

        // Arrange
        let transport = MockTransport::open();
        let mut session = Session::new(&PlayerConfig::default(), RasterSurface::new(), transport);
        session.handle_event(TransportEvent::Opened).await;
        session.handle_event(screen(64, 64, (64, 64))).await;
        let before = session.pipeline().surface().buffer().clone();
        let Ok(Some(ConsoleCommand::Session(control))) = parse_line("click 1e300 5") else {
            panic!("click line should parse");
        };

        // Act
        session.apply(control);

        // Assert
        assert_eq!(session.pipeline().surface().buffer(), &before);
        assert_eq!(session.pipeline().frame_count(), 1);
    }

    #[tokio::test]
    async fn test_drag_emits_single_drag_and_no_click() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        session.handle_event(screen(200, 200, (100, 100))).await;

        session.apply(SessionControl::Drag { from: LocalPoint::new(10.0, 10.0), to: LocalPoint::new(40.0, 30.0) });

        assert_eq!(
            transport.sent(),
            vec![OutboundMessage::action(Action::Drag { start_x: 20, start_y: 20, end_x: 80, end_y: 60 })]
        );
        assert!(session.pipeline().surface().click_markers().is_empty());
    }

    #[tokio::test]
    async fn test_input_is_ignored_before_open() {
        let transport = MockTransport::open();
        let mut session = Session::new(&PlayerConfig::default(), MockSurface::new(), transport.clone());

        session.key_down(&KeyInput::plain("Enter"));

        assert!(!session.input_enabled());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_click_before_first_frame_is_suppressed() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;

        session.click(PointerButton::Primary, LocalPoint::new(5.0, 5.0));

        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_scroll_and_hotkey_are_forwarded() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        session.handle_event(screen(100, 100, (100, 100))).await;

        session.apply(SessionControl::Scroll { at: LocalPoint::new(3.0, 4.0), delta_y: -120.0 });
        session.apply(SessionControl::Key(KeyInput::plain("c").with_ctrl()));

        assert_eq!(
            transport.sent(),
            vec![
                OutboundMessage::action(Action::Scroll { x: 3, y: 4, direction: ScrollDirection::Up }),
                OutboundMessage::action(Action::Hotkey { key: "ctrl c".into() }),
            ]
        );
    }

    #[tokio::test]
    async fn test_close_clears_pipeline_disables_input_and_fails_pending_command() {
        // Arrange
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        let mut rx = session.subscribe();
        session.handle_event(screen(64, 64, (64, 64))).await;
        session.submit_command("open the browser").unwrap();

        // Act
        session.handle_event(TransportEvent::Closed { code: Some(1006), reason: String::new() }).await;

        // Assert
        assert!(!session.input_enabled());
        assert!(!session.is_awaiting_command());
        assert_eq!(session.stats().frames, 0);
        assert_eq!(session.pipeline().surface().calls().last(), Some(&SurfaceCall::Clear));
        assert_eq!(
            drain(&mut rx),
            vec![
                SessionEvent::CommandFinished(CommandOutcome::Failed { error: "connection lost".into() }),
                SessionEvent::Disconnected { code: Some(1006), reason: String::new() },
            ]
        );
    }

    #[tokio::test]
    async fn test_second_command_while_awaiting_is_rejected() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        let mut rx = session.subscribe();

        session.apply(SessionControl::Command("first".into()));
        session.apply(SessionControl::Command("second".into()));

        assert_eq!(transport.sent(), vec![OutboundMessage::ai_command("first")]);
        assert!(matches!(drain(&mut rx).as_slice(), [SessionEvent::Rejected(_)]));
    }

    #[tokio::test]
    async fn test_ai_response_resolves_command() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        let mut rx = session.subscribe();
        session.submit_command("click ok").unwrap();

        session
            .handle_event(TransportEvent::Message(InboundMessage::AiResponse(AiResponse {
                success: true,
                thought: Some("the button is visible".into()),
                action_type: Some("click".into()),
                action_params: Some(serde_json::json!({"x": 1, "y": 2})),
                error: None,
            })))
            .await;

        assert!(!session.is_awaiting_command());
        assert_eq!(
            drain(&mut rx),
            vec![SessionEvent::CommandFinished(CommandOutcome::Succeeded {
                thought: "the button is visible".into(),
                action: r#"click({"x":1,"y":2})"#.into(),
            })]
        );
    }

    #[tokio::test]
    async fn test_command_timeout_publishes_failure() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        let mut rx = session.subscribe();
        session.submit_command("wait forever").unwrap();

        session.poll_timeouts(Instant::now() + Duration::from_secs(121));

        assert!(!session.is_awaiting_command());
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [SessionEvent::CommandFinished(CommandOutcome::Failed { .. })]
        ));
    }

    #[tokio::test]
    async fn test_automation_max_steps_finishes_with_warning_entry() {
        // Arrange
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        session.start_automation("fill the form", None).unwrap();
        let mut rx = session.subscribe();

        // Act
        session
            .handle_event(TransportEvent::Message(InboundMessage::AutomationStatus(AutomationStatus {
                is_running: false,
                current_step: 50,
                max_steps: 50,
                goal: "fill the form".into(),
                goal_status: None,
                last_action: Some(LastAction { step: 50, action_type: "click".into(), thought: None }),
                finish_reason: Some("max_steps".into()),
            })))
            .await;

        // Assert
        assert!(!session.automation().running);
        let events = drain(&mut rx);
        assert!(matches!(events.first(), Some(SessionEvent::AutomationProgress(run)) if !run.running));
        assert_eq!(events.last(), Some(&SessionEvent::AutomationFinished(FinishReason::MaxSteps)));
        assert_eq!(transport.sent(), vec![OutboundMessage::goal_start("fill the form", 50)]);
    }

    #[tokio::test]
    async fn test_blank_goal_is_rejected_without_sending() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport.clone()).await;
        let mut rx = session.subscribe();

        session.apply(SessionControl::StartGoal { goal: "   ".into(), max_steps: Some(5) });

        assert!(transport.sent().is_empty());
        assert!(matches!(drain(&mut rx).as_slice(), [SessionEvent::Rejected(_)]));
    }

    #[tokio::test]
    async fn test_status_error_and_failed_action_are_surfaced() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport).await;
        let mut rx = session.subscribe();

        session
            .handle_event(TransportEvent::Message(InboundMessage::Status(StatusNotice {
                status: "config_updated".into(),
                message: "quality=60".into(),
            })))
            .await;
        session
            .handle_event(TransportEvent::Message(InboundMessage::ActionResult(ActionResult {
                status: ActionResultStatus::Success,
                message: None,
                code: None,
            })))
            .await;
        session
            .handle_event(TransportEvent::Message(InboundMessage::ActionResult(ActionResult {
                status: ActionResultStatus::Error,
                message: Some("out of bounds".into()),
                code: Some("E_BOUNDS".into()),
            })))
            .await;

        assert_eq!(
            drain(&mut rx),
            vec![
                SessionEvent::ServerStatus { status: "config_updated".into(), message: "quality=60".into() },
                SessionEvent::ActionFailed { message: "out of bounds".into(), code: Some("E_BOUNDS".into()) },
            ]
        );
    }

    #[tokio::test]
    async fn test_stats_report_resolution_and_frames() {
        let transport = MockTransport::open();
        let mut session = connected_session(transport).await;
        assert_eq!(session.stats().resolution, "-");

        session.handle_event(screen(1280, 720, (64, 36))).await;

        let stats = session.stats();
        assert_eq!(stats.resolution, "1280x720");
        assert_eq!(stats.frames, 1);
        assert_eq!(session.pipeline().surface().size(), SurfaceSize::new(64, 36));
        assert_eq!(session.pipeline().map_to_remote(LocalPoint::new(32.0, 18.0)), Some(RemotePoint::new(640, 360)));
    }

    #[tokio::test]
    async fn test_send_failure_drops_actions_silently() {
        let transport = Arc::new(MockTransport::default());
        let mut session = connected_session(transport.clone()).await;
        session.handle_event(screen(100, 100, (100, 100))).await;

        session.apply(SessionControl::DoubleClick(LocalPoint::new(1.0, 1.0)));
        let quality_sent = session.set_quality(55);

        assert!(!quality_sent);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_config_values_are_clamped() {
        let transport = MockTransport::open();
        let session = connected_session(transport.clone()).await;

        session.set_quality(500);
        session.set_fps(0);

        assert_eq!(
            transport.sent(),
            vec![OutboundMessage::config(ConfigSetting::Quality, 100), OutboundMessage::config(ConfigSetting::Fps, 1)]
        );
    }

    #[tokio::test]
    async fn test_connect_and_disconnect_delegate_to_transport() {
        let transport = MockTransport::open();
        let mut session = Session::new(&PlayerConfig::default(), MockSurface::new(), transport.clone());

        session.apply(SessionControl::Connect);
        session.apply(SessionControl::Disconnect);

        assert_eq!(transport.connects.load(Ordering::SeqCst), 1);
        assert_eq!(transport.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(session.connection_state(), ConnectionState::Open);
    }
}
