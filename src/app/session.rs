//! Session actor. One thread owns the connection state, the selected file and
//! both text buffers; everything else talks to it over a channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use chrono::Local;
use tracing::{error, info, warn};

use crate::app::adb::endpoint::Transport;
use crate::app::error::AppError;
use crate::app::models::{
    ConnectionView, ConsoleEvent, EndpointAutofill, LogEvent, LogLevel, LogLine, Notification,
    NotificationKind, SelectedFile, SessionSnapshot, SessionStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting { target: String },
    Connected { target: String, transport: Transport },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Begin { target: String },
    Verified { target: String },
    Failed,
    Disconnect,
}

impl ConnectionState {
    /// Next state, or `None` when the event is not legal here.
    pub fn apply(&self, event: &ConnectionEvent) -> Option<ConnectionState> {
        match (self, event) {
            (ConnectionState::Connecting { .. }, ConnectionEvent::Begin { .. }) => None,
            (_, ConnectionEvent::Begin { target }) => Some(ConnectionState::Connecting {
                target: target.clone(),
            }),
            (ConnectionState::Connecting { target }, ConnectionEvent::Verified { target: verified })
                if target == verified =>
            {
                Some(ConnectionState::Connected {
                    target: target.clone(),
                    transport: Transport::of(target),
                })
            }
            (_, ConnectionEvent::Verified { .. }) => None,
            (ConnectionState::Connecting { .. }, ConnectionEvent::Failed) => {
                Some(ConnectionState::Disconnected)
            }
            (_, ConnectionEvent::Failed) => None,
            (_, ConnectionEvent::Disconnect) => Some(ConnectionState::Disconnected),
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn view(&self) -> ConnectionView {
        match self {
            ConnectionState::Disconnected => ConnectionView::Disconnected,
            ConnectionState::Connecting { target } => ConnectionView::Connecting {
                target: target.clone(),
            },
            ConnectionState::Connected { target, transport } => ConnectionView::Connected {
                target: target.clone(),
                transport: *transport,
            },
        }
    }
}

/// Everything the web view can be told about.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SessionChanged(SessionStatus),
    ActivityLog(LogEvent),
    ConsoleOutput(ConsoleEvent),
    Notification(Notification),
    EndpointAutofill(EndpointAutofill),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::SessionChanged(_) => "session-changed",
            UiEvent::ActivityLog(_) => "activity-log",
            UiEvent::ConsoleOutput(_) => "console-output",
            UiEvent::Notification(_) => "notification",
            UiEvent::EndpointAutofill(_) => "endpoint-autofill",
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            UiEvent::SessionChanged(status) => serde_json::to_value(status),
            UiEvent::ActivityLog(event) => serde_json::to_value(event),
            UiEvent::ConsoleOutput(event) => serde_json::to_value(event),
            UiEvent::Notification(notification) => serde_json::to_value(notification),
            UiEvent::EndpointAutofill(fill) => serde_json::to_value(fill),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

pub type EventSink = Arc<dyn Fn(UiEvent) + Send + Sync>;

pub enum SessionMsg {
    Log(LogLevel, String),
    ClearLog,
    ConsoleAppend(String),
    ClearConsole,
    Transition(ConnectionEvent, Sender<ConnectionState>),
    SelectFile(Option<SelectedFile>),
    Autofill(EndpointAutofill),
    Notify(Notification),
    Connection(Sender<ConnectionState>),
    Snapshot(Sender<SessionSnapshot>),
}

pub struct Session {
    connection: ConnectionState,
    selected_file: Option<SelectedFile>,
    activity_log: Vec<LogLine>,
    console_output: String,
    sink: EventSink,
}

impl Session {
    pub fn new(sink: EventSink) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            selected_file: None,
            activity_log: Vec::new(),
            console_output: String::new(),
            sink,
        }
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            connection: self.connection.view(),
            selected_file: self.selected_file.clone(),
        }
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        let line = LogLine {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
        };
        self.activity_log.push(line.clone());
        (self.sink)(UiEvent::ActivityLog(LogEvent::Append { line }));
    }

    pub fn handle(&mut self, msg: SessionMsg) {
        match msg {
            SessionMsg::Log(level, message) => self.push_log(level, message),
            SessionMsg::ClearLog => {
                self.activity_log.clear();
                (self.sink)(UiEvent::ActivityLog(LogEvent::Cleared));
            }
            SessionMsg::ConsoleAppend(text) => {
                self.console_output.push_str(&text);
                (self.sink)(UiEvent::ConsoleOutput(ConsoleEvent::Append { text }));
            }
            SessionMsg::ClearConsole => {
                self.console_output.clear();
                (self.sink)(UiEvent::ConsoleOutput(ConsoleEvent::Cleared));
            }
            SessionMsg::Transition(event, reply) => {
                match self.connection.apply(&event) {
                    Some(next) => {
                        if next != self.connection {
                            self.connection = next;
                            (self.sink)(UiEvent::SessionChanged(self.status()));
                        }
                    }
                    None => {
                        warn!(state = ?self.connection, event = ?event, "ignored illegal connection transition");
                    }
                }
                let _ = reply.send(self.connection.clone());
            }
            SessionMsg::SelectFile(file) => {
                self.selected_file = file;
                (self.sink)(UiEvent::SessionChanged(self.status()));
            }
            SessionMsg::Autofill(fill) => (self.sink)(UiEvent::EndpointAutofill(fill)),
            SessionMsg::Notify(notification) => (self.sink)(UiEvent::Notification(notification)),
            SessionMsg::Connection(reply) => {
                let _ = reply.send(self.connection.clone());
            }
            SessionMsg::Snapshot(reply) => {
                let _ = reply.send(SessionSnapshot {
                    connection: self.connection.view(),
                    selected_file: self.selected_file.clone(),
                    activity_log: self.activity_log.clone(),
                    console_output: self.console_output.clone(),
                });
            }
        }
    }

    pub fn run(mut self, receiver: Receiver<SessionMsg>) {
        for msg in receiver {
            self.handle(msg);
        }
    }
}

/// Cheap clonable sender side of the actor.
#[derive(Clone)]
pub struct SessionHandle {
    sender: Sender<SessionMsg>,
}

impl SessionHandle {
    pub fn spawn(sink: EventSink) -> Self {
        let (sender, receiver) = mpsc::channel();
        let session = Session::new(sink);
        std::thread::Builder::new()
            .name("session".to_string())
            .spawn(move || session.run(receiver))
            .map(|_| ())
            .unwrap_or_else(|err| error!(error = %err, "failed to spawn session thread"));
        Self { sender }
    }

    fn send(&self, msg: SessionMsg) {
        if self.sender.send(msg).is_err() {
            error!("session actor is gone");
        }
    }

    fn ask<T>(
        &self,
        build: impl FnOnce(Sender<T>) -> SessionMsg,
        trace_id: &str,
    ) -> Result<T, AppError> {
        let (reply, answer) = mpsc::channel();
        self.sender
            .send(build(reply))
            .map_err(|_| AppError::system("Session is unavailable", trace_id))?;
        answer
            .recv()
            .map_err(|_| AppError::system("Session is unavailable", trace_id))
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.send(SessionMsg::Log(level, message.into()));
    }

    pub fn clear_log(&self) {
        self.send(SessionMsg::ClearLog);
    }

    pub fn console_append(&self, text: impl Into<String>) {
        self.send(SessionMsg::ConsoleAppend(text.into()));
    }

    pub fn clear_console(&self) {
        self.send(SessionMsg::ClearConsole);
    }

    pub fn select_file(&self, file: Option<SelectedFile>) {
        self.send(SessionMsg::SelectFile(file));
    }

    pub fn autofill(&self, fill: EndpointAutofill) {
        self.send(SessionMsg::Autofill(fill));
    }

    pub fn notify(&self, notification: Notification) {
        self.send(SessionMsg::Notify(notification));
    }

    pub fn transition(
        &self,
        event: ConnectionEvent,
        trace_id: &str,
    ) -> Result<ConnectionState, AppError> {
        self.ask(|reply| SessionMsg::Transition(event, reply), trace_id)
    }

    pub fn connection(&self, trace_id: &str) -> Result<ConnectionState, AppError> {
        self.ask(SessionMsg::Connection, trace_id)
    }

    pub fn snapshot(&self, trace_id: &str) -> Result<SessionSnapshot, AppError> {
        self.ask(SessionMsg::Snapshot, trace_id)
    }
}

/// What a worker uses to talk to the user. Mirrors every line to `tracing`.
#[derive(Clone)]
pub struct Reporter {
    session: SessionHandle,
    trace_id: String,
}

impl Reporter {
    pub fn new(session: SessionHandle, trace_id: impl Into<String>) -> Self {
        Self {
            session,
            trace_id: trace_id.into(),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!(trace_id = %self.trace_id, "{message}");
        self.session.log(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(trace_id = %self.trace_id, "{message}");
        self.session.log(LogLevel::Success, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(trace_id = %self.trace_id, "{message}");
        self.session.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(trace_id = %self.trace_id, "{message}");
        self.session.log(LogLevel::Error, message);
    }

    pub fn notify(&self, kind: NotificationKind, title: &str, message: impl Into<String>) {
        self.notify_with_preview(kind, title, message, None);
    }

    pub fn notify_with_preview(
        &self,
        kind: NotificationKind,
        title: &str,
        message: impl Into<String>,
        preview_data_url: Option<String>,
    ) {
        self.session.notify(Notification {
            kind,
            title: title.to_string(),
            message: message.into(),
            trace_id: self.trace_id.clone(),
            preview_data_url,
        });
    }

    pub fn transition(&self, event: ConnectionEvent) -> Result<ConnectionState, AppError> {
        self.session.transition(event, &self.trace_id)
    }

    pub fn connection(&self) -> Result<ConnectionState, AppError> {
        self.session.connection(&self.trace_id)
    }
}
