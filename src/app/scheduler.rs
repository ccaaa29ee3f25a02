use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::app::error::AppError;
use crate::app::retry::CancelToken;

/// Lane shared by every action that talks to the local adb server.
pub const ADB_SERVER_LANE: &str = "adb-server";

pub struct GlobalSemaphore {
    limit: usize,
    used: Mutex<usize>,
    cv: Condvar,
}

impl GlobalSemaphore {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            used: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    fn lock_used(&self) -> MutexGuard<'_, usize> {
        self.used.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn acquire(self: &Arc<Self>) -> GlobalPermit {
        let mut used = self.lock_used();
        while *used >= self.limit {
            used = self
                .cv
                .wait(used)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *used += 1;
        GlobalPermit {
            semaphore: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut used = self.lock_used();
        *used = used.saturating_sub(1);
        self.cv.notify_one();
    }
}

pub struct GlobalPermit {
    semaphore: Arc<GlobalSemaphore>,
}

impl Drop for GlobalPermit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

pub struct TaskScheduler {
    global: Arc<GlobalSemaphore>,
    lanes: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TaskScheduler {
    pub fn new(global_limit: usize) -> Self {
        Self {
            global: Arc::new(GlobalSemaphore::new(global_limit)),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    pub fn acquire_global(&self) -> GlobalPermit {
        self.global.acquire()
    }

    pub fn lane(&self, name: &str) -> Arc<Mutex<()>> {
        let mut guard = self
            .lanes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CheckAdb,
    Pair,
    Connect,
    ConnectUsb,
    Disconnect,
    ForceClean,
    RestartServer,
    Status,
    Push,
    Pull,
    Install,
    DeviceInfo,
    ListApps,
    Screenshot,
    Scan,
    Console,
    KillLogcat,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::CheckAdb => "check_adb",
            ActionKind::Pair => "pair",
            ActionKind::Connect => "connect",
            ActionKind::ConnectUsb => "connect_usb",
            ActionKind::Disconnect => "disconnect",
            ActionKind::ForceClean => "force_clean",
            ActionKind::RestartServer => "restart_server",
            ActionKind::Status => "status",
            ActionKind::Push => "push",
            ActionKind::Pull => "pull",
            ActionKind::Install => "install",
            ActionKind::DeviceInfo => "device_info",
            ActionKind::ListApps => "list_apps",
            ActionKind::Screenshot => "screenshot",
            ActionKind::Scan => "scan",
            ActionKind::Console => "console",
            ActionKind::KillLogcat => "kill_logcat",
        }
    }

    /// The scan only opens TCP sockets and killing logcat readers must not
    /// queue behind the console command it is meant to stop.
    pub fn uses_adb_server(self) -> bool {
        !matches!(self, ActionKind::Scan | ActionKind::KillLogcat)
    }
}

struct ActionEntry {
    trace_id: String,
    token: CancelToken,
}

/// At most one in-flight action per kind.
#[derive(Default)]
pub struct ActionRegistry {
    running: Mutex<HashMap<ActionKind, ActionEntry>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActionKind, ActionEntry>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn begin(
        self: &Arc<Self>,
        kind: ActionKind,
        trace_id: &str,
    ) -> Result<ActionGuard, AppError> {
        let mut running = self.lock();
        if let Some(existing) = running.get(&kind) {
            return Err(AppError::busy(
                format!(
                    "{} is already running (trace {})",
                    kind.label(),
                    existing.trace_id
                ),
                trace_id,
            ));
        }
        let token = CancelToken::new();
        running.insert(
            kind,
            ActionEntry {
                trace_id: trace_id.to_string(),
                token: token.clone(),
            },
        );
        Ok(ActionGuard {
            registry: Arc::clone(self),
            kind,
            token,
        })
    }

    /// Returns false when nothing of that kind is running.
    pub fn cancel(&self, kind: ActionKind) -> bool {
        match self.lock().get(&kind) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, kind: ActionKind) -> bool {
        self.lock().contains_key(&kind)
    }

    fn finish(&self, kind: ActionKind) {
        self.lock().remove(&kind);
    }
}

/// Removes the registry entry when the worker ends.
pub struct ActionGuard {
    registry: Arc<ActionRegistry>,
    kind: ActionKind,
    token: CancelToken,
}

impl ActionGuard {
    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.registry.finish(self.kind);
    }
}
