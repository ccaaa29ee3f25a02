use std::sync::Arc;

use crate::app::adb::locator::resolve_adb_program;
use crate::app::adb::runner::{Adb, CommandRunner, SystemRunner};
use crate::app::config::AppConfig;
use crate::app::context::ActionContext;
use crate::app::retry::{Backoff, CancelToken};
use crate::app::scheduler::{ActionRegistry, TaskScheduler};
use crate::app::session::{EventSink, Reporter, SessionHandle};

pub struct AppState {
    pub config: AppConfig,
    pub adb_program: String,
    pub runner: Arc<dyn CommandRunner>,
    pub scheduler: Arc<TaskScheduler>,
    pub actions: Arc<ActionRegistry>,
    pub session: SessionHandle,
}

impl AppState {
    pub fn new(config: AppConfig, sink: EventSink) -> Self {
        let adb_program = resolve_adb_program(&config.adb.command_path);
        Self::with_runner(config, adb_program, Arc::new(SystemRunner), sink)
    }

    pub fn with_runner(
        config: AppConfig,
        adb_program: String,
        runner: Arc<dyn CommandRunner>,
        sink: EventSink,
    ) -> Self {
        Self {
            scheduler: Arc::new(TaskScheduler::new(config.scheduler.global_limit)),
            actions: Arc::new(ActionRegistry::new()),
            session: SessionHandle::spawn(sink),
            adb_program,
            runner,
            config,
        }
    }

    pub fn reporter(&self, trace_id: &str) -> Reporter {
        Reporter::new(self.session.clone(), trace_id)
    }

    pub fn action_context(&self, trace_id: &str, token: CancelToken) -> ActionContext {
        ActionContext {
            adb: Adb::new(&self.adb_program, Arc::clone(&self.runner), trace_id),
            timeouts: self.config.timeouts.clone(),
            backoff: Backoff::from_settings(&self.config.retry),
            token,
            reporter: self.reporter(trace_id),
        }
    }
}
