//! Drives a [`Dashboard`] against a real (or fake) [`Backend`].
//!
//! The dashboard itself stays single-threaded: every request runs on its
//! own worker thread, and completions come back over an mpsc channel to be
//! applied one at a time on the thread that owns the runtime. Nothing is
//! cancelled or coalesced; a request that never resolves leaves its store
//! loading.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::activity::logger::{ActivityEntry, log_activity};
use crate::api::Backend;
use crate::dashboard::effects::{Completion, Request};
use crate::dashboard::{Action, Dashboard};

pub struct Runtime<B: Backend + 'static> {
    backend: Arc<B>,
    dashboard: Dashboard,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: usize,
    log_activity: bool,
}

impl<B: Backend + 'static> Runtime<B> {
    pub fn new(backend: Arc<B>, dashboard: Dashboard) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            dashboard,
            tx,
            rx,
            in_flight: 0,
            log_activity: false,
        }
    }

    /// Append one activity log line per executed request.
    pub fn with_activity_log(mut self, enabled: bool) -> Self {
        self.log_activity = enabled;
        self
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Apply a user action and start whatever requests it produced.
    pub fn dispatch(&mut self, action: Action) {
        let requests = self.dashboard.dispatch(action);
        self.submit(requests);
    }

    /// Start each request on its own worker thread.
    pub fn submit(&mut self, requests: Vec<Request>) {
        for request in requests {
            self.dashboard.on_dispatched(&request);
            self.spawn(request);
        }
    }

    fn spawn(&mut self, request: Request) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let log = self.log_activity;
        self.in_flight += 1;

        thread::spawn(move || {
            let operation = request.operation();
            let target = request.target();
            let started = Instant::now();
            let completion = request.execute(backend.as_ref());
            if log {
                let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                let error = completion.error().map(|e| e.to_string());
                log_activity(&ActivityEntry::now(operation, &target, latency_ms, error));
            }
            // The receiver lives as long as the runtime; a send error only
            // means the runtime is gone.
            let _ = tx.send(completion);
        });
    }

    fn handle(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let follow_ups = self.dashboard.apply(completion);
        self.submit(follow_ups);
    }

    /// Apply every completion that has already arrived. Never blocks.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.handle(completion);
            applied += 1;
        }
        applied
    }

    /// Block until one completion arrives (or `timeout` elapses) and apply
    /// it. Returns `false` when nothing was applied.
    pub fn wait_next(&mut self, timeout: Option<Duration>) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        let completion = match timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(completion) => completion,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return false,
            },
            None => match self.rx.recv() {
                Ok(completion) => completion,
                Err(_) => return false,
            },
        };
        self.handle(completion);
        true
    }

    /// Apply completions, including follow-up requests they trigger, until
    /// nothing is in flight.
    pub fn wait_idle(&mut self) {
        while self.wait_next(None) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        AnalysisResult, ApiError, AutoTuneRequest, AutoTuneRun, EvalRun, EvalRunDetail,
        EvalRunRequest, QueryRequest, QueryResponse, SubmittedEvalRun,
    };
    use crate::dashboard::router::Tab;

    struct Offline;

    impl Backend for Offline {
        fn list_runs(&self, _: &str) -> Result<Vec<EvalRun>, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
        fn run_detail(&self, _: &str) -> Result<EvalRunDetail, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
        fn submit_eval_run(&self, _: &EvalRunRequest) -> Result<SubmittedEvalRun, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
        fn analyze(&self, _: &str) -> Result<AnalysisResult, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
        fn query(&self, _: &QueryRequest) -> Result<QueryResponse, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
        fn auto_tune(&self, _: &AutoTuneRequest) -> Result<AutoTuneRun, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
        fn auto_tune_history(&self, _: &str, _: &str) -> Result<Vec<AutoTuneRun>, ApiError> {
            Err(ApiError::Network("offline".to_string()))
        }
    }

    #[test]
    fn idle_runtime_does_not_block() {
        let mut runtime = Runtime::new(Arc::new(Offline), Dashboard::default());
        assert!(!runtime.wait_next(None));
        assert_eq!(runtime.poll(), 0);
        runtime.wait_idle();
    }

    #[test]
    fn network_failure_lands_in_scoped_error() {
        let mut runtime = Runtime::new(Arc::new(Offline), Dashboard::default());
        runtime.dispatch(Action::ActivateTab(Tab::EvalViewer));
        assert_eq!(runtime.in_flight(), 1);
        runtime.wait_idle();

        assert!(runtime.is_idle());
        let error = runtime.dashboard().browser().error().unwrap();
        assert!(error.contains("offline"), "{error}");
    }
}
