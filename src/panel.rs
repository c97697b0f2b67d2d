//! View state for the support panel
//!
//! Owns the one-operation-at-a-time state machine and the dialog flags;
//! knows nothing about how any of it is drawn.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Local};

use crate::bridge::{BridgeError, SupportBridge};

/// Prefix the support team expects in front of the raw token.
pub const DEBUG_CODE_PREFIX: &str = "dbg:";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperationKind {
    Diagnostics,
    Fixes,
}

/// At most one operation runs at a time, by construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperationState {
    Idle,
    Running(OperationKind),
}

/// Completion of a background run, delivered back to the UI thread.
struct Outcome {
    kind: OperationKind,
    result: Result<String, BridgeError>,
}

pub struct SupportPanel {
    bridge: Arc<dyn SupportBridge>,
    state: OperationState,
    debug_code: Option<String>,
    error: Option<String>,
    result_open: bool,
    confirm_open: bool,
    last_completed: Option<DateTime<Local>>,
    outcome_tx: Sender<Outcome>,
    outcome_rx: Receiver<Outcome>,
}

impl SupportPanel {
    pub fn new(bridge: Arc<dyn SupportBridge>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        Self {
            bridge,
            state: OperationState::Idle,
            debug_code: None,
            error: None,
            result_open: false,
            confirm_open: false,
            last_completed: None,
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state != OperationState::Idle
    }

    pub fn debug_code(&self) -> Option<&str> {
        self.debug_code.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result_open(&self) -> bool {
        self.result_open
    }

    pub fn confirm_open(&self) -> bool {
        self.confirm_open
    }

    pub fn last_completed(&self) -> Option<DateTime<Local>> {
        self.last_completed
    }

    /// Start a diagnostics run. No-op unless idle.
    pub fn start_diagnostics(&mut self, repaint: impl Fn() + Send + 'static) {
        if self.is_busy() {
            return;
        }
        self.spawn(OperationKind::Diagnostics, repaint);
    }

    /// Ask for the destructive-action prompt. Never touches the backend.
    pub fn request_fixes(&mut self) {
        if self.is_busy() {
            return;
        }
        self.confirm_open = true;
    }

    /// Close the prompt without running anything.
    pub fn cancel_fixes(&mut self) {
        self.confirm_open = false;
    }

    /// The user confirmed; run the fixes. No-op unless the prompt is open.
    pub fn confirm_fixes(&mut self, repaint: impl Fn() + Send + 'static) {
        if !self.confirm_open || self.is_busy() {
            return;
        }
        self.confirm_open = false;
        self.spawn(OperationKind::Fixes, repaint);
    }

    pub fn dismiss_result(&mut self) {
        self.result_open = false;
    }

    /// Apply any completions the worker thread has delivered. Call once per
    /// frame, before reading state.
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.finish(outcome);
        }
    }

    fn spawn(&mut self, kind: OperationKind, repaint: impl Fn() + Send + 'static) {
        // Busy state flips before the call so the wait dialog shows on the
        // very next frame. A stale error from the previous run clears here.
        self.error = None;
        self.state = OperationState::Running(kind);

        match kind {
            OperationKind::Diagnostics => tracing::info!("starting diagnostics run"),
            OperationKind::Fixes => tracing::info!("applying common fixes"),
        }

        let bridge = Arc::clone(&self.bridge);
        let tx = self.outcome_tx.clone();
        thread::spawn(move || {
            let result = match kind {
                OperationKind::Diagnostics => bridge.run_diagnostics(),
                OperationKind::Fixes => bridge.run_fixes(),
            };
            // The receiver only goes away when the panel does.
            let _ = tx.send(Outcome { kind, result });
            repaint();
        });
    }

    fn finish(&mut self, outcome: Outcome) {
        self.state = OperationState::Idle;
        self.last_completed = Some(Local::now());

        match (outcome.kind, outcome.result) {
            (OperationKind::Diagnostics, Ok(token)) => {
                tracing::info!(%token, "debug report generated");
                self.debug_code = Some(format!("{DEBUG_CODE_PREFIX}{token}"));
                self.result_open = true;
            }
            (OperationKind::Fixes, Ok(summary)) => {
                // The fixes outcome stays silent in the UI; absence of an
                // error is the signal. The summary only goes to the log.
                tracing::info!(%summary, "common fixes completed");
            }
            (kind, Err(err)) => {
                tracing::error!(?kind, error = %err, "operation failed");
                self.error = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::SyncSender;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted backend: fixed replies, call counters.
    struct FakeBridge {
        diagnostics: Result<String, String>,
        fixes: Result<String, String>,
        diagnostics_calls: AtomicUsize,
        fixes_calls: AtomicUsize,
    }

    impl FakeBridge {
        fn new(diagnostics: Result<&str, &str>, fixes: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                diagnostics: diagnostics.map(str::to_owned).map_err(str::to_owned),
                fixes: fixes.map(str::to_owned).map_err(str::to_owned),
                diagnostics_calls: AtomicUsize::new(0),
                fixes_calls: AtomicUsize::new(0),
            })
        }
    }

    impl SupportBridge for FakeBridge {
        fn run_diagnostics(&self) -> Result<String, BridgeError> {
            self.diagnostics_calls.fetch_add(1, Ordering::SeqCst);
            self.diagnostics.clone().map_err(BridgeError::Backend)
        }

        fn run_fixes(&self) -> Result<String, BridgeError> {
            self.fixes_calls.fetch_add(1, Ordering::SeqCst);
            self.fixes.clone().map_err(BridgeError::Backend)
        }
    }

    /// Backend that blocks until the test releases it, for observing the
    /// panel mid-operation.
    struct GatedBridge {
        gate: Mutex<Receiver<()>>,
    }

    impl GatedBridge {
        fn new() -> (Arc<Self>, SyncSender<()>) {
            let (release, gate) = mpsc::sync_channel(1);
            (
                Arc::new(Self {
                    gate: Mutex::new(gate),
                }),
                release,
            )
        }
    }

    impl SupportBridge for GatedBridge {
        fn run_diagnostics(&self) -> Result<String, BridgeError> {
            self.gate.lock().unwrap().recv().unwrap();
            Ok("GATED".into())
        }

        fn run_fixes(&self) -> Result<String, BridgeError> {
            self.run_diagnostics()
        }
    }

    /// Poll until the in-flight operation settles.
    fn settle(panel: &mut SupportPanel) {
        for _ in 0..400 {
            panel.poll();
            if !panel.is_busy() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("operation never settled");
    }

    #[test]
    fn diagnostics_success_formats_code_and_opens_result() {
        let bridge = FakeBridge::new(Ok("ABC123"), Ok(""));
        let mut panel = SupportPanel::new(bridge);

        panel.start_diagnostics(|| {});
        assert_eq!(panel.state(), OperationState::Running(OperationKind::Diagnostics));

        settle(&mut panel);
        assert_eq!(panel.state(), OperationState::Idle);
        assert_eq!(panel.debug_code(), Some("dbg:ABC123"));
        assert!(panel.result_open());
        assert!(panel.error().is_none());
        assert!(panel.last_completed().is_some());
    }

    #[test]
    fn diagnostics_failure_shows_error_and_no_result_dialog() {
        let bridge = FakeBridge::new(Err("failed to get app logs"), Ok(""));
        let mut panel = SupportPanel::new(bridge);

        panel.start_diagnostics(|| {});
        settle(&mut panel);

        assert_eq!(panel.error(), Some("failed to get app logs"));
        assert!(!panel.result_open());
        assert!(panel.debug_code().is_none());
    }

    #[test]
    fn busy_panel_refuses_a_second_operation() {
        let (bridge, release) = GatedBridge::new();
        let mut panel = SupportPanel::new(bridge);

        panel.start_diagnostics(|| {});
        assert!(panel.is_busy());

        // Neither a second start nor the fixes prompt gets through.
        panel.start_diagnostics(|| {});
        panel.request_fixes();
        assert!(!panel.confirm_open());
        panel.confirm_fixes(|| {});
        assert_eq!(panel.state(), OperationState::Running(OperationKind::Diagnostics));

        release.send(()).unwrap();
        settle(&mut panel);
        assert_eq!(panel.state(), OperationState::Idle);
    }

    #[test]
    fn running_fixes_refuses_a_diagnostics_start() {
        let (bridge, release) = GatedBridge::new();
        let mut panel = SupportPanel::new(bridge);

        panel.request_fixes();
        panel.confirm_fixes(|| {});
        assert_eq!(panel.state(), OperationState::Running(OperationKind::Fixes));

        panel.start_diagnostics(|| {});
        assert_eq!(panel.state(), OperationState::Running(OperationKind::Fixes));

        release.send(()).unwrap();
        settle(&mut panel);
        assert_eq!(panel.state(), OperationState::Idle);
        // The gated run reports through the fixes path, which stays silent.
        assert!(!panel.result_open());
        assert!(panel.debug_code().is_none());
    }

    #[test]
    fn requesting_fixes_only_opens_the_prompt() {
        let bridge = FakeBridge::new(Ok(""), Ok(""));
        let mut panel = SupportPanel::new(Arc::clone(&bridge) as Arc<dyn SupportBridge>);

        panel.request_fixes();
        assert!(panel.confirm_open());
        assert_eq!(panel.state(), OperationState::Idle);
        assert_eq!(bridge.fixes_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancelling_the_prompt_runs_nothing() {
        let bridge = FakeBridge::new(Ok(""), Ok(""));
        let mut panel = SupportPanel::new(Arc::clone(&bridge) as Arc<dyn SupportBridge>);

        panel.request_fixes();
        panel.cancel_fixes();
        assert!(!panel.confirm_open());
        assert_eq!(panel.state(), OperationState::Idle);

        // A confirm without an open prompt is also a no-op.
        panel.confirm_fixes(|| {});
        assert_eq!(panel.state(), OperationState::Idle);
        assert_eq!(bridge.fixes_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn confirming_runs_fixes_exactly_once_and_stays_silent() {
        let bridge = FakeBridge::new(Ok(""), Ok("removed bin, reinstalled runtime"));
        let mut panel = SupportPanel::new(Arc::clone(&bridge) as Arc<dyn SupportBridge>);

        panel.request_fixes();
        panel.confirm_fixes(|| {});
        assert!(!panel.confirm_open());
        assert_eq!(panel.state(), OperationState::Running(OperationKind::Fixes));

        settle(&mut panel);
        assert_eq!(bridge.fixes_calls.load(Ordering::SeqCst), 1);
        assert!(!panel.result_open());
        assert!(panel.error().is_none());
    }

    #[test]
    fn fixes_failure_lands_in_the_error_slot() {
        let bridge = FakeBridge::new(Ok(""), Err("FTB App not found"));
        let mut panel = SupportPanel::new(bridge);

        panel.request_fixes();
        panel.confirm_fixes(|| {});
        settle(&mut panel);

        assert_eq!(panel.error(), Some("FTB App not found"));
        assert_eq!(panel.state(), OperationState::Idle);
    }

    #[test]
    fn dismissing_the_result_keeps_code_and_error() {
        let bridge = FakeBridge::new(Ok("ABC123"), Ok(""));
        let mut panel = SupportPanel::new(bridge);

        panel.start_diagnostics(|| {});
        settle(&mut panel);
        assert!(panel.result_open());

        panel.dismiss_result();
        assert!(!panel.result_open());
        assert_eq!(panel.debug_code(), Some("dbg:ABC123"));
        assert!(panel.error().is_none());
    }

    #[test]
    fn starting_a_run_clears_the_previous_error() {
        let bridge = FakeBridge::new(Err("no internet"), Ok(""));
        let mut panel = SupportPanel::new(bridge);

        panel.start_diagnostics(|| {});
        settle(&mut panel);
        assert_eq!(panel.error(), Some("no internet"));

        panel.start_diagnostics(|| {});
        assert!(panel.error().is_none());
        settle(&mut panel);
    }

    #[test]
    fn worker_signals_the_repaint_hook() {
        let bridge = FakeBridge::new(Ok("X"), Ok(""));
        let mut panel = SupportPanel::new(bridge);
        let (tx, rx) = mpsc::channel();

        panel.start_diagnostics(move || {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        settle(&mut panel);
    }
}
