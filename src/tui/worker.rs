//! Background request worker.
//!
//! Each backend request runs on its own thread so the TUI loop never blocks.
//! Responses come back over one channel and are applied on the UI thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::application::{execute, Request, Response};
use crate::ports::ClinicalBackend;

/// Runs requests off the UI thread and collects their responses.
pub struct RequestWorker {
    backend: Arc<dyn ClinicalBackend>,
    tx: Sender<Response>,
    rx: Receiver<Response>,
    in_flight: usize,
}

impl RequestWorker {
    #[must_use]
    pub fn new(backend: Arc<dyn ClinicalBackend>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Start `request` on a fresh thread.
    pub fn dispatch(&mut self, request: Request) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let response = execute(backend.as_ref(), request);
            // The receiver only disappears at shutdown.
            let _ = tx.send(response);
        });
    }

    /// Next finished response, if any (non-blocking).
    pub fn try_recv(&mut self) -> Option<Response> {
        let response = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(response)
    }

    /// Requests started but not yet collected.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::ScriptedBackend;
    use crate::application::{AppContext, BackendStatus, Screen};
    use crate::domain::{Identity, Role};
    use std::time::{Duration, Instant};

    fn wait_for(worker: &mut RequestWorker) -> Response {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(response) = worker.try_recv() {
                return response;
            }
            assert!(Instant::now() < deadline, "worker did not answer");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_responses_flow_back_to_context() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.push_login(Ok(Identity::new("admin", Role::Admin)));
        let mut worker = RequestWorker::new(backend.clone());
        let mut ctx = AppContext::new();

        ctx.start();
        ctx.login("admin", "123").expect("idle");
        for request in ctx.drain_requests() {
            worker.dispatch(request);
        }
        assert_eq!(worker.in_flight(), 2);

        for _ in 0..2 {
            let response = wait_for(&mut worker);
            ctx.apply(response);
        }
        assert_eq!(worker.in_flight(), 0);
        assert_eq!(ctx.backend_status(), BackendStatus::Online);
        assert_eq!(ctx.screen(), Screen::Upload);
        assert_eq!(backend.calls("login"), 1);
    }
}
