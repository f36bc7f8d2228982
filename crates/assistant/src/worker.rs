//! Run a dispatched send off the UI thread.
//!
//! Each send gets a thread with its own tokio runtime; the answer comes back
//! over a std channel that the UI polls once per frame.

use providers::adapter::ERROR_PREFIX;
use providers::ResponseAdapter;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use tracing::error;

use crate::controller::Dispatch;

/// Shown when the worker went away without answering.
pub const REQUEST_FAILED_MESSAGE: &str =
    "I encountered an error processing your request. Please try again.";

/// Receiving end of one background send.
pub struct PendingReply {
    rx: Receiver<String>,
}

impl PendingReply {
    fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }

    /// `None` while the answer is still on its way.
    pub fn try_take(&self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(text) => Some(text),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                error!("generation worker exited without a reply");
                Some(REQUEST_FAILED_MESSAGE.to_string())
            }
        }
    }
}

pub fn spawn_generation(dispatch: Dispatch, adapter: Arc<ResponseAdapter>) -> PendingReply {
    let (tx, rx) = channel();
    std::thread::spawn(move || run_generation(dispatch, adapter, tx));
    PendingReply::new(rx)
}

fn run_generation(dispatch: Dispatch, adapter: Arc<ResponseAdapter>, tx: Sender<String>) {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            let _ = tx.send(format!(
                "{} failed to start async runtime: {}",
                ERROR_PREFIX, e
            ));
            return;
        }
    };

    let reply = rt.block_on(dispatch.execute(&adapter));
    let _ = tx.send(reply);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::{controller_with, ScriptedService};
    use shared::chat::Role;
    use shared::errors::ServiceError;
    use shared::settings::ModelProvider;
    use std::time::{Duration, Instant};

    fn wait_for_turn(controller: &mut crate::AssistantController) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if controller.poll().is_some() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_background_round_trip() {
        let service = ScriptedService::new(vec![Ok(Some("12 units available.".into()))]);
        let mut controller = controller_with(service);

        controller.dispatch_in_background("Check stock").unwrap();
        assert!(controller.is_pending());
        assert_eq!(controller.turns().len(), 2);

        assert!(wait_for_turn(&mut controller));
        assert!(!controller.is_pending());
        let last = controller.turns().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, "12 units available.");
    }

    #[test]
    fn test_background_failure_resolves() {
        let service = ScriptedService::new(vec![Err(ServiceError::Status {
            status: 500,
            body: "internal".into(),
        })]);
        let mut controller = controller_with(service);

        controller.dispatch_in_background("Check stock").unwrap();
        assert!(wait_for_turn(&mut controller));
        let last = controller.turns().last().unwrap();
        assert!(last.text.starts_with("Error generating response:"));
        assert!(!controller.is_pending());
    }

    #[test]
    fn test_in_flight_send_keeps_its_adapter() {
        let first = ScriptedService::new(vec![Ok(Some("from first".into()))]);
        let second = ScriptedService::new(vec![Ok(Some("from second".into()))]);
        let mut controller = controller_with(first.clone());

        controller.dispatch_in_background("Check stock").unwrap();
        let settings = ModelProvider {
            max_retries: 0,
            ..ModelProvider::default()
        };
        controller.replace_adapter(Arc::new(ResponseAdapter::new(second.clone(), &settings)));

        assert!(wait_for_turn(&mut controller));
        assert_eq!(controller.turns().last().unwrap().text, "from first");
        assert_eq!(first.requests.lock().unwrap().len(), 1);
        assert!(second.requests.lock().unwrap().is_empty());

        controller.dispatch_in_background("Check again").unwrap();
        assert!(wait_for_turn(&mut controller));
        assert_eq!(controller.turns().last().unwrap().text, "from second");
        assert_eq!(second.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_poll_when_idle_returns_nothing() {
        let service = ScriptedService::new(vec![]);
        let mut controller = controller_with(service);
        assert!(controller.poll().is_none());
        assert_eq!(controller.turns().len(), 1);
    }

    #[test]
    fn test_dropped_worker_yields_failure_message() {
        let (tx, rx) = channel::<String>();
        let reply = PendingReply::new(rx);
        assert_eq!(reply.try_take(), None);
        drop(tx);
        assert_eq!(reply.try_take().as_deref(), Some(REQUEST_FAILED_MESSAGE));
    }
}
