use tokio::sync::mpsc;

use crate::{
    application::{RelayHandle, TabId},
    config::AgentConfig,
    domain::{AppError, DownloadPhase, DownloadRequest, Message},
};

use super::toast::{ToastClaim, ToastSlot, FAILED_TITLE};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub phase: DownloadPhase,
    /// Final filename reported by the relay, on success
    pub filename: Option<String>,
    pub progress_events: usize,
}

/// One in-flight download as seen from the page: the request, its private
/// listener, and the toast it drives.
///
/// The listener is dropped as soon as a terminal event arrives, so later
/// relay traffic for this request goes nowhere.
pub struct DownloadSession {
    request: DownloadRequest,
    events: mpsc::UnboundedReceiver<Message>,
    toast: ToastSlot,
    claim: ToastClaim,
    config: AgentConfig,
}

impl DownloadSession {
    /// Shows the toast with the fallback name and sends the request. A newer
    /// session takes the toast over; this one then stops touching it.
    pub fn start(
        relay: &RelayHandle,
        tab: TabId,
        request: DownloadRequest,
        toast: ToastSlot,
        config: AgentConfig,
    ) -> Result<Self, AppError> {
        let claim = toast.show(&config.toast_id);
        toast.update(claim, 0.0, Some(request.fallback_name.as_str()));

        let events = match relay.request(tab, request.clone()) {
            Ok(events) => events,
            Err(e) => {
                toast.update(claim, 0.0, Some(FAILED_TITLE));
                toast.schedule_close(claim, config.failed_close_delay);
                return Err(e);
            }
        };

        Ok(Self {
            request,
            events,
            toast,
            claim,
            config,
        })
    }

    pub fn request(&self) -> &DownloadRequest {
        &self.request
    }

    /// Applies relay messages to the toast until the terminal one.
    pub async fn run(mut self) -> SessionOutcome {
        let mut progress_events = 0;

        while let Some(message) = self.events.recv().await {
            match message {
                Message::Progress(progress) => {
                    progress_events += 1;
                    self.toast.update(
                        self.claim,
                        progress.percent(),
                        Some(progress.filename.as_str()),
                    );
                }
                Message::Complete { filename } => {
                    self.toast.update(self.claim, 100.0, Some(filename.as_str()));
                    self.toast
                        .schedule_close(self.claim, self.config.complete_close_delay);
                    return SessionOutcome {
                        phase: DownloadPhase::Completed,
                        filename: Some(filename),
                        progress_events,
                    };
                }
                Message::Failed => return self.fail(progress_events),
                Message::Download(request) => {
                    log::warn!("Unexpected download request {} on a reply channel", request.id);
                }
            }
        }

        log::warn!(
            "Relay dropped beatmapset {} without a final result",
            self.request.id
        );
        self.fail(progress_events)
    }

    fn fail(&self, progress_events: usize) -> SessionOutcome {
        self.toast.update(self.claim, 0.0, Some(FAILED_TITLE));
        self.toast
            .schedule_close(self.claim, self.config.failed_close_delay);
        SessionOutcome {
            phase: DownloadPhase::Failed,
            filename: None,
            progress_events,
        }
    }
}
