use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::{AppError, DownloadRequest, Message};

use super::fetch_relay::FetchRelay;

/// Identifies the page (tab) a request came from and replies go back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u32);

/// A message travelling from a page to the relay, with its reply channel.
#[derive(Debug)]
pub struct Envelope {
    pub tab: TabId,
    pub message: Message,
    pub reply: mpsc::UnboundedSender<Message>,
}

/// Sender half handed to page agents.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl RelayHandle {
    /// A handle plus the receiving end a relay loop reads from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Sends a download request and returns the listener for its replies.
    ///
    /// Each call gets its own channel, so concurrent requests never share
    /// state.
    pub fn request(
        &self,
        tab: TabId,
        request: DownloadRequest,
    ) -> Result<mpsc::UnboundedReceiver<Message>, AppError> {
        let (reply, events) = mpsc::unbounded_channel();
        self.tx
            .send(Envelope {
                tab,
                message: Message::Download(request),
                reply,
            })
            .map_err(|_| AppError::RelayClosed)?;
        Ok(events)
    }
}

/// Routes page messages to the fetch relay, one task per download.
pub struct RelayHub {
    relay: FetchRelay,
}

impl RelayHub {
    pub fn new(relay: FetchRelay) -> Self {
        Self { relay }
    }

    /// Starts the routing loop. It stops once every handle is dropped.
    pub fn spawn(self) -> (RelayHandle, JoinHandle<()>) {
        let (handle, rx) = RelayHandle::channel();
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<Envelope>) {
        while let Some(envelope) = rx.recv().await {
            let Envelope {
                tab,
                message,
                reply,
            } = envelope;

            let request = match message {
                Message::Download(request) => request,
                other => {
                    log::debug!("Ignoring {:?} from tab {:?}", other, tab);
                    continue;
                }
            };

            log::info!("Tab {:?} requested beatmapset {}", tab, request.id);
            tokio::spawn(forward(self.relay.download_stream(request), tab, reply));
        }
        log::debug!("Relay hub stopped");
    }
}

/// Pushes every relay event to the tab. A tab that stopped listening does
/// not stop the download.
async fn forward(
    mut events: futures::stream::BoxStream<'static, Message>,
    tab: TabId,
    reply: mpsc::UnboundedSender<Message>,
) {
    let mut listening = true;
    while let Some(event) = events.next().await {
        if listening && reply.send(event).is_err() {
            log::debug!("Tab {:?} no longer listening", tab);
            listening = false;
        }
    }
}
