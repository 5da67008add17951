use std::sync::Arc;

use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt};

use crate::{
    api::{MirrorClient, MirrorDownload},
    domain::{ChunkBuffer, DownloadRequest, Message, ProgressEvent, RelayError},
    utils::encode_data_uri,
};

use super::save::{SaveAction, SaveRequest};

/// Background side of a download: fetch, reassemble, encode, save.
///
/// Each request yields `progress*` followed by exactly one `complete` or
/// `failed`, after which its stream ends.
#[derive(Clone)]
pub struct FetchRelay {
    client: MirrorClient,
    saver: Arc<dyn SaveAction>,
}

impl FetchRelay {
    pub fn new(client: MirrorClient, saver: Arc<dyn SaveAction>) -> Self {
        Self { client, saver }
    }

    /// Event stream for one request, starting with the HTTP request.
    pub fn download_stream(&self, request: DownloadRequest) -> BoxStream<'static, Message> {
        Self::drive(RelayState::Start {
            relay: self.clone(),
            request,
        })
    }

    /// Event stream for an already opened response.
    pub fn relay_body(&self, download: MirrorDownload) -> BoxStream<'static, Message> {
        Self::drive(RelayState::Downloading {
            relay: self.clone(),
            stream: download.body,
            buffer: ChunkBuffer::new(),
            total: download.total,
            filename: download.filename,
        })
    }

    fn drive(initial: RelayState) -> BoxStream<'static, Message> {
        futures::stream::unfold(initial, |state| async move {
            match state {
                RelayState::Start { relay, request } => {
                    match relay.client.open_download(&request).await {
                        Ok(download) => {
                            log::debug!(
                                "Streaming {} ({} bytes announced)",
                                download.filename,
                                download.total
                            );
                            let next = RelayState::Downloading {
                                relay,
                                stream: download.body,
                                buffer: ChunkBuffer::new(),
                                total: download.total,
                                filename: download.filename,
                            };
                            Self::step(next).await
                        }
                        Err(e) => Some(fail(e)),
                    }
                }
                state @ RelayState::Downloading { .. } => Self::step(state).await,
                RelayState::Finished => None,
            }
        })
        .boxed()
    }

    /// Reads one chunk, or finishes the transfer when the body is exhausted.
    async fn step(state: RelayState) -> Option<(Message, RelayState)> {
        let RelayState::Downloading {
            relay,
            mut stream,
            mut buffer,
            total,
            filename,
        } = state
        else {
            return None;
        };

        match stream.next().await {
            Some(Ok(chunk)) => {
                let received = buffer.push(chunk);
                log::debug!("{}: {}/{} bytes", filename, received, total);

                let event = Message::Progress(ProgressEvent {
                    received,
                    total,
                    filename: filename.clone(),
                });
                Some((
                    event,
                    RelayState::Downloading {
                        relay,
                        stream,
                        buffer,
                        total,
                        filename,
                    },
                ))
            }
            Some(Err(e)) => Some(fail(e)),
            None => match relay.finish(buffer, filename).await {
                Ok(filename) => {
                    log::info!("Download of {} handed to the save action", filename);
                    Some((Message::Complete { filename }, RelayState::Finished))
                }
                Err(e) => Some(fail(e)),
            },
        }
    }

    /// Reassembles and encodes the body, then starts the save.
    async fn finish(&self, buffer: ChunkBuffer, filename: String) -> Result<String, RelayError> {
        let mime = self.client.config().archive_mime.clone();
        let chunks = buffer.chunk_count();

        let url = tokio::task::spawn_blocking(move || {
            let data = buffer.into_contiguous();
            encode_data_uri(&data, &mime)
        })
        .await
        .map_err(|e| RelayError::Encoding(e.to_string()))?;
        log::debug!("Encoded {} chunks into {} bytes of payload", chunks, url.len());

        self.saver
            .save(SaveRequest {
                url,
                filename: filename.clone(),
                save_as: false,
            })
            .await?;

        Ok(filename)
    }
}

fn fail(error: RelayError) -> (Message, RelayState) {
    log::error!("Download Error ({:?}): {}", error.kind(), error);
    (Message::Failed, RelayState::Finished)
}

enum RelayState {
    Start {
        relay: FetchRelay,
        request: DownloadRequest,
    },
    Downloading {
        relay: FetchRelay,
        stream: BoxStream<'static, Result<Bytes, RelayError>>,
        buffer: ChunkBuffer,
        total: u64,
        filename: String,
    },
    Finished,
}
