use crate::{
    application::{RelayHandle, TabId},
    config::AgentConfig,
    domain::{AppError, DownloadRequest},
    utils::fallback_filename,
};

use super::injector::Injector;
use super::page::HostPage;
use super::session::DownloadSession;
use super::toast::ToastSlot;

/// Page-side half of the extension, bound to one tab.
#[derive(Clone)]
pub struct PageAgent {
    config: AgentConfig,
    relay: RelayHandle,
    tab: TabId,
    toast: ToastSlot,
}

impl PageAgent {
    pub fn new(config: AgentConfig, relay: RelayHandle, tab: TabId, toast: ToastSlot) -> Self {
        Self {
            config,
            relay,
            tab,
            toast,
        }
    }

    /// Fresh injector for this page load.
    pub fn injector(&self) -> Injector {
        Injector::new(self.config.clone())
    }

    /// `<id> <artist> - <title>.osz` from the page header when both fields
    /// are there, `beatmapset-<id>.osz` otherwise.
    pub fn fallback_name<P: HostPage + ?Sized>(&self, page: &P, beatmapset_id: &str) -> String {
        let artist = page.text(&self.config.artist_selector);
        let title = page.text(&self.config.title_selector);
        fallback_filename(beatmapset_id, artist.as_deref(), title.as_deref())
    }

    /// Mirror button pressed: opens a session for the beatmapset.
    pub fn trigger<P: HostPage + ?Sized>(
        &self,
        page: &P,
        beatmapset_id: &str,
    ) -> Result<DownloadSession, AppError> {
        if beatmapset_id.is_empty() || !beatmapset_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::InvalidInput(beatmapset_id.to_string()));
        }

        let fallback_name = self.fallback_name(page, beatmapset_id);
        log::info!("Requesting beatmapset {} as {}", beatmapset_id, fallback_name);

        DownloadSession::start(
            &self.relay,
            self.tab,
            DownloadRequest::new(beatmapset_id, fallback_name),
            self.toast.clone(),
            self.config.clone(),
        )
    }
}
