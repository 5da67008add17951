use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::time::MissedTickBehavior;

use crate::config::AgentConfig;

use super::eligibility::{beatmapset_id, eligible_beatmapset};
use super::page::{HostPage, MirrorButton};

/// Result of one reconciliation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Location is not a single beatmapset; nothing touched
    Ineligible,
    /// Already injected for this exact location
    Unchanged,
    Injected,
    /// Eligible, but the container is not rendered yet
    Pending,
}

/// Keeps exactly one mirror button on eligible pages across client-side
/// navigation.
#[derive(Debug, Clone)]
pub struct Injector {
    config: AgentConfig,
    current_url: Option<String>,
}

impl Injector {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            current_url: None,
        }
    }

    /// Location the button was last injected for.
    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    /// One polling tick. On a new eligible location the stale button is
    /// replaced; the location is only remembered once a button exists.
    pub fn reconcile<P: HostPage + ?Sized>(&mut self, page: &mut P) -> Reconcile {
        if eligible_beatmapset(&page.pathname(), &page.hash()).is_none() {
            return Reconcile::Ineligible;
        }

        let href = page.href();
        if self.current_url.as_deref() == Some(href.as_str()) {
            return Reconcile::Unchanged;
        }

        page.remove_element_id(&self.config.button_id);
        self.try_inject(page);

        if page.has_element_id(&self.config.button_id) {
            log::debug!("Mirror button injected for {}", href);
            self.current_url = Some(href);
            Reconcile::Injected
        } else {
            Reconcile::Pending
        }
    }

    /// Appends the button unless it is already present. Returns whether a
    /// button was added.
    pub fn try_inject<P: HostPage + ?Sized>(&self, page: &mut P) -> bool {
        let Some(id) = beatmapset_id(&page.pathname()) else {
            return false;
        };
        if !page.has_element(&self.config.container_selector)
            || page.has_element_id(&self.config.button_id)
        {
            return false;
        }

        page.append_button(
            &self.config.container_selector,
            MirrorButton {
                id: self.config.button_id.clone(),
                beatmapset_id: id,
                label: "Mirror".to_string(),
                sublabel: "osu.direct".to_string(),
            },
        )
    }

    /// Reconciles `page` every `poll_interval` until `shutdown` fires or
    /// its sender is dropped.
    pub async fn run_polling<P: HostPage>(
        mut self,
        page: Arc<Mutex<P>>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Self {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let mut page = page.lock().await;
                    self.reconcile(&mut *page);
                }
            }
        }
        self
    }
}
