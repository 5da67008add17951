use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

pub const INITIAL_TITLE: &str = "Initializing...";
pub const FAILED_TITLE: &str = "Download Failed";

/// State of the floating progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: String,
    pub title: String,
    /// Always within `[0, 100]`
    pub percent: f64,
    pub closing: bool,
}

impl Toast {
    pub fn percent_text(&self) -> String {
        format!("{}%", self.percent.floor() as u64)
    }
}

type Observer = Arc<dyn Fn(Option<&Toast>) + Send + Sync>;

/// Ownership of the toast by one download. Only the newest claim may
/// change or close it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastClaim(u64);

#[derive(Debug, Default)]
struct SlotState {
    toast: Option<Toast>,
    generation: u64,
}

/// The single toast element of a page. Clones share the same element.
#[derive(Clone, Default)]
pub struct ToastSlot {
    state: Arc<Mutex<SlotState>>,
    observer: Option<Observer>,
}

impl ToastSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `observer` after every change; `None` means the toast was removed.
    pub fn with_observer(observer: impl Fn(Option<&Toast>) + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::default(),
            observer: Some(Arc::new(observer)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, toast: Option<&Toast>) {
        if let Some(observer) = &self.observer {
            observer(toast);
        }
    }

    /// Creates the toast unless one is already showing and claims it for a
    /// new download. Earlier claims, and closes scheduled under them, stop
    /// applying.
    pub fn show(&self, id: &str) -> ToastClaim {
        let (claim, snapshot) = {
            let mut state = self.lock();
            state.generation += 1;
            let claim = ToastClaim(state.generation);
            let toast = state.toast.get_or_insert_with(|| Toast {
                id: id.to_string(),
                title: INITIAL_TITLE.to_string(),
                percent: 0.0,
                closing: false,
            });
            toast.closing = false;
            (claim, toast.clone())
        };
        self.notify(Some(&snapshot));
        claim
    }

    /// Sets the bar (clamped) and, when given, the title. Ignored unless
    /// `claim` is the newest one.
    pub fn update(&self, claim: ToastClaim, percent: f64, title: Option<&str>) {
        let snapshot = {
            let mut state = self.lock();
            if state.generation != claim.0 {
                return;
            }
            let Some(toast) = state.toast.as_mut() else {
                return;
            };
            toast.percent = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
            if let Some(title) = title.filter(|t| !t.is_empty()) {
                toast.title = title.to_string();
            }
            toast.clone()
        };
        self.notify(Some(&snapshot));
    }

    /// Removes the toast after `delay` unless another download claimed it
    /// before or meanwhile. The task resolves to whether it removed the toast.
    pub fn schedule_close(&self, claim: ToastClaim, delay: Duration) -> JoinHandle<bool> {
        {
            let mut state = self.lock();
            if state.generation == claim.0 {
                if let Some(toast) = state.toast.as_mut() {
                    toast.closing = true;
                }
            }
        }

        let slot = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let removed = {
                let mut state = slot.lock();
                if state.generation == claim.0 && state.toast.is_some() {
                    state.toast = None;
                    true
                } else {
                    false
                }
            };
            if removed {
                slot.notify(None);
            }
            removed
        })
    }

    pub fn snapshot(&self) -> Option<Toast> {
        self.lock().toast.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_update() {
        let slot = ToastSlot::new();
        slot.update(ToastClaim(0), 50.0, Some("ignored"));
        assert!(slot.snapshot().is_none());

        let claim = slot.show("osu-direct-toast");
        let toast = slot.snapshot().unwrap();
        assert_eq!(toast.title, INITIAL_TITLE);
        assert_eq!(toast.percent_text(), "0%");

        slot.update(claim, 37.9, Some("a.osz"));
        let toast = slot.snapshot().unwrap();
        assert_eq!(toast.title, "a.osz");
        assert_eq!(toast.percent_text(), "37%");

        slot.update(claim, 250.0, None);
        assert_eq!(slot.snapshot().unwrap().percent, 100.0);
        assert_eq!(slot.snapshot().unwrap().title, "a.osz");
        slot.update(claim, -3.0, Some(""));
        assert_eq!(slot.snapshot().unwrap().percent, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_after_delay() {
        let slot = ToastSlot::new();
        let claim = slot.show("t");
        let close = slot.schedule_close(claim, Duration::from_millis(2500));
        assert!(slot.snapshot().unwrap().closing);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(slot.snapshot().is_some());
        assert!(close.await.unwrap());
        assert!(slot.snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_download_cancels_pending_close() {
        let slot = ToastSlot::new();
        let first = slot.show("t");
        let close = slot.schedule_close(first, Duration::from_millis(4000));

        slot.show("t");
        assert!(!slot.snapshot().unwrap().closing);
        assert!(!close.await.unwrap());
        assert!(slot.snapshot().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_download_cannot_touch_newer_toast() {
        let slot = ToastSlot::new();
        let older = slot.show("t");
        let newer = slot.show("t");
        slot.update(newer, 40.0, Some("B.osz"));

        slot.update(older, 100.0, Some("A.osz"));
        let close = slot.schedule_close(older, Duration::from_millis(2500));
        let toast = slot.snapshot().unwrap();
        assert_eq!(toast.title, "B.osz");
        assert_eq!(toast.percent, 40.0);
        assert!(!toast.closing);

        assert!(!close.await.unwrap());
        slot.update(newer, 55.0, None);
        assert_eq!(slot.snapshot().unwrap().percent, 55.0);
    }

    #[tokio::test]
    async fn test_observer_sees_removal() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let slot = ToastSlot::with_observer(move |toast| {
            sink.lock().unwrap().push(toast.map(|t| t.percent_text()));
        });

        let claim = slot.show("t");
        slot.update(claim, 100.0, None);
        slot.schedule_close(claim, Duration::ZERO).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("0%".to_string()), Some("100%".to_string()), None]
        );
    }
}
