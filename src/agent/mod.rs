pub mod eligibility;
pub mod injector;
pub mod page;
pub mod session;
pub mod toast;
pub mod trigger;

pub use eligibility::{beatmapset_id, eligible_beatmapset};
pub use injector::{Injector, Reconcile};
pub use page::{HostPage, MirrorButton, StaticPage};
pub use session::{DownloadSession, SessionOutcome};
pub use toast::{Toast, ToastClaim, ToastSlot};
pub use trigger::PageAgent;
