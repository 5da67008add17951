pub mod fetch_relay;
pub mod relay_hub;
pub mod save;

pub use fetch_relay::FetchRelay;
pub use relay_hub::{Envelope, RelayHandle, RelayHub, TabId};
pub use save::{DiskSaver, SaveAction, SaveReceipt, SaveRequest};
