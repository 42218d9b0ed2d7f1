pub mod dispatch_job;
pub mod google_auth_token;
pub mod push_message;

pub use dispatch_job::{DispatchSettings, DispatchWatcher, Dispatcher};
pub use push_message::{DeliveryError, FcmGateway, PushGateway, PushMessage};
