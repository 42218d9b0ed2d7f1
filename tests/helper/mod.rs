pub mod helper;
pub mod user;

pub use helper::build_get_request;
pub use helper::fast_settings;
pub use helper::wait_until;
pub use helper::FakeGateway;

pub use user::pending_notification;
pub use user::user_with;
