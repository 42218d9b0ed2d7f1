pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MONGO_MIN_POOL_SIZE: u32 = 5;
pub const MONGO_MAX_POOL_SIZE: u32 = 10;
pub const MONGO_CONN_TIMEOUT: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;

pub const DB_NAME: &str = "smartdiet";
pub const COLL_NOTIFICATIONS: &str = "fcm_notifications";
pub const COLL_USERS: &str = "users";

// dispatch watcher
pub const RESUBSCRIBE_DELAY_SECS: u64 = 5;
pub const DISPATCH_CALL_TIMEOUT_SECS: u64 = 30;
pub const RESCAN_PENDING_LIMIT: i64 = 500;
pub const SETTLED_IDS_CAPACITY: usize = 4096;

// reminder producers
pub const INACTIVITY_THRESHOLD_SECS: u64 = 3 * 24 * 60 * 60;
pub const INACTIVE_REMINDER_CRON: &str = "0 0 10 * * * *";
pub const HYDRATION_REMINDER_CRON: &str = "0 0 8,12,16,20 * * * *";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const TIPS_CATEGORY: &str = "Tips";
pub const NO_NOTIFICATIONS: &str = "None";
pub const TYPE_INACTIVE_REMINDER: &str = "inactive_reminder";
pub const TYPE_HYDRATION_REMINDER: &str = "hydration_reminder";

// firebase cloud messaging
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const FIREBASE_MESSAGE_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
pub const FCM_ENDPOINT_BASE: &str = "https://fcm.googleapis.com/v1/projects";
pub const FCM_CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
pub const FCM_DEFAULT_SOUND: &str = "default";
pub const ACCESS_TOKEN_LIFETIME_SECS: u64 = 3600;
pub const ACCESS_TOKEN_REFRESH_MARGIN_SECS: u64 = 15 * 60;
