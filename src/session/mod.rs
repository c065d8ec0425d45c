//! Session and authorization core.

pub mod authority;
pub mod error;
pub mod role;
pub mod sink;
pub mod store;
pub mod user;

pub use self::authority::{SessionAuthority, DEFAULT_AVATAR};
pub use self::error::AuthError;
pub use self::role::Role;
pub use self::sink::{LogNotifier, Navigator, NoopNavigator, Notifier, Severity};
pub use self::store::{FileStore, MemoryStore, SessionKey, SessionStore, StoreError};
pub use self::user::User;
