pub mod dates;
pub mod dispatch;
pub mod intent;
pub mod session;
pub mod settings;
pub mod transcript;
