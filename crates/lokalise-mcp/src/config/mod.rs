mod settings;

pub use settings::{DEFAULT_BASE_URL, DEFAULT_HTTP_PORT, DEFAULT_TIMEOUT, Settings};
