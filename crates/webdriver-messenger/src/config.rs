//! WebDriver messenger configuration loaded from the environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// WEBDRIVER_URL (chromedriver endpoint)
    pub webdriver_url: String,
    /// WEB_APP_URL
    pub web_app_url: String,
    /// BROWSER_PROFILE_DIR; keeps the logged-in browser profile between runs.
    pub profile_dir: String,
    /// BROWSER_HEADLESS
    pub headless: bool,
    /// Wait for the app shell after navigation.
    pub load_timeout: Duration,
    /// Wait for the channel entry in the chat list.
    pub channel_timeout: Duration,
    /// Wait for the compose box.
    pub compose_timeout: Duration,
    /// Pause after opening a channel so its messages render.
    pub settle_delay: Duration,
    /// Interval between element lookups while waiting.
    pub poll_interval: Duration,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            web_app_url: "https://web.whatsapp.com".to_string(),
            profile_dir: "./whatsapp_data".to_string(),
            headless: false,
            load_timeout: Duration::from_secs(60),
            channel_timeout: Duration::from_secs(20),
            compose_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl WebDriverConfig {
    /// Load from environment variables; unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            webdriver_url: env::var("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            web_app_url: env::var("WEB_APP_URL").unwrap_or(defaults.web_app_url),
            profile_dir: env::var("BROWSER_PROFILE_DIR").unwrap_or(defaults.profile_dir),
            headless: env::var("BROWSER_HEADLESS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.headless),
            load_timeout: secs_from_env("WEB_APP_LOAD_TIMEOUT_SECS", defaults.load_timeout),
            channel_timeout: secs_from_env("CHANNEL_TIMEOUT_SECS", defaults.channel_timeout),
            compose_timeout: secs_from_env("COMPOSE_TIMEOUT_SECS", defaults.compose_timeout),
            ..defaults
        }
    }

    /// Chrome arguments for a new session.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--user-data-dir={}", self.profile_dir),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }
}

fn secs_from_env(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
