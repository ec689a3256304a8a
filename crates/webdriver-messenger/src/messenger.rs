//! Web messaging app driven through WebDriver, implementing [`Messenger`].
//!
//! Selectors target the WhatsApp Web DOM. Every step reports failure through
//! [`StepOutcome`] or an empty result; only session creation is a hard error.

use async_trait::async_trait;
use harvest_core::{HarvestError, Messenger, SessionHandle, StepOutcome};
use tracing::{debug, info, warn};

use crate::client::{keys, Locator, WebDriverClient};
use crate::config::WebDriverConfig;

/// Rendered entries at or below this many characters are UI noise (timestamps, reactions).
pub const MIN_MESSAGE_CHARS: usize = 10;

const CHAT_LIST_CSS: &str = "[data-testid='chat-list']";
const MESSAGE_XPATH: &str = "//div[contains(@class, 'copyable-text')]";
const COMPOSE_XPATH: &str = "//footer//div[@contenteditable='true']";

pub struct WebMessenger {
    client: WebDriverClient,
    config: WebDriverConfig,
}

impl WebMessenger {
    pub fn new(config: WebDriverConfig) -> crate::Result<Self> {
        let client = WebDriverClient::new(&config.webdriver_url)?;
        Ok(Self { client, config })
    }

    fn channel_locator(channel: &str) -> Locator {
        Locator::XPath(format!(
            "//span[contains(text(), {})]",
            xpath_literal(channel)
        ))
    }
}

/// Quotes `value` as an XPath string literal, using `concat()` when it holds both quote kinds.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[async_trait]
impl Messenger for WebMessenger {
    async fn open_session(&self) -> harvest_core::Result<SessionHandle> {
        let session_id = self
            .client
            .new_session(&self.config.chrome_args())
            .await
            .map_err(|e| HarvestError::Session(format!("Could not start browser: {}", e)))?;
        let handle = SessionHandle::new(session_id);
        info!(session = %handle, "Browser session started");

        if let Err(e) = self.client.set_window_size(&handle.id, 1200, 800).await {
            debug!(error = %e, "Could not resize browser window");
        }

        if let Err(e) = self.client.navigate(&handle.id, &self.config.web_app_url).await {
            self.close_session(handle).await;
            return Err(HarvestError::Session(format!(
                "Could not open {}: {}",
                self.config.web_app_url, e
            )));
        }

        let chat_list = self
            .client
            .wait_for_element(
                &handle.id,
                &Locator::Css(CHAT_LIST_CSS.to_string()),
                self.config.load_timeout,
                self.config.poll_interval,
            )
            .await;
        match chat_list {
            Ok(Some(_)) => debug!(session = %handle, "Web app loaded"),
            Ok(None) => warn!(session = %handle, "Web app did not show the chat list in time"),
            Err(e) => warn!(session = %handle, error = %e, "Could not check whether the web app loaded"),
        }

        Ok(handle)
    }

    async fn navigate_to_channel(&self, session: &SessionHandle, channel: &str) -> StepOutcome {
        let found = self
            .client
            .wait_for_element(
                &session.id,
                &Self::channel_locator(channel),
                self.config.channel_timeout,
                self.config.poll_interval,
            )
            .await;

        let element = match found {
            Ok(Some(element)) => element,
            Ok(None) => {
                warn!(channel = %channel, "Channel not found");
                return StepOutcome::failed(format!(
                    "channel '{}' not found within {}s",
                    channel,
                    self.config.channel_timeout.as_secs()
                ));
            }
            Err(e) => return StepOutcome::failed(format!("lookup of '{}' failed: {}", channel, e)),
        };

        if let Err(e) = self.client.click(&session.id, &element).await {
            return StepOutcome::failed(format!("could not open '{}': {}", channel, e));
        }

        tokio::time::sleep(self.config.settle_delay).await;
        info!(channel = %channel, "Channel opened");
        StepOutcome::Done
    }

    async fn fetch_visible_messages(&self, session: &SessionHandle) -> Vec<String> {
        let elements = match self
            .client
            .find_elements(&session.id, &Locator::XPath(MESSAGE_XPATH.to_string()))
            .await
        {
            Ok(elements) => elements,
            Err(e) => {
                warn!(error = %e, "Could not list messages");
                return Vec::new();
            }
        };

        let mut messages = Vec::with_capacity(elements.len());
        for element in &elements {
            match self.client.element_text(&session.id, element).await {
                Ok(text) => {
                    let text = text.trim();
                    if text.chars().count() > MIN_MESSAGE_CHARS {
                        messages.push(text.to_string());
                    }
                }
                Err(e) => debug!(element = %element, error = %e, "Skipping unreadable message"),
            }
        }

        info!(rendered = elements.len(), kept = messages.len(), "Fetched visible messages");
        messages
    }

    async fn send_message(&self, session: &SessionHandle, text: &str) -> StepOutcome {
        let compose = self
            .client
            .wait_for_element(
                &session.id,
                &Locator::XPath(COMPOSE_XPATH.to_string()),
                self.config.compose_timeout,
                self.config.poll_interval,
            )
            .await;

        let element = match compose {
            Ok(Some(element)) => element,
            Ok(None) => return StepOutcome::failed("compose box not found"),
            Err(e) => return StepOutcome::failed(format!("compose box lookup failed: {}", e)),
        };

        if let Err(e) = self.client.click(&session.id, &element).await {
            return StepOutcome::failed(format!("could not focus compose box: {}", e));
        }

        // Shift+Enter keeps multi-line text in one message.
        for line in text.lines() {
            let keystrokes = format!("{}{}{}{}", line, keys::SHIFT, keys::ENTER, keys::NULL);
            if let Err(e) = self.client.send_keys(&session.id, &element, &keystrokes).await {
                return StepOutcome::failed(format!("typing failed: {}", e));
            }
        }

        match self
            .client
            .send_keys(&session.id, &element, &keys::ENTER.to_string())
            .await
        {
            Ok(()) => {
                debug!(chars = text.chars().count(), "Message sent");
                StepOutcome::Done
            }
            Err(e) => StepOutcome::failed(format!("send failed: {}", e)),
        }
    }

    async fn close_session(&self, session: SessionHandle) {
        match self.client.delete_session(&session.id).await {
            Ok(()) => info!(session = %session, "Browser session closed"),
            Err(e) => warn!(session = %session, error = %e, "Could not close browser session"),
        }
    }
}
