//! Minimal W3C WebDriver client: sessions, navigation, element lookup and input.

use reqwest::Method;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Result, WebDriverError};

/// W3C web element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Special keys from the WebDriver key table.
pub mod keys {
    /// Releases held modifiers.
    pub const NULL: char = '\u{E000}';
    pub const ENTER: char = '\u{E007}';
    pub const SHIFT: char = '\u{E008}';
}

/// Element location strategy.
#[derive(Debug, Clone)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    fn to_json(&self) -> Value {
        match self {
            Locator::Css(selector) => json!({ "using": "css selector", "value": selector }),
            Locator::XPath(path) => json!({ "using": "xpath", "value": path }),
        }
    }
}

pub struct WebDriverClient {
    client: reqwest::Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Starts a Chrome session with the given command-line arguments; returns the session id.
    pub async fn new_session(&self, chrome_args: &[String]) -> Result<String> {
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": chrome_args }
                }
            }
        });

        let value = self.command(Method::POST, "/session", Some(body)).await?;
        value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WebDriverError::Protocol("missing sessionId".to_string()))
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.command(Method::DELETE, &format!("/session/{}", session_id), None)
            .await?;
        Ok(())
    }

    pub async fn navigate(&self, session_id: &str, url: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/url", session_id),
            Some(json!({ "url": url })),
        )
        .await?;
        Ok(())
    }

    pub async fn set_window_size(&self, session_id: &str, width: u32, height: u32) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/window/rect", session_id),
            Some(json!({ "width": width, "height": height })),
        )
        .await?;
        Ok(())
    }

    /// Finds one element; `Ok(None)` when the driver reports `no such element`.
    pub async fn find_element(&self, session_id: &str, locator: &Locator) -> Result<Option<String>> {
        let result = self
            .command(
                Method::POST,
                &format!("/session/{}/element", session_id),
                Some(locator.to_json()),
            )
            .await;

        match result {
            Ok(value) => element_id(&value).map(Some),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn find_elements(&self, session_id: &str, locator: &Locator) -> Result<Vec<String>> {
        let value = self
            .command(
                Method::POST,
                &format!("/session/{}/elements", session_id),
                Some(locator.to_json()),
            )
            .await?;

        value
            .as_array()
            .ok_or_else(|| WebDriverError::Protocol("elements value is not an array".to_string()))?
            .iter()
            .map(element_id)
            .collect()
    }

    /// Polls [`find_element`](Self::find_element) until it appears or `timeout` elapses.
    /// A timeout is `Ok(None)`, not an error.
    pub async fn wait_for_element(
        &self,
        session_id: &str,
        locator: &Locator,
        timeout: Duration,
        poll: Duration,
    ) -> Result<Option<String>> {
        let started = Instant::now();
        loop {
            if let Some(element) = self.find_element(session_id, locator).await? {
                return Ok(Some(element));
            }
            if started.elapsed() >= timeout {
                debug!(?locator, ?timeout, "Element did not appear in time");
                return Ok(None);
            }
            tokio::time::sleep(poll).await;
        }
    }

    pub async fn element_text(&self, session_id: &str, element: &str) -> Result<String> {
        let value = self
            .command(
                Method::GET,
                &format!("/session/{}/element/{}/text", session_id, element),
                None,
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn click(&self, session_id: &str, element: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/element/{}/click", session_id, element),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    pub async fn send_keys(&self, session_id: &str, element: &str, text: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("/session/{}/element/{}/value", session_id, element),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    /// Sends one command and returns the `value` member of the reply.
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let error = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(text);
            return Err(WebDriverError::Command {
                status: status.as_u16(),
                error,
                message,
            });
        }

        Ok(value)
    }
}

fn element_id(value: &Value) -> Result<String> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WebDriverError::Protocol(format!("not an element reference: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_json() {
        assert_eq!(
            Locator::XPath("//span".to_string()).to_json(),
            json!({ "using": "xpath", "value": "//span" })
        );
        assert_eq!(
            Locator::Css("footer".to_string()).to_json(),
            json!({ "using": "css selector", "value": "footer" })
        );
    }

    #[test]
    fn test_element_id() {
        assert_eq!(element_id(&json!({ ELEMENT_KEY: "e1" })).unwrap(), "e1");
        assert!(element_id(&json!({ "other": "e1" })).is_err());
    }
}
