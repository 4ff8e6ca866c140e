use appscout_engine::config::WebDriverConfig;
use appscout_engine::{ElementHandle, RemoteSession, SessionError, Strategy};
use async_trait::async_trait;
use dashmap::DashMap;
use fantoccini::elements::{Element, ElementRef};
use fantoccini::error::CmdError;
use fantoccini::wd::WebDriverCompatibleCommand;
use fantoccini::{Client, ClientBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// W3C key under which an element reference is returned.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// [`RemoteSession`] over a W3C WebDriver endpoint (Appium, a device grid).
pub struct WebDriverSession {
    client: Client,
    elements: DashMap<String, Element>,
    next_id: AtomicU64,
}

impl WebDriverSession {
    pub async fn connect(config: &WebDriverConfig) -> Result<Self, SessionError> {
        let mut caps = serde_json::Map::new();
        for (k, v) in &config.capabilities {
            caps.insert(k.clone(), v.clone());
        }

        info!("Connecting to WebDriver at {}...", config.url);
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.url)
            .await
            .map_err(|e| {
                SessionError::Transport(format!(
                    "Failed to connect to WebDriver at {}: {}",
                    config.url, e
                ))
            })?;

        Ok(Self {
            client,
            elements: DashMap::new(),
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn close(&self) -> Result<(), SessionError> {
        self.elements.clear();
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| SessionError::Transport(format!("Failed to close session: {}", e)))
    }

    /// Number of element references currently held for the resolver.
    pub fn tracked_elements(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, handle: &ElementHandle) -> Result<Element, SessionError> {
        self.elements
            .get(handle.id())
            .map(|e| e.value().clone())
            .ok_or_else(|| SessionError::StaleElement(handle.id().to_string()))
    }

    fn register(&self, element: Element) -> ElementHandle {
        let id = format!("wd-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.elements.insert(id.clone(), element);
        ElementHandle::new(id)
    }

    /// One `POST /element` round trip. `Ok(None)` when the driver reports
    /// no match.
    async fn find_once(&self, cmd: FindElement) -> Result<Option<Element>, SessionError> {
        match self.client.issue_cmd(cmd).await {
            Ok(res) => {
                let id = element_id(&res).ok_or_else(|| {
                    SessionError::Other(format!("Unexpected find-element response: {}", res))
                })?;
                Ok(Some(Element::from_element_id(
                    self.client.clone(),
                    ElementRef::from(id),
                )))
            }
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(map_cmd_error(e)),
        }
    }
}

/// W3C / Appium locator strategy name for a [`Strategy`].
pub fn locator_strategy(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Id => "id",
        Strategy::AccessibilityId => "accessibility id",
        Strategy::PlatformQuery => "-android uiautomator",
        Strategy::XPath => "xpath",
    }
}

/// `POST /session/{id}/element` with an arbitrary `using` strategy. The
/// typed locators fantoccini ships stop at CSS / XPath / link text.
#[derive(Debug, Clone)]
pub struct FindElement {
    using: &'static str,
    value: String,
}

impl FindElement {
    pub fn new(strategy: Strategy, selector: &str) -> Self {
        Self {
            using: locator_strategy(strategy),
            value: selector.to_string(),
        }
    }

    fn body(&self) -> serde_json::Value {
        serde_json::json!({ "using": self.using, "value": self.value })
    }
}

impl WebDriverCompatibleCommand for FindElement {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> Result<url::Url, url::ParseError> {
        let session_id = session_id.ok_or(url::ParseError::RelativeUrlWithoutBase)?;
        base_url.join(&format!("session/{}/element", session_id))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        (http::Method::POST, Some(self.body().to_string()))
    }
}

/// Pull the element reference out of a find-element reply, whether or not
/// the driver left it wrapped in `value`.
fn element_id(res: &serde_json::Value) -> Option<String> {
    res.get(ELEMENT_KEY)
        .or_else(|| res.get("value").and_then(|v| v.get(ELEMENT_KEY)))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn map_cmd_error(e: CmdError) -> SessionError {
    if e.is_stale_element_reference() {
        SessionError::StaleElement(e.to_string())
    } else if e.is_invalid_selector() {
        SessionError::InvalidSelector {
            selector: e.to_string(),
        }
    } else if e.is_unsupported_operation() || e.is_unknown_command() {
        SessionError::NotSupported(e.to_string())
    } else {
        SessionError::Transport(e.to_string())
    }
}

#[async_trait]
impl RemoteSession for WebDriverSession {
    async fn locate(
        &self,
        strategy: Strategy,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, SessionError> {
        let cmd = FindElement::new(strategy, selector);
        debug!("Locating {} '{}'", cmd.using, selector);

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.find_once(cmd.clone()).await? {
                return Ok(Some(self.register(element)));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, SessionError> {
        let element = self.element(handle)?;
        element.is_displayed().await.map_err(map_cmd_error)
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), SessionError> {
        let element = self.element(handle)?;
        element.click().await.map_err(map_cmd_error)
    }

    async fn text(&self, handle: &ElementHandle) -> Result<String, SessionError> {
        let element = self.element(handle)?;
        element.text().await.map_err(map_cmd_error)
    }

    async fn set_value(&self, handle: &ElementHandle, text: &str) -> Result<(), SessionError> {
        let element = self.element(handle)?;
        element.send_keys(text).await.map_err(map_cmd_error)
    }

    async fn clear(&self, handle: &ElementHandle) -> Result<(), SessionError> {
        let element = self.element(handle)?;
        element.clear().await.map_err(map_cmd_error)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        self.client
            .screenshot()
            .await
            .map_err(|e| SessionError::Transport(format!("Screenshot failed: {}", e)))
    }

    fn release(&self, handle: &ElementHandle) {
        if self.elements.remove(handle.id()).is_some() {
            debug!("Released element {}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_strategy_names() {
        assert_eq!(locator_strategy(Strategy::Id), "id");
        assert_eq!(locator_strategy(Strategy::AccessibilityId), "accessibility id");
        assert_eq!(
            locator_strategy(Strategy::PlatformQuery),
            "-android uiautomator"
        );
        assert_eq!(locator_strategy(Strategy::XPath), "xpath");
    }

    #[test]
    fn test_platform_query_command() {
        let cmd = FindElement::new(
            Strategy::PlatformQuery,
            "new UiSelector().text(\"Explore\")",
        );
        let base = url::Url::parse("http://localhost:4723/").unwrap();

        let endpoint = cmd.endpoint(&base, Some("abc123")).unwrap();
        assert_eq!(
            endpoint.as_str(),
            "http://localhost:4723/session/abc123/element"
        );

        let (method, body) = cmd.method_and_body(&endpoint);
        assert_eq!(method, http::Method::POST);
        let body: serde_json::Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "using": "-android uiautomator",
                "value": "new UiSelector().text(\"Explore\")"
            })
        );
    }

    #[test]
    fn test_accessibility_id_command_body() {
        let cmd = FindElement::new(Strategy::AccessibilityId, "Search Wikipedia");
        assert_eq!(
            cmd.body(),
            serde_json::json!({ "using": "accessibility id", "value": "Search Wikipedia" })
        );
    }

    #[test]
    fn test_command_needs_session() {
        let cmd = FindElement::new(Strategy::Id, "org.wikipedia:id/search_container");
        let base = url::Url::parse("http://localhost:4723/").unwrap();
        assert!(cmd.endpoint(&base, None).is_err());
    }

    #[test]
    fn test_element_id_extraction() {
        let bare = serde_json::json!({ ELEMENT_KEY: "00000000-0001" });
        assert_eq!(element_id(&bare).as_deref(), Some("00000000-0001"));

        let wrapped = serde_json::json!({ "value": { ELEMENT_KEY: "00000000-0002" } });
        assert_eq!(element_id(&wrapped).as_deref(), Some("00000000-0002"));

        assert_eq!(element_id(&serde_json::json!({ "ELEMENT": "x" })), None);
    }
}
