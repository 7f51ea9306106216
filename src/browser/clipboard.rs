use async_trait::async_trait;
use chromiumoxide::Page;
use serde::Deserialize;
use tracing::debug;

use crate::channel::{ChannelError, ControlId, ExternalChannel};
use crate::locator::{js_literal, CONTROL_ATTR};

const READ_SCRIPT: &str = r#"
    (async () => {
        try {
            const text = await navigator.clipboard.readText();
            return { ok: true, text, name: null, message: null };
        } catch (e) {
            return {
                ok: false,
                text: null,
                name: (e && e.name) || 'Error',
                message: String((e && e.message) || e)
            };
        }
    })()
"#;

/// The page's clipboard plus its copy controls.
///
/// Requires clipboard permissions for the page origin, see
/// [`BrowserSession::launch`](crate::browser::BrowserSession::launch).
#[derive(Debug, Clone)]
pub struct PageClipboard {
    page: Page,
}

#[derive(Debug, Deserialize)]
struct ClipboardReply {
    ok: bool,
    text: Option<String>,
    name: Option<String>,
    message: Option<String>,
}

impl ClipboardReply {
    fn into_result(self) -> Result<String, ChannelError> {
        if self.ok {
            return Ok(self.text.unwrap_or_default());
        }
        let name = self.name.unwrap_or_default();
        let message = self.message.unwrap_or_default();
        if name == "NotAllowedError" || name == "SecurityError" {
            Err(ChannelError::Denied(format!("{}: {}", name, message)))
        } else {
            Err(ChannelError::Unavailable(format!("{}: {}", name, message)))
        }
    }
}

impl PageClipboard {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval_reply(&self, script: String) -> Result<ClipboardReply, ChannelError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ChannelError::Unavailable(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| ChannelError::Unavailable(format!("Failed to parse result: {:?}", e)))
    }
}

fn write_script(text: &str) -> String {
    let text = js_literal(text);
    format!(
        r#"
        (async () => {{
            try {{
                await navigator.clipboard.writeText({text});
                return {{ ok: true, text: null, name: null, message: null }};
            }} catch (e) {{
                return {{
                    ok: false,
                    text: null,
                    name: (e && e.name) || 'Error',
                    message: String((e && e.message) || e)
                }};
            }}
        }})()
        "#
    )
}

fn click_script(control: &ControlId) -> String {
    let selector = js_literal(&format!("[{}=\"{}\"]", CONTROL_ATTR, control.as_str()));
    format!(
        r#"
        (() => {{
            const button = document.querySelector({selector});
            if (!button) return false;
            button.dispatchEvent(new MouseEvent('click', {{ bubbles: true, cancelable: true }}));
            return true;
        }})()
        "#
    )
}

#[async_trait]
impl ExternalChannel for PageClipboard {
    async fn peek(&self) -> Result<String, ChannelError> {
        self.eval_reply(READ_SCRIPT.to_string()).await?.into_result()
    }

    async fn trigger(&self, control: &ControlId) -> Result<(), ChannelError> {
        let clicked: bool = self
            .page
            .evaluate(click_script(control))
            .await
            .map_err(|e| ChannelError::Unavailable(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| ChannelError::Unavailable(format!("Failed to parse result: {:?}", e)))?;

        if !clicked {
            return Err(ChannelError::ControlMissing(control.clone()));
        }
        debug!("Pressed copy control {}", control);
        Ok(())
    }

    async fn read(&self) -> Result<String, ChannelError> {
        self.eval_reply(READ_SCRIPT.to_string()).await?.into_result()
    }

    async fn write(&self, text: &str) -> Result<(), ChannelError> {
        self.eval_reply(write_script(text)).await?.into_result().map(|_| ())
    }
}
