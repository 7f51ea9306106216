use crate::locator::LocatorConfig;

/// Attribute used to tag copy controls so they can be pressed later.
pub const CONTROL_ATTR: &str = "data-harvest-control";

/// In-page JavaScript for reading and moving the feed.
///
/// Every script resolves the container itself; the host may re-render it
/// between calls, so nothing is cached on the page side except control tags.
#[derive(Debug, Clone)]
pub struct FeedScripts {
    config: LocatorConfig,
}

impl FeedScripts {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    fn container_lookup(&self) -> String {
        let selectors = js_literal(&self.config.container_selectors);
        format!(
            r#"
                const containerSelectors = {selectors};
                let container = null;
                for (const selector of containerSelectors) {{
                    container = document.querySelector(selector);
                    if (container) break;
                }}
            "#
        )
    }

    /// Collect raw item data from the feed container.
    ///
    /// Evaluates to `{ found, anchors }`; `anchors` deserializes as
    /// [`FeedSnapshot`](crate::locator::FeedSnapshot).
    pub fn snapshot_script(&self) -> String {
        let lookup = self.container_lookup();
        let anchor = js_literal(&self.config.anchor_selector);
        let item = js_literal(&self.config.item_selector);
        let author_container = js_literal(&self.config.author_container_selector);
        let author_link = js_literal(&self.config.author_link_selector);
        let buttons = js_literal(&self.config.prompt_buttons_selector);
        let copy_selectors = js_literal(&self.config.copy_control_selectors);

        format!(
            r#"
            (() => {{
                {lookup}
                if (!container) return {{ found: false, anchors: [] }};

                window.__harvestSeq = window.__harvestSeq || 0;
                const copySelectors = {copy_selectors};
                const anchors = [];

                for (const link of container.querySelectorAll({anchor})) {{
                    const parent = link.closest({item}) || link.parentElement;
                    let imgSrc = null;
                    let author = null;
                    let copyControl = null;

                    if (parent) {{
                        const img = parent.querySelector('img');
                        if (img && img.src) imgSrc = img.src;

                        const authorBox = parent.querySelector({author_container});
                        if (authorBox) {{
                            const userLink = authorBox.querySelector({author_link});
                            if (userLink) {{
                                author = {{ href: userLink.href, text: userLink.textContent || '' }};
                            }}
                        }}

                        const buttons = parent.querySelector({buttons});
                        if (buttons) {{
                            for (const selector of copySelectors) {{
                                const button = buttons.querySelector(selector);
                                if (!button) continue;
                                let id = button.getAttribute('{CONTROL_ATTR}');
                                if (!id) {{
                                    window.__harvestSeq += 1;
                                    id = String(window.__harvestSeq);
                                    button.setAttribute('{CONTROL_ATTR}', id);
                                }}
                                copyControl = id;
                                break;
                            }}
                        }}
                    }}

                    anchors.push({{
                        href: link.href,
                        style: link.getAttribute('style'),
                        imgSrc,
                        author,
                        copyControl
                    }});
                }}

                return {{ found: true, anchors }};
            }})()
            "#
        )
    }

    /// Evaluates to `true` while loading placeholders are present.
    pub fn loading_script(&self) -> String {
        let lookup = self.container_lookup();
        let loading = js_literal(&self.config.loading_selector);
        format!(
            r#"
            (() => {{
                {lookup}
                if (!container) return false;
                return container.querySelectorAll({loading}).length > 0;
            }})()
            "#
        )
    }

    /// Evaluates to `{ found, offset }` with the container's `scrollTop`.
    pub fn scroll_offset_script(&self) -> String {
        let lookup = self.container_lookup();
        format!(
            r#"
            (() => {{
                {lookup}
                return container
                    ? {{ found: true, offset: container.scrollTop }}
                    : {{ found: false, offset: 0 }};
            }})()
            "#
        )
    }

    /// Smooth-scroll the container by `delta`. Evaluates to `false` when the
    /// container is missing.
    pub fn scroll_by_script(&self, delta: f64) -> String {
        let lookup = self.container_lookup();
        format!(
            r#"
            (() => {{
                {lookup}
                if (!container) return false;
                container.scrollTo({{ top: container.scrollTop + {delta}, behavior: 'smooth' }});
                return true;
            }})()
            "#
        )
    }
}

/// Encode a value as a JavaScript literal.
pub(crate) fn js_literal<T: serde::Serialize + ?Sized>(value: &T) -> String {
    // Strings and string lists always serialize.
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
