use crate::fetcher::Fetcher;
use crate::sanitize::sanitize_rich_text;
use crate::traits::SourceFetcher;
use crate::types::{AggregatorError, ChannelMeta, Item, Result, SourceBatch, SourceDetails, SourceTag};
use crate::utils::{count, text, time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE: &str = "https://t.me";
pub const DEFAULT_CHANNELS: &[&str] = &[
    "data_secrets",
    "gonzo_ML",
    "seeallochnaya",
    "denissexy",
    "NeuralShit",
    "cryptoEssay",
    "sergiobulaev",
    "blognot",
    "addmeto",
];
/// Public links always point here, whatever page base is configured
const LINK_BASE: &str = "https://t.me";
const DECORATIVE_MARKERS: &[&str] = &["avatar", "user_photo", "emoji", "icon"];

/// One post scraped from a channel preview page
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub channel: String,
    pub message_id: String,
    pub text: String,
    pub rich_text: Option<String>,
    pub images: Vec<String>,
    pub posted_at: DateTime<Utc>,
    pub views: Option<u64>,
}

/// What one preview page yielded
#[derive(Debug, Clone, Default)]
pub struct ChannelPage {
    /// Message blocks found, usable or not
    pub blocks_found: usize,
    pub messages: Vec<ChannelMessage>,
}

/// Recent posts from public channel preview pages (`{base}/s/{channel}`)
pub struct ChannelSource {
    base_url: String,
    channels: Vec<String>,
    fetcher: Fetcher,
}

impl ChannelSource {
    pub fn new(base_url: impl Into<String>, channels: Vec<String>, fetcher: Fetcher) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            channels,
            fetcher,
        }
    }

    async fn fetch_channel(&self, channel: &str) -> Result<ChannelPage> {
        let url = format!("{}/s/{}", self.base_url, channel);
        let html = self.fetcher.fetch_page(&url).await?;
        parse_channel_page(channel, &html)
    }
}

#[async_trait]
impl SourceFetcher for ChannelSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Telegram
    }

    async fn pull(&self, now: DateTime<Utc>) -> Result<SourceBatch> {
        info!("Pulling {} channels", self.channels.len());

        let fetches: Vec<_> = self.channels.iter().map(|c| self.fetch_channel(c)).collect();
        let pages = join_all(fetches).await;

        let mut messages = Vec::new();
        let mut failures = Vec::new();
        let mut unmatched = Vec::new();
        let mut reachable = 0;

        for (channel, page) in self.channels.iter().zip(pages) {
            match page {
                Ok(page) if page.blocks_found == 0 => {
                    warn!("No message blocks on channel page @{}", channel);
                    reachable += 1;
                    unmatched.push(format!("@{}", channel));
                }
                Ok(page) => {
                    debug!(
                        "@{}: {} blocks, {} usable messages",
                        channel,
                        page.blocks_found,
                        page.messages.len()
                    );
                    reachable += 1;
                    messages.extend(page.messages);
                }
                Err(e) => {
                    warn!("Channel @{} failed: {}", channel, e);
                    failures.push(format!("@{}: {}", channel, e));
                }
            }
        }

        if reachable == 0 && !failures.is_empty() {
            return Err(AggregatorError::NoUsableResponse(format!(
                "every channel failed ({})",
                failures.join("; ")
            )));
        }

        let mut warnings: Vec<String> = failures
            .into_iter()
            .map(|failure| format!("channel {}", failure))
            .collect();

        let items = channel_items(messages, now);
        info!("Selected {} channel posts", items.len());

        if !unmatched.is_empty() && unmatched.len() == reachable {
            let detail = format!("no message blocks on {}", unmatched.join(", "));
            return Ok(SourceBatch::no_match(detail).with_warnings(warnings));
        }

        warnings.extend(
            unmatched
                .into_iter()
                .map(|channel| format!("extraction matched nothing on {}", channel)),
        );
        Ok(SourceBatch::new(items).with_warnings(warnings))
    }
}

/// Parse a channel preview page. Blocks missing text or a timestamp are
/// counted but produce no message.
pub fn parse_channel_page(channel: &str, html: &str) -> Result<ChannelPage> {
    let document = Html::parse_document(html);
    let block_selector = selector(".tgme_widget_message")?;
    let main_text_selector = selector(".tgme_widget_message_text.js-message_text")?;
    let any_text_selector = selector(".tgme_widget_message_text")?;
    let time_selector = selector("time[datetime]")?;
    let views_selector = selector(".tgme_widget_message_views")?;

    let mut page = ChannelPage::default();

    for (index, block) in document.select(&block_selector).enumerate() {
        page.blocks_found += 1;

        let message_id = block
            .value()
            .attr("data-post")
            .and_then(|post| post.split_once('/'))
            .map(|(_, id)| id)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string());

        let text_element = block
            .select(&main_text_selector)
            .next()
            .or_else(|| block.select(&any_text_selector).next());
        let text = text_element.map(text_with_breaks).unwrap_or_default();

        let posted_at = block
            .select(&time_selector)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let Some(posted_at) = posted_at else {
            debug!("@{} block {} has no timestamp", channel, message_id);
            continue;
        };
        if text.is_empty() {
            debug!("@{} block {} has no text", channel, message_id);
            continue;
        }

        let rich_text = text_element
            .map(|el| sanitize_rich_text(&el.inner_html()))
            .filter(|html| !html.trim().is_empty());

        let views = block
            .select(&views_selector)
            .next()
            .and_then(|v| count::parse_shorthand(&v.text().collect::<String>()));

        page.messages.push(ChannelMessage {
            channel: channel.to_string(),
            message_id,
            text,
            rich_text,
            images: collect_images(block),
            posted_at,
            views,
        });
    }

    Ok(page)
}

/// Keep posts inside the window, newest first, as items
pub fn channel_items(messages: Vec<ChannelMessage>, now: DateTime<Utc>) -> Vec<Item> {
    let mut recent: Vec<ChannelMessage> = messages
        .into_iter()
        .filter(|m| time::within_window(m.posted_at, now))
        .collect();
    recent.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));

    let mut seen = HashSet::new();
    recent
        .into_iter()
        .map(message_item)
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

fn message_item(message: ChannelMessage) -> Item {
    Item {
        id: format!("tg-{}-{}", message.channel, message.message_id),
        title: text::derive_title(&message.text),
        summary: text::summarize_plain(&message.text),
        url: Some(format!(
            "{}/{}/{}",
            LINK_BASE, message.channel, message.message_id
        )),
        posted_at: message.posted_at,
        details: SourceDetails::Telegram(ChannelMeta {
            channel: format!("@{}", message.channel),
            views: message.views,
            images: message.images,
            full_text: message.text,
            rich_text: message.rich_text,
        }),
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AggregatorError::Parse(format!("selector {}: {}", css, e)))
}

/// Text content with `<br>` turned into newlines
fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }

    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn collect_images(block: ElementRef<'_>) -> Vec<String> {
    let mut images = Vec::new();
    for node in block.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if is_decorative(element, block) {
            continue;
        }

        if element.value().name() == "img" {
            if let Some(src) = element.value().attr("src") {
                push_image(&mut images, src);
            }
        }
        if let Some(style) = element.value().attr("style") {
            if let Some(url) = background_image_url(style) {
                push_image(&mut images, url);
            }
        }
    }
    images
}

/// Avatars, emoji and icons, judged by the element and its ancestors inside the block
fn is_decorative(element: ElementRef<'_>, block: ElementRef<'_>) -> bool {
    let block_id = block.id();
    std::iter::once(element)
        .chain(
            element
                .ancestors()
                .take_while(|node| node.id() != block_id)
                .filter_map(ElementRef::wrap),
        )
        .any(|el| {
            el.value().classes().any(|class| {
                let class = class.to_ascii_lowercase();
                DECORATIVE_MARKERS.iter().any(|marker| class.contains(marker))
            })
        })
}

fn background_image_url(style: &str) -> Option<&str> {
    let start = style.find("background-image")?;
    let rest = &style[start..];
    let open = rest.find("url(")? + "url(".len();
    let close = rest[open..].find(')')? + open;
    let url = rest[open..close].trim().trim_matches(|c| c == '\'' || c == '"');
    (!url.is_empty()).then_some(url)
}

fn push_image(images: &mut Vec<String>, raw: &str) {
    let raw = raw.trim();
    let url = if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        raw.to_string()
    };

    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return;
    }
    let lower = url.to_ascii_lowercase();
    if DECORATIVE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return;
    }
    if !images.contains(&url) {
        images.push(url);
    }
}
