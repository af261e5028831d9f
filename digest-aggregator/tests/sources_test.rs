use chrono::{DateTime, Duration, Utc};
use digest_aggregator::sources::hn_comments::{self, BestCommentSource};
use digest_aggregator::sources::hype::{self, ScrapeSource, ScrapeStrategy};
use digest_aggregator::sources::telegram::{self, ChannelSource};
use digest_aggregator::sources::{RankedStorySource, RssFeedSource};
use digest_aggregator::{AggregatorError, FetchConfig, Fetcher, SourceDetails, SourceFetcher, SourceTag};
use serde_json::json;
use std::sync::Once;
use tracing::info;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

fn test_fetcher() -> Fetcher {
    let config = FetchConfig {
        user_agent: "Digest-Test/1.0".to_string(),
        timeout_seconds: 5,
        scrape_timeout_seconds: 5,
        ..FetchConfig::default()
    };
    Fetcher::new(config).expect("client builds")
}

fn story(id: u64, score: i64, posted: DateTime<Utc>) -> serde_json::Value {
    json!({
        "id": id,
        "type": "story",
        "title": format!("Story {}", id),
        "url": format!("https://www.example.com/{}", id),
        "score": score,
        "by": "pg",
        "time": posted.timestamp(),
        "descendants": 12
    })
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ranked_stories_filter_sort_and_skip_bad_candidates() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();

    mount_json(&server, "/topstories.json", json!([1, 2, 3, 4, 5, 6])).await;
    mount_json(&server, "/item/1.json", story(1, 50, now - Duration::hours(2))).await;
    let mut with_text = story(2, 100, now - Duration::hours(1));
    with_text["text"] = json!("<p>Hello &amp; welcome</p>");
    mount_json(&server, "/item/2.json", with_text).await;
    mount_json(&server, "/item/3.json", story(3, 500, now - Duration::hours(48))).await;
    mount_json(&server, "/item/4.json", serde_json::Value::Null).await;
    mount_json(&server, "/item/5.json", json!({"id": 5, "type": "job", "title": "Hiring", "time": now.timestamp()})).await;
    Mock::given(method("GET"))
        .and(path("/item/6.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = RankedStorySource::top_stories(server.uri(), test_fetcher());
    let outcome = source.fetch(now).await;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    let ids: Vec<&str> = outcome.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["hn-2", "hn-1"]);

    let top = &outcome.items[0];
    assert_eq!(top.source(), SourceTag::HackerNews);
    assert_eq!(top.summary, "Hello & welcome");
    assert_eq!(outcome.items[1].summary, "Story 1");
    match &top.details {
        SourceDetails::HackerNews(meta) => {
            assert_eq!(meta.upvotes, 100);
            assert_eq!(meta.comments, 12);
            assert_eq!(meta.author, "pg");
            assert_eq!(meta.domain.as_deref(), Some("example.com"));
        }
        other => panic!("unexpected details {:?}", other),
    }
    info!("Ranked stories test completed");
}

#[tokio::test]
async fn test_show_stories_use_their_own_tag_and_prefix() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();

    mount_json(&server, "/showstories.json", json!([7])).await;
    mount_json(&server, "/item/7.json", story(7, 10, now - Duration::minutes(30))).await;

    let source = RankedStorySource::show_stories(server.uri(), test_fetcher());
    assert_eq!(source.tag(), SourceTag::ShowHn);

    let outcome = source.fetch(now).await;
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].id, "showhn-7");
    assert_eq!(outcome.items[0].source(), SourceTag::ShowHn);
}

#[tokio::test]
async fn test_ranked_stories_list_failure_is_reported() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = RankedStorySource::top_stories(server.uri(), test_fetcher());
    let outcome = source.fetch(Utc::now()).await;

    assert!(outcome.items.is_empty());
    let reason = outcome.error.expect("failure reason");
    assert!(reason.contains("503"), "reason was {}", reason);
}

#[tokio::test]
async fn test_ranked_stories_cap_candidates_and_items() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();

    let ids: Vec<u64> = (1..=60).collect();
    mount_json(&server, "/topstories.json", json!(ids)).await;
    for id in 1..=50u64 {
        mount_json(&server, &format!("/item/{}.json", id), story(id, id as i64, now - Duration::hours(1))).await;
    }
    // Ids past the candidate limit must never be requested
    for id in 51..=60u64 {
        Mock::given(method("GET"))
            .and(path(format!("/item/{}.json", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(story(id, 1_000, now)))
            .expect(0)
            .mount(&server)
            .await;
    }

    let source = RankedStorySource::top_stories(server.uri(), test_fetcher());
    let outcome = source.fetch(now).await;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    let got: Vec<&str> = outcome.items.iter().map(|i| i.id.as_str()).collect();
    let expected: Vec<String> = (41..=50u64).rev().map(|id| format!("hn-{}", id)).collect();
    assert_eq!(got, expected);
    server.verify().await;
}

#[tokio::test]
async fn test_best_comments_scored_and_ranked() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();
    let recent = (now - Duration::hours(3)).timestamp();

    let body = json!({
        "hits": [
            {"objectID": "c1", "author": "alice", "comment_text": "a".repeat(200), "created_at_i": recent, "points": 5, "story_title": "Story A"},
            {"objectID": "c2", "author": "bob", "comment_text": "b".repeat(400), "created_at_i": recent, "points": null, "story_title": null},
            {"objectID": "c3", "author": "carol", "comment_text": "too short", "created_at_i": recent},
            {"objectID": "c4", "comment_text": "d".repeat(300), "created_at_i": (now - Duration::hours(30)).timestamp()},
            {"unexpected": true}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/search_by_date"))
        .and(query_param("tags", "comment"))
        .and(query_param("hitsPerPage", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let source = BestCommentSource::new(server.uri(), test_fetcher());
    let outcome = source.fetch(now).await;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    let ids: Vec<&str> = outcome.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["hn-comment-c1", "hn-comment-c2"]);

    let first = &outcome.items[0];
    assert_eq!(first.title, "Re: Story A");
    assert_eq!(first.url.as_deref(), Some("https://news.ycombinator.com/item?id=c1"));
    match &first.details {
        SourceDetails::HnComments(meta) => {
            assert_eq!(meta.upvotes, Some(5));
            assert_eq!(meta.parent_story.as_deref(), Some("Story A"));
        }
        other => panic!("unexpected details {:?}", other),
    }

    let second = &outcome.items[1];
    assert_eq!(second.title, "Re: HN Discussion");
    match &second.details {
        SourceDetails::HnComments(meta) => assert_eq!(meta.upvotes, None),
        other => panic!("unexpected details {:?}", other),
    }
}

#[tokio::test]
async fn test_best_comments_capped_at_ten() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();
    let recent = (now - Duration::hours(2)).timestamp();

    let hits: Vec<serde_json::Value> = (1..=15)
        .map(|n| {
            json!({
                "objectID": format!("c{}", n),
                "author": "alice",
                "comment_text": "x".repeat(150),
                "created_at_i": recent,
                "points": n,
                "story_title": "Story"
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/search_by_date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hits": hits })))
        .mount(&server)
        .await;

    let source = BestCommentSource::new(server.uri(), test_fetcher());
    let outcome = source.fetch(now).await;

    let got: Vec<&str> = outcome.items.iter().map(|i| i.id.as_str()).collect();
    let expected: Vec<String> = (6..=15).rev().map(|n| format!("hn-comment-c{}", n)).collect();
    assert_eq!(got, expected);
}

#[test]
fn test_comment_score_caps_length_bonus() {
    assert_eq!(hn_comments::comment_score(200, Some(5)), 9.0);
    assert_eq!(hn_comments::comment_score(5_000, None), 10.0);
}

fn rss_document(now: DateTime<Utc>) -> String {
    let recent = (now - Duration::hours(2)).to_rfc2822();
    let old = (now - Duration::days(3)).to_rfc2822();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Launches</title>
    <link>https://launches.example</link>
    <description>Daily launches</description>
    <item>
      <title>Rocket App</title>
      <link>https://www.rocket.example/app</link>
      <guid>rocket-1</guid>
      <description>&lt;p&gt;Ship &lt;b&gt;faster&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>{recent}</pubDate>
    </item>
    <item>
      <title>Linkless Launch</title>
      <guid>linkless-1</guid>
      <pubDate>{recent}</pubDate>
    </item>
    <item>
      <title>Old Launch</title>
      <link>https://old.example</link>
      <guid>old-1</guid>
      <pubDate>{old}</pubDate>
    </item>
  </channel>
</rss>"#
    )
}

#[tokio::test]
async fn test_rss_feed_falls_back_to_secondary_url() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed-alt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(rss_document(now)),
        )
        .mount(&server)
        .await;

    let source = RssFeedSource::new(
        format!("{}/feed", server.uri()),
        Some(format!("{}/feed-alt", server.uri())),
        "https://launches.example",
        test_fetcher(),
    );
    let outcome = source.fetch(now).await;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.items.len(), 2);

    let rocket = &outcome.items[0];
    assert_eq!(rocket.title, "Rocket App");
    assert_eq!(rocket.summary, "Ship faster");
    assert!(rocket.id.starts_with("ph-"));
    match &rocket.details {
        SourceDetails::ProductHunt(meta) => assert_eq!(meta.domain.as_deref(), Some("rocket.example")),
        other => panic!("unexpected details {:?}", other),
    }

    let linkless = &outcome.items[1];
    assert_eq!(linkless.url.as_deref(), Some("https://launches.example"));
    assert_eq!(linkless.summary, "Linkless Launch");

    // Ids derive from the guid, so a second cycle produces the same ones
    let again = source.fetch(now).await;
    assert_eq!(again.items[0].id, rocket.id);
}

#[tokio::test]
async fn test_rss_feed_failure_names_both_feeds() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let source = RssFeedSource::new(
        format!("{}/feed", server.uri()),
        Some(format!("{}/feed-alt", server.uri())),
        "https://launches.example",
        test_fetcher(),
    );
    let outcome = source.fetch(Utc::now()).await;

    let reason = outcome.error.expect("failure reason");
    assert!(reason.contains("primary feed"), "reason was {}", reason);
    assert!(reason.contains("fallback feed"), "reason was {}", reason);
}

#[tokio::test]
async fn test_rss_feed_keeps_first_ten_entries_in_document_order() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();
    let recent = (now - Duration::hours(1)).to_rfc2822();

    let entries: String = (1..=12)
        .map(|n| {
            format!(
                "<item><title>Launch {n}</title><link>https://launch.example/{n}</link><guid>launch-{n}</guid><pubDate>{recent}</pubDate></item>"
            )
        })
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Launches</title><link>https://launches.example</link><description>Daily</description>{entries}</channel></rss>"#
    );
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(document))
        .mount(&server)
        .await;

    let source = RssFeedSource::new(
        format!("{}/feed", server.uri()),
        None,
        "https://launches.example",
        test_fetcher(),
    );
    let outcome = source.fetch(now).await;

    let titles: Vec<&str> = outcome.items.iter().map(|i| i.title.as_str()).collect();
    let expected: Vec<String> = (1..=10).map(|n| format!("Launch {}", n)).collect();
    assert_eq!(titles, expected);
}

fn channel_page(now: DateTime<Utc>) -> String {
    let recent = (now - Duration::hours(1)).to_rfc3339();
    let old = (now - Duration::hours(48)).to_rfc3339();
    format!(
        r#"<html><body><section class="tgme_channel_history">
<div class="tgme_widget_message_wrap">
  <div class="tgme_widget_message text_not_supported_wrap js-widget_message" data-post="testchan/101">
    <div class="tgme_widget_message_user"><a href="https://t.me/testchan"><i class="tgme_widget_message_user_photo"><img src="https://cdn.example.org/u/portrait.jpg"></i></a></div>
    <div class="tgme_widget_message_bubble">
      <a class="tgme_widget_message_photo_wrap" style="width:100px;background-image:url('//cdn.example.org/file/photo1.jpg')"></a>
      <div class="tgme_widget_message_text js-message_text" dir="auto">New model released! It beats everything.<br>Second line <b>bold</b><i class="emoji" style="background-image:url('//telegram.org/img/emoji/40/F09F9A80.png')"><b>*</b></i></div>
      <div class="tgme_widget_message_footer"><span class="tgme_widget_message_views">1.2K</span><a class="tgme_widget_message_date" href="https://t.me/testchan/101"><time datetime="{recent}" class="time">12:00</time></a></div>
    </div>
  </div>
</div>
<div class="tgme_widget_message_wrap">
  <div class="tgme_widget_message js-widget_message" data-post="testchan/102">
    <div class="tgme_widget_message_text js-message_text">An older post.</div>
    <div class="tgme_widget_message_footer"><time datetime="{old}">yesterday</time></div>
  </div>
</div>
<div class="tgme_widget_message_wrap">
  <div class="tgme_widget_message js-widget_message" data-post="testchan/103">
    <a class="tgme_widget_message_photo_wrap" style="background-image:url('https://cdn.example.org/file/only-photo.jpg')"></a>
    <div class="tgme_widget_message_footer"><time datetime="{recent}">12:30</time></div>
  </div>
</div>
</section></body></html>"#
    )
}

#[test]
fn test_parse_channel_page_extracts_messages() {
    let now = Utc::now();
    let page = telegram::parse_channel_page("testchan", &channel_page(now)).expect("page parses");

    assert_eq!(page.blocks_found, 3);
    assert_eq!(page.messages.len(), 2);

    let first = &page.messages[0];
    assert_eq!(first.message_id, "101");
    assert_eq!(first.text, "New model released! It beats everything.\nSecond line bold*");
    assert_eq!(first.views, Some(1200));
    assert_eq!(first.images, vec!["https://cdn.example.org/file/photo1.jpg".to_string()]);
    let rich = first.rich_text.as_deref().expect("rich text");
    assert!(rich.contains("<br>"));
    assert!(rich.contains("<b>bold</b>"));
}

#[test]
fn test_channel_items_respect_window() {
    let now = Utc::now();
    let page = telegram::parse_channel_page("testchan", &channel_page(now)).expect("page parses");
    let items = telegram::channel_items(page.messages, now);

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.id, "tg-testchan-101");
    assert_eq!(item.title, "New model released!");
    assert_eq!(item.url.as_deref(), Some("https://t.me/testchan/101"));
    match &item.details {
        SourceDetails::Telegram(meta) => {
            assert_eq!(meta.channel, "@testchan");
            assert_eq!(meta.views, Some(1200));
            assert!(meta.full_text.contains('\n'));
        }
        other => panic!("unexpected details {:?}", other),
    }
    for item in &items {
        assert!(item.posted_at >= now - Duration::hours(24));
    }
}

#[test]
fn test_channel_items_reject_future_posts() {
    let now = Utc::now();
    let message = |id: &str, posted_at: DateTime<Utc>| telegram::ChannelMessage {
        channel: "testchan".to_string(),
        message_id: id.to_string(),
        text: "Scheduled announcement.".to_string(),
        rich_text: None,
        images: Vec::new(),
        posted_at,
        views: None,
    };

    let items = telegram::channel_items(
        vec![
            message("1", now + Duration::days(3)),
            message("2", now - Duration::hours(2)),
        ],
        now,
    );

    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["tg-testchan-2"]);
}

#[tokio::test]
async fn test_channel_source_tolerates_partial_failure() {
    init_tracing();
    let server = MockServer::start().await;
    let now = Utc::now();

    Mock::given(method("GET"))
        .and(path("/s/testchan"))
        .respond_with(ResponseTemplate::new(200).set_body_string(channel_page(now)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/gonechan"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = ChannelSource::new(
        server.uri(),
        vec!["testchan".to_string(), "gonechan".to_string()],
        test_fetcher(),
    );
    let outcome = source.fetch(now).await;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("@gonechan"));
}

#[tokio::test]
async fn test_channel_source_fails_when_every_channel_fails() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = ChannelSource::new(server.uri(), vec!["a".to_string(), "b".to_string()], test_fetcher());
    let outcome = source.fetch(Utc::now()).await;

    assert!(outcome.items.is_empty());
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn test_channel_source_reports_unrecognized_pages() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/redesigned"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><div class=\"post\">new layout</div></body></html>"))
        .mount(&server)
        .await;

    let source = ChannelSource::new(server.uri(), vec!["redesigned".to_string()], test_fetcher());
    let outcome = source.fetch(Utc::now()).await;

    assert!(outcome.is_success());
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].starts_with("extraction matched nothing"));
}

const HYPE_PAGE: &str = r#"<html><body><main>
<article><h2>Agent Toolkit hits one million users</h2><a href="/tools/agent-toolkit">Open</a><p>Agents  for
everyone.</p></article>
<article><h2>Vision model tops the charts</h2><a href="https://models.example.com/vision">Open</a></article>
<article><h2>Agent Toolkit hits one million users</h2><a href="/dupe">Open</a></article>
<article><h2>Tiny</h2></article>
<article><h3>Open weights for speech released</h3></article>
</main></body></html>"#;

#[test]
fn test_scrape_entries_structural() {
    let base = Url::parse("https://hype.example/").expect("valid url");
    let result = hype::scrape_entries(HYPE_PAGE, &base).expect("page parses");

    assert_eq!(result.strategy, Some(ScrapeStrategy::Structural));
    let titles: Vec<&str> = result.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Agent Toolkit hits one million users",
            "Vision model tops the charts",
            "Open weights for speech released",
        ]
    );
    assert_eq!(
        result.entries[0].url.as_deref(),
        Some("https://hype.example/tools/agent-toolkit")
    );
    assert_eq!(result.entries[0].description.as_deref(), Some("Agents for everyone."));
    assert_eq!(result.entries[2].url, None);
}

#[test]
fn test_scrape_entries_capped_at_ten() {
    let articles: String = (1..=12)
        .map(|n| format!("<article><h2>Headline number {} about new tools</h2></article>", n))
        .collect();
    let html = format!("<html><body><main>{}</main></body></html>", articles);
    let base = Url::parse("https://hype.example/").expect("valid url");
    let result = hype::scrape_entries(&html, &base).expect("page parses");

    assert_eq!(result.strategy, Some(ScrapeStrategy::Structural));
    assert_eq!(result.entries.len(), 10);
    assert_eq!(result.entries[0].title, "Headline number 1 about new tools");
    assert_eq!(result.entries[9].title, "Headline number 10 about new tools");
    assert_eq!(hype::scraped_items(result.entries, Utc::now()).len(), 10);
}

#[test]
fn test_scrape_entries_link_scan_fallback() {
    let html = r#"<html><body>
<a href="/news/1">A long descriptive headline about new models</a>
<a href="/news/2">short</a>
<a href="mailto:hi@example.com">Email us with any questions you may have</a>
<a href="//github.com/example/repo">Star our repository on the code host please</a>
</body></html>"#;
    let base = Url::parse("https://hype.example/").expect("valid url");
    let result = hype::scrape_entries(html, &base).expect("page parses");

    assert_eq!(result.strategy, Some(ScrapeStrategy::LinkScan));
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].url.as_deref(), Some("https://hype.example/news/1"));
}

#[test]
fn test_scraped_items_stamped_with_fetch_time() {
    let base = Url::parse("https://hype.example/").expect("valid url");
    let result = hype::scrape_entries(HYPE_PAGE, &base).expect("page parses");
    let now = Utc::now();
    let items = hype::scraped_items(result.entries.clone(), now);

    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.posted_at == now && i.id.starts_with("hype-")));
    assert_eq!(items[0].summary, "Agents for everyone.");

    let again = hype::scraped_items(result.entries, now);
    assert_eq!(items[0].id, again[0].id);
}

#[tokio::test]
async fn test_scrape_source_reports_no_match() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>Nothing to see</p></body></html>"))
        .mount(&server)
        .await;

    let source = ScrapeSource::new(format!("{}/", server.uri()), test_fetcher());
    let outcome = source.fetch(Utc::now()).await;

    assert!(outcome.is_success());
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("extraction matched nothing"));
}

#[tokio::test]
async fn test_fetcher_rejects_oversized_body() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(1024 * 1024 + 1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/small"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(1024)))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(FetchConfig {
        max_body_size_mb: 1,
        ..FetchConfig::default()
    })
    .expect("client builds");

    let err = fetcher
        .fetch_page(&format!("{}/huge", server.uri()))
        .await
        .expect_err("body over the limit");
    assert!(matches!(err, AggregatorError::BodyTooLarge { .. }), "got {:?}", err);

    let body = fetcher
        .fetch_page(&format!("{}/small", server.uri()))
        .await
        .expect("body under the limit");
    assert_eq!(body.len(), 1024);
}
