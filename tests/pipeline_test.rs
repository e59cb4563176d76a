/// パイプライン全体をモックHTTPサーバー相手に通す統合テスト。
use std::env;
use std::sync::Mutex;

use rand::{SeedableRng, rngs::StdRng};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use changelog_worker::{
    app::ComponentRegistry,
    config::Config,
    pipeline::sink::ResultsSink,
    timeline::TimelineItem,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

const CHANGELOG_DOC: &str = "\
# Changelog

## 1.1.0
- Introducing checkpoints - roll back anytime
- Improved status output

## 1.0.0
- Breaking change: removed X
- Added Y

## 0.9.9
- Fixed `foo` crash
";

/// deliver / fail の呼び出しを記録するシンク。
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<Vec<TimelineItem>>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn deliveries(&self) -> Vec<Vec<TimelineItem>> {
        self.delivered.lock().expect("delivered lock").clone()
    }

    fn failure_messages(&self) -> Vec<String> {
        self.failures.lock().expect("failures lock").clone()
    }
}

impl ResultsSink for RecordingSink {
    fn deliver(&self, items: Vec<TimelineItem>) {
        self.delivered.lock().expect("delivered lock").push(items);
    }

    fn fail(&self, message: &str) {
        self.failures
            .lock()
            .expect("failures lock")
            .push(message.to_string());
    }
}

fn config_for(server_uri: &str, use_github_dates: bool) -> Config {
    let _lock = ENV_LOCK.lock().expect("env lock");
    // SAFETY: tests serialize environment mutation through ENV_LOCK and the
    // resulting Config captures all values before the lock is released.
    unsafe {
        env::set_var("CHANGELOG_URL", format!("{server_uri}/CHANGELOG.md"));
        env::set_var("CHANGELOG_PAGE_URL", format!("{server_uri}/CHANGELOG.md"));
        env::set_var("GITHUB_API_BASE", server_uri);
        env::set_var(
            "USE_GITHUB_DATES",
            if use_github_dates { "on" } else { "off" },
        );
        env::set_var("HTTP_MAX_RETRIES", "1");
    }
    Config::from_env().expect("config loads")
}

async fn mount_changelog(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/CHANGELOG.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn run_delivers_items_with_estimated_dates() {
    let server = MockServer::start().await;
    mount_changelog(&server, CHANGELOG_DOC).await;

    let registry =
        ComponentRegistry::build(config_for(&server.uri(), false)).expect("registry builds");
    let sink = RecordingSink::default();
    let mut rng = StdRng::seed_from_u64(42);

    registry.pipeline().run(&mut rng, &sink).await;

    assert!(sink.failure_messages().is_empty());
    let deliveries = sink.deliveries();
    assert_eq!(deliveries.len(), 1, "deliver must be called exactly once");

    let items = &deliveries[0];
    assert_eq!(items.len(), 3);

    assert_eq!(items[0].title, "Claude Code 1.1.0 - checkpoints");
    assert_eq!(items[1].title, "Claude Code 1.0.0 - Breaking Changes");
    assert_eq!(items[2].title, "Claude Code 0.9.9");

    // 新しいリリースほど新しい日付が付く
    assert!(items[0].date > items[1].date);
    assert!(items[1].date > items[2].date);
}

#[tokio::test]
async fn run_renders_bodies_and_annotations() {
    let server = MockServer::start().await;
    mount_changelog(&server, CHANGELOG_DOC).await;

    let registry =
        ComponentRegistry::build(config_for(&server.uri(), false)).expect("registry builds");
    let sink = RecordingSink::default();
    let mut rng = StdRng::seed_from_u64(7);

    registry.pipeline().run(&mut rng, &sink).await;

    let deliveries = sink.deliveries();
    let items = &deliveries[0];

    let ga = &items[1];
    let annotations = ga.annotations.as_ref().expect("annotation present");
    assert_eq!(annotations[0].text, "🎉 GA Release");
    assert!(ga.body.contains("<li><strong>Breaking change:</strong> removed X</li>"));
    assert!(ga.body.contains("<li>Added Y</li>"));

    let feature = &items[0];
    let annotations = feature.annotations.as_ref().expect("annotation present");
    assert_eq!(annotations[0].text, "✨ Feature Release");
    assert!(feature.uri.ends_with("CHANGELOG.md#110"));

    let fix = &items[2];
    assert!(fix.body.contains("<code>foo</code>"));
    assert!(fix.body.starts_with("<p><strong>0.9.9 🐛 Bug Fixes</strong></p>"));
    assert!(fix.annotations.is_none());

    assert_eq!(items[0].author.name, "Claude Code Team");
    assert_eq!(items[0].author.username, "@anthropics");
}

#[tokio::test]
async fn run_uses_authoritative_dates_when_enabled() {
    let server = MockServer::start().await;
    mount_changelog(&server, CHANGELOG_DOC).await;

    let anchor = "2025-06-01T00:00:00Z";
    let releases = serde_json::json!([
        { "tag_name": "v1.0.0", "published_at": anchor, "created_at": null }
    ]);
    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases))
        .mount(&server)
        .await;

    let registry =
        ComponentRegistry::build(config_for(&server.uri(), true)).expect("registry builds");
    let sink = RecordingSink::default();
    let mut rng = StdRng::seed_from_u64(42);

    registry.pipeline().run(&mut rng, &sink).await;

    assert!(sink.failure_messages().is_empty());
    let deliveries = sink.deliveries();
    let items = &deliveries[0];

    let anchor = chrono::DateTime::parse_from_rfc3339(anchor)
        .expect("valid date")
        .with_timezone(&chrono::Utc);
    let cadence = chrono::Duration::milliseconds((2.5 * 24.0 * 60.0 * 60.0 * 1000.0) as i64);

    assert_eq!(items[1].date, anchor);
    // 前側に既知日付がないので、後側の既知日付から間隔ぶん加算される
    assert_eq!(items[0].date, anchor + cadence);
    assert_eq!(items[2].date, anchor - cadence);
}

#[tokio::test]
async fn run_falls_back_when_release_response_is_invalid() {
    let server = MockServer::start().await;
    mount_changelog(&server, CHANGELOG_DOC).await;

    Mock::given(method("GET"))
        .and(path("/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&server)
        .await;

    let registry =
        ComponentRegistry::build(config_for(&server.uri(), true)).expect("registry builds");
    let sink = RecordingSink::default();
    let mut rng = StdRng::seed_from_u64(42);

    registry.pipeline().run(&mut rng, &sink).await;

    // 第2段の失敗は実行を止めない
    assert!(sink.failure_messages().is_empty());
    let deliveries = sink.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].len(), 3);
}

#[tokio::test]
async fn run_reports_error_when_changelog_fetch_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/CHANGELOG.md"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let registry =
        ComponentRegistry::build(config_for(&server.uri(), false)).expect("registry builds");
    let sink = RecordingSink::default();
    let mut rng = StdRng::seed_from_u64(42);

    registry.pipeline().run(&mut rng, &sink).await;

    assert!(sink.deliveries().is_empty());
    let failures = sink.failure_messages();
    assert_eq!(failures.len(), 1, "fail must be called exactly once");
    assert!(failures[0].starts_with("Failed to load changelog:"));
}

#[tokio::test]
async fn run_rejects_suspiciously_short_changelog() {
    let server = MockServer::start().await;
    mount_changelog(&server, "## 1.0.0\n- x\n").await;

    let registry =
        ComponentRegistry::build(config_for(&server.uri(), false)).expect("registry builds");
    let sink = RecordingSink::default();
    let mut rng = StdRng::seed_from_u64(42);

    registry.pipeline().run(&mut rng, &sink).await;

    assert!(sink.deliveries().is_empty());
    let failures = sink.failure_messages();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("too short"));
}

#[tokio::test]
async fn run_rejects_changelog_without_version_sections() {
    let server = MockServer::start().await;
    let prose = "# Release notes\n\nNothing here follows the version heading convention, \
                 but the document is comfortably longer than the minimum size guard.\n";
    mount_changelog(&server, prose).await;

    let registry =
        ComponentRegistry::build(config_for(&server.uri(), false)).expect("registry builds");
    let sink = RecordingSink::default();
    let mut rng = StdRng::seed_from_u64(42);

    registry.pipeline().run(&mut rng, &sink).await;

    assert!(sink.deliveries().is_empty());
    let failures = sink.failure_messages();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("no version sections"));
}
