//! Registry test utilities

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockito::{Mock, ServerGuard};

use registry_feeds::feed::detector::AnomalyDetector;
use registry_feeds::feed::poller::{PollOptions, Poller};
use registry_feeds::feed::registries::NpmRegistry;
use registry_feeds::feed::types::ReleaseEvent;

pub const LATEST_FEED: &str = r#"
<?xml version="1.0" encoding="UTF-8"?><rss>
    <channel>
        <title><![CDATA[npm recent updates]]></title>
        <lastBuildDate>Mon, 22 Mar 2021 13:45:33 GMT</lastBuildDate>
        <pubDate>Mon, 22 Mar 2021 13:45:33 GMT</pubDate>
        <item>
            <title><![CDATA[FooPackage]]></title>
            <dc:creator><![CDATA[FooMan]]></dc:creator>
            <pubDate>Mon, 22 Mar 2021 13:45:16 GMT</pubDate>
        </item>
        <item>
            <title><![CDATA[BarPackage]]></title>
            <dc:creator><![CDATA[BarMan]]></dc:creator>
            <pubDate>Mon, 22 Mar 2021 13:07:29 GMT</pubDate>
        </item>
		<item>
			<title><![CDATA[BazPackage]]></title>
			<dc:creator><![CDATA[BazMan]]></dc:creator>
			<pubDate>Tue, 11 May 2021 14:19:45 GMT</pubDate>
		</item>
		<item>
			<title><![CDATA[BazPackage]]></title>
			<dc:creator><![CDATA[BazMan]]></dc:creator>
			<pubDate>Tue, 11 May 2021 14:18.32 GMT</pubDate>
		</item>
		<item>
			<title><![CDATA[QuxPackage]]></title>
			<dc:creator><![CDATA[QuxMan]]></dc:creator>
			<pubDate>Tue, 11 May 2021 14:17.12 GMT</pubDate>
		</item>
    </channel>
</rss>
"#;

/// Feed whose only item name is followed by replacement characters
pub const NON_UTF8_FEED: &str = r#"
<?xml version="1.0" encoding="UTF-8"?><rss>
    <channel>
        <title><![CDATA[npm recent updates]]></title>
        <lastBuildDate>Mon, 22 Mar 2021 13:45:33 GMT</lastBuildDate>
        <pubDate>Mon, 22 Mar 2021 13:45:33 GMT</pubDate>
        <item>
            <title><![CDATA[BarPackage���]]></title>
            <dc:creator><![CDATA[Bar���Man]]></dc:creator>
            <pubDate>Mon, 22 Mar 2021 13:07:29 GMT</pubDate>
        </item>
    </channel>
</rss>
"#;

pub const FOO_PACKAGE: &str = r#"{
    "name": "FooPackage",
    "dist-tags": { "latest": "1.0.1", "release-0.9.x": "0.9.1" },
    "time": {
        "created": "2021-03-22T13:07:29.000Z",
        "1.0.0": "2021-03-22T13:07:29.000Z",
        "modified": "2021-05-11T18:34:12.000Z",
        "0.9.1": "2021-03-23T05:17:43.000Z",
        "1.0.1": "2021-05-11T18:32:01.000Z"
    }
}"#;

pub const BAR_PACKAGE: &str = r#"{
    "name": "BarPackage",
    "dist-tags": { "latest": "0.4.0", "next": "0.5.0-alpha" },
    "time": {
        "created": "2021-03-22T13:45:16.000Z",
        "0.4.0": "2021-03-22T13:45:16.000Z",
        "modified": "2021-05-11T17:24:14.000Z",
        "0.5.0-alpha": "2021-05-11T17:23:02.000Z"
    }
}"#;

/// Mentioned twice in the feed, so both versions are new
pub const BAZ_PACKAGE: &str = r#"{
    "name": "BazPackage",
    "dist-tags": { "latest": "1.1" },
    "time": {
        "created": "2021-05-11T14:18:32.000Z",
        "1.0": "2021-05-11T14:18:32.000Z",
        "modified": "2021-05-11T14:19:46.000Z",
        "1.1": "2021-05-11T14:19:45.000Z"
    }
}"#;

/// Entirely unpublished
pub const QUX_PACKAGE: &str = r#"{
    "name": "QuxPackage",
    "time": {
        "created": "2021-05-10T14:38:14.000Z",
        "1.0": "2021-05-10T14:38:14.000Z",
        "modified": "2021-05-11T14:17:12.000Z",
        "1.1": "2021-05-11T11:19:43.000Z",
        "unpublished": {
            "name": "Quxman",
            "time": "2021-05-11T14:17:12.000Z",
            "versions": ["1.0", "1.1"]
        }
    }
}"#;

/// Replaces every U+FFFD in `feed` with a byte that is never valid UTF-8
pub fn with_invalid_utf8(feed: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(feed.len());
    for c in feed.chars() {
        if c == char::REPLACEMENT_CHARACTER {
            bytes.push(0xff);
        } else {
            let mut buf = [0; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    bytes
}

pub async fn mock_body(server: &mut ServerGuard, path: &str, body: impl AsRef<[u8]>) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

pub async fn mock_status(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body(r#"{"error": "Not found"}"#)
        .create_async()
        .await
}

/// Detector that records the size of every stream it is shown
#[derive(Default)]
pub struct RecordingDetector {
    pub seen: Mutex<Vec<(String, usize)>>,
}

impl AnomalyDetector for RecordingDetector {
    fn notify(&self, feed: &str, releases: &[ReleaseEvent]) -> anyhow::Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push((feed.to_string(), releases.len()));
        Ok(())
    }
}

/// Create an npm poller against the mock server
///
/// `packages` of `None` polls the activity feed.
pub fn create_test_poller(
    server: &ServerGuard,
    packages: Option<Vec<&str>>,
    detector: Arc<RecordingDetector>,
) -> Poller {
    let registry = NpmRegistry::new(&server.url(), Duration::from_secs(5)).unwrap();
    Poller::new(
        Arc::new(registry),
        detector,
        PollOptions {
            packages: packages.map(|names| names.iter().map(|n| n.to_string()).collect()),
            max_concurrency: 4,
        },
    )
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}
