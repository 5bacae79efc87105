//! Feed watcher: polls a YouTube channel RSS feed and auto-posts new videos.
//!
//! The watcher owns its seen-set outright; only this task reads or writes it,
//! and it lives for the process lifetime only; entries re-surface after a
//! restart. Ids are recorded as seen when a post succeeds (or when the video
//! is over the duration ceiling, so it is not re-probed every poll); any other
//! failure leaves the entry unseen for retry on the next tick.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::bot::caption::build_caption;
use crate::bot::resilient::{Delivery, TelegramDelivery};
use crate::extract::ytdlp::YtDlpRunner;
use crate::extract::{Extractor, Pipeline, Platform, RelayError};

/// Strip the Atom namespace prefix YouTube puts on entry ids.
fn video_id(entry_id: &str) -> &str {
    entry_id.strip_prefix("yt:video:").unwrap_or(entry_id)
}

/// Entry ids ordered oldest first by publish date, so a backlog is posted in
/// chronological order. Feed documents list newest first.
#[must_use]
pub fn chronological_entry_ids(entries: &[feed_rs::model::Entry]) -> Vec<&str> {
    let mut ordered: Vec<_> = entries.iter().collect();
    ordered.sort_by_key(|e| e.published);
    ordered.into_iter().map(|e| e.id.as_str()).collect()
}

/// Ids from the feed that are not in the seen set yet, input order preserved.
#[must_use]
pub fn new_entry_ids<'a, I>(entry_ids: I, seen: &HashSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    entry_ids
        .into_iter()
        .map(video_id)
        .filter(|id| !id.is_empty() && !seen.contains(*id))
        .map(String::from)
        .collect()
}

/// Periodic poller posting new feed entries to a fixed destination chat.
pub struct FeedWatcher {
    http: reqwest::Client,
    feed_url: String,
    target: ChatId,
    poll_interval: Duration,
    seen: HashSet<String>,
}

impl FeedWatcher {
    /// Create a watcher for one feed and destination.
    #[must_use]
    pub fn new(feed_url: String, target: ChatId, poll_interval: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            feed_url,
            target,
            poll_interval,
            seen: HashSet::new(),
        }
    }

    /// Run forever on a fixed timer. Poll failures are logged and never stop
    /// the loop.
    pub async fn run(mut self, bot: Bot, pipeline: Arc<Pipeline<YtDlpRunner>>) {
        info!(feed = %self.feed_url, chat_id = self.target.0, "feed watcher started");

        let delivery = TelegramDelivery::new(bot);
        let mut timer = tokio::time::interval(self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            if let Err(e) = self.poll_once(&delivery, &pipeline).await {
                warn!(error = %e, "feed poll failed");
            }
        }
    }

    async fn poll_once<E: Extractor>(
        &mut self,
        delivery: &dyn Delivery,
        pipeline: &Pipeline<E>,
    ) -> Result<()> {
        let bytes = self
            .http
            .get(&self.feed_url)
            .send()
            .await
            .context("feed request failed")?
            .error_for_status()
            .context("feed endpoint returned an error status")?
            .bytes()
            .await
            .context("feed body read failed")?;

        let feed = feed_rs::parser::parse(bytes.as_ref()).context("feed parse failed")?;
        let ids = chronological_entry_ids(&feed.entries);
        let fresh = new_entry_ids(ids, &self.seen);

        for id in fresh {
            self.post_entry(delivery, pipeline, &id).await;
        }
        Ok(())
    }

    /// Run one feed entry through the same pipeline as an inbound link.
    async fn post_entry<E: Extractor>(
        &mut self,
        delivery: &dyn Delivery,
        pipeline: &Pipeline<E>,
        id: &str,
    ) {
        let url = format!("https://www.youtube.com/watch?v={id}");
        let platform = Platform::classify(&url);

        match pipeline.run(&url, platform).await {
            Ok(result) => {
                let caption = build_caption(&result.info, platform);
                let sent = delivery
                    .send_video(self.target, &result.file_path, &caption)
                    .await;

                if let Err(e) = tokio::fs::remove_file(&result.file_path).await {
                    warn!(path = %result.file_path.display(), error = %e, "failed to remove downloaded file");
                }

                match sent {
                    Ok(()) => {
                        info!(id, "feed entry posted");
                        self.seen.insert(id.to_string());
                    }
                    Err(e) => {
                        // Left unseen: retried on the next poll
                        warn!(id, error = %e, "feed entry delivery failed");
                    }
                }
            }
            Err(RelayError::DurationExceeded { actual, limit }) => {
                // Permanently over the ceiling; no point probing it again
                info!(id, actual, limit, "feed entry over duration limit, marking seen");
                self.seen.insert(id.to_string());
            }
            Err(e) => {
                warn!(id, error = %e, "feed entry extraction failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::preset::ExtractionPreset;
    use crate::extract::{CallFailure, MediaInfo};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use teloxide::types::ParseMode;

    #[test]
    fn strips_youtube_atom_prefix() {
        assert_eq!(video_id("yt:video:abc123"), "abc123");
        assert_eq!(video_id("abc123"), "abc123");
    }

    #[test]
    fn filters_seen_entries_preserving_order() {
        let mut seen = HashSet::new();
        seen.insert("old".to_string());

        let fresh = new_entry_ids(
            vec!["yt:video:old", "yt:video:new1", "new2", ""],
            &seen,
        );
        assert_eq!(fresh, vec!["new1".to_string(), "new2".to_string()]);
    }

    #[test]
    fn empty_feed_yields_nothing() {
        let seen = HashSet::new();
        assert!(new_entry_ids(Vec::<&str>::new(), &seen).is_empty());
    }

    #[test]
    fn backlog_is_ordered_oldest_first() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>yt:channel:chan</id>
  <title>uploads</title>
  <updated>2026-02-02T00:00:00Z</updated>
  <entry>
    <id>yt:video:newer</id>
    <title>newer</title>
    <published>2026-02-02T00:00:00Z</published>
  </entry>
  <entry>
    <id>yt:video:older</id>
    <title>older</title>
    <published>2026-01-01T00:00:00Z</published>
  </entry>
</feed>"#;
        let feed = feed_rs::parser::parse(xml.as_bytes()).expect("well-formed feed");
        assert_eq!(
            chronological_entry_ids(&feed.entries),
            vec!["yt:video:older", "yt:video:newer"]
        );
    }

    /// Probes a fixed duration, counts fetches, and writes a real file so the
    /// delivery path has something to clean up.
    struct ScriptedExtractor {
        id: &'static str,
        duration: f64,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl Extractor for ScriptedExtractor {
        async fn probe(
            &self,
            _url: &str,
            _preset: &ExtractionPreset,
        ) -> Result<MediaInfo, CallFailure> {
            Ok(MediaInfo {
                id: self.id.to_string(),
                title: Some("a clip".to_string()),
                duration: Some(self.duration),
                uploader: None,
                channel: None,
                webpage_url: None,
            })
        }

        async fn fetch(
            &self,
            _url: &str,
            _preset: &ExtractionPreset,
            output: &Path,
        ) -> Result<(), CallFailure> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(output, b"video bytes")
                .await
                .map_err(|e| CallFailure::new(e.to_string()))
        }
    }

    struct ScriptedDelivery {
        fail: bool,
    }

    #[async_trait]
    impl Delivery for ScriptedDelivery {
        async fn send_text(
            &self,
            _chat_id: ChatId,
            _text: &str,
            _parse_mode: Option<ParseMode>,
        ) -> Result<()> {
            Ok(())
        }

        async fn send_video(
            &self,
            _chat_id: ChatId,
            _file_path: &Path,
            _caption: &str,
        ) -> Result<()> {
            if self.fail {
                Err(anyhow::anyhow!("video send rejected"))
            } else {
                Ok(())
            }
        }
    }

    fn watcher() -> FeedWatcher {
        FeedWatcher::new(
            "https://www.youtube.com/feeds/videos.xml?channel_id=chan".to_string(),
            ChatId(1),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn successful_post_marks_the_entry_seen() {
        let pipeline = Pipeline::new(
            ScriptedExtractor {
                id: "feed-ok",
                duration: 10.0,
                fetches: AtomicUsize::new(0),
            },
            75,
            std::env::temp_dir(),
        );
        let delivery = ScriptedDelivery { fail: false };
        let mut watcher = watcher();

        watcher.post_entry(&delivery, &pipeline, "feed-ok").await;

        assert!(watcher.seen.contains("feed-ok"));
    }

    #[tokio::test]
    async fn failed_delivery_leaves_the_entry_unseen() {
        let pipeline = Pipeline::new(
            ScriptedExtractor {
                id: "feed-err",
                duration: 10.0,
                fetches: AtomicUsize::new(0),
            },
            75,
            std::env::temp_dir(),
        );
        let delivery = ScriptedDelivery { fail: true };
        let mut watcher = watcher();

        watcher.post_entry(&delivery, &pipeline, "feed-err").await;

        // Retried on the next poll
        assert!(!watcher.seen.contains("feed-err"));
    }

    #[tokio::test]
    async fn over_length_entry_is_marked_seen_without_a_fetch() {
        let pipeline = Pipeline::new(
            ScriptedExtractor {
                id: "feed-long",
                duration: 120.0,
                fetches: AtomicUsize::new(0),
            },
            75,
            std::env::temp_dir(),
        );
        let delivery = ScriptedDelivery { fail: false };
        let mut watcher = watcher();

        watcher.post_entry(&delivery, &pipeline, "feed-long").await;

        assert!(watcher.seen.contains("feed-long"));
        assert_eq!(pipeline.extractor().fetches.load(Ordering::SeqCst), 0);
    }
}
