use anyhow::Result;
use feed_rs::model::FeedType;
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;

/// One entry of a fetched feed, reduced to what gets stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: String,
}

impl FeedItem {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published: published.into(),
        }
    }
}

/// Parse RSS, Atom or JSON Feed bytes into items, preserving entry order.
///
/// Missing fields become empty strings. The publish date is the entry's
/// `pubDate` / `published` text exactly as the feed wrote it; entries that only
/// carry an `updated` timestamp get an empty date.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(bytes)?;

    let mut dates = match feed.feed_type {
        FeedType::JSON => json_publish_dates(bytes),
        _ => xml_publish_dates(bytes),
    };
    if dates.len() != feed.entries.len() {
        tracing::warn!(
            entries = feed.entries.len(),
            dates = dates.len(),
            "Could not match publish dates to feed entries, leaving them empty"
        );
        dates = vec![String::new(); feed.entries.len()];
    }

    let items = feed
        .entries
        .into_iter()
        .zip(dates)
        .map(|(entry, published)| {
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let link = entry
                .links
                .into_iter()
                .next()
                .map(|l| l.href)
                .unwrap_or_default();

            FeedItem {
                title,
                link,
                published,
            }
        })
        .collect();

    Ok(items)
}

/// Raw publish date text of every `<item>` / `<entry>`, in document order.
///
/// `pubDate` (RSS) and `published` (Atom) win over `dc:date`. A scan error
/// stops early; the caller notices the count mismatch.
fn xml_publish_dates(bytes: &[u8]) -> Vec<String> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut dates = Vec::new();
    let mut in_entry = false;
    // (primary, dc:date) for the entry being scanned
    let mut found: (Option<String>, Option<String>) = (None, None);
    let mut capture: Option<(bool, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"item" | b"entry" if !in_entry => {
                    in_entry = true;
                    found = (None, None);
                }
                b"pubDate" | b"published" if in_entry => capture = Some((true, String::new())),
                b"date" if in_entry => capture = Some((false, String::new())),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = capture.as_mut() {
                    match t.unescape() {
                        Ok(s) => text.push_str(&s),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"item" | b"entry" if in_entry => {
                    in_entry = false;
                    let (primary, dc) = std::mem::take(&mut found);
                    dates.push(primary.or(dc).unwrap_or_default());
                }
                b"pubDate" | b"published" | b"date" => {
                    if let Some((primary, text)) = capture.take() {
                        let slot = if primary { &mut found.0 } else { &mut found.1 };
                        slot.get_or_insert(text.trim().to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Stopped scanning feed for publish dates");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    dates
}

/// `date_published` of every JSON Feed item, verbatim.
fn json_publish_dates(bytes: &[u8]) -> Vec<String> {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(bytes) else {
        return Vec::new();
    };
    doc.get("items")
        .and_then(|items| items.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.get("date_published")
                        .and_then(|d| d.as_str())
                        .unwrap_or_default()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}
