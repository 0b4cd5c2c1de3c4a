//! Loose RSS/Atom parsing: walk `<item>`/`<entry>` elements and pull out
//! title, summary, date, and link with the fallback chains syndication
//! documents need in practice. Malformed tails end the scan; whatever parsed
//! cleanly is returned.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

use crate::normalize::{clean_html, normalize_url};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    /// Raw source date string (`pubDate`/`updated`/`published`), uncoerced.
    pub published: Option<String>,
    /// Normalized link URL; empty when the entry carried none.
    pub link: String,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Description,
    Summary,
    Content,
    PubDate,
    Updated,
    Published,
    Link,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Field> {
        if name.eq_ignore_ascii_case(b"title") {
            Some(Field::Title)
        } else if name.eq_ignore_ascii_case(b"description") {
            Some(Field::Description)
        } else if name.eq_ignore_ascii_case(b"summary") {
            Some(Field::Summary)
        } else if name.eq_ignore_ascii_case(b"content") || name.eq_ignore_ascii_case(b"encoded") {
            Some(Field::Content)
        } else if name.eq_ignore_ascii_case(b"pubdate") {
            Some(Field::PubDate)
        } else if name.eq_ignore_ascii_case(b"updated") {
            Some(Field::Updated)
        } else if name.eq_ignore_ascii_case(b"published") {
            Some(Field::Published)
        } else if name.eq_ignore_ascii_case(b"link") {
            Some(Field::Link)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct EntryDraft {
    title: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    pub_date: Option<String>,
    updated: Option<String>,
    published: Option<String>,
    link_text: Option<String>,
    link_href: Option<String>,
}

fn set_first(slot: &mut Option<String>, value: String) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value);
    }
}

impl EntryDraft {
    fn commit(&mut self, field: Field, raw: &str) {
        if let Field::Link = field {
            set_first(&mut self.link_text, raw.trim().to_string());
            return;
        }
        let cleaned = clean_html(raw);
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
            Field::PubDate => &mut self.pub_date,
            Field::Updated => &mut self.updated,
            Field::Published => &mut self.published,
            Field::Link => unreachable!(),
        };
        set_first(slot, cleaned);
    }

    fn finish(self) -> FeedEntry {
        let summary = self
            .description
            .or(self.summary)
            .or(self.content)
            .unwrap_or_default();
        let published = self.pub_date.or(self.updated).or(self.published);
        let link_raw = self.link_text.or(self.link_href).unwrap_or_default();
        FeedEntry {
            title: self.title.unwrap_or_default(),
            summary,
            published,
            link: normalize_url(&link_raw),
        }
    }
}

fn is_entry_element(start: &BytesStart) -> bool {
    let name = start.local_name();
    name.as_ref().eq_ignore_ascii_case(b"item") || name.as_ref().eq_ignore_ascii_case(b"entry")
}

fn attr_value(start: &BytesStart, name: &[u8]) -> Option<String> {
    start
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

fn text_content(text: &BytesText) -> String {
    text.unescape()
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned())
}

/// Text nodes arrive split around nested markup; join them with single
/// spaces the way stripped tags read.
fn append_text(buf: &mut String, chunk: &str) {
    let chunk = chunk.trim();
    if chunk.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(chunk);
}

/// Feeds routinely embed HTML entities XML parsers reject; map the common
/// ones to ASCII before the parse.
fn scrub_feed_entities(xml: &str) -> String {
    xml.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse every `<item>`/`<entry>` in a syndication document. Entries missing
/// a link or title are still returned; collectors decide what to skip.
pub fn parse_feed_entries(xml: &str) -> Vec<FeedEntry> {
    let scrubbed = scrub_feed_entities(xml);
    let mut reader = Reader::from_str(&scrubbed);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<EntryDraft> = None;
    // Depth of nested elements below the current entry element.
    let mut depth = 0usize;
    let mut field: Option<Field> = None;
    let mut buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if current.is_none() {
                    if is_entry_element(&start) {
                        current = Some(EntryDraft::default());
                        depth = 0;
                        field = None;
                        buf.clear();
                    }
                    continue;
                }
                if depth == 0 {
                    field = Field::from_name(start.local_name().as_ref());
                    buf.clear();
                    if let (Some(Field::Link), Some(draft)) = (field, current.as_mut()) {
                        if let Some(href) = attr_value(&start, b"href") {
                            set_first(&mut draft.link_href, href);
                        }
                    }
                }
                depth += 1;
            }
            Ok(Event::Empty(start)) => {
                if let Some(draft) = current.as_mut() {
                    if depth == 0 && start.local_name().as_ref().eq_ignore_ascii_case(b"link") {
                        if let Some(href) = attr_value(&start, b"href") {
                            set_first(&mut draft.link_href, href);
                        }
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if current.is_some() && field.is_some() {
                    append_text(&mut buf, &text_content(&text));
                }
            }
            Ok(Event::CData(cdata)) => {
                if current.is_some() && field.is_some() {
                    append_text(&mut buf, &String::from_utf8_lossy(&cdata));
                }
            }
            Ok(Event::End(_)) => {
                if current.is_none() {
                    continue;
                }
                if depth == 0 {
                    if let Some(draft) = current.take() {
                        entries.push(draft.finish());
                    }
                    field = None;
                    buf.clear();
                } else {
                    depth -= 1;
                    if depth == 0 {
                        if let (Some(f), Some(draft)) = (field.take(), current.as_mut()) {
                            draft.commit(f, &buf);
                        }
                        buf.clear();
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            Ok(_) => {}
        }
    }

    if let Some(draft) = current.take() {
        entries.push(draft.finish());
    }

    entries
}
