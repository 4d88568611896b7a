//! Sitemap accumulation and XML serialization
//!
//! Workers append [`PageRecord`]s to a shared [`SitemapAccumulator`]. Once the
//! crawl has drained, the accumulator is finished into a [`SitemapDocument`]
//! which is serialized exactly once:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/page</loc>
//!     <lastmod>2024-01-15T08:30:00Z</lastmod>
//!     <changefreq>daily</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use crate::output::OutputError;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Namespace of the sitemaps.org 0.9 schema
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// `changefreq` written for every page
pub const CHANGE_FREQUENCY: &str = "daily";

/// `priority` written for every page
pub const PRIORITY: &str = "1.0";

/// One accepted page
///
/// Every page is published with [`CHANGE_FREQUENCY`] and [`PRIORITY`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Normalized absolute URL
    pub url: String,
    /// Modification time reported by the server (or the fetch time)
    pub last_modified: DateTime<Utc>,
}

impl PageRecord {
    pub fn new(url: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            last_modified,
        }
    }

    /// `lastmod` value in W3C Datetime (RFC 3339) form
    pub fn lastmod(&self) -> String {
        self.last_modified.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Thread-safe, append-only collection of page records
#[derive(Debug, Default)]
pub struct SitemapAccumulator {
    records: Mutex<Vec<PageRecord>>,
}

impl SitemapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record; records are never merged or overwritten
    pub fn record(&self, record: PageRecord) {
        self.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Takes every record collected so far into a document
    ///
    /// Call only after all workers have completed; the accumulator is left
    /// empty.
    pub fn finish(&self) -> SitemapDocument {
        SitemapDocument {
            records: std::mem::take(&mut *self.lock()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PageRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The finished sitemap, ready to serialize
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapDocument {
    records: Vec<PageRecord>,
}

impl SitemapDocument {
    pub fn new(records: Vec<PageRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if a record for `url` is present
    pub fn contains(&self, url: &str) -> bool {
        self.records.iter().any(|r| r.url == url)
    }

    /// Serializes the document as UTF-8 sitemap XML with an XML declaration
    pub fn to_xml(&self) -> Result<Vec<u8>, OutputError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", SITEMAP_NAMESPACE));
        write_event(&mut writer, Event::Start(urlset))?;

        for record in &self.records {
            write_event(&mut writer, Event::Start(BytesStart::new("url")))?;
            write_text_element(&mut writer, "loc", &record.url)?;
            write_text_element(&mut writer, "lastmod", &record.lastmod())?;
            write_text_element(&mut writer, "changefreq", CHANGE_FREQUENCY)?;
            write_text_element(&mut writer, "priority", PRIORITY)?;
            write_event(&mut writer, Event::End(BytesEnd::new("url")))?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new("urlset")))?;

        let mut xml = writer.into_inner();
        xml.push(b'\n');
        Ok(xml)
    }

    /// Serializes the document and writes it to `path`
    ///
    /// Missing parent directories are created.
    pub fn write_to(&self, path: &Path) -> Result<(), OutputError> {
        let xml = self.to_xml()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(path)?;
        file.write_all(&xml)?;
        file.flush()?;

        tracing::info!("Wrote sitemap with {} URLs to {}", self.len(), path.display());
        Ok(())
    }
}

fn write_event<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), OutputError> {
    writer
        .write_event(event)
        .map_err(|e| OutputError::Xml(e.to_string()))
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), OutputError> {
    write_event(writer, Event::Start(BytesStart::new(name)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::thread;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 17, 8, 30, 0).unwrap()
    }

    fn xml_string(doc: &SitemapDocument) -> String {
        String::from_utf8(doc.to_xml().unwrap()).unwrap()
    }

    #[test]
    fn test_lastmod_format() {
        let record = PageRecord::new("https://x.test/a", ts());
        assert_eq!(record.lastmod(), "2023-05-17T08:30:00Z");
    }

    #[test]
    fn test_empty_document() {
        let xml = xml_string(&SitemapDocument::default());
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_single_entry_layout() {
        let doc = SitemapDocument::new(vec![PageRecord::new("https://x.test/a", ts())]);
        let xml = xml_string(&doc);

        assert_eq!(xml.matches("<url>").count(), 1);
        assert!(xml.contains("<loc>https://x.test/a</loc>"));
        assert!(xml.contains("<lastmod>2023-05-17T08:30:00Z</lastmod>"));
        assert!(xml.contains("<changefreq>daily</changefreq>"));
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[test]
    fn test_escapes_special_characters() {
        let doc = SitemapDocument::new(vec![PageRecord::new("https://x.test/a&b<c>", ts())]);
        let xml = xml_string(&doc);
        assert!(xml.contains("<loc>https://x.test/a&amp;b&lt;c&gt;</loc>"));
    }

    #[test]
    fn test_output_parses_back() {
        let doc = SitemapDocument::new(vec![
            PageRecord::new("https://x.test/a", ts()),
            PageRecord::new("https://x.test/b", ts()),
        ]);
        let xml = doc.to_xml().unwrap();

        let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
        let mut buf = Vec::new();
        let mut locs = Vec::new();
        let mut in_loc = false;
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) if e.name().as_ref() == b"loc" => in_loc = true,
                Event::End(e) if e.name().as_ref() == b"loc" => in_loc = false,
                Event::Text(t) if in_loc => locs.push(t.unescape().unwrap().into_owned()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        assert_eq!(locs, vec!["https://x.test/a", "https://x.test/b"]);
    }

    #[test]
    fn test_accumulator_finish_drains() {
        let acc = SitemapAccumulator::new();
        acc.record(PageRecord::new("https://x.test/a", ts()));
        acc.record(PageRecord::new("https://x.test/b", ts()));
        assert_eq!(acc.len(), 2);

        let doc = acc.finish();
        assert_eq!(doc.len(), 2);
        assert!(doc.contains("https://x.test/a"));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_accumulator_concurrent_records() {
        let acc = Arc::new(SitemapAccumulator::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let acc = Arc::clone(&acc);
                thread::spawn(move || {
                    for i in 0..50 {
                        acc.record(PageRecord::new(format!("https://x.test/{}/{}", t, i), ts()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(acc.finish().len(), 400);
    }

    #[test]
    fn test_write_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/sitemap.xml");
        let doc = SitemapDocument::new(vec![PageRecord::new("https://x.test/a", ts())]);

        doc.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<loc>https://x.test/a</loc>"));
    }
}
