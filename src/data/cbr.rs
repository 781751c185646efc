//! Central Bank of Russia daily rates feed.
//!
//! One GET per date against `XML_daily_eng.asp?date_req=DD/MM/YYYY`. The feed
//! answers with a `windows-1251` XML document, so the body is decoded with the
//! declared charset before it reaches the XML deserializer.

use std::time::Duration;

use chrono::NaiveDate;
use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::domain::{RawRecord, Snapshot};
use crate::error::RatesError;

const REQUEST_DATE_FORMAT: &str = "%d/%m/%Y";
const DOCUMENT_DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%d/%m/%Y"];
const ROOT_ELEMENT: &str = "ValCurs";
const USER_AGENT: &str = concat!("cbr-rates/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce the snapshot for a date.
///
/// Shared by every worker of a run, hence `Sync`.
pub trait SnapshotSource: Sync {
    fn fetch(&self, date: NaiveDate) -> Result<Snapshot, RatesError>;
}

pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RatesError> {
        let client = client_builder(timeout)
            .build()
            .map_err(|e| RatesError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn request_url(&self, date: NaiveDate) -> String {
        format!("{}{}", self.base_url, date.format(REQUEST_DATE_FORMAT))
    }
}

fn client_builder(timeout: Duration) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
}

impl SnapshotSource for HttpFetcher {
    fn fetch(&self, date: NaiveDate) -> Result<Snapshot, RatesError> {
        let url = self.request_url(date);
        log::debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| transport_error(date, e))?;

        if !resp.status().is_success() {
            return Err(RatesError::Transport {
                date,
                message: format!("request failed with status {}", resp.status()),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.bytes().map_err(|e| transport_error(date, e))?;

        let text = decode_document(&body, content_type.as_deref())?;
        parse_document(&text)
    }
}

fn transport_error(date: NaiveDate, err: reqwest::Error) -> RatesError {
    if err.is_timeout() {
        RatesError::Timeout { date }
    } else {
        RatesError::Transport {
            date,
            message: err.to_string(),
        }
    }
}

/// Decode a response body to text.
///
/// Charset precedence: byte order mark, XML declaration, `Content-Type`
/// header, then UTF-8.
pub fn decode_document(bytes: &[u8], content_type: Option<&str>) -> Result<String, RatesError> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => {
            let label = xml_declared_encoding(bytes).or_else(|| content_type.and_then(charset_param));
            let encoding = match label {
                Some(label) => Encoding::for_label(label.trim().as_bytes())
                    .ok_or_else(|| RatesError::parse(format!("unsupported charset {label:?}")))?,
                None => UTF_8,
            };
            (encoding, bytes)
        }
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(RatesError::parse(format!(
            "body is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// `encoding` attribute of a leading `<?xml ... ?>` declaration.
fn xml_declared_encoding(bytes: &[u8]) -> Option<&str> {
    let head = &bytes[..bytes.len().min(256)];
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    let decl = decl.trim_start().strip_prefix("<?xml")?;

    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    Some(&rest[..rest.find(quote)?])
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

#[derive(Debug, Deserialize)]
struct ValCurs {
    #[serde(rename = "@Date")]
    date: String,
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "@ID")]
    id: String,
    #[serde(rename = "NumCode")]
    num_code: String,
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value")]
    value: String,
}

/// Parse a decoded `ValCurs` document.
pub fn parse_document(text: &str) -> Result<Snapshot, RatesError> {
    expect_root(text, ROOT_ELEMENT)?;
    let doc: ValCurs = quick_xml::de::from_str(text)
        .map_err(|e| RatesError::parse(format!("malformed ValCurs document: {e}")))?;

    let date = parse_document_date(&doc.date)?;
    let entries = doc
        .valutes
        .into_iter()
        .map(|v| RawRecord {
            id: v.id,
            num_code: v.num_code,
            char_code: v.char_code.trim().to_string(),
            nominal: v.nominal,
            name: v.name,
            value: v.value,
        })
        .collect();

    Ok(Snapshot {
        date,
        name: doc.name,
        entries,
    })
}

/// The serde deserializer ignores the root tag name, so check it up front.
fn expect_root(text: &str, expected: &str) -> Result<(), RatesError> {
    let mut reader = Reader::from_str(text);
    loop {
        let event = reader
            .read_event()
            .map_err(|e| RatesError::parse(format!("malformed XML: {e}")))?;
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                if name.as_ref() == expected.as_bytes() {
                    return Ok(());
                }
                return Err(RatesError::parse(format!(
                    "unexpected root element <{}>, expected <{expected}>",
                    String::from_utf8_lossy(name.as_ref())
                )));
            }
            Event::Eof => return Err(RatesError::parse("document has no root element")),
            _ => {}
        }
    }
}

fn parse_document_date(raw: &str) -> Result<NaiveDate, RatesError> {
    let raw = raw.trim();
    DOCUMENT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| RatesError::parse(format!("invalid document date {raw:?}")))
}
