//! Catalog page parser for mako.co.il
//!
//! One generic interpreter turns show, season and episode pages into
//! [`CatalogItem`]s. What to select and which fields to read is declared
//! per content type in a static [`ContentDescriptor`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::types::{CatalogItem, ContentType};
use crate::url::resolve_url;

/// Placeholder for shows whose index card has no usable title
pub const UNKNOWN_SHOW: &str = "Unknown Show";

static GUID_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[?&](guid|videoGuid)=([\w-]+)").unwrap());

/// Which item field a rule fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Name,
    Guid,
}

/// Where a rule reads its raw value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Value of the named attribute
    ByAttribute(&'static str),
    /// Trimmed text content
    ByText,
}

/// Extraction rule for one field
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    /// Nested selector to read from instead of the matched node itself
    pub target: Option<&'static str>,
    pub extract: Extract,
    /// Regex whose first capture group replaces the raw value
    pub pattern: Option<&'static str>,
}

/// Where relative links on a page are resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkBase {
    /// Site root
    Site,
    /// URL of the page being parsed
    Page,
}

/// When a partially extracted node still becomes an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Every declared field must be present
    AllFields,
    /// A URL is enough; the name is repaired later from the show's own page
    UrlSuffices,
    /// Everything but the guid is required; the guid gets a second
    /// chance from the URL query before unresolved items are dropped
    GuidDeferred,
}

/// Static description of how to extract one content type
#[derive(Debug)]
pub struct ContentDescriptor {
    pub content_type: ContentType,
    /// Candidate selectors in priority order; the first with any match wins
    pub selectors: &'static [&'static str],
    pub fields: &'static [FieldRule],
    pub base: LinkBase,
    pub acceptance: Acceptance,
}

pub static SHOWS: ContentDescriptor = ContentDescriptor {
    content_type: ContentType::Shows,
    selectors: &[r#"li > a[href^="/mako-vod-"]"#, r#"li a[href^="/mako-vod-"]"#],
    fields: &[
        FieldRule {
            field: Field::Url,
            target: None,
            extract: Extract::ByAttribute("href"),
            pattern: None,
        },
        FieldRule {
            field: Field::Name,
            target: Some("img"),
            extract: Extract::ByAttribute("alt"),
            pattern: None,
        },
    ],
    base: LinkBase::Site,
    acceptance: Acceptance::UrlSuffices,
};

pub static SEASONS: ContentDescriptor = ContentDescriptor {
    content_type: ContentType::Seasons,
    selectors: &["div#seasonDropdown ul ul li a"],
    fields: &[
        FieldRule {
            field: Field::Name,
            target: Some("span"),
            extract: Extract::ByText,
            pattern: None,
        },
        FieldRule {
            field: Field::Url,
            target: None,
            extract: Extract::ByAttribute("href"),
            pattern: None,
        },
    ],
    base: LinkBase::Page,
    acceptance: Acceptance::AllFields,
};

pub static EPISODES: ContentDescriptor = ContentDescriptor {
    content_type: ContentType::Episodes,
    selectors: &[
        "li.card a",
        r#"a[href*="videoGuid="]"#,
        ".vod_item a",
        ".vod_item_wrap a",
    ],
    fields: &[
        FieldRule {
            field: Field::Name,
            target: Some("strong.title"),
            extract: Extract::ByText,
            pattern: None,
        },
        FieldRule {
            field: Field::Url,
            target: None,
            extract: Extract::ByAttribute("href"),
            pattern: None,
        },
        FieldRule {
            field: Field::Guid,
            target: None,
            extract: Extract::ByAttribute("href"),
            pattern: Some(r"/VOD-([\w-]+)\.htm"),
        },
    ],
    base: LinkBase::Page,
    acceptance: Acceptance::GuidDeferred,
};

impl ContentType {
    /// The fixed descriptor for this content type
    pub fn descriptor(self) -> &'static ContentDescriptor {
        match self {
            ContentType::Shows => &SHOWS,
            ContentType::Seasons => &SEASONS,
            ContentType::Episodes => &EPISODES,
        }
    }
}

/// Values a node produced, before acceptance
#[derive(Debug, Default)]
struct Extracted {
    url: Option<String>,
    name: Option<String>,
    guid: Option<String>,
}

impl Extracted {
    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Url => self.url = Some(value),
            Field::Name => self.name = Some(value),
            Field::Guid => self.guid = Some(value),
        }
    }

    fn has(&self, field: Field) -> bool {
        match field {
            Field::Url => self.url.is_some(),
            Field::Name => self.name.is_some(),
            Field::Guid => self.guid.is_some(),
        }
    }
}

/// Extracts catalog items of `content_type` from a page
///
/// # Arguments
/// * `html` - Raw HTML of the page
/// * `content_type` - Which descriptor to apply
/// * `page_url` - URL the page was fetched from
/// * `site_url` - Site root, for descriptors that resolve against it
///
/// # Returns
/// Items in document order, deduplicated by [`CatalogItem::identity`].
/// Empty when no candidate selector matches.
pub fn extract_items(
    html: &str,
    content_type: ContentType,
    page_url: &str,
    site_url: &str,
) -> Vec<CatalogItem> {
    let descriptor = content_type.descriptor();
    let base = match descriptor.base {
        LinkBase::Site => site_url,
        LinkBase::Page => page_url,
    };

    let document = Html::parse_document(html);
    let Some((selector, nodes)) = first_matching(&document, descriptor.selectors) else {
        debug!(%content_type, "no candidate selector matched");
        return Vec::new();
    };
    debug!(%content_type, selector, count = nodes.len(), "selector matched");

    let rules = compile_rules(descriptor.fields);
    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for node in nodes {
        let extracted = extract_fields(&node, &rules, base);
        let Some(mut item) = accept(extracted, descriptor) else {
            continue;
        };
        // Query guids take part in dedup, so they are filled in first
        if descriptor.acceptance == Acceptance::GuidDeferred {
            if item.guid.is_none() {
                item.guid = guid_from_query(&item.url);
            }
            if item.guid.is_none() {
                debug!(url = %item.url, "episode without guid dropped");
                continue;
            }
        }
        if seen.insert(item.identity().to_string()) {
            items.push(item);
        }
    }

    items
}

/// Tries selectors in order and returns the first one with matches
///
/// Never merges matches across selectors.
fn first_matching<'a>(
    document: &'a Html,
    selectors: &[&'static str],
) -> Option<(&'static str, Vec<ElementRef<'a>>)> {
    selectors.iter().find_map(|&raw| {
        let selector = match Selector::parse(raw) {
            Ok(s) => s,
            Err(e) => {
                warn!(selector = raw, error = ?e, "invalid selector skipped");
                return None;
            }
        };
        let nodes: Vec<ElementRef> = document.select(&selector).collect();
        (!nodes.is_empty()).then_some((raw, nodes))
    })
}

/// A [`FieldRule`] with its selector and pattern compiled
struct CompiledRule {
    rule: &'static FieldRule,
    target: Option<Selector>,
    pattern: Option<Regex>,
}

/// Compiles nested selectors and patterns once per page
///
/// A rule whose selector or pattern fails to compile never produces a
/// value.
fn compile_rules(rules: &'static [FieldRule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .map(|rule| CompiledRule {
            rule,
            target: rule.target.and_then(|raw| {
                Selector::parse(raw)
                    .inspect_err(|e| warn!(selector = raw, error = ?e, "invalid target selector"))
                    .ok()
            }),
            pattern: rule.pattern.and_then(|raw| {
                Regex::new(raw)
                    .inspect_err(|e| warn!(pattern = raw, error = %e, "invalid field pattern"))
                    .ok()
            }),
        })
        .collect()
}

fn extract_fields(node: &ElementRef, rules: &[CompiledRule], base: &str) -> Extracted {
    let mut extracted = Extracted::default();
    for compiled in rules {
        if let Some(value) = evaluate(node, compiled, base) {
            extracted.set(compiled.rule.field, value);
        }
    }
    extracted
}

/// Evaluates one rule against a node; `None` means the field is absent
fn evaluate(node: &ElementRef, compiled: &CompiledRule, base: &str) -> Option<String> {
    let rule = compiled.rule;
    let target = match (rule.target, &compiled.target) {
        (None, _) => *node,
        (Some(_), Some(selector)) => node.select(selector).next()?,
        (Some(_), None) => return None,
    };

    let mut value = match rule.extract {
        Extract::ByAttribute(name) => target.value().attr(name)?.to_string(),
        Extract::ByText => target.text().collect::<String>().trim().to_string(),
    };

    match (rule.pattern, &compiled.pattern) {
        (None, _) => {}
        (Some(_), Some(re)) => value = capture_first(re, &value)?,
        (Some(_), None) => return None,
    }

    if rule.field == Field::Url {
        value = resolve_url(base, &value)?;
    }

    (!value.is_empty()).then_some(value)
}

fn capture_first(re: &Regex, value: &str) -> Option<String> {
    re.captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn accept(extracted: Extracted, descriptor: &ContentDescriptor) -> Option<CatalogItem> {
    let complete = |skip: Option<Field>| {
        descriptor
            .fields
            .iter()
            .filter(|rule| Some(rule.field) != skip)
            .all(|rule| extracted.has(rule.field))
    };

    let accepted = match descriptor.acceptance {
        Acceptance::AllFields => complete(None),
        Acceptance::UrlSuffices => extracted.url.is_some(),
        Acceptance::GuidDeferred => complete(Some(Field::Guid)),
    };
    if !accepted {
        return None;
    }

    let name = match descriptor.content_type {
        ContentType::Shows => extracted.name.unwrap_or_else(|| UNKNOWN_SHOW.to_string()),
        _ => extracted.name.unwrap_or_default(),
    };

    Some(CatalogItem {
        url: extracted.url?,
        name,
        guid: extracted.guid,
    })
}

/// Reads a `guid` or `videoGuid` query parameter, case-insensitively
pub fn guid_from_query(url: &str) -> Option<String> {
    GUID_QUERY_RE
        .captures(url)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_string())
}
