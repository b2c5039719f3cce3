use lazy_static::lazy_static;
use regex::Regex;
use url::form_urlencoded;

/// Streaming service a track id was recognised for.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Source {
    Deezer,
    Qobuz,
    Tidal,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Source::Deezer => "deezer",
            Source::Qobuz => "qobuz",
            Source::Tidal => "tidal",
        };
        f.write_str(name)
    }
}

/// Best-effort identifier derived from a download description.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum TrackId {
    Found(String),
    Unknown,
}

impl TrackId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TrackId::Found(id) => Some(id),
            TrackId::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, TrackId::Found(_))
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackId::Found(id) => f.write_str(id),
            TrackId::Unknown => f.write_str("Unknown"),
        }
    }
}

struct Rule {
    source: Source,
    extract: fn(&str) -> Option<String>,
}

/// Tried in order, first match wins.
const RULES: &[Rule] = &[
    Rule {
        source: Source::Deezer,
        extract: deezer,
    },
    Rule {
        source: Source::Qobuz,
        extract: qobuz,
    },
    Rule {
        source: Source::Tidal,
        extract: tidal,
    },
];

fn deezer(desc: &str) -> Option<String> {
    lazy_static! {
        static ref DEEZER_PATTERN: Regex = Regex::new(r"media/.*/(\d+)").unwrap();
    }
    DEEZER_PATTERN
        .captures(desc)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn qobuz(desc: &str) -> Option<String> {
    let without_fragment = desc.split('#').next().unwrap_or_default();
    let (_, query) = without_fragment.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "eid" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn tidal(desc: &str) -> Option<String> {
    lazy_static! {
        static ref TIDAL_PATTERN: Regex = Regex::new(r"tidal\.com/.*?/(\d+)").unwrap();
    }
    TIDAL_PATTERN
        .captures(desc)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns the source and id of the first rule matching `desc`.
pub fn identify(desc: &str) -> Option<(Source, String)> {
    RULES
        .iter()
        .find_map(|rule| (rule.extract)(desc).map(|id| (rule.source, id)))
}

/// Derives a track id from a free-form description (usually a url).
///
/// Any string that happens to have one of the recognised shapes is
/// classified, there is no check that the digits are a plausible id.
pub fn extract_track_id(desc: &str) -> TrackId {
    match identify(desc) {
        Some((_, id)) => TrackId::Found(id),
        None => TrackId::Unknown,
    }
}
