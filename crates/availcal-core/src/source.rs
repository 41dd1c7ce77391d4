//! Calendar sources and the fixed registry of them.
//!
//! A source is one external booking platform publishing an iCalendar export.
//! Export URLs usually carry an access token in the query string, so the
//! full endpoint is never part of `Display` output; use
//! [`CalendarSource::redacted_endpoint`] in logs.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use url::Url;

/// Errors raised while building sources or the registry.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A source was declared without a name.
    #[error("calendar source name must not be empty")]
    EmptyName,

    /// Two sources share a name.
    #[error("duplicate calendar source name: {0}")]
    DuplicateName(String),

    /// The endpoint is not a valid URL.
    #[error("invalid URL for calendar source {name}: {source}")]
    InvalidUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },

    /// The endpoint scheme cannot be fetched over HTTP.
    #[error("unsupported URL scheme {scheme:?} for calendar source {name}")]
    UnsupportedScheme { name: String, scheme: String },
}

/// One external calendar platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalendarSource {
    name: String,
    endpoint: Url,
}

impl CalendarSource {
    /// Creates a source from an already parsed endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the scheme is not HTTP(S).
    pub fn new(name: impl Into<String>, endpoint: Url) -> Result<Self, SourceError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(SourceError::EmptyName);
        }
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SourceError::UnsupportedScheme {
                name,
                scheme: endpoint.scheme().to_string(),
            });
        }
        Ok(Self { name, endpoint })
    }

    /// Parses a source from a URL string.
    ///
    /// `webcal://` subscription links are fetched over `https://`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, the URL is invalid, or the
    /// scheme is not HTTP(S)/webcal.
    pub fn parse(name: impl Into<String>, url: &str) -> Result<Self, SourceError> {
        let name = name.into();
        let url = url.trim();
        let url = match url.get(..9) {
            Some(prefix) if prefix.eq_ignore_ascii_case("webcal://") => {
                format!("https://{}", &url[9..])
            }
            _ => url.to_string(),
        };
        let endpoint = Url::parse(&url).map_err(|source| SourceError::InvalidUrl {
            name: name.clone(),
            source,
        })?;
        Self::new(name, endpoint)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint without query string or fragment, safe for logs.
    pub fn redacted_endpoint(&self) -> String {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Credentials embedded in the URL are secrets too.
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.to_string()
    }
}

impl fmt::Display for CalendarSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The fixed set of sources aggregated on every request.
///
/// Built once at startup; there is no runtime registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<CalendarSource>,
}

impl SourceRegistry {
    /// Creates a registry, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::DuplicateName`] if two sources share a name.
    pub fn new(sources: Vec<CalendarSource>) -> Result<Self, SourceError> {
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name()) {
                return Err(SourceError::DuplicateName(source.name().to_string()));
            }
        }
        Ok(Self { sources })
    }

    /// Creates a registry with no sources.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CalendarSource> {
        self.sources.iter()
    }

    /// Looks up a source by name.
    pub fn get(&self, name: &str) -> Option<&CalendarSource> {
        self.sources.iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<'a> IntoIterator for &'a SourceRegistry {
    type Item = &'a CalendarSource;
    type IntoIter = std::slice::Iter<'a, CalendarSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_https_source() {
        let source = CalendarSource::parse(
            "Booking.com",
            "https://ical.booking.com/v1/export?t=secret-token",
        )
        .unwrap();

        assert_eq!(source.name(), "Booking.com");
        assert_eq!(source.endpoint().host_str(), Some("ical.booking.com"));
        assert_eq!(source.to_string(), "Booking.com");
    }

    #[test]
    fn webcal_is_fetched_over_https() {
        let source =
            CalendarSource::parse("Airbnb", "webcal://www.airbnb.com/calendar/ical/1.ics").unwrap();
        assert_eq!(source.endpoint().scheme(), "https");
        assert_eq!(source.endpoint().path(), "/calendar/ical/1.ics");

        let source = CalendarSource::parse("Vrbo", "WEBCAL://example.com/a.ics").unwrap();
        assert_eq!(source.endpoint().scheme(), "https");
    }

    #[test]
    fn redacted_endpoint_hides_secrets() {
        let source = CalendarSource::parse(
            "Airbnb",
            "https://user:pw@www.airbnb.com/calendar/ical/1.ics?s=abcdef#frag",
        )
        .unwrap();

        let redacted = source.redacted_endpoint();
        assert_eq!(redacted, "https://www.airbnb.com/calendar/ical/1.ics");
        assert!(!redacted.contains("abcdef"));
        assert!(!redacted.contains("pw"));
    }

    #[test]
    fn rejects_bad_sources() {
        assert!(matches!(
            CalendarSource::parse("  ", "https://example.com/a.ics"),
            Err(SourceError::EmptyName)
        ));
        assert!(matches!(
            CalendarSource::parse("x", "not a url"),
            Err(SourceError::InvalidUrl { .. })
        ));
        assert!(matches!(
            CalendarSource::parse("x", "ftp://example.com/a.ics"),
            Err(SourceError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let a = CalendarSource::parse("Airbnb", "https://a.example.com/1.ics").unwrap();
        let b = CalendarSource::parse("Airbnb", "https://b.example.com/2.ics").unwrap();

        let err = SourceRegistry::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, SourceError::DuplicateName(ref n) if n == "Airbnb"));
    }

    #[test]
    fn registry_lookup_and_iteration() {
        let registry = SourceRegistry::new(vec![
            CalendarSource::parse("Booking.com", "https://a.example.com/1.ics").unwrap(),
            CalendarSource::parse("Airbnb", "https://b.example.com/2.ics").unwrap(),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("Airbnb").is_some());
        assert!(registry.get("Vrbo").is_none());

        let names: Vec<&str> = registry.iter().map(CalendarSource::name).collect();
        assert_eq!(names, vec!["Booking.com", "Airbnb"]);
    }

    #[test]
    fn empty_registry() {
        let registry = SourceRegistry::empty();
        assert!(registry.is_empty());
        assert_eq!((&registry).into_iter().count(), 0);
    }
}
