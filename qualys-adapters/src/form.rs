//! Form encoding for Qualys `fo` endpoints.

use std::fmt;

/// Ordered key/value pairs destined for a form-encoded body.
///
/// Keys keep the position of their first insertion; pushing an existing key
/// replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormBody {
    pairs: Vec<(String, Option<String>)>,
}

impl FormBody {
    /// Creates an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. `None` and empty values are kept here but
    /// dropped by [`FormBody::encode`].
    pub fn push<V: fmt::Display>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        let key = key.into();
        let value = value.map(|v| v.to_string());
        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Number of keys, including those that will be dropped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` when no keys were pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Renders the body.
    #[must_use]
    pub fn encode(&self) -> String {
        encode_form(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref())))
    }
}

/// Percent-encodes `pairs` as `key=value` joined by `&`, in iteration order.
///
/// Pairs whose value is `None` or empty are omitted. Values are encoded
/// verbatim: booleans must already be converted with [`bool_token`].
pub fn encode_form<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| match value {
            Some(value) if !value.is_empty() => Some(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Token the Qualys API expects for boolean switches.
#[must_use]
pub const fn bool_token(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
        encoded
            .split('&')
            .map(|pair| {
                let (key, value) = pair.split_once('=').expect("key=value");
                (
                    urlencoding::decode(key).unwrap().into_owned(),
                    urlencoding::decode(value).unwrap().into_owned(),
                )
            })
            .collect()
    }

    #[test]
    fn detection_listing_body() {
        let mut body = FormBody::new();
        body.push("action", Some("list"))
            .push("ips", Some("10.0.0.1,10.0.0.2"))
            .push("ag_ids", None::<&str>)
            .push("severities", Some("4,5"))
            .push("truncation_limit", Some(100))
            .push("show_igs", Some(bool_token(false)))
            .push("show_epss", Some(bool_token(false)));

        assert_eq!(
            body.encode(),
            "action=list&ips=10.0.0.1%2C10.0.0.2&severities=4%2C5&truncation_limit=100&show_igs=0&show_epss=0"
        );
    }

    #[test]
    fn absent_and_empty_values_are_dropped() {
        let encoded = encode_form([
            ("a", Some("1")),
            ("b", None),
            ("c", Some("")),
            ("d", Some("0")),
        ]);
        assert_eq!(encoded, "a=1&d=0");
        assert!(!encoded.contains("b="));
        assert!(!encoded.contains("c="));
    }

    #[test]
    fn nothing_to_encode_yields_empty_string() {
        assert_eq!(encode_form([("a", None), ("b", Some(""))]), "");
    }

    #[test]
    fn reserved_characters_round_trip() {
        let values = [
            ("scan title", "Weekly & \"external\" = 100%"),
            ("ip", "10.0.0.0/24,192.168.1.1-192.168.1.9"),
            ("query", "a+b?c#d;e:f@g$h!i'j(k)l*m~n"),
        ];
        let encoded = encode_form(values.iter().map(|(k, v)| (*k, Some(*v))));

        for reserved in [' ', '&', '"', '=', '/', ',', '+', '?', '#', ';', ':', '@', '$'] {
            assert!(
                !encoded.split(['&', '=']).any(|part| part.contains(reserved)),
                "`{reserved}` left unencoded in {encoded}"
            );
        }
        for (offset, _) in encoded.match_indices('%') {
            let escape = &encoded[offset + 1..offset + 3];
            assert!(
                escape.chars().all(|c| c.is_ascii_hexdigit()),
                "bare `%` at {offset} in {encoded}"
            );
        }
        assert!(encoded.contains("100%25"));

        let decoded = decode_pairs(&encoded);
        let expected: Vec<_> = values
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn repeated_key_keeps_first_position() {
        let mut body = FormBody::new();
        body.push("action", Some("list"))
            .push("ids", Some("1"))
            .push("action", Some("fetch"));
        assert_eq!(body.encode(), "action=fetch&ids=1");
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn boolean_tokens() {
        assert_eq!(bool_token(true), "1");
        assert_eq!(bool_token(false), "0");
    }
}
