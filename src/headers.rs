use hyper::header::{HeaderMap, HeaderName, HeaderValue};

use crate::Error;

pub(crate) fn header_name(name: &str) -> Result<HeaderName, Error> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::InvalidHeaderName(name.to_string()))
}

pub(crate) fn header_value(name: &str, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidHeaderValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Validates and inserts every pair into `map`, replacing existing values of
/// the same (case-insensitive) name.
pub(crate) fn extend_headers<I, K, V>(map: &mut HeaderMap, headers: I) -> Result<(), Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (name, value) in headers {
        let (name, value) = (name.as_ref(), value.as_ref());
        map.insert(header_name(name)?, header_value(name, value)?);
    }
    Ok(())
}

pub(crate) fn to_header_map<I, K, V>(headers: I) -> Result<HeaderMap, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = HeaderMap::new();
    extend_headers(&mut map, headers)?;
    Ok(map)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let map = to_header_map([("X-Special", "value")]).expect("valid headers");
        assert_eq!(map.get("x-special").expect("header present"), "value");
        assert_eq!(map.get("X-SPECIAL").expect("header present"), "value");
    }

    #[test]
    fn later_pairs_replace_earlier_ones() {
        let map = to_header_map([("X-Special", "one"), ("x-special", "two")]).expect("valid");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("X-Special").expect("header present"), "two");
    }

    #[test]
    fn invalid_pairs_are_rejected() {
        assert!(matches!(
            to_header_map([("bad header", "value")]),
            Err(Error::InvalidHeaderName(name)) if name == "bad header"
        ));
        assert!(matches!(
            to_header_map([("X-Special", "line\nbreak")]),
            Err(Error::InvalidHeaderValue { name, .. }) if name == "X-Special"
        ));
    }
}
