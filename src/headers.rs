use http::{HeaderMap, HeaderName};
use itertools::Either;
use std::iter::empty;

/// Get the value of a list valued header, with multiple header lines joined by `,`
///
/// Lines that are not visible ascii are skipped, `None` is returned when no usable line is present.
///
/// # Example
///
/// ```rust
/// # use http::{HeaderMap, HeaderName, HeaderValue};
/// # use x_forwarded::headers::*;
/// let mut headers = HeaderMap::new();
/// headers.append("x-forwarded-for", HeaderValue::from_static("10.10.10.10"));
/// headers.append("x-forwarded-for", HeaderValue::from_static("10.10.10.20"));
/// assert_eq!(
///    Some("10.10.10.10,10.10.10.20".to_string()),
///    combined_header_value(&headers, &HeaderName::from_static("x-forwarded-for"))
/// );
/// ```
pub fn combined_header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let mut lines = headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .peekable();
    lines.peek()?;
    Some(itertools::join(lines, ","))
}

/// Get the list of hops from an `x-forwarded-for` style header
///
/// Hops are ordered from the original client to the proxy nearest to us. Whitespace around
/// hops is trimmed, empty hops in the middle of the list are kept as empty strings while
/// trailing empty hops are dropped.
///
/// # Example
///
/// ```rust
/// # use x_forwarded::headers::*;
/// assert_eq!(
///    vec!["140.211.11.130", "proxy1", "", "proxy2"],
///    extract_forwarded_for("140.211.11.130,\tproxy1, , proxy2 ,").collect::<Vec<_>>()
/// );
/// ```
pub fn extract_forwarded_for(header_value: &str) -> impl DoubleEndedIterator<Item = &str> + '_ {
    let header_value = header_value.trim_end_matches(|c: char| c == ',' || c.is_whitespace());
    if header_value.trim().is_empty() {
        Either::Left(empty())
    } else {
        Either::Right(header_value.split(',').map(str::trim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    const XFF: HeaderName = HeaderName::from_static("x-forwarded-for");

    #[test]
    fn test_combined_header_value_absent() {
        assert_eq!(combined_header_value(&HeaderMap::new(), &XFF), None);
    }

    #[test]
    fn test_combined_header_value_skips_opaque_lines() {
        let mut headers = HeaderMap::new();
        headers.append(&XFF, HeaderValue::from_bytes(b"\xfa\xfb").unwrap());
        assert_eq!(combined_header_value(&headers, &XFF), None);

        headers.append(&XFF, HeaderValue::from_static("140.211.11.130"));
        assert_eq!(
            combined_header_value(&headers, &XFF).as_deref(),
            Some("140.211.11.130")
        );
    }

    #[test]
    fn test_extract_blank() {
        assert_eq!(extract_forwarded_for("").count(), 0);
        assert_eq!(extract_forwarded_for(" \t\n").count(), 0);
        assert_eq!(extract_forwarded_for(", ,").count(), 0);
    }

    #[test]
    fn test_extract_keeps_leading_and_interior_empty_hops() {
        assert_eq!(
            extract_forwarded_for(", a,,b").collect::<Vec<_>>(),
            vec!["", "a", "", "b"]
        );
    }

    #[test]
    fn test_extract_newlines() {
        assert_eq!(
            extract_forwarded_for("a,\r\n b").collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_extract_reversed() {
        assert_eq!(
            extract_forwarded_for("client, proxy1, proxy2")
                .rev()
                .collect::<Vec<_>>(),
            vec!["proxy2", "proxy1", "client"]
        );
    }
}
