//! Request URL and query-string construction.

use url::form_urlencoded;

/// A query parameter value that may be absent. Absent parameters are
/// omitted from the query string entirely.
pub type Param = Option<String>;

/// Builds a path with a query string from the given parameters, skipping
/// any whose value is `None`. Returns the bare path when every parameter is
/// absent.
pub fn build(path: &str, params: &[(&str, Param)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;

    for (name, value) in params {
        if let Some(value) = value {
            serializer.append_pair(name, value);
            any = true;
        }
    }

    if any {
        format!("{path}?{}", serializer.finish())
    } else {
        path.to_string()
    }
}

/// Percent-encodes a single value for interpolation into a path, such as
/// the username in `/v1/market/user:{username}.json`.
pub fn escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Formats a boolean the way the API expects it in query strings.
pub fn bool_param(value: Option<bool>) -> Param {
    value.map(|v| if v { "true".to_string() } else { "false".to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_skips_absent_params() {
        let built = build(
            "/v3/market/catalog/collection",
            &[
                ("id", Some("25043".to_string())),
                ("page", None),
            ],
        );
        assert_eq!(built, "/v3/market/catalog/collection?id=25043");
    }

    #[test]
    fn test_build_without_params() {
        let built = build("/v3/market/user/collections", &[]);
        assert_eq!(built, "/v3/market/user/collections");
    }

    #[test]
    fn test_build_encodes_values() {
        let built = build("/v1/discovery/search/search/item", &[("term", Some("wordpress theme".to_string()))]);
        assert_eq!(built, "/v1/discovery/search/search/item?term=wordpress+theme");
    }

    #[test]
    fn test_bool_param() {
        assert_eq!(bool_param(Some(true)).as_deref(), Some("true"));
        assert_eq!(bool_param(Some(false)).as_deref(), Some("false"));
        assert_eq!(bool_param(None), None);
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("collis"), "collis");
        assert_eq!(escape("a/b"), "a%2Fb");
    }
}
