//! Value parsers for command line arguments

use ground_model::Id;
use serde_json::Value;
use std::collections::BTreeMap;

/// `KEY=VALUE`, where VALUE is read as JSON when it parses and as a plain string otherwise
pub fn parse_tag(s: &str) -> Result<(String, Value), String> {
    let (key, value) = parse_pair(s)?;
    let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
    Ok((key, value))
}

/// `KEY=VALUE` with a non-empty key
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// `FROM,TO` node version ids
pub fn parse_id_pair(s: &str) -> Result<(Id, Id), String> {
    let (from, to) = s
        .split_once(',')
        .ok_or_else(|| format!("expected FROM,TO, got '{}'", s))?;
    let parse = |id: &str| {
        id.trim()
            .parse::<Id>()
            .map_err(|e| format!("invalid id '{}': {}", id, e))
    };
    Ok((parse(from)?, parse(to)?))
}

/// Collect repeated `KEY=VALUE` arguments; `None` when there were none
pub fn into_map<V>(pairs: Vec<(String, V)>) -> Option<BTreeMap<String, V>> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("owner=etl").unwrap(), ("owner".to_string(), json!("etl")));
        assert_eq!(parse_tag("rows=42").unwrap(), ("rows".to_string(), json!(42)));
        assert_eq!(
            parse_tag("cols=[\"a\",\"b\"]").unwrap(),
            ("cols".to_string(), json!(["a", "b"]))
        );
        assert_eq!(parse_tag("empty=").unwrap(), ("empty".to_string(), json!("")));
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=value").is_err());
    }

    #[test]
    fn test_parse_pair_keeps_later_equals_signs() {
        assert_eq!(
            parse_pair("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn test_parse_id_pair() {
        assert_eq!(parse_id_pair("3, 4").unwrap(), (3, 4));
        assert!(parse_id_pair("3").is_err());
        assert!(parse_id_pair("3,x").is_err());
    }

    #[test]
    fn test_into_map() {
        assert!(into_map::<String>(Vec::new()).is_none());
        let map = into_map(vec![("a".to_string(), 1), ("a".to_string(), 2)]).unwrap();
        assert_eq!(map.get("a"), Some(&2));
    }
}
