use serde::{Deserialize, Deserializer, Serialize};

/// A tag as upstream may encode it
///
/// Older catalog payloads list tags as plain strings, newer ones as objects
/// with a `name` field. Anything else fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagRepr {
    Plain(String),
    Named { name: String },
}

impl From<TagRepr> for String {
    fn from(tag: TagRepr) -> String {
        match tag {
            TagRepr::Plain(name) | TagRepr::Named { name } => name,
        }
    }
}

/// Flatten tags of either shape into plain names, keeping their order.
///
/// ```rust
/// use datagouv_api::models::{TagRepr, normalize_tags};
///
/// let tags = vec![
///     TagRepr::Plain("climat".into()),
///     TagRepr::Named { name: "meteo".into() },
/// ];
/// assert_eq!(normalize_tags(tags), vec!["climat", "meteo"]);
/// ```
pub fn normalize_tags(tags: Vec<TagRepr>) -> Vec<String> {
    tags.into_iter().map(String::from).collect()
}

/// Serde adapter for tag lists; a missing or null list decodes as empty.
pub(crate) fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = Option::<Vec<TagRepr>>::deserialize(deserializer)?;
    Ok(normalize_tags(tags.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Tagged {
        #[serde(default, deserialize_with = "deserialize_tags")]
        tags: Vec<String>,
    }

    fn decode(value: serde_json::Value) -> Vec<String> {
        serde_json::from_value::<Tagged>(value).unwrap().tags
    }

    #[test]
    fn both_shapes_normalize_identically() {
        let plain = decode(json!({"tags": ["energie", "climat"]}));
        let named = decode(json!({"tags": [{"name": "energie"}, {"name": "climat"}]}));
        assert_eq!(plain, named);
        assert_eq!(plain, vec!["energie", "climat"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = decode(json!({"tags": [{"name": "eau"}, "air"]}));
        let twice = decode(json!({ "tags": once.clone() }));
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_or_null_tags_are_empty() {
        assert!(decode(json!({})).is_empty());
        assert!(decode(json!({"tags": null})).is_empty());
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        let result = serde_json::from_value::<Tagged>(json!({"tags": [42]}));
        assert!(result.is_err());
        let result = serde_json::from_value::<Tagged>(json!({"tags": [{"label": "x"}]}));
        assert!(result.is_err());
    }
}
