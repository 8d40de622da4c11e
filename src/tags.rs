//! Tag codec.
//!
//! Tags are persisted in a single TEXT column as a comma separated list. The
//! codec is the only place that knows about that representation so a future
//! move to a native array column stays local to this module.
//!
//! Tags containing `,` cannot be represented; they are rejected by payload
//! validation and would be silently split on decode.

/// Separator used inside the persisted tag column.
pub const TAG_DELIMITER: &str = ",";

/// Joins `tags` into the stored representation. `None` and empty lists both
/// encode to `""`.
pub fn encode_tags(tags: Option<&[String]>) -> String {
    tags.map(|tags| tags.join(TAG_DELIMITER)).unwrap_or_default()
}

/// Splits the stored representation back into an ordered tag list.
///
/// `None` and `""` decode to an empty list. Any other input keeps every
/// segment as-is, including empty ones, so `decode_tags(encode_tags(t)) == t`
/// for every list whose tags contain no delimiter.
pub fn decode_tags(raw: Option<&str>) -> Vec<String> {
    match raw {
        None | Some("") => Vec::new(),
        Some(raw) => raw.split(TAG_DELIMITER).map(str::to_owned).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn encode_absent_or_empty_is_empty_string() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(encode_tags(None), "");
        assert_eq!(encode_tags(Some(empty.as_slice())), "");
    }

    #[test]
    fn encode_preserves_order() {
        let tags = strings(&["react", "beginner", "css"]);
        assert_eq!(encode_tags(Some(tags.as_slice())), "react,beginner,css");
    }

    #[test]
    fn decode_empty_is_empty_list() {
        assert!(decode_tags(None).is_empty());
        assert!(decode_tags(Some("")).is_empty());
    }

    #[test]
    fn decode_keeps_segments_untrimmed() {
        assert_eq!(decode_tags(Some("a, b,,c")), vec!["a", " b", "", "c"]);
    }

    #[test]
    fn tag_lists_survive_the_codec() {
        let cases = [
            strings(&[]),
            strings(&["solo"]),
            strings(&["advanced", "javascript"]),
            strings(&["with space", "ünïcode", "x"]),
        ];
        for tags in cases {
            let encoded = encode_tags(Some(tags.as_slice()));
            assert_eq!(decode_tags(Some(&encoded)), tags, "encoded as {encoded:?}");
        }
    }

    #[test]
    fn delimiter_inside_a_tag_is_split_on_decode() {
        let encoded = encode_tags(Some(strings(&["a,b"]).as_slice()));
        assert_eq!(decode_tags(Some(&encoded)), vec!["a", "b"]);
    }
}
