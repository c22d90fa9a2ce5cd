//! Text form of an asset reference, for debugging and human-edited data.
//!
//! `id={GUID}:SUBHEX,type={GUID},hint={TEXT},loadBehavior=HEX`
//!
//! The hint field exists from version 1, the load behavior from version 2.
//! The hint may contain braces: it ends at the last `}` before
//! `,loadBehavior=`, or at the last `}` of the text in version 1.

use tracing::warn;
use uuid::Uuid;

use super::{binary::clamp_hint, AssetReference, DecodedReference, CURRENT_VERSION, MAX_HINT_LENGTH};
use crate::{AssetId, AssetType, LoadBehavior, TextParseError};

const ID_FIELD: &str = "id=";
const TYPE_FIELD: &str = ",type=";
const HINT_FIELD: &str = ",hint={";
const LOAD_BEHAVIOR_FIELD: &str = ",loadBehavior=";

/// Writes the text form of `reference` at `version`.
pub fn to_text(reference: &AssetReference, version: u32) -> String {
    let version = version.min(CURRENT_VERSION);
    let mut text = format!(
        "{}{}{}{}",
        ID_FIELD, reference.id, TYPE_FIELD, reference.asset_type
    );
    if version > 0 {
        text.push_str(HINT_FIELD);
        text.push_str(&reference.hint);
        text.push('}');
    }
    if version > 1 {
        text.push_str(LOAD_BEHAVIOR_FIELD);
        text.push_str(&format!("{:x}", reference.load_behavior.as_u32()));
    }
    text
}

/// Parses the text form of a reference written at `version`.
///
/// # Errors
///
/// Returns an error describing the first malformed field.
pub fn parse(text: &str, version: u32) -> Result<DecodedReference, TextParseError> {
    let version = version.min(CURRENT_VERSION);

    let mut pos = expect(text, 0, ID_FIELD)?;
    let guid_end = find(text, pos, "}")? + 1;
    let guid = Uuid::parse_str(&text[pos..guid_end])?;
    pos = expect(text, guid_end, ":")?;
    let sub_id_end = find(text, pos, TYPE_FIELD)?;
    let sub_id = text[pos..sub_id_end].trim();
    let sub_id = u32::from_str_radix(sub_id, 16)
        .map_err(|_err| TextParseError::InvalidSubId(sub_id.to_owned()))?;
    let id = AssetId::new(guid, sub_id);

    pos = sub_id_end + TYPE_FIELD.len();
    let type_end = find(text, pos, "}")? + 1;
    let asset_type = AssetType::new(Uuid::parse_str(&text[pos..type_end])?);
    pos = type_end;

    let mut decoded = DecodedReference {
        id,
        asset_type,
        hint: None,
        load_behavior: None,
        hint_truncated: false,
    };

    if version > 0 {
        pos = expect(text, pos, HINT_FIELD)?;
        let hint_end = if version > 1 {
            let field = text[pos..]
                .rfind(LOAD_BEHAVIOR_FIELD)
                .map(|offset| pos + offset)
                .ok_or(TextParseError::MissingLoadBehavior)?;
            text[pos..field]
                .rfind('}')
                .map(|offset| pos + offset)
                .ok_or(TextParseError::MissingDelimiter {
                    expected: "}",
                    offset: field,
                })?
        } else {
            text[pos..]
                .rfind('}')
                .map(|offset| pos + offset)
                .ok_or(TextParseError::MissingDelimiter {
                    expected: "}",
                    offset: text.len(),
                })?
        };

        let (hint, truncated) = clamp_hint(text[pos..hint_end].as_bytes());
        if truncated {
            warn!(
                "Hint of asset {} is {} bytes long, truncated to {} bytes",
                id,
                hint_end - pos,
                MAX_HINT_LENGTH
            );
        }
        decoded.hint = Some(hint);
        decoded.hint_truncated = truncated;
        pos = hint_end + 1;
    }

    if version > 1 {
        pos = expect(text, pos, LOAD_BEHAVIOR_FIELD)?;
        // The load behavior is the last field.
        if let Some(offset) = text[pos..].find(',') {
            return Err(TextParseError::MissingDelimiter {
                expected: "end of text",
                offset: pos + offset,
            });
        }
        let value = text[pos..].trim();
        let load_behavior = u32::from_str_radix(value, 16)
            .ok()
            .and_then(LoadBehavior::from_u32)
            .ok_or_else(|| TextParseError::InvalidLoadBehavior(value.to_owned()))?;
        decoded.load_behavior = Some(load_behavior);
    }

    Ok(decoded)
}

fn expect(text: &str, offset: usize, token: &'static str) -> Result<usize, TextParseError> {
    if text[offset..].starts_with(token) {
        Ok(offset + token.len())
    } else {
        Err(TextParseError::MissingDelimiter {
            expected: token,
            offset,
        })
    }
}

fn find(text: &str, offset: usize, token: &'static str) -> Result<usize, TextParseError> {
    text[offset..]
        .find(token)
        .map(|found| offset + found)
        .ok_or(TextParseError::MissingDelimiter {
            expected: token,
            offset,
        })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{parse, to_text};
    use crate::{
        serializer::{AssetReference, MAX_HINT_LENGTH},
        AssetId, AssetType, LoadBehavior, TextParseError,
    };

    fn reference(hint: &str) -> AssetReference {
        AssetReference {
            id: AssetId::new(Uuid::from_u128(0xabcd), 0x1f),
            asset_type: AssetType::from_u128(0x10),
            hint: hint.to_owned(),
            load_behavior: LoadBehavior::PreLoad,
        }
    }

    #[test]
    fn text_layout_per_version() {
        let reference = reference("objects/box.geom");
        assert_eq!(
            to_text(&reference, 0),
            "id={00000000-0000-0000-0000-00000000ABCD}:1f,type={00000000-0000-0000-0000-000000000010}"
        );
        assert_eq!(
            to_text(&reference, 2),
            "id={00000000-0000-0000-0000-00000000ABCD}:1f,type={00000000-0000-0000-0000-000000000010},hint={objects/box.geom},loadBehavior=0"
        );
    }

    #[test]
    fn parse_recovers_fields() {
        let original = reference("objects/box.geom");
        let decoded = parse(&to_text(&original, 2), 2).unwrap();
        assert_eq!(decoded.id, original.id);
        assert_eq!(decoded.asset_type, original.asset_type);
        assert_eq!(decoded.hint.as_deref(), Some("objects/box.geom"));
        assert_eq!(decoded.load_behavior, Some(LoadBehavior::PreLoad));

        let v0 = parse(&to_text(&original, 2), 0).unwrap();
        assert_eq!(v0.hint, None);
        assert_eq!(v0.load_behavior, None);
    }

    #[test]
    fn hint_may_contain_braces() {
        let original = reference("odd/{name}/file}.bin");
        for version in [1, 2] {
            let decoded = parse(&to_text(&original, version), version).unwrap();
            assert_eq!(decoded.hint.as_deref(), Some("odd/{name}/file}.bin"));
        }
    }

    #[test]
    fn missing_load_behavior_is_an_error() {
        let text = to_text(&reference("a"), 1);
        assert!(matches!(
            parse(&text, 2),
            Err(TextParseError::MissingLoadBehavior)
        ));
        assert!(parse(&text, 1).is_ok());
    }

    #[test]
    fn malformed_text_is_an_error() {
        let valid = to_text(&reference("a"), 2);
        let inputs = [
            String::new(),
            "garbage".to_owned(),
            valid.replace("id=", "ident="),
            valid.replace(":1f", ":zz"),
            valid.replace(",type=", ";type="),
            valid.replace("ABCD}", "ABCD"),
            valid.replace("0000-000000000010", "0000-00000000001X"),
            valid.replace("loadBehavior=0", "loadBehavior=9"),
            valid.replace("loadBehavior=0", "loadBehavior="),
            valid.replace(",hint={", ",hint="),
        ];
        for input in &inputs {
            assert!(parse(input, 2).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn trailing_fields_are_rejected() {
        let valid = to_text(&reference("a"), 2);
        let text = format!("{},junk=zzz", valid);
        assert!(matches!(
            parse(&text, 2),
            Err(TextParseError::MissingDelimiter {
                expected: "end of text",
                offset,
            }) if offset == valid.len()
        ));
    }

    #[test]
    fn oversized_hint_is_truncated() {
        let original = reference(&"x".repeat(MAX_HINT_LENGTH + 10));
        let decoded = parse(&to_text(&original, 2), 2).unwrap();
        assert!(decoded.hint_truncated);
        assert_eq!(decoded.hint.unwrap().len(), MAX_HINT_LENGTH);
        assert_eq!(decoded.load_behavior, Some(LoadBehavior::PreLoad));
    }
}
