//! Binary form of an asset reference.
//!
//! ```markdown
//! | guid (16 bytes) | sub id (u32) | type guid (16 bytes) |    version 0
//! | hint length (u64) | hint (utf-8 bytes) |                 version > 0
//! | load behavior (u32) |                                    version > 1
//! ```
//!
//! Integers are written in the requested byte order, guids as raw bytes.

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use tracing::warn;
use uuid::Uuid;

use super::{AssetReference, DecodedReference, Endianness, CURRENT_VERSION, MAX_HINT_LENGTH};
use crate::{AssetId, AssetType, DecodeError, LoadBehavior};

const GUID_SIZE: usize = 16;
const FIXED_SIZE: usize = GUID_SIZE + 4 + GUID_SIZE;
const HINT_LENGTH_SIZE: usize = 8;
const LOAD_BEHAVIOR_SIZE: usize = 4;

/// Encodes `reference` at the current version.
pub fn encode(reference: &AssetReference, endianness: Endianness) -> Vec<u8> {
    match endianness {
        Endianness::Little => encode_with::<LittleEndian>(reference),
        Endianness::Big => encode_with::<BigEndian>(reference),
    }
}

fn encode_with<E: ByteOrder>(reference: &AssetReference) -> Vec<u8> {
    let hint = reference.hint.as_bytes();
    let mut output =
        Vec::with_capacity(FIXED_SIZE + HINT_LENGTH_SIZE + hint.len() + LOAD_BEHAVIOR_SIZE);

    let mut word = [0_u8; 4];
    let mut long = [0_u8; 8];

    output.extend_from_slice(reference.id.guid().as_bytes());
    E::write_u32(&mut word, reference.id.sub_id());
    output.extend_from_slice(&word);
    output.extend_from_slice(reference.asset_type.guid().as_bytes());

    E::write_u64(&mut long, hint.len() as u64);
    output.extend_from_slice(&long);
    output.extend_from_slice(hint);

    E::write_u32(&mut word, reference.load_behavior.as_u32());
    output.extend_from_slice(&word);

    output
}

/// Decodes a reference written at `version`.
///
/// Versions above the current one decode as the current one. Bytes following
/// the fields of `version` are ignored.
///
/// # Errors
///
/// Fails without reading anything if `data` is shorter than `version`
/// requires, or if the load behavior value is unknown.
pub fn decode(
    data: &[u8],
    version: u32,
    endianness: Endianness,
) -> Result<DecodedReference, DecodeError> {
    match endianness {
        Endianness::Little => decode_with::<LittleEndian>(data, version),
        Endianness::Big => decode_with::<BigEndian>(data, version),
    }
}

fn decode_with<E: ByteOrder>(data: &[u8], version: u32) -> Result<DecodedReference, DecodeError> {
    let version = version.min(CURRENT_VERSION);
    let required = required_size::<E>(data, version);
    if data.len() < required {
        return Err(DecodeError::StreamTooShort {
            version,
            required,
            available: data.len(),
        });
    }

    let mut reader = data;
    let id = AssetId::new(read_guid(&mut reader), reader.read_u32::<E>()?);
    let asset_type = AssetType::new(read_guid(&mut reader));

    let mut decoded = DecodedReference {
        id,
        asset_type,
        hint: None,
        load_behavior: None,
        hint_truncated: false,
    };

    if version > 0 {
        // Lossless: the length was checked against the stream size above.
        let length = reader.read_u64::<E>()? as usize;
        let (raw, rest) = reader.split_at(length);
        reader = rest;

        let (hint, truncated) = clamp_hint(raw);
        if truncated {
            warn!(
                "Hint of asset {} is {} bytes long, truncated to {} bytes",
                id, length, MAX_HINT_LENGTH
            );
        }
        decoded.hint = Some(hint);
        decoded.hint_truncated = truncated;
    }

    if version > 1 {
        let value = reader.read_u32::<E>()?;
        let load_behavior =
            LoadBehavior::from_u32(value).ok_or(DecodeError::InvalidLoadBehavior(value))?;
        decoded.load_behavior = Some(load_behavior);
    }

    Ok(decoded)
}

fn required_size<E: ByteOrder>(data: &[u8], version: u32) -> usize {
    if version == 0 {
        return FIXED_SIZE;
    }
    let header = FIXED_SIZE + HINT_LENGTH_SIZE;
    if data.len() < header {
        return header;
    }
    let hint_length =
        usize::try_from(E::read_u64(&data[FIXED_SIZE..header])).unwrap_or(usize::MAX);
    let trailer = if version > 1 { LOAD_BEHAVIOR_SIZE } else { 0 };
    header.saturating_add(hint_length).saturating_add(trailer)
}

fn read_guid(reader: &mut &[u8]) -> Uuid {
    let (guid, rest) = reader.split_at(GUID_SIZE);
    *reader = rest;
    let mut bytes = [0_u8; GUID_SIZE];
    bytes.copy_from_slice(guid);
    Uuid::from_bytes(bytes)
}

/// Keeps at most [`MAX_HINT_LENGTH`] bytes of a hint, cut on a character
/// boundary.
pub(super) fn clamp_hint(raw: &[u8]) -> (String, bool) {
    if raw.len() <= MAX_HINT_LENGTH {
        return (String::from_utf8_lossy(raw).into_owned(), false);
    }
    let kept = &raw[..MAX_HINT_LENGTH];
    let hint = match std::str::from_utf8(kept) {
        Ok(hint) => hint.to_owned(),
        Err(err) if err.error_len().is_none() => {
            String::from_utf8_lossy(&kept[..err.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(kept).into_owned(),
    };
    (hint, true)
}
