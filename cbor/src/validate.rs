//! Thin wrappers used by domain decoders to express canonical framing
//! compactly, grounded on the style of the certificate/array decoders in
//! the domain binding layer: validate the shape, then let the caller read
//! the fields.

use std::fmt::Display;

use crate::error::{CborError, Result};
use crate::reader::Reader;

pub fn validate_array_of_n_elements(name: &str, reader: &mut Reader, n: u64) -> Result<()> {
    let len = reader.read_start_array().map_err(|e| {
        CborError::InvalidCborArraySize(format!("{name}: expected array of {n} elements: {e}"))
    })?;

    if len != n as i64 {
        return Err(CborError::InvalidCborArraySize(format!(
            "{name}: expected array of {n} elements, got {len}"
        )));
    }

    Ok(())
}

pub fn validate_end_array(name: &str, reader: &mut Reader) -> Result<()> {
    reader
        .read_end_array()
        .map_err(|e| CborError::decoding(format!("{name}: {e}")))
}

pub fn validate_end_map(name: &str, reader: &mut Reader) -> Result<()> {
    reader
        .read_end_map()
        .map_err(|e| CborError::decoding(format!("{name}: {e}")))
}

pub fn validate_enum_value<F>(
    name: &str,
    field: &str,
    reader: &mut Reader,
    expected: u64,
    to_string: F,
) -> Result<u64>
where
    F: Fn(u64) -> String,
{
    let got = reader.read_uint()?;
    if got != expected {
        return Err(CborError::decoding(format!(
            "{name}.{field}: expected discriminant {expected} ({}), got {} ({})",
            to_string(expected),
            got,
            to_string(got)
        )));
    }
    Ok(got)
}

pub fn validate_uint_in_range(
    name: &str,
    field: &str,
    reader: &mut Reader,
    lo: u64,
    hi: u64,
) -> Result<u64> {
    let value = reader.read_uint()?;
    if value < lo || value > hi {
        return Err(CborError::decoding(format!(
            "{name}.{field}: value {value} out of range [{lo}, {hi}]"
        )));
    }
    Ok(value)
}

/// Convenience used by discriminant errors outside the enum-value helper
/// above, e.g. when the discriminant was already read via a peek-by-clone.
pub fn invalid_discriminant(name: &str, field: &str, got: impl Display) -> CborError {
    CborError::decoding(format!("{name}.{field}: invalid discriminant {got}"))
}
