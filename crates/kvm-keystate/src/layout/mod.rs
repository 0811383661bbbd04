//! Keyboard layout resources and their decoders.
//!
//! The OS hands us one opaque byte blob per installed layout plus a format
//! tag.  [`LayoutResource`] is the capability every decoder must provide;
//! [`open_resource`] selects the decoder for a tag.  The only table-driven
//! format the host ships today is the `uchr` family, decoded by
//! [`uchr::UchrTableDecoder`].
//!
//! Dead keys are resolved with an explicit [`DeadKeyState`] value threaded
//! through [`LayoutResource::key_at`].  The decoder itself is stateless
//! between calls, so a half-finished dead-key sequence can never leak from
//! one key-map build pass into another.

use thiserror::Error;

use crate::keys::KeySequence;

pub mod fixture;
pub mod uchr;

pub use uchr::UchrTableDecoder;

/// Errors raised while parsing a layout resource's structure.
///
/// These only surface from decoder construction; per-key lookups degrade to
/// "no mapping" instead of failing.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    /// The byte blob is shorter than a structure it claims to contain.
    #[error("layout resource truncated: need {needed} bytes for {context}, got {available}")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    /// The header's format word is not a supported layout format.
    #[error("unsupported layout format: 0x{0:04X}")]
    UnsupportedFormat(u16),

    /// A structural field is inconsistent (offset out of range, impossible
    /// count, no section for the keyboard type).
    #[error("malformed layout resource: {0}")]
    Malformed(String),
}

/// Format tag accompanying raw layout bytes from the OS.
///
/// Selects the decoder in [`open_resource`].  One variant per table format
/// the platform can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutFormat {
    /// Table-driven format with modifier tables, dead-key state records and
    /// character sequences.
    Uchr,
}

/// Transient dead-key state carried between two `key_at` calls.
///
/// Produced when a press opens (or extends) a dead-key sequence; consumed
/// by the next resolution.  Never stored by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadKeyState {
    /// Resource-defined state number, always nonzero.
    pub state: u16,
    /// Ids to emit if the following key does not combine.
    pub base: KeySequence,
}

/// Outcome of resolving one table cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyResolution {
    /// Ids produced by the press, in emission order.  Empty when the cell
    /// is unmapped or the press only opened a dead-key sequence.
    pub emitted: KeySequence,
    /// Dead-key state to thread into the next resolution, if any.
    pub pending: Option<DeadKeyState>,
}

impl KeyResolution {
    /// A resolution producing nothing, the unmapped-cell sentinel.
    pub fn none() -> KeyResolution {
        KeyResolution::default()
    }
}

/// Capability contract every layout-table decoder satisfies.
///
/// A resource failing [`is_valid`](LayoutResource::is_valid) must be
/// rejected before any other call.  Index-taking operations are only
/// defined for indices below the corresponding count; out-of-range values
/// are a caller bug and resolve to the empty sentinel.
pub trait LayoutResource {
    /// True when the decoded structure is internally consistent and usable.
    fn is_valid(&self) -> bool;

    /// Number of modifier combinations the resource maps explicitly.
    fn num_modifier_combinations(&self) -> u32;

    /// Number of shift tables.
    fn num_tables(&self) -> u32;

    /// Number of key positions per table.
    fn num_buttons(&self) -> u16;

    /// Resolves a packed modifier combination to a shift table index.
    ///
    /// Combinations the resource does not list fall back to its default
    /// table; a default outside the table range falls back to table 0.
    fn table_for_modifier(&self, combination: u32) -> u32;

    /// Resolves the cell at (`table`, zero-based key position `button`),
    /// combining with `pending` dead-key state when present.
    fn key_at(&self, table: u32, button: u16, pending: Option<DeadKeyState>) -> KeyResolution;
}

/// Opens a decoder for `bytes` according to the resource's format tag.
///
/// `keyboard_type` selects the resource section for the attached keyboard
/// model.
///
/// # Errors
///
/// Returns [`LayoutError`] when the bytes do not parse as the tagged
/// format.
pub fn open_resource(
    format: LayoutFormat,
    bytes: &[u8],
    keyboard_type: u32,
) -> Result<Box<dyn LayoutResource + '_>, LayoutError> {
    match format {
        LayoutFormat::Uchr => Ok(Box::new(UchrTableDecoder::new(bytes, keyboard_type)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyId;

    #[test]
    fn test_open_resource_selects_uchr_decoder() {
        let bytes = fixture::LayoutBuilder::new()
            .push_table(vec![b'a' as u16, b'b' as u16])
            .build();
        let resource = open_resource(LayoutFormat::Uchr, &bytes, 0).unwrap();
        assert!(resource.is_valid());
        assert_eq!(resource.num_buttons(), 2);
        let res = resource.key_at(0, 0, None);
        assert_eq!(res.emitted, vec![KeyId(b'a' as u32)]);
        assert_eq!(res.pending, None);
    }

    #[test]
    fn test_open_resource_rejects_garbage() {
        let result = open_resource(LayoutFormat::Uchr, &[0u8; 4], 0);
        assert!(matches!(
            result.err(),
            Some(LayoutError::Truncated { .. })
        ));
    }
}
