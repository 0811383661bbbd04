//! Decoder for the table-driven `uchr` layout resource format.
//!
//! Resource structure (all integers little-endian, offsets from the start
//! of the resource unless noted):
//!
//! ```text
//! header:     [format:2][version:2][feature_info_off:4][type_count:4]
//!             type_count × type header
//! type hdr:   [first:4][last:4][modifiers_off:4][char_index_off:4]
//!             [state_records_off:4][terminators_off:4][sequences_off:4]
//! modifiers:  [format:2][default_table:2][count:4][table_num:1 × count]
//! char index: [format:2][table_size:2][table_count:4][table_off:4 × count]
//! table:      [cell:2 × table_size]
//! state recs: [format:2][count:2][record_off:4 × count]
//! record:     [zero_char:2][zero_next:2][entry_count:2][entry_format:2]
//!             entry_count × [cur_state:2][char_data:2][next_state:2]
//! terminators:[format:2][count:2][char:2 × count]      (char i → state i+1)
//! sequences:  [format:2][count:2][end_off:2 × count+1][data:2 × n]
//!             (offsets relative to the start of this block)
//! ```
//!
//! A table cell either names a character directly, points at a character
//! sequence, or points at a dead-key state record.  State records drive the
//! dead-key machine: pressing the key at state zero may enter a nonzero
//! state, and entries map (current state → output or deeper state) for the
//! keys that combine.  The walk itself is in
//! [`key_at`](UchrTableDecoder::key_at); the decoder holds no mutable
//! state.

use crate::keys::{KeyId, KeySequence};
use crate::layout::{DeadKeyState, KeyResolution, LayoutError, LayoutResource};

/// Header format word this decoder accepts.
pub const UCHR_HEADER_FORMAT: u16 = 0x1002;

/// Top-two-bit test extracting a cell's kind.
pub const CELL_TEST_MASK: u16 = 0xC000;
/// Cell kind: index of a dead-key state record.
pub const CELL_STATE_MASK: u16 = 0x4000;
/// Cell kind: index into the character sequence data.
pub const CELL_SEQUENCE_MASK: u16 = 0x8000;
/// Low bits carrying the index for either indexed kind.
pub const CELL_INDEX_MASK: u16 = 0x3FFF;

/// State record entry layout this decoder accepts.
pub const STATE_ENTRY_FORMAT: u16 = 0x0001;

/// Size of one keyboard-type header in the resource header.
pub const TYPE_HEADER_SIZE: usize = 28;

// ── Decoder ───────────────────────────────────────────────────────────────────

/// Borrowing decoder over one `uchr` resource blob.
///
/// Construction parses and bounds-checks every structure the resource
/// declares; afterwards lookups never fail, they degrade to the empty
/// resolution.  The decoder lives only for the duration of one key-map
/// build.
#[derive(Debug)]
pub struct UchrTableDecoder<'a> {
    bytes: &'a [u8],
    default_table: u16,
    modifier_count: u32,
    modifier_map_at: usize,
    table_size: u16,
    table_count: u32,
    table_offsets_at: usize,
    state_records: Option<StateRecordsIndex>,
    terminators: Option<TerminatorsIndex>,
    sequences: Option<SequenceDataIndex>,
}

#[derive(Debug)]
struct StateRecordsIndex {
    count: u16,
    offsets_at: usize,
}

#[derive(Debug)]
struct TerminatorsIndex {
    count: u16,
    chars_at: usize,
}

#[derive(Debug)]
struct SequenceDataIndex {
    count: u16,
    index_at: usize,
}

impl<'a> UchrTableDecoder<'a> {
    /// Parses the resource header and validates every declared structure.
    ///
    /// `keyboard_type` selects among the per-keyboard-model sections: the
    /// first section whose type range contains it wins, else the section
    /// marked as default by a zero `first` bound.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] when the blob is truncated, carries an
    /// unknown format word, or declares offsets outside the blob.
    pub fn new(bytes: &'a [u8], keyboard_type: u32) -> Result<Self, LayoutError> {
        require_len(bytes, 12, "header")?;
        let format = read_u16(bytes, 0);
        if format != UCHR_HEADER_FORMAT {
            return Err(LayoutError::UnsupportedFormat(format));
        }
        let type_count = read_u32(bytes, 8) as usize;
        if type_count == 0 {
            return Err(LayoutError::Malformed("keyboard type count is zero".into()));
        }
        require_len(bytes, 12 + type_count * TYPE_HEADER_SIZE, "keyboard type headers")?;

        let mut selected = None;
        let mut fallback = None;
        for i in 0..type_count {
            let at = 12 + i * TYPE_HEADER_SIZE;
            let first = read_u32(bytes, at);
            let last = read_u32(bytes, at + 4);
            if keyboard_type >= first && keyboard_type <= last {
                selected = Some(at);
                break;
            }
            if first == 0 && fallback.is_none() {
                fallback = Some(at);
            }
        }
        let header_at = selected.or(fallback).ok_or_else(|| {
            LayoutError::Malformed(format!("no section for keyboard type {keyboard_type}"))
        })?;

        let modifiers_at = read_u32(bytes, header_at + 8) as usize;
        let char_index_at = read_u32(bytes, header_at + 12) as usize;
        let state_records_at = read_u32(bytes, header_at + 16) as usize;
        let terminators_at = read_u32(bytes, header_at + 20) as usize;
        let sequences_at = read_u32(bytes, header_at + 24) as usize;
        if modifiers_at == 0 || char_index_at == 0 {
            return Err(LayoutError::Malformed(
                "missing modifier or char table section".into(),
            ));
        }

        require_len(bytes, modifiers_at + 8, "modifier table header")?;
        let default_table = read_u16(bytes, modifiers_at + 2);
        let modifier_count = read_u32(bytes, modifiers_at + 4);
        let modifier_map_at = modifiers_at + 8;
        require_len(bytes, modifier_map_at + modifier_count as usize, "modifier table")?;

        require_len(bytes, char_index_at + 8, "char table index header")?;
        let table_size = read_u16(bytes, char_index_at + 2);
        let table_count = read_u32(bytes, char_index_at + 4);
        let table_offsets_at = char_index_at + 8;
        require_len(
            bytes,
            table_offsets_at + 4 * table_count as usize,
            "char table offsets",
        )?;
        for i in 0..table_count as usize {
            let table_at = read_u32(bytes, table_offsets_at + 4 * i) as usize;
            require_len(bytes, table_at + 2 * table_size as usize, "char table cells")?;
        }

        let state_records = if state_records_at != 0 {
            require_len(bytes, state_records_at + 4, "state records header")?;
            let count = read_u16(bytes, state_records_at + 2);
            let offsets_at = state_records_at + 4;
            require_len(bytes, offsets_at + 4 * count as usize, "state record offsets")?;
            Some(StateRecordsIndex { count, offsets_at })
        } else {
            None
        };

        let terminators = if terminators_at != 0 {
            require_len(bytes, terminators_at + 4, "terminators header")?;
            let count = read_u16(bytes, terminators_at + 2);
            let chars_at = terminators_at + 4;
            require_len(bytes, chars_at + 2 * count as usize, "terminator characters")?;
            Some(TerminatorsIndex { count, chars_at })
        } else {
            None
        };

        let sequences = if sequences_at != 0 {
            require_len(bytes, sequences_at + 4, "sequence data header")?;
            let count = read_u16(bytes, sequences_at + 2);
            require_len(
                bytes,
                sequences_at + 4 + 2 * (count as usize + 1),
                "sequence offsets",
            )?;
            Some(SequenceDataIndex {
                count,
                index_at: sequences_at,
            })
        } else {
            None
        };

        Ok(UchrTableDecoder {
            bytes,
            default_table,
            modifier_count,
            modifier_map_at,
            table_size,
            table_count,
            table_offsets_at,
            state_records,
            terminators,
            sequences,
        })
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn resolve_cell(&self, cell: u16, pending: Option<DeadKeyState>) -> KeyResolution {
        match cell & CELL_TEST_MASK {
            CELL_STATE_MASK => self.resolve_state_cell(cell & CELL_INDEX_MASK, pending),
            CELL_SEQUENCE_MASK => {
                let mut emitted = base_of(pending);
                emitted.extend(self.sequence_ids(cell & CELL_INDEX_MASK));
                KeyResolution {
                    emitted,
                    pending: None,
                }
            }
            _ => {
                let mut emitted = base_of(pending);
                if cell != 0xFFFE && cell != 0xFFFF {
                    let id = KeyId::from_keyboard_char(cell as u32);
                    if id != KeyId::NONE {
                        emitted.push(id);
                    }
                }
                KeyResolution {
                    emitted,
                    pending: None,
                }
            }
        }
    }

    fn resolve_state_cell(&self, index: u16, pending: Option<DeadKeyState>) -> KeyResolution {
        let Some(record_at) = self.state_record_at(index) else {
            // No usable record: the cell cannot combine with anything.
            // Flush any stored base and produce nothing for this press.
            return KeyResolution {
                emitted: base_of(pending),
                pending: None,
            };
        };
        let zero_char = read_u16(self.bytes, record_at);
        let zero_next = read_u16(self.bytes, record_at + 2);

        let Some(p) = pending else {
            if zero_next != 0 {
                return KeyResolution {
                    emitted: Vec::new(),
                    pending: Some(DeadKeyState {
                        state: zero_next,
                        base: self.state_base(zero_char, zero_next),
                    }),
                };
            }
            return KeyResolution {
                emitted: self.char_seq_ids(zero_char),
                pending: None,
            };
        };

        match self.find_entry(record_at, p.state) {
            Some((char_data, next_state)) if next_state != 0 => KeyResolution {
                emitted: Vec::new(),
                pending: Some(DeadKeyState {
                    state: next_state,
                    base: self.state_base(char_data, next_state),
                }),
            },
            Some((char_data, _)) => KeyResolution {
                emitted: self.char_seq_ids(char_data),
                pending: None,
            },
            None => {
                // The sequence breaks: emit the stored base, then resolve
                // this key as if freshly pressed.  The fresh resolution may
                // itself open a new dead-key state.
                let fresh = self.resolve_state_cell(index, None);
                let mut emitted = p.base;
                emitted.extend(fresh.emitted);
                KeyResolution {
                    emitted,
                    pending: fresh.pending,
                }
            }
        }
    }

    fn state_record_at(&self, index: u16) -> Option<usize> {
        let sri = self.state_records.as_ref()?;
        if index >= sri.count {
            return None;
        }
        let record_at = read_u32(self.bytes, sri.offsets_at + 4 * index as usize) as usize;
        if self.bytes.len() < record_at + 8 {
            return None;
        }
        Some(record_at)
    }

    fn find_entry(&self, record_at: usize, state: u16) -> Option<(u16, u16)> {
        let entry_count = read_u16(self.bytes, record_at + 4) as usize;
        let entry_format = read_u16(self.bytes, record_at + 6);
        if entry_format != STATE_ENTRY_FORMAT {
            return None;
        }
        let entries_at = record_at + 8;
        if self.bytes.len() < entries_at + 6 * entry_count {
            return None;
        }
        for i in 0..entry_count {
            let at = entries_at + 6 * i;
            if read_u16(self.bytes, at) == state {
                return Some((read_u16(self.bytes, at + 2), read_u16(self.bytes, at + 4)));
            }
        }
        None
    }

    /// Base ids for a freshly entered dead-key state: the record's own
    /// character data when it yields something, else the state's
    /// terminator.
    fn state_base(&self, char_data: u16, state: u16) -> KeySequence {
        let ids = self.char_seq_ids(char_data);
        if !ids.is_empty() {
            return ids;
        }
        self.terminator_ids(state)
    }

    fn terminator_ids(&self, state: u16) -> KeySequence {
        let Some(term) = self.terminators.as_ref() else {
            return Vec::new();
        };
        if state == 0 || state > term.count {
            return Vec::new();
        }
        let v = read_u16(self.bytes, term.chars_at + 2 * (state as usize - 1));
        self.char_seq_ids(v)
    }

    /// Decodes a character-or-sequence word from a state record or
    /// terminator.
    fn char_seq_ids(&self, v: u16) -> KeySequence {
        if v & CELL_TEST_MASK == CELL_SEQUENCE_MASK {
            return self.sequence_ids(v & CELL_INDEX_MASK);
        }
        if v == 0xFFFE || v == 0xFFFF {
            return Vec::new();
        }
        let id = KeyId::from_keyboard_char(v as u32);
        if id == KeyId::NONE {
            Vec::new()
        } else {
            vec![id]
        }
    }

    /// Reads sequence `index`, combining surrogate pairs into scalars.
    fn sequence_ids(&self, index: u16) -> KeySequence {
        let Some(sdi) = self.sequences.as_ref() else {
            return Vec::new();
        };
        if index >= sdi.count {
            return Vec::new();
        }
        let offsets_at = sdi.index_at + 4;
        let start = read_u16(self.bytes, offsets_at + 2 * index as usize) as usize;
        let end = read_u16(self.bytes, offsets_at + 2 * (index as usize + 1)) as usize;
        if start > end || start % 2 != 0 || end % 2 != 0 {
            return Vec::new();
        }
        let hi = sdi.index_at + end;
        if hi > self.bytes.len() {
            return Vec::new();
        }

        let mut ids = Vec::new();
        let mut at = sdi.index_at + start;
        while at + 2 <= hi {
            let unit = read_u16(self.bytes, at);
            at += 2;
            let scalar = if (0xD800..=0xDBFF).contains(&unit) {
                if at + 2 > hi {
                    break;
                }
                let low = read_u16(self.bytes, at);
                if !(0xDC00..=0xDFFF).contains(&low) {
                    continue; // unpaired high surrogate yields nothing
                }
                at += 2;
                0x10000 + (((unit as u32 - 0xD800) << 10) | (low as u32 - 0xDC00))
            } else if (0xDC00..=0xDFFF).contains(&unit) || unit == 0xFFFE || unit == 0xFFFF {
                continue;
            } else {
                unit as u32
            };
            let id = KeyId::from_keyboard_char(scalar);
            if id != KeyId::NONE {
                ids.push(id);
            }
        }
        ids
    }
}

impl LayoutResource for UchrTableDecoder<'_> {
    fn is_valid(&self) -> bool {
        self.table_count > 0 && self.table_size > 0
    }

    fn num_modifier_combinations(&self) -> u32 {
        self.modifier_count
    }

    fn num_tables(&self) -> u32 {
        self.table_count
    }

    fn num_buttons(&self) -> u16 {
        self.table_size
    }

    fn table_for_modifier(&self, combination: u32) -> u32 {
        let table = if combination < self.modifier_count {
            self.bytes[self.modifier_map_at + combination as usize] as u32
        } else {
            self.default_table as u32
        };
        if table < self.table_count {
            table
        } else {
            0
        }
    }

    fn key_at(&self, table: u32, button: u16, pending: Option<DeadKeyState>) -> KeyResolution {
        debug_assert!(table < self.table_count, "table index out of range");
        debug_assert!(button < self.table_size, "button index out of range");
        if table >= self.table_count || button >= self.table_size {
            return KeyResolution::none();
        }
        let table_at = read_u32(self.bytes, self.table_offsets_at + 4 * table as usize) as usize;
        let cell = read_u16(self.bytes, table_at + 2 * button as usize);
        self.resolve_cell(cell, pending)
    }
}

// ── Read helpers ──────────────────────────────────────────────────────────────

fn require_len(bytes: &[u8], needed: usize, context: &'static str) -> Result<(), LayoutError> {
    if bytes.len() < needed {
        return Err(LayoutError::Truncated {
            context,
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn base_of(pending: Option<DeadKeyState>) -> KeySequence {
    pending.map(|p| p.base).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fixture::{sequence_cell, state_cell, LayoutBuilder, StateEntrySpec, StateRecordSpec};

    const A: u16 = b'a' as u16;
    const E: u16 = b'e' as u16;
    const X: u16 = b'x' as u16;
    const CIRCUMFLEX: u16 = 0x02C6;
    const E_CIRCUMFLEX: u16 = 0x00EA;
    const ACUTE: u16 = 0x00B4;
    const DOUBLE_ACUTE: u16 = 0x02DD;
    const A_ACUTE: u16 = 0x00E1;
    const A_DOUBLE_GRAVE: u16 = 0x0201;

    fn decoder_of(bytes: &[u8]) -> UchrTableDecoder<'_> {
        UchrTableDecoder::new(bytes, 0).expect("fixture resource must parse")
    }

    /// Layout with a circumflex dead key on button 0 and a combining `e`
    /// on button 1.
    fn dead_key_layout() -> Vec<u8> {
        LayoutBuilder::new()
            .push_table(vec![state_cell(0), state_cell(1), X])
            .push_state_record(StateRecordSpec {
                state_zero_char: CIRCUMFLEX,
                state_zero_next: 1,
                entries: vec![],
            })
            .push_state_record(StateRecordSpec {
                state_zero_char: E,
                state_zero_next: 0,
                entries: vec![StateEntrySpec {
                    cur_state: 1,
                    char_data: E_CIRCUMFLEX,
                    next_state: 0,
                }],
            })
            .terminators(vec![CIRCUMFLEX])
            .build()
    }

    #[test]
    fn test_direct_character_cells() {
        let bytes = LayoutBuilder::new().push_table(vec![A, E]).build();
        let dec = decoder_of(&bytes);
        assert!(dec.is_valid());
        assert_eq!(dec.num_tables(), 1);
        assert_eq!(dec.num_buttons(), 2);
        assert_eq!(
            dec.key_at(0, 0, None),
            KeyResolution {
                emitted: vec![KeyId(A as u32)],
                pending: None,
            }
        );
    }

    #[test]
    fn test_no_output_cells_yield_empty_resolution() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![0xFFFE, 0xFFFF, 0x0001])
            .build();
        let dec = decoder_of(&bytes);
        for button in 0..3 {
            let res = dec.key_at(0, button, None);
            assert!(res.emitted.is_empty(), "button {button} must produce nothing");
            assert_eq!(res.pending, None);
        }
    }

    #[test]
    fn test_legacy_control_cells_promote() {
        let bytes = LayoutBuilder::new().push_table(vec![0x0009, 0x000D]).build();
        let dec = decoder_of(&bytes);
        assert_eq!(dec.key_at(0, 0, None).emitted, vec![KeyId::TAB]);
        assert_eq!(dec.key_at(0, 1, None).emitted, vec![KeyId::RETURN]);
    }

    #[test]
    fn test_table_for_modifier_uses_map_then_default() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![A])
            .push_table(vec![b'A' as u16])
            .default_table(1)
            .modifier_map(vec![0, 0, 1])
            .build();
        let dec = decoder_of(&bytes);
        assert_eq!(dec.num_modifier_combinations(), 3);
        assert_eq!(dec.table_for_modifier(0), 0);
        assert_eq!(dec.table_for_modifier(2), 1);
        // Combinations beyond the map fall back to the default table.
        assert_eq!(dec.table_for_modifier(17), 1);
        assert_eq!(dec.table_for_modifier(31), 1);
    }

    #[test]
    fn test_table_for_modifier_with_zero_combinations() {
        // A resource may list no combinations at all; every mask then
        // resolves to table 0.
        let bytes = LayoutBuilder::new().push_table(vec![A]).build();
        let dec = decoder_of(&bytes);
        assert_eq!(dec.num_modifier_combinations(), 0);
        for combination in 0..32 {
            assert_eq!(dec.table_for_modifier(combination), 0);
        }
    }

    #[test]
    fn test_table_for_modifier_clamps_out_of_range_default() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![A])
            .default_table(7)
            .build();
        let dec = decoder_of(&bytes);
        assert_eq!(dec.table_for_modifier(9), 0);
    }

    #[test]
    fn test_dead_key_press_opens_pending_state() {
        let bytes = dead_key_layout();
        let dec = decoder_of(&bytes);
        let res = dec.key_at(0, 0, None);
        assert!(res.emitted.is_empty());
        assert_eq!(
            res.pending,
            Some(DeadKeyState {
                state: 1,
                base: vec![KeyId(CIRCUMFLEX as u32)],
            })
        );
    }

    #[test]
    fn test_dead_key_combination_emits_single_combined_id() {
        let bytes = dead_key_layout();
        let dec = decoder_of(&bytes);
        let pending = dec.key_at(0, 0, None).pending;
        let res = dec.key_at(0, 1, pending);
        assert_eq!(res.emitted, vec![KeyId(E_CIRCUMFLEX as u32)]);
        assert_eq!(res.pending, None);
    }

    #[test]
    fn test_dead_key_fallback_emits_base_then_key() {
        let bytes = dead_key_layout();
        let dec = decoder_of(&bytes);
        let pending = dec.key_at(0, 0, None).pending;
        // `x` has no combination with the circumflex state.
        let res = dec.key_at(0, 2, pending);
        assert_eq!(
            res.emitted,
            vec![KeyId(CIRCUMFLEX as u32), KeyId(X as u32)]
        );
        assert_eq!(res.pending, None);
    }

    #[test]
    fn test_combining_key_alone_emits_its_own_character() {
        let bytes = dead_key_layout();
        let dec = decoder_of(&bytes);
        // `e` participates in combinations but typed alone is just `e`.
        assert_eq!(dec.key_at(0, 1, None).emitted, vec![KeyId(E as u32)]);
    }

    #[test]
    fn test_dead_key_twice_emits_base_and_reopens_state() {
        let bytes = dead_key_layout();
        let dec = decoder_of(&bytes);
        let pending = dec.key_at(0, 0, None).pending;
        let res = dec.key_at(0, 0, pending);
        assert_eq!(res.emitted, vec![KeyId(CIRCUMFLEX as u32)]);
        assert_eq!(
            res.pending,
            Some(DeadKeyState {
                state: 1,
                base: vec![KeyId(CIRCUMFLEX as u32)],
            })
        );
    }

    #[test]
    fn test_two_level_dead_key_chain() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![state_cell(0), state_cell(1), X])
            .push_state_record(StateRecordSpec {
                // Acute accent key: chains to the double-acute state when
                // pressed again.
                state_zero_char: ACUTE,
                state_zero_next: 1,
                entries: vec![StateEntrySpec {
                    cur_state: 1,
                    char_data: 0xFFFE,
                    next_state: 2,
                }],
            })
            .push_state_record(StateRecordSpec {
                state_zero_char: A,
                state_zero_next: 0,
                entries: vec![
                    StateEntrySpec {
                        cur_state: 1,
                        char_data: A_ACUTE,
                        next_state: 0,
                    },
                    StateEntrySpec {
                        cur_state: 2,
                        char_data: A_DOUBLE_GRAVE,
                        next_state: 0,
                    },
                ],
            })
            .terminators(vec![ACUTE, DOUBLE_ACUTE])
            .build();
        let dec = decoder_of(&bytes);

        // First press opens state 1.
        let p1 = dec.key_at(0, 0, None).pending.expect("state 1 expected");
        assert_eq!(p1.state, 1);

        // Second press chains to state 2 with the chained base.
        let step = dec.key_at(0, 0, Some(p1));
        assert!(step.emitted.is_empty());
        let p2 = step.pending.expect("state 2 expected");
        assert_eq!(p2.state, 2);
        assert_eq!(p2.base, vec![KeyId(DOUBLE_ACUTE as u32)]);

        // `a` resolves through the second state's entry.
        let combined = dec.key_at(0, 1, Some(p2));
        assert_eq!(combined.emitted, vec![KeyId(A_DOUBLE_GRAVE as u32)]);
        assert_eq!(combined.pending, None);

        // Breaking at level two flushes the chained base.
        let p1 = dec.key_at(0, 0, None).pending.unwrap();
        let p2 = dec.key_at(0, 0, Some(p1)).pending.unwrap();
        let broken = dec.key_at(0, 2, Some(p2));
        assert_eq!(
            broken.emitted,
            vec![KeyId(DOUBLE_ACUTE as u32), KeyId(X as u32)]
        );
    }

    #[test]
    fn test_sequence_cell_emits_all_ids() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![sequence_cell(0)])
            .push_sequence(vec![A, E])
            .build();
        let dec = decoder_of(&bytes);
        let res = dec.key_at(0, 0, None);
        assert_eq!(res.emitted, vec![KeyId(A as u32), KeyId(E as u32)]);
    }

    #[test]
    fn test_sequence_after_dead_key_flushes_base_first() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![state_cell(0), sequence_cell(0)])
            .push_state_record(StateRecordSpec {
                state_zero_char: CIRCUMFLEX,
                state_zero_next: 1,
                entries: vec![],
            })
            .push_sequence(vec![A, E])
            .terminators(vec![CIRCUMFLEX])
            .build();
        let dec = decoder_of(&bytes);
        let pending = dec.key_at(0, 0, None).pending;
        let res = dec.key_at(0, 1, pending);
        assert_eq!(
            res.emitted,
            vec![
                KeyId(CIRCUMFLEX as u32),
                KeyId(A as u32),
                KeyId(E as u32)
            ]
        );
    }

    #[test]
    fn test_surrogate_pair_combines_into_one_scalar() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![sequence_cell(0)])
            .push_sequence(vec![0xD83D, 0xDE00])
            .build();
        let dec = decoder_of(&bytes);
        assert_eq!(dec.key_at(0, 0, None).emitted, vec![KeyId(0x1F600)]);
    }

    #[test]
    fn test_unpaired_surrogate_yields_nothing() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![sequence_cell(0)])
            .push_sequence(vec![0xD83D, A])
            .build();
        let dec = decoder_of(&bytes);
        assert_eq!(dec.key_at(0, 0, None).emitted, vec![KeyId(A as u32)]);
    }

    #[test]
    fn test_terminator_supplies_base_when_record_has_no_char() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![state_cell(0), X])
            .push_state_record(StateRecordSpec {
                state_zero_char: 0xFFFE,
                state_zero_next: 1,
                entries: vec![],
            })
            .terminators(vec![CIRCUMFLEX])
            .build();
        let dec = decoder_of(&bytes);
        let pending = dec.key_at(0, 0, None).pending.unwrap();
        assert_eq!(pending.base, vec![KeyId(CIRCUMFLEX as u32)]);
        let res = dec.key_at(0, 1, Some(pending));
        assert_eq!(
            res.emitted,
            vec![KeyId(CIRCUMFLEX as u32), KeyId(X as u32)]
        );
    }

    #[test]
    fn test_state_without_base_flushes_nothing_on_break() {
        // Neither record char data nor terminator: the broken sequence
        // contributes no base character.
        let bytes = LayoutBuilder::new()
            .push_table(vec![state_cell(0), X])
            .push_state_record(StateRecordSpec {
                state_zero_char: 0xFFFE,
                state_zero_next: 1,
                entries: vec![],
            })
            .build();
        let dec = decoder_of(&bytes);
        let pending = dec.key_at(0, 0, None).pending.unwrap();
        assert!(pending.base.is_empty());
        let res = dec.key_at(0, 1, Some(pending));
        assert_eq!(res.emitted, vec![KeyId(X as u32)]);
    }

    #[test]
    fn test_state_cell_without_records_section_is_unmapped() {
        let bytes = LayoutBuilder::new()
            .push_table(vec![state_cell(0), A])
            .build();
        let dec = decoder_of(&bytes);
        assert_eq!(dec.key_at(0, 0, None), KeyResolution::none());
        // With pending state the stored base still flushes.
        let res = dec.key_at(
            0,
            0,
            Some(DeadKeyState {
                state: 1,
                base: vec![KeyId(CIRCUMFLEX as u32)],
            }),
        );
        assert_eq!(res.emitted, vec![KeyId(CIRCUMFLEX as u32)]);
        assert_eq!(res.pending, None);
    }

    #[test]
    fn test_keyboard_type_selects_matching_section() {
        let bytes = LayoutBuilder::new()
            .keyboard_type_range(40, 50)
            .push_table(vec![A])
            .build();
        assert!(UchrTableDecoder::new(&bytes, 45).is_ok());
        let err = UchrTableDecoder::new(&bytes, 7).unwrap_err();
        assert!(matches!(err, LayoutError::Malformed(_)));
    }

    #[test]
    fn test_zero_first_type_is_the_default_section() {
        let bytes = LayoutBuilder::new()
            .keyboard_type_range(0, 10)
            .push_table(vec![A])
            .build();
        // Type 99 is outside the range but the zero first bound marks the
        // section as the default.
        assert!(UchrTableDecoder::new(&bytes, 99).is_ok());
    }

    #[test]
    fn test_rejects_unknown_format_word() {
        let mut bytes = LayoutBuilder::new().push_table(vec![A]).build();
        bytes[0] = 0x34;
        bytes[1] = 0x12;
        assert_eq!(
            UchrTableDecoder::new(&bytes, 0).unwrap_err(),
            LayoutError::UnsupportedFormat(0x1234)
        );
    }

    #[test]
    fn test_rejects_truncated_resource() {
        let bytes = LayoutBuilder::new().push_table(vec![A]).build();
        let err = UchrTableDecoder::new(&bytes[..bytes.len() - 1], 0).unwrap_err();
        assert!(matches!(err, LayoutError::Truncated { .. }));
    }

    #[test]
    fn test_resource_without_tables_is_invalid() {
        let bytes = LayoutBuilder::new().build();
        let dec = decoder_of(&bytes);
        assert!(!dec.is_valid());
    }
}
