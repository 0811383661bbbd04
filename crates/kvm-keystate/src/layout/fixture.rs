//! Programmatic construction of `uchr` resource blobs.
//!
//! Tests, benches and the mock platform all need layout bytes without an OS
//! to ask.  [`LayoutBuilder`] assembles a structurally valid resource from
//! high-level pieces: shift tables, dead-key state records, terminators and
//! character sequences.  Offsets and counts are computed here so a fixture
//! describes *what* the layout contains, never where bytes land.

use crate::layout::uchr::{
    CELL_INDEX_MASK, CELL_SEQUENCE_MASK, CELL_STATE_MASK, STATE_ENTRY_FORMAT, TYPE_HEADER_SIZE,
    UCHR_HEADER_FORMAT,
};

/// Cell referencing dead-key state record `index`.
pub fn state_cell(index: u16) -> u16 {
    CELL_STATE_MASK | (index & CELL_INDEX_MASK)
}

/// Cell referencing character sequence `index`.
pub fn sequence_cell(index: u16) -> u16 {
    CELL_SEQUENCE_MASK | (index & CELL_INDEX_MASK)
}

/// One entry of a dead-key state record.
#[derive(Debug, Clone)]
pub struct StateEntrySpec {
    pub cur_state: u16,
    pub char_data: u16,
    /// Nonzero chains into a deeper dead-key state.
    pub next_state: u16,
}

/// One dead-key state record.
#[derive(Debug, Clone)]
pub struct StateRecordSpec {
    pub state_zero_char: u16,
    pub state_zero_next: u16,
    pub entries: Vec<StateEntrySpec>,
}

/// Assembles `uchr` resource bytes from declarative parts.
///
/// Cells reference records and sequences positionally, in push order.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    first_type: u32,
    last_type: u32,
    default_table: u16,
    modifier_map: Vec<u8>,
    tables: Vec<Vec<u16>>,
    records: Vec<StateRecordSpec>,
    terminators: Vec<u16>,
    sequences: Vec<Vec<u16>>,
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        LayoutBuilder::new()
    }
}

impl LayoutBuilder {
    /// Starts an empty layout matching every keyboard type.
    pub fn new() -> LayoutBuilder {
        LayoutBuilder {
            first_type: 0,
            last_type: u32::MAX,
            default_table: 0,
            modifier_map: Vec::new(),
            tables: Vec::new(),
            records: Vec::new(),
            terminators: Vec::new(),
            sequences: Vec::new(),
        }
    }

    /// Restricts the resource section to one keyboard type range.
    pub fn keyboard_type_range(mut self, first: u32, last: u32) -> LayoutBuilder {
        self.first_type = first;
        self.last_type = last;
        self
    }

    /// Table used for modifier combinations beyond the map.
    pub fn default_table(mut self, table: u16) -> LayoutBuilder {
        self.default_table = table;
        self
    }

    /// Modifier-combination → table-number map, indexed by packed
    /// combination value.
    pub fn modifier_map(mut self, map: Vec<u8>) -> LayoutBuilder {
        self.modifier_map = map;
        self
    }

    /// Appends one shift table.  All tables must share the same length.
    pub fn push_table(mut self, cells: Vec<u16>) -> LayoutBuilder {
        self.tables.push(cells);
        self
    }

    /// Appends one dead-key state record.
    pub fn push_state_record(mut self, record: StateRecordSpec) -> LayoutBuilder {
        self.records.push(record);
        self
    }

    /// Terminator characters, one per dead-key state starting at state 1.
    pub fn terminators(mut self, terminators: Vec<u16>) -> LayoutBuilder {
        self.terminators = terminators;
        self
    }

    /// Appends one character sequence (UTF-16 code units).
    pub fn push_sequence(mut self, units: Vec<u16>) -> LayoutBuilder {
        self.sequences.push(units);
        self
    }

    /// Serializes the resource.
    ///
    /// # Panics
    ///
    /// Panics when tables disagree on their length; that is a broken
    /// fixture, not a runtime condition.
    pub fn build(&self) -> Vec<u8> {
        let table_size = self.tables.first().map(|t| t.len()).unwrap_or(0);
        assert!(
            self.tables.iter().all(|t| t.len() == table_size),
            "all tables must have the same size"
        );

        let mut buf = vec![0u8; 12 + TYPE_HEADER_SIZE];
        write_u16(&mut buf, 0, UCHR_HEADER_FORMAT);
        write_u16(&mut buf, 2, 1); // data version
        write_u32(&mut buf, 8, 1); // one keyboard type section
        write_u32(&mut buf, 12, self.first_type);
        write_u32(&mut buf, 16, self.last_type);

        pad4(&mut buf);
        let modifiers_at = buf.len() as u32;
        push_u16(&mut buf, 0);
        push_u16(&mut buf, self.default_table);
        push_u32(&mut buf, self.modifier_map.len() as u32);
        buf.extend_from_slice(&self.modifier_map);

        pad4(&mut buf);
        let char_index_at = buf.len() as u32;
        push_u16(&mut buf, 0);
        push_u16(&mut buf, table_size as u16);
        push_u32(&mut buf, self.tables.len() as u32);
        let table_offsets_at = buf.len();
        for _ in &self.tables {
            push_u32(&mut buf, 0);
        }
        for (i, table) in self.tables.iter().enumerate() {
            let at = buf.len() as u32;
            write_u32(&mut buf, table_offsets_at + 4 * i, at);
            for &cell in table {
                push_u16(&mut buf, cell);
            }
        }

        let state_records_at = if self.records.is_empty() {
            0
        } else {
            pad4(&mut buf);
            let at = buf.len() as u32;
            push_u16(&mut buf, 0);
            push_u16(&mut buf, self.records.len() as u16);
            let offsets_at = buf.len();
            for _ in &self.records {
                push_u32(&mut buf, 0);
            }
            for (i, record) in self.records.iter().enumerate() {
                let record_at = buf.len() as u32;
                write_u32(&mut buf, offsets_at + 4 * i, record_at);
                push_u16(&mut buf, record.state_zero_char);
                push_u16(&mut buf, record.state_zero_next);
                push_u16(&mut buf, record.entries.len() as u16);
                push_u16(&mut buf, STATE_ENTRY_FORMAT);
                for entry in &record.entries {
                    push_u16(&mut buf, entry.cur_state);
                    push_u16(&mut buf, entry.char_data);
                    push_u16(&mut buf, entry.next_state);
                }
            }
            at
        };

        let terminators_at = if self.terminators.is_empty() {
            0
        } else {
            pad4(&mut buf);
            let at = buf.len() as u32;
            push_u16(&mut buf, 0);
            push_u16(&mut buf, self.terminators.len() as u16);
            for &terminator in &self.terminators {
                push_u16(&mut buf, terminator);
            }
            at
        };

        let sequences_at = if self.sequences.is_empty() {
            0
        } else {
            pad4(&mut buf);
            let at = buf.len() as u32;
            push_u16(&mut buf, 0);
            push_u16(&mut buf, self.sequences.len() as u16);
            // Offsets are relative to the block start and delimit each
            // sequence's code units; the final offset closes the last one.
            let mut running = (4 + 2 * (self.sequences.len() + 1)) as u16;
            for seq in &self.sequences {
                push_u16(&mut buf, running);
                running += 2 * seq.len() as u16;
            }
            push_u16(&mut buf, running);
            for seq in &self.sequences {
                for &unit in seq {
                    push_u16(&mut buf, unit);
                }
            }
            at
        };

        write_u32(&mut buf, 20, modifiers_at);
        write_u32(&mut buf, 24, char_index_at);
        write_u32(&mut buf, 28, state_records_at);
        write_u32(&mut buf, 32, terminators_at);
        write_u32(&mut buf, 36, sequences_at);
        buf
    }
}

// ── Sample layout ─────────────────────────────────────────────────────────────

/// Key positions in [`sample_layout`].
pub const SAMPLE_VK_A: u16 = 0;
pub const SAMPLE_VK_E: u16 = 1;
pub const SAMPLE_VK_X: u16 = 2;
pub const SAMPLE_VK_DEAD: u16 = 3;
pub const SAMPLE_VK_SPACE: u16 = 4;
pub const SAMPLE_VK_ONE: u16 = 5;
pub const SAMPLE_VK_UNMAPPED: u16 = 6;
pub const SAMPLE_VK_Q: u16 = 7;
/// Number of key positions per table in [`sample_layout`].
pub const SAMPLE_BUTTONS: u16 = 8;

/// Small US-like layout exercising every cell kind.
///
/// Four tables selected by the packed modifier combination: base, shift
/// (also reached via caps), alt, control.  Button 3 is a circumflex dead
/// key that combines with `e`; the alt table carries a sequence and an
/// emoji surrogate pair; the control table degrades to control codes.
///
/// | vk | base     | shift | alt        | control |
/// |----|----------|-------|------------|---------|
/// | 0  | a        | A     | å          | 0x01    |
/// | 1  | e (rec)  | E     | €          | 0x05    |
/// | 2  | x        | X     | ≈ (seq)    | 0x18    |
/// | 3  | dead ^   | dead ^| ^          | none    |
/// | 4  | space    | space | space      | space   |
/// | 5  | 1        | !     | 😀 (seq)   | none    |
/// | 6  | none     | none  | none       | none    |
/// | 7  | q        | Q     | œ          | 0x11    |
pub fn sample_layout() -> Vec<u8> {
    let modifier_map = (0u8..32)
        .map(|combo| {
            if combo & 16 != 0 {
                3 // control
            } else if combo & 8 != 0 {
                2 // alt
            } else if combo & (2 | 4) != 0 {
                1 // shift or caps
            } else {
                0
            }
        })
        .collect();

    LayoutBuilder::new()
        .modifier_map(modifier_map)
        .push_table(vec![
            b'a' as u16,
            state_cell(1),
            b'x' as u16,
            state_cell(0),
            b' ' as u16,
            b'1' as u16,
            0xFFFE,
            b'q' as u16,
        ])
        .push_table(vec![
            b'A' as u16,
            b'E' as u16,
            b'X' as u16,
            state_cell(0),
            b' ' as u16,
            b'!' as u16,
            0xFFFE,
            b'Q' as u16,
        ])
        .push_table(vec![
            0x00E5, // å
            0x20AC, // €
            sequence_cell(0),
            b'^' as u16,
            b' ' as u16,
            sequence_cell(1),
            0xFFFE,
            0x0153, // œ
        ])
        .push_table(vec![
            0x01,
            0x05,
            0x18,
            0xFFFE,
            b' ' as u16,
            0xFFFE,
            0xFFFE,
            0x11,
        ])
        .push_state_record(StateRecordSpec {
            state_zero_char: b'^' as u16,
            state_zero_next: 1,
            entries: vec![],
        })
        .push_state_record(StateRecordSpec {
            state_zero_char: b'e' as u16,
            state_zero_next: 0,
            entries: vec![StateEntrySpec {
                cur_state: 1,
                char_data: 0x00EA, // ê
                next_state: 0,
            }],
        })
        .terminators(vec![b'^' as u16])
        .push_sequence(vec![0x2248]) // ≈
        .push_sequence(vec![0xD83D, 0xDE00]) // 😀
        .build()
}

// ── Byte helpers ──────────────────────────────────────────────────────────────

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn write_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}
