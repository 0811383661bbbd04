//! In-memory [`PlatformKeyboard`] for tests.
//!
//! # Why a mock keyboard?
//!
//! The real platform layer talks to OS keyboard APIs, which are unavailable
//! in CI and awkward to drive deterministically.  [`MockPlatformKeyboard`]
//! keeps the whole OS surface in plain fields: tests preload input sources
//! and layout blobs, poke modifier/pressed-key state directly and read back
//! every injected event afterwards.
//!
//! # Usage in tests
//!
//! ```ignore
//! let platform = MockPlatformKeyboard::new();
//! platform.add_source("test.layout.us", LayoutFormat::Uchr, layout_bytes);
//!
//! // ... exercise code under test ...
//!
//! let injected = platform.injected.lock().unwrap();
//! assert_eq!(injected.len(), 1);
//! ```
//!
//! # should_fail flag
//!
//! Setting `should_fail` makes every query and injection return an error,
//! for exercising propagation paths.

use std::sync::Mutex;

use crate::layout::LayoutFormat;
use crate::modifiers::NativeModifierMask;
use crate::platform::{InputSourceId, PlatformError, PlatformKeyboard};

/// Recording stand-in for the OS keyboard layer.
#[derive(Debug, Default)]
pub struct MockPlatformKeyboard {
    /// Input sources in enumeration order with their layout blobs.
    pub sources: Mutex<Vec<(InputSourceId, LayoutFormat, Vec<u8>)>>,
    /// Index of the active source within `sources`.
    pub active: Mutex<usize>,
    /// Hardware keyboard type code reported to callers.
    pub keyboard_type: Mutex<u32>,
    /// Live hardware modifier flags reported to callers.
    pub modifier_flags: Mutex<NativeModifierMask>,
    /// Virtual key codes currently reported as held.
    pub pressed: Mutex<Vec<u16>>,
    /// Records `(virtual_key, modifiers, press)` for every injection.
    pub injected: Mutex<Vec<(u16, NativeModifierMask, bool)>>,
    /// When set, every trait method returns an error.
    pub should_fail: Mutex<bool>,
}

impl MockPlatformKeyboard {
    /// Creates a mock with no input sources and all state zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an input source with its layout resource bytes.
    pub fn add_source(&self, id: impl Into<String>, format: LayoutFormat, bytes: Vec<u8>) {
        self.sources
            .lock()
            .unwrap()
            .push((InputSourceId::new(id), format, bytes));
    }

    /// Points the active-source index at `index`, simulating an external
    /// layout switch.
    pub fn switch_to(&self, index: usize) {
        *self.active.lock().unwrap() = index;
    }

    /// Sets the hardware modifier flags subsequent queries will report.
    pub fn set_modifier_flags(&self, flags: NativeModifierMask) {
        *self.modifier_flags.lock().unwrap() = flags;
    }

    /// Sets the held virtual key codes subsequent queries will report.
    pub fn set_pressed(&self, keys: Vec<u16>) {
        *self.pressed.lock().unwrap() = keys;
    }

    fn fail_check(&self, what: &str) -> Result<(), PlatformError> {
        if *self.should_fail.lock().unwrap() {
            Err(PlatformError::Query(format!("mock failure: {what}")))
        } else {
            Ok(())
        }
    }

    fn find(&self, source: &InputSourceId) -> Result<usize, PlatformError> {
        self.sources
            .lock()
            .unwrap()
            .iter()
            .position(|(id, _, _)| id == source)
            .ok_or_else(|| PlatformError::UnknownSource(source.0.clone()))
    }
}

impl PlatformKeyboard for MockPlatformKeyboard {
    /// Returns the configured sources, or an error if `should_fail` is set.
    fn input_sources(&self) -> Result<Vec<InputSourceId>, PlatformError> {
        self.fail_check("input_sources")?;
        Ok(self
            .sources
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _, _)| id.clone())
            .collect())
    }

    /// Returns the source at the active index, or an error if `should_fail`
    /// is set or no sources are configured.
    fn active_input_source(&self) -> Result<InputSourceId, PlatformError> {
        self.fail_check("active_input_source")?;
        let sources = self.sources.lock().unwrap();
        let index = *self.active.lock().unwrap();
        sources
            .get(index)
            .map(|(id, _, _)| id.clone())
            .ok_or_else(|| PlatformError::Query("no input sources configured".into()))
    }

    /// Moves the active index to `source`, or returns an error if
    /// `should_fail` is set or the source is unknown.
    fn set_active_input_source(&self, source: &InputSourceId) -> Result<(), PlatformError> {
        self.fail_check("set_active_input_source")?;
        let index = self.find(source)?;
        *self.active.lock().unwrap() = index;
        Ok(())
    }

    /// Returns the stored layout blob for `source`, or an error if
    /// `should_fail` is set or the source is unknown.
    fn layout_resource(
        &self,
        source: &InputSourceId,
    ) -> Result<(LayoutFormat, Vec<u8>), PlatformError> {
        self.fail_check("layout_resource")?;
        let index = self.find(source)?;
        let sources = self.sources.lock().unwrap();
        let (_, format, bytes) = &sources[index];
        Ok((*format, bytes.clone()))
    }

    /// Returns the configured keyboard type, or an error if `should_fail`
    /// is set.
    fn keyboard_type(&self) -> Result<u32, PlatformError> {
        self.fail_check("keyboard_type")?;
        Ok(*self.keyboard_type.lock().unwrap())
    }

    /// Returns the configured modifier flags, or an error if `should_fail`
    /// is set.
    fn modifier_flags(&self) -> Result<NativeModifierMask, PlatformError> {
        self.fail_check("modifier_flags")?;
        Ok(*self.modifier_flags.lock().unwrap())
    }

    /// Returns the configured held keys, or an error if `should_fail` is
    /// set.
    fn pressed_virtual_keys(&self) -> Result<Vec<u16>, PlatformError> {
        self.fail_check("pressed_virtual_keys")?;
        Ok(self.pressed.lock().unwrap().clone())
    }

    /// Records the injection, or returns an error if `should_fail` is set.
    fn inject_key(
        &self,
        virtual_key: u16,
        modifiers: NativeModifierMask,
        press: bool,
    ) -> Result<(), PlatformError> {
        if *self.should_fail.lock().unwrap() {
            return Err(PlatformError::Injection(format!(
                "mock failure: inject_key {virtual_key}"
            )));
        }
        self.injected
            .lock()
            .unwrap()
            .push((virtual_key, modifiers, press));
        Ok(())
    }
}
