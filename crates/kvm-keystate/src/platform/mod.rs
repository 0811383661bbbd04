//! Port to the host OS keyboard layer.
//!
//! Everything this crate needs from the OS goes through the
//! [`PlatformKeyboard`] trait: enumerating input sources, fetching layout
//! resource bytes, reading live modifier/key state and injecting synthetic
//! key events.  The real implementation lives with the embedding
//! application; [`mock::MockPlatformKeyboard`] stands in for tests.
//!
//! All calls are short-lived synchronous queries.  Failures surface as
//! [`PlatformError`] and are propagated to the façade's caller, never
//! retried here.

use thiserror::Error;

use crate::layout::LayoutFormat;
use crate::modifiers::NativeModifierMask;

pub mod mock;

/// Error type for OS keyboard queries and event injection.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// An OS state query failed (enumerate sources, read modifiers, ...).
    #[error("OS keyboard query failed: {0}")]
    Query(String),

    /// The OS rejected a synthetic key event.
    #[error("key event injection failed: {0}")]
    Injection(String),

    /// A named input source does not exist (anymore).
    #[error("unknown input source: {0}")]
    UnknownSource(String),
}

/// Opaque identifier for one installed keyboard layout/input source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputSourceId(pub String);

impl InputSourceId {
    pub fn new(id: impl Into<String>) -> InputSourceId {
        InputSourceId(id.into())
    }
}

impl std::fmt::Display for InputSourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A native key event as delivered by the OS event layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeKeyEvent {
    /// Zero-based native virtual key code.
    pub virtual_key: u16,
    /// Modifier flags attached to the event.
    pub modifiers: NativeModifierMask,
}

/// Platform-agnostic OS keyboard access.
///
/// The embedding application provides the real implementation; this crate
/// only consumes the trait.
pub trait PlatformKeyboard: Send + Sync {
    /// Enumerates installed input sources in OS order.
    fn input_sources(&self) -> Result<Vec<InputSourceId>, PlatformError>;

    /// The presently selected input source.
    fn active_input_source(&self) -> Result<InputSourceId, PlatformError>;

    /// Asks the OS to switch to `source`.
    fn set_active_input_source(&self, source: &InputSourceId) -> Result<(), PlatformError>;

    /// Fetches the raw layout resource bytes for `source` plus the format
    /// tag describing how to decode them.
    fn layout_resource(&self, source: &InputSourceId)
        -> Result<(LayoutFormat, Vec<u8>), PlatformError>;

    /// The attached keyboard's hardware type code.
    fn keyboard_type(&self) -> Result<u32, PlatformError>;

    /// Current hardware modifier flags.
    fn modifier_flags(&self) -> Result<NativeModifierMask, PlatformError>;

    /// Virtual key codes of all keys physically held right now.
    fn pressed_virtual_keys(&self) -> Result<Vec<u16>, PlatformError>;

    /// Injects one synthetic key event.
    fn inject_key(
        &self,
        virtual_key: u16,
        modifiers: NativeModifierMask,
        press: bool,
    ) -> Result<(), PlatformError>;
}
