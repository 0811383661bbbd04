//! # kvm-keystate
//!
//! Keyboard layout decoding and live key/modifier state tracking for
//! KVM-Over-IP.
//!
//! This crate sits between the OS keyboard layer and the rest of the system.
//! It decodes the host's table-driven keyboard layout resources (including
//! multi-step dead-key sequences) into a full key map, and maintains a live
//! shadow of modifier and layout-group state so synthetic key events are
//! deterministic no matter how the hardware reports changes.
//!
//! # How a keystroke becomes a character (for beginners)
//!
//! When you press a key, the OS reports a **virtual key code** (a number for
//! the physical key position, not the character) plus a set of **modifier
//! flags** (shift, control, ...).  Which character that key produces depends
//! on the active **keyboard layout**: on a French layout the key that is `Q`
//! on a US keyboard produces `A`.
//!
//! Layouts are shipped by the OS as compact binary tables.  For each
//! combination of modifiers the table selects a "shift table", and each
//! shift table maps key positions to characters.  Some keys are **dead
//! keys**: pressing `^` alone produces nothing, but `^` followed by `e`
//! produces `ê`.  The tables encode this as a small state machine.
//!
//! This crate walks those tables once per layout and produces a [`KeyMap`]:
//! for every (layout group, modifier combination, physical button) the
//! ordered sequence of platform-independent [`KeyId`]s the press produces.
//! The rest of the system never touches native codes again.
//!
//! Module map:
//!
//! - **`keys`** – [`KeyId`] and [`ButtonId`] newtypes and named-key
//!   constants.
//! - **`modifiers`** – native ⇄ unified modifier mask translation and the
//!   AltGr heuristic.
//! - **`layout`** – the layout resource capability trait and the `uchr`
//!   table decoder with its dead-key state machine.
//! - **`keymap`** – the key map structure and its builder.
//! - **`platform`** – the OS port trait plus a recording mock.
//! - **`state`** – the [`KeyState`] façade and layout-group manager.
//! - **`config`** – TOML-backed tuning options.

pub mod config;
pub mod keymap;
pub mod keys;
pub mod layout;
pub mod modifiers;
pub mod platform;
pub mod state;

pub use config::{ConfigError, KeyStateOptions};
pub use keymap::{KeyMap, KeyMapBuilder, KeyMapEntry};
pub use keys::{ButtonId, KeyId};
pub use layout::{DeadKeyState, KeyResolution, LayoutError, LayoutFormat, LayoutResource};
pub use modifiers::{NativeModifierMask, UnifiedModifierMask};
pub use platform::{InputSourceId, NativeKeyEvent, PlatformError, PlatformKeyboard};
pub use state::{GroupManager, KeyEventSink, KeyState, Keystroke, MappedKey, ShadowModifiers};
