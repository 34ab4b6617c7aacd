//! Input vocabulary shared between the session and its host.
//!
//! The windowing host owns the raw event types; before forwarding an event
//! it maps the platform identity onto these enums so the session never
//! depends on a particular window library.

/// Pointer buttons the session distinguishes.
///
/// Only [`PointerButton::Middle`] carries behavior (the exclusivity toggle);
/// the others are accepted and ignored so hosts can forward presses
/// unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// Keyboard commands bound by the host.
///
/// The reference bindings are Escape, `G`, and `R`; the host is free to remap
/// them since the session only sees the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Request session termination; honored by the host event loop.
    Exit,
    /// Flip the continuous auto-zoom animation on or off.
    ToggleAutoZoom,
    /// Stop auto-zoom and restore the zoom level to its initial value.
    ResetZoom,
}
