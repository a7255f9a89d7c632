//! Shims around serialization primitives

// Native JSON provider implementation
pub(crate) mod json;

/// Type alias for the JSON provider implementation.
///
/// This resolves to [`NativeJsonProvider`](json::NativeJsonProvider).
pub type JsonProvider = json::NativeJsonProvider;
