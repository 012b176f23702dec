//! Integration Tests Module
//!
//! End-to-end behaviour of the insight engine: tool containment against a
//! dead upstream, stream sessions driven by scripted transports, cache
//! expiry and first-writer-wins, conversations, and settings files.

// Scripted transports and frame helpers
mod support;


// Frame splitting, cancellation silence and stream failures
mod session_test;

// TTL expiry and first-writer-wins across panels
mod cache_test;

// Multi-turn conversations over the engine state
mod conversation_test;

// Settings store on disk
mod settings_test;
