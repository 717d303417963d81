#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! # Billet: managed handles onto compositor buffers
//!
//! This crate provides [`SurfaceHandle`](surface::SurfaceHandle), a thin,
//! thread-safe wrapper around a reference to a raw buffer that a screen
//! compositor owns and renders. The handle tracks the lifetime and identity
//! of the underlying native resource across creation, sharing, ownership
//! transfer and cross-process hand-off, and exposes the frame protocol used
//! to draw into the buffer: lock a drawing context, fill it, and post it
//! back for composition.
//!
//! ## Structure of the crate
//!
//! - [`surface`] contains the handle itself, its drawing protocol and the
//!   serialization entry points.
//! - [`client`] defines the narrow contract a native compositor connection
//!   has to fulfill for handles to operate on. The compositor, its
//!   buffer-queue protocol and the pixel pipeline are explicitly outside
//!   of this crate.
//! - [`wire`] provides the byte stream primitives used when a handle
//!   crosses a process boundary.
//! - [`utils`] contains small shared types: dirty-region rectangles and
//!   display rotation symbols.
//!
//! ## Thread safety
//!
//! A [`SurfaceHandle`](surface::SurfaceHandle) is a passive object safe to
//! share between threads; every operation synchronizes on the handle's
//! single internal lock and completes synchronously. The drawing protocol
//! itself is a logical lock: issuing a second drawing context while one is
//! outstanding is a caller contract violation, not a queued wait.
//!
//! ## Logging
//!
//! Billet makes use of [`tracing`] for its internal logging, including the
//! leak diagnostic emitted when a handle is dropped while still bound to a
//! buffer. For release builds it is recommended to limit the log level
//! during compile time via the corresponding [`tracing`] features.

pub mod client;
pub mod error;
pub mod surface;
pub mod utils;
pub mod wire;
