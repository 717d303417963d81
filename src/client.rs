//! Contract between surface handles and the native compositor connection.
//!
//! A [`SurfaceHandle`](crate::surface::SurfaceHandle) never talks to the
//! compositor directly; everything goes through the narrow
//! [`CompositorClient`] interface defined here. Buffer queues, the pixel
//! pipeline and the cross-process container format all live behind this
//! boundary.
//!
//! Resources are referenced by [`NativeToken`]s, opaque values whose
//! internal encoding is entirely defined by the connection that issued
//! them. The handle's invariants hold regardless of what a token actually
//! encodes; the only value with crate-level meaning is
//! [`NativeToken::NULL`], the "no resource" sentinel.

use crate::error::SurfaceError;
use crate::utils::Rect;
use crate::wire::{ByteReader, ByteWriter};

/// Opaque token referencing a compositor-side buffer object.
///
/// A token is only meaningful to the [`CompositorClient`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeToken(u64);

impl NativeToken {
    /// The "no resource" sentinel.
    pub const NULL: NativeToken = NativeToken(0);

    /// Wraps a raw token value.
    #[inline]
    pub fn from_raw(raw: u64) -> NativeToken {
        NativeToken(raw)
    }

    /// The raw token value.
    #[inline]
    pub fn into_raw(self) -> u64 {
        self.0
    }

    /// Returns true if this is the "no resource" sentinel.
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Endpoint of a texture producer.
///
/// Frames drawn to a surface created from such an endpoint are queued to
/// the producer's consumer, which can attach them to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProducerEndpoint {
    /// Raw id of the endpoint, as assigned by the producer side.
    pub id: u64,
}

/// Source a native surface can be created from.
#[derive(Debug, Clone, Copy)]
pub enum SurfaceDescriptor {
    /// Attach to a texture producer endpoint.
    TextureProducer(ProducerEndpoint),
    /// Reference the buffer currently owned by an owner-side control
    /// handle, without taking over its ownership.
    Control(NativeToken),
}

/// Owner-side handle to a compositor buffer.
///
/// This is the representation held by the managing authority (typically
/// window management), distinct from the drawing-side
/// [`SurfaceHandle`](crate::surface::SurfaceHandle). It is consumed by
/// [`SurfaceHandle::copy_from`](crate::surface::SurfaceHandle::copy_from)
/// when a buffer is handed from the authority to a drawing client.
#[derive(Debug)]
pub struct ControlHandle {
    raw: NativeToken,
}

impl ControlHandle {
    /// Wraps the raw token of an owner-side buffer reference.
    pub fn from_raw(raw: NativeToken) -> ControlHandle {
        ControlHandle { raw }
    }

    /// The raw token this control handle refers to.
    pub fn raw(&self) -> NativeToken {
        self.raw
    }
}

/// Connection to the native compositor.
///
/// One method per operation a [`SurfaceHandle`](crate::surface::SurfaceHandle)
/// needs; implementations are expected to be cheap to call and to fail
/// immediately rather than block. All methods take `&self`, a connection is
/// shared between every handle created on it.
pub trait CompositorClient: Send + Sync {
    /// Create a native surface from the given descriptor.
    ///
    /// Fails with [`SurfaceError::ResourceExhausted`] if the compositor
    /// cannot allocate.
    fn create(&self, descriptor: &SurfaceDescriptor) -> Result<NativeToken, SurfaceError>;

    /// Destroy the surface referenced by `token`.
    fn destroy(&self, token: NativeToken);

    /// Returns whether `token` still references a live surface.
    fn is_valid(&self, token: NativeToken) -> bool;

    /// Returns whether the consumer of the surface is running behind its
    /// producer by more than one buffer.
    fn is_consumer_behind(&self, token: NativeToken) -> bool;

    /// Lock the surface's buffer for drawing.
    ///
    /// `dirty` is the region the caller intends to redraw; `None` requests
    /// the whole surface. The returned region is what the caller must
    /// actually redraw and may be larger than requested, for example after
    /// a resize or when the previous contents are unavailable.
    fn lock(&self, token: NativeToken, dirty: Option<Rect>) -> Result<Rect, SurfaceError>;

    /// Submit the locked buffer for composition and unlock it.
    fn unlock_and_post(&self, token: NativeToken);

    /// Materialize a native surface from its serialized descriptor.
    ///
    /// `slot` is the token currently bound into the destination handle; the
    /// transport takes care of releasing the resource it references when it
    /// is replaced. Fails with [`SurfaceError::Decode`] on a malformed
    /// stream.
    fn read(&self, slot: NativeToken, source: &mut ByteReader<'_>)
        -> Result<NativeToken, SurfaceError>;

    /// Append the serialized descriptor of `token` to `dest`.
    fn write(&self, token: NativeToken, dest: &mut ByteWriter);
}
