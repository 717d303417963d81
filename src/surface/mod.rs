//! Managed handle onto a raw buffer owned by the compositor.
//!
//! A [`SurfaceHandle`] tracks one compositor-side buffer reference through
//! its whole life: bound at creation or deserialization, re-bound when a
//! buffer is adopted or transferred, unbound on release. Every change of
//! the underlying reference bumps the handle's generation counter, so
//! observers can detect that the buffer identity changed even though the
//! handle object stayed the same.
//!
//! Drawing follows the classic frame protocol: lock a
//! [`DrawingContext`], redraw at least the region it reports dirty, then
//! post the frame back with [`SurfaceHandle::unlock_and_post`].
//!
//! All state lives behind a single lock per handle; handles may be shared
//! freely between threads. The one cross-handle operation,
//! [`SurfaceHandle::transfer_from`], takes both handles' locks in a fixed
//! order (source first) and expects the caller to be the only writer of
//! the source handle for its duration.

use std::fmt;
use std::ptr;
use std::sync::{Arc, Mutex};

use cgmath::Matrix3;
use tracing::{debug, trace};

use crate::client::{
    CompositorClient, ControlHandle, NativeToken, ProducerEndpoint, SurfaceDescriptor,
};
use crate::error::SurfaceError;
use crate::utils::{Rect, ReleaseGuard};
use crate::wire::{ByteReader, ByteWriter};

mod canvas;

pub use self::canvas::DrawingContext;

bitflags::bitflags! {
    /// Flags controlling [`SurfaceHandle::write_to`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct WriteFlags: u32 {
        /// The handle is transmitted as a one-shot hand-off; the local
        /// reference is released as soon as it has been written.
        const RELEASE = 1;
    }
}

/// Handle onto a raw buffer that is being managed by the screen compositor.
///
/// The handle owns a single native buffer reference at a time. It starts
/// out either unbound (to be filled in by [`read_from`]) or bound to a
/// freshly created buffer, and is re-bound by [`copy_from`],
/// [`transfer_from`] and [`read_from`]. Always call [`release`] when done;
/// a handle dropped while still bound emits a leak diagnostic and falls
/// back to releasing the reference itself.
///
/// All operations synchronize on the handle's internal lock and complete
/// synchronously.
///
/// [`read_from`]: SurfaceHandle::read_from
/// [`copy_from`]: SurfaceHandle::copy_from
/// [`transfer_from`]: SurfaceHandle::transfer_from
/// [`release`]: SurfaceHandle::release
pub struct SurfaceHandle {
    client: Arc<dyn CompositorClient>,
    // The one reusable drawing context of this handle, re-bound on every
    // lock. Kept outside the state lock, it carries its own.
    canvas: Arc<DrawingContext>,
    inner: Mutex<SurfaceInternal>,
}

#[derive(Debug)]
struct SurfaceInternal {
    native: NativeToken,
    generation: u64,
    name: String,
    compat_scale: Option<Matrix3<f32>>,
    guard: ReleaseGuard,
}

impl SurfaceInternal {
    /// Install a new native reference.
    ///
    /// Sole mutation point for the token: keeps the generation counter and
    /// the release guard in sync with every transition.
    fn set_native(&mut self, token: NativeToken) {
        if self.native != token {
            if self.native.is_null() && !token.is_null() {
                self.guard.arm();
            } else if !self.native.is_null() && token.is_null() {
                self.guard.disarm();
            }
            self.native = token;
            self.generation += 1;
            trace!(
                name = %self.name,
                token = ?token,
                generation = self.generation,
                "native buffer reference changed"
            );
        }
    }
}

impl SurfaceHandle {
    /// Create an unbound handle, to be filled in by
    /// [`read_from`](SurfaceHandle::read_from).
    pub fn new(client: Arc<dyn CompositorClient>) -> SurfaceHandle {
        SurfaceHandle {
            client,
            canvas: Arc::new(DrawingContext::new()),
            inner: Mutex::new(SurfaceInternal {
                native: NativeToken::NULL,
                generation: 0,
                name: String::new(),
                compat_scale: None,
                guard: ReleaseGuard::default(),
            }),
        }
    }

    /// Create a handle bound to a fresh buffer fed to a texture producer.
    ///
    /// Frames drawn to the surface are made available to the producer's
    /// consumer. Fails with [`SurfaceError::ResourceExhausted`] if the
    /// compositor cannot allocate the buffer.
    pub fn from_texture_producer(
        client: Arc<dyn CompositorClient>,
        endpoint: ProducerEndpoint,
    ) -> Result<SurfaceHandle, SurfaceError> {
        let token = client.create(&SurfaceDescriptor::TextureProducer(endpoint))?;
        let handle = SurfaceHandle::new(client);
        {
            let mut inner = handle.inner.lock().unwrap();
            inner.name = format!("{endpoint:?}");
            inner.set_native(token);
        }
        Ok(handle)
    }

    /// Create a handle adopting a non-owning reference to the buffer an
    /// owner-side control handle refers to.
    ///
    /// Equivalent to [`new`](SurfaceHandle::new) followed by
    /// [`copy_from`](SurfaceHandle::copy_from).
    pub fn from_control(
        client: Arc<dyn CompositorClient>,
        control: &ControlHandle,
    ) -> Result<SurfaceHandle, SurfaceError> {
        let handle = SurfaceHandle::new(client);
        handle.copy_from(control)?;
        Ok(handle)
    }

    /// Create a handle from its serialized form.
    ///
    /// Equivalent to [`new`](SurfaceHandle::new) followed by
    /// [`read_from`](SurfaceHandle::read_from).
    pub fn from_reader(
        client: Arc<dyn CompositorClient>,
        source: &mut ByteReader<'_>,
    ) -> Result<SurfaceHandle, SurfaceError> {
        let handle = SurfaceHandle::new(client);
        handle.read_from(source)?;
        Ok(handle)
    }

    /// Release the local reference to the compositor-side buffer.
    ///
    /// Always call this when done with a handle; afterwards the handle is
    /// invalid until re-bound. Releasing an unbound handle is a no-op.
    pub fn release(&self) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.native.is_null() {
            debug!(name = %inner.name, "releasing surface");
            self.client.destroy(inner.native);
            inner.set_native(NativeToken::NULL);
        }
    }

    /// Returns true if this handle is bound to a live buffer.
    ///
    /// False for unbound handles, without error; drawing will only succeed
    /// while this is true.
    pub fn is_valid(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        if inner.native.is_null() {
            return false;
        }
        self.client.is_valid(inner.native)
    }

    /// Generation number of this handle, incremented each time the native
    /// buffer reference contained within it changes.
    pub fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }

    /// Diagnostic name of this handle.
    pub fn name(&self) -> String {
        self.inner.lock().unwrap().name.clone()
    }

    /// Returns true if the consumer of this surface is running more than
    /// one buffer behind its producer.
    ///
    /// Fails with [`SurfaceError::NotBound`] on an unbound handle.
    pub fn is_consumer_behind(&self) -> Result<bool, SurfaceError> {
        let inner = self.inner.lock().unwrap();
        if inner.native.is_null() {
            return Err(SurfaceError::NotBound);
        }
        Ok(self.client.is_consumer_behind(inner.native))
    }

    /// Lock the surface's buffer and get the drawing context for it.
    ///
    /// `dirty` is the region the caller wants to redraw; `None` requests
    /// the whole surface. The compositor may expand the region, for
    /// example after a resize or when the previous contents are
    /// unavailable; the caller must redraw the entire region reported by
    /// [`DrawingContext::dirty_region`] on the returned context.
    ///
    /// After drawing, post the new contents with
    /// [`unlock_and_post`](SurfaceHandle::unlock_and_post). Only one
    /// drawing context may be outstanding per handle; locking again before
    /// posting is a caller contract violation.
    #[profiling::function]
    pub fn lock_drawing_context(
        &self,
        dirty: Option<Rect>,
    ) -> Result<Arc<DrawingContext>, SurfaceError> {
        let inner = self.inner.lock().unwrap();
        if inner.native.is_null() {
            return Err(SurfaceError::NotBound);
        }
        let region = self.client.lock(inner.native, dirty)?;
        self.canvas.rebind(region, inner.compat_scale);
        Ok(self.canvas.clone())
    }

    /// Post the new contents of the drawing context to the surface and
    /// unlock it.
    ///
    /// `context` must be the exact instance previously returned by
    /// [`lock_drawing_context`](SurfaceHandle::lock_drawing_context) on
    /// this handle, anything else fails with
    /// [`SurfaceError::InvalidArgument`].
    #[profiling::function]
    pub fn unlock_and_post(&self, context: &DrawingContext) -> Result<(), SurfaceError> {
        if !ptr::eq(context, Arc::as_ptr(&self.canvas)) {
            return Err(SurfaceError::InvalidArgument(
                "context was not issued by this handle",
            ));
        }
        let inner = self.inner.lock().unwrap();
        if inner.native.is_null() {
            return Err(SurfaceError::NotBound);
        }
        self.client.unlock_and_post(inner.native);
        trace!(name = %inner.name, "posted frame");
        Ok(())
    }

    /// Unlock the drawing context without posting.
    ///
    /// This capability was removed; the call always fails with
    /// [`SurfaceError::Unsupported`].
    #[deprecated(note = "removed; finish drawing with `unlock_and_post` instead")]
    pub fn unlock(&self, _context: &DrawingContext) -> Result<(), SurfaceError> {
        Err(SurfaceError::Unsupported)
    }

    /// Enable compatibility scaling of caller transforms by `scale`.
    ///
    /// Purely cosmetic: drawing contexts issued by this handle rewrite
    /// transform stores as described on
    /// [`DrawingContext::set_transform`]. Independent of the buffer
    /// lifecycle.
    pub fn set_compat_scale(&self, scale: f32) {
        let mut inner = self.inner.lock().unwrap();
        inner.compat_scale = Some(Matrix3::from_scale(scale));
    }

    /// Adopt a non-owning reference to the buffer an owner-side control
    /// handle currently refers to.
    ///
    /// This handle then holds a reference to the same data as the control
    /// handle without becoming its authoritative owner, the pattern used
    /// when window management hands a surface back to the client that
    /// draws into it. A previously bound buffer is released first.
    ///
    /// Fails with [`SurfaceError::InvalidArgument`] if the control handle
    /// is unbound.
    pub fn copy_from(&self, other: &ControlHandle) -> Result<(), SurfaceError> {
        if other.raw().is_null() {
            return Err(SurfaceError::InvalidArgument(
                "control handle is not bound; was it already released?",
            ));
        }
        // The new reference is created before our own lock is taken.
        let adopted = self.client.create(&SurfaceDescriptor::Control(other.raw()))?;

        let mut inner = self.inner.lock().unwrap();
        if !inner.native.is_null() {
            self.client.destroy(inner.native);
        }
        inner.set_native(adopted);
        Ok(())
    }

    /// Move ownership of the native buffer reference out of `other` and
    /// into this handle.
    ///
    /// Afterwards `other` is unbound and this handle owns what `other`
    /// owned; a buffer previously bound to this handle is released. Both
    /// generation counters are bumped. Calling this with `other` being the
    /// same instance is a no-op.
    ///
    /// Both handles' locks are taken, source first. The caller must be the
    /// only writer of `other` for the duration of the call, and both
    /// handles must belong to the same compositor connection; neither is
    /// enforced.
    pub fn transfer_from(&self, other: &SurfaceHandle) {
        if ptr::eq(self, other) {
            return;
        }
        let mut source = other.inner.lock().unwrap();
        let taken = source.native;
        // Keep the source locked until the token is installed, so at no
        // point do two handles own it.
        let mut dest = self.inner.lock().unwrap();
        debug!(from = %source.name, to = %dest.name, token = ?taken, "transferring surface ownership");
        source.set_native(NativeToken::NULL);
        if !dest.native.is_null() {
            self.client.destroy(dest.native);
        }
        dest.set_native(taken);
    }

    /// Rebind this handle from its serialized form.
    ///
    /// Reads the name, then hands the stream to the compositor connection
    /// to materialize the encoded buffer reference into this handle's
    /// slot; the resource previously referenced by the slot is reclaimed
    /// by the transport, not by this handle. On a decode failure the
    /// handle is left unbound rather than half-bound.
    pub fn read_from(&self, source: &mut ByteReader<'_>) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.name = source.read_string()?;
        match self.client.read(inner.native, source) {
            Ok(token) => {
                inner.set_native(token);
                Ok(())
            }
            Err(err) => {
                inner.set_native(NativeToken::NULL);
                Err(err)
            }
        }
    }

    /// Append the serialized form of this handle to `dest`.
    ///
    /// Writes the name followed by the compositor-defined encoding of the
    /// buffer reference. With [`WriteFlags::RELEASE`] the local reference
    /// is released immediately after writing, modeling a one-shot hand-off
    /// across the process boundary.
    pub fn write_to(&self, dest: &mut ByteWriter, flags: WriteFlags) {
        {
            let inner = self.inner.lock().unwrap();
            dest.write_string(&inner.name);
            self.client.write(inner.native, dest);
        }
        if flags.contains(WriteFlags::RELEASE) {
            self.release();
        }
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("SurfaceHandle")
            .field("name", &inner.name)
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        let Ok(inner) = self.inner.get_mut() else {
            return;
        };
        inner.guard.warn_if_armed(&inner.name);
        if !inner.native.is_null() {
            self.client.destroy(inner.native);
            inner.set_native(NativeToken::NULL);
        }
    }
}
