//! The reusable drawing context bound to a surface while it is locked.

use std::sync::Mutex;

use cgmath::{Matrix3, SquareMatrix};

use crate::utils::Rect;

/// Drawing context granting frame-exclusive access to a surface's pixels.
///
/// A context is obtained from
/// [`SurfaceHandle::lock_drawing_context`](super::SurfaceHandle::lock_drawing_context)
/// and must be handed back to
/// [`SurfaceHandle::unlock_and_post`](super::SurfaceHandle::unlock_and_post)
/// on the same handle once drawing is finished. Each handle owns exactly one
/// context instance, which is re-bound on every lock rather than
/// reallocated; a context from another handle is rejected at unlock time.
///
/// When the owning handle is in compatibility-scaling mode, transform
/// stores through [`set_transform`](DrawingContext::set_transform) are
/// conditionally rewritten; see the method docs.
#[derive(Debug)]
pub struct DrawingContext {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    dirty: Rect,
    transform: Matrix3<f32>,
    compat_scale: Option<Matrix3<f32>>,
    // Last transform handed out by `transform()`. A caller storing this
    // exact value back is restoring, not setting, and must not be rescaled.
    saved: Option<Matrix3<f32>>,
}

impl DrawingContext {
    pub(crate) fn new() -> DrawingContext {
        DrawingContext {
            state: Mutex::new(State {
                dirty: Rect::default(),
                transform: Matrix3::identity(),
                compat_scale: None,
                saved: None,
            }),
        }
    }

    /// Region the caller must redraw entirely for the current frame.
    ///
    /// This is the possibly expanded version of the region requested at
    /// lock time; redrawing less than this leaves stale pixels on screen.
    pub fn dirty_region(&self) -> Rect {
        self.state.lock().unwrap().dirty
    }

    /// Set the transform applied to subsequent drawing commands.
    ///
    /// In compatibility-scaling mode the stored transform is the caller's
    /// transform pre-multiplied by the scale matrix, unless the value is
    /// the exact transform previously obtained from
    /// [`transform`](DrawingContext::transform). That exception keeps the
    /// common save-modify-restore pattern working: a restored transform
    /// was already scaled when it was first set. There are applications
    /// this model does not cover, but it holds for the usual ones.
    pub fn set_transform(&self, transform: Matrix3<f32>) {
        let mut state = self.state.lock().unwrap();
        state.transform = match (state.compat_scale, state.saved) {
            (Some(scale), Some(saved)) if saved != transform => scale * transform,
            _ => transform,
        };
    }

    /// The transform currently applied to drawing commands.
    ///
    /// The returned value is remembered, so storing it back through
    /// [`set_transform`](DrawingContext::set_transform) restores it
    /// without rescaling.
    pub fn transform(&self) -> Matrix3<f32> {
        let mut state = self.state.lock().unwrap();
        state.saved = Some(state.transform);
        state.transform
    }

    /// Bind the context to a freshly locked buffer.
    pub(crate) fn rebind(&self, dirty: Rect, compat_scale: Option<Matrix3<f32>>) {
        let mut state = self.state.lock().unwrap();
        state.dirty = dirty;
        state.transform = Matrix3::identity();
        state.compat_scale = compat_scale;
    }
}
