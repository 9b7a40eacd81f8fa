// primus/src/registry.rs
//
//! Bookkeeping for application-visible drawables and contexts.
//!
//! The application holds handles minted on the displaying side (or plain X
//! windows it created itself), while all of its rendering happens against
//! accelerating-side resources. These registries carry the mapping between
//! the two worlds.

use crate::glx::types::{GLXContext, GLXDrawable, GLXFBConfig};
use crate::pipeline::{PipeShared, WorkerPair};

use euclid::default::Size2D;
use fnv::FnvHashMap;
use std::sync::Arc;
use x11::xlib;

/// How the application obtained a drawable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DrawableKind {
    /// A plain X window made current directly, never announced through GLX.
    RawWindow,
    /// A window wrapped via `glXCreateWindow`.
    GlxWindow,
    Pixmap,
    Pbuffer,
}

impl DrawableKind {
    /// Whether frames of this drawable end up in a visible window.
    pub fn presented(self) -> bool {
        match self {
            DrawableKind::RawWindow | DrawableKind::GlxWindow => true,
            DrawableKind::Pixmap | DrawableKind::Pbuffer => false,
        }
    }
}

/// Per-drawable record tying an application handle to its backing
/// accelerating-side surface and, for window kinds, its worker pair.
pub struct DrawableInfo {
    pub kind: DrawableKind,
    /// Accelerating-side framebuffer configuration currently bound here.
    pub fbconfig: GLXFBConfig,
    /// The visible X window, for window kinds.
    pub window: xlib::Window,
    /// Accelerating-side context that was current when the workers were
    /// spawned; the readback context is created sharing with it.
    pub actx: GLXContext,
    pub workers: Option<WorkerPair>,
    /// State shared with the worker threads.
    pub shared: Arc<PipeShared>,
}

impl DrawableInfo {
    pub fn new(
        kind: DrawableKind,
        fbconfig: GLXFBConfig,
        window: xlib::Window,
        size: Size2D<i32>,
    ) -> DrawableInfo {
        DrawableInfo {
            kind,
            fbconfig,
            window,
            actx: std::ptr::null(),
            workers: None,
            shared: Arc::new(PipeShared::new(size)),
        }
    }
}

#[derive(Default)]
pub struct DrawableRegistry {
    map: FnvHashMap<GLXDrawable, DrawableInfo>,
}

impl DrawableRegistry {
    pub fn known(&self, drawable: GLXDrawable) -> bool {
        self.map.contains_key(&drawable)
    }

    pub fn get(&self, drawable: GLXDrawable) -> Option<&DrawableInfo> {
        self.map.get(&drawable)
    }

    pub fn get_mut(&mut self, drawable: GLXDrawable) -> Option<&mut DrawableInfo> {
        self.map.get_mut(&drawable)
    }

    pub fn insert(&mut self, drawable: GLXDrawable, info: DrawableInfo) {
        self.map.insert(drawable, info);
    }

    pub fn remove(&mut self, drawable: GLXDrawable) -> Option<DrawableInfo> {
        self.map.remove(&drawable)
    }

    /// Detaches every live worker pair, for teardown outside the lock.
    pub fn drain_workers(&mut self) -> Vec<(Arc<PipeShared>, WorkerPair)> {
        self.map
            .values_mut()
            .filter_map(|info| {
                let pair = info.workers.take()?;
                Some((Arc::clone(&info.shared), pair))
            })
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Dense identifier of a set of contexts sharing GL objects.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ShareGroup(pub u32);

pub struct ContextRecord {
    pub fbconfig: GLXFBConfig,
    pub sharegroup: ShareGroup,
}

#[derive(Default)]
pub struct ContextRegistry {
    map: FnvHashMap<GLXContext, ContextRecord>,
    next_sharegroup: u32,
}

impl ContextRegistry {
    /// Records a freshly created context. A context created with a share
    /// list inherits the share group of its parent; otherwise it founds a
    /// new one.
    pub fn record(&mut self, ctx: GLXContext, fbconfig: GLXFBConfig, share: GLXContext) {
        let sharegroup = match self.map.get(&share) {
            Some(parent) if !share.is_null() => parent.sharegroup,
            _ => self.fresh_sharegroup(),
        };
        self.map.insert(ctx, ContextRecord { fbconfig, sharegroup });
    }

    fn fresh_sharegroup(&mut self) -> ShareGroup {
        let group = ShareGroup(self.next_sharegroup);
        self.next_sharegroup += 1;
        group
    }

    pub fn get(&self, ctx: GLXContext) -> Option<&ContextRecord> {
        self.map.get(&ctx)
    }

    pub fn remove(&mut self, ctx: GLXContext) {
        self.map.remove(&ctx);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// True when both contexts are known and see each other's GL objects.
    pub fn same_sharegroup(&self, a: GLXContext, b: GLXContext) -> bool {
        match (self.map.get(&a), self.map.get(&b)) {
            (Some(ra), Some(rb)) => ra.sharegroup == rb.sharegroup,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn fake_ctx(value: usize) -> GLXContext {
        value as GLXContext
    }

    fn fake_config(value: usize) -> GLXFBConfig {
        value as GLXFBConfig
    }

    #[test]
    fn sharegroups_are_inherited_through_share_lists() {
        let mut contexts = ContextRegistry::default();
        contexts.record(fake_ctx(0x10), fake_config(1), ptr::null());
        contexts.record(fake_ctx(0x20), fake_config(1), fake_ctx(0x10));
        contexts.record(fake_ctx(0x30), fake_config(1), ptr::null());

        assert!(contexts.same_sharegroup(fake_ctx(0x10), fake_ctx(0x20)));
        assert!(!contexts.same_sharegroup(fake_ctx(0x10), fake_ctx(0x30)));
        assert_eq!(contexts.get(fake_ctx(0x10)).unwrap().sharegroup, ShareGroup(0));
        assert_eq!(contexts.get(fake_ctx(0x30)).unwrap().sharegroup, ShareGroup(1));
    }

    #[test]
    fn sharing_with_an_unknown_context_founds_a_new_group() {
        let mut contexts = ContextRegistry::default();
        contexts.record(fake_ctx(0x10), fake_config(1), fake_ctx(0x99));
        contexts.record(fake_ctx(0x20), fake_config(1), fake_ctx(0x10));
        assert!(contexts.same_sharegroup(fake_ctx(0x10), fake_ctx(0x20)));
    }

    #[test]
    fn unknown_contexts_never_share() {
        let contexts = ContextRegistry::default();
        assert!(!contexts.same_sharegroup(fake_ctx(0x10), fake_ctx(0x10)));
    }

    #[test]
    fn destroyed_contexts_are_forgotten() {
        let mut contexts = ContextRegistry::default();
        contexts.record(fake_ctx(0x10), fake_config(1), ptr::null());
        assert!(!contexts.is_empty());
        contexts.remove(fake_ctx(0x10));
        assert!(contexts.is_empty());
        assert!(contexts.get(fake_ctx(0x10)).is_none());
    }

    #[test]
    fn drawable_lifecycle() {
        let mut drawables = DrawableRegistry::default();
        let info = DrawableInfo::new(
            DrawableKind::RawWindow,
            fake_config(1),
            7,
            euclid::default::Size2D::new(640, 480),
        );
        assert!(!drawables.known(42));
        drawables.insert(42, info);
        assert!(drawables.known(42));
        assert_eq!(drawables.get(42).unwrap().kind, DrawableKind::RawWindow);
        assert_eq!(drawables.get(42).unwrap().shared.size().width, 640);
        let removed = drawables.remove(42).unwrap();
        assert!(removed.workers.is_none());
        assert_eq!(drawables.len(), 0);
    }
}
