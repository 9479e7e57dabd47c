//! Viewer context handed to the navmesh generator: the scene plus the redraw
//! surface the debug visual has to follow.

use tracing::debug;

use crate::scene::{Scene, SceneNode};

pub type HookId = u64;

/// Callback invoked with the new surface size on every resize event
pub type ResizeHook = Box<dyn FnMut(u32, u32) + Send>;

/// Rendering viewport as seen by the navmesh core
pub trait RedrawSurface {
    /// Current size in pixels
    fn size(&self) -> (u32, u32);

    fn add_resize_hook(&mut self, hook: ResizeHook) -> HookId;

    /// Returns false when no hook with that id was registered
    fn remove_resize_hook(&mut self, id: HookId) -> bool;
}

/// Headless redraw surface; `resize` plays the role of the window resize event
pub struct Viewport {
    width: u32,
    height: u32,
    hooks: Vec<(HookId, ResizeHook)>,
    next_hook: HookId,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            hooks: Vec::new(),
            next_hook: 1,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for (_, hook) in self.hooks.iter_mut() {
            hook(width, height);
        }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

impl RedrawSurface for Viewport {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn add_resize_hook(&mut self, hook: ResizeHook) -> HookId {
        let id = self.next_hook;
        self.next_hook += 1;
        self.hooks.push((id, hook));
        id
    }

    fn remove_resize_hook(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hook_id, _)| *hook_id != id);
        self.hooks.len() != before
    }
}

pub struct ViewerContext<S: RedrawSurface = Viewport> {
    pub scene: Scene,
    pub surface: S,
}

impl<S: RedrawSurface> ViewerContext<S> {
    pub fn new(scene: Scene, surface: S) -> Self {
        Self { scene, surface }
    }

    /// Detach every transform gizmo bound to a scene object.
    /// A gizmo left attached during a build would be collected mid-drag.
    pub fn release_manipulators(&mut self) -> usize {
        let released = self.scene.remove_where(SceneNode::is_transform_gizmo);
        if released > 0 {
            debug!("Released {} transform gizmo(s)", released);
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_resize_hooks() {
        let mut viewport = Viewport::new(800, 600);
        let seen = Arc::new(AtomicU32::new(0));
        let hook_seen = Arc::clone(&seen);
        let id = viewport.add_resize_hook(Box::new(move |w, _| {
            hook_seen.store(w, Ordering::SeqCst);
        }));

        viewport.resize(1024, 768);
        assert_eq!(seen.load(Ordering::SeqCst), 1024);
        assert_eq!(viewport.size(), (1024, 768));

        assert!(viewport.remove_resize_hook(id));
        assert!(!viewport.remove_resize_hook(id));
        viewport.resize(640, 480);
        assert_eq!(seen.load(Ordering::SeqCst), 1024);
        assert_eq!(viewport.hook_count(), 0);
    }
}
