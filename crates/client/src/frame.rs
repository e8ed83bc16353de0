use std::collections::BTreeMap;
use std::fmt;

use maze::EntityId;

pub type FrameCallback<C> = Box<dyn FnMut(&mut C, f64)>;

/// Per-entity frame callbacks, re-run by the render loop once per display
/// refresh. One callback per entity at most; an unsubscribed callback is
/// dropped immediately and can never fire again.
pub struct FrameScheduler<C> {
    subscriptions: BTreeMap<EntityId, FrameCallback<C>>,
    running: bool,
    frames: u64,
}

impl<C> FrameScheduler<C> {
    pub fn new() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            running: false,
            frames: 0,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            log::debug!("frame scheduler started with {} subscriptions", self.len());
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("frame scheduler stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Registers `update` for `entity`, replacing any earlier callback.
    pub fn subscribe<F>(&mut self, entity: EntityId, update: F)
    where
        F: FnMut(&mut C, f64) + 'static,
    {
        if self.subscriptions.insert(entity, Box::new(update)).is_some() {
            log::trace!("replaced frame callback for entity {}", entity);
        }
    }

    pub fn unsubscribe(&mut self, entity: EntityId) -> bool {
        self.subscriptions.remove(&entity).is_some()
    }

    pub fn is_subscribed(&self, entity: EntityId) -> bool {
        self.subscriptions.contains_key(&entity)
    }

    /// Runs every callback once, in entity order. Returns how many ran.
    pub fn tick(&mut self, ctx: &mut C, frame_time_ms: f64) -> usize {
        if !self.running {
            return 0;
        }
        self.frames += 1;

        for update in self.subscriptions.values_mut() {
            update(ctx, frame_time_ms);
        }
        self.subscriptions.len()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl<C> Default for FrameScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for FrameScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("entities", &self.subscriptions.keys().collect::<Vec<_>>())
            .field("running", &self.running)
            .field("frames", &self.frames)
            .finish()
    }
}
