use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{BodyId, VisualHandle};

/// Something that happened to a body during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyEvent {
    /// `body` overlapped `other` during the collision stage.
    Touched { body: BodyId, other: BodyId },
    /// `body` was pushed back inside the canvas.
    CanvasEdgeTouched { body: BodyId },
    /// `body` left the registry, explicitly or because its lifespan ran out.
    Destroyed { body: BodyId, visual: VisualHandle },
}

impl BodyEvent {
    /// The body this event is addressed to.
    pub fn body(&self) -> BodyId {
        match *self {
            BodyEvent::Touched { body, .. }
            | BodyEvent::CanvasEdgeTouched { body }
            | BodyEvent::Destroyed { body, .. } => body,
        }
    }

    fn order_key(&self) -> (BodyId, u8, BodyId) {
        match *self {
            BodyEvent::Touched { body, other } => (body, 0, other),
            BodyEvent::CanvasEdgeTouched { body } => (body, 1, body),
            BodyEvent::Destroyed { body, .. } => (body, 2, body),
        }
    }
}

/// Requests recorded by event handlers, applied once delivery has finished.
#[derive(Debug, Default, Clone)]
pub struct Commands {
    destroy: Vec<BodyId>,
}

impl Commands {
    /// Queues `id` for destruction. Unknown or repeated ids are ignored later.
    pub fn destroy(&mut self, id: BodyId) {
        self.destroy.push(id);
    }

    pub fn is_empty(&self) -> bool {
        self.destroy.is_empty()
    }

    pub(crate) fn take_destroyed(&mut self) -> Vec<BodyId> {
        std::mem::take(&mut self.destroy)
    }
}

/// Event callback. Handlers may be moved to another thread together with the engine.
pub type EventHandler = Box<dyn FnMut(&BodyEvent, &mut Commands) + Send>;

/// Deferred event queue plus the handlers subscribed to it.
#[derive(Default)]
pub struct EventBus {
    touched: BTreeMap<BodyId, Vec<EventHandler>>,
    canvas_edge: BTreeMap<BodyId, Vec<EventHandler>>,
    destroyed: Vec<EventHandler>,
    queue: Vec<BodyEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_touched(&mut self, body: BodyId, handler: EventHandler) {
        self.touched.entry(body).or_default().push(handler);
    }

    pub fn subscribe_canvas_edge(&mut self, body: BodyId, handler: EventHandler) {
        self.canvas_edge.entry(body).or_default().push(handler);
    }

    pub fn subscribe_destroyed(&mut self, handler: EventHandler) {
        self.destroyed.push(handler);
    }

    /// Drops every per-body subscription of a body that left the registry.
    pub fn forget(&mut self, body: BodyId) {
        self.touched.remove(&body);
        self.canvas_edge.remove(&body);
    }

    pub fn push(&mut self, event: BodyEvent) {
        self.queue.push(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Delivers the queued events ordered by body id and returns them.
    pub fn dispatch(&mut self, commands: &mut Commands) -> Vec<BodyEvent> {
        let mut events = std::mem::take(&mut self.queue);
        events.sort_by_key(BodyEvent::order_key);

        for event in &events {
            let handlers = match event {
                BodyEvent::Touched { body, .. } => self.touched.get_mut(body),
                BodyEvent::CanvasEdgeTouched { body } => self.canvas_edge.get_mut(body),
                BodyEvent::Destroyed { .. } => Some(&mut self.destroyed),
            };
            if let Some(handlers) = handlers {
                for handler in handlers.iter_mut() {
                    handler(event, commands);
                }
            }
        }

        events
    }

    pub fn clear(&mut self) {
        self.touched.clear();
        self.canvas_edge.clear();
        self.destroyed.clear();
        self.queue.clear();
    }
}
