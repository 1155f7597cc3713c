//! Bridge connection handle and topic subscriptions.
//!
//! DESIGN
//! ======
//! [`Ros`] does not own a socket. The host drains outbound frames from the
//! receiver returned by [`Ros::new`] and writes them to its transport, and
//! feeds every inbound text frame to [`Ros::handle_text`]. Delivery runs
//! synchronously inside that call.
//!
//! - The first subscriber on a topic sends `subscribe`; removing the last
//!   one sends `unsubscribe` with the same correlation id.
//! - Callbacks return [`ControlFlow::Break`] to cancel their own
//!   subscription. The subscriber list is snapshotted before delivery, so
//!   callbacks may also subscribe or unsubscribe re-entrantly.

#[cfg(test)]
#[path = "ros_test.rs"]
mod ros_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;
use std::rc::Rc;

use frames::{CodecError, Compression, Frame, Op};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde_json::Value;
use tracing::{debug, warn};

/// Message type of occupancy grid topics.
pub const OCCUPANCY_GRID_TYPE: &str = "nav_msgs/OccupancyGrid";

/// Error returned by connection and topic operations.
#[derive(Debug, thiserror::Error)]
pub enum RosError {
    /// The host dropped the outbound frame receiver.
    #[error("bridge connection closed")]
    Disconnected,
    /// An inbound frame could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Identifies one callback registered on a topic.
pub type SubscriberId = u64;

type Callback = Rc<RefCell<dyn FnMut(&Value) -> ControlFlow<()>>>;

struct Subscriber {
    id: SubscriberId,
    callback: Callback,
}

struct TopicEntry {
    /// Correlation id sent with `subscribe` and reused for `unsubscribe`.
    bridge_id: String,
    subscribers: Vec<Subscriber>,
}

struct RosInner {
    outbound: UnboundedSender<Frame>,
    topics: HashMap<String, TopicEntry>,
    id_counter: u64,
}

/// Shared handle to one bridge connection.
#[derive(Clone)]
pub struct Ros {
    inner: Rc<RefCell<RosInner>>,
}

impl fmt::Debug for Ros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Ros")
            .field("topics", &inner.topics.keys().collect::<Vec<_>>())
            .field("connected", &!inner.outbound.is_closed())
            .finish_non_exhaustive()
    }
}

impl Ros {
    /// Create a connection handle and the receiver of frames to send.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<Frame>) {
        let (outbound, rx) = mpsc::unbounded();
        let inner = RosInner { outbound, topics: HashMap::new(), id_counter: 0 };
        (Self { inner: Rc::new(RefCell::new(inner)) }, rx)
    }

    /// Whether the host still holds the outbound receiver.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.inner.borrow().outbound.is_closed()
    }

    /// Number of callbacks registered on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.borrow().topics.get(topic).map_or(0, |t| t.subscribers.len())
    }

    /// Feed one inbound JSON frame. `png` frames are unpacked first. Returns
    /// the number of callbacks invoked.
    ///
    /// # Errors
    ///
    /// Returns [`RosError::Codec`] for malformed text or a broken `png` frame.
    pub fn handle_text(&self, text: &str) -> Result<usize, RosError> {
        let frame = frames::decode_text(text)?;
        Ok(self.handle_frame(&frame))
    }

    /// Dispatch a decoded inbound frame. Returns the number of callbacks invoked.
    pub fn handle_frame(&self, frame: &Frame) -> usize {
        match frame.op {
            Op::Publish => {
                let (Some(topic), Some(msg)) = (frame.topic.as_deref(), frame.msg.as_ref()) else {
                    warn!(topic = ?frame.topic, "publish frame without topic or msg");
                    return 0;
                };
                self.deliver(topic, msg)
            }
            Op::Status => {
                let level = frame.level.as_deref().unwrap_or("info");
                let text = frame.msg.as_ref().and_then(Value::as_str).unwrap_or("");
                if matches!(level, "error" | "warning") {
                    warn!(%level, id = ?frame.id, "bridge status: {text}");
                } else {
                    debug!(%level, id = ?frame.id, "bridge status: {text}");
                }
                0
            }
            Op::Png => match frames::unpack_png(frame) {
                Ok(inner) => self.handle_frame(&inner),
                Err(e) => {
                    warn!(error = %e, "dropping png frame");
                    0
                }
            },
            Op::Subscribe | Op::Unsubscribe => {
                debug!(op = ?frame.op, topic = ?frame.topic, "ignoring client-side op from bridge");
                0
            }
        }
    }

    fn send(&self, frame: Frame) -> Result<(), RosError> {
        self.inner.borrow().outbound.unbounded_send(frame).map_err(|_| RosError::Disconnected)
    }

    fn add_subscriber(
        &self,
        topic: &str,
        msg_type: &str,
        compression: Compression,
        callback: Callback,
    ) -> Result<SubscriberId, RosError> {
        let (id, subscribe) = {
            let mut inner = self.inner.borrow_mut();
            inner.id_counter += 1;
            let id = inner.id_counter;
            let subscribe = if inner.topics.contains_key(topic) {
                None
            } else {
                let bridge_id = format!("subscribe:{topic}:{id}");
                inner.topics.insert(topic.to_owned(), TopicEntry { bridge_id: bridge_id.clone(), subscribers: Vec::new() });
                Some(Frame::subscribe(bridge_id, topic, msg_type, compression))
            };
            (id, subscribe)
        };

        if let Some(frame) = subscribe {
            if let Err(e) = self.send(frame) {
                self.inner.borrow_mut().topics.remove(topic);
                return Err(e);
            }
            debug!(%topic, %msg_type, "subscribed");
        }

        if let Some(entry) = self.inner.borrow_mut().topics.get_mut(topic) {
            entry.subscribers.push(Subscriber { id, callback });
        }
        Ok(id)
    }

    /// Remove a callback. The local registration is always dropped; the
    /// error only reports that the bridge could not be told.
    fn remove_subscriber(&self, topic: &str, id: SubscriberId) -> Result<bool, RosError> {
        let unsubscribe = {
            let mut inner = self.inner.borrow_mut();
            let Some(entry) = inner.topics.get_mut(topic) else {
                return Ok(false);
            };
            let before = entry.subscribers.len();
            entry.subscribers.retain(|s| s.id != id);
            if entry.subscribers.len() == before {
                return Ok(false);
            }
            if entry.subscribers.is_empty() {
                inner.topics.remove(topic).map(|entry| Frame::unsubscribe(entry.bridge_id, topic))
            } else {
                None
            }
        };

        if let Some(frame) = unsubscribe {
            self.send(frame)?;
            debug!(%topic, "unsubscribed");
        }
        Ok(true)
    }

    fn is_registered(&self, topic: &str, id: SubscriberId) -> bool {
        self.inner
            .borrow()
            .topics
            .get(topic)
            .is_some_and(|t| t.subscribers.iter().any(|s| s.id == id))
    }

    fn deliver(&self, topic: &str, msg: &Value) -> usize {
        let snapshot: Vec<(SubscriberId, Callback)> = match self.inner.borrow().topics.get(topic) {
            Some(entry) => entry.subscribers.iter().map(|s| (s.id, Rc::clone(&s.callback))).collect(),
            None => {
                debug!(%topic, "message for topic without subscribers");
                return 0;
            }
        };

        let mut delivered = 0;
        for (id, callback) in snapshot {
            if !self.is_registered(topic, id) {
                continue;
            }
            let Ok(mut f) = callback.try_borrow_mut() else {
                continue;
            };
            let flow = (&mut *f)(msg);
            drop(f);
            delivered += 1;
            if flow.is_break() {
                if let Err(e) = self.remove_subscriber(topic, id) {
                    warn!(error = %e, %topic, "could not send unsubscribe");
                }
            }
        }
        delivered
    }
}

/// A named topic on a connection, holding at most one subscription.
#[derive(Debug)]
pub struct Topic {
    ros: Ros,
    name: String,
    message_type: String,
    compression: Compression,
    subscription: Cell<Option<SubscriberId>>,
}

impl Topic {
    #[must_use]
    pub fn new(ros: &Ros, name: impl Into<String>, message_type: impl Into<String>) -> Self {
        Self {
            ros: ros.clone(),
            name: name.into(),
            message_type: message_type.into(),
            compression: Compression::None,
            subscription: Cell::new(None),
        }
    }

    /// Request `compression` for messages on this topic.
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Register `callback` for messages on this topic, replacing any
    /// previous subscription made through this handle.
    ///
    /// # Errors
    ///
    /// Returns [`RosError::Disconnected`] if the subscribe frame cannot be sent.
    pub fn subscribe(&self, callback: impl FnMut(&Value) -> ControlFlow<()> + 'static) -> Result<SubscriberId, RosError> {
        self.unsubscribe()?;
        let callback: Callback = Rc::new(RefCell::new(callback));
        let id = self.ros.add_subscriber(&self.name, &self.message_type, self.compression, callback)?;
        self.subscription.set(Some(id));
        Ok(id)
    }

    /// Cancel this handle's subscription. Returns `false` if there was none
    /// (including when its callback already cancelled itself).
    ///
    /// # Errors
    ///
    /// Returns [`RosError::Disconnected`] if the unsubscribe frame cannot be
    /// sent; the local subscription is removed regardless.
    pub fn unsubscribe(&self) -> Result<bool, RosError> {
        match self.subscription.take() {
            Some(id) => self.ros.remove_subscriber(&self.name, id),
            None => Ok(false),
        }
    }

    /// Whether this handle's callback is still registered.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.get().is_some_and(|id| self.ros.is_registered(&self.name, id))
    }
}
