use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a [SampleFrame].
///
/// Two frames with equal values still have different ids. Ids are never reused
/// within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl FrameId {
    fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One tick worth of magnitude values produced by a capture source.
///
/// Cloning a frame is cheap and keeps the identity: the clone refers to the same
/// values and the same [FrameId]. A frame is immutable once created, the next tick
/// produces a new one.
#[derive(Debug, Clone)]
pub struct SampleFrame {
    id: FrameId,
    values: Arc<[f32]>,
}

impl SampleFrame {
    /// Creates a new frame with a fresh identity.
    pub fn new(values: impl Into<Arc<[f32]>>) -> Self {
        Self {
            id: FrameId::next(),
            values: values.into(),
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns a handle which doesn't keep the values of this frame alive.
    pub fn downgrade(&self) -> WeakFrame {
        WeakFrame {
            id: self.id,
            values: Arc::downgrade(&self.values),
        }
    }
}

impl Deref for SampleFrame {
    type Target = [f32];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl From<Vec<f32>> for SampleFrame {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Non-owning handle of a [SampleFrame].
#[derive(Debug, Clone)]
pub struct WeakFrame {
    id: FrameId,
    values: Weak<[f32]>,
}

impl WeakFrame {
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Returns `true` as long as at least one [SampleFrame] with this identity exists.
    pub fn is_alive(&self) -> bool {
        self.values.strong_count() > 0
    }

    pub fn upgrade(&self) -> Option<SampleFrame> {
        self.values.upgrade().map(|values| SampleFrame {
            id: self.id,
            values,
        })
    }
}
