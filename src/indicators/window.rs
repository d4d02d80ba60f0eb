// =============================================================================
// Fixed-capacity ring buffer for trailing indicator windows
// =============================================================================
//
// Backing store for the two bounded sliding windows in `IndicatorState`
// (recent closes, recent band-widths). Push is O(1) with eviction of the
// oldest value once the buffer is full; the circular write index never
// reallocates after construction.

/// Bounded sliding window of `f64` samples, oldest evicted first.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buf: Vec<f64>,
    capacity: usize,
    /// Next write position once the buffer has wrapped.
    head: usize,
    full: bool,
}

impl RingBuffer {
    /// Create a buffer that retains at most `capacity` samples.
    ///
    /// A zero capacity is bumped to 1 so that `push` always retains the most
    /// recent sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            full: false,
        }
    }

    /// Append a sample, evicting the oldest when at capacity.
    pub fn push(&mut self, value: f64) {
        if self.full {
            self.buf[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        } else {
            self.buf.push(value);
            if self.buf.len() == self.capacity {
                self.full = true;
                // head stays at 0: the oldest element after the first wrap.
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Copy out the samples in insertion order, oldest first.
    pub fn to_ordered_vec(&self) -> Vec<f64> {
        if !self.full {
            return self.buf.clone();
        }
        let mut out = Vec::with_capacity(self.capacity);
        out.extend_from_slice(&self.buf[self.head..]);
        out.extend_from_slice(&self.buf[..self.head]);
        out
    }
}
