//! Growable byte ring between the emulator and the audio callback
//!
//! The ring is never "full": the producer only writes a block when it fits in
//! the free space with at least one byte to spare (a head equal to the tail
//! means empty), and the owner grows the ring when the buffering policy asks
//! for more room. Growth keeps every unread byte in ring order.
//!
//! # Thread Safety
//! The ring itself is not synchronized. The controller keeps it behind the
//! same mutex as the resampler, so pushes, drains and growth never overlap.

use crate::{ResyncError, Result};

/// Byte ring with a write cursor (`head`) and a read cursor (`tail`)
#[derive(Debug, Default)]
pub struct RingBuffer {
    data: Vec<u8>,
    head: usize,
    tail: usize,
}

impl RingBuffer {
    /// Allocate a zeroed ring of `capacity` bytes
    ///
    /// # Errors
    ///
    /// Returns [`ResyncError::Allocation`] if the storage cannot be reserved.
    pub fn new(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ResyncError::Allocation {
                requested: capacity,
            })?;
        data.resize(capacity, 0);

        Ok(RingBuffer {
            data,
            head: 0,
            tail: 0,
        })
    }

    /// Free the storage and reset both cursors
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.head = 0;
        self.tail = 0;
    }

    /// Size of the backing storage in bytes
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Write cursor position
    pub fn head(&self) -> usize {
        self.head
    }

    /// Read cursor position
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Unread bytes, counting both segments when the data wraps
    pub fn len(&self) -> usize {
        if self.head >= self.tail {
            self.head - self.tail
        } else {
            self.capacity() - self.tail + self.head
        }
    }

    /// Whether there is nothing to read
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Unread fraction of the storage (0.0 to 1.0)
    pub fn fill_percentage(&self) -> f32 {
        if self.capacity() == 0 {
            return 0.0;
        }
        self.len() as f32 / self.capacity() as f32
    }

    /// Grow the storage to `new_capacity` bytes, keeping unread data in order
    ///
    /// Smaller sizes are ignored and the appended region is zeroed. When the
    /// unread data wraps, the wrapped prefix is moved into the appended space
    /// (as much of it as fits, the rest shifted down to offset 0) and the write
    /// cursor follows it.
    ///
    /// # Errors
    ///
    /// Returns [`ResyncError::Allocation`] if the extra storage cannot be reserved;
    /// the ring is left untouched in that case.
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let old_capacity = self.capacity();
        if new_capacity < old_capacity {
            return Ok(());
        }

        let delta = new_capacity - old_capacity;
        self.data
            .try_reserve_exact(delta)
            .map_err(|_| ResyncError::Allocation {
                requested: new_capacity,
            })?;
        self.data.resize(new_capacity, 0);

        // Unwrapped data sits in [tail, head) and the appended bytes are already zero
        if self.head >= self.tail {
            return Ok(());
        }

        let delta_max = self.head;
        if delta_max <= delta {
            self.data.copy_within(0..delta_max, old_capacity);
            self.head = (old_capacity + self.head) % new_capacity;
        } else {
            self.data.copy_within(0..delta, old_capacity);
            self.data.copy_within(delta..delta_max, 0);
            self.head -= delta;
        }

        debug_assert!(self.head <= self.capacity() && self.tail <= self.capacity());
        Ok(())
    }

    /// Contiguous writable run starting at `head`, plus the free bytes at the
    /// front of the storage that a split write could use
    pub fn writable_view(&mut self) -> (&mut [u8], usize) {
        debug_assert!(self.head <= self.capacity());
        debug_assert!(self.tail <= self.capacity());

        let (end, extra) = if self.head >= self.tail {
            (self.capacity(), self.tail)
        } else {
            (self.tail, 0)
        };
        (&mut self.data[self.head..end], extra)
    }

    /// Contiguous readable run starting at `tail`, plus the wrapped bytes at
    /// the front of the storage
    pub fn readable_view(&self) -> (&[u8], usize) {
        debug_assert!(self.head <= self.capacity());
        debug_assert!(self.tail <= self.capacity());

        if self.head >= self.tail {
            (&self.data[self.tail..self.head], 0)
        } else {
            (&self.data[self.tail..], self.head)
        }
    }

    /// Bytes that can be written without the write cursor catching up with
    /// the read cursor, counting both segments
    pub fn free_len(&self) -> usize {
        if self.head >= self.tail {
            self.capacity() - self.head + self.tail
        } else {
            self.tail - self.head
        }
    }

    /// Both free segments, in write order: `[head, end)` then the free front
    pub fn writable_segments(&mut self) -> (&mut [u8], &mut [u8]) {
        if self.head >= self.tail {
            let (front, back) = self.data.split_at_mut(self.head);
            (back, &mut front[..self.tail])
        } else {
            (&mut self.data[self.head..self.tail], &mut [])
        }
    }

    /// Both unread segments, in read order: `[tail, end)` then the wrapped front
    pub fn readable_segments(&self) -> (&[u8], &[u8]) {
        if self.head >= self.tail {
            (&self.data[self.tail..self.head], &[])
        } else {
            (&self.data[self.tail..], &self.data[..self.head])
        }
    }

    /// Publish `amount` bytes written at the head, wrapping past the end
    pub fn advance_write(&mut self, amount: usize) {
        debug_assert!(amount <= self.capacity());
        if self.capacity() == 0 {
            return;
        }
        self.head = (self.head + amount) % self.capacity();
    }

    /// Release `amount` bytes read at the tail, wrapping past the end
    pub fn advance_read(&mut self, amount: usize) {
        debug_assert!(amount <= self.capacity());
        if self.capacity() == 0 {
            return;
        }
        self.tail = (self.tail + amount) % self.capacity();
    }

    /// Copy every unread byte, in ring order (used in tests)
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<u8> {
        let (run, extra) = self.readable_view();
        let mut out = run.to_vec();
        out.extend_from_slice(&self.data[..extra]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn write(rb: &mut RingBuffer, bytes: &[u8]) {
        let (run, _) = rb.writable_view();
        assert!(bytes.len() <= run.len(), "test write does not fit");
        run[..bytes.len()].copy_from_slice(bytes);
        rb.advance_write(bytes.len());
    }

    /// Ring of `capacity` whose unread bytes wrap, with head at `head`
    fn wrapped_ring(capacity: usize, tail: usize, head: usize) -> (RingBuffer, Vec<u8>) {
        let mut rb = RingBuffer::new(capacity).unwrap();
        rb.advance_write(tail);
        rb.advance_read(tail);
        let payload: Vec<u8> = (0..(capacity - tail + head)).map(|i| (i + 1) as u8).collect();
        let first = capacity - tail;
        write(&mut rb, &payload[..first]);
        write(&mut rb, &payload[first..]);
        assert_eq!(rb.head(), head);
        (rb, payload)
    }

    #[test]
    fn test_ring_buffer_creation() {
        let rb = RingBuffer::new(1024).unwrap();
        assert_eq!(rb.capacity(), 1024);
        assert!(rb.is_empty());
        assert_eq!(rb.fill_percentage(), 0.0);
    }

    #[test]
    fn test_allocation_failure() {
        let result = RingBuffer::new(usize::MAX);
        assert!(matches!(result, Err(ResyncError::Allocation { .. })));
    }

    #[test]
    fn test_views_follow_cursors() {
        let mut rb = RingBuffer::new(16).unwrap();
        write(&mut rb, &[1; 10]);

        let (run, extra) = rb.readable_view();
        assert_eq!((run.len(), extra), (10, 0));
        rb.advance_read(6);

        let (run, extra) = rb.writable_view();
        assert_eq!((run.len(), extra), (6, 6));
        write(&mut rb, &[2; 6]);
        assert_eq!(rb.head(), 0);

        // head < tail: writable run is the gap, readable run wraps
        let (run, extra) = rb.writable_view();
        assert_eq!((run.len(), extra), (6, 0));
        let (run, extra) = rb.readable_view();
        assert_eq!((run.len(), extra), (10, 0));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut rb = RingBuffer::new(64).unwrap();
        write(&mut rb, &[9; 8]);
        rb.release();
        rb.release();
        assert_eq!(rb.capacity(), 0);
        assert_eq!((rb.head(), rb.tail()), (0, 0));
        assert!(rb.is_empty());
        assert_eq!(rb.fill_percentage(), 0.0);
    }

    #[test]
    fn test_segments_split_at_the_wrap_point() {
        let mut rb = RingBuffer::new(16).unwrap();
        write(&mut rb, &[1; 12]);
        rb.advance_read(8);
        assert_eq!(rb.free_len(), 12);

        let (first, second) = rb.writable_segments();
        assert_eq!((first.len(), second.len()), (4, 8));
        first.fill(2);
        second[..4].fill(3);
        rb.advance_write(8);
        assert_eq!(rb.head(), 4);

        let (first, second) = rb.readable_segments();
        assert_eq!(first, &[1, 1, 1, 1, 2, 2, 2, 2]);
        assert_eq!(second, &[3, 3, 3, 3]);
        assert_eq!(rb.free_len(), 4);

        let (first, second) = rb.writable_segments();
        assert_eq!((first.len(), second.len()), (4, 0));
    }

    #[test]
    fn test_fill_percentage_counts_wrapped_bytes() {
        let (rb, payload) = wrapped_ring(32, 20, 5);
        assert_eq!(rb.len(), payload.len());
        assert_relative_eq!(rb.fill_percentage(), 17.0_f32 / 32.0);
    }

    #[test]
    fn test_grow_smaller_is_noop() {
        let mut rb = RingBuffer::new(64).unwrap();
        rb.grow(32).unwrap();
        assert_eq!(rb.capacity(), 64);
    }

    #[test]
    fn test_grow_linear_data_untouched() {
        let mut rb = RingBuffer::new(32).unwrap();
        rb.advance_write(4);
        rb.advance_read(4);
        write(&mut rb, b"abcdefgh");

        rb.grow(64).unwrap();

        assert_eq!(rb.snapshot(), b"abcdefgh");
        assert_eq!((rb.tail(), rb.head()), (4, 12));
        let (run, extra) = rb.writable_view();
        assert_eq!((run.len(), extra), (52, 4));
    }

    #[test]
    fn test_grow_wrapped_short_prefix_moves_into_new_space() {
        let (mut rb, payload) = wrapped_ring(32, 20, 5);

        rb.grow(48).unwrap();

        assert_eq!(rb.capacity(), 48);
        assert_eq!(rb.head(), 37);
        assert_eq!(rb.snapshot(), payload);
    }

    #[test]
    fn test_grow_wrapped_prefix_exactly_fills_new_space() {
        let (mut rb, payload) = wrapped_ring(32, 20, 8);

        rb.grow(40).unwrap();

        assert_eq!(rb.head(), 0);
        assert_eq!(rb.snapshot(), payload);
    }

    #[test]
    fn test_grow_wrapped_long_prefix_shifts_remainder() {
        let (mut rb, payload) = wrapped_ring(32, 24, 18);

        rb.grow(36).unwrap();

        assert_eq!(rb.head(), 14);
        assert_eq!(rb.snapshot(), payload);
    }

    #[test]
    fn test_grow_zero_fills_new_region() {
        let mut rb = RingBuffer::new(8).unwrap();
        write(&mut rb, &[0xFF; 7]);
        rb.advance_read(7);

        rb.grow(16).unwrap();
        let (run, _) = rb.writable_view();
        assert!(run[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_grow_sequence_preserves_stream() {
        let (mut rb, payload) = wrapped_ring(40, 30, 25);
        for capacity in [40, 44, 60, 61, 128, 128, 200] {
            rb.grow(capacity).unwrap();
            assert_eq!(rb.snapshot(), payload, "after growing to {capacity}");
        }
    }
}
