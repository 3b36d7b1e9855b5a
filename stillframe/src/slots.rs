//! Buffer slot bookkeeping for driving a decoder one buffer pair at a time.
//!
//! [`SlotPool`] is a fixed-size arena handing out indices; released indices
//! are reused. [`SingleSlotDecoder`] wraps a [`FrameDecoder`] with one input
//! and one output slot, the way a pipeline framework feeds and drains it.

use arrayvec::ArrayVec;

use crate::buffer::{CompressedImageBuffer, DecodedImage};
use crate::decoder::FrameDecoder;
use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot index {0} out of range")]
    OutOfRange(usize),

    #[error("slot {0} has not been acquired")]
    NotAcquired(usize),

    #[error("slot {0} already holds a buffer")]
    Occupied(usize),
}

#[derive(Debug)]
enum Slot<T> {
    Free,
    Reserved,
    Filled(T),
}

/// Fixed capacity arena with index based reuse.
#[derive(Debug)]
pub struct SlotPool<T, const N: usize> {
    slots: [Slot<T>; N],
    free: ArrayVec<usize, N>,
}

impl<T, const N: usize> SlotPool<T, N> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::Free),
            // lowest index is handed out first
            free: (0..N).rev().collect(),
        }
    }

    /// Number of indices that can still be acquired.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Reserve an empty slot, or `None` if every slot is in use.
    pub fn acquire(&mut self) -> Option<usize> {
        let index = self.free.pop()?;
        self.slots[index] = Slot::Reserved;
        Some(index)
    }

    pub fn insert(&mut self, index: usize, value: T) -> Result<(), SlotError> {
        let slot = self.slot_mut(index)?;
        match slot {
            Slot::Reserved => {
                *slot = Slot::Filled(value);
                Ok(())
            }
            Slot::Free => Err(SlotError::NotAcquired(index)),
            Slot::Filled(_) => Err(SlotError::Occupied(index)),
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index)? {
            Slot::Filled(value) => Some(value),
            _ => None,
        }
    }

    /// Free the slot for reuse, handing back whatever it held.
    pub fn release(&mut self, index: usize) -> Result<Option<T>, SlotError> {
        let slot = self.slot_mut(index)?;
        match std::mem::replace(slot, Slot::Free) {
            Slot::Free => Err(SlotError::NotAcquired(index)),
            Slot::Reserved => {
                self.free.push(index);
                Ok(None)
            }
            Slot::Filled(value) => {
                self.free.push(index);
                Ok(Some(value))
            }
        }
    }

    /// Free every slot, dropping held values.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Free;
        }
        self.free = (0..N).rev().collect();
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Slot<T>, SlotError> {
        self.slots
            .get_mut(index)
            .ok_or(SlotError::OutOfRange(index))
    }
}

impl<T, const N: usize> Default for SlotPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to an acquired input slot. Consumed when queued.
#[derive(Debug, PartialEq, Eq)]
pub struct InputSlot(usize);

/// Handle to a filled output slot. Consumed when released.
#[derive(Debug, PartialEq, Eq)]
pub struct OutputSlot(usize);

impl OutputSlot {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Drives a [`FrameDecoder`] with exactly one input and one output slot.
///
/// Decoding happens synchronously inside [`Self::dequeue_output_buffer`]
/// once an input is queued and the output slot is free.
#[derive(Debug)]
pub struct SingleSlotDecoder<D> {
    decoder: D,
    inputs: SlotPool<CompressedImageBuffer, 1>,
    outputs: SlotPool<DecodedImage, 1>,
    queued: Option<usize>,
}

impl<D: FrameDecoder> SingleSlotDecoder<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            inputs: SlotPool::new(),
            outputs: SlotPool::new(),
            queued: None,
        }
    }

    pub fn name(&self) -> &str {
        self.decoder.name()
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn into_inner(self) -> D {
        self.decoder
    }

    /// An empty input slot, or `None` while the previous input is pending.
    pub fn dequeue_input_buffer(&mut self) -> Option<InputSlot> {
        self.inputs.acquire().map(InputSlot)
    }

    pub fn queue_input_buffer(
        &mut self,
        slot: InputSlot,
        buffer: CompressedImageBuffer,
    ) -> Result<(), SlotError> {
        self.inputs.insert(slot.0, buffer)?;
        self.queued = Some(slot.0);
        Ok(())
    }

    /// Decode the pending input into the output slot.
    ///
    /// `Ok(None)` when nothing is queued or the previous output has not been
    /// released yet. A failed decode frees both slots and reports the error.
    pub fn dequeue_output_buffer(&mut self) -> Result<Option<OutputSlot>, DecodeError> {
        let Some(input) = self.queued else {
            return Ok(None);
        };
        let Some(output) = self.outputs.acquire() else {
            log::trace!("{}: output slot still held", self.decoder.name());
            return Ok(None);
        };

        self.queued = None;
        let buffer = match self.inputs.release(input) {
            Ok(Some(buffer)) => buffer,
            _ => {
                let _ = self.outputs.release(output);
                return Err(DecodeError::unexpected("queued input slot was empty"));
            }
        };

        match self.decoder.decode(buffer) {
            Ok(image) => {
                self.outputs
                    .insert(output, image)
                    .map_err(DecodeError::unexpected)?;
                Ok(Some(OutputSlot(output)))
            }
            Err(e) => {
                log::warn!("{}: {e}", self.decoder.name());
                let _ = self.outputs.release(output);
                Err(e)
            }
        }
    }

    pub fn output(&self, slot: &OutputSlot) -> Option<&DecodedImage> {
        self.outputs.get(slot.0)
    }

    /// Return the output slot to the pool, handing over the decoded image.
    pub fn release_output_buffer(&mut self, slot: OutputSlot) -> Option<DecodedImage> {
        self.outputs.release(slot.0).ok().flatten()
    }

    /// Drop any queued or reserved input. Held outputs stay valid.
    pub fn flush(&mut self) {
        self.queued = None;
        self.inputs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::ImageOrientationDecoder;
    use imageproc::image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn pool_reuses_released_indices() {
        let mut pool: SlotPool<&str, 2> = SlotPool::new();
        assert_eq!(pool.acquire(), Some(0));
        assert_eq!(pool.acquire(), Some(1));
        assert_eq!(pool.acquire(), None);

        pool.insert(0, "a").unwrap();
        assert_eq!(pool.get(0), Some(&"a"));
        assert_eq!(pool.release(0), Ok(Some("a")));
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.acquire(), Some(0));
    }

    #[test]
    fn pool_rejects_misuse() {
        let mut pool: SlotPool<u8, 1> = SlotPool::new();
        assert_eq!(pool.insert(0, 1), Err(SlotError::NotAcquired(0)));
        assert_eq!(pool.insert(5, 1), Err(SlotError::OutOfRange(5)));
        assert_eq!(pool.release(0), Err(SlotError::NotAcquired(0)));

        let i = pool.acquire().unwrap();
        pool.insert(i, 1).unwrap();
        assert_eq!(pool.insert(i, 2), Err(SlotError::Occupied(i)));
        assert_eq!(pool.release(i), Ok(Some(1)));
        assert_eq!(pool.release(i), Err(SlotError::NotAcquired(i)));
    }

    #[test]
    fn single_slot_round_trip() {
        let mut codec = SingleSlotDecoder::new(ImageOrientationDecoder::new());
        assert_eq!(codec.name(), "ImageOrientationDecoder");
        assert!(codec.dequeue_output_buffer().unwrap().is_none());

        let slot = codec.dequeue_input_buffer().unwrap();
        assert!(codec.dequeue_input_buffer().is_none());
        codec
            .queue_input_buffer(slot, CompressedImageBuffer::new(png(5, 2), 1_000))
            .unwrap();

        let out = codec.dequeue_output_buffer().unwrap().unwrap();
        assert_eq!(codec.output(&out).unwrap().dimensions(), (5, 2));

        let image = codec.release_output_buffer(out).unwrap();
        assert_eq!(image.timestamp_us(), 1_000);
        assert!(codec.dequeue_input_buffer().is_some());
    }

    #[test]
    fn held_output_blocks_next_decode() {
        let mut codec = SingleSlotDecoder::new(ImageOrientationDecoder::new());

        let slot = codec.dequeue_input_buffer().unwrap();
        codec
            .queue_input_buffer(slot, CompressedImageBuffer::new(png(1, 1), 1))
            .unwrap();
        let first = codec.dequeue_output_buffer().unwrap().unwrap();

        let slot = codec.dequeue_input_buffer().unwrap();
        codec
            .queue_input_buffer(slot, CompressedImageBuffer::new(png(2, 2), 2))
            .unwrap();
        assert!(codec.dequeue_output_buffer().unwrap().is_none());

        codec.release_output_buffer(first);
        let second = codec.dequeue_output_buffer().unwrap().unwrap();
        assert_eq!(second.index(), 0);
        assert_eq!(codec.output(&second).unwrap().timestamp_us(), 2);
    }

    #[test]
    fn failed_decode_frees_slots() {
        let mut codec = SingleSlotDecoder::new(ImageOrientationDecoder::new());

        let slot = codec.dequeue_input_buffer().unwrap();
        codec
            .queue_input_buffer(slot, CompressedImageBuffer::new(vec![1, 2, 3], 0))
            .unwrap();
        let err = codec.dequeue_output_buffer().unwrap_err();
        assert!(err.is_corrupt_data());

        let slot = codec.dequeue_input_buffer().unwrap();
        codec
            .queue_input_buffer(slot, CompressedImageBuffer::new(png(3, 3), 0))
            .unwrap();
        assert!(codec.dequeue_output_buffer().unwrap().is_some());
    }

    #[test]
    fn flush_drops_pending_input() {
        let mut codec = SingleSlotDecoder::new(ImageOrientationDecoder::new());

        let slot = codec.dequeue_input_buffer().unwrap();
        codec
            .queue_input_buffer(slot, CompressedImageBuffer::new(png(1, 1), 0))
            .unwrap();
        codec.flush();
        assert!(codec.dequeue_output_buffer().unwrap().is_none());

        // a handle obtained before the flush is stale afterwards
        let stale = codec.dequeue_input_buffer().unwrap();
        codec.flush();
        assert_eq!(
            codec.queue_input_buffer(stale, CompressedImageBuffer::new(png(1, 1), 0)),
            Err(SlotError::NotAcquired(0))
        );
    }
}
