use std::collections::VecDeque;

use crate::error::DecodeError;

/// Anything that can produce the next burst of mono s16 samples.
///
/// `Ok(None)` is end of stream; any `Err` is fatal. Bursts may be any
/// length, including empty.
pub trait SampleSource {
    fn next_block(&mut self) -> Result<Option<Vec<i16>>, DecodeError>;
}

/// Ordered sample queue reconciling variable-size source bursts with the
/// consumer's fixed pull size.
///
/// Samples are only appended at the back (production order) and removed
/// from the front (playback order); the queue is never reordered.
pub struct ChunkBuffer<S> {
    source: S,
    queue: VecDeque<i16>,
    ended: bool,
}

impl<S: SampleSource> ChunkBuffer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            queue: VecDeque::new(),
            ended: false,
        }
    }

    /// Remove and return `n` samples from the front of the queue, driving
    /// the source as needed. Blocks the caller for the duration of the
    /// decode/resample work; a short (or empty) result only ever means end
    /// of stream, never timing. After end of stream every call returns an
    /// empty vec.
    pub fn pull(&mut self, n: usize) -> Result<Vec<i16>, DecodeError> {
        while self.queue.len() < n && !self.ended {
            match self.source.next_block()? {
                Some(block) => self.queue.extend(block),
                None => {
                    self.ended = true;
                    log::debug!("source ended with {} samples queued", self.queue.len());
                }
            }
        }

        let take = n.min(self.queue.len());
        Ok(self.queue.drain(..take).collect())
    }

    pub fn ended(&self) -> bool {
        self.ended && self.queue.is_empty()
    }
}
