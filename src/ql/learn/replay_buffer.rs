use std::collections::VecDeque;

/// Bounded FIFO buffer; adding beyond capacity drops the oldest element
pub struct ReplayBuffer<T> {
    max_buffer_len: usize,
    buffer: VecDeque<T>,
}

impl<T> ReplayBuffer<T> {
    pub fn new(max_buffer_len: usize) -> Self {
        assert!(max_buffer_len > 0);
        Self {
            max_buffer_len,
            buffer: VecDeque::with_capacity(max_buffer_len),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.max_buffer_len
    }

    pub fn add(&mut self, element: T) {
        if self.buffer.len() == self.max_buffer_len {
            self.buffer.pop_front();
        }
        self.buffer.push_back(element);
    }
}

impl ReplayBuffer<f32> {
    /// mean of the buffered values; zero when empty
    pub fn avg(&self) -> f32 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.buffer.iter().sum::<f32>() / self.buffer.len() as f32
        }
    }
}
