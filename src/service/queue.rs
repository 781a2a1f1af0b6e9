//! # Print Queue
//!
//! Receipts waiting for the printer, oldest first.

use std::collections::VecDeque;

use crate::error::Fp705Error;
use crate::receipt::Receipt;

/// Receipts an in-memory queue holds before refusing more.
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// A receipt and how to print it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintReceiptRequest {
    pub receipt: Receipt,
    pub fiscal: bool,
}

impl PrintReceiptRequest {
    pub fn new(receipt: Receipt, fiscal: bool) -> Self {
        Self { receipt, fiscal }
    }
}

pub trait PrintQueue {
    /// Next request, or `None` once the queue is drained.
    fn next(&mut self) -> Option<PrintReceiptRequest>;

    /// Append a request.
    ///
    /// ## Errors
    ///
    /// [`Fp705Error::QueueFull`] if the queue is at capacity.
    fn queue(&mut self, request: PrintReceiptRequest) -> Result<(), Fp705Error>;
}

/// Bounded FIFO queue.
#[derive(Debug)]
pub struct InMemoryPrintQueue {
    requests: VecDeque<PrintReceiptRequest>,
    capacity: usize,
}

impl InMemoryPrintQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            requests: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Default for InMemoryPrintQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintQueue for InMemoryPrintQueue {
    fn next(&mut self) -> Option<PrintReceiptRequest> {
        self.requests.pop_front()
    }

    fn queue(&mut self, request: PrintReceiptRequest) -> Result<(), Fp705Error> {
        if self.requests.len() >= self.capacity {
            return Err(Fp705Error::QueueFull {
                capacity: self.capacity,
            });
        }
        self.requests.push_back(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str) -> PrintReceiptRequest {
        PrintReceiptRequest::new(Receipt::new("BGN").id(id), false)
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = InMemoryPrintQueue::new();
        queue.queue(request("a")).unwrap();
        queue.queue(request("b")).unwrap();

        assert_eq!(queue.next().unwrap().receipt.receipt_id.as_deref(), Some("a"));
        assert_eq!(queue.next().unwrap().receipt.receipt_id.as_deref(), Some("b"));
        assert!(queue.next().is_none());
    }

    #[test]
    fn test_default_capacity_is_fifty() {
        let mut queue = InMemoryPrintQueue::default();
        for i in 0..DEFAULT_QUEUE_CAPACITY {
            queue.queue(request(&i.to_string())).unwrap();
        }

        let err = queue.queue(request("overflow")).unwrap_err();
        assert!(matches!(err, Fp705Error::QueueFull { capacity: 50 }));
        assert_eq!(queue.len(), 50);
    }

    #[test]
    fn test_draining_frees_capacity() {
        let mut queue = InMemoryPrintQueue::with_capacity(1);
        queue.queue(request("a")).unwrap();
        assert!(queue.queue(request("b")).is_err());

        queue.next();
        assert!(queue.is_empty());
        queue.queue(request("b")).unwrap();
    }
}
