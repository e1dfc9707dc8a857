use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call stack is full, cannot push return address {address:#05X}")]
pub struct CallStackFullError {
    /// The return address that did not fit.
    pub address: u16,
}

/// A bounded LIFO of return addresses.
///
/// Subroutine calls may nest at most [`CallStack::DEPTH`] deep. Pushing
/// beyond that is an error reported to the calling instruction, never a
/// silent wraparound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack(Vec<u16>);

impl CallStack {
    /// Maximum number of return addresses held at once.
    pub const DEPTH: usize = 16;

    pub fn new() -> Self {
        Self(Vec::with_capacity(Self::DEPTH))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, address: u16) -> Result<(), CallStackFullError> {
        if self.0.len() < Self::DEPTH {
            self.0.push(address);
            Ok(())
        } else {
            Err(CallStackFullError { address })
        }
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}
