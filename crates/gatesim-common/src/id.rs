use core::fmt;

/// A simple sequence counter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Counter(u64);

impl Counter {
    /// Increments the counter in place, returning the previous value.
    pub fn next(&mut self) -> Self {
        let prev = self.0;
        self.0 += 1;
        Self(prev)
    }

    /// Returns the value the next call to [`Counter::next`] will yield.
    pub fn peek(&self) -> Self {
        Self(self.0)
    }

    /// Returns the counter value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_next() {
        let mut counter = Counter::default();

        assert_eq!(counter.peek().get(), 0);
        assert_eq!(counter.next().get(), 0);
        assert_eq!(counter.next().get(), 1);
        assert_eq!(counter.peek().get(), 2);
        assert_eq!(counter.to_string(), "2");
    }
}
