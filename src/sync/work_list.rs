/// A directory pair waiting to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending<L> {
    /// Both sides may already hold content; they are diffed against each other.
    Reconcile { source: L, destination: L },
    /// The destination is known to be absent and is filled from the source.
    Populate { source: L, destination: L },
}

/// Last-in-first-out queue of pending directory pairs.
#[derive(Debug, Clone)]
pub struct WorkList<L> {
    stack: Vec<Pending<L>>,
}

impl<L> WorkList<L> {
    pub fn seeded(source: L, destination: L) -> Self {
        Self {
            stack: vec![Pending::Reconcile {
                source,
                destination,
            }],
        }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn pop(&mut self) -> Option<Pending<L>> {
        self.stack.pop()
    }

    /// Pushes `items`, given in ascending name order, so that they pop in that same order.
    pub fn push_ascending(&mut self, items: impl IntoIterator<Item = Pending<L>>) {
        let mut items: Vec<_> = items.into_iter().collect();
        items.reverse();
        self.stack.extend(items);
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
