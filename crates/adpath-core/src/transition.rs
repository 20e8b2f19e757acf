/// Directed edge from one state to another.
///
/// Transitions are compared and hashed by `(from, to)`, so two transitions between the same pair
/// of states are the same transition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Transition<S> {
    from: S,
    to: S,
}

impl<S: Copy> Transition<S> {
    /// Creates the transition `from -> to`.
    pub fn new(from: S, to: S) -> Self {
        Transition { from, to }
    }

    /// Source state.
    #[inline(always)]
    pub fn from(&self) -> S {
        self.from
    }

    /// Destination state.
    #[inline(always)]
    pub fn to(&self) -> S {
        self.to
    }

    /// The transition `to -> from`.
    pub fn reversed(&self) -> Self {
        Transition {
            from: self.to,
            to: self.from,
        }
    }
}
