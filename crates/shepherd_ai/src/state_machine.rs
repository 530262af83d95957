//! Tick-driven finite state machine
//!
//! Used for the director's guiding/fetching mode. Transitions are guarded by
//! predicates over a per-tick context and checked in the order they were
//! added; at most one fires per [`StateMachine::update`].

use std::fmt;

/// A state in the state machine
pub trait State: Copy + Eq {
    /// Called when entering this state
    fn on_enter(&self) {}
    /// Called when exiting this state
    fn on_exit(&self) {}
}

type Guard<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// A guarded edge `from -> to`
struct Transition<S, C> {
    from: S,
    to: S,
    guard: Guard<C>,
}

impl<S: State, C> Transition<S, C> {
    fn fires(&self, current: S, context: &C) -> bool {
        self.from == current && (self.guard)(context)
    }
}

pub struct StateMachine<S: State, C> {
    current: S,
    transitions: Vec<Transition<S, C>>,
}

impl<S: State, C> StateMachine<S, C> {
    pub fn new(initial: S) -> Self {
        initial.on_enter();
        Self {
            current: initial,
            transitions: Vec::new(),
        }
    }

    pub fn add_transition<F>(&mut self, from: S, to: S, guard: F)
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.transitions.push(Transition {
            from,
            to,
            guard: Box::new(guard),
        });
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Evaluate the current state's transitions. Returns true if the state
    /// changed.
    pub fn update(&mut self, context: &C) -> bool {
        let next = self
            .transitions
            .iter()
            .find(|t| t.fires(self.current, context))
            .map(|t| t.to);

        match next {
            Some(to) if to != self.current => {
                self.current.on_exit();
                self.current = to;
                self.current.on_enter();
                true
            }
            _ => false,
        }
    }
}

impl<S: State + fmt::Debug, C> fmt::Debug for StateMachine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("transitions", &self.transitions.len())
            .finish()
    }
}
