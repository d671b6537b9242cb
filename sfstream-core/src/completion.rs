//! Completion results for lazily produced streams.
//!
//! A producer yields [`Emit`] items: events for the stream, and at most one
//! [`Emit::Done`] carrying a summary value. [`completion`] splits these into
//! a plain event stream and a [`CompletionHandle`] that hands out the value
//! once the stream has been fully consumed.

use crate::{error::CompletionError, stream::EventResult};
use std::{cell::RefCell, rc::Rc};

/// One item of a producer wrapped by [`completion`].
#[derive(Debug)]
pub enum Emit<T> {
    /// An item of the stream.
    Event(EventResult),
    /// The completion result. Ends the stream.
    Done(T),
}

struct State<T> {
    finished: bool,
    result: Option<T>,
}

/// Read access to the completion result of a [`Completing`] stream.
pub struct CompletionHandle<T> {
    state: Rc<RefCell<State<T>>>,
}

impl<T> CompletionHandle<T> {
    /// Whether the stream has been fully consumed.
    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }

    /// The signalled value.
    ///
    /// Fails with [`CompletionError::Pending`] until the stream is exhausted,
    /// and with [`CompletionError::NoResult`] if it finished without one.
    pub fn result(&self) -> Result<T, CompletionError>
    where
        T: Clone,
    {
        let state = self.state.borrow();
        if !state.finished {
            return Err(CompletionError::Pending);
        }
        state.result.clone().ok_or(CompletionError::NoResult)
    }

    /// Like [`result`](Self::result), but moves the value out.
    pub fn take(&self) -> Result<T, CompletionError> {
        let mut state = self.state.borrow_mut();
        if !state.finished {
            return Err(CompletionError::Pending);
        }
        state.result.take().ok_or(CompletionError::NoResult)
    }
}

/// The event stream returned by [`completion`].
pub struct Completing<I, T> {
    producer: I,
    state: Rc<RefCell<State<T>>>,
}

/// Split `producer` into a completion handle and the stream of its events.
pub fn completion<I, T>(producer: I) -> (CompletionHandle<T>, Completing<I::IntoIter, T>)
where
    I: IntoIterator<Item = Emit<T>>,
{
    let state = Rc::new(RefCell::new(State {
        finished: false,
        result: None,
    }));
    let handle = CompletionHandle {
        state: state.clone(),
    };
    let stream = Completing {
        producer: producer.into_iter(),
        state,
    };
    (handle, stream)
}

impl<I, T> Iterator for Completing<I, T>
where
    I: Iterator<Item = Emit<T>>,
{
    type Item = EventResult;

    fn next(&mut self) -> Option<EventResult> {
        if self.state.borrow().finished {
            return None;
        }
        match self.producer.next() {
            Some(Emit::Event(item)) => Some(item),
            Some(Emit::Done(value)) => {
                let mut state = self.state.borrow_mut();
                state.result = Some(value);
                state.finished = true;
                None
            }
            None => {
                self.state.borrow_mut().finished = true;
                None
            }
        }
    }
}
