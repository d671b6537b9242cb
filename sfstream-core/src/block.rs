//! # Block Matcher
//!
//! Detects the end of a possibly nested block by tracking its depth.
//!
//! A [`BlockMatcher`] moves `Idle → Open → Closed`. The start kind is either
//! given or inferred from the first event it sees; the end kind defaults to
//! the start kind's pair, then to the start kind itself. Inside the block,
//! an end-kind event closes one level and a start-kind event opens one. The
//! end kind is tested first, so a start kind without a pair closes on its
//! next occurrence.

use crate::{
    check::{BlockEnd, BoxBlockEnd, CollectorCheck},
    event::{Event, EventKind},
};

/// Where a [`BlockMatcher`] is in its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockState {
    /// No start event seen yet.
    Idle,
    /// Inside the block, `depth` levels deep.
    Open {
        /// Nesting level, 1 for the outermost.
        depth: usize,
    },
    /// The outermost level has closed.
    Closed,
}

/// Tracks nesting depth of one block.
#[derive(Debug, Clone)]
pub struct BlockMatcher {
    start: Option<EventKind>,
    end: Option<EventKind>,
    state: BlockState,
}

impl BlockMatcher {
    /// A matcher for blocks opening on `start` and closing on `end`. Either
    /// kind may be left to inference.
    pub fn new(start: Option<EventKind>, end: Option<EventKind>) -> Self {
        Self {
            start,
            end,
            state: BlockState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &BlockState {
        &self.state
    }

    /// The kind that opens the block, once given or inferred.
    pub fn start_kind(&self) -> Option<&EventKind> {
        self.start.as_ref()
    }

    /// The kind that closes the block, once the start kind is known.
    pub fn end_kind(&self) -> Option<EventKind> {
        self.end.clone().or_else(|| {
            self.start
                .as_ref()
                .map(|start| start.pair().unwrap_or_else(|| start.clone()))
        })
    }

    /// Offer the first event. Opens the block when it has the start kind.
    pub fn open(&mut self, event: &Event) -> bool {
        if self.state != BlockState::Idle {
            return false;
        }
        let start = self.start.get_or_insert_with(|| event.kind().clone());
        if event.is(start) {
            self.state = BlockState::Open { depth: 1 };
            true
        } else {
            false
        }
    }

    /// Offer an event inside the block. Returns true when the event closes
    /// the outermost level. Once closed, only end-kind events report true.
    pub fn advance(&mut self, event: &Event) -> bool {
        let end = self.end_kind();
        let is_end = end.as_ref().is_some_and(|end| event.is(end));
        let BlockState::Open { depth } = self.state else {
            return self.state == BlockState::Closed && is_end;
        };
        if is_end {
            if depth <= 1 {
                self.state = BlockState::Closed;
                return true;
            }
            self.state = BlockState::Open { depth: depth - 1 };
        } else if self.start.as_ref().is_some_and(|start| event.is(start)) {
            self.state = BlockState::Open { depth: depth + 1 };
        }
        false
    }

    /// Offer any event: opens from `Idle`, advances while `Open`.
    ///
    /// The return value is "block complete"; opening reports false.
    pub fn check(&mut self, event: &Event) -> bool {
        match self.state {
            BlockState::Idle => {
                self.open(event);
                false
            }
            _ => self.advance(event),
        }
    }
}

impl BlockEnd for BlockMatcher {
    fn is_end(&mut self, event: &Event) -> bool {
        self.advance(event)
    }
}

/// A collector check that delimits nested blocks by kind.
///
/// Built by [`block_check`]. Every trigger gets a fresh [`BlockMatcher`].
#[derive(Debug, Clone, Default)]
pub struct BlockCheck {
    start: Option<EventKind>,
    end: Option<EventKind>,
}

impl BlockCheck {
    /// Override the kind that closes the block.
    pub fn end(mut self, end: EventKind) -> Self {
        self.end = Some(end);
        self
    }
}

/// Delimit blocks that open on `start`. Without a start kind, the first
/// event seen decides it.
pub fn block_check(start: impl Into<Option<EventKind>>) -> BlockCheck {
    BlockCheck {
        start: start.into(),
        end: None,
    }
}

impl CollectorCheck for BlockCheck {
    fn begin(&self, event: &Event) -> Option<BoxBlockEnd> {
        let mut matcher = BlockMatcher::new(self.start.clone(), self.end.clone());
        if matcher.open(event) {
            Some(Box::new(matcher))
        } else {
            None
        }
    }
}
