//! Loading / value / error state of an asynchronous request.
//!
//! [`AsyncState`] is the observable record; every request that touches it
//! takes a [`RequestEpoch`]. Only the latest issued epoch may settle the
//! state, so a slow response to an older request can never overwrite the
//! result of a newer one.

use serde::Serialize;

/// Monotonic request number issued by [`AsyncState::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestEpoch(u64);

impl RequestEpoch {
    /// Raw epoch number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Observable state of an asynchronous request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsyncState<T> {
    /// Last successful result.
    pub value: Option<T>,
    /// `true` while the latest issued request is unsettled.
    pub loading: bool,
    /// Message of the last failure, cleared by the next success.
    pub error: Option<String>,
    #[serde(skip)]
    issued: u64,
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
            error: None,
            issued: 0,
        }
    }
}

impl<T> AsyncState<T> {
    /// Creates an idle state with no value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a new request as in flight and returns its epoch.
    pub fn start(&mut self) -> RequestEpoch {
        self.issued = self.issued.saturating_add(1);
        self.loading = true;
        RequestEpoch(self.issued)
    }

    /// Returns `true` if `epoch` is the latest issued request.
    #[must_use]
    pub fn is_current(&self, epoch: RequestEpoch) -> bool {
        epoch.0 == self.issued
    }

    /// Latest issued epoch, if any request was ever started.
    #[must_use]
    pub fn latest(&self) -> Option<RequestEpoch> {
        (self.issued > 0).then_some(RequestEpoch(self.issued))
    }

    /// Settles the request `epoch` with a success.
    ///
    /// Returns `false` and leaves the state untouched if `epoch` is stale.
    pub fn succeed(&mut self, epoch: RequestEpoch, value: T) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.value = Some(value);
        self.error = None;
        self.loading = false;
        true
    }

    /// Settles the request `epoch` with a failure, keeping the last value.
    ///
    /// Returns `false` and leaves the state untouched if `epoch` is stale.
    pub fn fail(&mut self, epoch: RequestEpoch, error: impl ToString) -> bool {
        if !self.is_current(epoch) {
            return false;
        }
        self.error = Some(error.to_string());
        self.loading = false;
        true
    }

    /// Settles `epoch` from a `Result`.
    pub fn settle<E: ToString>(&mut self, epoch: RequestEpoch, outcome: Result<T, E>) -> bool {
        match outcome {
            Ok(value) => self.succeed(epoch, value),
            Err(err) => self.fail(epoch, err),
        }
    }
}
