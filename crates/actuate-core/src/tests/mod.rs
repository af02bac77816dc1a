//! Behavioural test suites for the dispatch core.

mod dispatch_behaviour;
mod support;
