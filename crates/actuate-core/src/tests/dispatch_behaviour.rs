//! Behavioural tests for request dispatch over a temporary root.

use std::cell::RefCell;
use std::fs;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

use super::support::{Sandbox, counting_sandbox, sandbox};
use crate::{Payload, ResultEnvelope};

struct DispatchWorld {
    sandbox: Option<Sandbox>,
    runtime: Runtime,
    cancel: CancellationToken,
    envelope: Option<ResultEnvelope>,
}

impl DispatchWorld {
    fn new() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime");
        Self {
            sandbox: None,
            runtime,
            cancel: CancellationToken::new(),
            envelope: None,
        }
    }

    fn sandbox(&self) -> &Sandbox {
        self.sandbox.as_ref().expect("a dispatcher is configured")
    }

    fn dispatch(&mut self, request: &str) {
        let raw: Value = serde_json::from_str(request).expect("request is JSON");
        let sandbox = self.sandbox.as_ref().expect("a dispatcher is configured");
        let envelope = self
            .runtime
            .block_on(sandbox.dispatcher.dispatch(&raw, &self.cancel));
        self.envelope = Some(envelope);
    }

    fn dispatch_line(&mut self, line: &str) {
        let sandbox = self.sandbox.as_ref().expect("a dispatcher is configured");
        let envelope = self
            .runtime
            .block_on(sandbox.dispatcher.dispatch_line(line.as_bytes(), &self.cancel));
        self.envelope = Some(envelope);
    }

    fn envelope(&self) -> &ResultEnvelope {
        self.envelope.as_ref().expect("a request was dispatched")
    }

    fn outside_file(&self) -> Vec<u8> {
        fs::read(self.sandbox().outside("Cargo.toml")).expect("file above the root")
    }
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[given("a dispatcher confined to a nested root")]
fn given_sandbox(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().sandbox = Some(sandbox());
}

#[given("a dispatcher whose handlers only count calls")]
fn given_counting_sandbox(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().sandbox = Some(counting_sandbox());
}

#[given("the cancellation token is already cancelled")]
fn given_cancelled_token(world: &RefCell<DispatchWorld>) {
    world.borrow().cancel.cancel();
}

#[when("the request {request} is dispatched")]
fn when_request_dispatched(world: &RefCell<DispatchWorld>, request: String) {
    world.borrow_mut().dispatch(&request);
}

#[when("the line {line} is dispatched")]
fn when_line_dispatched(world: &RefCell<DispatchWorld>, line: String) {
    world.borrow_mut().dispatch_line(&line);
}

#[then("the envelope is a success")]
fn then_success(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    assert!(
        world.envelope().is_success(),
        "expected success, got {:?}",
        world.envelope()
    );
}

#[then("the envelope is an error of kind \"{kind}\"")]
fn then_error_kind(world: &RefCell<DispatchWorld>, kind: String) {
    let world = world.borrow();
    let found = world.envelope().failure_kind().map(|found| found.as_str());
    assert_eq!(found, Some(strip_quotes(&kind)), "{:?}", world.envelope());
}

#[then("the envelope message mentions \"{text}\"")]
fn then_message_mentions(world: &RefCell<DispatchWorld>, text: String) {
    let world = world.borrow();
    let line = world.envelope().to_json_line().expect("serialise envelope");
    assert!(line.contains(strip_quotes(&text)), "{line}");
}

#[then("the payload is the bytes {bytes}")]
fn then_payload_bytes(world: &RefCell<DispatchWorld>, bytes: String) {
    let expected: Vec<u8> = serde_json::from_str(&bytes).expect("byte list");
    let world = world.borrow();
    assert_eq!(world.envelope().payload(), Some(&Payload::Bytes(expected)));
}

#[then("the payload is the text \"{text}\"")]
fn then_payload_text(world: &RefCell<DispatchWorld>, text: String) {
    let world = world.borrow();
    assert_eq!(
        world.envelope().payload(),
        Some(&Payload::Text(strip_quotes(&text).to_owned()))
    );
}

#[then("the handler was called {count} times")]
fn then_handler_calls(world: &RefCell<DispatchWorld>, count: usize) {
    assert_eq!(world.borrow().sandbox().dispatcher.counted_calls(), count);
}

#[then("the file above the root is unchanged")]
fn then_outside_unchanged(world: &RefCell<DispatchWorld>) {
    assert_eq!(world.borrow().outside_file(), b"[package]\n");
}

#[then("nothing was written above the root")]
fn then_nothing_planted(world: &RefCell<DispatchWorld>) {
    assert!(!world.borrow().sandbox().outside("outer/planted.txt").exists());
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "A request without a kind never reaches a handler"
)]
fn missing_kind(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "An unregistered kind never reaches a handler"
)]
fn unregistered_kind(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "A request without a method never reaches a handler"
)]
fn missing_method(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "An unregistered method never reaches a handler"
)]
fn unregistered_method(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Tags are matched without regard to case"
)]
fn case_insensitive_tags(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "A pre-cancelled request never reaches a handler"
)]
fn pre_cancelled_request(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Reading a file inside the root"
)]
fn read_inside_root(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Traversal to an existing file escapes the root"
)]
fn traversal_to_existing_file(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Traversal to a missing file escapes the root"
)]
fn traversal_to_missing_file(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Writes cannot leave the root"
)]
fn confined_write(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Deletes cannot leave the root"
)]
fn confined_delete(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Listings cannot leave the root"
)]
fn confined_list(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Empty contents round-trip"
)]
fn empty_round_trip(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Text contents round-trip"
)]
fn text_round_trip(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Non-UTF-8 contents round-trip"
)]
fn binary_round_trip(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Deleting an absent file is not found every time"
)]
fn repeated_delete(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "A cancelled read produces no success"
)]
fn cancelled_read(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Validation errors name the parameter"
)]
fn named_parameter(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "A path with a NUL byte is an invalid parameter"
)]
fn nul_path(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Malformed request lines are rejected"
)]
fn malformed_line(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/action_dispatch.feature",
    name = "Encoded data decodes back to its bytes"
)]
fn encode_then_decode(world: RefCell<DispatchWorld>) {
    drop(world);
}
