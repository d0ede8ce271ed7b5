//! Test doubles shared by the unit tests

use std::cell::RefCell;

use crate::error::{HarnessError, Result};
use crate::process::{Invocation, ProcessRunner};

type Observer = Box<dyn Fn(&Invocation)>;
type Matcher = Box<dyn Fn(&Invocation) -> bool>;

/// Scripted answer for a matched invocation
enum Response {
    Exit(i32),
    SpawnError,
}

/// Records every invocation and answers with scripted exit codes
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: RefCell<Vec<Invocation>>,
    failures: Vec<(Matcher, Response)>,
    observer: Option<Observer>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` for invocations whose program or arguments contain `needle`
    pub(crate) fn fail_when(self, needle: &str, code: i32) -> Self {
        self.fail_if(mentions(needle), code)
    }

    /// Refuse to start invocations whose program or arguments contain `needle`
    pub(crate) fn cannot_spawn_when(mut self, needle: &str) -> Self {
        self.failures.push((Box::new(mentions(needle)), Response::SpawnError));
        self
    }

    /// Exit with `code` for invocations matching `matcher`
    pub(crate) fn fail_if(
        mut self,
        matcher: impl Fn(&Invocation) -> bool + 'static,
        code: i32,
    ) -> Self {
        self.failures.push((Box::new(matcher), Response::Exit(code)));
        self
    }

    /// Call `observer` with each invocation while it "runs"
    pub(crate) fn observe(mut self, observer: impl Fn(&Invocation) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Programs and arguments of every call, joined with spaces
    pub(crate) fn command_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|inv| {
                std::iter::once(inv.program.display().to_string())
                    .chain(inv.args.iter().cloned())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32> {
        if let Some(observer) = &self.observer {
            observer(invocation);
        }
        self.calls.borrow_mut().push(invocation.clone());

        match self.failures.iter().find(|(matcher, _)| matcher(invocation)) {
            None => Ok(0),
            Some((_, Response::Exit(code))) => Ok(*code),
            Some((_, Response::SpawnError)) => Err(HarnessError::SpawnFailed {
                program: invocation.program.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}

fn mentions(needle: &str) -> impl Fn(&Invocation) -> bool + 'static {
    let needle = needle.to_string();
    move |inv| {
        inv.program.to_string_lossy().contains(needle.as_str())
            || inv.args.iter().any(|a| a.contains(needle.as_str()))
    }
}
