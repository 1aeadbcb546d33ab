//! Structured reporting of preprocessing and query statistics.
//!
//! Values are reported into a thread local JSON document, nested along the contexts currently pushed.
//! Contexts are RAII guards, so the nesting follows the call graph.
//! Nothing is recorded unless `enable_reporting` was called on the current thread,
//! so library code can report unconditionally.
//! The document is printed to stdout when the `ReportingGuard` is dropped.

use crate::built_info;
use serde_json::{Map, Value};
use std::{cell::RefCell, mem::replace};

pub use serde_json::json;

#[derive(Debug)]
enum Frame {
    Object(Map<String, Value>),
    Collection(Vec<Value>),
    // swallows everything reported while it is on top
    Blocked,
}

#[derive(Debug)]
enum Slot {
    // where the frame on top goes once it is popped
    Key(String),
    Item,
    Discard,
}

#[derive(Debug)]
struct Reporter {
    current: Frame,
    stack: Vec<(Frame, Slot)>,
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter {
            current: Frame::Object(Map::new()),
            stack: Vec::new(),
        }
    }
}

impl Reporter {
    fn push(&mut self, frame: Frame, slot: Slot) {
        let parent = replace(&mut self.current, frame);
        self.stack.push((parent, slot));
    }

    fn open_object(&mut self, key: String) {
        match self.current {
            Frame::Object(_) => self.push(Frame::Object(Map::new()), Slot::Key(key)),
            Frame::Collection(_) => panic!("objects in collections have to be created through push_collection_item"),
            Frame::Blocked => self.push(Frame::Blocked, Slot::Discard),
        }
    }

    fn open_collection(&mut self, key: String) {
        match self.current {
            Frame::Object(_) => self.push(Frame::Collection(Vec::new()), Slot::Key(key)),
            Frame::Collection(_) => panic!("nested collections are not supported"),
            Frame::Blocked => self.push(Frame::Blocked, Slot::Discard),
        }
    }

    fn open_item(&mut self) {
        match self.current {
            Frame::Collection(_) => self.push(Frame::Object(Map::new()), Slot::Item),
            Frame::Object(_) => panic!("collection items can only be created in collections"),
            Frame::Blocked => self.push(Frame::Blocked, Slot::Discard),
        }
    }

    fn block(&mut self) {
        self.push(Frame::Blocked, Slot::Discard);
    }

    fn report(&mut self, key: String, val: Value) {
        match &mut self.current {
            Frame::Object(object) => {
                if let Some(prev) = object.insert(key.clone(), val) {
                    if !cfg!(feature = "report-allow-override") {
                        log::warn!("reported value for {} overrides previous value {}", key, prev);
                    }
                }
            }
            Frame::Collection(_) => panic!("values can not be reported directly into a collection"),
            Frame::Blocked => (),
        }
    }

    fn pop(&mut self) {
        let (parent, slot) = match self.stack.pop() {
            Some(entry) => entry,
            None => panic!("popped reporting context without matching push"),
        };
        let finished = replace(&mut self.current, parent);
        let finished = match finished {
            Frame::Object(object) => Value::Object(object),
            Frame::Collection(collection) => Value::Array(collection),
            Frame::Blocked => return,
        };

        match (&mut self.current, slot) {
            (Frame::Object(object), Slot::Key(key)) => {
                object.insert(key, finished);
            }
            (Frame::Collection(collection), Slot::Item) => collection.push(finished),
            (_, Slot::Discard) | (Frame::Blocked, _) => (),
            _ => panic!("inconsistent reporting context stack"),
        }
    }
}

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = RefCell::new(None);
}

fn with_reporter(f: impl FnOnce(&mut Reporter)) {
    REPORTER.with(|reporter| {
        if let Some(r) = reporter.borrow_mut().as_mut() {
            f(r)
        }
    });
}

#[must_use]
#[derive(Debug)]
pub struct ContextGuard(());

impl Drop for ContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop);
    }
}

/// Report everything until the guard is dropped into a new object under `key`.
pub fn push_context(key: &str) -> ContextGuard {
    with_reporter(|r| r.open_object(key.to_string()));
    ContextGuard(())
}

#[must_use]
#[derive(Debug)]
pub struct CollectionContextGuard(());

impl Drop for CollectionContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop);
    }
}

/// Open a list under `key`. Items are added with `push_collection_item`.
pub fn push_collection_context(key: &str) -> CollectionContextGuard {
    with_reporter(|r| r.open_collection(key.to_string()));
    CollectionContextGuard(())
}

impl CollectionContextGuard {
    pub fn push_collection_item(&mut self) -> CollectionItemContextGuard<'_> {
        with_reporter(Reporter::open_item);
        CollectionItemContextGuard(self)
    }
}

#[must_use]
#[derive(Debug)]
pub struct CollectionItemContextGuard<'a>(&'a CollectionContextGuard);

impl<'a> Drop for CollectionItemContextGuard<'a> {
    fn drop(&mut self) {
        with_reporter(Reporter::pop);
    }
}

#[must_use]
#[derive(Debug)]
pub struct BlockedReportingContextGuard(());

impl Drop for BlockedReportingContextGuard {
    fn drop(&mut self) {
        with_reporter(Reporter::pop);
    }
}

/// Discard everything reported until the guard is dropped.
pub fn block_reporting() -> BlockedReportingContextGuard {
    with_reporter(Reporter::block);
    BlockedReportingContextGuard(())
}

pub fn report(key: String, val: Value) {
    if cfg!(feature = "report-to-stderr") {
        eprintln!("{}: {}", key, val);
    }
    report_silent(key, val)
}

pub fn report_silent(key: String, val: Value) {
    with_reporter(|r| r.report(key, val));
}

/// Whether reporting was enabled on this thread.
pub fn reporting_enabled() -> bool {
    REPORTER.with(|reporter| reporter.borrow().is_some())
}

#[must_use]
#[derive(Debug)]
pub struct ReportingGuard(());

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        if let Some(reporter) = REPORTER.with(|reporter| reporter.borrow_mut().take()) {
            debug_assert!(reporter.stack.is_empty());
            if let Frame::Object(object) = reporter.current {
                println!("{}", Value::Object(object));
            }
        }
    }
}

#[macro_export]
macro_rules! report {
    ($k:expr, $($json:tt)+) => { $crate::report::report($k.to_string(), $crate::report::json!($($json)+)) };
}

#[macro_export]
macro_rules! report_silent {
    ($k:expr, $($json:tt)+) => { $crate::report::report_silent($k.to_string(), $crate::report::json!($($json)+)) };
}

/// Start collecting a report on the current thread, starting with build information.
pub fn enable_reporting(program: &str) -> ReportingGuard {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));

    report!("program", program);
    report!("version", built_info::PKG_VERSION);
    report!("build_target", built_info::TARGET);
    report!("build_profile", built_info::PROFILE);
    report!("feature_flags", built_info::FEATURES_STR);
    report!("build_with_rustc", built_info::RUSTC_VERSION);
    report!("args", std::env::args().collect::<Vec<String>>());

    ReportingGuard(())
}

pub mod benchmark;
pub use benchmark::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn take() -> Option<Value> {
        REPORTER.with(|reporter| {
            reporter.borrow_mut().take().and_then(|r| match r.current {
                Frame::Object(object) => Some(Value::Object(object)),
                _ => None,
            })
        })
    }

    #[test]
    fn nests_along_contexts() {
        REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));
        report!("a", 1);
        {
            let _ctx = push_context("prep");
            report!("b", 2);
        }
        {
            let mut queries = push_collection_context("queries");
            for i in 0..2 {
                let _item = queries.push_collection_item();
                report!("i", i);
            }
        }
        {
            let _blocked = block_reporting();
            report!("hidden", true);
        }
        assert_eq!(take(), Some(json!({"a": 1, "prep": {"b": 2}, "queries": [{"i": 0}, {"i": 1}]})));
    }

    #[test]
    fn disabled_reporting_is_a_noop() {
        assert!(!reporting_enabled());
        let _ctx = push_context("nothing");
        report!("x", 1);
        assert_eq!(take(), None);
    }
}
