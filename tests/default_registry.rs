//! Process-wide default logger behavior.
//!
//! Everything touching the global registry lives in one test so the steps
//! run in order within this test binary.

use request_logger::context::Context;
use request_logger::logger::{
    get_default, is_default_set, logger_from, set_default, with_logger, FieldValue, Fields,
    Logger, MemorySink,
};

#[test]
fn test_global_default_lifecycle() {
    // Before installation: lookups still succeed and discard output.
    assert!(!is_default_set());
    let fallback = logger_from(&Context::background());
    assert!(fallback.fields().is_empty());
    fallback.info().msg("dropped");

    // Installed default is what unbound contexts resolve to.
    let sink = MemorySink::new();
    let default = Logger::new(sink.clone());
    set_default(default.clone());
    assert!(is_default_set());

    let root = Context::background();
    assert_eq!(logger_from(&root), default);
    assert_eq!(get_default(), default);

    // A bound request logger shadows it only on its own branch.
    let request = with_logger(
        &root,
        get_default().derive(&Fields::new().with("requestID", "abc-123")),
    );
    logger_from(&request).info().msg("we are processing a request");
    logger_from(&root).info().msg("registering request handlers");

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].field("requestID"),
        Some(&FieldValue::Str("abc-123".into()))
    );
    assert!(records[1].field("requestID").is_none());

    // Replacing the default affects unbound contexts, not bound ones.
    let replacement = Logger::new(MemorySink::new()).with().str("gen", "2").logger();
    set_default(replacement.clone());
    assert_eq!(logger_from(&root), replacement);
    assert_ne!(logger_from(&request), replacement);
}
