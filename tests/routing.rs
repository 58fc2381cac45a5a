#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for level gating, channel flags and line layout.

mod common;

use chanlog::logging::{Channel, VERBOSE_LEVEL};

// ---------------------------------------------------------------------------
// Level gate
// ---------------------------------------------------------------------------

/// A message above the threshold is dropped until the threshold reaches it.
#[test]
fn raising_threshold_admits_deeper_messages() {
    for low in -2..4 {
        for high in (low + 1)..6 {
            let (log, console) = common::logger();
            log.set_level(low);
            log.registry().set_enabled(Channel::Debug, true);
            log.debug(high, "deep", &[]);
            assert!(
                console.lines().is_empty(),
                "level {high} passed threshold {low}"
            );
            log.set_level(high);
            log.registry().set_enabled(Channel::Debug, true);
            log.debug(high, "deep", &[]);
            assert_eq!(console.lines(), vec!["[debug] deep"], "threshold {high}");
        }
    }
}

/// Quiet mode silences every channel, errors included.
#[test]
fn quiet_silences_everything() {
    let (log, console) = common::logger();
    log.set_level(5);
    log.set_quiet(true);
    log.debug(1, "d", &[]);
    log.info("i", &[]);
    log.action("a", &[]);
    log.error("e", &[]);
    log.user("u", &[]);
    log.print("p", &[]);
    assert!(console.text().is_empty());

    log.set_quiet(false);
    log.error("back", &[]);
    assert_eq!(console.lines(), vec!["[error] back"]);
}

/// Verbose mode pins the level and shows debug output; set_level undoes it.
#[test]
fn verbose_then_set_level() {
    let (log, console) = common::logger();
    log.set_verbose();
    assert!(log.is_verbose());
    assert_eq!(log.level(), VERBOSE_LEVEL);
    log.debug(VERBOSE_LEVEL, "v", &[]);
    log.set_level(1);
    assert!(!log.is_verbose());
    log.debug(VERBOSE_LEVEL, "hidden", &[]);
    assert_eq!(console.lines(), vec!["[debug] v"]);
}

// ---------------------------------------------------------------------------
// Line layout
// ---------------------------------------------------------------------------

#[test]
fn channel_prefixes() {
    let (log, console) = common::logger();
    log.set_level(1);
    log.registry().set_profile_enabled(true);
    log.debug(1, "a {} b", &[&1]);
    log.info("{1}-{0}", &[&"x", &"y"]);
    log.action("click", &[]);
    log.error("oops", &[]);
    log.user("hello", &[]);
    log.profile("p", &[]);
    log.print("plain", &[]);
    insta::assert_snapshot!(console.text(), @r"
    [debug] a 1 b
    [info] y-x
    [log] click
    [error] oops
    [user] hello
    [profile] p
    plain
    ");
}

#[test]
fn info_and_action_become_debug_lines_at_level_three() {
    let (log, console) = common::logger();
    log.set_level(3);
    log.info("i", &[]);
    log.action("a", &[]);
    log.error("e", &[]);
    assert_eq!(console.lines(), vec!["[debug] i", "[debug] a", "[error] e"]);
}

#[test]
fn custom_user_tag() {
    let (log, console) = common::logger();
    log.registry().set_user_tag("operator");
    log.user("step {}", &[&2]);
    assert_eq!(console.lines(), vec!["[operator] step 2"]);
}

#[test]
fn malformed_template_does_not_silence_later_lines() {
    let (log, console) = common::logger();
    log.info("missing {3}", &[&1]);
    log.info("fine {}", &[&1]);
    let lines = console.lines();
    assert_eq!(lines.len(), 3, "got {lines:?}");
    assert!(lines[0].starts_with("[error] "));
    assert_eq!(lines[1], "[info] missing {3}");
    assert_eq!(lines[2], "[info] fine 1");
}
