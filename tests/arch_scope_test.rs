//! Accessor behaviour over the current thread's arch scope.

use cuda_scope::api::{self, get_target_arch, reset_target_arch, set_target_arch};
use cuda_scope::{ArchError, ArchSpecParser, ArchValue, Target};

fn strings(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|e| e.to_string()).collect()
}

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
    api::init();
}

#[test]
fn test_default_state_is_unset() {
    setup();
    assert_eq!(get_target_arch(None), ArchValue::None);

    set_target_arch("sm_61", true).unwrap();
    reset_target_arch();
    assert_eq!(get_target_arch(None), ArchValue::None);
}

#[test]
fn test_short_form_expansion() {
    setup();
    set_target_arch("sm_75", true).unwrap();
    assert_eq!(
        get_target_arch(None),
        ArchValue::List(strings(&["-gencode", "arch=compute_75,code=sm_75"]))
    );
}

#[test]
fn test_short_form_passthrough() {
    setup();
    set_target_arch("sm_75", false).unwrap();
    assert_eq!(get_target_arch(None), ArchValue::Str("sm_75".to_string()));
}

#[test]
fn test_round_trip() {
    setup();
    let inputs: Vec<(ArchValue, bool)> = vec![
        (ArchValue::None, true),
        ("sm_52".into(), true),
        ("sm_52".into(), false),
        (
            ArchValue::List(strings(&[
                "-gencode",
                "arch=compute_52,code=sm_52",
                "-gencode",
                "arch=compute_70,code=sm_70",
            ])),
            true,
        ),
    ];

    for (raw, gencode) in inputs {
        let expected = ArchSpecParser::parse(raw.clone(), gencode).unwrap().to_value();
        set_target_arch(raw, gencode).unwrap();
        assert_eq!(get_target_arch(None), expected);
        // Reading twice gives the same answer.
        assert_eq!(get_target_arch(None), expected);
    }
}

#[test]
fn test_missing_directive_marker() {
    setup();
    let err = set_target_arch(strings(&["arch=compute_75,code=sm_75"]), true).unwrap_err();
    assert!(matches!(err, ArchError::MissingDirectiveMarker { .. }));
    assert!(err.is_misuse());
    assert_eq!(get_target_arch(None), ArchValue::None);
}

#[test]
fn test_previous_is_recorded() {
    setup();
    set_target_arch("sm_70", false).unwrap();
    set_target_arch("sm_80", false).unwrap();

    api::with_scope_stack(|stack| {
        let previous = stack.current().previous().map(|p| p.to_value());
        assert_eq!(previous, Some(ArchValue::Str("sm_70".to_string())));
    });
}

#[test]
fn test_explicit_target_bypasses_scope() {
    setup();
    set_target_arch("sm_70", false).unwrap();
    let target = Target::parse("cuda -arch=sm_90").unwrap();
    assert_eq!(get_target_arch(Some(&target)), ArchValue::Str("sm_90".to_string()));
    assert_eq!(get_target_arch(None), ArchValue::Str("sm_70".to_string()));
}

#[test]
fn test_threads_have_separate_scopes() {
    setup();
    set_target_arch("sm_70", false).unwrap();

    let seen = std::thread::spawn(|| {
        let before = get_target_arch(None);
        set_target_arch("sm_90", false).unwrap();
        before
    })
    .join()
    .unwrap();

    assert_eq!(seen, ArchValue::None);
    assert_eq!(get_target_arch(None), ArchValue::Str("sm_70".to_string()));
}

#[test]
fn test_teardown_clears_nested_scopes() {
    setup();
    set_target_arch("sm_70", false).unwrap();
    let stale = api::enter_target_arch("sm_80", false).unwrap();
    api::teardown();
    assert_eq!(get_target_arch(None), ArchValue::None);

    // A guard from before teardown must not pop scopes entered afterwards.
    let live = api::enter_target_arch("sm_86", false).unwrap();
    drop(stale);
    assert_eq!(get_target_arch(None), ArchValue::Str("sm_86".to_string()));
    assert_eq!(api::with_scope_stack(|s| s.depth()), 2);

    drop(live);
    assert_eq!(api::with_scope_stack(|s| s.depth()), 1);
}
