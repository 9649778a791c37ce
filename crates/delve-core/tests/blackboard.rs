use delve_core::{BbKey, Blackboard, CoreError};

#[test]
fn blackboard_set_get_remove_roundtrip() {
    let k_u32 = BbKey::<u32>::new("Count");
    let k_str = BbKey::<String>::new("Name");

    let mut bb = Blackboard::new();
    assert!(!bb.contains(k_u32));

    bb.set(k_u32, 123);
    bb.set(k_str, "hello".to_string());

    assert_eq!(bb.get(k_u32).copied(), Some(123));
    assert_eq!(bb.get(k_str).map(|s| s.as_str()), Some("hello"));
    assert_eq!(bb.len(), 2);

    assert_eq!(bb.remove(k_u32), Some(123));
    assert_eq!(bb.get(k_u32), None);
}

#[test]
fn typed_and_named_access_share_slots() {
    let key = BbKey::<i32>::new("ActionVoxel");
    let mut bb = Blackboard::new();

    bb.set_named(String::from("ActionVoxel"), 7i32);
    assert_eq!(bb.get(key).copied(), Some(7));

    bb.set(key, 9);
    assert_eq!(bb.get_named::<i32>("ActionVoxel").copied(), Some(9));

    assert!(bb.erase("ActionVoxel"));
    assert!(!bb.contains_name("ActionVoxel"));
}

#[test]
fn type_mismatch_is_reported_not_panicked() {
    let mut bb = Blackboard::new();
    bb.set(BbKey::<u32>::new("Count"), 1u32);

    assert_eq!(bb.get(BbKey::<i32>::new("Count")), None);
    let err = bb.try_get(BbKey::<i32>::new("Count")).unwrap_err();
    assert!(matches!(err, CoreError::BlackboardTypeMismatch { ref key, .. } if key == "Count"));

    // The original value survives the bad read.
    assert_eq!(bb.get(BbKey::<u32>::new("Count")).copied(), Some(1));
}

#[test]
fn overwrite_may_change_type() {
    let mut bb = Blackboard::new();
    bb.set_named("Slot", 1u8);
    bb.set_named("Slot", "text");
    assert_eq!(bb.get_named::<&str>("Slot").copied(), Some("text"));
    assert_eq!(bb.get_or(BbKey::<u8>::new("Slot"), 5), 5);
}
