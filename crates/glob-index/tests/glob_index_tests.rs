use glob_index::{GlobIndex, GlobIndexError};

// ── Helper Functions ─────────────────────────────────────────────────────

fn query(index: &GlobIndex<&'static str>, pattern: &str) -> Vec<&'static str> {
    let mut values = index.query(pattern);
    values.sort_unstable();
    values
}

fn sample() -> GlobIndex<&'static str> {
    let mut index = GlobIndex::new();
    index.insert("key", "value");
    index.insert("key2", "value");
    index.insert("key22", "value2");
    index.insert("k1", "value3");
    index.insert("test", "value4");
    index
}

const NONE: Vec<&str> = Vec::new();

// ── Insertion ────────────────────────────────────────────────────────────

#[test]
fn insert_and_query() {
    let mut index = sample();
    assert_eq!(index.len(), 5);

    assert_eq!(query(&index, "whoops"), NONE);
    assert_eq!(query(&index, "key222"), NONE);
    assert_eq!(query(&index, "key22?"), NONE);
    assert_eq!(query(&index, "key22*"), vec!["value2"]);
    assert_eq!(query(&index, "key%%*"), vec!["value", "value2"]);
    assert_eq!(query(&index, "key%*"), vec!["value", "value", "value2"]);
    assert_eq!(query(&index, "key*"), vec!["value", "value", "value2"]);
    assert_eq!(query(&index, "k*"), vec!["value", "value", "value2", "value3"]);
    assert_eq!(query(&index, "k*2"), vec!["value", "value2"]);
    assert_eq!(query(&index, "test"), vec!["value4"]);
    assert_eq!(query(&index, "test*"), vec!["value4"]);
    assert_eq!(query(&index, "test?"), NONE);
    assert_eq!(query(&index, "test%"), NONE);
    assert_eq!(query(&index, "test%*"), vec!["value4"]);

    index.insert("k", "value4");
    assert_eq!(query(&index, "k"), vec!["value4"]);
    assert_eq!(query(&index, "k%"), vec!["value3"]);
    assert_eq!(query(&index, "k*"), vec!["value", "value", "value2", "value3", "value4"]);
    assert_eq!(
        query(&index, "*"),
        vec!["value", "value", "value2", "value3", "value4", "value4"]
    );
}

#[test]
fn repeated_values_are_kept() {
    let mut index = GlobIndex::new();
    index.insert("key", "value");
    index.insert("key", "value");
    assert_eq!(index.len(), 2);
    assert_eq!(query(&index, "key"), vec!["value", "value"]);

    assert_eq!(index.remove("key", &"value"), Ok(true));
    assert_eq!(query(&index, "key"), vec!["value"]);
}

// ── Removal ──────────────────────────────────────────────────────────────

#[test]
fn remove_and_merge() {
    let mut index = GlobIndex::new();
    index.insert("andrew", "value");
    index.insert("andreas", "value");
    index.insert("andrar", "value2");
    index.insert("andrary", "value3");
    index.insert("andy", "value4");

    assert_eq!(query(&index, "*"), vec!["value", "value", "value2", "value3", "value4"]);

    assert_eq!(index.remove("andrary", &"value2"), Ok(false));

    assert_eq!(index.remove("andrary", &"value3"), Ok(true));
    assert_eq!(query(&index, "andrary*"), NONE);

    assert_eq!(query(&index, "andrar*"), vec!["value2"]);
    assert_eq!(index.remove("andrar", &"value2"), Ok(true));
    assert_eq!(query(&index, "andrar*"), NONE);

    assert_eq!(query(&index, "andy"), vec!["value4"]);
    assert_eq!(index.remove("andy", &"value4"), Ok(true));
    assert_eq!(query(&index, "andy"), NONE);

    assert_eq!(query(&index, "andre*"), vec!["value", "value"]);
    assert_eq!(query(&index, "andreas"), vec!["value"]);
    assert_eq!(index.remove("andreas", &"value"), Ok(true));
    assert_eq!(query(&index, "andre*"), vec!["value"]);
    assert_eq!(query(&index, "andreas"), NONE);

    // Only "andrew" is left, folded back into a single node.
    assert_eq!(index.node_count(), 2);

    assert_eq!(query(&index, "andrew"), vec!["value"]);
    assert_eq!(index.remove("andrew", &"value"), Ok(true));
    assert_eq!(query(&index, "andrew"), NONE);

    assert_eq!(query(&index, "*"), NONE);
    assert!(index.is_empty());
    assert_eq!(index.node_count(), 1);
}

#[test]
fn remove_unknown_key() {
    let mut index = sample();
    assert_eq!(index.remove("ke", &"value"), Ok(false));
    assert_eq!(index.remove("keys", &"value"), Ok(false));
    assert_eq!(index.remove("", &"value"), Ok(false));
    assert_eq!(index.len(), 5);
}

#[test]
fn split_node_numbered_bucket_is_not_backfilled() {
    let mut index = GlobIndex::new();
    index.insert("3.67", "value3");
    index.insert("3.6", "value2");
    index.insert("3.5", "value1");

    // "3.6" now ends at a node labelled "6" that was cut out of "3.6" when
    // "3.5" arrived, so its numbered bucket never saw "value2".
    assert_eq!(
        index.remove("3.6", &"value2"),
        Err(GlobIndexError::NumberedValueMissing { key: "3.6".into() })
    );
    assert_eq!(index.len(), 3);
    assert_eq!(query(&index, "3.6"), vec!["value2"]);
    assert_eq!(query(&index, "*"), vec!["value1", "value2", "value3"]);

    // "5" was created by insertion and has its bucket.
    assert_eq!(index.remove("3.5", &"value1"), Ok(true));
    assert_eq!(query(&index, "3.%*"), vec!["value2", "value3"]);

    // Folding "6" back into "3.6" leaves a label that is not a number.
    assert_eq!(index.remove("3.6", &"value2"), Ok(true));
    assert_eq!(query(&index, "*"), vec!["value3"]);
    assert_eq!(index.node_count(), 2);
}

// ── Queries ──────────────────────────────────────────────────────────────

#[test]
fn query_exact() {
    let mut index = GlobIndex::new();
    index.insert("key", "value");
    index.insert("key2", "value");
    index.insert("key22", "value2");
    index.insert("k1", "value3");

    assert_eq!(query(&index, "whoops"), NONE);
    assert_eq!(query(&index, "key222"), NONE);
    assert_eq!(query(&index, "key"), vec!["value"]);
    assert_eq!(query(&index, "k"), NONE);
    assert_eq!(query(&index, "k1"), vec!["value3"]);

    index.insert("key", "value4");
    assert_eq!(query(&index, "key"), vec!["value", "value4"]);

    assert_eq!(query(&index, ""), NONE);
}

#[test]
fn query_wildcards() {
    let mut index = sample();

    assert_eq!(query(&index, "whoops"), NONE);
    assert_eq!(query(&index, "k??%*"), vec!["value", "value", "value2"]);
    assert_eq!(query(&index, "?ey"), vec!["value"]);
    assert_eq!(query(&index, "?ey*"), vec!["value", "value", "value2"]);
    assert_eq!(query(&index, "?*"), vec!["value", "value", "value2", "value3", "value4"]);
    assert_eq!(query(&index, "*??"), vec!["value", "value", "value2", "value3", "value4"]);
    assert_eq!(query(&index, "*???"), vec!["value", "value", "value2", "value4"]);
    assert_eq!(query(&index, "k*2"), vec!["value", "value2"]);
    assert_eq!(query(&index, "k*"), vec!["value", "value", "value2", "value3"]);
    assert_eq!(query(&index, "t??t"), vec!["value4"]);
    assert_eq!(query(&index, "t??*"), vec!["value4"]);
    assert_eq!(query(&index, "t*"), vec!["value4"]);
    assert_eq!(query(&index, "*st"), vec!["value4"]);
    assert_eq!(query(&index, "t*t"), vec!["value4"]);

    index.insert("this2345that", "value5");
    assert_eq!(query(&index, "t*%%%%that"), vec!["value5"]);
    assert_eq!(query(&index, "t*%*that"), vec!["value5"]);
    assert_eq!(query(&index, "t*%**t"), vec!["value4", "value5"]);
    assert_eq!(query(&index, "t*%**"), vec!["value4", "value5"]);
    assert_eq!(query(&index, "t*"), vec!["value4", "value5"]);
    assert_eq!(query(&index, "t**"), vec!["value4", "value5"]);
    assert_eq!(query(&index, "t?*"), vec!["value4", "value5"]);
    assert_eq!(query(&index, "t??*"), vec!["value4", "value5"]);
    assert_eq!(query(&index, "t???*"), vec!["value4", "value5"]);
    assert_eq!(query(&index, "t????*"), vec!["value5"]);
    // Ending on `*%*` asks for digits at the end of the key.
    assert_eq!(query(&index, "t*%*"), NONE);
    assert_eq!(query(&index, "t*%"), NONE);

    index.insert("tab12", "value6");
    assert_eq!(query(&index, "t*%*"), vec!["value6"]);
    assert_eq!(query(&index, "t*%"), vec!["value6"]);
    assert_eq!(query(&index, "t*%**"), vec!["value4", "value5", "value6"]);
    assert_eq!(query(&index, "tab%*"), vec!["value6"]);
}

#[test]
fn query_digit_suffix() {
    let mut index = GlobIndex::new();
    index.insert("key", "value");
    index.insert("key2", "value");
    index.insert("key22", "value2");
    index.insert("key22bs", "value4");
    index.insert("k1", "value3");

    assert_eq!(query(&index, "whoops"), NONE);
    assert_eq!(query(&index, "key%*"), vec!["value", "value", "value2"]);
    assert_eq!(query(&index, "key%%*"), vec!["value", "value2"]);
    assert_eq!(query(&index, "key2%*"), vec!["value", "value2"]);
    assert_eq!(query(&index, "k%*"), vec!["value3"]);

    assert_eq!(index.remove("k1", &"value3"), Ok(true));
    assert_eq!(query(&index, "k%*"), NONE);
}

#[test]
fn query_escaped_wildcards() {
    let mut index = GlobIndex::new();
    index.insert("a*b", 1);
    index.insert("axb", 2);
    index.insert("50%", 3);
    index.insert("507", 4);

    assert_eq!(index.query(r"a\*b"), vec![1]);
    let mut both = index.query("a*b");
    both.sort_unstable();
    assert_eq!(both, vec![1, 2]);
    assert_eq!(index.query(r"50\%"), vec![3]);
    assert_eq!(index.query("50%"), vec![4]);
}

#[test]
fn clear_resets() {
    let mut index = sample();
    index.clear();
    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
    assert_eq!(index.node_count(), 1);
    assert_eq!(query(&index, "*"), NONE);

    index.insert("key", "value");
    assert_eq!(query(&index, "k?y"), vec!["value"]);
}
