//! Deep reads.

use std::collections::HashSet;

use super::Value;

/// Read every property and element reachable from `value`.
///
/// Called inside a consumer, this subscribes it to every reactive property
/// and container observer in the graph, so a change anywhere below `value`
/// re-runs it. Each container is visited once, so cyclic graphs terminate.
pub fn traverse(value: &Value) {
    let mut seen = HashSet::new();
    walk(value, &mut seen);
}

fn walk(value: &Value, seen: &mut HashSet<usize>) {
    match value {
        Value::Object(obj) => {
            if !seen.insert(obj.addr()) {
                return;
            }
            for key in obj.keys() {
                walk(&obj.get(&key), seen);
            }
        }
        Value::Array(list) => {
            if !seen.insert(list.addr()) {
                return;
            }
            for item in list.to_vec() {
                walk(&item, seen);
            }
        }
        _ => {}
    }
}
