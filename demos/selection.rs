//! Demonstration of a UI-style selection over a JSON store

use serde_json::{json, Map, Value};
use tincan_store::Store;

fn main() -> tincan_store::Result<()> {
    println!("=== Selection Example ===\n");

    let store: Store<Map<String, Value>> = Store::new(Map::new());
    store.write(json!({ "title": "Inbox", "unread": 0 }))?;

    // A component rendering only the unread badge.
    let badge = store.select(
        |state: &Map<String, Value>| state.get("unread").cloned().unwrap_or(Value::Null),
        |unread| println!("   [Render] unread badge: {unread}"),
    );
    println!("1. Initial badge: {}", badge.get());

    println!("\n2. Changing the title (badge does not re-render)");
    store.write(json!({ "title": "Archive" }))?;

    println!("\n3. Receiving mail");
    store.update(|state| {
        let unread = state.get("unread").and_then(Value::as_i64).unwrap_or(0);
        json!({ "unread": unread + 1 })
    })?;

    println!("\n4. Rejecting a malformed update");
    if let Err(err) = store.write(json!(["not", "an", "object"])) {
        println!("   error: {err}");
    }

    println!("\n5. Unmounting the component");
    drop(badge);
    store.write(json!({ "unread": 0 }))?;
    println!("   listeners left: {}", store.listener_count());

    println!("\n✓ Example complete!");
    Ok(())
}
