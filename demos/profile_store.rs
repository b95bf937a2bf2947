//! Demonstration of a store with partial updates and subscriptions

use tincan_store::{aggregate, Store, Writer};

aggregate! {
    #[derive(Clone, Debug)]
    struct Profile => ProfilePatch {
        user_name: String,
        active: bool,
        counter: i32,
        actions: Actions,
    }
}

/// Actions built by the factory; they write through the store's writer.
#[derive(Clone, Debug)]
struct Actions {
    writer: Writer<Profile>,
}

impl Actions {
    fn increment(&self) -> tincan_store::Result<()> {
        self.writer
            .update(|prev| ProfilePatch::default().counter(prev.counter + 1))
    }

    fn rename(&self, name: &str) -> tincan_store::Result<()> {
        self.writer.set(ProfilePatch::default().user_name(name))
    }
}

fn main() -> tincan_store::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Store Example: Profile ===\n");

    let store = Store::builder()
        .name("profile")
        .build_with(|writer: &Writer<Profile>| Profile {
            user_name: String::new(),
            active: false,
            counter: 1,
            actions: Actions {
                writer: writer.clone(),
            },
        });

    println!("1. Setting up subscriber");
    let reader = store.downgrade();
    let subscription = store.subscribe_fn(move || {
        if let Some(store) = reader.upgrade() {
            let state = store.get();
            println!(
                "   [Store Update] user: {:?}, active: {}, counter: {}",
                state.user_name, state.active, state.counter
            );
        }
    });

    println!("\n2. Renaming");
    store.get().actions.rename("Debs")?;

    println!("\n3. Incrementing twice");
    store.get().actions.increment()?;
    store.get().actions.increment()?;

    println!("\n4. Activating");
    store.set(ProfilePatch::default().active(true))?;

    println!("\n5. Unsubscribing, then deactivating");
    subscription.unsubscribe();
    store.set(ProfilePatch::default().active(false))?;

    let state = store.get();
    println!("\n6. Final state: {:?} / {} / {}", state.user_name, state.active, state.counter);

    println!("\n✓ Example complete!");
    Ok(())
}
