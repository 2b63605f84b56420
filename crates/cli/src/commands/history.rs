//! `threadloop history` / `threadloop clear` — stored conversation management.

use threadloop_core::DemoId;

use super::CommandResult;

pub async fn show(demo: DemoId) -> CommandResult {
    let config = super::load_config()?;
    let store = threadloop_store::build_from_config(&config);
    let thread = store.load(demo).await?;

    if thread.is_empty() {
        println!("  No stored messages for {demo}.");
        return Ok(());
    }

    println!("  {demo}: {} messages", thread.len());
    println!();
    for message in &thread {
        super::print_message(message);
    }
    Ok(())
}

/// One line per demonstration with its stored message count.
pub async fn summary() -> CommandResult {
    let config = super::load_config()?;
    let store = threadloop_store::build_from_config(&config);

    println!("  Stored conversations ({} backend):", config.store.backend);
    for demo in DemoId::ALL {
        match store.load(demo).await {
            Ok(thread) => println!("    {demo}: {} messages", thread.len()),
            Err(e) => println!("    {demo}: unreadable ({e})"),
        }
    }
    Ok(())
}

pub async fn clear(demo: DemoId) -> CommandResult {
    let config = super::load_config()?;
    let store = threadloop_store::build_from_config(&config);
    store.clear(demo).await?;
    println!("  Cleared {demo}.");
    Ok(())
}
