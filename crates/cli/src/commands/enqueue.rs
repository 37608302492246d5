//! `sitara enqueue` — append a contextual update without opening a session.
//!
//! The fast path for external writers: the running session's synchronizer
//! picks the record up on its next poll tick.

use sitara_config::AppConfig;
use sitara_context::UpdateQueue;

pub async fn run(
    config: &AppConfig,
    text: &str,
    conversation_id: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let queue = UpdateQueue::new(&config.watch.updates_queue_path);
    queue.append(text, conversation_id)?;
    println!(
        "Enqueued contextual update to {}",
        config.watch.updates_queue_path.display()
    );
    Ok(())
}
