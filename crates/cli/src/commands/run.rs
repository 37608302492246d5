//! `sitara run` — start a live session, or inspect the payload with `--dry`.

use sitara_config::AppConfig;
use sitara_session::SessionRunner;

pub async fn run(config: AppConfig, dry: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runner = SessionRunner::new(config.clone());

    if dry {
        let (payload, _) = runner.build_initiation()?;
        let preview = serde_json::json!({
            "wss": config.endpoint.wss_base_url,
            "init": payload,
        });
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    runner.run().await?;
    Ok(())
}
