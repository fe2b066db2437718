/*
 * Responsibility
 * - tokio runtime entry
 * - calls app::run() (no logic here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    service_gate::app::run().await?;
    Ok(())
}
