use std::sync::Arc;

use qab_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), qab_core::Error> {
    qab_core::logging::init("qab")?;

    let cfg = Arc::new(Config::load()?);

    qab_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| qab_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
