use anyhow::Result;

use crate::config::Config;

pub(crate) fn cmd_config_show(config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("Config file:  {}", config.config_file.display());
    println!("Data dir:     {}", config.data_dir.display());
    println!(
        "api_base_url:   {} ({})",
        config.api_base_url.value, config.api_base_url.source
    );
    println!(
        "share_base_url: {} ({})",
        config.share_base_url.value, config.share_base_url.source
    );
    println!(
        "qr_share:       {} ({})",
        config.qr_share.value, config.qr_share.source
    );
    Ok(())
}
