use anyhow::{Result, bail};
use chrono::Utc;

use super::App;
use super::helpers::time_ago;

pub(crate) async fn cmd_stats(app: &App, json: bool) -> Result<()> {
    if !app.logged_in() {
        bail!("You must be logged in to see your stats. Run `larder auth token`.");
    }
    app.load().await?;
    let store = app.store();
    let stats = store.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let now = Utc::now();
    match store.current_user() {
        Some(user) => println!("=== Welcome back, {} ===\n", user.first_name()),
        None => println!("=== Your larder ===\n"),
    }
    println!("  Your recipes:   {}", stats.own_recipes);
    println!("  Favorites:      {}", stats.favorites);
    println!("  All recipes:    {}", stats.all_recipes);

    if let Some(r) = &stats.latest_own {
        let when = r.created_at.map(|t| format!(" ({})", time_ago(t, now)));
        println!("\n  Latest recipe:   {}{}", r.title, when.unwrap_or_default());
    }
    if let Some(f) = &stats.latest_favorite {
        let title = f.title.as_deref().unwrap_or(f.recipe_id.as_str());
        let when = f.added_at.map(|t| format!(" ({})", time_ago(t, now)));
        println!("  Latest favorite: {title}{}", when.unwrap_or_default());
    }
    Ok(())
}
