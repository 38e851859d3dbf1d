use anyhow::Result;

use larder_core::models::RecipeId;
use larder_core::notice::Notice;

use super::App;
use super::helpers::report;

/// Adds the recipe to favorites, or removes it if it is already there.
pub(crate) async fn cmd_fav(app: &App, id: &str, json: bool) -> Result<()> {
    if app.logged_in() {
        app.load().await?;
    }
    let result = app
        .coordinator
        .toggle_favorite_current(&RecipeId::new(id))
        .await;
    report(&Notice::for_favorite(&result), json)
}
