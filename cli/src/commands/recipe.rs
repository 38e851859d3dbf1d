use anyhow::{Result, bail};
use chrono::Utc;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use larder_core::models::{Ingredient, NewRecipe, Recipe};
use larder_core::notice::Notice;
use larder_core::{DeleteFlow, DeleteState, FlowError, SyncError};

use super::App;
use super::helpers::{
    parse_ingredient, print_favorite_table, print_recipe_table, prompt_confirm, report, time_ago,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListView {
    All,
    Mine,
    Favorites,
}

pub(crate) async fn cmd_list(app: &App, view: ListView, json: bool) -> Result<()> {
    if view != ListView::All && !app.logged_in() {
        bail!(
            "You must be logged in to see your own recipes or favorites. Run `larder auth token`."
        );
    }
    app.load().await?;
    let store = app.store();

    match view {
        ListView::All | ListView::Mine => {
            let recipes = if view == ListView::All {
                store.ordered_recipes()
            } else {
                store.own_recipes()
            };
            if json {
                println!("{}", serde_json::to_string_pretty(recipes.as_slice())?);
            } else if recipes.is_empty() {
                eprintln!("No recipes found");
            } else {
                print_recipe_table(&recipes, store);
            }
        }
        ListView::Favorites => {
            let favorites = store.favorites();
            if json {
                println!("{}", serde_json::to_string_pretty(favorites.as_slice())?);
            } else if favorites.is_empty() {
                eprintln!("No favorites yet");
            } else {
                print_favorite_table(&favorites);
            }
        }
    }
    Ok(())
}

pub(crate) async fn cmd_show(app: &App, id: &str, json: bool) -> Result<()> {
    app.load().await?;
    let recipe = app.recipe_or_exit(id, json);
    let store = app.store();
    let favorite = store.is_favorite(&recipe.id);
    let yours = store.current_user().is_some_and(|u| recipe.is_owned_by(u));

    if json {
        #[derive(Serialize)]
        struct Detail<'a> {
            #[serde(flatten)]
            recipe: &'a Recipe,
            favorite: bool,
            yours: bool,
        }
        let detail = Detail {
            recipe: &recipe,
            favorite,
            yours,
        };
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let title = &recipe.title;
    let cuisine = &recipe.cuisine;
    println!("=== {title} ===");
    println!("Cuisine: {cuisine}");
    if let Some(at) = recipe.created_at {
        println!("Added: {}", time_ago(at, Utc::now()));
    }
    if yours {
        println!("You created this recipe");
    }
    if favorite {
        println!("★ In your favorites");
    }

    if recipe.ingredients.is_empty() {
        println!("\nNo ingredients listed");
        return Ok(());
    }

    #[derive(Tabled)]
    struct IngredientRow<'a> {
        #[tabled(rename = "Ingredient")]
        name: &'a str,
        #[tabled(rename = "Quantity")]
        quantity: &'a str,
    }
    let rows: Vec<IngredientRow> = recipe
        .ingredients
        .iter()
        .map(|i| IngredientRow {
            name: &i.name,
            quantity: &i.quantity,
        })
        .collect();
    println!("\n{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}

pub(crate) async fn cmd_create(
    app: &App,
    title: &str,
    cuisine: Option<String>,
    ingredients: &[String],
    json: bool,
) -> Result<()> {
    let ingredients: Vec<Ingredient> = ingredients
        .iter()
        .map(|s| parse_ingredient(s))
        .collect::<Result<_>>()?;
    let payload = NewRecipe {
        title: title.to_string(),
        cuisine,
        ingredients,
    };

    let result = app.coordinator.create(&payload).await;
    if let (true, Ok(recipe)) = (json, &result) {
        println!("{}", serde_json::to_string_pretty(recipe)?);
        return Ok(());
    }
    report(&Notice::for_create(&result), json)
}

/// Runs the delete confirmation flow for a recipe the current user owns.
pub(crate) async fn cmd_delete(app: &App, id: &str, yes: bool, json: bool) -> Result<()> {
    if !app.logged_in() {
        return report(
            &Notice::for_delete(&Err(FlowError::Sync(SyncError::Unauthenticated))),
            json,
        );
    }
    app.load().await?;
    let recipe = app.recipe_or_exit(id, json);

    let mut flow = DeleteFlow::new();
    if let Err(e) = flow.request_owned(&recipe, app.store().current_user()) {
        return report(&Notice::for_delete(&Err(e)), json);
    }

    let title = match flow.state() {
        DeleteState::Confirming { title, .. } => title.clone(),
        _ => recipe.title.clone(),
    };
    if !yes && !prompt_confirm(&format!("Delete \"{title}\"? This cannot be undone."))? {
        flow.cancel()?;
        return report(&Notice::info("Delete cancelled."), json);
    }

    let result = flow.confirm(&app.coordinator).await;
    report(&Notice::for_delete(&result), json)
}
