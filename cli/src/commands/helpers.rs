use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::models::{Favorite, Ingredient, Recipe, User};
use larder_core::notice::{Notice, NoticeLevel};
use larder_core::store::EntityStore;

/// Parse an `--ingredient` value of the form `NAME=QTY`.
/// The quantity may be empty ("salt=") but the name may not.
pub(crate) fn parse_ingredient(s: &str) -> Result<Ingredient> {
    let (name, quantity) = s
        .split_once('=')
        .with_context(|| format!("Invalid ingredient '{s}'. Use NAME=QTY, e.g. 'flour=200g'"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid ingredient '{s}': name is empty");
    }
    Ok(Ingredient::new(name, quantity.trim()))
}

/// Ask a yes/no question on stderr. Anything but y/yes is a no.
pub(crate) fn prompt_confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N]: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let Some(line) = stdin.lock().lines().next() else {
        return Ok(false);
    };
    let answer = line.context("Failed to read answer")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub(crate) fn print_recipe_table(recipes: &[Recipe], store: &EntityStore) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Cuisine")]
        cuisine: String,
        #[tabled(rename = "Ingr.")]
        ingredients: usize,
        #[tabled(rename = "Added")]
        added: String,
        #[tabled(rename = "")]
        marks: String,
    }

    let now = Utc::now();
    let user = store.current_user();
    let rows: Vec<RecipeRow> = recipes
        .iter()
        .enumerate()
        .map(|(i, r)| RecipeRow {
            idx: i + 1,
            id: r.id.to_string(),
            title: truncate(&r.title, 35),
            cuisine: truncate(&r.cuisine, 15),
            ingredients: r.ingredients.len(),
            added: r.created_at.map_or("-".into(), |t| time_ago(t, now)),
            marks: marks(r, user, store.is_favorite(&r.id)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_favorite_table(favorites: &[Favorite]) {
    #[derive(Tabled)]
    struct FavoriteRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Saved")]
        saved: String,
    }

    let now = Utc::now();
    let rows: Vec<FavoriteRow> = favorites
        .iter()
        .enumerate()
        .map(|(i, f)| FavoriteRow {
            idx: i + 1,
            id: f.recipe_id.to_string(),
            title: f.title.as_deref().map(|t| truncate(t, 40)).unwrap_or_default(),
            saved: f.added_at.map_or("-".into(), |t| time_ago(t, now)),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

fn marks(recipe: &Recipe, user: Option<&User>, favorite: bool) -> String {
    let mut out = Vec::new();
    if favorite {
        out.push("★");
    }
    if user.is_some_and(|u| recipe.is_owned_by(u)) {
        out.push("yours");
    }
    out.join(" ")
}

/// Print a notice and exit non-zero if it reports a failure.
pub(crate) fn report(notice: &Notice, json: bool) -> Result<()> {
    if json {
        if notice.is_error() {
            println!("{}", json_error(&notice.message));
        } else {
            println!("{}", serde_json::to_string_pretty(notice)?);
        }
    } else {
        match notice.level {
            NoticeLevel::Error => eprintln!("{}", notice.message),
            NoticeLevel::Success | NoticeLevel::Info => println!("{}", notice.message),
        }
    }
    if notice.is_error() {
        process::exit(1);
    }
    Ok(())
}

pub(crate) fn json_error(message: &str) -> String {
    json!({ "error": message }).to_string()
}

/// Human relative time, e.g. "3 days ago". Future timestamps read as "just now".
pub(crate) fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds();
    let (n, unit) = match secs {
        s if s < 60 => return "just now".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

/// Shortens `s` to at most `max` characters, ending in "..." when cut.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().nth(max).is_none() {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    kept + "..."
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use larder_core::models::{RecipeId, UserId};

    fn recipe(owner: &str) -> Recipe {
        Recipe {
            id: RecipeId::new("r1"),
            title: "Soup".to_string(),
            cuisine: "Unknown".to_string(),
            ingredients: vec![],
            owner: Some(UserId::new(owner)),
            created_at: None,
        }
    }

    #[test]
    fn test_parse_ingredient() {
        let i = parse_ingredient("flour=200g").unwrap();
        assert_eq!(i.name, "flour");
        assert_eq!(i.quantity, "200g");

        let i = parse_ingredient(" olive oil = 2 tbsp ").unwrap();
        assert_eq!(i.name, "olive oil");
        assert_eq!(i.quantity, "2 tbsp");
    }

    #[test]
    fn test_parse_ingredient_empty_quantity() {
        assert_eq!(parse_ingredient("salt=").unwrap().quantity, "");
    }

    #[test]
    fn test_parse_ingredient_invalid() {
        assert!(parse_ingredient("flour").is_err());
        assert!(parse_ingredient("=200g").is_err());
    }

    #[test]
    fn test_time_ago() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now + Duration::hours(1), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::minutes(45), now), "45 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(3), now), "3 days ago");
        assert_eq!(time_ago(now - Duration::days(65), now), "2 months ago");
        assert_eq!(time_ago(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn test_marks() {
        let me = User {
            id: UserId::new("u1"),
            name: "Ada Lovelace".to_string(),
            username: "ada".to_string(),
        };
        assert_eq!(marks(&recipe("u1"), Some(&me), true), "★ yours");
        assert_eq!(marks(&recipe("u2"), Some(&me), false), "");
        assert_eq!(marks(&recipe("u1"), None, true), "★");
    }

    #[test]
    fn test_json_error_escapes() {
        assert_eq!(json_error("bad \"id\""), r#"{"error":"bad \"id\""}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("日清カップヌードル", 8), "日清カップ...");
    }
}
