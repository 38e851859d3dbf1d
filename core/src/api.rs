//! Wire shapes of the recipe service and their conversion into core models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Favorite, Ingredient, NewRecipe, Recipe, RecipeId, User, UserId};

pub const DEFAULT_TITLE: &str = "Untitled Recipe";
pub const DEFAULT_CUISINE: &str = "Unknown";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub cuisine: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientDoc>,
    pub created_by: Option<OwnerRef>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientDoc {
    pub item: Option<String>,
    pub quantity: Option<Value>,
}

/// `createdBy` arrives either as a bare id or as a populated user document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OwnerRef {
    Id(String),
    Doc {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl OwnerRef {
    #[must_use]
    pub fn into_user_id(self) -> UserId {
        match self {
            OwnerRef::Id(id) | OwnerRef::Doc { id } => UserId::new(id.trim()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub added_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// Body of the delete and favorite endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeTarget<'a> {
    pub recipe_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewRecipeBody<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<&'a str>,
    pub ingredients: Vec<IngredientBody<'a>>,
}

#[derive(Debug, Serialize)]
pub struct IngredientBody<'a> {
    pub item: &'a str,
    pub quantity: &'a str,
}

impl<'a> From<&'a NewRecipe> for NewRecipeBody<'a> {
    fn from(recipe: &'a NewRecipe) -> Self {
        Self {
            title: &recipe.title,
            cuisine: recipe.cuisine.as_deref(),
            ingredients: recipe
                .ingredients
                .iter()
                .map(|i| IngredientBody {
                    item: &i.name,
                    quantity: &i.quantity,
                })
                .collect(),
        }
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn quantity_text(v: Option<Value>) -> String {
    match v {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Converts a recipe document, dropping it when it has no identifier.
#[must_use]
pub fn recipe_from_doc(doc: RecipeDoc) -> Option<Recipe> {
    let id = non_empty(doc.id)?;
    Some(Recipe {
        id: RecipeId::new(id),
        title: non_empty(doc.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        cuisine: non_empty(doc.cuisine).unwrap_or_else(|| DEFAULT_CUISINE.to_string()),
        ingredients: doc
            .ingredients
            .into_iter()
            .filter_map(|i| {
                let name = non_empty(i.item)?;
                Some(Ingredient {
                    name,
                    quantity: quantity_text(i.quantity),
                })
            })
            .collect(),
        owner: doc
            .created_by
            .map(OwnerRef::into_user_id)
            .filter(|u| !u.is_blank()),
        created_at: parse_timestamp(doc.created_at.as_deref()),
    })
}

#[must_use]
pub fn favorite_from_doc(doc: FavoriteDoc) -> Option<Favorite> {
    let id = non_empty(doc.id)?;
    Some(Favorite {
        recipe_id: RecipeId::new(id),
        title: non_empty(doc.title),
        added_at: parse_timestamp(doc.added_at.as_deref()),
    })
}

#[must_use]
pub fn user_from_doc(doc: UserDoc) -> Option<User> {
    let id = non_empty(doc.id)?;
    let username = non_empty(doc.username).unwrap_or_default();
    Some(User {
        id: UserId::new(id),
        name: non_empty(doc.name).unwrap_or_else(|| username.clone()),
        username,
    })
}

/// Decodes a recipe list body. A body that is valid JSON but not an array is
/// treated as an empty collection; malformed entries are skipped.
pub fn decode_recipes(body: &str) -> Result<Vec<Recipe>, serde_json::Error> {
    Ok(decode_array::<RecipeDoc>(body)?
        .into_iter()
        .filter_map(recipe_from_doc)
        .collect())
}

pub fn decode_favorites(body: &str) -> Result<Vec<Favorite>, serde_json::Error> {
    Ok(decode_array::<FavoriteDoc>(body)?
        .into_iter()
        .filter_map(favorite_from_doc)
        .collect())
}

pub fn decode_recipe(body: &str) -> Result<Option<Recipe>, serde_json::Error> {
    let doc: RecipeDoc = serde_json::from_str(body)?;
    Ok(recipe_from_doc(doc))
}

pub fn decode_user(body: &str) -> Result<Option<User>, serde_json::Error> {
    let doc: UserDoc = serde_json::from_str(body)?;
    Ok(user_from_doc(doc))
}

/// Extracts the service-supplied `message` from an error body, if any.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| non_empty(b.message))
}

fn decode_array<T: serde::de::DeserializeOwned>(body: &str) -> Result<Vec<T>, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
