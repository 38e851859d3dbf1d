use std::cmp::Ordering;

use crate::models::{Recipe, User};

/// Orders two recipes by ownership alone: owned before not-owned, equal otherwise.
#[must_use]
pub fn ownership_order(a: &Recipe, b: &Recipe, user: &User) -> Ordering {
    match (a.is_owned_by(user), b.is_owned_by(user)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Display ordering: the user's recipes first, each group in fetch order.
///
/// `sort_by` is stable, so same-category runs keep their relative order.
/// Without an identified user the input order is returned unchanged.
#[must_use]
pub fn ordered_recipes(recipes: &[Recipe], user: Option<&User>) -> Vec<Recipe> {
    let mut ordered = recipes.to_vec();
    if let Some(user) = user.filter(|u| !u.id.is_blank()) {
        ordered.sort_by(|a, b| ownership_order(a, b, user));
    }
    ordered
}
