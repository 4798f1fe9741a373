//! Recipe persistence against the hosted tables.
//!
//! A save writes the recipe row and then replaces both child collections
//! wholesale. Steps run in order and stop at the first failure; nothing is
//! rolled back, so a failed update can leave a recipe with new fields and
//! old or missing children.

mod form;

pub use form::{
    FormNumber, IngredientInput, InstructionInput, RecipeDraft, RecipeFields, RecipeForm,
};

use crate::error::{RecipeError, RemoteError};
use crate::remote::{Database, Embed, Filter, Select};
use crate::types::{Category, RecipeDetail, RecipeSummary, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{info_span, Instrument};
use uuid::Uuid;

pub const RECIPES: &str = "recipes";
pub const INGREDIENTS: &str = "ingredients";
pub const INSTRUCTIONS: &str = "instructions";
pub const CATEGORIES: &str = "categories";

#[derive(Serialize)]
struct NewRecipeRow<'a> {
    user_id: Uuid,
    #[serde(flatten)]
    fields: &'a RecipeFields,
}

#[derive(Debug, Serialize)]
struct IngredientRow<'a> {
    recipe_id: Uuid,
    name: &'a str,
    amount: Option<&'a str>,
    unit: Option<&'a str>,
    order_index: i32,
}

#[derive(Debug, Serialize)]
struct InstructionRow<'a> {
    recipe_id: Uuid,
    step_number: i32,
    description: &'a str,
    timer_minutes: Option<i32>,
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Rows for the non-blank ingredients, indexed by position after filtering.
fn ingredient_rows(recipe_id: Uuid, ingredients: &[IngredientInput]) -> Vec<IngredientRow<'_>> {
    ingredients
        .iter()
        .filter(|i| !i.name.trim().is_empty())
        .enumerate()
        .map(|(index, i)| IngredientRow {
            recipe_id,
            name: i.name.trim(),
            amount: blank_to_none(i.amount.as_deref()),
            unit: blank_to_none(i.unit.as_deref()),
            order_index: index as i32,
        })
        .collect()
}

/// Rows for the non-blank instructions, numbered from 1 after filtering.
fn instruction_rows(
    recipe_id: Uuid,
    instructions: &[InstructionInput],
) -> Vec<InstructionRow<'_>> {
    instructions
        .iter()
        .filter(|i| !i.description.trim().is_empty())
        .enumerate()
        .map(|(index, i)| InstructionRow {
            recipe_id,
            step_number: index as i32 + 1,
            description: i.description.trim(),
            timer_minutes: i.timer_minutes.filter(|t| *t > 0),
        })
        .collect()
}

fn to_rows<T: Serialize>(rows: &[T]) -> Result<Vec<Value>, RemoteError> {
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(RemoteError::from))
        .collect()
}

fn decode<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, RemoteError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| RemoteError::Decode(e.to_string())))
        .collect()
}

/// Run one remote step of a save, logging which step failed.
async fn step<T, F>(name: &'static str, recipe_id: Option<Uuid>, fut: F) -> Result<T, RecipeError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    fut.instrument(info_span!("recipe_step", step = name))
        .await
        .map_err(|e| {
            match recipe_id {
                Some(id) => tracing::error!("Recipe {} step {} failed: {}", id, name, e),
                None => tracing::error!("New recipe step {} failed: {}", name, e),
            }
            RecipeError::Remote(e)
        })
}

/// Create (`recipe_id` of `None`) or update a recipe and replace its children.
/// Returns the recipe id.
pub async fn save_recipe(
    db: &dyn Database,
    user: Option<&User>,
    recipe_id: Option<Uuid>,
    draft: &RecipeDraft,
) -> Result<Uuid, RecipeError> {
    let user = user.ok_or(RecipeError::Unauthenticated)?;
    draft.fields.validate()?;

    let recipe_id = match recipe_id {
        Some(id) => {
            // Ownership is enforced by row-level security, not by this filter.
            let patch = serde_json::to_value(&draft.fields).map_err(RemoteError::from)?;
            let updated = step(
                "update_recipe",
                Some(id),
                db.update(RECIPES, patch, &[Filter::eq("id", id)]),
            )
            .await?;
            if updated.is_empty() {
                tracing::warn!("Update of recipe {} matched no rows", id);
            }

            step(
                "delete_ingredients",
                Some(id),
                db.delete(INGREDIENTS, &[Filter::eq("recipe_id", id)]),
            )
            .await?;
            insert_ingredients(db, id, draft).await?;

            step(
                "delete_instructions",
                Some(id),
                db.delete(INSTRUCTIONS, &[Filter::eq("recipe_id", id)]),
            )
            .await?;
            insert_instructions(db, id, draft).await?;
            id
        }
        None => {
            let row = serde_json::to_value(NewRecipeRow {
                user_id: user.id,
                fields: &draft.fields,
            })
            .map_err(RemoteError::from)?;
            let inserted = step("insert_recipe", None, db.insert(RECIPES, vec![row])).await?;
            let id = inserted
                .first()
                .and_then(|row| row.get("id"))
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or_else(|| {
                    RemoteError::Decode("insert did not return a recipe id".to_string())
                })?;

            insert_ingredients(db, id, draft).await?;
            insert_instructions(db, id, draft).await?;
            tracing::info!("Created recipe {} for user {}", id, user.id);
            id
        }
    };

    Ok(recipe_id)
}

async fn insert_ingredients(
    db: &dyn Database,
    recipe_id: Uuid,
    draft: &RecipeDraft,
) -> Result<(), RecipeError> {
    let rows = ingredient_rows(recipe_id, &draft.ingredients);
    if rows.is_empty() {
        return Ok(());
    }
    let rows = to_rows(&rows)?;
    step("insert_ingredients", Some(recipe_id), db.insert(INGREDIENTS, rows)).await?;
    Ok(())
}

async fn insert_instructions(
    db: &dyn Database,
    recipe_id: Uuid,
    draft: &RecipeDraft,
) -> Result<(), RecipeError> {
    let rows = instruction_rows(recipe_id, &draft.instructions);
    if rows.is_empty() {
        return Ok(());
    }
    let rows = to_rows(&rows)?;
    step("insert_instructions", Some(recipe_id), db.insert(INSTRUCTIONS, rows)).await?;
    Ok(())
}

/// Delete a recipe; its children go with it through the schema's cascade.
pub async fn delete_recipe(db: &dyn Database, recipe_id: Uuid) -> Result<(), RecipeError> {
    let deleted = step(
        "delete_recipe",
        Some(recipe_id),
        db.delete(RECIPES, &[Filter::eq("id", recipe_id)]),
    )
    .await?;

    if deleted.is_empty() {
        return Err(RecipeError::NotFound);
    }
    Ok(())
}

/// A recipe with category and children, if visible to the caller.
pub async fn fetch_recipe(db: &dyn Database, recipe_id: Uuid) -> Result<RecipeDetail, RecipeError> {
    let query = Select::from(RECIPES)
        .embed(Embed::one(CATEGORIES, "category_id", &["id", "name", "color"]))
        .embed(Embed::many(
            INGREDIENTS,
            "recipe_id",
            &["id", "name", "amount", "unit", "order_index"],
        ))
        .embed(Embed::many(
            INSTRUCTIONS,
            "recipe_id",
            &["id", "step_number", "description", "timer_minutes"],
        ))
        .eq("id", recipe_id);

    let rows = db.select(&query).await?;
    let mut recipe = decode::<RecipeDetail>(rows)?
        .into_iter()
        .next()
        .ok_or(RecipeError::NotFound)?;
    recipe.sort_children();
    Ok(recipe)
}

/// The user's recipes, newest first.
pub async fn list_recipes(db: &dyn Database, user_id: Uuid) -> Result<Vec<RecipeSummary>, RecipeError> {
    let query = Select::from(RECIPES)
        .columns(&[
            "id",
            "title",
            "description",
            "prep_time",
            "cook_time",
            "servings",
            "difficulty",
            "image_url",
            "created_at",
        ])
        .embed(Embed::one(CATEGORIES, "category_id", &["name", "color"]))
        .eq("user_id", user_id)
        .order("created_at", false);

    Ok(decode(db.select(&query).await?)?)
}

pub async fn list_categories(db: &dyn Database) -> Result<Vec<Category>, RecipeError> {
    let query = Select::from(CATEGORIES)
        .columns(&["id", "name", "color"])
        .order("name", true);

    Ok(decode(db.select(&query).await?)?)
}
