use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

struct SeedRecipe {
    title: &'static str,
    description: Option<&'static str>,
    prep_time: i32,
    cook_time: i32,
    servings: i32,
    difficulty: i32,
    ingredients: &'static [(&'static str, &'static str, &'static str)], // (name, amount, unit)
    instructions: &'static [(&'static str, Option<i32>)],               // (step, timer minutes)
}

const SAMPLE_RECIPES: &[SeedRecipe] = &[
    SeedRecipe {
        title: "Classic Spaghetti Carbonara",
        description: Some(
            "A rich and creamy Italian pasta dish with eggs, cheese, and pancetta.",
        ),
        prep_time: 10,
        cook_time: 15,
        servings: 4,
        difficulty: 2,
        ingredients: &[
            ("spaghetti", "400", "g"),
            ("pancetta or guanciale", "200", "g"),
            ("eggs", "4", "large"),
            ("Pecorino Romano", "100", "g"),
            ("black pepper", "2", "tsp"),
            ("salt", "", ""),
        ],
        instructions: &[
            ("Boil the spaghetti in well-salted water until al dente.", Some(10)),
            ("While the pasta cooks, fry the pancetta until crispy.", None),
            ("Whisk together the eggs, grated Pecorino Romano, and black pepper.", None),
            (
                "Toss the hot pasta with the pancetta off the heat, then stir in the egg mixture.",
                None,
            ),
            ("Loosen with pasta water as needed and serve immediately.", None),
        ],
    },
    SeedRecipe {
        title: "Miso Soup",
        description: Some("A quick dashi-based soup with tofu and wakame."),
        prep_time: 5,
        cook_time: 10,
        servings: 2,
        difficulty: 1,
        ingredients: &[
            ("dashi", "500", "ml"),
            ("white miso", "3", "tbsp"),
            ("silken tofu", "150", "g"),
            ("dried wakame", "1", "tbsp"),
            ("scallion", "1", ""),
        ],
        instructions: &[
            ("Soak the wakame in water until softened.", Some(5)),
            ("Heat the dashi until just simmering.", None),
            (
                "Dissolve the miso in a ladle of dashi and stir it back into the pot.",
                None,
            ),
            (
                "Add the tofu and wakame, warm through without boiling, and top with scallion.",
                None,
            ),
        ],
    },
    SeedRecipe {
        title: "No-Knead Bread",
        description: None,
        prep_time: 15,
        cook_time: 45,
        servings: 8,
        difficulty: 3,
        ingredients: &[
            ("bread flour", "430", "g"),
            ("salt", "8", "g"),
            ("instant yeast", "1", "g"),
            ("water", "345", "g"),
        ],
        instructions: &[
            ("Mix into a shaggy dough, cover, and rest overnight at room temperature.", None),
            ("Shape into a ball and proof on a floured towel.", Some(120)),
            ("Bake in a preheated covered Dutch oven.", Some(30)),
            ("Uncover and bake until deeply browned.", Some(15)),
        ],
    },
];

#[derive(Debug, Deserialize)]
struct ListRecipesResponse {
    recipes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SaveRecipeResponse {
    id: String,
}

fn recipe_body(recipe: &SeedRecipe) -> Value {
    let ingredients: Vec<Value> = recipe
        .ingredients
        .iter()
        .map(|(name, amount, unit)| json!({ "name": name, "amount": amount, "unit": unit }))
        .collect();
    let instructions: Vec<Value> = recipe
        .instructions
        .iter()
        .map(|(description, timer)| json!({ "description": description, "timer_minutes": timer }))
        .collect();

    json!({
        "title": recipe.title,
        "description": recipe.description,
        "prep_time": recipe.prep_time,
        "cook_time": recipe.cook_time,
        "servings": recipe.servings,
        "difficulty": recipe.difficulty,
        "is_public": false,
        "ingredients": ingredients,
        "instructions": instructions,
    })
}

pub async fn seed(server: &str, token: &str) -> Result<()> {
    let base = server.trim_end_matches('/');
    let client = reqwest::Client::new();

    // If the user already has recipes, we're done
    let response = client
        .get(format!("{}/api/recipes", base))
        .bearer_auth(token)
        .send()
        .await
        .context("Failed to list recipes")?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Listing recipes failed with status {}: {}", status, body);
    }
    let existing: ListRecipesResponse = response
        .json()
        .await
        .context("Failed to parse recipe list")?;
    if !existing.recipes.is_empty() {
        println!(
            "User already has {} recipes, skipping seed",
            existing.recipes.len()
        );
        return Ok(());
    }

    println!("Creating {} sample recipes...", SAMPLE_RECIPES.len());

    for recipe in SAMPLE_RECIPES {
        let response = client
            .post(format!("{}/api/recipes", base))
            .bearer_auth(token)
            .json(&recipe_body(recipe))
            .send()
            .await
            .with_context(|| format!("Failed to create recipe: {}", recipe.title))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Creating {} failed with status {}: {}",
                recipe.title,
                status,
                body
            );
        }

        let created: SaveRecipeResponse = response
            .json()
            .await
            .context("Failed to parse create response")?;
        println!("  Created: {} ({})", recipe.title, created.id);
    }

    println!("Seed complete!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_recipes_are_valid_forms() {
        for recipe in SAMPLE_RECIPES {
            let body = recipe_body(recipe);
            assert!(!body["title"].as_str().unwrap().trim().is_empty());
            assert!((1..=5).contains(&body["difficulty"].as_i64().unwrap()));
            assert!(body["servings"].as_i64().unwrap() > 0);
            assert!(!body["instructions"].as_array().unwrap().is_empty());
        }
    }
}
