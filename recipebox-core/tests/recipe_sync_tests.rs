//! Recipe save/read/delete flows against the in-memory backend.

use recipebox_core::recipes::{
    IngredientInput, InstructionInput, RecipeDraft, RecipeFields, INGREDIENTS, INSTRUCTIONS,
    RECIPES,
};
use recipebox_core::{
    delete_recipe, fetch_recipe, list_categories, list_recipes, save_recipe, FakeBackend, FakeOp,
    RecipeError, User,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn signed_in(backend: &FakeBackend) -> User {
    backend.sign_in_user("cook@example.com").0
}

fn draft(title: &str) -> RecipeDraft {
    let mut draft = RecipeDraft::new(RecipeFields::new(title, 2, 2));
    draft.ingredients = vec![
        IngredientInput::new("salt", "1", "tsp"),
        IngredientInput::new("", "", ""),
        IngredientInput::new("egg", "2", ""),
    ];
    draft.instructions = vec![
        InstructionInput::new("mix"),
        InstructionInput::new("  "),
        InstructionInput::new("bake"),
    ];
    draft
}

fn rows_for(backend: &FakeBackend, table: &str, recipe_id: Uuid) -> Vec<Value> {
    backend
        .rows(table)
        .into_iter()
        .filter(|row| row["recipe_id"] == recipe_id.to_string())
        .collect()
}

#[tokio::test]
async fn test_create_filters_blank_children_and_indexes_by_position() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);

    let id = save_recipe(&backend, Some(&user), None, &draft("Omelette"))
        .await
        .unwrap();

    let ingredients: Vec<(String, i64)> = rows_for(&backend, INGREDIENTS, id)
        .iter()
        .map(|r| {
            (
                r["name"].as_str().unwrap().to_string(),
                r["order_index"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        ingredients,
        vec![("salt".to_string(), 0), ("egg".to_string(), 1)]
    );

    let steps: Vec<(i64, String)> = rows_for(&backend, INSTRUCTIONS, id)
        .iter()
        .map(|r| {
            (
                r["step_number"].as_i64().unwrap(),
                r["description"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(steps, vec![(1, "mix".to_string()), (2, "bake".to_string())]);

    let recipes = backend.rows(RECIPES);
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["user_id"], user.id.to_string());
}

#[tokio::test]
async fn test_empty_amount_and_unit_are_stored_as_null() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);

    let id = save_recipe(&backend, Some(&user), None, &draft("Omelette"))
        .await
        .unwrap();
    let egg = rows_for(&backend, INGREDIENTS, id)
        .into_iter()
        .find(|r| r["name"] == "egg")
        .unwrap();
    assert_eq!(egg["amount"], "2");
    assert!(egg["unit"].is_null());
}

#[tokio::test]
async fn test_create_without_children_skips_inserts() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);

    let draft = RecipeDraft::new(RecipeFields::new("Water", 1, 1));
    save_recipe(&backend, Some(&user), None, &draft)
        .await
        .unwrap();

    assert_eq!(backend.calls(), vec!["insert recipes"]);
}

#[tokio::test]
async fn test_save_requires_a_user() {
    let backend = FakeBackend::with_recipe_schema();
    let err = save_recipe(&backend, None, None, &draft("Omelette"))
        .await
        .unwrap_err();
    assert!(matches!(err, RecipeError::Unauthenticated));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_fields_are_rejected_before_any_write() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);

    for fields in [
        RecipeFields::new("  ", 2, 3),
        RecipeFields::new("Soup", 0, 3),
        RecipeFields::new("Soup", 2, 6),
    ] {
        let err = save_recipe(&backend, Some(&user), None, &RecipeDraft::new(fields))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::Validation(_)));
    }
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_update_replaces_children_in_order() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);
    let id = save_recipe(&backend, Some(&user), None, &draft("Omelette"))
        .await
        .unwrap();
    backend.clear_calls();

    let mut edited = RecipeDraft::new(RecipeFields::new("T", 4, 3));
    edited.ingredients = vec![IngredientInput::new("flour", "200", "g")];
    edited.instructions = vec![InstructionInput::new("knead")];
    let saved = save_recipe(&backend, Some(&user), Some(id), &edited)
        .await
        .unwrap();
    assert_eq!(saved, id);

    assert_eq!(
        backend.calls(),
        vec![
            "update recipes",
            "delete ingredients",
            "insert ingredients",
            "delete instructions",
            "insert instructions",
        ]
    );

    let ingredients = rows_for(&backend, INGREDIENTS, id);
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["name"], "flour");
    assert_eq!(ingredients[0]["order_index"], 0);
    let instructions = rows_for(&backend, INSTRUCTIONS, id);
    assert_eq!(instructions.len(), 1);
    assert_eq!(instructions[0]["step_number"], 1);
}

#[tokio::test]
async fn test_update_then_read_returns_saved_fields() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);
    let id = save_recipe(&backend, Some(&user), None, &draft("Omelette"))
        .await
        .unwrap();

    let mut fields = RecipeFields::new("T", 4, 3);
    fields.prep_time = Some(5);
    fields.cook_time = Some(20);
    save_recipe(&backend, Some(&user), Some(id), &RecipeDraft::new(fields))
        .await
        .unwrap();

    let recipe = fetch_recipe(&backend, id).await.unwrap();
    assert_eq!(recipe.title, "T");
    assert_eq!(recipe.servings, 4);
    assert_eq!(recipe.difficulty, 3);
    assert_eq!(recipe.total_time(), 25);
    assert!(recipe.ingredients.is_empty());
    assert!(recipe.instructions.is_empty());
}

#[tokio::test]
async fn test_failed_step_stops_the_update_without_rollback() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);
    let id = save_recipe(&backend, Some(&user), None, &draft("Omelette"))
        .await
        .unwrap();
    backend.clear_calls();
    backend.fail_on(FakeOp::Insert, INGREDIENTS, "new row violates row-level security policy");

    let mut edited = draft("Frittata");
    edited.fields.servings = 6;
    let err = save_recipe(&backend, Some(&user), Some(id), &edited)
        .await
        .unwrap_err();
    assert!(matches!(err, RecipeError::Remote(_)));

    assert_eq!(
        backend.calls(),
        vec!["update recipes", "delete ingredients", "insert ingredients"]
    );
    // The recipe update and the ingredient delete stay committed.
    assert!(rows_for(&backend, INGREDIENTS, id).is_empty());
    assert_eq!(rows_for(&backend, INSTRUCTIONS, id).len(), 2);
    let recipe = fetch_recipe(&backend, id).await.unwrap();
    assert_eq!(recipe.title, "Frittata");
    assert_eq!(recipe.servings, 6);
}

#[tokio::test]
async fn test_update_of_missing_recipe_fails_at_child_insert() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);
    let missing = Uuid::new_v4();

    let err = save_recipe(&backend, Some(&user), Some(missing), &draft("Ghost"))
        .await
        .unwrap_err();
    match err {
        RecipeError::Remote(remote) => assert_eq!(remote.code(), Some("23503")),
        other => panic!("expected a remote error, got {:?}", other),
    }

    assert_eq!(
        backend.calls(),
        vec!["update recipes", "delete ingredients", "insert ingredients"]
    );
    assert!(backend.rows(RECIPES).is_empty());
    assert!(backend.rows(INGREDIENTS).is_empty());
    assert!(backend.rows(INSTRUCTIONS).is_empty());
}

#[tokio::test]
async fn test_delete_then_read_is_not_found() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);
    let id = save_recipe(&backend, Some(&user), None, &draft("Omelette"))
        .await
        .unwrap();

    delete_recipe(&backend, id).await.unwrap();

    assert!(matches!(
        fetch_recipe(&backend, id).await,
        Err(RecipeError::NotFound)
    ));
    assert!(rows_for(&backend, INGREDIENTS, id).is_empty());
    assert!(rows_for(&backend, INSTRUCTIONS, id).is_empty());
    assert!(matches!(
        delete_recipe(&backend, id).await,
        Err(RecipeError::NotFound)
    ));
}

#[tokio::test]
async fn test_fetch_embeds_category_and_sorted_children() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);
    let category_id = Uuid::new_v4();
    backend.seed(
        "categories",
        vec![json!({"id": category_id, "name": "Breakfast", "color": "#f59e0b"})],
    );

    let mut draft = draft("Omelette");
    draft.fields.category_id = Some(category_id);
    let id = save_recipe(&backend, Some(&user), None, &draft)
        .await
        .unwrap();

    let recipe = fetch_recipe(&backend, id).await.unwrap();
    let category = recipe.category.unwrap();
    assert_eq!(category.name, "Breakfast");
    assert_eq!(category.id, Some(category_id));
    let names: Vec<&str> = recipe.ingredients.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["salt", "egg"]);
    let steps: Vec<i32> = recipe.instructions.iter().map(|i| i.step_number).collect();
    assert_eq!(steps, vec![1, 2]);
}

#[tokio::test]
async fn test_list_recipes_is_scoped_and_newest_first() {
    let backend = FakeBackend::with_recipe_schema();
    let user = signed_in(&backend);
    let other = backend.sign_in_user("other@example.com").0;
    backend.seed(
        RECIPES,
        vec![
            json!({"id": Uuid::new_v4(), "user_id": user.id, "title": "Old", "servings": 1,
                   "difficulty": 1, "created_at": "2024-01-01T00:00:00Z"}),
            json!({"id": Uuid::new_v4(), "user_id": user.id, "title": "New", "servings": 1,
                   "difficulty": 1, "created_at": "2024-06-01T00:00:00Z"}),
            json!({"id": Uuid::new_v4(), "user_id": other.id, "title": "Theirs", "servings": 1,
                   "difficulty": 1, "created_at": "2024-03-01T00:00:00Z"}),
        ],
    );

    let titles: Vec<String> = list_recipes(&backend, user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["New", "Old"]);
}

#[tokio::test]
async fn test_list_categories_by_name() {
    let backend = FakeBackend::with_recipe_schema();
    backend.seed(
        "categories",
        vec![
            json!({"id": Uuid::new_v4(), "name": "Soup", "color": "blue"}),
            json!({"id": Uuid::new_v4(), "name": "Bread", "color": "brown"}),
        ],
    );

    let names: Vec<String> = list_categories(&backend)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Bread", "Soup"]);
}
