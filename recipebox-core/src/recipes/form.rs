//! Recipe edit form as submitted by a client, and its validated form.

use crate::error::RecipeError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A numeric form input: either a JSON number or the text of a form field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum FormNumber {
    Int(i64),
    Text(String),
}

impl FormNumber {
    /// `Ok(None)` for blank text, `Err(())` for text that is not an integer.
    fn parse(&self) -> Result<Option<i64>, ()> {
        match self {
            FormNumber::Int(n) => Ok(Some(*n)),
            FormNumber::Text(s) if s.trim().is_empty() => Ok(None),
            FormNumber::Text(s) => s.trim().parse().map(Some).map_err(|_| ()),
        }
    }
}

impl From<i64> for FormNumber {
    fn from(n: i64) -> Self {
        FormNumber::Int(n)
    }
}

impl From<&str> for FormNumber {
    fn from(s: &str) -> Self {
        FormNumber::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IngredientInput {
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl IngredientInput {
    pub fn new(name: &str, amount: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            amount: Some(amount.to_string()),
            unit: Some(unit.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InstructionInput {
    pub description: String,
    #[serde(default)]
    pub timer_minutes: Option<i32>,
}

impl InstructionInput {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            timer_minutes: None,
        }
    }
}

/// Body of a create or update request.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipeForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub prep_time: Option<FormNumber>,
    #[serde(default)]
    pub cook_time: Option<FormNumber>,
    #[serde(default)]
    pub servings: Option<FormNumber>,
    #[serde(default)]
    pub difficulty: Option<FormNumber>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
    #[serde(default)]
    pub instructions: Vec<InstructionInput>,
}

/// Scalar columns of a recipe row. Absent values serialize as `null` so an
/// update clears them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeFields {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: i32,
    pub difficulty: i32,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub is_public: bool,
}

impl RecipeFields {
    pub fn new(title: &str, servings: i32, difficulty: i32) -> Self {
        Self {
            title: title.to_string(),
            description: None,
            category_id: None,
            prep_time: None,
            cook_time: None,
            servings,
            difficulty,
            image_url: None,
            notes: None,
            is_public: false,
        }
    }

    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.title.trim().is_empty() {
            return Err(RecipeError::validation("Title is required"));
        }
        if self.servings < 1 {
            return Err(RecipeError::validation(
                "Servings must be a positive integer",
            ));
        }
        if !(1..=5).contains(&self.difficulty) {
            return Err(RecipeError::validation(
                "Difficulty must be an integer between 1 and 5",
            ));
        }
        if self.prep_time.is_some_and(|t| t < 0) || self.cook_time.is_some_and(|t| t < 0) {
            return Err(RecipeError::validation(
                "Times must be non-negative minutes",
            ));
        }
        Ok(())
    }
}

/// A validated edit: scalar fields plus the child collections as entered.
/// Blank children are dropped when the draft is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub fields: RecipeFields,
    pub ingredients: Vec<IngredientInput>,
    pub instructions: Vec<InstructionInput>,
}

impl RecipeDraft {
    pub fn new(fields: RecipeFields) -> Self {
        Self {
            fields,
            ingredients: Vec::new(),
            instructions: Vec::new(),
        }
    }
}

impl RecipeForm {
    pub fn validate(self) -> Result<RecipeDraft, RecipeError> {
        let category_id = match non_blank(self.category_id) {
            Some(id) => Some(
                Uuid::parse_str(&id).map_err(|_| RecipeError::validation("Invalid category id"))?,
            ),
            None => None,
        };

        let servings = integer(self.servings.as_ref(), "Servings must be a positive integer")?
            .ok_or_else(|| RecipeError::validation("Servings must be a positive integer"))?;
        let difficulty = integer(
            self.difficulty.as_ref(),
            "Difficulty must be an integer between 1 and 5",
        )?
        .ok_or_else(|| RecipeError::validation("Difficulty must be an integer between 1 and 5"))?;

        let fields = RecipeFields {
            title: self.title.trim().to_string(),
            description: non_blank(self.description),
            category_id,
            prep_time: integer(self.prep_time.as_ref(), "Prep time must be a whole number")?,
            cook_time: integer(self.cook_time.as_ref(), "Cook time must be a whole number")?,
            servings,
            difficulty,
            image_url: non_blank(self.image_url),
            notes: non_blank(self.notes),
            is_public: self.is_public,
        };
        fields.validate()?;

        let instructions = self
            .instructions
            .into_iter()
            .map(|step| match step.timer_minutes {
                Some(t) if t < 0 => Err(RecipeError::validation(
                    "Timer minutes must be non-negative",
                )),
                Some(0) => Ok(InstructionInput {
                    timer_minutes: None,
                    ..step
                }),
                _ => Ok(step),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecipeDraft {
            fields,
            ingredients: self.ingredients,
            instructions,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn integer(value: Option<&FormNumber>, message: &str) -> Result<Option<i32>, RecipeError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.parse() {
        Ok(None) => Ok(None),
        Ok(Some(n)) => i32::try_from(n)
            .map(Some)
            .map_err(|_| RecipeError::validation(message)),
        Err(()) => Err(RecipeError::validation(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: serde_json::Value) -> RecipeForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_form_accepts_text_and_numbers() {
        let draft = form(json!({
            "title": "  Miso soup ",
            "description": "",
            "category_id": "",
            "prep_time": "10",
            "cook_time": 5,
            "servings": "4",
            "difficulty": 2,
            "image_url": "",
            "ingredients": [{"name": "miso", "amount": "2", "unit": "tbsp"}],
            "instructions": [{"description": "boil", "timer_minutes": 0}]
        }))
        .validate()
        .unwrap();

        assert_eq!(draft.fields.title, "Miso soup");
        assert_eq!(draft.fields.description, None);
        assert_eq!(draft.fields.category_id, None);
        assert_eq!(draft.fields.prep_time, Some(10));
        assert_eq!(draft.fields.cook_time, Some(5));
        assert_eq!(draft.fields.servings, 4);
        assert_eq!(draft.fields.difficulty, 2);
        assert_eq!(draft.fields.image_url, None);
        assert_eq!(draft.instructions[0].timer_minutes, None);
        assert_eq!(draft.ingredients.len(), 1);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let err = form(json!({"title": "   ", "servings": 2, "difficulty": 3}))
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn test_servings_must_be_positive() {
        for servings in [json!(0), json!("-1"), json!("four"), json!("")] {
            let err = form(json!({"title": "T", "servings": servings, "difficulty": 3}))
                .validate()
                .unwrap_err();
            assert!(matches!(err, RecipeError::Validation(_)));
        }
    }

    #[test]
    fn test_difficulty_range() {
        for difficulty in [0, 6] {
            assert!(form(json!({"title": "T", "servings": 1, "difficulty": difficulty}))
                .validate()
                .is_err());
        }
        assert!(form(json!({"title": "T", "servings": 1, "difficulty": "5"}))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_category_id_must_be_uuid() {
        let err = form(json!({
            "title": "T", "servings": 1, "difficulty": 1, "category_id": "dessert"
        }))
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid category id");
    }

    #[test]
    fn test_negative_timer_is_rejected() {
        let err = form(json!({
            "title": "T", "servings": 1, "difficulty": 1,
            "instructions": [{"description": "wait", "timer_minutes": -5}]
        }))
        .validate()
        .unwrap_err();
        assert!(matches!(err, RecipeError::Validation(_)));
    }

    #[test]
    fn test_fields_serialize_absent_values_as_null() {
        let json = serde_json::to_value(RecipeFields::new("T", 4, 3)).unwrap();
        assert!(json["description"].is_null());
        assert!(json["prep_time"].is_null());
        assert_eq!(json["servings"], 4);
    }
}
