pub mod config;
pub mod error;
pub mod health;
pub mod recipes;
pub mod remote;
pub mod types;

pub use config::{AppConfig, EnvironmentCheck, SupabaseSettings};
pub use error::{RecipeError, RemoteError};
pub use health::{check_health, CheckStatus, HealthReport, OverallStatus, ServiceCheck};
pub use recipes::{
    delete_recipe, fetch_recipe, list_categories, list_recipes, save_recipe, RecipeDraft,
    RecipeFields, RecipeForm,
};
pub use remote::{
    AuthApi, AuthEvent, Backend, BackendState, Database, FakeBackend, FakeOp, SessionEvents,
    SupabaseClient,
};
pub use types::{
    Category, CategoryRef, Ingredient, Instruction, RecipeDetail, RecipeSummary, Session, User,
};
