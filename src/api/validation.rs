use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::ApiError;
use super::types::{RecipeIngredientRequest, RecipeWriteRequest, RegisterRequest};
use crate::models::recipe::IngredientAmountInput;
use crate::models::user::NewUser;
use crate::services::{CreateRecipe, UpdateRecipe};

pub const MAX_NAME_LENGTH: usize = 150;
pub const MAX_RECIPE_NAME_LENGTH: usize = 200;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const COOKING_TIME_RANGE: std::ops::RangeInclusive<i32> = 1..=900;
pub const AMOUNT_RANGE: std::ops::RangeInclusive<i32> = 1..=2500;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").is_match(value)
}

#[must_use]
pub fn is_slug(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    value.len() <= 50 && get_regex(&RE, r"^[-a-zA-Z0-9_]+$").is_match(value)
}

fn is_username(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[\w.@+-]+$").is_match(value)
}

fn is_email(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_match(value)
}

/// Present, non-blank after trimming, and at most `max` characters.
pub fn required_text(field: &str, value: Option<String>, max: usize) -> Result<String, ApiError> {
    let value = value
        .map(|v| v.trim().to_string())
        .ok_or_else(|| ApiError::field(field, "This field is required"))?;

    if value.is_empty() {
        return Err(ApiError::field(field, "This field may not be blank"));
    }
    if value.chars().count() > max {
        return Err(ApiError::field(
            field,
            format!("Ensure this field has no more than {max} characters"),
        ));
    }
    Ok(value)
}

pub fn validate_email(email: Option<String>) -> Result<String, ApiError> {
    let email = required_text("email", email, MAX_EMAIL_LENGTH)?;
    if !is_email(&email) {
        return Err(ApiError::field("email", "Enter a valid email address"));
    }
    Ok(email)
}

pub fn validate_username(username: Option<String>) -> Result<String, ApiError> {
    let username = required_text("username", username, MAX_NAME_LENGTH)?;
    if !is_username(&username) {
        return Err(ApiError::field(
            "username",
            "Username may contain only letters, digits and @/./+/-/_",
        ));
    }
    if username.eq_ignore_ascii_case("me") {
        return Err(ApiError::field("username", "Username 'me' is reserved"));
    }
    Ok(username)
}

pub fn validate_password(field: &str, password: Option<String>) -> Result<String, ApiError> {
    let password = password.ok_or_else(|| ApiError::field(field, "This field is required"))?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::field(
            field,
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(password)
}

pub fn validate_registration(req: RegisterRequest) -> Result<NewUser, ApiError> {
    Ok(NewUser {
        email: validate_email(req.email)?,
        username: validate_username(req.username)?,
        first_name: required_text("first_name", req.first_name, MAX_NAME_LENGTH)?,
        last_name: required_text("last_name", req.last_name, MAX_NAME_LENGTH)?,
        password: validate_password("password", req.password)?,
    })
}

pub fn validate_cooking_time(value: i32) -> Result<i32, ApiError> {
    if !COOKING_TIME_RANGE.contains(&value) {
        return Err(ApiError::field(
            "cooking_time",
            format!(
                "Cooking time must be between {} and {} minutes",
                COOKING_TIME_RANGE.start(),
                COOKING_TIME_RANGE.end()
            ),
        ));
    }
    Ok(value)
}

/// Tag set must be present, non-empty and free of duplicates.
pub fn validate_tag_ids(tags: Option<Vec<i32>>) -> Result<Vec<i32>, ApiError> {
    let tags = tags.ok_or_else(|| ApiError::field("tags", "This field is required"))?;
    if tags.is_empty() {
        return Err(ApiError::field("tags", "Select at least one tag"));
    }

    let mut seen = HashSet::with_capacity(tags.len());
    if !tags.iter().all(|id| seen.insert(*id)) {
        return Err(ApiError::field("tags", "Tags must not repeat"));
    }
    Ok(tags)
}

/// Ingredient lines must be present, non-empty, with unique ingredient ids
/// and amounts in range.
pub fn validate_ingredients(
    ingredients: Option<Vec<RecipeIngredientRequest>>,
) -> Result<Vec<IngredientAmountInput>, ApiError> {
    let ingredients =
        ingredients.ok_or_else(|| ApiError::field("ingredients", "This field is required"))?;
    if ingredients.is_empty() {
        return Err(ApiError::field(
            "ingredients",
            "Select at least one ingredient",
        ));
    }

    let mut seen = HashSet::with_capacity(ingredients.len());
    let mut lines = Vec::with_capacity(ingredients.len());
    for item in ingredients {
        if !seen.insert(item.id) {
            return Err(ApiError::field("ingredients", "Ingredients must not repeat"));
        }
        if !AMOUNT_RANGE.contains(&item.amount) {
            return Err(ApiError::field(
                "ingredients",
                format!(
                    "Amount must be between {} and {}",
                    AMOUNT_RANGE.start(),
                    AMOUNT_RANGE.end()
                ),
            ));
        }
        lines.push(IngredientAmountInput {
            ingredient_id: item.id,
            amount: item.amount,
        });
    }
    Ok(lines)
}

fn required_image(image: Option<String>) -> Result<String, ApiError> {
    match image {
        Some(image) if !image.trim().is_empty() => Ok(image),
        Some(_) => Err(ApiError::field("image", "This field may not be blank")),
        None => Err(ApiError::field("image", "This field is required")),
    }
}

pub fn validate_recipe_create(req: RecipeWriteRequest) -> Result<CreateRecipe, ApiError> {
    let ingredients = validate_ingredients(req.ingredients)?;
    let tag_ids = validate_tag_ids(req.tags)?;
    let image = required_image(req.image)?;
    let name = required_text("name", req.name, MAX_RECIPE_NAME_LENGTH)?;
    let text = required_text("text", req.text, usize::MAX)?;
    let cooking_time = req
        .cooking_time
        .ok_or_else(|| ApiError::field("cooking_time", "This field is required"))
        .and_then(validate_cooking_time)?;

    Ok(CreateRecipe {
        name,
        text,
        image,
        cooking_time,
        tag_ids,
        ingredients,
    })
}

/// Scalars are optional on update; tags and ingredients are not.
pub fn validate_recipe_update(req: RecipeWriteRequest) -> Result<UpdateRecipe, ApiError> {
    let ingredients = validate_ingredients(req.ingredients)?;
    let tag_ids = validate_tag_ids(req.tags)?;
    let image = req.image.map(|i| required_image(Some(i))).transpose()?;
    let name = req
        .name
        .map(|n| required_text("name", Some(n), MAX_RECIPE_NAME_LENGTH))
        .transpose()?;
    let text = req
        .text
        .map(|t| required_text("text", Some(t), usize::MAX))
        .transpose()?;
    let cooking_time = req.cooking_time.map(validate_cooking_time).transpose()?;

    Ok(UpdateRecipe {
        name,
        text,
        image,
        cooking_time,
        tag_ids,
        ingredients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ApiError) -> Option<String> {
        match err {
            ApiError::ValidationError { field, .. } => field,
            _ => None,
        }
    }

    fn line(id: i32, amount: i32) -> RecipeIngredientRequest {
        RecipeIngredientRequest { id, amount }
    }

    fn recipe_request() -> RecipeWriteRequest {
        RecipeWriteRequest {
            ingredients: Some(vec![line(1, 10), line(2, 5)]),
            tags: Some(vec![1, 2]),
            image: Some("data:image/png;base64,AAAA".to_string()),
            name: Some("Borscht".to_string()),
            text: Some("Boil it".to_string()),
            cooking_time: Some(60),
        }
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#E26C2D"));
        assert!(is_hex_color("#fff"));
        assert!(!is_hex_color("E26C2D"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn test_is_slug() {
        assert!(is_slug("breakfast"));
        assert!(is_slug("late_dinner-2"));
        assert!(!is_slug("late dinner"));
        assert!(!is_slug(""));
        assert!(!is_slug(&"a".repeat(51)));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username(Some("chef.anna+1@home".into())).is_ok());
        assert!(validate_username(Some("bad name".into())).is_err());
        assert!(validate_username(Some("me".into())).is_err());
        assert!(validate_username(None).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password", Some("longenough".into())).is_ok());
        assert!(validate_password("password", Some("short".into())).is_err());
    }

    #[test]
    fn test_tags_must_be_unique_and_present() {
        assert!(validate_tag_ids(Some(vec![1, 2])).is_ok());
        assert_eq!(
            field_of(validate_tag_ids(Some(vec![1, 1])).unwrap_err()),
            Some("tags".to_string())
        );
        assert!(validate_tag_ids(Some(vec![])).is_err());
        assert!(validate_tag_ids(None).is_err());
    }

    #[test]
    fn test_ingredients_must_be_unique_and_in_range() {
        assert_eq!(validate_ingredients(Some(vec![line(1, 1)])).unwrap().len(), 1);
        assert_eq!(
            field_of(validate_ingredients(Some(vec![line(1, 1), line(1, 2)])).unwrap_err()),
            Some("ingredients".to_string())
        );
        assert!(validate_ingredients(Some(vec![line(1, 0)])).is_err());
        assert!(validate_ingredients(Some(vec![line(1, 2501)])).is_err());
        assert!(validate_ingredients(Some(vec![])).is_err());
    }

    #[test]
    fn test_validate_recipe_create() {
        let recipe = validate_recipe_create(recipe_request()).unwrap();
        assert_eq!(recipe.tag_ids, vec![1, 2]);
        assert_eq!(recipe.ingredients[1].amount, 5);

        let mut missing_image = recipe_request();
        missing_image.image = None;
        assert_eq!(
            field_of(validate_recipe_create(missing_image).unwrap_err()),
            Some("image".to_string())
        );

        let mut too_slow = recipe_request();
        too_slow.cooking_time = Some(901);
        assert!(validate_recipe_create(too_slow).is_err());
    }

    #[test]
    fn test_validate_recipe_update_keeps_optional_scalars() {
        let mut req = recipe_request();
        req.name = None;
        req.image = None;
        let update = validate_recipe_update(req).unwrap();
        assert!(update.name.is_none());
        assert!(update.image.is_none());

        let mut no_tags = recipe_request();
        no_tags.tags = None;
        assert!(validate_recipe_update(no_tags).is_err());
    }
}
