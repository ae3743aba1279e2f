use serde::{Deserialize, Deserializer, Serialize};

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// One page of a paginated listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

// Users

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Registration response; carries no viewer-dependent fields.
#[derive(Debug, Serialize)]
pub struct UserCreatedDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub recipes: Vec<RecipeMinifiedDto>,
    pub recipes_count: u64,
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub auth_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetPasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// Catalogs

#[derive(Debug, Clone, Serialize)]
pub struct TagDto {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

// Recipes

/// Ingredient line as served inside a recipe; `id` is the ingredient id.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientAmountDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub tags: Vec<TagDto>,
    pub author: UserDto,
    pub ingredients: Vec<IngredientAmountDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Short recipe form used by favorite/cart responses and subscription feeds.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeMinifiedDto {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Deserialize)]
pub struct RecipeIngredientRequest {
    #[serde(deserialize_with = "lenient_i32")]
    pub id: i32,
    #[serde(deserialize_with = "lenient_i32")]
    pub amount: i32,
}

/// Create and update payload. Every field is optional at the serde level so
/// that missing fields surface as field-scoped validation errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecipeWriteRequest {
    pub ingredients: Option<Vec<RecipeIngredientRequest>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient_opt_i32")]
    pub cooking_time: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

fn to_i32<E: serde::de::Error>(value: IntOrString) -> Result<i32, E> {
    match value {
        IntOrString::Int(n) => i32::try_from(n).map_err(|_| E::custom("number out of range")),
        IntOrString::Str(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| E::custom(format!("expected an integer, got '{s}'"))),
    }
}

/// Accepts `5` as well as `"5"`.
fn lenient_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    to_i32(IntOrString::deserialize(deserializer)?)
}

fn lenient_opt_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Option::<IntOrString>::deserialize(deserializer)?
        .map(to_i32)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_request_accepts_string_numbers() {
        let req: RecipeWriteRequest = serde_json::from_str(
            r#"{"ingredients":[{"id":"3","amount":"10"}],"tags":[1],"cooking_time":"15"}"#,
        )
        .unwrap();

        let ingredients = req.ingredients.unwrap();
        assert_eq!(ingredients[0].id, 3);
        assert_eq!(ingredients[0].amount, 10);
        assert_eq!(req.cooking_time, Some(15));
        assert!(req.name.is_none());
    }

    #[test]
    fn test_recipe_request_rejects_garbage_amount() {
        let res: Result<RecipeWriteRequest, _> =
            serde_json::from_str(r#"{"ingredients":[{"id":1,"amount":"lots"}]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_subscription_flattens_user() {
        let dto = SubscriptionDto {
            user: UserDto {
                id: 1,
                email: "a@b.c".into(),
                username: "a".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                is_subscribed: true,
            },
            recipes: vec![],
            recipes_count: 0,
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["username"], "a");
        assert_eq!(json["recipes_count"], 0);
    }
}
