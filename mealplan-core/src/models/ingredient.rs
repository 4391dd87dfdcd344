use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One line of a recipe's ingredient list.
///
/// Older catalogs store ingredients as bare strings; those load with the
/// whole string as the name and no quantity. Numeric quantities load as
/// their decimal text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
        }
    }

    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredIngredient {
    Plain(String),
    Full {
        name: String,
        #[serde(default)]
        quantity: Option<Value>,
    },
}

fn quantity_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Ingredient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredIngredient::deserialize(deserializer)? {
            StoredIngredient::Plain(name) => Ingredient::new(name),
            StoredIngredient::Full { name, quantity } => Ingredient {
                name,
                quantity: quantity.and_then(quantity_text),
            },
        })
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quantity {
            Some(quantity) => write!(f, "{} {}", quantity, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
