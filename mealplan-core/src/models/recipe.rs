use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeSet;
use std::fmt;

use super::ingredient::Ingredient;
use super::season::Season;

/// A recipe as stored in the catalog and copied into plan slots.
///
/// `name` is the matching key used by reconciliation; it is compared
/// exactly, with no case folding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_number"
    )]
    pub recipe_number: Option<Number>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<Ingredient>,
    #[serde(
        default,
        rename = "recipe_link",
        skip_serializing_if = "Option::is_none"
    )]
    pub link: Option<String>,
    #[serde(default)]
    pub season: Season,
}

impl RecipeRecord {
    pub fn new(name: impl Into<String>, season: Season) -> Self {
        Self {
            recipe_number: None,
            name: name.into(),
            section: None,
            tags: BTreeSet::new(),
            ingredients: Vec::new(),
            link: None,
            season,
        }
    }

    pub fn with_number(mut self, number: i64) -> Self {
        self.recipe_number = Some(Number::from(number));
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// True if any of `tags` is present on this recipe.
    pub fn shares_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }
}

/// Recipe numbers were typed into a free-form field, so files contain
/// numbers, numeric strings and empty strings. Numbers are kept exactly as
/// stored, fractions included.
fn lenient_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Number>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => Some(n),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .map(Number::from)
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    })
}

/// Hand-edited files write `null` for an empty list.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl fmt::Display for RecipeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.recipe_number {
            Some(number) => writeln!(f, "{} (#{})", self.name, number)?,
            None => writeln!(f, "{}", self.name)?,
        }
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Season: {}", self.season)?;

        if let Some(section) = &self.section {
            writeln!(f, "Section: {}", section)?;
        }

        if !self.tags.is_empty() {
            let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
            writeln!(f, "Tags: {}", tags.join(", "))?;
        }

        if let Some(link) = &self.link {
            writeln!(f, "Link: {}", link)?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        Ok(())
    }
}
