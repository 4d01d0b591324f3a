/// Menu data: the request sent to `/generate_menu` and the typed reply.
///
/// The reply is validated here, at the network boundary: anything that does not
/// fit the shape below becomes a `SchemaError` instead of leaking half-filled
/// values into the renderer.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use thiserror::Error;

// ── Request ───────────────────────────────────────────────────────────────────

/// Body of `POST /generate_menu`. Absent optionals serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuRequest {
    pub ingredients: Vec<String>,
    pub budget: Option<u64>,
    pub preference: Option<String>,
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// Plan keys the backend's prompt asks for, with their display titles.
const KNOWN_PLANS: &[(&str, &str)] = &[
    ("plan_without_budget", "Using only what you have"),
    ("plan_with_budget", "With your extra budget"),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dish {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub calories: f64,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
}

/// Fixed nutrient breakdown. The backend historically answered with Japanese
/// keys, so those are accepted alongside the English ones. When a nutrient
/// arrives under two names the first non-null one wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Nutrition {
    pub protein: Option<Amount>,
    pub fat: Option<Amount>,
    pub carbohydrate: Option<Amount>,
}

impl<'de> Deserialize<'de> for Nutrition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Map keeps document order (serde_json `preserve_order`)
        let raw = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        let mut n = Nutrition::default();
        for (key, value) in raw {
            let slot = match key.as_str() {
                "protein" | "たんぱく質" => &mut n.protein,
                "fat" | "脂質" => &mut n.fat,
                "carbohydrate" | "carbs" | "炭水化物" => &mut n.carbohydrate,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Option::<Amount>::deserialize(value).map_err(de::Error::custom)?;
            }
        }
        Ok(n)
    }
}

/// A nutrient amount: either free text ("12g") or a bare number of grams.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Grams(f64),
    Text(String),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Grams(g) => write!(f, "{g}g"),
            Amount::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dishes: Vec<Dish>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_calories: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default)]
    pub shopping_list: Option<Vec<String>>,
}

impl Plan {
    /// Items of the shopping list, or `None` when there is nothing to show.
    pub fn shopping_items(&self) -> Option<&[String]> {
        self.shopping_list
            .as_deref()
            .filter(|items| !items.is_empty())
    }
}

/// One named slot of the menu. `plan` is `None` when the backend sent `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSlot {
    pub key: String,
    pub title: String,
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub title: Option<String>,
    pub slots: Vec<PlanSlot>,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("expected a JSON object at the top level")]
    NotAnObject,
    #[error("no meal plans in the response")]
    NoPlans,
    #[error("plan `{key}`: {source}")]
    Plan {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Menu {
    /// Validate a decoded response body.
    ///
    /// Slot order: the known plan keys first, then any other object carrying a
    /// `dishes` field in document order. A body that is itself a plan becomes a
    /// single slot titled "Menu".
    pub fn from_value(body: &Value) -> Result<Self, SchemaError> {
        let Value::Object(map) = body else {
            return Err(SchemaError::NotAnObject);
        };

        let title = map
            .get("menu_title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        if map.contains_key("dishes") {
            let plan = parse_plan("menu", body)?;
            return Ok(Self {
                title,
                slots: vec![PlanSlot {
                    key: "menu".to_string(),
                    title: "Menu".to_string(),
                    plan: Some(plan),
                }],
            });
        }

        let mut slots = Vec::new();
        for (key, slot_title) in KNOWN_PLANS {
            if let Some(value) = map.get(*key) {
                slots.push(PlanSlot {
                    key: key.to_string(),
                    title: slot_title.to_string(),
                    plan: parse_optional_plan(key, value)?,
                });
            }
        }
        for (key, value) in map {
            if KNOWN_PLANS.iter().any(|(k, _)| k == key) {
                continue;
            }
            if value.get("dishes").is_some() {
                slots.push(PlanSlot {
                    key: key.clone(),
                    title: title_from_key(key),
                    plan: Some(parse_plan(key, value)?),
                });
            }
        }

        if slots.iter().all(|s| s.plan.is_none()) {
            return Err(SchemaError::NoPlans);
        }
        Ok(Self { title, slots })
    }

    /// Present plans with their titles, in display order.
    pub fn plans(&self) -> impl Iterator<Item = (&str, &Plan)> {
        self.slots
            .iter()
            .filter_map(|s| s.plan.as_ref().map(|p| (s.title.as_str(), p)))
    }
}

fn parse_optional_plan(key: &str, value: &Value) -> Result<Option<Plan>, SchemaError> {
    if value.is_null() {
        return Ok(None);
    }
    parse_plan(key, value).map(Some)
}

fn parse_plan(key: &str, value: &Value) -> Result<Plan, SchemaError> {
    Plan::deserialize(value).map_err(|source| SchemaError::Plan {
        key: key.to_string(),
        source,
    })
}

/// "budget_friendly_plan" → "Budget friendly plan"
fn title_from_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
