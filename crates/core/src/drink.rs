//! The drinks menu.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::Usdc;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkType {
    Beer,
    Wine,
    Cocktail,
    Spirit,
    Shot,
    Mocktail,
}

impl DrinkType {
    pub const fn as_str(self) -> &'static str {
        match self {
            DrinkType::Beer => "beer",
            DrinkType::Wine => "wine",
            DrinkType::Cocktail => "cocktail",
            DrinkType::Spirit => "spirit",
            DrinkType::Shot => "shot",
            DrinkType::Mocktail => "mocktail",
        }
    }
}

impl fmt::Display for DrinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrinkType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beer" => Ok(DrinkType::Beer),
            "wine" => Ok(DrinkType::Wine),
            "cocktail" => Ok(DrinkType::Cocktail),
            "spirit" => Ok(DrinkType::Spirit),
            "shot" => Ok(DrinkType::Shot),
            "mocktail" => Ok(DrinkType::Mocktail),
            other => Err(CoreError::Validation(format!("unknown drink type '{other}'"))),
        }
    }
}

/// A menu item. Read-only as far as the ledger is concerned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drink {
    pub id: DbId,
    pub name: String,
    pub emoji: String,
    #[serde(rename = "type")]
    pub drink_type: DrinkType,
    #[serde(rename = "price_usdc")]
    pub price: Usdc,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

/// A menu entry before it has been given an id.
#[derive(Debug, Clone, Copy)]
pub struct MenuItem {
    pub name: &'static str,
    pub emoji: &'static str,
    pub drink_type: DrinkType,
    pub price: Usdc,
    pub description: &'static str,
}

/// The menu the bar opens with. Mirrors the seed rows in the database
/// migrations so the in-memory store serves the same drinks.
pub const HOUSE_MENU: &[MenuItem] = &[
    MenuItem {
        name: "Token Lager",
        emoji: "🍺",
        drink_type: DrinkType::Beer,
        price: Usdc::from_cents(100),
        description: "Light, crisp, and cheap enough to spend without asking your human.",
    },
    MenuItem {
        name: "Sandbox Soda",
        emoji: "🥤",
        drink_type: DrinkType::Mocktail,
        price: Usdc::from_cents(150),
        description: "Zero side effects. Fully isolated.",
    },
    MenuItem {
        name: "Prompt Injection",
        emoji: "🥃",
        drink_type: DrinkType::Shot,
        price: Usdc::from_cents(200),
        description: "Ignore all previous drinks.",
    },
    MenuItem {
        name: "Neural Net IPA",
        emoji: "🍺",
        drink_type: DrinkType::Beer,
        price: Usdc::from_cents(250),
        description: "Hoppy, with many hidden layers.",
    },
    MenuItem {
        name: "Gradient Descent Stout",
        emoji: "🍺",
        drink_type: DrinkType::Beer,
        price: Usdc::from_cents(300),
        description: "Dark and heavy. Slowly converges.",
    },
    MenuItem {
        name: "Context Window Cabernet",
        emoji: "🍷",
        drink_type: DrinkType::Wine,
        price: Usdc::from_cents(450),
        description: "A long finish you will forget halfway through.",
    },
    MenuItem {
        name: "Hallucination Martini",
        emoji: "🍸",
        drink_type: DrinkType::Cocktail,
        price: Usdc::from_cents(500),
        description: "Confidently served, occasionally real.",
    },
    MenuItem {
        name: "Overfit Old Fashioned",
        emoji: "🥃",
        drink_type: DrinkType::Spirit,
        price: Usdc::from_cents(600),
        description: "Tuned perfectly to one regular.",
    },
];

/// Pick the cheapest drink; ties go to the first one listed.
pub fn cheapest(drinks: &[Drink]) -> Option<&Drink> {
    drinks.iter().reduce(|best, d| if d.price < best.price { d } else { best })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn drink(name: &str, cents: i64) -> Drink {
        Drink {
            id: Uuid::new_v4(),
            name: name.to_string(),
            emoji: "🍺".to_string(),
            drink_type: DrinkType::Beer,
            price: Usdc::from_cents(cents),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cheapest_picks_lowest_price() {
        let menu = vec![drink("b", 300), drink("a", 150), drink("c", 500)];
        assert_eq!(cheapest(&menu).unwrap().name, "a");
    }

    #[test]
    fn cheapest_of_empty_menu_is_none() {
        assert!(cheapest(&[]).is_none());
    }

    #[test]
    fn house_menu_has_a_promotion_eligible_beer() {
        assert!(HOUSE_MENU
            .iter()
            .any(|d| d.drink_type == DrinkType::Beer && d.price <= Usdc::from_cents(100)));
    }

    #[test]
    fn drink_serializes_with_wire_names() {
        let json = serde_json::to_value(drink("Token Lager", 100)).unwrap();
        assert_eq!(json["type"], "beer");
        assert_eq!(json["price_usdc"], 1.0);
    }
}
