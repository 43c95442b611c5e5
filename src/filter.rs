use std::fmt;
use std::str::FromStr;

use crate::model::FlipOpportunity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    All,
    EnchantmentBooks,
    Food,
    Ores,
    MobDrops,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::All,
        Category::EnchantmentBooks,
        Category::Food,
        Category::Ores,
        Category::MobDrops,
        Category::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::All => "All",
            Category::EnchantmentBooks => "Enchantment Books",
            Category::Food => "Food",
            Category::Ores => "Ores",
            Category::MobDrops => "Mob Drops",
            Category::Other => "Other",
        }
    }

    /// Substrings an item id must contain (any one) to belong here.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::All => &[],
            Category::EnchantmentBooks => &["ENCHANTED_BOOK", "BOOK"],
            Category::Food => &["APPLE", "CAKE", "BREAD", "CARROT", "POTION"],
            Category::Ores => &["COAL", "IRON", "GOLD", "DIAMOND", "EMERALD"],
            Category::MobDrops => &["BLAZE_ROD", "GHAST_TEAR", "SPIDER_EYE"],
            Category::Other => &[],
        }
    }

    pub fn matches(self, item_id: &str) -> bool {
        self == Category::All || self.keywords().iter().any(|k| item_id.contains(k))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    /// Unknown names select everything.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .unwrap_or(Category::All))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterCriteria {
    pub category: Category,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl FilterCriteria {
    /// Build criteria from free-text inputs. Bounds that do not parse as a
    /// number are dropped.
    pub fn from_inputs(category: &str, min_price: &str, max_price: &str) -> Self {
        FilterCriteria {
            category: category.parse().unwrap_or_default(),
            min_price: parse_bound(min_price),
            max_price: parse_bound(max_price),
        }
    }

    pub fn keeps(&self, opp: &FlipOpportunity) -> bool {
        self.category.matches(&opp.item_id)
            && self.min_price.map_or(true, |min| opp.sell_price >= min)
            && self.max_price.map_or(true, |max| opp.sell_price <= max)
    }
}

fn parse_bound(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Filter then rank by score, highest first. Equal scores keep their input
/// order.
pub fn apply(opportunities: &[FlipOpportunity], criteria: &FilterCriteria) -> Vec<FlipOpportunity> {
    let mut filtered: Vec<FlipOpportunity> = opportunities
        .iter()
        .filter(|o| criteria.keeps(o))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.score.total_cmp(&a.score));
    filtered
}

pub fn top(
    opportunities: &[FlipOpportunity],
    criteria: &FilterCriteria,
    limit: usize,
) -> Vec<FlipOpportunity> {
    let mut ranked = apply(opportunities, criteria);
    ranked.truncate(limit);
    ranked
}
