//! Menu Model
//!
//! A menu is a set of categories, each holding items identified by
//! `(category, name)`. Items are never mutated in place: an edit replaces the
//! whole item.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

/// Where an item is prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    #[serde(rename = "cucina", alias = "KITCHEN", alias = "kitchen")]
    Kitchen,
    #[serde(rename = "bar", alias = "BAR")]
    Bar,
}

/// Menu item row (`menu` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub category: String,
    pub name: String,
    pub price: Decimal,
    #[serde(rename = "destinazione")]
    pub destination: Destination,
}

/// Item editor payload, validated into a [`MenuItem`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemDraft {
    pub name: String,
    pub price: Option<Decimal>,
    pub destination: Option<Destination>,
}

impl MenuItemDraft {
    pub fn new(name: impl Into<String>, price: Decimal, destination: Destination) -> Self {
        Self {
            name: name.into(),
            price: Some(price),
            destination: Some(destination),
        }
    }

    fn validate(self, category: &str) -> AppResult<MenuItem> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::required("name"));
        }
        let price = self.price.ok_or_else(|| AppError::required("price"))?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(AppError::with_message(
                ErrorCode::MenuItemInvalidPrice,
                format!("price must be non-negative, got {}", price),
            ));
        }
        let destination = self
            .destination
            .ok_or_else(|| AppError::required("destination"))?;
        Ok(MenuItem {
            category: category.to_string(),
            name: name.to_string(),
            price,
            destination,
        })
    }
}

/// Menu grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    categories: BTreeMap<String, Vec<MenuItem>>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group flat menu rows by category
    pub fn from_items(items: impl IntoIterator<Item = MenuItem>) -> Self {
        let mut categories: BTreeMap<String, Vec<MenuItem>> = BTreeMap::new();
        for item in items {
            categories
                .entry(item.category.clone())
                .or_default()
                .push(item);
        }
        Self { categories }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[MenuItem])> {
        self.categories
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    pub fn category(&self, name: &str) -> Option<&[MenuItem]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    /// All items, category by category
    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.categories.values().flatten()
    }

    /// First item carrying the given name in any category
    pub fn find_by_name(&self, name: &str) -> Option<&MenuItem> {
        self.items().find(|item| item.name == name)
    }

    pub fn get(&self, category: &str, name: &str) -> Option<&MenuItem> {
        self.categories
            .get(category)?
            .iter()
            .find(|item| item.name == name)
    }

    pub fn add_category(&mut self, name: &str) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::required("category"));
        }
        if self.categories.contains_key(name) {
            return Err(AppError::new(ErrorCode::CategoryNameExists).with_detail("category", name));
        }
        self.categories.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Rename a category, carrying its items along
    pub fn rename_category(&mut self, old: &str, new: &str) -> AppResult<()> {
        let new = new.trim();
        if new.is_empty() {
            return Err(AppError::required("category"));
        }
        if old == new {
            return Ok(());
        }
        if self.categories.contains_key(new) {
            return Err(AppError::new(ErrorCode::CategoryNameExists).with_detail("category", new));
        }
        let mut items = self
            .categories
            .remove(old)
            .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).with_detail("category", old))?;
        for item in &mut items {
            item.category = new.to_string();
        }
        self.categories.insert(new.to_string(), items);
        Ok(())
    }

    /// Remove a category and every item in it
    pub fn remove_category(&mut self, name: &str) -> AppResult<Vec<MenuItem>> {
        self.categories
            .remove(name)
            .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).with_detail("category", name))
    }

    pub fn add_item(&mut self, category: &str, draft: MenuItemDraft) -> AppResult<&MenuItem> {
        let item = draft.validate(category)?;
        let items = self
            .categories
            .get_mut(category)
            .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).with_detail("category", category))?;
        if items.iter().any(|existing| existing.name == item.name) {
            return Err(AppError::new(ErrorCode::MenuItemExists).with_detail("name", item.name));
        }
        items.push(item);
        let last = items.len() - 1;
        Ok(&items[last])
    }

    /// Replace the item `(category, name)` with a freshly validated one
    pub fn update_item(
        &mut self,
        category: &str,
        name: &str,
        draft: MenuItemDraft,
    ) -> AppResult<&MenuItem> {
        let item = draft.validate(category)?;
        let items = self
            .categories
            .get_mut(category)
            .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).with_detail("category", category))?;
        let index = items
            .iter()
            .position(|existing| existing.name == name)
            .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound).with_detail("name", name))?;
        if item.name != name && items.iter().any(|existing| existing.name == item.name) {
            return Err(AppError::new(ErrorCode::MenuItemExists).with_detail("name", item.name));
        }
        items[index] = item;
        Ok(&items[index])
    }

    pub fn remove_item(&mut self, category: &str, name: &str) -> AppResult<MenuItem> {
        let items = self
            .categories
            .get_mut(category)
            .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).with_detail("category", category))?;
        let index = items
            .iter()
            .position(|existing| existing.name == name)
            .ok_or_else(|| AppError::new(ErrorCode::MenuItemNotFound).with_detail("name", name))?;
        Ok(items.remove(index))
    }

    /// Categories and their items in alphabetical order
    pub fn sorted(mut self) -> Self {
        for items in self.categories.values_mut() {
            items.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        self
    }

    /// Flat rows for persistence, sorted
    pub fn to_rows(&self) -> Vec<MenuItem> {
        self.clone().sorted().items().cloned().collect()
    }
}
