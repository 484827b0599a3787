//! Ingredient and tag reference data. Recipes only ever reference these.

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult, ValidationErrors};
use crate::models::{
    Ingredient, Tag, MAX_INGREDIENT_NAME_LEN, MAX_MEASUREMENT_UNIT_LEN, MAX_SLUG_LEN,
    MAX_TAG_FIELD_LEN,
};
use crate::storage::Database;

impl Database {
    /// Case-insensitive substring search, ordered by name.
    pub fn list_ingredients(&self, name: Option<&str>) -> Vec<Ingredient> {
        let needle = name.map(str::to_lowercase).filter(|n| !n.is_empty());

        let mut found: Vec<Ingredient> = self
            .ingredients
            .iter()
            .filter(|i| match &needle {
                Some(needle) => i.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
        });
        found
    }

    pub fn ingredient(&self, id: Uuid) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    pub fn get_ingredient(&self, id: Uuid) -> AppResult<Ingredient> {
        self.ingredient(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Ingredient not found"))
    }

    /// Returns the ingredient and whether it was newly added.
    pub fn get_or_create_ingredient(
        &mut self,
        name: &str,
        measurement_unit: &str,
    ) -> AppResult<(Ingredient, bool)> {
        let name = name.trim();
        let measurement_unit = measurement_unit.trim();

        let mut errors = ValidationErrors::default();
        check_text(&mut errors, "name", name, MAX_INGREDIENT_NAME_LEN);
        check_text(
            &mut errors,
            "measurement_unit",
            measurement_unit,
            MAX_MEASUREMENT_UNIT_LEN,
        );
        errors.into_result()?;

        if let Some(existing) = self
            .ingredients
            .iter()
            .find(|i| i.name == name && i.measurement_unit == measurement_unit)
        {
            return Ok((existing.clone(), false));
        }

        let ingredient = Ingredient::new(name.to_string(), measurement_unit.to_string());
        info!(id = %ingredient.id, name, measurement_unit, "ingredient added");
        self.ingredients.push(ingredient.clone());
        Ok((ingredient, true))
    }

    pub fn list_tags(&self) -> Vec<Tag> {
        let mut tags = self.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    pub fn tag(&self, id: Uuid) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn get_tag(&self, id: Uuid) -> AppResult<Tag> {
        self.tag(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Tag not found"))
    }

    /// Identical rows are reused; a row clashing on only some of the unique
    /// fields is a conflict.
    pub fn get_or_create_tag(
        &mut self,
        name: &str,
        color: &str,
        slug: &str,
    ) -> AppResult<(Tag, bool)> {
        let name = name.trim();
        let color = color.trim();
        let slug = slug.trim();

        let mut errors = ValidationErrors::default();
        check_text(&mut errors, "name", name, MAX_TAG_FIELD_LEN);
        check_text(&mut errors, "color", color, MAX_TAG_FIELD_LEN);
        check_text(&mut errors, "slug", slug, MAX_SLUG_LEN);
        if !is_slug(slug) {
            errors.add(
                "slug",
                "Slug may contain only letters, numbers, underscores or hyphens",
            );
        }
        errors.into_result()?;

        if let Some(existing) = self
            .tags
            .iter()
            .find(|t| t.name == name || t.color == color || t.slug == slug)
        {
            if existing.name == name && existing.color == color && existing.slug == slug {
                return Ok((existing.clone(), false));
            }
            return Err(AppError::conflict(format!(
                "Tag ({name}, {color}, {slug}) clashes with existing tag {}",
                existing.slug
            )));
        }

        let tag = Tag::new(name.to_string(), color.to_string(), slug.to_string());
        info!(id = %tag.id, slug, "tag added");
        self.tags.push(tag.clone());
        Ok((tag, true))
    }

    pub fn tag_ids_for_slugs(&self, slugs: &[String]) -> Vec<Uuid> {
        self.tags
            .iter()
            .filter(|t| slugs.iter().any(|s| *s == t.slug))
            .map(|t| t.id)
            .collect()
    }
}

/// Checks the trimmed value, which is what gets stored.
pub(crate) fn check_text(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field may not be blank");
    } else if value.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters"),
        );
    }
}

fn is_slug(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
