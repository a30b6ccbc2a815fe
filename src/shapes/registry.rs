//! Room-label to template mapping
//!
//! Labels are matched case-insensitively after normalising separators and
//! dropping numeric suffixes, so `"Bedroom_2"`, `"bedroom 2"` and
//! `"BEDROOM"` all resolve to the bedroom category.

use tracing::debug;

use crate::error::ConfigError;
use crate::graph::{MetaValue, Metadata, RoomSpec};
use crate::layout::types::Point;

use super::template::ShapeTemplate;

/// Metadata key overriding the target area, in m²
pub const AREA_KEY: &str = "area";
/// Metadata key overriding the long/short aspect ratio
pub const ASPECT_RATIO_KEY: &str = "aspect_ratio";
/// Metadata key overriding the minimum dimension, in m
pub const MIN_DIMENSION_KEY: &str = "min_dimension";

/// A known kind of room and the outline used for it
#[derive(Debug, Clone, PartialEq)]
pub struct RoomCategory {
    pub name: String,
    /// Normalised labels that select this category
    pub aliases: Vec<String>,
    pub template: ShapeTemplate,
    pub default_area: f64,
    pub aspect_ratio_range: (f64, f64),
    pub min_dimension: f64,
}

impl RoomCategory {
    pub fn new(name: impl Into<String>, template: ShapeTemplate) -> Self {
        let name = name.into();
        let default_area = template.area();
        Self {
            aliases: vec![normalize_label(&name)],
            name,
            template,
            default_area,
            aspect_ratio_range: (1.0, 2.0),
            min_dimension: 1.0,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases
            .extend(aliases.iter().map(|a| normalize_label(a)));
        self
    }

    /// Rescale the template to `area` and make it the default
    pub fn with_default_area(mut self, area: f64) -> Self {
        self.template = self.template.with_area(area);
        self.default_area = area;
        self
    }

    pub fn with_aspect_range(mut self, min: f64, max: f64) -> Self {
        self.aspect_ratio_range = (min, max);
        self
    }

    pub fn with_min_dimension(mut self, min_dimension: f64) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    fn matches(&self, normalized: &str) -> bool {
        self.aliases.iter().any(|a| a == normalized)
    }
}

/// Result of mapping a label to a template
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeAssignment {
    pub template: ShapeTemplate,
    pub category: String,
    /// No category matched and the generic rectangle was used
    pub fallback: bool,
}

/// Lookup table from room labels to parametric templates
#[derive(Debug, Clone)]
pub struct ShapeLibrary {
    categories: Vec<RoomCategory>,
    fallback: RoomCategory,
}

impl Default for ShapeLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeLibrary {
    /// Library with the built-in residential categories
    pub fn new() -> Self {
        Self {
            categories: builtin_categories(),
            fallback: RoomCategory::new("generic", ShapeTemplate::rectangle_with_area(10.0, 1.2))
                .with_aspect_range(1.0, 2.0)
                .with_min_dimension(1.5),
        }
    }

    /// Library with no categories; every label falls back
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            ..Self::new()
        }
    }

    /// Register a category. Later registrations win over earlier ones for
    /// the same alias. A template without positive extents or area is
    /// rejected.
    pub fn register(&mut self, category: RoomCategory) -> Result<(), ConfigError> {
        if !category.template.is_valid() {
            return Err(ConfigError::InvalidTemplate {
                category: category.name,
            });
        }
        self.categories.insert(0, category);
        Ok(())
    }

    pub fn with_category(mut self, category: RoomCategory) -> Result<Self, ConfigError> {
        self.register(category)?;
        Ok(self)
    }

    pub fn categories(&self) -> &[RoomCategory] {
        &self.categories
    }

    pub fn fallback(&self) -> &RoomCategory {
        &self.fallback
    }

    /// Category for a label, if any alias matches
    pub fn lookup(&self, label: &str) -> Option<&RoomCategory> {
        let normalized = normalize_label(label);
        self.categories.iter().find(|c| c.matches(&normalized))
    }

    fn category_for(&self, label: &str) -> (&RoomCategory, bool) {
        match self.lookup(label) {
            Some(c) => (c, false),
            None => (&self.fallback, true),
        }
    }

    /// Template for a label, sized by the `area` and `aspect_ratio`
    /// metadata overrides when present
    pub fn assign_shape(&self, label: &str, metadata: &Metadata) -> ShapeTemplate {
        self.assign(label, metadata).template
    }

    pub fn assign(&self, label: &str, metadata: &Metadata) -> ShapeAssignment {
        let (category, fallback) = self.category_for(label);
        if fallback {
            debug!(label, "no room category matched, using generic rectangle");
        }
        let area = meta_f64(metadata, AREA_KEY)
            .filter(|a| *a > 0.0)
            .unwrap_or(category.default_area);
        let mut template = category.template.with_area(area);
        if let Some(aspect) = meta_f64(metadata, ASPECT_RATIO_KEY).filter(|a| *a >= 1.0) {
            template = template.with_aspect_ratio(aspect);
        }
        ShapeAssignment {
            template,
            category: category.name.clone(),
            fallback,
        }
    }

    /// Template for a room at its target area, with the aspect ratio pulled
    /// into the room's permitted range
    pub fn assign_for_room(&self, spec: &RoomSpec) -> ShapeAssignment {
        let mut metadata = spec.metadata.clone();
        metadata.insert(AREA_KEY.to_string(), MetaValue::Number(spec.target_area));
        let mut assignment = self.assign(&spec.label, &metadata);

        let (min, max) = spec.aspect_ratio_range;
        let aspect = assignment.template.aspect_ratio();
        if aspect < min - 1e-9 {
            assignment.template = assignment.template.with_aspect_ratio(min);
        } else if aspect > max + 1e-9 {
            assignment.template = assignment.template.with_aspect_ratio(max);
        }
        assignment
    }

    /// Build a room using the category defaults for anything the metadata
    /// does not override
    pub fn room_spec(&self, id: &str, label: &str, metadata: Metadata) -> RoomSpec {
        let (category, _) = self.category_for(label);
        let area = meta_f64(&metadata, AREA_KEY)
            .filter(|a| *a > 0.0)
            .unwrap_or(category.default_area);
        let min_dimension = meta_f64(&metadata, MIN_DIMENSION_KEY).unwrap_or(category.min_dimension);
        let (mut min, mut max) = category.aspect_ratio_range;
        if let Some(aspect) = meta_f64(&metadata, ASPECT_RATIO_KEY) {
            min = min.min(aspect);
            max = max.max(aspect);
        }
        RoomSpec {
            id: id.to_string(),
            label: label.to_string(),
            target_area: area,
            aspect_ratio_range: (min, max),
            min_dimension,
            metadata,
        }
    }
}

fn meta_f64(metadata: &Metadata, key: &str) -> Option<f64> {
    metadata.get(key).and_then(MetaValue::as_f64)
}

/// Lowercase, turn `_`/`-` into spaces, collapse whitespace and drop a
/// trailing room number
pub fn normalize_label(label: &str) -> String {
    let spaced: String = label
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let mut words: Vec<&str> = spaced.split_whitespace().collect();
    if words.len() > 1 && words.last().is_some_and(|w| w.chars().all(|c| c.is_ascii_digit())) {
        words.pop();
    }
    if let Some(last) = words.last_mut() {
        let word: &str = *last;
        let trimmed = word.trim_end_matches(|c: char| c.is_ascii_digit());
        if !trimmed.is_empty() {
            *last = trimmed;
        }
    }
    words.join(" ")
}

fn builtin_categories() -> Vec<RoomCategory> {
    vec![
        RoomCategory::new("entrance", ShapeTemplate::rectangle(2.0, 2.0))
            .with_aliases(&["entry", "foyer"])
            .with_aspect_range(1.0, 2.0)
            .with_min_dimension(1.2),
        RoomCategory::new("corridor", ShapeTemplate::rectangle_with_area(6.0, 3.0))
            .with_aliases(&["hallway", "hall", "passage"])
            .with_aspect_range(2.0, 6.0)
            .with_min_dimension(1.0),
        RoomCategory::new("kitchen", ShapeTemplate::rectangle_with_area(8.0, 1.3))
            .with_aliases(&["kitchenette"])
            .with_aspect_range(1.0, 2.0)
            .with_min_dimension(2.0),
        RoomCategory::new("living dining", ShapeTemplate::l_shape(3.0, 6.0, 3.0, 5.0))
            .with_aliases(&["living", "living room", "dining", "dining room", "lounge"])
            .with_default_area(20.0)
            .with_aspect_range(1.0, 2.0)
            .with_min_dimension(2.5),
        RoomCategory::new("bedroom", ShapeTemplate::rectangle_with_area(12.0, 1.25))
            .with_aliases(&["master bedroom", "guest room"])
            .with_aspect_range(1.0, 1.6)
            .with_min_dimension(2.7),
        RoomCategory::new("bathroom", ShapeTemplate::rectangle_with_area(4.5, 1.4))
            .with_aliases(&["bath", "toilet", "wc", "washroom"])
            .with_aspect_range(1.0, 2.0)
            .with_min_dimension(1.5),
        RoomCategory::new("balcony", ShapeTemplate::rectangle_with_area(5.0, 2.5))
            .with_aliases(&["terrace"])
            .with_aspect_range(1.5, 4.0)
            .with_min_dimension(1.2),
        RoomCategory::new("storage", ShapeTemplate::rectangle_with_area(2.5, 1.2))
            .with_aliases(&["closet", "utility"])
            .with_aspect_range(1.0, 2.5)
            .with_min_dimension(1.0),
        RoomCategory::new(
            "study",
            ShapeTemplate::polygon(vec![
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 2.2),
                Point::new(3.2, 3.0),
                Point::new(0.0, 3.0),
            ]),
        )
        .with_aliases(&["office"])
        .with_default_area(9.0)
        .with_aspect_range(1.0, 2.0)
        .with_min_dimension(2.0),
    ]
}
