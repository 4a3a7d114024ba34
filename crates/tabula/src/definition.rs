//! Declarative table definitions loaded from YAML.
//!
//! ```yaml
//! resource: users
//! name: users
//! per_page_options: [10, 25, 50]
//! columns:
//!   - field: name
//!     options: { sortable: true, searchable: true }
//!     link: "/users/{id}"
//!   - field: status
//!     kind: badge
//!     map: { active: Active, banned: Banned }
//!     variants: { active: green, banned: red }
//! filters:
//!   - field: status
//!     kind: dropdown
//!     options: { active: Active, banned: Banned }
//! ```
//!
//! Loading only checks the YAML shape. [`TableDefinitionFile::build`]
//! validates option names and decorator arguments and yields a
//! [`DeclaredTable`] usable with [`Table::make`](crate::table::Table::make).

use crate::clause::Clause;
use crate::column::{Column, DecoratorRule, Image, LinkRule, Variant};
use crate::error::ConfigError;
use crate::filter::Filter;
use crate::table::TableDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TableDefinitionFile {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_sort")]
    pub default_sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page_options: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky_header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky_pagination: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

fn default_sort() -> Option<String> {
    Some("id".to_string())
}

fn default_kind() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub field: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Named options, applied in key order through [`Column::set_option`].
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    /// Lookup table for the mapping phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<BTreeMap<String, Value>>,
    /// Icon name, or a table from raw value to icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
    /// Image URL, or a table from raw value to image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    /// URL template, or `{href, target}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Value>,
    /// Badge variant per raw value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<BTreeMap<String, String>>,
    /// chrono format for date columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    pub field: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub show_in_header: bool,
    #[serde(default)]
    pub nullable: bool,
    /// Dropdown choices, value to label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub multiple: bool,
    /// Clause id, e.g. `starts_with`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_label: Option<String>,
}

impl TableDefinitionFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let file: TableDefinitionFile = serde_yaml::from_str(contents)?;
        Ok(file)
    }

    /// Validate every column and filter and produce a usable definition.
    pub fn build(&self) -> Result<DeclaredTable, ConfigError> {
        let columns = self
            .columns
            .iter()
            .map(ColumnSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        let filters = self
            .filters
            .iter()
            .map(FilterSpec::build)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            resource = ?self.resource,
            columns = columns.len(),
            filters = filters.len(),
            "table definition built"
        );

        Ok(DeclaredTable {
            file: self.clone(),
            columns,
            filters,
        })
    }
}

impl ColumnSpec {
    pub fn build(&self) -> Result<Column, ConfigError> {
        let mut column = match self.kind.as_str() {
            "text" => Column::text(self.field.as_str()),
            "badge" => Column::badge(self.field.as_str()),
            "boolean" => Column::boolean(self.field.as_str()),
            "date" => Column::date(self.field.as_str()),
            "image" => Column::image(self.field.as_str()),
            other => {
                return Err(ConfigError::UnknownKind {
                    family: "column",
                    kind: other.to_string(),
                })
            }
        };

        if let Some(header) = &self.header {
            column = column.header(header.as_str());
        }
        if let Some(alias) = &self.alias {
            column = column.alias(alias.as_str());
        }
        if let Some(format) = &self.format {
            column = column.set_option("format", &Value::String(format.clone()))?;
        }
        for (name, value) in &self.options {
            column = column.set_option(name, value)?;
        }
        if let Some(map) = &self.map {
            column = column.map_values(map.clone());
        }
        if let Some(icon) = &self.icon {
            column = column.icon(self.rule(icon, "icon")?);
        }
        if let Some(image) = &self.image {
            column = column.image_decorator(self.rule::<Image>(image, "image")?);
        }
        if let Some(link) = &self.link {
            column = column.link(self.link_rule(link)?);
        }
        if let Some(variants) = &self.variants {
            if self.kind != "badge" {
                return Err(self.invalid("variant", "variants are only supported on badge columns"));
            }
            let table = variants
                .iter()
                .map(|(key, name)| {
                    Variant::parse(name)
                        .map(|variant| (key.clone(), variant))
                        .ok_or_else(|| self.invalid("variant", format!("unknown variant '{name}'")))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            column = column.variant(DecoratorRule::Lookup(table));
        }

        Ok(column)
    }

    /// A string applies to every row; a mapping is keyed by raw value.
    fn rule<T>(&self, value: &Value, decorator: &'static str) -> Result<DecoratorRule<T>, ConfigError>
    where
        T: Clone + From<String>,
    {
        match value {
            Value::String(s) => Ok(DecoratorRule::Fixed(T::from(s.clone()))),
            Value::Object(entries) => {
                let table = entries
                    .iter()
                    .map(|(key, target)| match target {
                        Value::String(s) => Ok((key.clone(), T::from(s.clone()))),
                        other => Err(self.invalid(
                            decorator,
                            format!("lookup value for '{key}' must be a string, got {other}"),
                        )),
                    })
                    .collect::<Result<BTreeMap<_, _>, _>>()?;
                Ok(DecoratorRule::Lookup(table))
            }
            other => Err(self.invalid(
                decorator,
                format!("expected a string or a mapping, got {other}"),
            )),
        }
    }

    fn link_rule(&self, value: &Value) -> Result<LinkRule, ConfigError> {
        match value {
            Value::String(href) => Ok(LinkRule::url(href.as_str())),
            Value::Object(map) => {
                let href = map
                    .get("href")
                    .and_then(Value::as_str)
                    .ok_or_else(|| self.invalid("link", "missing string 'href'"))?;
                let target = match map.get("target") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(target)) => Some(target.clone()),
                    Some(other) => {
                        return Err(self.invalid("link", format!("'target' must be a string, got {other}")))
                    }
                };
                if let Some(key) = map.keys().find(|k| !matches!(k.as_str(), "href" | "target")) {
                    return Err(self.invalid("link", format!("unexpected key '{key}'")));
                }
                Ok(LinkRule::Url {
                    href: href.to_string(),
                    target,
                })
            }
            other => Err(self.invalid("link", format!("expected a string or a mapping, got {other}"))),
        }
    }

    fn invalid(&self, decorator: &'static str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidDecorator {
            field: self.field.clone(),
            decorator,
            reason: reason.into(),
        }
    }
}

impl FilterSpec {
    pub fn build(&self) -> Result<Filter, ConfigError> {
        let mut filter = match self.kind.as_str() {
            "text" => Filter::text(self.field.as_str()),
            "boolean" => Filter::boolean(self.field.as_str()),
            "dropdown" => Filter::dropdown(self.field.as_str()),
            "date" => Filter::date(self.field.as_str()),
            other => {
                return Err(ConfigError::UnknownKind {
                    family: "filter",
                    kind: other.to_string(),
                })
            }
        };

        if let Some(title) = &self.title {
            filter = filter.title(title.as_str());
        }
        if let Some(alias) = &self.alias {
            filter = filter.alias(alias.as_str());
        }
        if self.show_in_header {
            filter = filter.show_in_header();
        }
        if self.nullable {
            filter = filter.nullable();
        }
        if let Some(options) = &self.options {
            filter = filter.options(options.iter().map(|(v, l)| (v.as_str(), l.as_str())));
        }
        if self.multiple {
            filter = filter.multiple();
        }
        if let Some(label) = &self.true_label {
            filter = filter.true_label(label.as_str());
        }
        if let Some(label) = &self.false_label {
            filter = filter.false_label(label.as_str());
        }
        if let Some(id) = &self.default_clause {
            let clause = Clause::from_id(id)
                .filter(|c| filter.clauses().contains(c))
                .ok_or_else(|| ConfigError::UnknownClause(id.clone()))?;
            filter = filter.default_clause(clause);
        }

        Ok(filter)
    }
}

/// A validated declarative definition.
#[derive(Debug, Clone)]
pub struct DeclaredTable {
    file: TableDefinitionFile,
    columns: Vec<Column>,
    filters: Vec<Filter>,
}

impl DeclaredTable {
    pub fn file(&self) -> &TableDefinitionFile {
        &self.file
    }
}

impl TableDefinition for DeclaredTable {
    fn resource(&self) -> Option<&str> {
        self.file.resource.as_deref()
    }

    fn columns(&self) -> Vec<Column> {
        self.columns.clone()
    }

    fn filters(&self) -> Vec<Filter> {
        self.filters.clone()
    }

    fn name(&self) -> Option<&str> {
        self.file.name.as_deref()
    }

    /// Unnamed declarative tables are named after their resource.
    fn type_name(&self) -> &str {
        self.file.resource.as_deref().unwrap_or("table")
    }

    fn default_sort(&self) -> Option<&str> {
        self.file.default_sort.as_deref()
    }

    fn per_page_options(&self) -> Option<Vec<u32>> {
        self.file.per_page_options.clone()
    }

    fn sticky_header(&self) -> Option<bool> {
        self.file.sticky_header
    }

    fn sticky_pagination(&self) -> Option<bool> {
        self.file.sticky_pagination
    }

    fn resizable(&self) -> Option<bool> {
        self.file.resizable
    }
}
