//! Per-field columns: header descriptor plus a two-phase row transform.
//!
//! # Module Structure
//!
//! - `appearance` - Icons, images, badge variants, alignment
//! - `decorator` - Value mappings and icon/image/link decorators
//!
//! Every row goes through [`Column::transform`], which always runs the mapping
//! phase before the decoration phase. Mapping writes the primary value under
//! the field's own name; decorators write side annotations and never touch it.

mod appearance;
mod decorator;

pub use appearance::{Alignment, Icon, Image, Position, Size, Variant};
pub use decorator::{DecoratorRule, ImageDecorator, LinkRule, LinkTarget, ValueMapping};

use crate::config::{validate_date_format, TableDefaults};
use crate::error::ConfigError;
use crate::query::{parse_date, truthiness};
use crate::record::{OutputRecord, Record};
use crate::text::headline;
use chrono::{DateTime, NaiveDateTime};
use serde_json::{json, Map, Value};
use std::fmt::Write;

/// Concrete column kind.
#[derive(Debug, Clone)]
pub enum ColumnKind {
    Text,
    Badge {
        variant: Option<DecoratorRule<Variant>>,
    },
    Boolean {
        true_label: Option<String>,
        false_label: Option<String>,
        true_icon: Option<String>,
        false_icon: Option<String>,
    },
    Date {
        format: Option<String>,
    },
    Image,
}

impl ColumnKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TextColumn",
            ColumnKind::Badge { .. } => "BadgeColumn",
            ColumnKind::Boolean { .. } => "BooleanColumn",
            ColumnKind::Date { .. } => "DateColumn",
            ColumnKind::Image => "ImageColumn",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    field: String,
    kind: ColumnKind,
    header: Option<String>,
    alias: Option<String>,
    sortable: bool,
    searchable: bool,
    toggleable: bool,
    stickable: bool,
    visible: bool,
    header_alignment: Alignment,
    alignment: Alignment,
    wrap: bool,
    truncate: u32,
    width: String,
    header_class: Option<String>,
    cell_class: Option<String>,
    mapping: Option<ValueMapping>,
    icon: Option<DecoratorRule<Icon>>,
    image: Option<ImageDecorator>,
    link: Option<LinkRule>,
}

impl Column {
    fn make(field: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            field: field.into(),
            kind,
            header: None,
            alias: None,
            sortable: false,
            searchable: false,
            toggleable: true,
            stickable: false,
            visible: true,
            header_alignment: Alignment::Left,
            alignment: Alignment::Left,
            wrap: false,
            truncate: 1,
            width: "auto".to_string(),
            header_class: None,
            cell_class: None,
            mapping: None,
            icon: None,
            image: None,
            link: None,
        }
    }

    pub fn text(field: impl Into<String>) -> Self {
        Self::make(field, ColumnKind::Text)
    }

    /// Pill-shaped cell coloured by a [`Variant`].
    pub fn badge(field: impl Into<String>) -> Self {
        Self::make(field, ColumnKind::Badge { variant: None })
    }

    pub fn boolean(field: impl Into<String>) -> Self {
        Self::make(
            field,
            ColumnKind::Boolean {
                true_label: None,
                false_label: None,
                true_icon: None,
                false_icon: None,
            },
        )
    }

    pub fn date(field: impl Into<String>) -> Self {
        Self::make(field, ColumnKind::Date { format: None })
    }

    /// Cell showing the image whose URL is stored in the field itself.
    pub fn image(field: impl Into<String>) -> Self {
        let field = field.into();
        let mut column = Self::make(field.clone(), ColumnKind::Image);
        column.image = Some(ImageDecorator::Attribute {
            attribute: field,
            template: Image::default().size(Size::ExtraLarge).class("rounded-md"),
        });
        column
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Include this field in the global search.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    pub fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self
    }

    /// The column can no longer be hidden, so it becomes visible.
    pub fn not_toggleable(mut self) -> Self {
        self.toggleable = false;
        self.visible = true;
        self
    }

    pub fn stickable(mut self) -> Self {
        self.stickable = true;
        self
    }

    pub fn not_stickable(mut self) -> Self {
        self.stickable = false;
        self
    }

    /// A column that cannot be toggled is always visible.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = !self.toggleable || visible;
        self
    }

    pub fn hidden(self) -> Self {
        self.visible(false)
    }

    /// Wrap cell text instead of truncating it.
    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self.truncate = 0;
        self
    }

    /// Clamp cell text to `lines` lines.
    pub fn truncate(mut self, lines: u32) -> Self {
        self.wrap = false;
        self.truncate = lines;
        self
    }

    pub fn width(mut self, width: impl Into<String>) -> Self {
        self.width = width.into();
        self
    }

    pub fn header_alignment(mut self, alignment: Alignment) -> Self {
        self.header_alignment = alignment;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn left_aligned(self) -> Self {
        self.header_alignment(Alignment::Left).alignment(Alignment::Left)
    }

    pub fn center_aligned(self) -> Self {
        self.header_alignment(Alignment::Center).alignment(Alignment::Center)
    }

    pub fn right_aligned(self) -> Self {
        self.header_alignment(Alignment::Right).alignment(Alignment::Right)
    }

    pub fn header_class(mut self, class: impl Into<String>) -> Self {
        self.header_class = Some(class.into());
        self
    }

    pub fn cell_class(mut self, class: impl Into<String>) -> Self {
        self.cell_class = Some(class.into());
        self
    }

    /// Replace cell values through a callback.
    pub fn map_as<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record, &Value) -> Value + Send + Sync + 'static,
    {
        self.mapping = Some(ValueMapping::callback(f));
        self
    }

    /// Replace cell values found in `entries`.
    pub fn map_values<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.mapping = Some(ValueMapping::lookup(entries));
        self
    }

    pub fn mapping(mut self, mapping: ValueMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn icon(mut self, rule: DecoratorRule<Icon>) -> Self {
        self.icon = Some(rule);
        self
    }

    pub fn image_decorator(mut self, decorator: impl Into<ImageDecorator>) -> Self {
        self.image = Some(decorator.into());
        self
    }

    pub fn link(mut self, rule: LinkRule) -> Self {
        self.link = Some(rule);
        self
    }

    /// Badge colour per row. Badge columns only.
    pub fn variant(mut self, rule: DecoratorRule<Variant>) -> Self {
        if let ColumnKind::Badge { variant } = &mut self.kind {
            *variant = Some(rule);
        }
        self
    }

    /// chrono display format. Date columns only.
    pub fn format(mut self, fmt: impl Into<String>) -> Self {
        if let ColumnKind::Date { format } = &mut self.kind {
            *format = Some(fmt.into());
        }
        self
    }

    /// Labels shown for true and false. Boolean columns only.
    pub fn labels(mut self, on: impl Into<String>, off: impl Into<String>) -> Self {
        if let ColumnKind::Boolean {
            true_label,
            false_label,
            ..
        } = &mut self.kind
        {
            *true_label = Some(on.into());
            *false_label = Some(off.into());
        }
        self
    }

    /// Icons shown for true and false. Boolean columns only.
    pub fn icons(mut self, on: impl Into<String>, off: impl Into<String>) -> Self {
        if let ColumnKind::Boolean {
            true_icon,
            false_icon,
            ..
        } = &mut self.kind
        {
            *true_icon = Some(on.into());
            *false_icon = Some(off.into());
        }
        self
    }

    /// Set a named option, as used by declarative definitions.
    ///
    /// Boolean options accept `not_<name>` to switch them off. Undeclared
    /// names are a configuration error.
    pub fn set_option(self, name: &str, value: &Value) -> Result<Self, ConfigError> {
        if let Some(flag) = name.strip_prefix("not_") {
            if is_flag(flag) {
                let on = flag_value(name, value)?;
                return Ok(self.set_flag(flag, !on));
            }
        }
        if is_flag(name) {
            let on = flag_value(name, value)?;
            return Ok(self.set_flag(name, on));
        }

        let column = match name {
            "truncate" => {
                let lines = value
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| invalid(name, "a non-negative integer"))?;
                self.truncate(lines)
            }
            "width" => match value {
                Value::String(width) => self.width(width.as_str()),
                Value::Number(n) => self.width(format!("{n}px")),
                _ => return Err(invalid(name, "a string or a number of pixels")),
            },
            "header_alignment" | "alignment" => {
                let alignment = value
                    .as_str()
                    .and_then(Alignment::parse)
                    .ok_or_else(|| invalid(name, "one of left, center, right"))?;
                if name == "alignment" {
                    self.alignment(alignment)
                } else {
                    self.header_alignment(alignment)
                }
            }
            "header_class" => self.header_class(string_value(name, value)?),
            "cell_class" => self.cell_class(string_value(name, value)?),
            "header" => self.header(string_value(name, value)?),
            "alias" => self.alias(string_value(name, value)?),
            "format" if matches!(self.kind, ColumnKind::Date { .. }) => {
                let format = string_value(name, value)?;
                validate_date_format(&format)?;
                self.format(format)
            }
            _ => {
                return Err(ConfigError::UnknownOption {
                    target: format!("{} '{}'", self.kind.type_name(), self.field),
                    option: name.to_string(),
                })
            }
        };
        Ok(column)
    }

    fn set_flag(self, flag: &str, on: bool) -> Self {
        match (flag, on) {
            ("sortable", true) => self.sortable(),
            ("sortable", false) => self.not_sortable(),
            ("searchable", true) => self.searchable(),
            ("searchable", false) => self.not_searchable(),
            ("toggleable", true) => self.toggleable(),
            ("toggleable", false) => self.not_toggleable(),
            ("stickable", true) => self.stickable(),
            ("stickable", false) => self.not_stickable(),
            ("visible", on) => self.visible(on),
            ("hidden", on) => self.visible(!on),
            ("wrap", true) => self.wrap(),
            ("wrap", false) => self.truncate(1),
            _ => self,
        }
    }

    /// Fill unset presentation settings from table-wide defaults.
    pub(crate) fn inherit(&mut self, defaults: &TableDefaults) {
        match &mut self.kind {
            ColumnKind::Boolean {
                true_label,
                false_label,
                true_icon,
                false_icon,
            } => {
                true_label.get_or_insert_with(|| defaults.true_label.clone());
                false_label.get_or_insert_with(|| defaults.false_label.clone());
                if true_icon.is_none() {
                    true_icon.clone_from(&defaults.true_icon);
                }
                if false_icon.is_none() {
                    false_icon.clone_from(&defaults.false_icon);
                }
            }
            ColumnKind::Date { format } => {
                format.get_or_insert_with(|| defaults.date_format.clone());
            }
            _ => {}
        }
    }

    /// Backing field name.
    pub fn name(&self) -> &str {
        &self.field
    }

    pub fn get_alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn public_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.field)
    }

    pub fn get_header(&self) -> String {
        self.header.clone().unwrap_or_else(|| headline(&self.field))
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn get_width(&self) -> &str {
        &self.width
    }

    /// Header descriptor sent to the renderer. Contains only static
    /// configuration, so it is safe to hash.
    pub fn descriptor(&self) -> Value {
        let mut options = Map::new();
        options.insert("sortable".into(), json!(self.sortable));
        options.insert("toggleable".into(), json!(self.toggleable));
        options.insert("stickable".into(), json!(self.stickable));
        options.insert("headerAlignment".into(), json!(self.header_alignment));
        options.insert("alignment".into(), json!(self.alignment));
        options.insert("wrap".into(), json!(self.wrap));
        options.insert("truncate".into(), json!(self.truncate));
        options.insert("headerClass".into(), json!(self.header_class));
        options.insert("cellClass".into(), json!(self.cell_class));

        if let ColumnKind::Boolean {
            true_label,
            false_label,
            true_icon,
            false_icon,
        } = &self.kind
        {
            options.insert("trueLabel".into(), json!(true_label));
            options.insert("falseLabel".into(), json!(false_label));
            options.insert("trueIcon".into(), json!(true_icon));
            options.insert("falseIcon".into(), json!(false_icon));
        }

        json!({
            "name": self.public_name(),
            "type": self.kind.type_name(),
            "header": self.get_header(),
            "width": self.width,
            "visible": self.visible,
            "options": options,
        })
    }

    /// Run the mapping phase, then the decoration phase, for one row.
    pub fn transform(&self, input: &Record, output: &mut OutputRecord) {
        let raw = input.get(&self.field);

        let mapped = match &self.mapping {
            Some(mapping) => mapping.apply(input, raw),
            None => self.default_value(raw),
        };
        let computed = input.is_computed(&self.field);
        if computed {
            output.set_computed(&self.field, mapped);
        } else {
            output.set(&self.field, mapped);
        }

        if let Some(icon) = self.icon.as_ref().and_then(|rule| rule.resolve(input, raw)) {
            output.decorate(&self.field, "icon", icon.to_json());
        }
        if let Some(image) = self.image.as_ref().and_then(|d| d.resolve(input, raw)) {
            output.decorate(&self.field, "image", image.to_json());
        }
        if let Some(link) = self.link.as_ref().and_then(|rule| rule.resolve(input)) {
            output.decorate(&self.field, "link", link.to_json());
        }
        if let ColumnKind::Badge { variant } = &self.kind {
            let variant = variant
                .as_ref()
                .and_then(|rule| rule.resolve(input, raw))
                .unwrap_or_default();
            output.decorate(&self.field, "variant", json!(variant.as_str()));
        }

        if computed {
            output.append([self.field.as_str()]);
        }
    }

    /// Kind-specific value when no explicit mapping is configured.
    fn default_value(&self, raw: &Value) -> Value {
        match &self.kind {
            ColumnKind::Boolean { .. } => truthiness(raw).map_or_else(|| raw.clone(), Value::Bool),
            ColumnKind::Date { format } => {
                let format = format.as_deref().unwrap_or("%Y-%m-%d");
                raw.as_str()
                    .and_then(|text| format_date(text, format))
                    .map_or_else(|| raw.clone(), Value::String)
            }
            _ => raw.clone(),
        }
    }
}

const FLAGS: [&str; 7] = [
    "sortable",
    "searchable",
    "toggleable",
    "stickable",
    "visible",
    "hidden",
    "wrap",
];

fn is_flag(name: &str) -> bool {
    FLAGS.contains(&name)
}

fn flag_value(name: &str, value: &Value) -> Result<bool, ConfigError> {
    match value {
        Value::Null => Ok(true),
        Value::Bool(b) => Ok(*b),
        _ => Err(invalid(name, "a boolean")),
    }
}

fn string_value(name: &str, value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(name, "a string"))
}

fn invalid(option: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidOptionValue {
        option: option.to_string(),
        expected,
    }
}

/// Format a stored date or datetime; `None` if unparsable or the format fails.
fn format_date(text: &str, format: &str) -> Option<String> {
    let datetime = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0)))?;

    let mut out = String::new();
    write!(out, "{}", datetime.format(format)).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DECORATION_KEY;
    use serde_json::json;

    fn transform(column: &Column, input: &Record) -> Value {
        let mut output = OutputRecord::new();
        column.transform(input, &mut output);
        output.to_value()
    }

    #[test]
    fn test_default_descriptor() {
        assert_eq!(
            Column::text("first_name").descriptor(),
            json!({
                "name": "first_name",
                "type": "TextColumn",
                "header": "First Name",
                "width": "auto",
                "visible": true,
                "options": {
                    "sortable": false,
                    "toggleable": true,
                    "stickable": false,
                    "headerAlignment": "justify-start",
                    "alignment": "justify-start",
                    "wrap": false,
                    "truncate": 1,
                    "headerClass": null,
                    "cellClass": null,
                }
            })
        );
    }

    #[test]
    fn test_alias_is_name_but_not_storage_key() {
        let column = Column::text("email_address").alias("email").header("E-mail");
        let data = column.descriptor();
        assert_eq!(data["name"], "email");
        assert_eq!(data["header"], "E-mail");

        let row = transform(&column, &Record::from_json(json!({"email_address": "a@b.c"})));
        assert_eq!(row, json!({"email_address": "a@b.c"}));
    }

    #[test]
    fn test_option_setters() {
        let data = Column::text("name")
            .sortable()
            .stickable()
            .wrap()
            .right_aligned()
            .width("200px")
            .cell_class("font-bold")
            .descriptor();
        let options = &data["options"];
        assert_eq!(options["sortable"], true);
        assert_eq!(options["stickable"], true);
        assert_eq!(options["wrap"], true);
        assert_eq!(options["truncate"], 0);
        assert_eq!(options["alignment"], "justify-end");
        assert_eq!(options["headerAlignment"], "justify-end");
        assert_eq!(options["cellClass"], "font-bold");
        assert_eq!(data["width"], "200px");

        let data = Column::text("name").wrap().truncate(3).descriptor();
        assert_eq!(data["options"]["wrap"], false);
        assert_eq!(data["options"]["truncate"], 3);
    }

    #[test]
    fn test_visibility_respects_toggleable() {
        assert!(!Column::text("name").hidden().is_visible());
        assert!(Column::text("name").not_toggleable().hidden().is_visible());
        assert!(Column::text("name").hidden().not_toggleable().is_visible());
    }

    #[test]
    fn test_set_option() {
        let column = Column::text("name")
            .set_option("sortable", &json!(true))
            .and_then(|c| c.set_option("not_toggleable", &Value::Null))
            .and_then(|c| c.set_option("width", &json!(120)))
            .and_then(|c| c.set_option("alignment", &json!("center")))
            .unwrap();
        let data = column.descriptor();
        assert_eq!(data["options"]["sortable"], true);
        assert_eq!(data["options"]["toggleable"], false);
        assert_eq!(data["options"]["alignment"], "justify-center");
        assert_eq!(data["width"], "120px");
    }

    #[test]
    fn test_set_unknown_option_fails() {
        let err = Column::text("name").set_option("sortible", &json!(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Option [sortible] doesn't exist on TextColumn 'name'"
        );

        assert!(matches!(
            Column::text("name").set_option("format", &json!("%d")),
            Err(ConfigError::UnknownOption { .. })
        ));
        assert!(matches!(
            Column::text("name").set_option("sortable", &json!("yes")),
            Err(ConfigError::InvalidOptionValue { .. })
        ));
    }

    #[test]
    fn test_lookup_mapping() {
        let column = Column::text("status").map_values([("active", "Active")]);
        let row = transform(&column, &Record::from_json(json!({"status": "active"})));
        assert_eq!(row["status"], "Active");

        let row = transform(&column, &Record::from_json(json!({"status": "pending"})));
        assert_eq!(row["status"], "pending");
    }

    #[test]
    fn test_mapping_then_icon_keeps_mapped_value() {
        let column = Column::text("status")
            .map_values([("active", "Active")])
            .icon(DecoratorRule::lookup([("active", "check")]));
        let row = transform(&column, &Record::from_json(json!({"status": "active"})));

        assert_eq!(row["status"], "Active");
        assert_eq!(row[DECORATION_KEY]["status"]["icon"]["name"], "check");
    }

    #[test]
    fn test_link_and_image_decorations() {
        let column = Column::text("name")
            .link(LinkRule::url("/users/{id}"))
            .image_decorator(DecoratorRule::Fixed(Image::new("/avatar.png").rounded()));
        let row = transform(&column, &Record::from_json(json!({"id": 3, "name": "Ada"})));

        assert_eq!(row["name"], "Ada");
        assert_eq!(row[DECORATION_KEY]["name"]["link"], json!({"href": "/users/3"}));
        assert_eq!(row[DECORATION_KEY]["name"]["image"]["src"], "/avatar.png");
    }

    #[test]
    fn test_computed_field_is_appended() {
        let column = Column::text("full_name");
        let input = Record::from_json(json!({"id": 1})).with_computed("full_name", "Ada Lovelace");
        let row = transform(&column, &input);
        assert_eq!(row["full_name"], "Ada Lovelace");
    }

    #[test]
    fn test_badge_variant() {
        let column = Column::badge("status").variant(DecoratorRule::lookup([
            ("active", Variant::Green),
            ("banned", Variant::Red),
        ]));
        let row = transform(&column, &Record::from_json(json!({"status": "banned"})));
        assert_eq!(row[DECORATION_KEY]["status"]["variant"], "red");

        let row = transform(&column, &Record::from_json(json!({"status": "pending"})));
        assert_eq!(row[DECORATION_KEY]["status"]["variant"], "default");
    }

    #[test]
    fn test_boolean_column() {
        let mut column = Column::boolean("active");
        column.inherit(&TableDefaults::default());

        let row = transform(&column, &Record::from_json(json!({"active": 1})));
        assert_eq!(row["active"], true);
        let row = transform(&column, &Record::from_json(json!({"active": "0"})));
        assert_eq!(row["active"], false);
        let row = transform(&column, &Record::from_json(json!({"active": null})));
        assert_eq!(row["active"], Value::Null);

        let data = column.descriptor();
        assert_eq!(data["type"], "BooleanColumn");
        assert_eq!(data["options"]["trueLabel"], "True");
        assert_eq!(data["options"]["falseIcon"], Value::Null);
    }

    #[test]
    fn test_date_column_formats() {
        let mut column = Column::date("created_at");
        column.inherit(&TableDefaults::default());
        let row = transform(&column, &Record::from_json(json!({"created_at": "2024-03-05 10:20:30"})));
        assert_eq!(row["created_at"], "2024-03-05");

        let column = Column::date("created_at").format("%d/%m/%Y");
        let row = transform(&column, &Record::from_json(json!({"created_at": "2024-03-05T10:20:30Z"})));
        assert_eq!(row["created_at"], "05/03/2024");

        let row = transform(&column, &Record::from_json(json!({"created_at": "soon"})));
        assert_eq!(row["created_at"], "soon");
    }

    #[test]
    fn test_image_column_uses_own_field() {
        let column = Column::image("avatar");
        let row = transform(&column, &Record::from_json(json!({"avatar": "/a.png"})));
        let image = &row[DECORATION_KEY]["avatar"]["image"];
        assert_eq!(image["src"], "/a.png");
        assert_eq!(image["class"], "size-12 rounded-md");
        assert_eq!(column.descriptor()["type"], "ImageColumn");
    }
}
