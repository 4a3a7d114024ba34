//! Presentation values attached to cells and headers: icons, images, badge
//! variants, alignment.

use serde::Serialize;
use serde_json::{Map, Value};

/// Where a decoration sits relative to the cell text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Start,
    End,
}

/// Cell and header content alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const fn class(self) -> &'static str {
        match self {
            Alignment::Left => "justify-start",
            Alignment::Center => "justify-center",
            Alignment::Right => "justify-end",
        }
    }

    /// Accepts `left|center|right` as well as the wire classes.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" | "start" | "justify-start" => Some(Alignment::Left),
            "center" | "justify-center" => Some(Alignment::Center),
            "right" | "end" | "justify-end" => Some(Alignment::Right),
            _ => None,
        }
    }
}

impl Serialize for Alignment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.class())
    }
}

/// Badge colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Default,
    Red,
    Yellow,
    Green,
    Blue,
    Indigo,
    Purple,
    Pink,
}

impl Variant {
    pub const ALL: [Variant; 8] = [
        Variant::Default,
        Variant::Red,
        Variant::Yellow,
        Variant::Green,
        Variant::Blue,
        Variant::Indigo,
        Variant::Purple,
        Variant::Pink,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Variant::Default => "default",
            Variant::Red => "red",
            Variant::Yellow => "yellow",
            Variant::Green => "green",
            Variant::Blue => "blue",
            Variant::Indigo => "indigo",
            Variant::Purple => "purple",
            Variant::Pink => "pink",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Variant::ALL.iter().copied().find(|v| v.as_str() == value)
    }
}

/// Size of a decoration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl Size {
    fn icon_class(self) -> &'static str {
        match self {
            Size::Small => "size-2",
            Size::Medium => "size-4",
            Size::Large => "size-6",
            Size::ExtraLarge => "size-8",
        }
    }

    fn image_class(self) -> &'static str {
        match self {
            Size::Small => "size-6",
            Size::Medium => "size-8",
            Size::Large => "size-10",
            Size::ExtraLarge => "size-12",
        }
    }
}

/// An icon shown next to a cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Icon {
    name: String,
    size: Size,
    position: Position,
    class: Option<String>,
    style: Option<String>,
    alt: Option<String>,
    title: Option<String>,
}

impl Icon {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Extra CSS classes, appended after the size class.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn to_json(&self) -> Value {
        appearance_json(
            ("name", &self.name),
            self.size.icon_class(),
            self.class.as_deref(),
            self.style.as_deref(),
            self.alt.as_deref().unwrap_or("Icon"),
            self.title.as_deref(),
            self.position,
        )
    }
}

impl From<&str> for Icon {
    fn from(name: &str) -> Self {
        Icon::new(name)
    }
}

impl From<String> for Icon {
    fn from(name: String) -> Self {
        Icon::new(name)
    }
}

/// An image shown next to (or instead of) a cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    src: String,
    size: Size,
    position: Position,
    rounded: bool,
    class: Option<String>,
    style: Option<String>,
    alt: Option<String>,
    title: Option<String>,
}

impl Image {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub(crate) fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn rounded(mut self) -> Self {
        self.rounded = true;
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn to_json(&self) -> Value {
        let extra = match (self.rounded, self.class.as_deref()) {
            (true, Some(class)) => Some(format!("rounded-full {class}")),
            (true, None) => Some("rounded-full".to_string()),
            (false, class) => class.map(str::to_string),
        };
        appearance_json(
            ("src", &self.src),
            self.size.image_class(),
            extra.as_deref(),
            self.style.as_deref(),
            self.alt.as_deref().unwrap_or("Image"),
            self.title.as_deref(),
            self.position,
        )
    }
}

impl From<&str> for Image {
    fn from(src: &str) -> Self {
        Image::new(src)
    }
}

impl From<String> for Image {
    fn from(src: String) -> Self {
        Image::new(src)
    }
}

fn appearance_json(
    (key, target): (&str, &str),
    size_class: &str,
    class: Option<&str>,
    style: Option<&str>,
    alt: &str,
    title: Option<&str>,
    position: Position,
) -> Value {
    let class = match class {
        Some(extra) if !extra.is_empty() => format!("{size_class} {extra}"),
        _ => size_class.to_string(),
    };

    let mut out = Map::new();
    out.insert(key.to_string(), Value::from(target));
    out.insert("class".into(), Value::from(class));
    out.insert("style".into(), style.map_or(Value::Null, Value::from));
    out.insert("alt".into(), Value::from(alt));
    out.insert("title".into(), title.map_or(Value::Null, Value::from));
    out.insert(
        "position".into(),
        Value::from(match position {
            Position::Start => "start",
            Position::End => "end",
        }),
    );
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_icon_defaults() {
        assert_eq!(
            Icon::new("check").to_json(),
            json!({
                "name": "check",
                "class": "size-4",
                "style": null,
                "alt": "Icon",
                "title": null,
                "position": "start",
            })
        );
    }

    #[test]
    fn test_icon_customized() {
        let icon = Icon::new("x")
            .size(Size::ExtraLarge)
            .class("text-red-500")
            .position(Position::End)
            .title("Inactive");
        let data = icon.to_json();
        assert_eq!(data["class"], "size-8 text-red-500");
        assert_eq!(data["position"], "end");
        assert_eq!(data["title"], "Inactive");
    }

    #[test]
    fn test_image_sizes_and_rounding() {
        let data = Image::new("/a.png").to_json();
        assert_eq!(data["src"], "/a.png");
        assert_eq!(data["class"], "size-8");
        assert_eq!(data["alt"], "Image");

        let data = Image::new("/a.png")
            .size(Size::Small)
            .rounded()
            .class("ring")
            .to_json();
        assert_eq!(data["class"], "size-6 rounded-full ring");
    }

    #[test]
    fn test_alignment_and_variant_parse() {
        assert_eq!(Alignment::parse("center"), Some(Alignment::Center));
        assert_eq!(Alignment::parse("justify-end"), Some(Alignment::Right));
        assert_eq!(Alignment::parse("middle"), None);
        assert_eq!(serde_json::to_value(Alignment::Right).unwrap(), json!("justify-end"));

        assert_eq!(Variant::parse("green"), Some(Variant::Green));
        assert_eq!(Variant::parse("teal"), None);
    }
}
