//! Wire types for the panel fetch endpoint.

use serde::{Deserialize, Serialize};

/// Protocol version sent with every fetch.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Button metadata that marks a button as closing the panel.
pub const CLOSE_BUTTON_META: &str = "closebutton";

/// Path segments of the fetch endpoint. The token is always one segment.
pub fn fetch_path(token: &str) -> [&str; 4] {
    ["panels", "v1", "fetch", token]
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PanelRequest {
    pub version: String,
    pub platform: i32,
}

impl PanelRequest {
    pub fn new(platform: i32) -> Self {
        PanelRequest {
            version: PROTOCOL_VERSION.to_string(),
            platform,
        }
    }
}

/// Top-level document returned by the fetch endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub hash: String,
    pub token: String,
    pub name: String,
    pub platform: i32,
    pub last_updated: String,
    /// Only the first variant is rendered today.
    pub panels: Vec<PanelVariant>,
}

impl Panel {
    pub fn primary_variant(&self) -> Option<&PanelVariant> {
        self.panels.first()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PanelVariant {
    pub name: String,
    /// JSON text of the content document, decoded separately by
    /// [`crate::content::decode`].
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub panel_type: i32,
    #[serde(default)]
    pub display_type: i32,
    #[serde(default)]
    pub buttons: Vec<PanelButton>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PanelButton {
    pub text: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub style: ButtonStyle,
}

impl PanelButton {
    pub fn is_close(&self) -> bool {
        self.meta == CLOSE_BUTTON_META
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(from = "Option<String>", into = "String")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    /// Anything else, including a missing style.
    #[default]
    Bordered,
}

impl From<Option<String>> for ButtonStyle {
    fn from(style: Option<String>) -> Self {
        match style.as_deref() {
            Some("primary") => ButtonStyle::Primary,
            Some("secondary") => ButtonStyle::Secondary,
            _ => ButtonStyle::Bordered,
        }
    }
}

impl From<ButtonStyle> for String {
    fn from(style: ButtonStyle) -> Self {
        match style {
            ButtonStyle::Primary => "primary",
            ButtonStyle::Secondary => "secondary",
            ButtonStyle::Bordered => "bordered",
        }
        .to_string()
    }
}
