// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power BI matrix data view model.
//!
//! Mirrors the JSON shape the host delivers in `VisualUpdateOptions`. Only the
//! parts the visual reads are modelled: the row hierarchy, its level roles and
//! the measure columns (`valueSources`).
//!
//! ```text
//! root
//! └── stream            (role: stream)
//!     └── parent object (role: parentObject)
//!         └── [color]   (role: objectColorBy, optional)
//!             └── object (role: object, carries measure `values`)
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Data roles declared by the visual's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Stream,
    ParentObject,
    ObjectColorBy,
    Object,
}

impl Role {
    /// Role name as it appears in `source.roles`.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Stream => "stream",
            Role::ParentObject => "parentObject",
            Role::ObjectColorBy => "objectColorBy",
            Role::Object => "object",
        }
    }

    /// Field name shown to report authors in the data pane.
    pub fn input_name(self) -> &'static str {
        match self {
            Role::Stream => "Stream ID",
            Role::ParentObject => "Commit Object ID",
            Role::ObjectColorBy => "Object Color By",
            Role::Object => "Object ID",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar value carried by matrix nodes and measure cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimitiveValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Bool(b) => write!(f, "{}", b),
            // Integral numbers print without a fractional part, like JS toString()
            PrimitiveValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            PrimitiveValue::Number(n) => write!(f, "{}", n),
            PrimitiveValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::Text(value.to_string())
    }
}

impl From<f64> for PrimitiveValue {
    fn from(value: f64) -> Self {
        PrimitiveValue::Number(value)
    }
}

/// Cross-highlight marker of a measure cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Highlight<'a> {
    /// No highlight key: the report has no active cross-filter.
    Absent,
    /// Explicit `null`: the row is filtered out by the active highlight.
    Null,
    /// Concrete value: the row is part of the active highlight.
    Value(&'a PrimitiveValue),
}

/// Deserialize a field that distinguishes "missing" from `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// A measure cell attached to a leaf node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixNodeValue {
    #[serde(default)]
    pub value: Option<PrimitiveValue>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub highlight: Option<Option<PrimitiveValue>>,
}

impl MatrixNodeValue {
    /// Cell without a highlight column.
    pub fn plain(value: impl Into<PrimitiveValue>) -> Self {
        Self {
            value: Some(value.into()),
            highlight: None,
        }
    }

    /// Cell with a highlight column; `None` is the explicit `null` marker.
    pub fn highlighted(value: impl Into<PrimitiveValue>, highlight: Option<PrimitiveValue>) -> Self {
        Self {
            value: Some(value.into()),
            highlight: Some(highlight),
        }
    }

    pub fn highlight(&self) -> Highlight<'_> {
        match &self.highlight {
            None => Highlight::Absent,
            Some(None) => Highlight::Null,
            Some(Some(v)) => Highlight::Value(v),
        }
    }
}

/// A node of the row hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixNode {
    #[serde(default)]
    pub value: Option<PrimitiveValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MatrixNode>>,
    /// Measure cells keyed by `valueSources` index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<usize, MatrixNodeValue>>,
}

impl MatrixNode {
    pub fn new(value: impl Into<PrimitiveValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<MatrixNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn with_values(mut self, values: impl IntoIterator<Item = (usize, MatrixNodeValue)>) -> Self {
        self.values = Some(values.into_iter().collect());
        self
    }

    /// Children, or an empty slice for leaves.
    pub fn children(&self) -> &[MatrixNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Node value rendered as an identifier.
    pub fn value_string(&self) -> Option<String> {
        self.value.as_ref().map(|v| v.to_string())
    }
}

/// Column metadata for one entry of a hierarchy level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSource {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub roles: FxHashMap<String, bool>,
}

impl LevelSource {
    pub fn with_role(role: Role) -> Self {
        let mut roles = FxHashMap::default();
        roles.insert(role.as_str().to_string(), true);
        Self {
            display_name: role.input_name().to_string(),
            roles,
        }
    }

    /// A role counts as bound when its key is present, whatever its value.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains_key(role.as_str())
    }
}

/// One level of the row hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixLevel {
    #[serde(default)]
    pub sources: Vec<LevelSource>,
}

impl MatrixLevel {
    pub fn for_role(role: Role) -> Self {
        Self {
            sources: vec![LevelSource::with_role(role)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixHierarchy {
    #[serde(default)]
    pub root: MatrixNode,
    #[serde(default)]
    pub levels: Vec<MatrixLevel>,
}

/// Measure column metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSource {
    #[serde(default)]
    pub display_name: String,
}

impl ValueSource {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// The matrix data view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixView {
    pub rows: MatrixHierarchy,
    #[serde(default)]
    pub value_sources: Vec<ValueSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataViewMetadata {
    /// Formatting card values, keyed by card name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixView>,
    #[serde(default)]
    pub metadata: DataViewMetadata,
}

/// Update kind bit flags as sent by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualUpdateType(pub u32);

impl VisualUpdateType {
    pub const DATA: Self = Self(2);
    pub const RESIZE: Self = Self(4);
    pub const VIEW_MODE: Self = Self(8);
    pub const STYLE: Self = Self(16);
    pub const RESIZE_END: Self = Self(32);
    pub const ALL: Self = Self(62);

    /// Updates the visual ignores: the viewer handles layout changes itself.
    pub fn is_layout_only(self) -> bool {
        const RESIZE_AND_END: u32 = VisualUpdateType::RESIZE.0 + VisualUpdateType::RESIZE_END.0;
        matches!(self.0, 4 | 8 | 16 | 32 | RESIZE_AND_END)
    }
}

impl Default for VisualUpdateType {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for VisualUpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            2 => f.write_str("Data"),
            4 => f.write_str("Resize"),
            8 => f.write_str("ViewMode"),
            16 => f.write_str("Style"),
            32 => f.write_str("ResizeEnd"),
            36 => f.write_str("Resize+ResizeEnd"),
            62 => f.write_str("All"),
            other => write!(f, "Unknown({})", other),
        }
    }
}

/// Arguments of one host `update` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualUpdateOptions {
    #[serde(rename = "type", default)]
    pub update_type: VisualUpdateType,
    #[serde(default)]
    pub data_views: Vec<DataView>,
}

impl VisualUpdateOptions {
    /// Data update carrying a single matrix view.
    pub fn data(matrix: MatrixView) -> Self {
        Self {
            update_type: VisualUpdateType::DATA,
            data_views: vec![DataView {
                matrix: Some(matrix),
                metadata: DataViewMetadata::default(),
            }],
        }
    }

    pub fn first_view(&self) -> Option<&DataView> {
        self.data_views.first()
    }

    /// Formatting objects of the first data view.
    pub fn objects(&self) -> Option<&serde_json::Value> {
        self.first_view().and_then(|v| v.metadata.objects.as_ref())
    }
}
