use serde::Deserialize;

const DEFAULT_DESCRIPTION: &str = "Self explanatory as per column name";

/// A declared table: documentation only, never mapped onto real rows.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TableModel {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldModel>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FieldModel {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TableModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, data_type: Option<&str>, description: Option<&str>) -> Self {
        self.fields.push(FieldModel {
            name: name.to_string(),
            data_type: data_type.map(str::to_string),
            description: description.map(str::to_string),
        });
        self
    }
}

/// Renders declared models, one block per table followed by a blank line:
///
/// ```text
/// Table customer:
///     customer_name (String): Full name of the customer
/// ```
pub fn render_models(models: &[TableModel]) -> String {
    let mut out = String::new();
    for model in models {
        out.push_str(&format!("Table {}:\n", model.name));
        for field in &model.fields {
            let description = field.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
            match &field.data_type {
                Some(ty) => out.push_str(&format!("    {} ({}): {}\n", field.name, ty, description)),
                None => out.push_str(&format!("    {}: {}\n", field.name, description)),
            }
        }
        out.push('\n');
    }
    out
}
