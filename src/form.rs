//! Settings form description handed to the host's form widgets.
use serde::Serialize;

use crate::config::{DEFAULT_IMAGE_HEIGHT, DEFAULT_MAX_FILES};
use crate::settings::{Settings, KEY_IMAGE_HEIGHT, KEY_MAX_FILES, KEY_PLUGIN_NAME};
use crate::strings::get_string;

/// Declared type of a form value.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Int,
    Text,
}

/// The subset of the host's form API the settings page needs.
pub trait FormBuilder {
    fn add_text(&mut self, name: &str, label: &str);
    fn add_static(&mut self, name: &str, text: &str);
    fn set_default(&mut self, name: &str, value: &str);
    fn set_type(&mut self, name: &str, kind: ParamType);
}

/// Adds the repository's settings fields, prefilled with `current`.
pub fn render_config_form(form: &mut dyn FormBuilder, current: &Settings) {
    form.add_text(KEY_PLUGIN_NAME, &get_string("pluginname", None));
    form.set_default(KEY_PLUGIN_NAME, &get_string("pluginname", None));
    form.set_type(KEY_PLUGIN_NAME, ParamType::Text);

    form.add_text(KEY_IMAGE_HEIGHT, &get_string("imageheight", None));
    form.set_default(KEY_IMAGE_HEIGHT, &current.image_height.to_string());
    form.set_type(KEY_IMAGE_HEIGHT, ParamType::Int);
    form.add_static(
        "stat1",
        &get_string("imageheight_help", Some(&DEFAULT_IMAGE_HEIGHT.to_string())),
    );

    form.add_text(KEY_MAX_FILES, &get_string("maxfiles", None));
    form.set_default(KEY_MAX_FILES, &current.max_files.to_string());
    form.set_type(KEY_MAX_FILES, ParamType::Int);
    form.add_static(
        "stat2",
        &get_string("maxfiles_help", Some(&DEFAULT_MAX_FILES.to_string())),
    );
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum FormElement {
    Text {
        name: String,
        label: String,
        default: Option<String>,
        kind: Option<ParamType>,
    },
    Static {
        name: String,
        text: String,
    },
}

/// [`FormBuilder`] that records the form as data, e.g. for JSON output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormSpec {
    pub elements: Vec<FormElement>,
}

impl FormSpec {
    fn text_mut(&mut self, name: &str) -> Option<(&mut Option<String>, &mut Option<ParamType>)> {
        self.elements.iter_mut().find_map(|el| match el {
            FormElement::Text {
                name: n,
                default,
                kind,
                ..
            } if *n == name => Some((default, kind)),
            _ => None,
        })
    }
}

impl FormBuilder for FormSpec {
    fn add_text(&mut self, name: &str, label: &str) {
        self.elements.push(FormElement::Text {
            name: name.to_string(),
            label: label.to_string(),
            default: None,
            kind: None,
        });
    }

    fn add_static(&mut self, name: &str, text: &str) {
        self.elements.push(FormElement::Static {
            name: name.to_string(),
            text: text.to_string(),
        });
    }

    fn set_default(&mut self, name: &str, value: &str) {
        if let Some((default, _)) = self.text_mut(name) {
            *default = Some(value.to_string());
        }
    }

    fn set_type(&mut self, name: &str, kind: ParamType) {
        if let Some((_, k)) = self.text_mut(name) {
            *k = Some(kind);
        }
    }
}
