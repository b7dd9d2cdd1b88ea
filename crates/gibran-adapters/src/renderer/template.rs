//! Tera-backed broker renderer.
//!
//! The default template emits a valid Go file: a generated-code header, the
//! package clause, every import as a blank import, and the package summary
//! as comments. Nothing time-dependent is rendered, so unchanged input
//! gives byte-identical output.

use std::error::Error as _;
use std::fs;
use std::path::Path;

use gibran_core::{
    application::{ApplicationError, ports::BrokerRenderer},
    domain::BrokerView,
    error::GibranResult,
};
use tera::{Context, Tera};
use tracing::instrument;

use crate::filesystem::map_io_error;

const TEMPLATE_NAME: &str = "broker.go";

pub const DEFAULT_BROKER_TEMPLATE: &str = r#"// Code generated by {{ generator }}. DO NOT EDIT.
// Source: {{ source_path }}
// Import path: {{ import_path }}

package {{ package_name }}
{% if imports %}
import (
{%- for entry in imports %}
	_ "{{ entry.path }}"{% if entry.aliases %} // as {{ entry.aliases | join(sep=", ") }}{% endif %}
{%- endfor %}
)
{% endif %}
// Definitions:
{%- if definitions %}
{%- for definition in definitions %}
//	{{ definition.kind }} {% if definition.receiver %}({{ definition.receiver }}) {% endif %}{{ definition.name }} at {{ definition.location }}
{%- endfor %}
{%- else %}
//	(none)
{%- endif %}

// Uses:
{%- if use_groups %}
{%- for group in use_groups %}
//	{{ group.package }} "{{ group.import_path }}"{% if not group.resolved %} (unresolved){% endif %}
{%- for usage in group.uses %}
//		{% if usage.qualifier %}{{ usage.qualifier }}.{% endif %}{{ usage.name }} at {{ usage.location }}
{%- endfor %}
{%- endfor %}
{%- else %}
//	(none)
{%- endif %}
{%- if unresolved_imports %}

// Unresolved imports:
{%- for path in unresolved_imports %}
//	"{{ path }}"
{%- endfor %}
{%- endif %}
"#;

/// Renders [`BrokerView`]s through one Tera template.
///
/// Template compile errors are kept and reported on every render, so a
/// broken override fails each package on its own instead of the whole run.
pub struct TeraBrokerRenderer {
    tera: Result<Tera, String>,
}

impl TeraBrokerRenderer {
    pub fn new() -> Self {
        Self::from_source(DEFAULT_BROKER_TEMPLATE)
    }

    pub fn from_source(source: &str) -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        let tera = match tera.add_raw_template(TEMPLATE_NAME, source) {
            Ok(()) => Ok(tera),
            Err(e) => Err(describe(&e)),
        };
        Self { tera }
    }

    /// Load a template override from disk.
    pub fn from_file(path: &Path) -> GibranResult<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| map_io_error(path, e, "read broker template"))?;
        Ok(Self::from_source(&source))
    }
}

impl Default for TeraBrokerRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerRenderer for TeraBrokerRenderer {
    #[instrument(skip_all, fields(package = %view.package_name))]
    fn render(&self, view: &BrokerView) -> GibranResult<String> {
        let tera = self.tera.as_ref().map_err(|reason| failed(reason.clone()))?;
        let context = Context::from_serialize(view).map_err(|e| failed(describe(&e)))?;
        tera.render(TEMPLATE_NAME, &context)
            .map_err(|e| failed(describe(&e)))
    }
}

fn failed(reason: String) -> gibran_core::error::GibranError {
    ApplicationError::RenderingFailed { reason }.into()
}

/// Tera puts the useful part of an error in its source chain.
fn describe(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
