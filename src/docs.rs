//! Documentation endpoints: the machine-readable document in JSON and YAML,
//! and a human-readable HTML page embedding Redoc or Swagger UI.
//!
//! These render to plain strings and stay transport-neutral; the host mounts
//! them at the paths named in [`Config`](crate::config::Config).

use anyhow::Context;
use minijinja::Environment;
use serde_json::{json, Value};

use crate::config::{DocsConfig, DocsProvider};

const REDOC_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ title }}</title>
    {% if description %}<meta name="description" content="{{ description }}" />{% endif %}
    {% if favicon_url %}<link rel="icon" href="{{ favicon_url }}" />{% endif %}
    <style>body { margin: 0; padding: 0; }</style>
  </head>
  <body>
    {% if logo_url %}<img src="{{ logo_url }}" alt="{{ title }}" style="max-height: 48px; margin: 8px;" />{% endif %}
    <redoc spec-url="{{ spec_url }}"></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
  </body>
</html>
"#;

// `r##` because the inline script contains a `"#` sequence (`dom_id: "#swagger-ui"`).
const SWAGGER_UI_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ title }}</title>
    {% if description %}<meta name="description" content="{{ description }}" />{% endif %}
    {% if favicon_url %}<link rel="icon" href="{{ favicon_url }}" />{% endif %}
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist/swagger-ui.css" />
  </head>
  <body>
    {% if logo_url %}<img src="{{ logo_url }}" alt="{{ title }}" style="max-height: 48px; margin: 8px;" />{% endif %}
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist/swagger-ui-bundle.js"></script>
    <script>
      window.onload = () => {
        SwaggerUIBundle({ url: "{{ spec_url }}", dom_id: "#swagger-ui" });
      };
    </script>
  </body>
</html>
"##;

/// Pretty-printed JSON rendering of the document, trailing newline included
/// so the served bytes match the persisted file exactly.
pub fn render_spec_json(document: &Value) -> anyhow::Result<String> {
    let mut rendered =
        serde_json::to_string_pretty(document).context("failed to render OpenAPI JSON")?;
    rendered.push('\n');
    Ok(rendered)
}

/// YAML rendering of the same document.
pub fn render_spec_yaml(document: &Value) -> anyhow::Result<String> {
    serde_yaml::to_string(document).context("failed to render OpenAPI YAML")
}

/// The docs HTML page for the configured provider, pointing at `spec_url`.
pub fn render_docs_html(config: &DocsConfig, spec_url: &str) -> anyhow::Result<String> {
    let source = match config.provider {
        DocsProvider::Redoc => REDOC_TEMPLATE,
        DocsProvider::SwaggerUi => SWAGGER_UI_TEMPLATE,
    };
    let mut env = Environment::new();
    // The `.html` name turns on HTML auto-escaping for the config-supplied
    // title, description, and URLs.
    env.add_template("docs.html", source)
        .context("invalid docs template")?;
    let template = env
        .get_template("docs.html")
        .context("missing docs template")?;
    template
        .render(json!({
            "title": config.title,
            "description": config.description,
            "favicon_url": config.favicon_url,
            "logo_url": config.logo_url,
            "spec_url": spec_url,
        }))
        .context("failed to render docs page")
}
