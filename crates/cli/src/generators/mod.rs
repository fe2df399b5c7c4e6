pub mod templates;

use anyhow::Context as _;
use tera::{Context, Tera};

pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();

        // Register built-in templates
        tera.add_raw_template("migration", templates::MIGRATION_TEMPLATE)
            .context("failed to register migration template")?;
        // Generated files are Rust source, not HTML
        tera.autoescape_on(vec![]);

        Ok(TemplateEngine { tera })
    }

    pub fn render_with_context(&self, template: &str, context: &Context) -> anyhow::Result<String> {
        self.tera
            .render(template, context)
            .with_context(|| format!("failed to render template '{}'", template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_template_renders_without_escaping() {
        let engine = TemplateEngine::new().unwrap();
        let mut context = Context::new();
        context.insert("id", "20250401_090000");
        context.insert("struct_name", "M20250401090000");
        context.insert("description", "add <comments> & tags");
        context.insert("description_literal", &format!("{:?}", "add <comments> & tags"));

        let rendered = engine.render_with_context("migration", &context).unwrap();

        assert!(rendered.contains("pub struct M20250401090000;"));
        assert!(rendered.contains("\"20250401_090000\""));
        assert!(rendered.contains("add <comments> & tags"));
    }
}
