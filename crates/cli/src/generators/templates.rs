pub const MIGRATION_TEMPLATE: &str = r#"use inkpost_db::{async_trait, AnyConnection, Migration};

/// {{ description }}
pub struct {{ struct_name }};

#[async_trait]
impl Migration for {{ struct_name }} {
    fn id(&self) -> &str {
        // Do not edit the migration ID
        "{{ id }}"
    }

    fn description(&self) -> &str {
        {{ description_literal }}
    }

    async fn up(&self, _conn: &mut AnyConnection) -> anyhow::Result<()> {
        // TODO: implement the schema change
        Ok(())
    }

    async fn down(&self, _conn: &mut AnyConnection) -> anyhow::Result<()> {
        // TODO: revert exactly what `up` does
        Ok(())
    }
}
"#;
