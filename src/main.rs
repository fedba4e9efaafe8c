use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relmodel::config::{self, ModelBuildConfig};
use relmodel::metadata::{ConfigurationSource, ModelDefinition, ReadOnlyModel};
use relmodel::query::{
    translate_member_path, MemberTranslatorChain, SqlServerTypeMappingSource, ToSql,
};

/// relmodel - build a relational model from YAML and translate spatial members to T-SQL
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model definition (YAML)
    definition: PathBuf,

    /// Build settings file (YAML); overrides RELMODEL_* environment variables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Configuration source recorded for definition entries
    #[arg(long)]
    default_source: Option<ConfigurationSource>,

    /// Store type for spatial properties without one (geometry or geography)
    #[arg(long)]
    spatial_store_type: Option<String>,

    /// Allow root entity types without a primary key
    #[arg(long)]
    no_validate: bool,

    /// Maximum nesting of owned types
    #[arg(long)]
    max_ownership_depth: Option<u32>,

    /// Run the model-built conventions before printing
    #[arg(long)]
    finalize: bool,

    /// Member path to translate, e.g. Parcel.Boundary.ExteriorRing (repeatable)
    #[arg(long = "translate", value_name = "PATH")]
    translate: Vec<String>,
}

impl Cli {
    /// Command line values win over `base`
    fn to_cli_config(&self, base: &ModelBuildConfig) -> config::CliConfig {
        config::CliConfig {
            default_configuration_source: self
                .default_source
                .unwrap_or(base.default_configuration_source),
            default_spatial_store_type: self
                .spatial_store_type
                .clone()
                .unwrap_or_else(|| base.default_spatial_store_type.clone()),
            validate_on_finalize: base.validate_on_finalize && !self.no_validate,
            max_ownership_depth: self.max_ownership_depth.unwrap_or(base.max_ownership_depth),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ModelBuildConfig> {
    let mut config = ModelBuildConfig::from_env().context("Invalid RELMODEL_* environment")?;
    if let Some(path) = &cli.config {
        config
            .merge_yaml_file(path)
            .with_context(|| format!("Invalid build settings in {}", path.display()))?;
    }
    Ok(ModelBuildConfig::from_cli(cli.to_cli_config(&config))?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    log::debug!("Build settings: {:?}", config);

    let definition = ModelDefinition::from_yaml_file(&cli.definition)?;
    let model = definition
        .build(&config)
        .with_context(|| format!("Failed to build model from {}", cli.definition.display()))?;

    let type_mapping_source = Arc::new(SqlServerTypeMappingSource::new());
    let translators = MemberTranslatorChain::sql_server_spatial(type_mapping_source.clone());
    let translate = |model: &dyn ReadOnlyModel, path: &str| -> anyhow::Result<String> {
        let expression =
            translate_member_path(model, path, type_mapping_source.as_ref(), &translators)?;
        Ok(expression.to_sql()?)
    };

    let mut translated = Vec::with_capacity(cli.translate.len());
    if cli.finalize {
        let Some(finalized) = model.finalize_model()? else {
            anyhow::bail!("The model was rejected by a convention");
        };
        print!("{}", finalized.to_debug_string());
        for path in &cli.translate {
            translated.push((path, translate(&finalized, path)?));
        }
    } else {
        print!("{}", model);
        for path in &cli.translate {
            translated.push((path, translate(&model, path)?));
        }
    }

    for (path, sql) in translated {
        println!("{} => {}", path, sql);
    }
    Ok(())
}

fn main() {
    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
