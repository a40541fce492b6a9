//! Command handlers; each returns the text to emit

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use blueprint_builder::{PropertyDefinition, SchemaBuilder};
use blueprint_schema::traversal::paths;
use blueprint_schema::{SchemaLoader, SchemaNode, SchemaPath, to_json};
use blueprint_selector::{SourceMapping, SubschemaSelector};
use blueprint_session::{BuilderSession, SelectorSession};
use serde::Serialize;
use tracing::{info, warn};

/// Flags shared by every command after merging the config file
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub pretty: bool,
    pub normalize: bool,
}

fn load(schema: &Path, options: &Options) -> anyhow::Result<SchemaNode> {
    SchemaLoader::new()
        .with_normalization(options.normalize)
        .load_from_file(schema)
        .with_context(|| format!("failed to load schema '{}'", schema.display()))
}

fn parse_path(text: &str) -> anyhow::Result<SchemaPath> {
    SchemaPath::parse(text).with_context(|| format!("invalid path '{text}'"))
}

fn parse_definition(text: &str) -> anyhow::Result<SchemaNode> {
    serde_json::from_str(text).context("invalid --definition, expected a JSON Schema object")
}

fn render<T: Serialize>(value: &T, options: &Options) -> anyhow::Result<String> {
    let text = if options.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn render_schema(schema: &SchemaNode, options: &Options) -> anyhow::Result<String> {
    Ok(to_json(schema, options.pretty)?)
}

pub fn show(schema: &Path, options: &Options) -> anyhow::Result<String> {
    render_schema(&load(schema, options)?, options)
}

pub fn validate(schema: &Path, options: &Options) -> anyhow::Result<String> {
    let node = load(schema, options)?;
    let count = paths(&node).len();
    info!("Schema '{}' is valid", schema.display());
    Ok(format!("{}: valid ({count} properties)", schema.display()))
}

/// Run one builder edit through a session and render the result.
fn edit<F>(schema: &Path, options: &Options, op: F) -> anyhow::Result<String>
where
    F: FnOnce(&mut SchemaBuilder) -> blueprint_schema::Result<()>,
{
    let builder = SchemaBuilder::from_schema(load(schema, options)?)?;
    let mut session = BuilderSession::bind(builder);
    let snapshot = session.apply(op)?;
    if !snapshot.is_dirty {
        info!("Edit left '{}' unchanged", schema.display());
    }
    render_schema(&snapshot.value, options)
}

pub fn add(
    schema: &Path,
    path: &str,
    definition: &str,
    after: Option<&str>,
    required: bool,
    options: &Options,
) -> anyhow::Result<String> {
    let path = parse_path(path)?;
    let definition = PropertyDefinition::new(parse_definition(definition)?).required(required);
    edit(schema, options, |builder| {
        builder.add_property(&path, definition, after).map(|_| ())
    })
}

pub fn update(
    schema: &Path,
    path: &str,
    definition: &str,
    rename: Option<String>,
    required: Option<bool>,
    options: &Options,
) -> anyhow::Result<String> {
    let path = parse_path(path)?;
    let mut definition = PropertyDefinition::new(parse_definition(definition)?);
    definition.required = required;
    definition.rename = rename;
    edit(schema, options, |builder| {
        let target = builder.property(&path)?;
        builder.update_property(&target, definition).map(|_| ())
    })
}

pub fn remove(schema: &Path, path: &str, options: &Options) -> anyhow::Result<String> {
    let path = parse_path(path)?;
    edit(schema, options, |builder| {
        builder.remove_property(&path).map(|_| ())
    })
}

pub fn select(
    schema: &Path,
    selections: &[String],
    all: bool,
    mapping: Option<&Path>,
    options: &Options,
) -> anyhow::Result<String> {
    let target = load(schema, options)?;
    let paths = selections
        .iter()
        .map(|text| parse_path(text))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut source = match mapping {
        Some(file) => Some(read_mapping(file)?),
        None => None,
    };
    let selector = match &source {
        Some(source) => SubschemaSelector::with_seed(target, &source.seed_selection()),
        None => SubschemaSelector::new(target),
    };

    let mut session = SelectorSession::bind(selector);
    session.apply(|selector| {
        if all {
            selector.select_all();
        }
        for path in &paths {
            selector.select(path)?;
        }
        Ok(())
    })?;

    let selection = session.selection();
    match source.as_mut() {
        Some(source) => {
            if !session.can_save() {
                warn!("Selection unchanged, mapping left as seeded");
            } else if source.apply_selection(&selection) {
                info!("Mapping updated to target '{}'", source.target_path);
            }
            render(&*source, options)
        }
        None => render(&selection, options),
    }
}

fn read_mapping(file: &Path) -> anyhow::Result<SourceMapping> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read mapping '{}'", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid mapping '{}'", file.display()))
}

pub fn write_output(output: Option<&Path>, rendered: &str) -> anyhow::Result<()> {
    match output {
        Some(file) => {
            if file.is_dir() {
                bail!("output '{}' is a directory", file.display());
            }
            fs::write(file, format!("{rendered}\n"))
                .with_context(|| format!("failed to write '{}'", file.display()))
        }
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
