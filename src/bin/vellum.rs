//! Command-line template renderer

use clap::Parser;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use vellum::TemplateEngine;
use vellum::engine::variables_from_json;
use vellum::rendering::FilesystemTemplates;

/// Render a template file to stdout
#[derive(Parser)]
#[command(name = "vellum", version, about)]
struct Cli {
    /// Template file to render
    template: PathBuf,

    /// JSON file with the variable map
    #[arg(short, long)]
    variables: Option<PathBuf>,

    /// Root directory holding Templates/, Partials/ and Layouts/
    #[arg(short, long)]
    root: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.template) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", cli.template.display());
            return ExitCode::FAILURE;
        }
    };

    let variables = match load_variables(cli.variables.as_deref()) {
        Ok(variables) => variables,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    let mut engine = TemplateEngine::new();
    if let Some(root) = cli.root {
        engine.set_paths(Arc::new(FilesystemTemplates::new(root)));
    }

    match engine.render_source(&source, variables) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_variables(
    path: Option<&std::path::Path>,
) -> Result<FxHashMap<String, vellum::TemplateValue>, String> {
    let Some(path) = path else {
        return Ok(FxHashMap::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| format!("invalid JSON in {}: {err}", path.display()))?;
    Ok(variables_from_json(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum::TemplateValue;

    #[test]
    fn arguments_parse_with_all_flags() {
        let cli = Cli::try_parse_from([
            "vellum", "page.html", "--variables", "vars.json", "--root", "views",
        ])
        .expect("arguments parse");
        assert_eq!(cli.template, PathBuf::from("page.html"));
        assert_eq!(cli.variables, Some(PathBuf::from("vars.json")));
        assert_eq!(cli.root, Some(PathBuf::from("views")));
    }

    #[test]
    fn missing_template_argument_is_rejected() {
        assert!(Cli::try_parse_from(["vellum"]).is_err());
    }

    #[test]
    fn variables_load_from_a_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vars.json");
        std::fs::write(&path, r#"{"name": "Ada"}"#).expect("write");
        let variables = load_variables(Some(&path)).expect("load");
        assert_eq!(
            variables.get("name"),
            Some(&TemplateValue::String("Ada".to_string()))
        );
        assert!(load_variables(None).expect("no file means empty").is_empty());
    }

    #[test]
    fn invalid_variable_json_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vars.json");
        std::fs::write(&path, "not json").expect("write");
        let message = load_variables(Some(&path)).expect_err("must fail");
        assert!(message.contains("invalid JSON"));
    }
}
