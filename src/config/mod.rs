pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{
    validate_distinct_paths, validate_existing_file, validate_file_extension, validate_path,
    Validate, DOCUMENT_EXTENSIONS, SPREADSHEET_EXTENSIONS,
};

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "label-etl"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Shipping label generator and sorter for marketplace order exports")
)]
#[derive(Debug, Clone)]
pub struct CliConfig {
    #[cfg_attr(feature = "cli", command(subcommand))]
    pub command: Command,

    /// Optional TOML job file with extra schemas and overrides
    #[cfg_attr(feature = "cli", arg(long, global = true))]
    pub config: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, global = true, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, global = true, help = "Emit logs as JSON lines"))]
    pub log_json: bool,

    #[cfg_attr(
        feature = "cli",
        arg(long, global = true, help = "Log memory and timing per phase")
    )]
    pub monitor: bool,
}

#[cfg_attr(feature = "cli", derive(Subcommand))]
#[derive(Debug, Clone)]
pub enum Command {
    /// Build per-order labels and a picking summary from an orders spreadsheet
    GenerateLabels {
        /// Orders spreadsheet (.xlsx, .xls, .ods or .csv)
        input: String,
        /// PDF to write
        output: String,
    },
    /// Reorder an existing label PDF to follow the spreadsheet's tracking ids
    SortLabels {
        /// Spreadsheet with a tracking id column
        spreadsheet: String,
        /// Label PDF to reorder
        document: String,
        /// PDF to write
        output: String,
    },
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(config) = &self.config {
            validate_existing_file("config", config)?;
        }

        match &self.command {
            Command::GenerateLabels { input, output } => {
                validate_existing_file("input", input)?;
                validate_file_extension("input", input, SPREADSHEET_EXTENSIONS)?;
                validate_path("output", output)?;
                validate_file_extension("output", output, DOCUMENT_EXTENSIONS)?;
            }
            Command::SortLabels {
                spreadsheet,
                document,
                output,
            } => {
                validate_existing_file("spreadsheet", spreadsheet)?;
                validate_file_extension("spreadsheet", spreadsheet, SPREADSHEET_EXTENSIONS)?;
                validate_existing_file("document", document)?;
                validate_file_extension("document", document, DOCUMENT_EXTENSIONS)?;
                validate_path("output", output)?;
                validate_file_extension("output", output, DOCUMENT_EXTENSIONS)?;
                validate_distinct_paths("output", document, output)?;
            }
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_generate_labels() {
        let config =
            CliConfig::try_parse_from(["label-etl", "generate-labels", "orders.xlsx", "labels.pdf"])
                .unwrap();
        match config.command {
            Command::GenerateLabels { input, output } => {
                assert_eq!(input, "orders.xlsx");
                assert_eq!(output, "labels.pdf");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(!config.verbose);
    }

    #[test]
    fn parses_sort_labels_with_global_flags() {
        let config = CliConfig::try_parse_from([
            "label-etl",
            "sort-labels",
            "ship.xlsx",
            "in.pdf",
            "out.pdf",
            "--verbose",
            "--config",
            "job.toml",
        ])
        .unwrap();
        assert!(config.verbose);
        assert_eq!(config.config.as_deref(), Some("job.toml"));
        assert!(matches!(config.command, Command::SortLabels { .. }));
    }

    #[test]
    fn missing_paths_are_rejected() {
        assert!(CliConfig::try_parse_from(["label-etl", "sort-labels", "ship.xlsx"]).is_err());
    }

    #[test]
    fn validate_rejects_missing_input() {
        let config = CliConfig {
            command: Command::GenerateLabels {
                input: "/definitely/not/here.xlsx".to_string(),
                output: "labels.pdf".to_string(),
            },
            config: None,
            verbose: false,
            log_json: false,
            monitor: false,
        };
        assert!(config.validate().is_err());
    }
}
