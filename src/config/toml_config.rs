use crate::core::normalize::{builtin_schemas, QuantityRule, SchemaDescriptor};
use crate::domain::model::OrderSource;
use crate::render::summary::DEFAULT_SUMMARY_TITLE;
use crate::utils::error::{LabelError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_TRACKING_COLUMN: &str = "Tracking ID";

/// Optional job file; every section may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default)]
    pub sorting: SortingConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    /// Extra export layouts, tried after the built-in ones.
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortingConfig {
    #[serde(default = "default_tracking_column")]
    pub tracking_column: String,
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            tracking_column: default_tracking_column(),
        }
    }
}

fn default_tracking_column() -> String {
    DEFAULT_TRACKING_COLUMN.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    pub tag: String,
    /// 1-based row holding the column names.
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    pub order_column: String,
    pub sku_column: String,
    pub package_column: Option<String>,
    pub tracking_column: Option<String>,
    pub quantity_column: Option<String>,
    pub fixed_quantity: Option<u32>,
}

fn default_header_row() -> usize {
    1
}

impl SchemaConfig {
    pub fn to_descriptor(&self) -> SchemaDescriptor {
        let quantity = match (&self.quantity_column, self.fixed_quantity) {
            (Some(column), _) => QuantityRule::Column(column.clone()),
            (None, fixed) => QuantityRule::Fixed(fixed.unwrap_or(1)),
        };

        SchemaDescriptor {
            source: OrderSource::from_tag(&self.tag),
            header_row: self.header_row.saturating_sub(1),
            order_column: self.order_column.clone(),
            sku_column: self.sku_column.clone(),
            package_column: self.package_column.clone(),
            tracking_column: self.tracking_column.clone(),
            quantity,
        }
    }
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LabelError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LabelError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SKU_COLUMN})
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// Built-in schemas followed by the configured ones.
    pub fn schemas(&self) -> Vec<SchemaDescriptor> {
        let mut schemas = builtin_schemas();
        schemas.extend(self.schemas.iter().map(SchemaConfig::to_descriptor));
        schemas
    }

    pub fn tracking_column(&self) -> &str {
        &self.sorting.tracking_column
    }

    pub fn summary_title(&self) -> &str {
        self.summary.title.as_deref().unwrap_or(DEFAULT_SUMMARY_TITLE)
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("sorting.tracking_column", &self.sorting.tracking_column)?;

        let mut tags: HashSet<&str> = ["primary", "secondary"].into_iter().collect();
        for (i, schema) in self.schemas.iter().enumerate() {
            let field = |name: &str| format!("schemas[{}].{}", i, name);

            validate_non_empty_string(&field("tag"), &schema.tag)?;
            validate_non_empty_string(&field("order_column"), &schema.order_column)?;
            validate_non_empty_string(&field("sku_column"), &schema.sku_column)?;

            if !tags.insert(schema.tag.as_str()) {
                return Err(LabelError::InvalidConfigValueError {
                    field: field("tag"),
                    value: schema.tag.clone(),
                    reason: "Schema tags must be unique".to_string(),
                });
            }
            if schema.header_row == 0 {
                return Err(LabelError::InvalidConfigValueError {
                    field: field("header_row"),
                    value: "0".to_string(),
                    reason: "Rows are numbered from 1".to_string(),
                });
            }
            if schema.quantity_column.is_some() && schema.fixed_quantity.is_some() {
                return Err(LabelError::InvalidConfigValueError {
                    field: field("fixed_quantity"),
                    value: format!("{:?}", schema.fixed_quantity),
                    reason: "Set either quantity_column or fixed_quantity, not both".to_string(),
                });
            }
            if schema.fixed_quantity == Some(0) {
                return Err(LabelError::InvalidConfigValueError {
                    field: field("fixed_quantity"),
                    value: "0".to_string(),
                    reason: "Quantity must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}
