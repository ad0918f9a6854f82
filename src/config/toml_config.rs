use crate::domain::model::AnnotationTarget;
use crate::utils::error::{AnnotateError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST: &str = "annotation.toml";

/// `annotation.toml`：標註伺服器啟動方式與各模型的標註目標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_targets")]
    pub targets: Vec<AnnotationTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub host: String,
    pub ready_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "potato".to_string(),
            args: vec![
                "start".to_string(),
                "{config}".to_string(),
                "-p".to_string(),
                "{port}".to_string(),
            ],
            host: "localhost".to_string(),
            ready_timeout_seconds: 30,
        }
    }
}

fn builtin_target(model: &str, port: u16) -> AnnotationTarget {
    AnnotationTarget {
        name: model.to_string(),
        model: model.to_string(),
        config: PathBuf::from(format!("configs/keywords_annotation_{}.yaml", model)),
        port,
        output_dir: PathBuf::from(format!("annotation_output/keyword_annotation_{}/", model)),
    }
}

pub fn default_targets() -> Vec<AnnotationTarget> {
    vec![
        builtin_target("gpt5_mini", 8000),
        builtin_target("qwen3_30b_a3b_instruct_fp8", 8001),
        builtin_target("qwen3_32b_fp8", 8002),
    ]
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            targets: default_targets(),
        }
    }
}

impl Manifest {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 指定路徑則必須存在；未指定時找不到預設檔就使用內建目標
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("Loading manifest from {}", path.display());
                Self::from_file(path)
            }
            None if Path::new(DEFAULT_MANIFEST).is_file() => {
                tracing::debug!("Loading manifest from {}", DEFAULT_MANIFEST);
                Self::from_file(DEFAULT_MANIFEST)
            }
            None => {
                tracing::debug!("No {} found, using built-in targets", DEFAULT_MANIFEST);
                Ok(Self::default())
            }
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AnnotateError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ANNOTATION_PORT})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AnnotateError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 依名稱或模型名稱尋找目標
    pub fn find(&self, name: &str) -> Result<&AnnotationTarget> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .or_else(|| self.targets.iter().find(|t| t.model == name))
            .ok_or_else(|| AnnotateError::UnknownTargetError {
                name: name.to_string(),
            })
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("server.program", &self.server.program)?;
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_positive_number(
            "server.ready_timeout_seconds",
            self.server.ready_timeout_seconds as usize,
            1,
        )?;

        for target in &self.targets {
            validate_non_empty_string("targets.name", &target.name)?;
            validate_non_empty_string("targets.model", &target.model)?;
            validate_path("targets.config", &target.config)?;
            validate_path("targets.output_dir", &target.output_dir)?;
            validate_range("targets.port", target.port, 1, u16::MAX)?;
        }

        Ok(())
    }
}

impl Validate for Manifest {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
